// User handlers
//
// `/users/:key` accepts either an ObjectId or an email address; the role
// update always addresses by id and the profile update by email.

use bson::{doc, Bson};
use hyper::StatusCode;
use serde_json::{json, Value};

use super::error::{ApiError, ApiResult};
use super::request::{all_present, path_param, to_bson, ApiRequest};
use crate::config::AppState;
use crate::http::build_json_response;
use crate::routing::PathParams;
use crate::store::{
    document_to_json, documents_to_json, json_to_document, CollectionKind, Filter, InsertOutcome,
    StoreError, UpdateOutcome, UserKey,
};

pub async fn create_user(state: &AppState, req: &ApiRequest) -> ApiResult {
    let body = req.json_object()?;
    if !all_present(&body, &["name", "email"]) {
        return Err(ApiError::BadRequest("Name, email and location are required"));
    }

    let location = body.get("location").map_or(Ok(Bson::Null), to_bson)?;
    let user = doc! {
        "name": to_bson(&body["name"])?,
        "email": to_bson(&body["email"])?,
        "location": location,
    };

    let outcome = state
        .store
        .insert_user(user)
        .await
        .map_err(ApiError::store("Failed to save user"))?;

    let body = match outcome {
        InsertOutcome::Inserted(id) => json!({ "acknowledged": true, "insertedId": id.to_hex() }),
        InsertOutcome::Duplicate => json!({ "message": "User already exists" }),
    };
    Ok(build_json_response(StatusCode::OK, &body))
}

pub async fn list_users(state: &AppState) -> ApiResult {
    let users = state
        .store
        .find(CollectionKind::Users, Filter::All)
        .await
        .map_err(ApiError::store("Failed to fetch users"))?;
    Ok(build_json_response(StatusCode::OK, &documents_to_json(users)))
}

pub async fn get_user(state: &AppState, params: &PathParams<'_>) -> ApiResult {
    let key = UserKey::from_segment(&path_param(params, "key"));

    let user = state
        .store
        .find_one(CollectionKind::Users, key.filter())
        .await
        .map_err(ApiError::store("Server error"))?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(build_json_response(StatusCode::OK, &document_to_json(user)))
}

/// `PATCH /users/:id` with `{ "role": ... }`
pub async fn update_user_role(
    state: &AppState,
    params: &PathParams<'_>,
    req: &ApiRequest,
) -> ApiResult {
    let body = req.json_object()?;
    let role = match body.get("role") {
        None | Some(Value::Null) => return Err(ApiError::BadRequest("Missing role")),
        Some(role) => to_bson(role)?,
    };

    // A malformed id addresses no user
    let outcome = match UserKey::from_segment(&path_param(params, "id")) {
        key @ UserKey::Id(_) => state
            .store
            .update_user(&key, doc! { "role": role })
            .await
            .map_err(ApiError::store("Failed to update user"))?,
        UserKey::Email(_) => UpdateOutcome::default(),
    };

    update_response(outcome)
}

/// `PUT /users/:email` with the fields to overwrite
pub async fn update_user_fields(
    state: &AppState,
    params: &PathParams<'_>,
    req: &ApiRequest,
) -> ApiResult {
    let mut body = req.json_object()?;
    body.remove("_id");
    if body.is_empty() {
        return Err(ApiError::BadRequest("No fields to update"));
    }
    let changes = json_to_document(&body).map_err(|_| ApiError::BadRequest("Invalid JSON body"))?;

    let key = UserKey::Email(path_param(params, "email"));
    let outcome = state
        .store
        .update_user(&key, changes)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::Conflict("Email already in use"),
            other => ApiError::store("Failed to update user")(other),
        })?;

    update_response(outcome)
}

fn update_response(outcome: UpdateOutcome) -> ApiResult {
    Ok(build_json_response(
        StatusCode::OK,
        &json!({
            "acknowledged": true,
            "matchedCount": outcome.matched,
            "modifiedCount": outcome.modified,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{body_json, request, test_state};
    use crate::routing::match_path;
    use hyper::Method;

    async fn register(state: &AppState, name: &str, email: &str) -> Value {
        let body = json!({ "name": name, "email": email, "location": "Dhaka" });
        body_json(
            create_user(state, &request(Method::POST, "/users", None, &body))
                .await
                .unwrap(),
        )
        .await
    }

    async fn user_count(state: &AppState) -> usize {
        body_json(list_users(state).await.unwrap())
            .await
            .as_array()
            .unwrap()
            .len()
    }

    #[tokio::test]
    async fn test_duplicate_email_is_not_inserted() {
        let state = test_state();
        let first = register(&state, "Ada", "ada@example.com").await;
        assert_eq!(first["acknowledged"], true);

        let second = register(&state, "Ada Again", "ada@example.com").await;
        assert_eq!(second, json!({ "message": "User already exists" }));
        assert_eq!(user_count(&state).await, 1);
    }

    #[tokio::test]
    async fn test_location_is_optional() {
        let state = test_state();
        let body = json!({ "name": "Grace", "email": "grace@example.com" });
        create_user(&state, &request(Method::POST, "/users", None, &body))
            .await
            .unwrap();

        let params = match_path("/users/:key", "/users/grace%40example.com").unwrap();
        let user = body_json(get_user(&state, &params).await.unwrap()).await;
        assert_eq!(user["location"], Value::Null);

        let body = json!({ "email": "nameless@example.com" });
        let err = create_user(&state, &request(Method::POST, "/users", None, &body))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::BadRequest("Name, email and location are required")
        ));
    }

    #[tokio::test]
    async fn test_get_by_id_or_email() {
        let state = test_state();
        let created = register(&state, "Ada", "ada@example.com").await;
        let id = created["insertedId"].as_str().unwrap();

        let path = format!("/users/{id}");
        let params = match_path("/users/:key", &path).unwrap();
        let by_id = body_json(get_user(&state, &params).await.unwrap()).await;
        assert_eq!(by_id["email"], "ada@example.com");

        let params = match_path("/users/:key", "/users/ada@example.com").unwrap();
        let by_email = body_json(get_user(&state, &params).await.unwrap()).await;
        assert_eq!(by_email["_id"], id);

        let params = match_path("/users/:key", "/users/65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        let err = get_user(&state, &params).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound("User not found")));
    }

    #[tokio::test]
    async fn test_role_update() {
        let state = test_state();
        let created = register(&state, "Ada", "ada@example.com").await;
        let path = format!("/users/{}", created["insertedId"].as_str().unwrap());
        let params = match_path("/users/:id", &path).unwrap();

        let req = request(Method::PATCH, &path, None, &json!({}));
        let err = update_user_role(&state, &params, &req).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest("Missing role")));

        let req = request(Method::PATCH, &path, None, &json!({ "role": "admin" }));
        let updated = body_json(update_user_role(&state, &params, &req).await.unwrap()).await;
        assert_eq!(updated["matchedCount"], 1);
        assert_eq!(updated["modifiedCount"], 1);

        let params = match_path("/users/:id", "/users/not-an-id").unwrap();
        let missed = body_json(update_user_role(&state, &params, &req).await.unwrap()).await;
        assert_eq!(missed["matchedCount"], 0);
    }

    #[tokio::test]
    async fn test_fields_update_by_email() {
        let state = test_state();
        register(&state, "Ada", "ada@example.com").await;
        register(&state, "Grace", "grace@example.com").await;
        let params = match_path("/users/:email", "/users/ada@example.com").unwrap();

        let req = request(Method::PUT, "/users/ada@example.com", None, &json!({ "_id": "x" }));
        let err = update_user_fields(&state, &params, &req).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest("No fields to update")));

        let body = json!({ "email": "grace@example.com" });
        let req = request(Method::PUT, "/users/ada@example.com", None, &body);
        let err = update_user_fields(&state, &params, &req).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let body = json!({ "location": "London", "university": "Cambridge" });
        let req = request(Method::PUT, "/users/ada@example.com", None, &body);
        let updated = body_json(update_user_fields(&state, &params, &req).await.unwrap()).await;
        assert_eq!(updated["modifiedCount"], 1);

        let params = match_path("/users/:key", "/users/ada@example.com").unwrap();
        let user = body_json(get_user(&state, &params).await.unwrap()).await;
        assert_eq!(user["university"], "Cambridge");
    }
}
