// Admission handlers
//
// Applicants submit free-form admission documents; admins flip the
// `status` flag or remove the record.

use bson::doc;
use hyper::StatusCode;
use serde_json::{json, Value};

use super::error::{ApiError, ApiResult};
use super::request::{object_id_param, ApiRequest};
use crate::config::AppState;
use crate::http::build_json_response;
use crate::routing::PathParams;
use crate::store::{documents_to_json, json_to_document, CollectionKind, Filter};

/// Fields only the server may set
const PROTECTED_FIELDS: [&str; 2] = ["_id", "status"];

pub async fn create_admission(state: &AppState, req: &ApiRequest) -> ApiResult {
    let mut body = req.json_object()?;
    for field in PROTECTED_FIELDS {
        body.remove(field);
    }
    let admission =
        json_to_document(&body).map_err(|_| ApiError::BadRequest("Invalid JSON body"))?;

    let id = state
        .store
        .insert_one(CollectionKind::Admissions, admission)
        .await
        .map_err(ApiError::store("Failed to save admission data"))?;

    Ok(build_json_response(
        StatusCode::OK,
        &json!({ "acknowledged": true, "insertedId": id.to_hex() }),
    ))
}

/// Admissions submitted by one applicant
pub async fn list_admissions(state: &AppState, req: &ApiRequest) -> ApiResult {
    let email = req
        .query_param("userEmail")
        .filter(|email| !email.is_empty())
        .ok_or(ApiError::BadRequest("Missing userEmail"))?;

    let admissions = state
        .store
        .find(
            CollectionKind::Admissions,
            Filter::Equals {
                field: "userEmail",
                value: email,
            },
        )
        .await
        .map_err(ApiError::store("Failed to fetch admissions"))?;
    Ok(build_json_response(StatusCode::OK, &documents_to_json(admissions)))
}

pub async fn list_all_admissions(state: &AppState) -> ApiResult {
    let admissions = state
        .store
        .find(CollectionKind::Admissions, Filter::All)
        .await
        .map_err(ApiError::store("Failed to fetch admissions"))?;
    Ok(build_json_response(StatusCode::OK, &documents_to_json(admissions)))
}

pub async fn set_admission_status(
    state: &AppState,
    params: &PathParams<'_>,
    req: &ApiRequest,
) -> ApiResult {
    let body = req.json_object()?;
    let Some(Value::Bool(status)) = body.get("status") else {
        return Err(ApiError::BadRequest("Invalid status value"));
    };

    let id = object_id_param(params, "id").ok_or(ApiError::NotFound("Admission not found"))?;
    let outcome = state
        .store
        .update_one(
            CollectionKind::Admissions,
            Filter::Id(id),
            doc! { "status": *status },
        )
        .await
        .map_err(ApiError::store("Failed to update status"))?;

    if outcome.modified == 0 {
        return Err(ApiError::NotFound("Admission not found"));
    }
    Ok(build_json_response(
        StatusCode::OK,
        &json!({ "success": true, "modifiedCount": outcome.modified }),
    ))
}

pub async fn delete_admission(state: &AppState, params: &PathParams<'_>) -> ApiResult {
    let id = object_id_param(params, "id").ok_or(ApiError::NotFound("Admission not found"))?;
    let deleted = state
        .store
        .delete_one(CollectionKind::Admissions, Filter::Id(id))
        .await
        .map_err(ApiError::store("Failed to delete admission"))?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Admission not found"));
    }
    Ok(build_json_response(
        StatusCode::OK,
        &json!({ "success": true, "deletedCount": deleted }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{body_json, request, test_state};
    use crate::routing::match_path;
    use hyper::Method;

    async fn submit(state: &AppState, email: &str) -> String {
        let body = json!({
            "userEmail": email,
            "collegeName": "Stanford",
            "status": true,
            "_id": "65a1f0c2e4b0a1b2c3d4e5f6",
        });
        let response = create_admission(state, &request(Method::POST, "/admission", None, &body))
            .await
            .unwrap();
        let created = body_json(response).await;
        assert_eq!(created["acknowledged"], true);
        created["insertedId"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_protected_fields_are_stripped() {
        let state = test_state();
        let id = submit(&state, "ada@example.com").await;
        assert_ne!(id, "65a1f0c2e4b0a1b2c3d4e5f6");

        let all = body_json(list_all_admissions(&state).await.unwrap()).await;
        let stored = &all.as_array().unwrap()[0];
        assert_eq!(stored["_id"], id.as_str());
        assert!(stored.get("status").is_none());
    }

    #[tokio::test]
    async fn test_list_by_email() {
        let state = test_state();
        submit(&state, "ada@example.com").await;
        submit(&state, "ada@example.com").await;
        submit(&state, "grace@example.com").await;

        let req = request(
            Method::GET,
            "/admissions",
            Some("userEmail=ada%40example.com"),
            &Value::Null,
        );
        let mine = body_json(list_admissions(&state, &req).await.unwrap()).await;
        assert_eq!(mine.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_requires_email() {
        let state = test_state();
        for query in [None, Some("userEmail=")] {
            let req = request(Method::GET, "/admissions", query, &Value::Null);
            let err = list_admissions(&state, &req).await.unwrap_err();
            assert!(matches!(err, ApiError::BadRequest("Missing userEmail")));
        }
    }

    #[tokio::test]
    async fn test_status_updates() {
        let state = test_state();
        let id = submit(&state, "ada@example.com").await;
        let path = format!("/admin/admission/{id}");
        let params = match_path("/admin/admission/:id", &path).unwrap();

        let req = request(Method::PATCH, &path, None, &json!({ "status": "yes" }));
        let err = set_admission_status(&state, &params, &req).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest("Invalid status value")));

        let req = request(Method::PATCH, &path, None, &json!({ "status": true }));
        let updated = body_json(set_admission_status(&state, &params, &req).await.unwrap()).await;
        assert_eq!(updated["modifiedCount"], 1);

        // Setting the same value again modifies nothing
        let err = set_admission_status(&state, &params, &req).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_missing_admission() {
        let state = test_state();
        let id = submit(&state, "ada@example.com").await;
        let path = format!("/admin/admission/{id}");
        let params = match_path("/admin/admission/:id", &path).unwrap();

        let deleted = body_json(delete_admission(&state, &params).await.unwrap()).await;
        assert_eq!(deleted["deletedCount"], 1);

        let err = delete_admission(&state, &params).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound("Admission not found")));

        let params = match_path("/admin/admission/:id", "/admin/admission/bogus").unwrap();
        let err = delete_admission(&state, &params).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
