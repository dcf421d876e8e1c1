// Review handlers

use bson::doc;
use hyper::StatusCode;
use serde_json::{json, Map, Value};

use super::error::{ApiError, ApiResult};
use super::request::{all_present, strict_number, to_bson, ApiRequest};
use crate::config::AppState;
use crate::http::build_json_response;
use crate::store::{documents_to_json, CollectionKind, Filter};

const REQUIRED_FIELDS: [&str; 4] = ["userEmail", "collegeName", "rating", "feedback"];

pub async fn create_review(state: &AppState, req: &ApiRequest) -> ApiResult {
    let body = req.json_object()?;
    if !all_present(&body, &REQUIRED_FIELDS) {
        return Err(ApiError::BadRequest("Missing required fields"));
    }
    let rating = review_rating(&body).ok_or(ApiError::BadRequest("Rating must be between 1 and 5"))?;

    let review = doc! {
        "userEmail": to_bson(&body["userEmail"])?,
        "collegeName": to_bson(&body["collegeName"])?,
        "rating": rating,
        "feedback": to_bson(&body["feedback"])?,
        "createdAt": bson::DateTime::now(),
    };

    let id = state
        .store
        .insert_one(CollectionKind::Reviews, review)
        .await
        .map_err(ApiError::store("Failed to save review"))?;

    Ok(build_json_response(
        StatusCode::OK,
        &json!({ "success": true, "insertedId": id.to_hex() }),
    ))
}

pub async fn list_reviews(state: &AppState) -> ApiResult {
    let reviews = state
        .store
        .find(CollectionKind::Reviews, Filter::All)
        .await
        .map_err(ApiError::store("Failed to fetch reviews"))?;
    Ok(build_json_response(StatusCode::OK, &documents_to_json(reviews)))
}

/// Whole-number rating from 1 to 5
#[allow(clippy::cast_possible_truncation)]
fn review_rating(body: &Map<String, Value>) -> Option<i32> {
    body.get("rating")
        .and_then(strict_number)
        .filter(|r| r.fract().abs() < f64::EPSILON && (1.0..=5.0).contains(r))
        .map(|r| r as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{body_json, request, test_state};
    use hyper::Method;

    fn review(rating: Value) -> Value {
        json!({
            "userEmail": "ada@example.com",
            "collegeName": "Stanford",
            "rating": rating,
            "feedback": "Great labs",
        })
    }

    async fn post(state: &AppState, body: &Value) -> ApiResult {
        create_review(state, &request(Method::POST, "/review", None, body)).await
    }

    #[tokio::test]
    async fn test_rating_bounds() {
        let state = test_state();
        for rating in [json!(6), json!("6"), json!(-1), json!(2.5), json!("five")] {
            let err = post(&state, &review(rating.clone())).await.unwrap_err();
            assert!(
                matches!(err, ApiError::BadRequest("Rating must be between 1 and 5")),
                "rating {rating} gave {err:?}"
            );
        }
        // Zero fails the presence check before the range check
        let err = post(&state, &review(json!(0))).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest("Missing required fields")));

        for rating in [json!(1), json!("5")] {
            let created = body_json(post(&state, &review(rating)).await.unwrap()).await;
            assert_eq!(created["success"], true);
        }

        let listed = body_json(list_reviews(&state).await.unwrap()).await;
        let ratings: Vec<i64> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["rating"].as_i64().unwrap())
            .collect();
        assert_eq!(ratings, vec![1, 5]);
    }

    #[tokio::test]
    async fn test_missing_feedback() {
        let state = test_state();
        let mut body = review(json!(4));
        body["feedback"] = json!("");
        let err = post(&state, &body).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_review_gets_timestamp() {
        let state = test_state();
        post(&state, &review(json!(3))).await.unwrap();
        let listed = body_json(list_reviews(&state).await.unwrap()).await;
        assert!(listed[0]["createdAt"].as_str().unwrap().ends_with('Z'));
    }
}
