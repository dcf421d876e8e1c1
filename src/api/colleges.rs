// College handlers
//
// Colleges are created, read, searched and deleted; there is no update.

use bson::{doc, Bson, Document};
use hyper::StatusCode;
use serde_json::{json, Map, Value};

use super::error::{ApiError, ApiResult};
use super::request::{all_present, coerce_f64, coerce_i64, object_id_param, to_bson, ApiRequest};
use crate::config::AppState;
use crate::http::build_json_response;
use crate::routing::PathParams;
use crate::store::{document_to_json, documents_to_json, CollectionKind, Filter};

const REQUIRED_FIELDS: [&str; 5] = ["name", "image", "rating", "admissionDate", "researchCount"];

pub async fn list_colleges(state: &AppState) -> ApiResult {
    let colleges = state
        .store
        .find(CollectionKind::Colleges, Filter::All)
        .await
        .map_err(ApiError::store("Error fetching colleges"))?;
    Ok(build_json_response(StatusCode::OK, &documents_to_json(colleges)))
}

/// Case-insensitive substring search on the college name
pub async fn search_colleges(state: &AppState, req: &ApiRequest) -> ApiResult {
    let filter = match req.query_param("name") {
        Some(name) if !name.is_empty() => Filter::NameContains(name),
        _ => Filter::All,
    };

    let colleges = state
        .store
        .find(CollectionKind::Colleges, filter)
        .await
        .map_err(|source| ApiError::StoreDetailed {
            message: "Error fetching colleges",
            source,
        })?;
    Ok(build_json_response(StatusCode::OK, &documents_to_json(colleges)))
}

pub async fn get_college(state: &AppState, params: &PathParams<'_>) -> ApiResult {
    let id = object_id_param(params, "id").ok_or(ApiError::NotFound("College not found"))?;

    let college = state
        .store
        .find_one(CollectionKind::Colleges, Filter::Id(id))
        .await
        .map_err(ApiError::store("Error fetching college details"))?
        .ok_or(ApiError::NotFound("College not found"))?;

    Ok(build_json_response(StatusCode::OK, &document_to_json(college)))
}

pub async fn create_college(state: &AppState, req: &ApiRequest) -> ApiResult {
    let body = req.json_object()?;
    let college = new_college(&body)?;

    let id = state
        .store
        .insert_one(CollectionKind::Colleges, college)
        .await
        .map_err(ApiError::internal("Error saving college"))?;

    Ok(build_json_response(
        StatusCode::CREATED,
        &json!({ "success": true, "insertedId": id.to_hex() }),
    ))
}

pub async fn delete_college(state: &AppState, params: &PathParams<'_>) -> ApiResult {
    let deleted = match object_id_param(params, "id") {
        Some(id) => state
            .store
            .delete_one(CollectionKind::Colleges, Filter::Id(id))
            .await
            .map_err(ApiError::store("Failed to delete college"))?,
        None => 0,
    };

    Ok(build_json_response(
        StatusCode::OK,
        &json!({ "acknowledged": true, "deletedCount": deleted }),
    ))
}

/// Validate and normalize a college submission
///
/// `rating` becomes a float, `researchCount` an integer, and `events` /
/// `sports` fall back to empty lists unless they are arrays.
pub fn new_college(body: &Map<String, Value>) -> Result<Document, ApiError> {
    if !all_present(body, &REQUIRED_FIELDS) {
        return Err(ApiError::InvalidInput("Missing required fields"));
    }

    let rating = body
        .get("rating")
        .and_then(coerce_f64)
        .ok_or(ApiError::InvalidInput("Invalid rating"))?;
    let research_count = body
        .get("researchCount")
        .and_then(coerce_i64)
        .ok_or(ApiError::InvalidInput("Invalid researchCount"))?;

    Ok(doc! {
        "name": field(body, "name")?,
        "image": field(body, "image")?,
        "rating": rating,
        "admissionDate": field(body, "admissionDate")?,
        "researchCount": research_count,
        "events": list_or_empty(body, "events")?,
        "sports": list_or_empty(body, "sports")?,
        "createdAt": bson::DateTime::now(),
    })
}

fn field(body: &Map<String, Value>, name: &str) -> Result<Bson, ApiError> {
    body.get(name).map_or(Ok(Bson::Null), to_bson)
}

fn list_or_empty(body: &Map<String, Value>, name: &str) -> Result<Bson, ApiError> {
    match body.get(name) {
        Some(list @ Value::Array(_)) => to_bson(list),
        _ => Ok(Bson::Array(Vec::new())),
    }
}
