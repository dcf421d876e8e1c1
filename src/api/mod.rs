// API module entry
// REST endpoints over the college, admission, review and user collections

mod admissions;
mod colleges;
mod error;
mod request;
mod reviews;
mod users;

#[cfg(test)]
pub(crate) mod testing;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde_json::json;

use crate::config::AppState;
use crate::http::{build_404_response, build_405_response, build_json_response, build_text_response};
use crate::logger;
use crate::routing::{resolve, Endpoint, PathParams, Resolution};

use error::ApiResult;

pub use error::ApiError;
pub use request::ApiRequest;

/// Route a collected request to its handler and render the outcome
pub async fn dispatch(req: &ApiRequest, state: &AppState) -> Response<Full<Bytes>> {
    let response = match resolve(&req.method, &req.path) {
        Resolution::Matched(endpoint, params) => call(endpoint, &params, req, state)
            .await
            .unwrap_or_else(ApiError::into_response),
        Resolution::MethodNotAllowed(allowed) => build_405_response(&allowed),
        Resolution::NotFound => build_404_response(&req.path),
    };

    logger::log_api_request(req.method.as_str(), &req.path, response.status().as_u16());
    response
}

async fn call(
    endpoint: Endpoint,
    params: &PathParams<'_>,
    req: &ApiRequest,
    state: &AppState,
) -> ApiResult {
    match endpoint {
        Endpoint::Root => Ok(build_text_response(StatusCode::OK, "Server is running")),
        Endpoint::Health => health(state).await,
        Endpoint::ListColleges => colleges::list_colleges(state).await,
        Endpoint::SearchColleges => colleges::search_colleges(state, req).await,
        Endpoint::GetCollege => colleges::get_college(state, params).await,
        Endpoint::CreateCollege => colleges::create_college(state, req).await,
        Endpoint::DeleteCollege => colleges::delete_college(state, params).await,
        Endpoint::CreateAdmission => admissions::create_admission(state, req).await,
        Endpoint::ListAdmissions => admissions::list_admissions(state, req).await,
        Endpoint::ListAllAdmissions => admissions::list_all_admissions(state).await,
        Endpoint::SetAdmissionStatus => admissions::set_admission_status(state, params, req).await,
        Endpoint::DeleteAdmission => admissions::delete_admission(state, params).await,
        Endpoint::CreateReview => reviews::create_review(state, req).await,
        Endpoint::ListReviews => reviews::list_reviews(state).await,
        Endpoint::CreateUser => users::create_user(state, req).await,
        Endpoint::ListUsers => users::list_users(state).await,
        Endpoint::GetUser => users::get_user(state, params).await,
        Endpoint::UpdateUserRole => users::update_user_role(state, params, req).await,
        Endpoint::UpdateUserFields => users::update_user_fields(state, params, req).await,
    }
}

/// Readiness probe: the store must answer a ping
async fn health(state: &AppState) -> ApiResult {
    match state.store.ping().await {
        Ok(()) => Ok(build_json_response(StatusCode::OK, &json!({ "status": "ok" }))),
        Err(e) => {
            logger::log_warning(&format!("Health check failed: {e}"));
            Ok(build_json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                &json!({ "status": "unavailable" }),
            ))
        }
    }
}
