// API error module
// Client errors carry the message the caller sees; server errors carry the
// underlying store failure, which is logged but never sent back (except for
// the search endpoint, which echoes it).

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::http::build_json_response;
use crate::logger;
use crate::store::StoreError;

pub type ApiResult = Result<Response<Full<Bytes>>, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// 400 with `{"message": ...}`
    #[error("bad request: {0}")]
    BadRequest(&'static str),

    /// 400 with `{"error": ...}`, the shape used by college creation
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(&'static str),

    /// 500 with a fixed `{"message": ...}`
    #[error("{message}: {source}")]
    Store {
        message: &'static str,
        #[source]
        source: StoreError,
    },

    /// 500 with the fixed message plus the raw error text
    #[error("{message}: {source}")]
    StoreDetailed {
        message: &'static str,
        #[source]
        source: StoreError,
    },

    /// 500 with `{"success": false, "error": "Internal server error"}`;
    /// `context` only reaches the log
    #[error("{context}: {source}")]
    Internal {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    /// Wrap a store failure with the endpoint's fixed message
    pub fn store(message: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { message, source }
    }

    /// Wrap a store failure that is answered with the generic 500 body
    pub fn internal(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Internal { context, source }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store { .. } | Self::StoreDetailed { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        let status = self.status();
        let body = match &self {
            Self::BadRequest(message) | Self::NotFound(message) | Self::Conflict(message) => {
                json!({ "message": message })
            }
            Self::InvalidInput(message) => json!({ "error": message }),
            Self::Store { message, source } => {
                logger::log_store_error(message, source);
                json!({ "message": message })
            }
            Self::StoreDetailed { message, source } => {
                logger::log_store_error(message, source);
                json!({ "message": message, "error": source.to_string() })
            }
            Self::Internal { context, source } => {
                logger::log_store_error(context, source);
                json!({ "success": false, "error": "Internal server error" })
            }
        };
        build_json_response(status, &body)
    }
}
