// Request model for API handlers
//
// The connection layer collects the body once and hands handlers this
// owned, transport-independent view of the request.

use bson::oid::ObjectId;
use bson::Bson;
use hyper::body::Bytes;
use hyper::Method;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use super::error::ApiError;
use crate::http;
use crate::routing::PathParams;

/// Leading decimal number, the prefix a lenient float parse accepts
static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid float regex")
});

/// Leading integer, the prefix a lenient integer parse accepts
static INT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+").expect("valid integer regex"));

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    /// Raw query string without the leading `?`
    pub query: Option<String>,
    pub body: Bytes,
}

impl ApiRequest {
    pub fn new(method: Method, path: &str, query: Option<&str>, body: Bytes) -> Self {
        Self {
            method,
            path: path.to_string(),
            query: query.map(ToString::to_string),
            body,
        }
    }

    pub fn query_param(&self, name: &str) -> Option<String> {
        http::query_param(self.query.as_deref(), name)
    }

    /// Parse the body as a JSON object; an empty body is an empty object
    pub fn json_object(&self) -> Result<Map<String, Value>, ApiError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        match serde_json::from_slice(&self.body) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(ApiError::BadRequest("Invalid JSON body")),
        }
    }
}

/// Decoded path parameter
pub fn path_param(params: &PathParams<'_>, name: &str) -> String {
    params.get(name).map(http::decode_segment).unwrap_or_default()
}

/// Path parameter parsed as an ObjectId; `None` for malformed identifiers
pub fn object_id_param(params: &PathParams<'_>, name: &str) -> Option<ObjectId> {
    ObjectId::parse_str(path_param(params, name)).ok()
}

/// Presence check for required fields.
///
/// Absent, `null`, `false`, `0` and `""` all count as missing.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Every named field is truthy
pub fn all_present(body: &Map<String, Value>, fields: &[&str]) -> bool {
    fields.iter().all(|field| is_truthy(body.get(*field)))
}

/// Lenient float coercion: numbers as-is, strings by their leading number
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => FLOAT_PREFIX
            .find(s.trim_start())
            .and_then(|m| m.as_str().parse().ok()),
        _ => None,
    }
}

/// Lenient integer coercion: numbers truncated, strings by their leading digits
#[allow(clippy::cast_possible_truncation)]
pub fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < 9.2e18)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => INT_PREFIX
            .find(s.trim_start())
            .and_then(|m| m.as_str().parse().ok()),
        _ => None,
    }
}

/// Strict numeric coercion: numbers, or strings that are entirely a number
pub fn strict_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Convert a client-supplied JSON value for storage
pub fn to_bson(value: &Value) -> Result<Bson, ApiError> {
    bson::to_bson(value).map_err(|_| ApiError::BadRequest("Invalid JSON body"))
}
