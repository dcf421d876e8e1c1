// Shared fixtures for handler tests

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Response};
use serde_json::Value;
use std::sync::Arc;

use super::ApiRequest;
use crate::config::{AppState, Config};
use crate::store::MemoryStore;

pub fn test_state() -> AppState {
    AppState::new(&Config::in_memory(), Arc::new(MemoryStore::new()))
}

/// Request with a JSON body; `Value::Null` sends no body
pub fn request(method: Method, path: &str, query: Option<&str>, body: &Value) -> ApiRequest {
    let bytes = match body {
        Value::Null => Bytes::new(),
        other => Bytes::from(serde_json::to_vec(other).unwrap()),
    };
    ApiRequest::new(method, path, query, bytes)
}

pub async fn body_json(response: Response<Full<Bytes>>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
