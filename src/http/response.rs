//! HTTP response building module
//!
//! Builders for the JSON and plain-text responses the API returns, plus the
//! protocol-level 404/405/413/OPTIONS answers.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, SERVER};
use hyper::{Method, Response, StatusCode};
use serde::Serialize;

/// Methods advertised in CORS preflight answers
const CORS_METHODS: &str = "GET, HEAD, POST, PUT, PATCH, DELETE, OPTIONS";

/// Build a JSON response
pub fn build_json_response<T: Serialize + ?Sized>(
    status: StatusCode,
    body: &T,
) -> Response<Full<Bytes>> {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from_static(
                    br#"{"message":"Internal server error"}"#,
                )))
                .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Error"))));
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json; charset=utf-8")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error("JSON", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a plain-text response
pub fn build_text_response(status: StatusCode, text: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from_static(text.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error("text", &e);
            Response::new(Full::new(Bytes::from_static(text.as_bytes())))
        })
}

/// Build 404 Not Found response for unknown paths
pub fn build_404_response(path: &str) -> Response<Full<Bytes>> {
    build_json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({ "message": format!("Cannot resolve {path}") }),
    )
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allowed: &[Method]) -> Response<Full<Bytes>> {
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "application/json; charset=utf-8")
        .header("Allow", allow)
        .body(Full::new(Bytes::from_static(
            br#"{"message":"Method not allowed"}"#,
        )))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_json_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        &serde_json::json!({ "message": "Payload too large" }),
    )
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(enable_cors: bool) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", CORS_METHODS);

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Methods", CORS_METHODS)
            .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Stamp headers every response carries
pub fn apply_common_headers(
    response: &mut Response<Full<Bytes>>,
    server_name: &str,
    enable_cors: bool,
) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(server_name) {
        headers.insert(SERVER, value);
    }
    if enable_cors {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    }
}

/// Drop the body of a response to a HEAD request, keeping its headers
pub fn strip_body(response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    let (parts, _) = response.into_parts();
    Response::from_parts(parts, Full::new(Bytes::new()))
}

/// Log response build error
fn log_build_error(kind: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {kind} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_json_response() {
        let response =
            build_json_response(StatusCode::CREATED, &serde_json::json!({ "success": true }));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers()["Content-Type"],
            "application/json; charset=utf-8"
        );
        assert_eq!(body_string(response).await, r#"{"success":true}"#);
    }

    #[test]
    fn test_405_lists_allowed_methods() {
        let response = build_405_response(&[Method::POST, Method::GET]);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()["Allow"], "POST, GET");
    }

    #[test]
    fn test_options_with_cors() {
        let response = build_options_response(true);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response
            .headers()
            .contains_key("Access-Control-Allow-Methods"));

        let response = build_options_response(false);
        assert!(!response
            .headers()
            .contains_key("Access-Control-Allow-Methods"));
    }

    #[test]
    fn test_common_headers() {
        let mut response = build_text_response(StatusCode::OK, "Server is running");
        apply_common_headers(&mut response, "college-admission-api", true);
        assert_eq!(response.headers()[SERVER], "college-admission-api");
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_strip_body_keeps_status() {
        let response = strip_body(build_text_response(StatusCode::OK, "Server is running"));
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.is_empty());
    }
}
