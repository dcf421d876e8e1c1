//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: answers CORS preflight, enforces
//! the body size limit, collects the body, hands the request to the API and
//! stamps the common headers on whatever comes back.

use crate::api::{self, ApiRequest};
use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_LENGTH, USER_AGENT};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let http_config = &state.config.http;

    let mut entry = state
        .cached_access_log
        .load(Ordering::Relaxed)
        .then(|| access_entry(&req, peer_addr));

    let is_head = req.method() == Method::HEAD;
    let mut response = if req.method() == Method::OPTIONS {
        http::build_options_response(http_config.enable_cors)
    } else if let Some(resp) = check_body_size(&req, http_config.max_body_size) {
        resp
    } else {
        match read_request(req, http_config.max_body_size).await {
            Ok(api_req) => api::dispatch(&api_req, &state).await,
            Err(resp) => resp,
        }
    };

    http::apply_common_headers(&mut response, &http_config.server_name, http_config.enable_cors);
    if is_head {
        response = http::strip_body(response);
    }

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().map_or(0, |n| {
            usize::try_from(n).unwrap_or(usize::MAX)
        });
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.format);
    }

    Ok(response)
}

/// Collect the body and split the request into its owned API view
async fn read_request<B>(req: Request<B>, max_body_size: u64) -> Result<ApiRequest, Response<Full<Bytes>>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);

    let body = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            logger::log_error(&format!("Request body exceeds {max_body_size} bytes"));
            return Err(http::build_413_response());
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return Err(api::ApiError::BadRequest("Invalid JSON body").into_response());
        }
    };

    Ok(ApiRequest::new(
        parts.method,
        parts.uri.path(),
        parts.uri.query(),
        body,
    ))
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get(CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = format!("{:?}", req.version())
        .trim_start_matches("HTTP/")
        .to_string();
    entry.user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry
}
