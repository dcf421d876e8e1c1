//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the API handlers.

pub mod query;
pub mod response;

// Re-export commonly used functions
pub use query::{decode_segment, query_param};
pub use response::{
    apply_common_headers, build_404_response, build_405_response, build_413_response,
    build_json_response, build_options_response, build_text_response, strip_body,
};
