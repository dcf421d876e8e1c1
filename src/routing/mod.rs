//! Routing module
//!
//! Provides the API's routing capabilities:
//! - Path matching with `:name` parameters
//! - Method-aware resolution against the route table

mod matcher;
mod table;

pub use matcher::PathParams;
#[cfg(test)]
pub use matcher::match_path;
pub use table::{resolve, Endpoint, Resolution};
