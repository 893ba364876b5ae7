//! HTTP endpoint implementations.
//!
//! Handlers receive the request with its body already collected and
//! return a JSON envelope. Parameter errors map to 400 and domain errors
//! to 202 in [`crate::router::RouterError`].

pub mod asset_handlers;
pub mod product_handlers;
pub mod project_handlers;
pub mod request_utils;
pub mod response;
pub mod user_handlers;
pub mod viewer_handlers;

use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use crate::router::RouterError;
use request_utils::build_response;

/// Greeting returned by `GET /`, used by clients as a liveness probe.
pub const GREETING: &str = "Hi! I am a user database server!\n";

/// Liveness probe.
///
/// # Endpoint
/// `GET /`
pub fn hello() -> Result<Response<Bytes>, RouterError> {
    build_response(StatusCode::OK, "text/plain", GREETING.as_bytes().to_vec())
}
