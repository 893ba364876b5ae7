//! Response envelope shared by every JSON endpoint.

use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::request_utils::build_response;
use crate::router::RouterError;

/// Payload returned by endpoints that only acknowledge success.
pub const DATA_OK: &str = "OK";

/// `{"error": ..., "data": ...}` wrapper.
///
/// Exactly one side is meaningful: `error` is empty on success and
/// `data` is an empty string on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub error: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            error: String::new(),
            data,
        }
    }
}

impl Envelope<&'static str> {
    pub fn failure(error: String) -> Self {
        Self { error, data: "" }
    }
}

/// Serializes `data` into a success envelope with the given status.
pub fn data_response<T: Serialize>(
    status: StatusCode,
    data: T,
) -> Result<Response<Bytes>, RouterError> {
    let json = serde_json::to_vec(&Envelope::success(data)).map_err(|e| {
        RouterError::InternalError(format!("Failed to serialize response: {}", e))
    })?;
    build_response(status, "application/json", json)
}

/// Acknowledges a successful operation with `"OK"`.
pub fn ok_response(status: StatusCode) -> Result<Response<Bytes>, RouterError> {
    data_response(status, DATA_OK)
}
