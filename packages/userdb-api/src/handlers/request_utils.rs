//! Request parsing helpers shared by the handlers.

use std::fmt;

use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::time;
use uuid::Uuid;

use crate::router::RouterError;

/// Decoded JSON request body.
pub type JsonObject = Map<String, Value>;

/// Helper to build HTTP response with proper error handling
pub fn build_response(
    status: StatusCode,
    content_type: &str,
    body: Vec<u8>,
) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .body(Bytes::from(body))
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

/// Helper function to read request body with timeout
pub async fn read_request_body_with_timeout<B>(body: B, timeout_ms: u64) -> Result<Bytes, RouterError>
where
    B: Body,
    B::Error: fmt::Display,
{
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    let collected = time::timeout(timeout_duration, body.collect())
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| RouterError::BadRequest(format!("Failed to read request body: {}", e)))?;
    Ok(collected.to_bytes())
}

/// Decodes a POST body into a JSON object.
pub fn parse_json_object(req: &Request<Bytes>) -> Result<JsonObject, RouterError> {
    serde_json::from_slice(req.body())
        .map_err(|e| RouterError::BadRequest(format!("Failed to decode request json: {}", e)))
}

pub fn missing(name: &str) -> RouterError {
    RouterError::BadRequest(format!("Missing '{}' element", name))
}

pub fn invalid(name: &str) -> RouterError {
    RouterError::BadRequest(format!("Invalid '{}' element", name))
}

/// Returns the element `name` of a JSON object.
pub fn element<'a>(object: &'a JsonObject, name: &str) -> Result<&'a Value, RouterError> {
    object.get(name).ok_or_else(|| missing(name))
}

/// Returns the string element `name` of a JSON object.
pub fn str_element<'a>(object: &'a JsonObject, name: &str) -> Result<&'a str, RouterError> {
    element(object, name)?.as_str().ok_or_else(|| invalid(name))
}

/// Returns the element `name` of a JSON object parsed as a UUID.
pub fn uuid_element(object: &JsonObject, name: &str) -> Result<Uuid, RouterError> {
    let text = str_element(object, name)?;
    Uuid::parse_str(text).map_err(|_| invalid(name))
}

/// Deserializes the element `name` of a JSON object.
pub fn typed_element<T: DeserializeOwned>(object: &JsonObject, name: &str) -> Result<T, RouterError> {
    T::deserialize(element(object, name)?).map_err(|_| invalid(name))
}

/// Decoded URL query parameters, keeping repeated keys.
#[derive(Debug, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parses a form-encoded query string.
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .unwrap_or("")
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(key), decode_component(value))
            })
            .collect();
        Self { pairs }
    }

    pub fn from_request(req: &Request<Bytes>) -> Self {
        Self::parse(req.uri().query())
    }

    /// Returns the first value of `name`, if present and non-empty.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
    }

    /// Returns every value of `name` in order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Returns the first value of `name` or a "Url Param is missing" error.
    pub fn require(&self, name: &str) -> Result<&str, RouterError> {
        self.get(name)
            .ok_or_else(|| RouterError::BadRequest(format!("Url Param '{}' is missing", name)))
    }

    /// Returns the first value of `name` parsed as a UUID.
    pub fn require_uuid(&self, name: &str) -> Result<Uuid, RouterError> {
        Uuid::parse_str(self.require(name)?).map_err(|_| invalid(name))
    }

    /// Returns every value of `ids` parsed as UUIDs.
    pub fn id_list(&self) -> Result<Vec<Uuid>, RouterError> {
        let ids = self.get_all("ids");
        if ids.first().map_or(true, |first| first.is_empty()) {
            return Err(RouterError::BadRequest("Missing 'ids'".to_string()));
        }

        ids.iter()
            .map(|id| {
                Uuid::parse_str(id).map_err(|_| RouterError::BadRequest("Invalid 'ids'".to_string()))
            })
            .collect()
    }
}

fn decode_component(component: &str) -> String {
    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
