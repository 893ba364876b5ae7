//! HTTP access to the server under test.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::time::sleep;

use crate::error::HarnessError;

/// Readiness probe attempts before giving up.
pub const CONNECT_ATTEMPTS: u32 = 15;
/// Delay between readiness probes.
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub text: String,
}

/// Client bound to one server.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    base_url: String,
    client: Client,
}

impl HttpConnector {
    /// Builds a client for `base_url` without probing the server.
    pub fn new(base_url: impl Into<String>) -> Result<Self, HarnessError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| HarnessError::Request {
                path: base_url.clone(),
                source,
            })?;
        Ok(Self { base_url, client })
    }

    /// Connects to `base_url`, waiting until `GET /` answers 200.
    pub async fn connect(base_url: impl Into<String>) -> Result<Self, HarnessError> {
        Self::connect_with(base_url, CONNECT_ATTEMPTS, CONNECT_RETRY_DELAY).await
    }

    /// Same as [`HttpConnector::connect`] with an explicit probe budget.
    pub async fn connect_with(
        base_url: impl Into<String>,
        attempts: u32,
        delay: Duration,
    ) -> Result<Self, HarnessError> {
        let connector = Self::new(base_url)?;

        for attempt in 1..=attempts {
            match connector.get("/", &[]).await {
                Ok(response) if response.status == StatusCode::OK => {
                    tracing::debug!("Connected to {} after {} attempt(s)", connector.base_url, attempt);
                    return Ok(connector);
                }
                Ok(response) => {
                    tracing::debug!("Probe of {} returned {}", connector.base_url, response.status);
                }
                Err(err) => tracing::debug!("Probe of {} failed: {}", connector.base_url, err),
            }
            if attempt < attempts {
                sleep(delay).await;
            }
        }

        Err(HarnessError::Unreachable {
            url: connector.base_url,
            attempts,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a GET request. Repeated keys in `params` become repeated
    /// query parameters.
    pub async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<HttpResponse, HarnessError> {
        let request = self.client.get(self.url(path)).query(params);
        self.send(path, request).await
    }

    /// Sends `body` as JSON in a POST request.
    pub async fn post(&self, path: &str, body: &Value) -> Result<HttpResponse, HarnessError> {
        let request = self.client.post(self.url(path)).json(body);
        self.send(path, request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<HttpResponse, HarnessError> {
        let request_error = |source| HarnessError::Request {
            path: path.to_string(),
            source,
        };

        let response = request.send().await.map_err(request_error)?;
        let status = response.status();
        let text = response.text().await.map_err(request_error)?;
        tracing::trace!("{} -> {} {}", path, status, text);
        Ok(HttpResponse { status, text })
    }
}

/// Outcome a case expects from its final request.
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    /// Envelope `data` on success
    Data(Value),
    /// Envelope `error` text
    Error(String),
}

impl Expected {
    pub fn data(value: Value) -> Self {
        Expected::Data(value)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Expected::Error(message.into())
    }

    /// The `"OK"` acknowledgement.
    pub fn ok() -> Self {
        Expected::Data(Value::String("OK".to_string()))
    }

    /// Expected data, or a mismatch if the case expects an error.
    pub fn expect_data(&self, returned: &Value) -> Result<&Value, HarnessError> {
        match self {
            Expected::Data(value) => Ok(value),
            Expected::Error(error) => Err(HarnessError::mismatch(
                returned,
                format!("error '{}'", error),
            )),
        }
    }
}

/// Unwraps the `{"data", "error"}` envelope of a response.
///
/// Returns `Ok(None)` when the server returned exactly the error the
/// case expects, so the case ends successfully there. Any other error
/// fails the case.
pub fn get_response(text: &str, expected: &Expected) -> Result<Option<Value>, HarnessError> {
    unwrap_envelope(text, Some(expected))
}

/// Unwraps the envelope of a setup request. Setup steps have no expected
/// outcome, so any error fails the case.
pub fn setup_response(text: &str) -> Result<Value, HarnessError> {
    unwrap_envelope(text, None)?
        .ok_or_else(|| HarnessError::Decode(format!("Missing 'data' in {}", text)))
}

fn unwrap_envelope(text: &str, expected: Option<&Expected>) -> Result<Option<Value>, HarnessError> {
    let mut envelope: Value =
        serde_json::from_str(text).map_err(|e| HarnessError::Decode(format!("{}: {}", e, text)))?;

    let error = envelope
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if !error.is_empty() {
        return match expected {
            Some(Expected::Error(message)) if message == error => Ok(None),
            _ => Err(HarnessError::UnexpectedError(error.to_string())),
        };
    }

    envelope
        .get_mut("data")
        .map(Value::take)
        .map(Some)
        .ok_or_else(|| HarnessError::Decode(format!("Missing 'data' in {}", text)))
}
