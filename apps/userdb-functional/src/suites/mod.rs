//! Case tables and checks per resource.
//!
//! Every suite runs its tests against one connector, in order, and
//! records each `(data, expected)` case in a [`SuiteReport`]. Cases
//! within a suite share the server state, so entity names are unique
//! across a suite.

use std::fmt;
use std::str::FromStr;

use reqwest::StatusCode;
use serde_json::Value;
use uuid::Uuid;

use crate::connector::{Expected, HttpConnector, HttpResponse};
use crate::error::HarnessError;
use crate::report::SuiteReport;

/// Runs `$test` for every case of `$cases`, recording outcomes in `$report`.
macro_rules! run_cases {
    ($report:expr, $conn:expr, $test:ident, $cases:expr) => {
        for case in $cases {
            let outcome = $test($conn, &case).await;
            $report.record(stringify!($test), case.name, outcome);
        }
    };
}

pub mod assets;
pub mod products;
pub mod projects;
pub mod users;

/// Well-formed id that no server-side entity carries.
pub(crate) const UNKNOWN_ID: &str = "c34a7368-344a-11eb-adc1-0242ac120002";

/// "testPassword", base64 encoded the way clients send it.
pub(crate) const PASSWORD_B64: &str = "dGVzdFBhc3N3b3Jk";

/// Input data and expected outcome of one case.
#[derive(Debug, Clone)]
pub struct Case {
    pub name: &'static str,
    pub data: Value,
    pub expected: Expected,
}

impl Case {
    pub fn new(name: &'static str, data: Value, expected: Expected) -> Self {
        Self {
            name,
            data,
            expected,
        }
    }
}

/// A group of cases for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suite {
    Users,
    Products,
    Projects,
    Assets,
}

impl Suite {
    pub const ALL: [Suite; 4] = [Suite::Users, Suite::Products, Suite::Projects, Suite::Assets];

    pub fn name(&self) -> &'static str {
        match self {
            Suite::Users => "users",
            Suite::Products => "products",
            Suite::Projects => "projects",
            Suite::Assets => "assets",
        }
    }

    /// Runs every case of the suite against `conn`.
    pub async fn run(&self, conn: &HttpConnector) -> SuiteReport {
        tracing::info!("Running {} suite against {}", self.name(), conn.base_url());
        match self {
            Suite::Users => users::run(conn).await,
            Suite::Products => products::run(conn).await,
            Suite::Projects => projects::run(conn).await,
            Suite::Assets => assets::run(conn).await,
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Suite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Suite::ALL
            .into_iter()
            .find(|suite| suite.name() == s)
            .ok_or_else(|| format!("unknown suite '{}'", s))
    }
}

/// Whether `value` is a non-nil UUID string.
pub(crate) fn is_valid_id(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .and_then(|id| Uuid::parse_str(id).ok())
        .is_some_and(|id| !id.is_nil())
}

/// Checks and removes the ids of an entity and of its nested assets, so
/// the rest can be compared with an id-free expectation.
pub(crate) fn strip_ids(value: &mut Value, nested: &[&str]) -> Result<(), HarnessError> {
    let shown = value.to_string();
    let strip = |object: Option<&mut Value>| -> Result<(), HarnessError> {
        let object = object
            .and_then(Value::as_object_mut)
            .ok_or_else(|| HarnessError::Mismatch(format!("Malformed entity: {}", shown)))?;
        if !is_valid_id(object.get("id")) {
            return Err(HarnessError::Mismatch(format!("Missing or nil id in {}", shown)));
        }
        object.remove("id");
        Ok(())
    };

    for key in nested {
        strip(value.get_mut(*key))?;
    }
    strip(Some(value))
}

pub(crate) fn ensure_eq(returned: &Value, expected: &Value) -> Result<(), HarnessError> {
    if returned == expected {
        Ok(())
    } else {
        Err(HarnessError::mismatch(returned, expected))
    }
}

pub(crate) fn ensure_status(response: &HttpResponse, status: StatusCode) -> Result<(), HarnessError> {
    if response.status == status {
        Ok(())
    } else {
        Err(HarnessError::Mismatch(format!(
            "Status code: {} (expected {}) Details: {}",
            response.status, status, response.text
        )))
    }
}

/// Compares the name and visibility details of a project.
pub(crate) fn ensure_project_details(project: &Value, expected: &Value) -> Result<(), HarnessError> {
    let details = &project["details"]["datamap"];
    if details["name"] != expected["name"] || details["visibility"] != expected["visibility"] {
        return Err(HarnessError::mismatch(project, expected));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_suite_names() {
        for suite in Suite::ALL {
            assert_eq!(suite.name().parse::<Suite>(), Ok(suite));
        }
        assert!("everything".parse::<Suite>().is_err());
    }

    #[test]
    fn test_strip_ids() {
        let mut user = json!({
            "id": Uuid::new_v4(),
            "username": "u",
            "settings": {"id": Uuid::new_v4(), "datamap": {}},
            "assets": {"id": Uuid::new_v4(), "datamap": {}},
        });
        strip_ids(&mut user, &["settings", "assets"]).unwrap();
        assert_eq!(
            user,
            json!({"username": "u", "settings": {"datamap": {}}, "assets": {"datamap": {}}})
        );

        let mut nil = json!({"id": Uuid::nil(), "settings": {"id": Uuid::new_v4()}});
        assert!(strip_ids(&mut nil, &["settings"]).is_err());

        let mut missing = json!({"id": Uuid::new_v4()});
        assert!(strip_ids(&mut missing, &["details"]).is_err());
    }
}
