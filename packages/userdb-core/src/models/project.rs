//! Projects, project membership and project viewers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::asset::Asset;
use crate::table::Record;

/// Project details key holding the project name.
pub const DETAIL_NAME: &str = "name";
/// Project details key holding the project visibility.
pub const DETAIL_VISIBILITY: &str = "visibility";

/// Who may see a product or project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    /// Everyone, including visitors who are not registered
    Public,
    /// Registered users
    Protected,
    /// The owner and the users it is shared with
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "Public",
            Visibility::Protected => "Protected",
            Visibility::Private => "Private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Public" => Ok(Visibility::Public),
            "Protected" => Ok(Visibility::Protected),
            "Private" => Ok(Visibility::Private),
            other => Err(format!("unknown visibility '{}'", other)),
        }
    }
}

/// Stored project row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub product_id: Uuid,
    pub details_id: Uuid,
    pub assets_id: Uuid,
}

impl Record for Project {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// A project joined with its details and assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    pub id: Uuid,
    pub product_id: Uuid,
    pub details: Asset,
    pub assets: Asset,
}

impl ProjectData {
    pub fn name(&self) -> Option<&str> {
        self.details.datamap.get(DETAIL_NAME).and_then(|v| v.as_str())
    }

    pub fn visibility(&self) -> Option<Visibility> {
        self.details
            .datamap
            .get(DETAIL_VISIBILITY)
            .and_then(|v| v.as_str())
            .and_then(|v| v.parse().ok())
    }
}

/// Membership of a user in a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectUser {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub privilege: i64,
}

/// Grants a user access to a project's data through a viewer id.
///
/// Each viewer id has at most one owner row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectViewer {
    pub viewer_id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    #[serde(default)]
    pub is_owner: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_round_trips_through_strings() {
        for visibility in [Visibility::Public, Visibility::Protected, Visibility::Private] {
            assert_eq!(visibility.as_str().parse::<Visibility>(), Ok(visibility));
        }
        assert!("public".parse::<Visibility>().is_err());
    }

    #[test]
    fn test_viewer_is_owner_defaults_to_false() {
        let viewer: ProjectViewer = serde_json::from_value(serde_json::json!({
            "viewer_id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
            "project_id": Uuid::new_v4(),
        }))
        .unwrap();
        assert!(!viewer.is_owner);
    }
}
