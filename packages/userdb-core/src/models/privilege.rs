//! Membership privileges.

use serde::{Deserialize, Serialize};

pub const OWNER: &str = "Owner";
pub const PARTNER: &str = "Partner";
pub const USER: &str = "User";

/// A privilege a user can hold on a product or project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Privilege {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// The privilege table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Privileges(Vec<Privilege>);

impl Privileges {
    pub fn new(privileges: Vec<Privilege>) -> Self {
        Self(privileges)
    }

    pub fn is_valid(&self, privilege: i64) -> bool {
        self.0.iter().any(|p| p.id == privilege)
    }

    pub fn is_owner(&self, privilege: i64) -> bool {
        self.has_name(privilege, OWNER)
    }

    pub fn is_partner(&self, privilege: i64) -> bool {
        self.has_name(privilege, PARTNER)
    }

    /// Looks a privilege up by name.
    pub fn by_name(&self, name: &str) -> Option<&Privilege> {
        self.0.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Privilege> {
        self.0.iter()
    }

    fn has_name(&self, privilege: i64, name: &str) -> bool {
        self.0.iter().any(|p| p.id == privilege && p.name == name)
    }
}

impl Default for Privileges {
    fn default() -> Self {
        let entry = |id, name: &str, description: &str| Privilege {
            id,
            name: name.to_string(),
            description: description.to_string(),
        };
        Self(vec![
            entry(1, OWNER, "Full control, including deletion and ownership transfer"),
            entry(2, PARTNER, "Can edit content and manage users"),
            entry(3, USER, "Can use the content"),
        ])
    }
}
