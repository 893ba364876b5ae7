//! Products and product membership.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::asset::Asset;
use crate::table::Record;

// Product details keys
pub const SUPPORT_CLIENTS: &str = "support_clients";
pub const CLIENT_UI: &str = "client_ui";
pub const PROJECT_UI: &str = "project_ui";
pub const REQUIRES_3D: &str = "requires_3d";
pub const HAS_TRIAL: &str = "has_trial";
pub const IS_FREE: &str = "is_free";

/// Stored product row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub public: bool,
    pub details_id: Uuid,
    pub assets_id: Uuid,
}

impl Record for Product {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// A product joined with its details and assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductData {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub public: bool,
    pub details: Asset,
    pub assets: Asset,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Membership of a user in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUser {
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub privilege: i64,
}
