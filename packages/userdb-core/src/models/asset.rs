//! Key-value assets attached to users, products and projects.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DbError;
use crate::persistence::io_utils::classify_io_error;
use crate::table::Record;

/// Free-form key-value content of an asset.
pub type DataMap = serde_json::Map<String, Value>;

/// Datamap key holding the directory reserved for an asset's files.
pub const BASE_ASSET_PATH: &str = "base_asset_path";

/// A set of references or settings identified by its own id.
///
/// The same shape backs user settings, user assets, product details,
/// product assets, project details and project assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    #[serde(default)]
    pub datamap: DataMap,
}

impl Asset {
    /// Creates an asset with a fresh id.
    pub fn new(datamap: DataMap) -> Self {
        Self {
            id: Uuid::new_v4(),
            datamap,
        }
    }

    /// Creates an asset with a fresh id and a dedicated directory
    /// `<root>/<id>` recorded under [`BASE_ASSET_PATH`].
    pub fn with_base_path(datamap: DataMap, root: &Path) -> Result<Self, DbError> {
        let mut asset = Self::new(datamap);
        let base = root.join(asset.id.to_string());
        fs::create_dir_all(&base)
            .map_err(|e| classify_io_error(e, "Failed to create asset directory"))?;
        asset.datamap.insert(
            BASE_ASSET_PATH.to_string(),
            Value::String(base.to_string_lossy().into_owned()),
        );
        Ok(asset)
    }

    /// Returns the image path stored under `key`, or `default` if unset.
    pub fn image_path<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.string_value(key).unwrap_or(default)
    }

    /// Reserves an image path under the asset's base directory for `key`.
    ///
    /// Existing entries are left untouched.
    pub fn set_image_path(&mut self, key: &str) -> Result<(), DbError> {
        if self.datamap.contains_key(key) {
            return Ok(());
        }

        let base = self
            .string_value(BASE_ASSET_PATH)
            .ok_or(DbError::MissingBasePath(self.id))?;
        let path = format!("{}/{}.jpg", base, Uuid::new_v4());
        self.datamap.insert(key.to_string(), Value::String(path));
        Ok(())
    }

    pub fn set_url(&mut self, key: &str, url: &str) {
        self.datamap
            .insert(key.to_string(), Value::String(url.to_string()));
    }

    /// Returns the URL stored under `key`, or `default` if unset.
    pub fn url<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.string_value(key).unwrap_or(default)
    }

    /// Removes the entry stored under `key`.
    pub fn clear_asset(&mut self, key: &str) -> Result<(), DbError> {
        self.datamap
            .remove(key)
            .map(|_| ())
            .ok_or(DbError::UnknownAssetReference)
    }

    fn string_value(&self, key: &str) -> Option<&str> {
        self.datamap.get(key).and_then(Value::as_str)
    }
}

impl Record for Asset {
    fn key(&self) -> Uuid {
        self.id
    }
}
