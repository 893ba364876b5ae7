//! Users and their settings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::asset::Asset;
use crate::table::Record;

/// User settings key toggling two-step verification.
pub const TWO_STEPS_VERIF: &str = "two_steps_verif";

/// Stored user row. Settings and assets live in their own tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(with = "base64_bytes")]
    pub password: Vec<u8>,
    pub settings_id: Uuid,
    pub assets_id: Uuid,
}

impl Record for User {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// A user joined with its settings and assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub id: Uuid,
    #[serde(rename = "username")]
    pub name: String,
    pub email: String,
    #[serde(with = "base64_bytes")]
    pub password: Vec<u8>,
    pub settings: Asset,
    pub assets: Asset,
}

/// Serializes raw bytes as standard base64 text.
pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataMap;

    #[test]
    fn test_user_data_wire_shape() {
        let user = UserData {
            id: Uuid::new_v4(),
            name: "testUser".to_string(),
            email: "testEmail".to_string(),
            password: b"testPassword".to_vec(),
            settings: Asset::new(DataMap::new()),
            assets: Asset::new(DataMap::new()),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["username"], "testUser");
        assert_eq!(json["password"], "dGVzdFBhc3N3b3Jk");
        assert!(json.get("name").is_none());

        let back: UserData = serde_json::from_value(json).unwrap();
        assert_eq!(back.password, b"testPassword");
    }
}
