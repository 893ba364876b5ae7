//! Shared fixtures for integration tests.

use uuid::Uuid;

use userdb_core::config::DbConfig;
use userdb_core::database::Database;
use userdb_core::models::{ProductData, ProjectData, UserData, Visibility};

pub fn memory_db() -> Database {
    Database::new(DbConfig::default())
}

pub fn add_user(db: &Database, name: &str) -> UserData {
    db.create_user(name, &format!("{}@example.com", name), b"testPassword")
        .unwrap()
}

pub fn add_product(db: &Database, name: &str, owner: &Uuid) -> ProductData {
    db.create_product(name, false, owner).unwrap()
}

pub fn add_project(db: &Database, name: &str, owner: &Uuid, product: &Uuid) -> ProjectData {
    db.create_project(name, Visibility::Protected, owner, product)
        .unwrap()
}
