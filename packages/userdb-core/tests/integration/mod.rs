//! Integration tests for the storage engine.
//!
//! 1. Users and product membership
//! 2. Products
//! 3. Projects and viewers
//! 4. Snapshot persistence

pub mod helpers;
pub mod persistence_tests;
pub mod products_tests;
pub mod projects_tests;
pub mod users_tests;
