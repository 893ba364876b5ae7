//! Storage engine for the user database service.
//!
//! Holds users, products, projects and their key-value assets in an
//! in-memory store with copy-on-write transactions, and persists
//! snapshots of it to checksummed files on disk.

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod operations;
pub mod persistence;
pub mod table;
pub mod transaction;
