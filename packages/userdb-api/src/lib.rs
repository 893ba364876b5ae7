//! HTTP API for the user database.
//!
//! Exposes user, product, project and viewer operations as JSON
//! endpoints wrapped in an `{"error", "data"}` envelope.

pub mod handlers;
pub mod router;
pub mod server;
