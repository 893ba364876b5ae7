//! Database configuration.

use std::path::PathBuf;

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Data directory for snapshot persistence (None = memory only)
    pub data_dir: Option<PathBuf>,
    /// Root directory under which asset folders are created (None = no folders)
    pub asset_root: Option<PathBuf>,
    /// Request body read timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Interval between snapshot flushes in milliseconds
    pub flush_interval_ms: u64,
    /// Time allowed for in-flight connections to finish on shutdown
    pub shutdown_timeout_ms: u64,
    /// Maximum retry attempts for transient I/O errors
    pub persistence_max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub persistence_retry_delay_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            asset_root: None,
            request_timeout_ms: 30_000,
            flush_interval_ms: 1_000,
            shutdown_timeout_ms: 10_000,
            persistence_max_retries: 3,
            persistence_retry_delay_ms: 100,
        }
    }
}
