//! I/O helpers shared by snapshot persistence and asset directories.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::error::DbError;

/// Maps an I/O error onto the matching `DbError` variant.
pub fn classify_io_error(error: std::io::Error, context: &str) -> DbError {
    let message = format!("{}: {}", context, error);
    match error.kind() {
        ErrorKind::StorageFull | ErrorKind::OutOfMemory => DbError::DiskFull(message),
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
            DbError::TransientIoError(message)
        }
        _ => DbError::IoError(message),
    }
}

/// Runs `operation`, retrying up to `max_retries` times while it fails
/// with a transient I/O error.
pub fn retry_io_operation<F, T>(
    mut operation: F,
    max_retries: u32,
    retry_delay_ms: u64,
    context: &str,
) -> Result<T, DbError>
where
    F: FnMut() -> Result<T, DbError>,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Err(DbError::TransientIoError(msg)) if attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    "Transient I/O error in {} (attempt {}/{}): {}",
                    context,
                    attempt,
                    max_retries,
                    msg
                );
                if retry_delay_ms > 0 {
                    thread::sleep(Duration::from_millis(retry_delay_ms));
                }
            }
            result => return result,
        }
    }
}

/// Writes `contents` to `path` through a synced temporary file and an
/// atomic rename.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), DbError> {
    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)
        .map_err(|e| classify_io_error(e, "Failed to create temp file"))?;
    file.write_all(contents)
        .map_err(|e| classify_io_error(e, "Failed to write temp file"))?;
    file.sync_all()
        .map_err(|e| classify_io_error(e, "Failed to sync temp file"))?;

    fs::rename(&temp_path, path).map_err(|e| classify_io_error(e, "Failed to rename temp file"))
}
