//! `KEY=value` env file used to locate the server under test.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::HarnessError;

/// Default env file name, looked up in the working directory.
pub const DEFAULT_ENV_FILE: &str = ".env.functional_test";

/// Key holding the server port.
pub const PORT_KEY: &str = "USER_DB_PORT";

/// Parses `KEY=value` lines. Blank lines, `#` comments and lines without
/// `=` are skipped.
pub fn parse(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Reads the server port from an env file.
pub fn read_port(path: &Path) -> Result<u16, HarnessError> {
    let env_error = |message: String| HarnessError::EnvFile {
        path: path.display().to_string(),
        message,
    };

    let contents = fs::read_to_string(path).map_err(|e| env_error(e.to_string()))?;
    let variables = parse(&contents);
    let port = variables
        .get(PORT_KEY)
        .ok_or_else(|| env_error(format!("{} is not set", PORT_KEY)))?;
    port.parse()
        .map_err(|_| env_error(format!("{} is not a port: {}", PORT_KEY, port)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_lines() {
        let vars = parse("# server\nUSER_DB_PORT = 8081\n\nUSER_DB_HOST=localhost\nFLAG\n");
        assert_eq!(vars.get("USER_DB_PORT").map(String::as_str), Some("8081"));
        assert_eq!(vars.get("USER_DB_HOST").map(String::as_str), Some("localhost"));
        assert!(!vars.contains_key("FLAG"));
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn test_read_port() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_ENV_FILE);

        std::fs::write(&path, "USER_DB_PORT=9090\n").unwrap();
        assert_eq!(read_port(&path).unwrap(), 9090);

        std::fs::write(&path, "USER_DB_PORT=http\n").unwrap();
        assert!(matches!(read_port(&path), Err(HarnessError::EnvFile { .. })));

        std::fs::write(&path, "OTHER=1\n").unwrap();
        assert!(matches!(read_port(&path), Err(HarnessError::EnvFile { .. })));

        assert!(read_port(&dir.path().join("absent")).is_err());
    }
}
