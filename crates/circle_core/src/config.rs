//! Runtime configuration resolved from the host environment.
//!
//! # Invariants
//! - An explicit path wins over `CIRCLE_DB_PATH`, which wins over the
//!   temp-dir default.
//! - Blank values are treated as unset.

use std::path::PathBuf;

/// Environment variable overriding the snapshot database location.
pub const DB_PATH_ENV: &str = "CIRCLE_DB_PATH";
/// File name used under the temp dir when nothing else is configured.
pub const DEFAULT_DB_FILE_NAME: &str = "circle_state.sqlite3";

/// Resolves the snapshot database path.
pub fn resolve_db_path(explicit: Option<&str>) -> PathBuf {
    let from_env = std::env::var(DB_PATH_ENV).ok();
    resolve_db_path_from(explicit, from_env.as_deref())
}

fn resolve_db_path_from(explicit: Option<&str>, from_env: Option<&str>) -> PathBuf {
    [explicit, from_env]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::{resolve_db_path_from, DEFAULT_DB_FILE_NAME};
    use std::path::PathBuf;

    #[test]
    fn explicit_path_wins_over_env() {
        let path = resolve_db_path_from(Some("/data/a.db"), Some("/data/b.db"));
        assert_eq!(path, PathBuf::from("/data/a.db"));
    }

    #[test]
    fn blank_values_fall_through_to_default() {
        let path = resolve_db_path_from(Some("  "), Some(""));
        assert_eq!(path, std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
    }

    #[test]
    fn env_value_is_trimmed() {
        let path = resolve_db_path_from(None, Some(" /data/c.db "));
        assert_eq!(path, PathBuf::from("/data/c.db"));
    }
}
