use rusqlite::OpenFlags;
use serde::Deserialize;
use std::path::PathBuf;

/// How the database file is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Open for reading and writing, creating the file if missing.
    #[default]
    ReadWriteCreate,
    /// Open for reading and writing; the file must exist.
    ReadWrite,
    ReadOnly,
}

impl OpenMode {
    pub(crate) fn flags(self) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        match self {
            OpenMode::ReadWriteCreate => {
                base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            }
            OpenMode::ReadWrite => base | OpenFlags::SQLITE_OPEN_READ_WRITE,
            OpenMode::ReadOnly => base | OpenFlags::SQLITE_OPEN_READ_ONLY,
        }
    }
}

/// Database configuration, fixed at [`Database::open`](crate::Database::open).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file (`:memory:` for a private in-memory database)
    pub path: PathBuf,
    #[serde(default)]
    pub mode: OpenMode,
    /// Log every statement the engine runs at `debug` level.
    #[serde(default)]
    pub verbose: bool,
    /// Value of `PRAGMA foreign_keys`, set on every open.
    #[serde(default)]
    pub foreign_keys: bool,
}

impl DatabaseConfig {
    /// Create a new config for the database at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: OpenMode::default(),
            verbose: false,
            foreign_keys: false,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    pub fn with_mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let config: DatabaseConfig = serde_json::from_str(r#"{"path": "app.db"}"#).unwrap();
        assert_eq!(config, DatabaseConfig::new("app.db"));
    }

    #[test]
    fn deserializes_mode_and_flags() {
        let config: DatabaseConfig = serde_json::from_str(
            r#"{"path": "app.db", "mode": "read_only", "verbose": true, "foreign_keys": true}"#,
        )
        .unwrap();
        assert_eq!(config.mode, OpenMode::ReadOnly);
        assert!(config.verbose);
        assert!(config.foreign_keys);
    }

    #[test]
    fn read_only_never_creates() {
        let flags = OpenMode::ReadOnly.flags();
        assert!(flags.contains(OpenFlags::SQLITE_OPEN_READ_ONLY));
        assert!(!flags.contains(OpenFlags::SQLITE_OPEN_CREATE));
    }
}
