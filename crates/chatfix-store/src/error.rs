use std::fmt;
use std::path::PathBuf;

/// Result type for chatfix-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the store layer
#[derive(Debug)]
pub enum Error {
    /// The pre-write backup copy could not be created
    BackupFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The database is held by another process (usually the host application)
    DatabaseLocked { path: PathBuf },

    /// SQLite operation failed
    Sqlite(rusqlite::Error),

    /// A value could not be serialized for storage
    Encode(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackupFailed { path, source } => {
                write!(f, "Backup failed for {}: {}", path.display(), source)
            }
            Error::DatabaseLocked { path } => write!(
                f,
                "Database locked: {} (close the host application and retry)",
                path.display()
            ),
            Error::Sqlite(err) => write!(f, "Database error: {}", err),
            Error::Encode(err) => write!(f, "Encoding error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::BackupFailed { source, .. } => Some(source),
            Error::DatabaseLocked { .. } => None,
            Error::Sqlite(err) => Some(err),
            Error::Encode(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Encode(err)
    }
}
