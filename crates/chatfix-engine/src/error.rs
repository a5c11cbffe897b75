use std::fmt;
use std::path::PathBuf;

/// Result type for chatfix-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the engine layer
#[derive(Debug)]
pub enum Error {
    /// Record layer error
    Records(chatfix_records::Error),

    /// Store layer error
    Store(chatfix_store::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// The storage root itself could not be enumerated. The only failure
    /// that aborts a whole run.
    StorageRoot {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Records(err) => write!(f, "Record error: {}", err),
            Error::Store(err) => write!(f, "Store error: {}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::StorageRoot { path, source } => {
                write!(
                    f,
                    "Cannot enumerate storage root {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Records(err) => Some(err),
            Error::Store(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::StorageRoot { source, .. } => Some(source),
        }
    }
}

impl From<chatfix_records::Error> for Error {
    fn from(err: chatfix_records::Error) -> Self {
        Error::Records(err)
    }
}

impl From<chatfix_store::Error> for Error {
    fn from(err: chatfix_store::Error) -> Self {
        Error::Store(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
