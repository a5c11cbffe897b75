use std::fmt;
use std::path::PathBuf;

/// Result type for chatfix-records operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while decoding record files
#[derive(Debug)]
pub enum Error {
    /// A record file could not be decoded into a metadata summary
    MalformedRecord { path: PathBuf, reason: String },

    /// IO operation failed
    Io(std::io::Error),
}

impl Error {
    pub(crate) fn malformed(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedRecord { path, reason } => {
                write!(f, "Malformed record {}: {}", path.display(), reason)
            }
            Error::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MalformedRecord { .. } => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
