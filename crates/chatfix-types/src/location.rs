use std::path::PathBuf;

use crate::util::project_name;

/// One workspace's persisted state: an embedded key-value database plus a
/// directory of session record files.
///
/// Locations are discovered by enumerating the host's storage root; the
/// engine reads them but never creates new ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    /// Stable identifier, taken from the storage directory name.
    pub id: String,
    /// Human-readable workspace path or URI, when the location metadata
    /// records one.
    pub workspace_path: Option<String>,
    /// Path to the embedded database file (may not exist yet).
    pub db_path: PathBuf,
    /// Path to the session record directory (may not exist yet).
    pub records_dir: PathBuf,
}

impl StorageLocation {
    /// Final path segment of the workspace path, used for similarity scoring.
    pub fn project_name(&self) -> Option<String> {
        self.workspace_path.as_deref().and_then(project_name)
    }

    /// User-facing label: project name plus the storage id.
    pub fn display_name(&self) -> String {
        match self.project_name() {
            Some(name) => format!("{} ({})", name, self.id),
            None => format!("Unknown ({})", self.id),
        }
    }
}
