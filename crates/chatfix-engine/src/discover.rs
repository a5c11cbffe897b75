use crate::error::{Error, Result};
use chatfix_types::StorageLocation;
use serde::Deserialize;
use std::path::Path;
use walkdir::WalkDir;

/// Database file inside a storage location directory.
pub const DB_FILE: &str = "state.db";
/// Record directory inside a storage location directory.
pub const RECORDS_DIR: &str = "sessions";
/// Optional metadata file recording which workspace the location belongs to.
pub const WORKSPACE_META_FILE: &str = "workspace.json";

#[derive(Debug, Deserialize)]
struct WorkspaceMetaFile {
    #[serde(default)]
    folder: Option<FolderRef>,
    #[serde(default)]
    workspace: Option<String>,
}

/// The `folder` field is either a bare path string or an object with a
/// `path` field, depending on host version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FolderRef {
    Path(String),
    Object { path: String },
}

/// Enumerate every storage location under the root.
///
/// An unreadable root is the one fatal condition of a run; individual
/// location directories that fail to read are skipped.
pub fn discover_locations(storage_root: &Path) -> Result<Vec<StorageLocation>> {
    let meta = std::fs::metadata(storage_root).map_err(|source| Error::StorageRoot {
        path: storage_root.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(Error::StorageRoot {
            path: storage_root.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                "storage root is not a directory",
            ),
        });
    }

    let mut locations = Vec::new();
    for entry in WalkDir::new(storage_root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let dir = entry.path();
        locations.push(StorageLocation {
            id: entry.file_name().to_string_lossy().into_owned(),
            workspace_path: read_workspace_meta(&dir.join(WORKSPACE_META_FILE)),
            db_path: dir.join(DB_FILE),
            records_dir: dir.join(RECORDS_DIR),
        });
    }

    locations.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(locations)
}

fn read_workspace_meta(path: &Path) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    let meta: WorkspaceMetaFile = serde_json::from_slice(&bytes).ok()?;
    match meta.folder {
        Some(FolderRef::Path(p)) => Some(p),
        Some(FolderRef::Object { path }) => Some(path),
        None => meta.workspace,
    }
}
