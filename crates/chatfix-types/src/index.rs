use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const INDEX_VERSION: i64 = 1;

/// One session as the host's index sees it. Field names follow the host's
/// wire format exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub session_id: String,
    pub title: String,
    /// Milliseconds since the epoch.
    pub last_message_date: i64,
    #[serde(default)]
    pub is_imported: bool,
    #[serde(default = "default_location")]
    pub initial_location: String,
    #[serde(default)]
    pub is_empty: bool,
}

fn default_location() -> String {
    "panel".to_string()
}

/// The database-resident session index: a version number plus a map from
/// session identifier to entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionIndex {
    #[serde(default = "default_version")]
    pub version: i64,
    #[serde(default)]
    pub entries: BTreeMap<String, IndexEntry>,
}

fn default_version() -> i64 {
    INDEX_VERSION
}

impl Default for SessionIndex {
    fn default() -> Self {
        Self {
            version: INDEX_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

impl SessionIndex {
    /// An index is internally consistent when every entry's session
    /// identifier equals its key.
    pub fn is_consistent(&self) -> bool {
        self.entries.iter().all(|(k, e)| *k == e.session_id)
    }

    pub fn session_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
