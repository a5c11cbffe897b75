use crate::index::IndexEntry;

/// Metadata distilled from one on-disk session record, independent of which
/// wire format it was stored in.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSummary {
    pub title: String,
    /// Milliseconds since the epoch of the most recent activity.
    pub last_activity: i64,
    /// Where the session was opened in the host UI (e.g. "panel").
    pub location: String,
    /// True when the record holds no conversational turns.
    pub is_empty: bool,
}

impl RecordSummary {
    /// Build the index entry the host expects for this record.
    pub fn to_entry(&self, session_id: &str) -> IndexEntry {
        IndexEntry {
            session_id: session_id.to_string(),
            title: self.title.clone(),
            last_message_date: self.last_activity,
            is_imported: false,
            initial_location: self.location.clone(),
            is_empty: self.is_empty,
        }
    }
}
