use crate::cache;
use chatfix_records::ScanOutcome;
use chatfix_store::StoreSnapshot;
use chatfix_types::{IndexEntry, StorageLocation};
use std::collections::BTreeMap;

/// The difference between what a location's record directory holds and what
/// its index claims. Pure data; nothing here touches the filesystem or the
/// database.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationPlan {
    pub location_id: String,
    /// On disk, absent from the index: to be added.
    pub missing: Vec<String>,
    /// In the index, absent on disk: reported, removed only on request.
    pub orphaned: Vec<String>,
    /// Present in both; left untouched.
    pub matched: Vec<String>,
    /// Non-empty sessions on disk with no entry in the resource cache.
    pub cache_missing: Vec<String>,
    /// Fully-built index entries for every `missing` identifier.
    pub additions: BTreeMap<String, IndexEntry>,
}

impl ReconciliationPlan {
    pub fn needs_repair(&self) -> bool {
        !self.missing.is_empty() || !self.orphaned.is_empty() || !self.cache_missing.is_empty()
    }
}

/// Diff scanned records against the stored index for one location.
pub fn plan(
    location: &StorageLocation,
    scan: &ScanOutcome,
    snapshot: &StoreSnapshot,
) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan {
        location_id: location.id.clone(),
        ..ReconciliationPlan::default()
    };

    for id in scan.sessions.keys() {
        if snapshot.index.entries.contains_key(id) {
            plan.matched.push(id.clone());
        } else {
            plan.missing.push(id.clone());
        }
    }
    for id in snapshot.index.entries.keys() {
        if !scan.sessions.contains_key(id) {
            plan.orphaned.push(id.clone());
        }
    }

    for id in &plan.missing {
        plan.additions
            .insert(id.clone(), scan.sessions[id].to_entry(id));
    }

    let cached = cache::chat_session_resources(&snapshot.model_cache);
    for (id, summary) in &scan.sessions {
        let empty = summary.is_empty
            || snapshot
                .index
                .entries
                .get(id)
                .is_some_and(|entry| entry.is_empty);
        if !empty && !cached.contains(&cache::resource_for(id)) {
            plan.cache_missing.push(id.clone());
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatfix_types::RecordSummary;
    use std::path::PathBuf;

    fn location() -> StorageLocation {
        StorageLocation {
            id: "loc1".to_string(),
            workspace_path: None,
            db_path: PathBuf::from("/tmp/none/state.db"),
            records_dir: PathBuf::from("/tmp/none/sessions"),
        }
    }

    fn summary(title: &str) -> RecordSummary {
        RecordSummary {
            title: title.to_string(),
            last_activity: 10,
            location: "panel".to_string(),
            is_empty: false,
        }
    }

    fn scan_with(ids: &[&str]) -> ScanOutcome {
        let mut scan = ScanOutcome::default();
        for id in ids {
            scan.sessions.insert(id.to_string(), summary(id));
        }
        scan
    }

    fn snapshot_with(ids: &[&str]) -> StoreSnapshot {
        let mut snapshot = StoreSnapshot::default();
        for id in ids {
            snapshot
                .index
                .entries
                .insert(id.to_string(), summary(id).to_entry(id));
        }
        snapshot
    }

    #[test]
    fn sets_partition_disk_and_index() {
        let scan = scan_with(&["a", "b", "c"]);
        let snapshot = snapshot_with(&["b", "c", "d"]);

        let plan = plan(&location(), &scan, &snapshot);

        assert_eq!(plan.missing, vec!["a"]);
        assert_eq!(plan.orphaned, vec!["d"]);
        assert_eq!(plan.matched, vec!["b", "c"]);

        // missing ∩ orphaned = ∅, missing ∪ matched = on-disk set
        assert!(plan.missing.iter().all(|id| !plan.orphaned.contains(id)));
        let mut rebuilt: Vec<_> = plan.missing.iter().chain(&plan.matched).cloned().collect();
        rebuilt.sort();
        assert_eq!(rebuilt, vec!["a", "b", "c"]);
    }

    #[test]
    fn additions_carry_scanned_metadata() {
        let scan = scan_with(&["a"]);
        let snapshot = StoreSnapshot::default();

        let plan = plan(&location(), &scan, &snapshot);

        assert_eq!(plan.additions.len(), 1);
        let entry = &plan.additions["a"];
        assert_eq!(entry.session_id, "a");
        assert_eq!(entry.title, "a");
        assert!(!entry.is_imported);
    }

    #[test]
    fn identical_sides_need_no_repair() {
        let scan = scan_with(&["a"]);
        let mut snapshot = snapshot_with(&["a"]);
        cache::add_missing_entries(
            &mut snapshot.model_cache,
            &mut snapshot.state_cache,
            &snapshot.index.entries.clone(),
        );

        let plan = plan(&location(), &scan, &snapshot);
        assert!(!plan.needs_repair());
        assert!(plan.cache_missing.is_empty());
    }

    #[test]
    fn non_empty_sessions_missing_from_cache_are_flagged() {
        let scan = scan_with(&["a"]);
        let snapshot = snapshot_with(&["a"]);

        let plan = plan(&location(), &scan, &snapshot);
        assert_eq!(plan.cache_missing, vec!["a"]);
        assert!(plan.needs_repair());
    }
}
