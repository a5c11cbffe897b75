use chatfix_types::{StorageLocation, normalize_workspace_identity};
use std::collections::BTreeMap;
use std::time::SystemTime;

/// Several storage locations that resolve to the same logical workspace.
/// The active location absorbs the donors' records; donors are never
/// mutated.
#[derive(Debug, Clone)]
pub struct MergeGroup {
    /// Normalized workspace identity shared by every member.
    pub identity: String,
    /// Most recently modified member, by database file mtime.
    pub active: StorageLocation,
    pub donors: Vec<StorageLocation>,
}

/// Group locations by workspace identity and pick each group's active
/// member.
///
/// Locations without a recoverable identity cannot be grouped and are left
/// out; that is an exclusion, not an error. Groups of one need no merging
/// and are dropped too.
pub fn merge_groups(locations: &[StorageLocation]) -> Vec<MergeGroup> {
    let mut by_identity: BTreeMap<String, Vec<StorageLocation>> = BTreeMap::new();
    for location in locations {
        let Some(identity) = location
            .workspace_path
            .as_deref()
            .and_then(normalize_workspace_identity)
        else {
            continue;
        };
        by_identity.entry(identity).or_default().push(location.clone());
    }

    by_identity
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(identity, mut members)| {
            members.sort_by_key(|loc| std::cmp::Reverse(db_mtime(loc)));
            let active = members.remove(0);
            MergeGroup {
                identity,
                active,
                donors: members,
            }
        })
        .collect()
}

fn db_mtime(location: &StorageLocation) -> SystemTime {
    std::fs::metadata(&location.db_path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}
