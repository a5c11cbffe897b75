use crate::cache;
use crate::error::{Error, Result};
use crate::merge::MergeGroup;
use crate::ops::{RunMode, WriteGate};
use crate::reconcile;
use chatfix_records::{ScanOutcome, scan_location};
use chatfix_store as store;
use chatfix_types::StorageLocation;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Progress events emitted while folding a merge group into its active
/// location.
#[derive(Debug, Clone)]
pub enum MergeProgress {
    SessionCopied {
        session_id: String,
        donor_id: String,
    },
    CopyFailed {
        path: PathBuf,
        reason: String,
    },
    EntryAdded {
        session_id: String,
        title: String,
    },
    BackupCreated {
        path: PathBuf,
    },
}

#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub identity: String,
    pub active_id: String,
    pub files_copied: usize,
    pub sessions_copied: usize,
    pub entries_added: usize,
    pub cache_items_merged: usize,
    /// True only when a write actually landed.
    pub applied: bool,
    pub errors: Vec<String>,
}

/// Fold every donor in the group into the active location: copy record
/// files the active location lacks, merge the auxiliary caches key-wise,
/// then run a reconciliation pass so the copied records enter the index.
///
/// Donors are read, never written; nothing is ever deleted.
pub fn apply_merge(
    group: &MergeGroup,
    mode: RunMode,
    mut on_progress: impl FnMut(MergeProgress),
) -> Result<MergeOutcome> {
    let gate = WriteGate::new(mode);
    let mut outcome = MergeOutcome {
        identity: group.identity.clone(),
        active_id: group.active.id.clone(),
        ..MergeOutcome::default()
    };

    let active_scan = scan_location(&group.active)?;
    let mut donor_scans = Vec::new();
    for donor in &group.donors {
        match scan_location(donor) {
            Ok(scan) => donor_scans.push((donor.clone(), scan)),
            Err(e) => outcome
                .errors
                .push(format!("cannot scan donor {}: {}", donor.id, e)),
        }
    }

    // Copy record files for sessions the active location lacks. The first
    // donor carrying a session wins; later duplicates are skipped.
    let mut copied_files: BTreeSet<PathBuf> = BTreeSet::new();
    let mut copied_sessions: BTreeSet<String> = BTreeSet::new();
    for (donor, scan) in &donor_scans {
        for (session_id, files) in &scan.files {
            if active_scan.files.contains_key(session_id)
                || copied_sessions.contains(session_id)
            {
                continue;
            }

            let mut copied_any = false;
            for src in files {
                let Some(name) = src.file_name() else {
                    continue;
                };
                let dst = group.active.records_dir.join(name);
                if dst.exists() || copied_files.contains(&dst) {
                    continue;
                }
                let result = gate.mutate(|| {
                    std::fs::create_dir_all(&group.active.records_dir)?;
                    std::fs::copy(src, &dst)?;
                    Ok(())
                });
                match result {
                    Ok(_) => {
                        copied_files.insert(dst);
                        outcome.files_copied += 1;
                        copied_any = true;
                    }
                    Err(e) => outcome
                        .errors
                        .push(format!("copy {} failed: {}", src.display(), e)),
                }
            }

            if copied_any {
                copied_sessions.insert(session_id.clone());
                outcome.sessions_copied += 1;
                on_progress(MergeProgress::SessionCopied {
                    session_id: session_id.clone(),
                    donor_id: donor.id.clone(),
                });
            }
        }
    }

    // Fold donor caches into the active snapshot, last write wins per key.
    let snapshot = store::read(&group.active.db_path)?;
    let mut next = snapshot.clone();
    let mut lww_changed = 0;
    for (donor, _) in &donor_scans {
        match store::read(&donor.db_path) {
            Ok(donor_snapshot) => {
                lww_changed +=
                    cache::merge_keyed_lww(&mut next.model_cache, &donor_snapshot.model_cache);
                lww_changed +=
                    cache::merge_keyed_lww(&mut next.state_cache, &donor_snapshot.state_cache);
            }
            Err(e) => outcome
                .errors
                .push(format!("cannot read donor store {}: {}", donor.id, e)),
        }
    }

    // Reconciliation pass over the active location folds the copied records
    // into its index. Under preview the copies never happened, so the pass
    // runs against a simulated combined scan instead of the disk.
    let rescan = if gate.is_preview() {
        simulated_scan(&active_scan, &donor_scans)
    } else {
        scan_location(&group.active)?
    };
    let plan = reconcile::plan(&group.active, &rescan, &next);
    for (session_id, entry) in &plan.additions {
        on_progress(MergeProgress::EntryAdded {
            session_id: session_id.clone(),
            title: entry.title.clone(),
        });
        next.index.entries.insert(session_id.clone(), entry.clone());
        outcome.entries_added += 1;
    }
    let cache_added = cache::add_missing_entries(
        &mut next.model_cache,
        &mut next.state_cache,
        &next.index.entries,
    );
    outcome.cache_items_merged = lww_changed + cache_added;

    let dirty = outcome.entries_added > 0 || outcome.cache_items_merged > 0;
    if dirty {
        let receipt =
            gate.mutate(|| store::write(&group.active.db_path, &next).map_err(Error::from))?;
        if let Some(receipt) = receipt {
            outcome.applied = true;
            if let Some(path) = receipt.backup_path {
                on_progress(MergeProgress::BackupCreated { path });
            }
        }
    }

    Ok(outcome)
}

/// What the active location's record directory would look like after the
/// copies, without performing them.
fn simulated_scan(
    active: &ScanOutcome,
    donors: &[(StorageLocation, ScanOutcome)],
) -> ScanOutcome {
    let mut combined = ScanOutcome {
        sessions: active.sessions.clone(),
        files: active.files.clone(),
        ..ScanOutcome::default()
    };
    for (_, scan) in donors {
        for (session_id, summary) in &scan.sessions {
            combined
                .sessions
                .entry(session_id.clone())
                .or_insert_with(|| summary.clone());
        }
        for (session_id, files) in &scan.files {
            combined
                .files
                .entry(session_id.clone())
                .or_insert_with(|| files.clone());
        }
    }
    combined
}
