use crate::cache;
use crate::error::{Error, Result};
use crate::ops::{RunMode, WriteGate};
use crate::orphan::{self, OrphanResolution};
use crate::reconcile::{self, ReconciliationPlan};
use chatfix_records::{ScanFailure, ScanOutcome, scan_location};
use chatfix_store::{self as store, StoreSnapshot};
use chatfix_types::{INDEX_VERSION, StorageLocation};
use std::path::PathBuf;

/// Read-only health report for one location.
#[derive(Debug)]
pub struct LocationReport {
    pub location: StorageLocation,
    pub on_disk: usize,
    pub in_index: usize,
    pub in_cache: usize,
    pub plan: ReconciliationPlan,
    pub failures: Vec<ScanFailure>,
}

impl LocationReport {
    pub fn needs_repair(&self) -> bool {
        self.plan.needs_repair()
    }

    pub fn has_sessions(&self) -> bool {
        self.on_disk > 0
    }
}

/// Result of surveying every location. Per-location failures land in
/// `errors`; they never abort the survey.
#[derive(Debug, Default)]
pub struct Survey {
    pub reports: Vec<LocationReport>,
    pub errors: Vec<(String, Error)>,
}

pub fn survey(locations: &[StorageLocation]) -> Survey {
    let mut out = Survey::default();
    for location in locations {
        match survey_location(location) {
            Ok(report) => out.reports.push(report),
            Err(e) => out.errors.push((location.id.clone(), e)),
        }
    }
    out
}

fn survey_location(location: &StorageLocation) -> Result<LocationReport> {
    let (plan, scan, snapshot) = plan_location(location)?;
    Ok(LocationReport {
        location: location.clone(),
        on_disk: scan.sessions.len(),
        in_index: snapshot.index.entries.len(),
        in_cache: cache::chat_session_resources(&snapshot.model_cache).len(),
        plan,
        failures: scan.failures,
    })
}

/// Scan a location and diff it against its stored index.
pub fn plan_location(
    location: &StorageLocation,
) -> Result<(ReconciliationPlan, ScanOutcome, StoreSnapshot)> {
    let scan = scan_location(location)?;
    let snapshot = store::read(&location.db_path)?;
    let plan = reconcile::plan(location, &scan, &snapshot);
    Ok((plan, scan, snapshot))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RepairOptions {
    pub mode: RunMode,
    /// Drop index entries whose record file is gone. Off by default; orphans
    /// are kept and reported.
    pub remove_orphans: bool,
}

/// Progress events emitted while repairing; the caller decides how to
/// render them.
#[derive(Debug, Clone)]
pub enum RepairProgress {
    Scanning {
        location_id: String,
    },
    RecordFailure {
        path: PathBuf,
        reason: String,
    },
    Restored {
        session_id: String,
        title: String,
    },
    OrphanRemoved {
        session_id: String,
    },
    Recovered {
        session_id: String,
        donor_id: String,
    },
    CopyFailed {
        path: PathBuf,
        reason: String,
    },
    BackupCreated {
        path: PathBuf,
    },
}

#[derive(Debug, Default)]
pub struct RepairOutcome {
    pub location_id: String,
    pub restored: usize,
    pub removed_orphans: usize,
    pub kept_orphans: usize,
    pub cache_entries_added: usize,
    pub backup_path: Option<PathBuf>,
    /// True only when a write actually landed.
    pub applied: bool,
    pub failures: Vec<ScanFailure>,
}

/// Scan, plan, and apply in one step.
pub fn repair_location(
    location: &StorageLocation,
    options: &RepairOptions,
    mut on_progress: impl FnMut(RepairProgress),
) -> Result<RepairOutcome> {
    on_progress(RepairProgress::Scanning {
        location_id: location.id.clone(),
    });

    let (plan, scan, snapshot) = plan_location(location)?;
    for failure in &scan.failures {
        on_progress(RepairProgress::RecordFailure {
            path: failure.path.clone(),
            reason: failure.reason.clone(),
        });
    }

    let mut outcome = apply_plan(location, &plan, &snapshot, options, on_progress)?;
    outcome.failures = scan.failures;
    Ok(outcome)
}

/// Apply a previously computed plan to a location's store. All writes go
/// through the gate; under preview this computes the full outcome without
/// touching anything.
pub fn apply_plan(
    location: &StorageLocation,
    plan: &ReconciliationPlan,
    snapshot: &StoreSnapshot,
    options: &RepairOptions,
    mut on_progress: impl FnMut(RepairProgress),
) -> Result<RepairOutcome> {
    let mut outcome = RepairOutcome {
        location_id: plan.location_id.clone(),
        ..RepairOutcome::default()
    };
    let mut next = snapshot.clone();

    if options.remove_orphans {
        for session_id in &plan.orphaned {
            next.index.entries.remove(session_id);
            on_progress(RepairProgress::OrphanRemoved {
                session_id: session_id.clone(),
            });
            outcome.removed_orphans += 1;
        }
    } else {
        outcome.kept_orphans = plan.orphaned.len();
    }

    for (session_id, entry) in &plan.additions {
        on_progress(RepairProgress::Restored {
            session_id: session_id.clone(),
            title: entry.title.clone(),
        });
        next.index.entries.insert(session_id.clone(), entry.clone());
    }
    outcome.restored = plan.additions.len();
    next.index.version = INDEX_VERSION;

    outcome.cache_entries_added = cache::add_missing_entries(
        &mut next.model_cache,
        &mut next.state_cache,
        &next.index.entries,
    );

    let dirty = outcome.restored > 0
        || outcome.removed_orphans > 0
        || outcome.cache_entries_added > 0;
    if dirty {
        let gate = WriteGate::new(options.mode);
        let receipt = gate.mutate(|| store::write(&location.db_path, &next).map_err(Error::from))?;
        if let Some(receipt) = receipt {
            outcome.applied = true;
            outcome.backup_path = receipt.backup_path;
            if let Some(path) = &outcome.backup_path {
                on_progress(RepairProgress::BackupCreated { path: path.clone() });
            }
        }
    }

    Ok(outcome)
}

/// Look up a plan's orphans in every other location. Read-only; locations
/// that cannot be scanned simply offer no candidates.
pub fn resolve_orphans(
    origin: &StorageLocation,
    plan: &ReconciliationPlan,
    all_locations: &[StorageLocation],
) -> Vec<OrphanResolution> {
    let mut others = Vec::new();
    for location in all_locations {
        if location.id == origin.id {
            continue;
        }
        if let Ok(scan) = scan_location(location) {
            others.push((location.clone(), scan));
        }
    }
    orphan::resolve(origin, &plan.orphaned, &others)
}

/// Copy each resolution's best candidate back into the origin's record
/// directory. Distinct opt-in action; the next reconciliation pass folds
/// the copies into the index. Returns the number of sessions recovered.
pub fn recover_orphans(
    origin: &StorageLocation,
    resolutions: &[OrphanResolution],
    mode: RunMode,
    mut on_progress: impl FnMut(RepairProgress),
) -> Result<usize> {
    let gate = WriteGate::new(mode);
    let mut recovered = 0;

    for resolution in resolutions {
        let Some(candidate) = resolution.best() else {
            continue;
        };

        let mut copied = 0;
        for src in &candidate.files {
            let Some(name) = src.file_name() else {
                continue;
            };
            let dst = origin.records_dir.join(name);
            if dst.exists() {
                continue;
            }
            let result = gate.mutate(|| {
                std::fs::create_dir_all(&origin.records_dir)?;
                std::fs::copy(src, &dst)?;
                Ok(())
            });
            match result {
                Ok(_) => copied += 1,
                Err(e) => on_progress(RepairProgress::CopyFailed {
                    path: src.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        if copied > 0 {
            recovered += 1;
            on_progress(RepairProgress::Recovered {
                session_id: resolution.session_id.clone(),
                donor_id: candidate.location.id.clone(),
            });
        }
    }

    Ok(recovered)
}
