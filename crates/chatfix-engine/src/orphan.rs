use chatfix_records::ScanOutcome;
use chatfix_types::StorageLocation;
use std::path::PathBuf;

/// How strongly a candidate location resembles the orphan's own location:
/// exact project-folder-name match or nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Similarity {
    SameProject,
    DifferentProject,
}

/// A record file for an orphaned identifier found in some other location.
#[derive(Debug, Clone)]
pub struct OrphanCandidate {
    pub location: StorageLocation,
    /// Every record file for the identifier, all encodings.
    pub files: Vec<PathBuf>,
    pub similarity: Similarity,
}

/// All candidates for one orphaned identifier, same-project matches first.
#[derive(Debug, Clone)]
pub struct OrphanResolution {
    pub session_id: String,
    pub candidates: Vec<OrphanCandidate>,
}

impl OrphanResolution {
    pub fn best(&self) -> Option<&OrphanCandidate> {
        self.candidates.first()
    }
}

/// Look up orphaned identifiers in the scans of every other location.
///
/// Read-only: scores and ranks, never copies. The project-name comparison is
/// a case-sensitive exact match on the final workspace-path segment; ranking
/// puts same-project candidates first and otherwise preserves the order the
/// locations were discovered in.
pub fn resolve(
    origin: &StorageLocation,
    orphaned: &[String],
    others: &[(StorageLocation, ScanOutcome)],
) -> Vec<OrphanResolution> {
    let origin_project = origin.project_name();

    orphaned
        .iter()
        .map(|session_id| {
            let mut candidates: Vec<OrphanCandidate> = others
                .iter()
                .filter(|(loc, _)| loc.id != origin.id)
                .filter_map(|(loc, scan)| {
                    let files = scan.files.get(session_id)?;
                    let similarity = match (&origin_project, loc.project_name()) {
                        (Some(a), Some(b)) if *a == b => Similarity::SameProject,
                        _ => Similarity::DifferentProject,
                    };
                    Some(OrphanCandidate {
                        location: loc.clone(),
                        files: files.clone(),
                        similarity,
                    })
                })
                .collect();

            // Stable sort keeps discovery order within each score band.
            candidates.sort_by_key(|c| c.similarity != Similarity::SameProject);

            OrphanResolution {
                session_id: session_id.clone(),
                candidates,
            }
        })
        .collect()
}
