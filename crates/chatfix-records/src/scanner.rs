use crate::error::Result;
use crate::parser::{RecordFormat, parse_record};
use chatfix_types::{RecordSummary, StorageLocation};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One record file that could not be decoded. Collected, never fatal to the
/// scan.
#[derive(Debug, Clone)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything a single pass over a location's record directory produced.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Session identifier to decoded metadata.
    pub sessions: BTreeMap<String, RecordSummary>,
    /// Every record file seen per identifier, all encodings included.
    pub files: BTreeMap<String, Vec<PathBuf>>,
    pub failures: Vec<ScanFailure>,
    /// Total mutation-log lines skipped as unparseable across the scan.
    pub skipped_lines: usize,
}

impl ScanOutcome {
    pub fn has_sessions(&self) -> bool {
        !self.sessions.is_empty()
    }

    pub fn session_ids(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }
}

/// Scan a storage location's record directory.
pub fn scan_location(location: &StorageLocation) -> Result<ScanOutcome> {
    scan_records_dir(&location.records_dir)
}

/// Scan a record directory: one non-recursive listing, then one parse per
/// session. Files whose extension is not a known record encoding are
/// ignored. A missing directory scans as empty. The scan never writes.
pub fn scan_records_dir(dir: &Path) -> Result<ScanOutcome> {
    let mut outcome = ScanOutcome::default();
    if !dir.is_dir() {
        return Ok(outcome);
    }

    // The listing is read once up front; parsing below never re-reads it.
    let mut chosen: BTreeMap<String, (RecordFormat, PathBuf)> = BTreeMap::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let stem = path.file_stem().and_then(|s| s.to_str());
        let ext = path.extension().and_then(|s| s.to_str());
        let (Some(stem), Some(ext)) = (stem, ext) else {
            continue;
        };
        let Some(format) = RecordFormat::from_extension(ext) else {
            continue;
        };
        if stem.is_empty() {
            continue;
        }

        outcome
            .files
            .entry(stem.to_string())
            .or_default()
            .push(path.clone());

        // When both encodings exist for one identifier the mutation log wins;
        // the snapshot is a stale sibling left behind by the host.
        chosen
            .entry(stem.to_string())
            .and_modify(|slot| {
                if slot.0 == RecordFormat::Snapshot && format == RecordFormat::MutationLog {
                    *slot = (format, path.clone());
                }
            })
            .or_insert((format, path.clone()));
    }

    for (id, (format, path)) in chosen {
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                outcome.failures.push(ScanFailure {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match parse_record(&path, &bytes, format, file_mtime_millis(&path)) {
            Ok(parsed) => {
                outcome.skipped_lines += parsed.skipped_lines;
                outcome.sessions.insert(id, parsed.summary);
            }
            Err(e) => outcome.failures.push(ScanFailure {
                path,
                reason: e.to_string(),
            }),
        }
    }

    Ok(outcome)
}

fn file_mtime_millis(path: &Path) -> i64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(|t| chrono::DateTime::<chrono::Utc>::from(t).timestamp_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn scans_both_encodings_and_ignores_unknown_extensions() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "aaa.snapshot",
            r#"{"title":"one","turns":[{"text":"x","timestamp":1}]}"#,
        );
        write(
            tmp.path(),
            "bbb.mutationlog",
            r#"{"kind":"init","v":{"title":"two","turns":[]}}"#,
        );
        write(tmp.path(), "notes.txt", "ignored");
        write(tmp.path(), "ccc.json", "{}");

        let outcome = scan_records_dir(tmp.path()).unwrap();

        assert_eq!(outcome.sessions.len(), 2);
        assert_eq!(outcome.sessions["aaa"].title, "one");
        assert_eq!(outcome.sessions["bbb"].title, "two");
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn mutation_log_wins_when_both_encodings_exist() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "s.snapshot", r#"{"title":"stale","turns":[]}"#);
        write(
            tmp.path(),
            "s.mutationlog",
            r#"{"kind":"init","v":{"title":"fresh","turns":[]}}"#,
        );

        let outcome = scan_records_dir(tmp.path()).unwrap();

        assert_eq!(outcome.sessions["s"].title, "fresh");
        assert_eq!(outcome.files["s"].len(), 2);
    }

    #[test]
    fn parse_failures_are_collected_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "good.snapshot", r#"{"title":"ok","turns":[]}"#);
        write(tmp.path(), "bad.snapshot", "{ nope");

        let outcome = scan_records_dir(tmp.path()).unwrap();

        assert_eq!(outcome.sessions.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].path.ends_with("bad.snapshot"));
    }

    #[test]
    fn missing_directory_scans_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let outcome = scan_records_dir(&tmp.path().join("absent")).unwrap();
        assert!(!outcome.has_sessions());
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn empty_turns_fall_back_to_file_mtime() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "e.snapshot", r#"{"turns":[]}"#);

        let outcome = scan_records_dir(tmp.path()).unwrap();
        let summary = &outcome.sessions["e"];
        assert!(summary.is_empty);
        assert!(summary.last_activity > 0);
    }
}
