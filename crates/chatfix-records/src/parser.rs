use crate::error::{Error, Result};
use crate::schema::{MutationOp, SessionState};
use chatfix_types::{RecordSummary, truncate_title};
use serde_json::{Map, Value};
use std::path::Path;

pub const SNAPSHOT_EXT: &str = "snapshot";
pub const MUTATION_LOG_EXT: &str = "mutationlog";

const MAX_TITLE_LEN: usize = 100;
const UNTITLED: &str = "Untitled Session";
const DEFAULT_UI_LOCATION: &str = "panel";

/// The two physical encodings a session record can use on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// One self-contained JSON object.
    Snapshot,
    /// Newline-delimited JSON operations replayed in file order.
    MutationLog,
}

impl RecordFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            SNAPSHOT_EXT => Some(RecordFormat::Snapshot),
            MUTATION_LOG_EXT => Some(RecordFormat::MutationLog),
            _ => None,
        }
    }
}

/// Outcome of decoding one record file.
#[derive(Debug)]
pub struct ParsedRecord {
    pub summary: RecordSummary,
    /// Mutation-log lines that were not valid JSON and were skipped.
    pub skipped_lines: usize,
}

/// Decode raw record bytes into a metadata summary.
///
/// `fallback_timestamp` (milliseconds) stands in for the last-activity time
/// when the record itself carries none; callers pass the file's modification
/// time.
pub fn parse_record(
    path: &Path,
    bytes: &[u8],
    format: RecordFormat,
    fallback_timestamp: i64,
) -> Result<ParsedRecord> {
    match format {
        RecordFormat::Snapshot => parse_snapshot(path, bytes, fallback_timestamp),
        RecordFormat::MutationLog => parse_mutation_log(path, bytes, fallback_timestamp),
    }
}

fn parse_snapshot(path: &Path, bytes: &[u8], fallback_timestamp: i64) -> Result<ParsedRecord> {
    let state: SessionState = serde_json::from_slice(bytes)
        .map_err(|e| Error::malformed(path, format!("invalid snapshot: {}", e)))?;

    Ok(ParsedRecord {
        summary: summarize(&state, fallback_timestamp),
        skipped_lines: 0,
    })
}

fn parse_mutation_log(path: &Path, bytes: &[u8], fallback_timestamp: i64) -> Result<ParsedRecord> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| Error::malformed(path, "mutation log is not valid UTF-8"))?;

    let mut state = Value::Object(Map::new());
    let mut valid_lines = 0usize;
    let mut skipped_lines = 0usize;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<MutationOp>(line) {
            Ok(op) => {
                valid_lines += 1;
                apply_op(&mut state, op);
            }
            Err(_) => skipped_lines += 1,
        }
    }

    if valid_lines == 0 {
        return Err(Error::malformed(path, "no valid mutation lines"));
    }

    let state: SessionState = serde_json::from_value(state)
        .map_err(|e| Error::malformed(path, format!("replayed state is unusable: {}", e)))?;

    Ok(ParsedRecord {
        summary: summarize(&state, fallback_timestamp),
        skipped_lines,
    })
}

fn apply_op(state: &mut Value, op: MutationOp) {
    match op {
        MutationOp::Init { v } => *state = v,
        MutationOp::Set { k, v } => {
            if let Value::Object(map) = state {
                map.insert(k, v);
            }
        }
        MutationOp::Splice {
            k,
            start,
            delete_count,
            items,
        } => {
            let Value::Object(map) = state else {
                return;
            };
            let slot = map.entry(k).or_insert_with(|| Value::Array(Vec::new()));
            let Value::Array(arr) = slot else {
                return;
            };
            // Offsets beyond the array are clamped so replay stays total.
            let start = start.min(arr.len());
            let end = start.saturating_add(delete_count).min(arr.len());
            arr.splice(start..end, items);
        }
        MutationOp::Unknown => {}
    }
}

fn summarize(state: &SessionState, fallback_timestamp: i64) -> RecordSummary {
    let derived = state
        .turns
        .iter()
        .find_map(turn_text)
        .map(|t| truncate_title(t.trim(), MAX_TITLE_LEN));

    let title = state
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or(derived)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let last_activity = state
        .turns
        .iter()
        .filter_map(turn_timestamp)
        .max()
        .or(state.last_activity)
        .unwrap_or(fallback_timestamp);

    RecordSummary {
        title,
        last_activity,
        location: state
            .location
            .clone()
            .unwrap_or_else(|| DEFAULT_UI_LOCATION.to_string()),
        is_empty: state.turns.is_empty(),
    }
}

fn turn_text(turn: &Value) -> Option<&str> {
    turn.get("text")?.as_str().filter(|t| !t.trim().is_empty())
}

fn turn_timestamp(turn: &Value) -> Option<i64> {
    turn.get("timestamp")?.as_i64()
}
