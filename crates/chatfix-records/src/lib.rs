// Error types
pub mod error;

// Wire schema for the two record encodings
mod schema;

// Record decoding
pub mod parser;

// Directory scanning
pub mod scanner;

pub use error::{Error, Result};
pub use parser::{MUTATION_LOG_EXT, ParsedRecord, RecordFormat, SNAPSHOT_EXT, parse_record};
pub use scanner::{ScanFailure, ScanOutcome, scan_location, scan_records_dir};
