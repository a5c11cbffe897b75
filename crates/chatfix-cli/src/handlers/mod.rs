pub mod list;
pub mod merge;
pub mod repair;

use std::io::Write;

/// Ask a yes/no question on stdin; anything but yes counts as no.
pub(crate) fn confirm(prompt: &str) -> bool {
    print!("{} (yes/no): ", prompt);
    std::io::stdout().flush().ok();
    let mut input = String::new();
    std::io::stdin().read_line(&mut input).ok();
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Session identifiers are long; eight characters are enough on screen.
pub(crate) fn short_id(id: &str) -> String {
    let prefix: String = id.chars().take(8).collect();
    if prefix.len() < id.len() {
        format!("{}...", prefix)
    } else {
        prefix
    }
}

/// Render a millisecond timestamp for display, empty when unset.
pub(crate) fn format_timestamp(millis: i64) -> String {
    if millis <= 0 {
        return String::new();
    }
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}
