use crate::handlers::{confirm, short_id};
use crate::output::Paint;
use anyhow::Result;
use chatfix_engine::{MergeProgress, RunMode, apply_merge, discover_locations, merge_groups};
use std::path::Path;

pub fn handle(storage_root: &Path, dry_run: bool, yes: bool) -> Result<()> {
    let paint = Paint::auto();
    let locations = discover_locations(storage_root)?;
    let groups = merge_groups(&locations);

    if groups.is_empty() {
        println!(
            "{}",
            paint.ok("No duplicate storage locations found; nothing to merge.")
        );
        return Ok(());
    }

    println!(
        "Found {} workspace(s) with duplicate storage locations:",
        groups.len()
    );
    println!();
    for group in &groups {
        println!("{}", group.identity);
        println!("  active: {}", group.active.display_name());
        for donor in &group.donors {
            println!("  donor:  {}", donor.display_name());
        }
        println!();
    }

    if dry_run {
        println!("{}", paint.accent("Dry run: no changes will be made"));
    } else if !yes {
        println!(
            "{}",
            paint.warn("Close the host application first; the active databases are modified in place.")
        );
        if !confirm(&format!("Merge {} group(s)?", groups.len())) {
            println!("Aborted.");
            return Ok(());
        }
    }
    println!();

    let mode = if dry_run {
        RunMode::Preview
    } else {
        RunMode::Apply
    };

    let mut total_files = 0usize;
    let mut total_entries = 0usize;
    let mut total_cache = 0usize;
    let mut failed = 0usize;

    for group in &groups {
        println!("Merging into {}", group.active.display_name());
        match apply_merge(group, mode, |p| render_progress(&paint, p)) {
            Ok(outcome) => {
                for err in &outcome.errors {
                    eprintln!("  {} {}", paint.warn("warning:"), err);
                }
                total_files += outcome.files_copied;
                total_entries += outcome.entries_added;
                total_cache += outcome.cache_items_merged;
            }
            Err(e) => {
                eprintln!("  {} {}", paint.err("failed:"), e);
                failed += 1;
            }
        }
        println!();
    }

    println!(
        "Merge {}: {} file(s) copied, {} index entries added, {} cache items merged",
        if dry_run { "preview" } else { "complete" },
        total_files,
        total_entries,
        total_cache
    );
    if failed > 0 {
        anyhow::bail!("{} merge group(s) failed", failed);
    }
    Ok(())
}

fn render_progress(paint: &Paint, progress: MergeProgress) {
    match progress {
        MergeProgress::SessionCopied {
            session_id,
            donor_id,
        } => println!("  copied {} from {}", short_id(&session_id), donor_id),
        MergeProgress::CopyFailed { path, reason } => println!(
            "  {} copy {}: {}",
            paint.err("failed"),
            path.display(),
            reason
        ),
        MergeProgress::EntryAdded { session_id, title } => {
            println!("  indexed {}: {}", short_id(&session_id), title)
        }
        MergeProgress::BackupCreated { path } => println!("  backup: {}", path.display()),
    }
}
