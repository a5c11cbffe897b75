use crate::output::Paint;
use anyhow::Result;
use chatfix_engine::{LocationReport, discover_locations, survey};
use std::path::Path;

pub fn handle(storage_root: &Path, show_all: bool) -> Result<()> {
    let paint = Paint::auto();
    let locations = discover_locations(storage_root)?;
    let surveyed = survey(&locations);

    for (location_id, err) in &surveyed.errors {
        eprintln!("{} {}: {}", paint.warn("Warning:"), location_id, err);
    }

    let mut reports: Vec<&LocationReport> = surveyed
        .reports
        .iter()
        .filter(|r| r.has_sessions() || !r.plan.orphaned.is_empty())
        .collect();
    if !show_all {
        reports.retain(|r| r.needs_repair());
    }

    if reports.is_empty() {
        if show_all {
            println!("No storage locations with chat sessions found.");
        } else {
            println!("{}", paint.ok("No locations need repair."));
        }
        return Ok(());
    }

    for report in &reports {
        let status = if report.needs_repair() {
            paint.err("NEEDS REPAIR")
        } else {
            paint.ok("healthy")
        };
        println!("{} - {}", report.location.display_name(), status);
        if let Some(workspace) = &report.location.workspace_path {
            println!("  Workspace: {}", workspace);
        }
        println!("  Sessions on disk: {}", report.on_disk);
        println!("  Sessions in index: {}", report.in_index);
        println!("  Sessions in cache: {}", report.in_cache);

        if !report.plan.missing.is_empty() {
            println!(
                "  {} missing from index: {}",
                paint.warn("!"),
                report.plan.missing.len()
            );
        }
        if !report.plan.orphaned.is_empty() {
            println!(
                "  {} orphaned in index: {}",
                paint.warn("!"),
                report.plan.orphaned.len()
            );
        }
        if !report.plan.cache_missing.is_empty() {
            println!(
                "  {} missing from session cache: {}",
                paint.warn("!"),
                report.plan.cache_missing.len()
            );
        }
        for failure in &report.failures {
            println!(
                "  {} {}: {}",
                paint.warn("unreadable"),
                failure.path.display(),
                failure.reason
            );
        }
        println!();
    }

    let broken = reports.iter().filter(|r| r.needs_repair()).count();
    if broken > 0 {
        println!(
            "{} location(s) need repair; run `chatfix repair` to fix them.",
            broken
        );
    } else {
        println!("{}", paint.ok("All listed locations are healthy."));
    }

    Ok(())
}
