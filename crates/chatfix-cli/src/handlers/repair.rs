use crate::handlers::{confirm, format_timestamp, short_id};
use crate::output::Paint;
use anyhow::{Result, anyhow};
use chatfix_engine::{
    ReconciliationPlan, RepairOptions, RepairOutcome, RepairProgress, RunMode, Similarity,
    discover_locations, plan_location, recover_orphans, repair_location, resolve_orphans,
};
use chatfix_types::StorageLocation;
use std::path::Path;

pub struct RepairArgs {
    pub location_id: Option<String>,
    pub dry_run: bool,
    pub yes: bool,
    pub remove_orphans: bool,
    pub recover_orphans: bool,
}

pub fn handle(storage_root: &Path, args: &RepairArgs) -> Result<()> {
    let paint = Paint::auto();
    let locations = discover_locations(storage_root)?;

    let targets: Vec<StorageLocation> = match &args.location_id {
        Some(id) => {
            let found = locations
                .iter()
                .find(|l| &l.id == id)
                .ok_or_else(|| anyhow!("storage location '{}' not found (try `chatfix list --all`)", id))?;
            vec![found.clone()]
        }
        None => locations.clone(),
    };

    if args.dry_run {
        println!("{}", paint.accent("Dry run: no changes will be made"));
        println!();
    }

    let mut pending: Vec<(StorageLocation, ReconciliationPlan)> = Vec::new();
    for location in &targets {
        match plan_location(location) {
            Ok((plan, scan, _)) => {
                if scan.sessions.is_empty() && plan.orphaned.is_empty() {
                    continue;
                }
                if plan.needs_repair() {
                    pending.push((location.clone(), plan));
                }
            }
            Err(e) => eprintln!(
                "{} cannot inspect {}: {}",
                paint.warn("Warning:"),
                location.display_name(),
                e
            ),
        }
    }

    if pending.is_empty() {
        println!("{}", paint.ok("All locations are healthy; nothing to repair."));
        return Ok(());
    }

    println!("{} location(s) need repair:", pending.len());
    for (location, plan) in &pending {
        print_plan(&paint, location, plan, &locations, args);
    }
    println!();

    if !args.dry_run && !args.yes {
        println!(
            "{}",
            paint.warn(
                "Close the host application first; databases are modified in place (backups are created before every write)."
            )
        );
        if !confirm("Proceed with repair?") {
            println!("Aborted.");
            return Ok(());
        }
        println!();
    }

    let mode = if args.dry_run {
        RunMode::Preview
    } else {
        RunMode::Apply
    };

    let mut repaired = 0usize;
    let mut failed = 0usize;
    for (location, plan) in &pending {
        println!("Repairing {}", location.display_name());

        if args.recover_orphans && !plan.orphaned.is_empty() {
            let resolutions = resolve_orphans(location, plan, &locations);
            match recover_orphans(location, &resolutions, mode, |p| render_progress(&paint, p)) {
                Ok(n) if n > 0 => println!("  recovered {} session(s) from other locations", n),
                Ok(_) => {}
                Err(e) => eprintln!("  {} recovery failed: {}", paint.err("error:"), e),
            }
        }

        let options = RepairOptions {
            mode,
            remove_orphans: args.remove_orphans,
        };
        match repair_location(location, &options, |p| render_progress(&paint, p)) {
            Ok(outcome) => {
                summarize(&paint, &outcome, args.dry_run);
                repaired += 1;
            }
            Err(e) => {
                eprintln!("  {} {}", paint.err("failed:"), e);
                failed += 1;
            }
        }
        println!();
    }

    if failed > 0 {
        println!("Repaired {} location(s), {} failed", repaired, failed);
        anyhow::bail!("{} location(s) could not be repaired", failed);
    }
    println!("Repaired {} location(s)", repaired);
    if !args.dry_run {
        println!("Restart the host application to pick up the rebuilt index.");
    }
    Ok(())
}

fn print_plan(
    paint: &Paint,
    location: &StorageLocation,
    plan: &ReconciliationPlan,
    all_locations: &[StorageLocation],
    args: &RepairArgs,
) {
    println!("  {}", location.display_name());
    if !plan.missing.is_empty() {
        println!("    missing from index: {}", plan.missing.len());
        for (session_id, entry) in plan.additions.iter().take(5) {
            let when = format_timestamp(entry.last_message_date);
            println!("      {} {} {}", short_id(session_id), entry.title, paint.dim(&when));
        }
        if plan.additions.len() > 5 {
            println!("      ... and {} more", plan.additions.len() - 5);
        }
    }

    if !plan.orphaned.is_empty() {
        let disposition = if args.remove_orphans {
            "will be removed"
        } else {
            "kept; use --remove-orphans to drop them"
        };
        println!("    orphaned in index: {} ({})", plan.orphaned.len(), disposition);

        let resolutions = resolve_orphans(location, plan, all_locations);
        let mut recoverable = 0usize;
        for resolution in &resolutions {
            if let Some(candidate) = resolution.best() {
                recoverable += 1;
                let score = match candidate.similarity {
                    Similarity::SameProject => paint.ok("same project"),
                    Similarity::DifferentProject => paint.dim("different project"),
                };
                println!(
                    "      {} found in {} ({})",
                    short_id(&resolution.session_id),
                    candidate.location.display_name(),
                    score
                );
            }
        }
        if recoverable > 0 && !args.recover_orphans {
            println!(
                "      use --recover-orphans to copy these {} session(s) back",
                recoverable
            );
        }
    }

    if !plan.cache_missing.is_empty() {
        println!("    missing from session cache: {}", plan.cache_missing.len());
    }
}

fn render_progress(paint: &Paint, progress: RepairProgress) {
    match progress {
        RepairProgress::Scanning { .. } => {}
        RepairProgress::RecordFailure { path, reason } => println!(
            "  {} {}: {}",
            paint.warn("unreadable"),
            path.display(),
            reason
        ),
        RepairProgress::Restored { session_id, title } => {
            println!("  restored {}: {}", short_id(&session_id), title)
        }
        RepairProgress::OrphanRemoved { session_id } => {
            println!("  removed orphan {}", short_id(&session_id))
        }
        RepairProgress::Recovered {
            session_id,
            donor_id,
        } => println!("  copied {} from {}", short_id(&session_id), donor_id),
        RepairProgress::CopyFailed { path, reason } => println!(
            "  {} copy {}: {}",
            paint.err("failed"),
            path.display(),
            reason
        ),
        RepairProgress::BackupCreated { path } => println!("  backup: {}", path.display()),
    }
}

fn summarize(paint: &Paint, outcome: &RepairOutcome, dry_run: bool) {
    let restore_verb = if dry_run { "would restore" } else { "restored" };
    let remove_verb = if dry_run { "would remove" } else { "removed" };

    if outcome.restored > 0 {
        println!("  {} {} {} session(s)", paint.ok("+"), restore_verb, outcome.restored);
    }
    if outcome.removed_orphans > 0 {
        println!(
            "  {} {} {} orphaned entries",
            paint.warn("-"),
            remove_verb,
            outcome.removed_orphans
        );
    }
    if outcome.kept_orphans > 0 {
        println!("  kept {} orphaned entries", outcome.kept_orphans);
    }
    if outcome.cache_entries_added > 0 {
        println!(
            "  {} {} {} session cache entries",
            paint.ok("+"),
            restore_verb,
            outcome.cache_entries_added
        );
    }
    if outcome.restored == 0 && outcome.removed_orphans == 0 && outcome.cache_entries_added == 0 {
        println!("  nothing to change");
    }
}
