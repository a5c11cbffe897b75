use crate::args::{Cli, Commands};
use crate::config;
use crate::handlers;
use anyhow::Result;

pub fn run(cli: Cli) -> Result<()> {
    let storage_root = config::resolve_storage_root(cli.storage_root.as_deref(), cli.insiders)?;

    match cli.command {
        Commands::List { all } => handlers::list::handle(&storage_root, all),

        Commands::Repair {
            location_id,
            dry_run,
            yes,
            remove_orphans,
            recover_orphans,
        } => handlers::repair::handle(
            &storage_root,
            &handlers::repair::RepairArgs {
                location_id,
                dry_run,
                yes,
                remove_orphans,
                recover_orphans,
            },
        ),

        Commands::Merge { dry_run, yes } => handlers::merge::handle(&storage_root, dry_run, yes),
    }
}
