use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chatfix")]
#[command(about = "Repair chat-session indexes in workspace storage", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Workspace storage root (defaults to the host's per-platform location)
    #[arg(long, global = true)]
    pub storage_root: Option<String>,

    /// Use the insiders-channel storage root instead of the stable one
    #[arg(long, global = true)]
    pub insiders: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "List storage locations and their index health")]
    List {
        /// Show healthy locations too
        #[arg(long)]
        all: bool,
    },

    #[command(about = "Rebuild session indexes from on-disk records")]
    Repair {
        /// Repair a single storage location by id (default: all locations)
        location_id: Option<String>,

        /// Preview changes without modifying anything
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompts
        #[arg(long)]
        yes: bool,

        /// Drop index entries whose record file is gone (default: keep)
        #[arg(long)]
        remove_orphans: bool,

        /// Copy orphaned records back from other storage locations
        #[arg(long)]
        recover_orphans: bool,
    },

    #[command(about = "Fold duplicate storage locations for a workspace into the active one")]
    Merge {
        /// Preview changes without modifying anything
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompts
        #[arg(long)]
        yes: bool,
    },
}
