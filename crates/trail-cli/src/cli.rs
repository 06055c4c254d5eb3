use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use trail_types::EntityFamily;

#[derive(Parser)]
#[command(
    name = "trail",
    about = "Audit trail -- structural diffs of entity snapshots",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Diff two snapshots of an entity
    Diff(DiffArgs),
    /// Build the audit entry for a change event
    Entry(EntryArgs),
    /// List registered entity families
    Families(FamiliesArgs),
}

/// Snapshot inputs. An omitted snapshot is absent (creation or deletion).
#[derive(Args)]
pub struct SnapshotArgs {
    /// Entity family of both snapshots
    #[arg(long)]
    pub family: EntityFamily,
    /// JSON file holding the snapshot before the change
    #[arg(long)]
    pub old: Option<PathBuf>,
    /// JSON file holding the snapshot after the change
    #[arg(long)]
    pub new: Option<PathBuf>,
    /// Engine configuration (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct DiffArgs {
    #[command(flatten)]
    pub snapshots: SnapshotArgs,
}

#[derive(Args)]
pub struct EntryArgs {
    #[command(flatten)]
    pub snapshots: SnapshotArgs,
    #[arg(long)]
    pub tenant: String,
    #[arg(long = "entity-id")]
    pub entity_id: String,
    #[arg(long)]
    pub user: Option<String>,
}

#[derive(Args)]
pub struct FamiliesArgs {
    /// Engine configuration (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
