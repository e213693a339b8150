//! CLI struct definitions for the Atelier command-line interface.
//!
//! All clap-derived types for the core surfaces live here. Subsystem CLIs
//! (survival, curation, era, seed, context) live next to their plugins.

use crate::core::physics::{EffectClass, SyncStrategy};
use crate::plugins::{context, curation, era, seed, survival};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "atelier",
    version = env!("CARGO_PKG_VERSION"),
    about = "Atelier is the daemonless, local-first design-governance engine that indexes a codebase's design primitives, tracks which implementation patterns survive over time, and statically quarantines forbidden dependency directions between quality tiers."
)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug)]
pub(crate) struct InitCli {
    /// Directory to initialize (defaults to the current working directory).
    #[clap(short, long)]
    pub dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct WorkshopCli {
    #[clap(subcommand)]
    pub command: WorkshopCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum WorkshopCommand {
    /// Rebuild the workshop index if stale (or unconditionally with --force).
    Build {
        #[clap(long)]
        force: bool,
    },
    /// Report staleness of the persisted index against current hashes.
    Status,
    /// Query the loaded index (rebuilding first if stale).
    Query {
        /// What to look up: material | component | physics | zone.
        #[clap(long)]
        kind: String,
        #[clap(long)]
        name: String,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct ZoneCli {
    #[clap(subcommand)]
    pub command: ZoneCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ZoneCommand {
    /// Resolve a file path to its governing zone.
    Resolve {
        #[clap(long)]
        path: String,
    },
    /// List declared zones in match order.
    List,
}

#[derive(clap::Args, Debug)]
pub(crate) struct PhysicsCli {
    #[clap(subcommand)]
    pub command: PhysicsCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum PhysicsCommand {
    /// Check a proposed motion/timing against a zone's constraints.
    Check {
        /// File path whose zone governs the check.
        #[clap(long)]
        path: String,
        #[clap(long)]
        motion: String,
        /// Proposed duration in milliseconds.
        #[clap(long)]
        timing: Option<u64>,
    },
    /// Check a sync/confirmation choice for an effect class.
    Effect {
        #[clap(long, value_enum)]
        effect: EffectClass,
        #[clap(long, value_enum)]
        sync: SyncStrategy,
        /// The call site is already inside a confirming container.
        #[clap(long)]
        confirmed: bool,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct SentinelCli {
    #[clap(subcommand)]
    pub command: SentinelCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum SentinelCommand {
    /// Pre-write gate: may this file gain this import, or this content?
    Validate {
        /// Project-relative path of the file being written.
        #[clap(long)]
        file: String,
        /// A single proposed import specifier to check.
        #[clap(long)]
        import: Option<String>,
        /// Path to proposed file content to validate in full.
        #[clap(long)]
        content: Option<PathBuf>,
    },
    /// Whole-repository contagion scan.
    Scan,
}

#[derive(clap::Args, Debug)]
pub(crate) struct SchemaCli {
    /// Optional: filter by subsystem name.
    #[clap(long)]
    pub subsystem: Option<String>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Initialize the .atelier state directory and a starter config.
    #[clap(name = "init", visible_alias = "i")]
    Init(InitCli),

    /// Workshop index: build, staleness, queries.
    #[clap(name = "workshop", visible_alias = "w")]
    Workshop(WorkshopCli),

    /// Zone resolution over path patterns.
    #[clap(name = "zone", visible_alias = "z")]
    Zone(ZoneCli),

    /// Physics validation: timings, materials, effect classes.
    #[clap(name = "physics", visible_alias = "p")]
    Physics(PhysicsCli),

    /// Pattern-usage observation and promotion.
    #[clap(name = "survival", visible_alias = "s")]
    Survival(survival::SurvivalCli),

    /// Curation gate for canonical promotion.
    #[clap(name = "curate", visible_alias = "c")]
    Curate(curation::CurateCli),

    /// Era snapshots of the pattern ledger.
    #[clap(name = "era", visible_alias = "e")]
    Era(era::EraCli),

    /// Virtual sanctuary seeds.
    #[clap(name = "seed")]
    Seed(seed::SeedCli),

    /// Pre-write validation gate and contagion scan.
    #[clap(name = "sentinel")]
    Sentinel(SentinelCli),

    /// Resolve governance context for a prompt.
    #[clap(name = "context")]
    Context(context::ContextCli),

    /// Subsystem schemas and discovery.
    #[clap(name = "schema")]
    Schema(SchemaCli),

    /// Show version information.
    #[clap(name = "version")]
    Version,
}
