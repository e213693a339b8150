//! Era manager: versioned, archivable snapshots of the pattern ledger.
//!
//! An era bounds one tracking period. Archiving freezes the active ledger
//! into an immutable snapshot under the era's name; starting a new era
//! additionally resets the active ledger so tracking begins fresh after a
//! design-direction shift. Rejected patterns carry across the boundary;
//! a direction change does not un-reject bad patterns.

use crate::core::error::AtelierError;
use crate::core::store::{self, Store};
use crate::core::time::now_epoch_z;
use crate::plugins::survival::{self, PatternEntry, PatternStatus, SurvivalLedger};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

pub const MAX_ERA_NAME_LEN: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EraInfo {
    pub name: String,
    pub started: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An archived era: the ledger frozen at archive time. Never mutated after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EraArchive {
    pub name: String,
    pub started: String,
    pub ended: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub patterns: BTreeMap<String, PatternEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EraTransition {
    pub previous_era: String,
    pub new_era: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_path: Option<String>,
    pub carried_rejections: usize,
}

pub fn current_era(store: &Store) -> EraInfo {
    let ledger = survival::load_ledger(store);
    EraInfo {
        name: ledger.era,
        started: ledger.era_started,
        description: ledger.era_description,
    }
}

pub fn is_valid_era_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_ERA_NAME_LEN {
        return false;
    }
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphanumeric()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

fn archive_path(store: &Store, era: &str) -> PathBuf {
    store.eras_dir().join(format!("{}.json", era))
}

pub fn era_exists(store: &Store, name: &str) -> bool {
    current_era(store).name == name || archive_path(store, name).is_file()
}

/// Check whether a transition to `name` is permitted.
pub fn can_transition_to(store: &Store, name: &str) -> Result<(), String> {
    if !is_valid_era_name(name) {
        return Err(format!(
            "era name '{}' must start alphanumeric, use [A-Za-z0-9._-], and stay under {} chars",
            name, MAX_ERA_NAME_LEN
        ));
    }
    let current = current_era(store).name;
    if current == name {
        return Err(format!("already in era '{}'", name));
    }
    if archive_path(store, name).is_file() {
        return Err(format!("era '{}' already exists in the archive", name));
    }
    Ok(())
}

/// Freeze the active ledger into `eras/<era>.json`. The snapshot is written
/// once and never touched again.
pub fn archive_current_era(store: &Store) -> Result<PathBuf, AtelierError> {
    let ledger = survival::load_ledger(store);
    let archive = EraArchive {
        name: ledger.era.clone(),
        started: ledger.era_started.clone(),
        ended: now_epoch_z(),
        description: ledger.era_description.clone(),
        patterns: ledger.patterns.clone(),
    };
    let path = archive_path(store, &archive.name);
    store::write_document(&path, &archive)?;
    Ok(path)
}

/// Archive the active era, then reset the ledger under the new era's name.
/// Rejected patterns survive the reset with their counters zeroed.
pub fn create_new_era(
    store: &Store,
    name: &str,
    description: Option<&str>,
) -> Result<EraTransition, AtelierError> {
    can_transition_to(store, name).map_err(AtelierError::ValidationError)?;

    let previous = survival::load_ledger(store);
    let archive = archive_current_era(store)?;

    let mut fresh = SurvivalLedger::new(name);
    fresh.era_description = description.map(|d| d.to_string());
    let mut carried = 0usize;
    for (pattern, entry) in &previous.patterns {
        if entry.status == PatternStatus::Rejected {
            carried += 1;
            fresh.patterns.insert(
                pattern.clone(),
                PatternEntry {
                    status: PatternStatus::Rejected,
                    occurrences: 0,
                    first_seen_era: entry.first_seen_era.clone(),
                    last_seen_at: entry.last_seen_at.clone(),
                    files: Vec::new(),
                },
            );
        }
    }
    survival::save_ledger(store, &fresh)?;

    Ok(EraTransition {
        previous_era: previous.era,
        new_era: name.to_string(),
        archive_path: Some(archive.to_string_lossy().to_string()),
        carried_rejections: carried,
    })
}

pub fn load_era_archive(store: &Store, name: &str) -> Option<EraArchive> {
    store::load_document(&archive_path(store, name))
}

/// Archived eras in chronological order of their start timestamps.
pub fn get_era_history(store: &Store) -> Vec<EraArchive> {
    let mut archives = Vec::new();
    let Ok(entries) = fs::read_dir(store.eras_dir()) else {
        return archives;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            if let Some(archive) = store::load_document::<EraArchive>(&path) {
                archives.push(archive);
            }
        }
    }
    archives.sort_by(|a, b| a.started.cmp(&b.started).then(a.name.cmp(&b.name)));
    archives
}

#[derive(Parser, Debug)]
#[clap(name = "era", about = "Version the pattern ledger into eras")]
pub struct EraCli {
    #[clap(subcommand)]
    pub command: EraCommand,
}

#[derive(Subcommand, Debug)]
pub enum EraCommand {
    /// Archive the active era and start a fresh tracking period.
    New {
        #[clap(long)]
        name: String,
        #[clap(long)]
        description: Option<String>,
    },
    /// Snapshot the active era without starting a new one.
    Archive,
    /// List archived eras in chronological order.
    History,
    /// Show the active era.
    Status,
}

pub fn run_era_cli(store: &Store, cli: EraCli) -> Result<(), AtelierError> {
    match cli.command {
        EraCommand::New { name, description } => {
            let transition = create_new_era(store, &name, description.as_deref())?;
            println!(
                "Era transition complete: '{}' → '{}' ({} rejection(s) carried forward).",
                transition.previous_era, transition.new_era, transition.carried_rejections
            );
            if let Some(path) = transition.archive_path {
                println!("Archived previous era at {}", path);
            }
        }
        EraCommand::Archive => {
            let path = archive_current_era(store)?;
            println!("Archived era at {}", path.display());
        }
        EraCommand::History => {
            let history = get_era_history(store);
            if history.is_empty() {
                println!("No archived eras.");
            } else {
                for archive in history {
                    println!(
                        "{}  started {}  ended {}  ({} patterns)",
                        archive.name,
                        archive.started,
                        archive.ended,
                        archive.patterns.len()
                    );
                }
            }
        }
        EraCommand::Status => {
            let era = current_era(store);
            println!("{}", serde_json::to_string_pretty(&era)?);
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "era",
        "version": "0.1.0",
        "description": "Archivable tracking periods for the pattern ledger",
        "commands": [
            { "name": "new", "parameters": ["name", "description"] },
            { "name": "archive" },
            { "name": "history" },
            { "name": "status" }
        ],
        "storage": ["survival.json", "eras/*.json"]
    })
}
