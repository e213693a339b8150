//! Curation ledger: the human gate in front of canonical promotion.
//!
//! Patterns crossing the canonical threshold queue up here. An operator
//! approves or rejects them with a rationale; approval is the only
//! transition into canonical, and rejection is terminal until an explicit
//! reset.

use crate::core::error::AtelierError;
use crate::core::store::{self, CURATION_FILE, Store};
use crate::core::time::now_epoch_z;
use crate::plugins::survival::{self, PatternStatus};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationEntry {
    pub pattern: String,
    pub occurrences: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    pub ts: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurationLedger {
    #[serde(default)]
    pub pending: Vec<CurationEntry>,
    #[serde(default)]
    pub approved: Vec<CurationEntry>,
    #[serde(default)]
    pub rejected: Vec<CurationEntry>,
}

pub fn load_ledger(store: &Store) -> CurationLedger {
    store::load_document(&store.path(CURATION_FILE)).unwrap_or_default()
}

pub fn save_ledger(store: &Store, ledger: &CurationLedger) -> Result<(), AtelierError> {
    store.ensure()?;
    store::write_document(&store.path(CURATION_FILE), ledger)
}

pub fn is_pending(ledger: &CurationLedger, name: &str) -> bool {
    ledger.pending.iter().any(|e| e.pattern == name)
}

pub fn is_approved(ledger: &CurationLedger, name: &str) -> bool {
    ledger.approved.iter().any(|e| e.pattern == name)
}

pub fn is_rejected(ledger: &CurationLedger, name: &str) -> bool {
    ledger.rejected.iter().any(|e| e.pattern == name)
}

/// Queue a pattern for curation. Idempotent: a pattern already pending,
/// approved, or rejected is not enqueued again.
pub fn enqueue_pending(ledger: &mut CurationLedger, name: &str, occurrences: u32) -> bool {
    if is_pending(ledger, name) || is_approved(ledger, name) || is_rejected(ledger, name) {
        return false;
    }
    ledger.pending.push(CurationEntry {
        pattern: name.to_string(),
        occurrences,
        actor: None,
        rationale: None,
        ts: now_epoch_z(),
    });
    true
}

fn take_pending(ledger: &mut CurationLedger, name: &str) -> Option<CurationEntry> {
    let idx = ledger.pending.iter().position(|e| e.pattern == name)?;
    Some(ledger.pending.remove(idx))
}

/// Approve a pending promotion. Returns false when the pattern is not
/// queued.
pub fn approve(
    ledger: &mut CurationLedger,
    name: &str,
    actor: &str,
    rationale: Option<&str>,
) -> bool {
    let Some(mut entry) = take_pending(ledger, name) else {
        return false;
    };
    entry.actor = Some(actor.to_string());
    entry.rationale = rationale.map(|r| r.to_string());
    entry.ts = now_epoch_z();
    ledger.approved.push(entry);
    true
}

/// Reject a promotion. Works on queued patterns and, as a curation action
/// against any non-canonical pattern, on names never queued at all.
pub fn reject(
    ledger: &mut CurationLedger,
    name: &str,
    actor: &str,
    rationale: Option<&str>,
) -> bool {
    if is_rejected(ledger, name) {
        return false;
    }
    let mut entry = take_pending(ledger, name).unwrap_or(CurationEntry {
        pattern: name.to_string(),
        occurrences: 0,
        actor: None,
        rationale: None,
        ts: now_epoch_z(),
    });
    entry.actor = Some(actor.to_string());
    entry.rationale = rationale.map(|r| r.to_string());
    entry.ts = now_epoch_z();
    ledger.rejected.push(entry);
    true
}

/// Clear a rejection, the only way a rejected pattern re-enters the
/// promotion pipeline.
pub fn reset_rejection(ledger: &mut CurationLedger, name: &str) -> bool {
    let Some(idx) = ledger.rejected.iter().position(|e| e.pattern == name) else {
        return false;
    };
    ledger.rejected.remove(idx);
    true
}

#[derive(Parser, Debug)]
#[clap(name = "curate", about = "Approve or reject canonical promotions")]
pub struct CurateCli {
    #[clap(subcommand)]
    pub command: CurateCommand,
}

#[derive(Subcommand, Debug)]
pub enum CurateCommand {
    /// List patterns awaiting curation.
    Pending,
    /// Approve a pending promotion into canonical.
    Approve {
        #[clap(long)]
        pattern: String,
        #[clap(long, default_value = "operator")]
        actor: String,
        #[clap(long)]
        reason: Option<String>,
    },
    /// Reject a pattern (terminal until reset).
    Reject {
        #[clap(long)]
        pattern: String,
        #[clap(long, default_value = "operator")]
        actor: String,
        #[clap(long)]
        reason: Option<String>,
    },
    /// Clear a rejection so the pattern can be tracked again.
    Reset {
        #[clap(long)]
        pattern: String,
    },
}

pub fn run_curate_cli(store: &Store, cli: CurateCli) -> Result<(), AtelierError> {
    let mut ledger = load_ledger(store);
    match cli.command {
        CurateCommand::Pending => {
            if ledger.pending.is_empty() {
                println!("No promotions pending curation.");
            } else {
                println!("{}", serde_json::to_string_pretty(&ledger.pending)?);
            }
            return Ok(());
        }
        CurateCommand::Approve {
            pattern,
            actor,
            reason,
        } => {
            if !approve(&mut ledger, &pattern, &actor, reason.as_deref()) {
                return Err(AtelierError::NotFound(format!(
                    "pattern '{}' is not pending curation",
                    pattern
                )));
            }
            set_survival_status(store, &pattern, PatternStatus::Canonical)?;
            println!("Approved '{}' as canonical.", pattern);
        }
        CurateCommand::Reject {
            pattern,
            actor,
            reason,
        } => {
            if !reject(&mut ledger, &pattern, &actor, reason.as_deref()) {
                return Err(AtelierError::ValidationError(format!(
                    "pattern '{}' is already rejected",
                    pattern
                )));
            }
            set_survival_status(store, &pattern, PatternStatus::Rejected)?;
            println!("Rejected '{}'.", pattern);
        }
        CurateCommand::Reset { pattern } => {
            if !reset_rejection(&mut ledger, &pattern) {
                return Err(AtelierError::NotFound(format!(
                    "pattern '{}' is not rejected",
                    pattern
                )));
            }
            // The pattern restarts its climb from experimental.
            reset_survival_status(store, &pattern)?;
            println!("Cleared rejection of '{}'.", pattern);
        }
    }
    save_ledger(store, &ledger)
}

fn set_survival_status(
    store: &Store,
    pattern: &str,
    status: PatternStatus,
) -> Result<(), AtelierError> {
    let mut survival_ledger = survival::load_ledger(store);
    if let Some(entry) = survival_ledger.patterns.get_mut(pattern) {
        entry.status = status;
        survival::save_ledger(store, &survival_ledger)?;
    }
    Ok(())
}

fn reset_survival_status(store: &Store, pattern: &str) -> Result<(), AtelierError> {
    let mut survival_ledger = survival::load_ledger(store);
    if let Some(entry) = survival_ledger.patterns.get_mut(pattern) {
        entry.status = PatternStatus::Experimental;
        survival::save_ledger(store, &survival_ledger)?;
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "curation",
        "version": "0.1.0",
        "description": "Human gate for canonical promotion",
        "commands": [
            { "name": "pending" },
            { "name": "approve", "parameters": ["pattern", "actor", "reason"] },
            { "name": "reject", "parameters": ["pattern", "actor", "reason"] },
            { "name": "reset", "parameters": ["pattern"] }
        ],
        "storage": ["curation.json"]
    })
}
