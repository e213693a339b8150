//! Survival observer: pattern-usage evidence and the promotion state
//! machine.
//!
//! Patterns are tagged in source with inline evidence markers. Each scan
//! pass counts a pattern at most once, so a component spamming the same
//! marker cannot inflate its survival record. Promotion climbs
//! experimental → surviving → pending-canonical; the final step to
//! canonical goes through the curation ledger, never automatically.

use crate::core::error::AtelierError;
use crate::core::store::{self, Store, SURVIVAL_FILE};
use crate::core::time::now_epoch_z;
use crate::plugins::curation::{self, CurationLedger};
use clap::{Parser, Subcommand};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

pub const SURVIVING_THRESHOLD: u32 = 3;
pub const CANONICAL_THRESHOLD: u32 = 5;

pub const DEFAULT_ERA: &str = "v1";

/// Cap on recorded file hints per pattern.
const FILE_HINT_CAP: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternStatus {
    Experimental,
    Surviving,
    PendingCanonical,
    Canonical,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternEntry {
    pub status: PatternStatus,
    pub occurrences: u32,
    pub first_seen_era: String,
    pub last_seen_at: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurvivalLedger {
    pub era: String,
    pub era_started: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era_description: Option<String>,
    #[serde(default)]
    pub patterns: BTreeMap<String, PatternEntry>,
}

impl SurvivalLedger {
    pub fn new(era: &str) -> Self {
        Self {
            era: era.to_string(),
            era_started: now_epoch_z(),
            era_description: None,
            patterns: BTreeMap::new(),
        }
    }
}

pub fn load_ledger(store: &Store) -> SurvivalLedger {
    store::load_document(&store.path(SURVIVAL_FILE))
        .unwrap_or_else(|| SurvivalLedger::new(DEFAULT_ERA))
}

pub fn save_ledger(store: &Store, ledger: &SurvivalLedger) -> Result<(), AtelierError> {
    store.ensure()?;
    store::write_document(&store.path(SURVIVAL_FILE), ledger)
}

/// A pattern-usage hit extracted from source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternDetection {
    pub name: String,
    pub location_hint: String,
}

/// One marker syntax: a name for diagnostics, the full-match regex (capture
/// group 1 is the pattern name), and a looser probe used to spot malformed
/// markers that the full regex rejects.
struct MarkerSyntax {
    name: &'static str,
    matcher: Regex,
    probe: &'static str,
}

/// The declarative marker table. Adding a marker format means adding a row
/// here; detection control flow does not change.
fn marker_table() -> Vec<MarkerSyntax> {
    vec![
        MarkerSyntax {
            name: "line-comment",
            matcher: Regex::new(r"(?m)//\s*@atelier-pattern:\s*([A-Za-z][A-Za-z0-9_:-]*)").unwrap(),
            probe: "// @atelier-pattern:",
        },
        MarkerSyntax {
            name: "block-comment",
            matcher: Regex::new(r"/\*\s*@atelier-pattern:\s*([A-Za-z][A-Za-z0-9_:-]*)").unwrap(),
            probe: "/* @atelier-pattern:",
        },
        MarkerSyntax {
            name: "call-form",
            matcher: Regex::new(r"@pattern\(([A-Za-z][A-Za-z0-9_:-]*)\)").unwrap(),
            probe: "@pattern(",
        },
    ]
}

/// Extract pattern-usage evidence from source text. Malformed markers are
/// skipped and logged; they never count toward occurrences.
pub fn detect_patterns(source: &str) -> Vec<PatternDetection> {
    let mut detections = Vec::new();
    for syntax in marker_table() {
        let mut matched = 0usize;
        for cap in syntax.matcher.captures_iter(source) {
            matched += 1;
            let offset = cap.get(0).map(|m| m.start()).unwrap_or(0);
            let line = source[..offset].matches('\n').count() + 1;
            detections.push(PatternDetection {
                name: cap[1].to_string(),
                location_hint: format!("line {}", line),
            });
        }
        let probed = source.matches(syntax.probe).count();
        if probed > matched {
            eprintln!(
                "[atelier] skipped {} malformed {} pattern marker(s)",
                probed - matched,
                syntax.name
            );
        }
    }
    detections
}

/// Fold one detection pass into the ledger.
///
/// Each named pattern's counter increments exactly once per pass regardless
/// of how many hits the pass produced; occurrences are monotonically
/// non-decreasing within an era. Entries are created experimental and are
/// never deleted here; only the era manager archives them away.
pub fn update_survival_index(
    ledger: &mut SurvivalLedger,
    detections: &[PatternDetection],
    file_hint: Option<&str>,
) {
    let now = now_epoch_z();
    let mut seen_this_pass = BTreeSet::new();
    for detection in detections {
        if !seen_this_pass.insert(detection.name.clone()) {
            continue;
        }
        let era = ledger.era.clone();
        let entry = ledger
            .patterns
            .entry(detection.name.clone())
            .or_insert_with(|| PatternEntry {
                status: PatternStatus::Experimental,
                occurrences: 0,
                first_seen_era: era,
                last_seen_at: now.clone(),
                files: Vec::new(),
            });
        entry.occurrences += 1;
        entry.last_seen_at = now.clone();
        if let Some(hint) = file_hint {
            if !entry.files.iter().any(|f| f == hint) && entry.files.len() < FILE_HINT_CAP {
                entry.files.push(hint.to_string());
            }
        }
    }
}

/// Run the promotion state machine over the ledger.
///
/// Thresholds promote, never demote. Crossing the canonical threshold only
/// moves a pattern to pending-canonical and enqueues it for curation;
/// `approve_promotion` is the sole path into canonical. Rejection is sticky:
/// a rejected pattern stays rejected on further detections until an
/// explicit operator reset.
pub fn apply_promotion_rules(ledger: &mut SurvivalLedger, curation: &mut CurationLedger) {
    for (name, entry) in ledger.patterns.iter_mut() {
        if curation::is_rejected(curation, name) || entry.status == PatternStatus::Rejected {
            entry.status = PatternStatus::Rejected;
            continue;
        }
        if curation::is_approved(curation, name) {
            entry.status = PatternStatus::Canonical;
            continue;
        }
        if entry.status == PatternStatus::Canonical {
            continue;
        }
        if entry.occurrences >= CANONICAL_THRESHOLD {
            entry.status = PatternStatus::PendingCanonical;
            curation::enqueue_pending(curation, name, entry.occurrences);
        } else if entry.occurrences >= SURVIVING_THRESHOLD {
            entry.status = PatternStatus::Surviving;
        }
        // Below both thresholds the entry keeps its current status; a
        // pattern never regresses to experimental.
    }
}

pub fn pattern_status(ledger: &SurvivalLedger, name: &str) -> Option<PatternStatus> {
    ledger.patterns.get(name).map(|entry| entry.status)
}

fn source_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("ts" | "tsx" | "js" | "jsx" | "rs")
    )
}

fn walk(dir: &Path, out: &mut Vec<std::path::PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
            if matches!(name, ".git" | "node_modules" | "target" | ".atelier" | "dist") {
                continue;
            }
            walk(&path, out);
        } else if path.is_file() && source_file(&path) {
            out.push(path);
        }
    }
}

/// Scan a source tree: one detection pass per file, promotion rules once at
/// the end, both ledgers persisted.
pub fn scan_tree(store: &Store, scan_root: &Path) -> Result<ScanSummary, AtelierError> {
    let mut ledger = load_ledger(store);
    let mut curation_ledger = curation::load_ledger(store);

    let mut files = Vec::new();
    walk(scan_root, &mut files);
    files.sort();

    let mut files_with_evidence = 0usize;
    let mut total_detections = 0usize;
    for file in &files {
        let Ok(content) = fs::read_to_string(file) else {
            continue;
        };
        let detections = detect_patterns(&content);
        if detections.is_empty() {
            continue;
        }
        files_with_evidence += 1;
        total_detections += detections.len();
        let rel = file
            .strip_prefix(scan_root)
            .unwrap_or(file)
            .to_string_lossy()
            .replace('\\', "/");
        update_survival_index(&mut ledger, &detections, Some(&rel));
    }

    apply_promotion_rules(&mut ledger, &mut curation_ledger);
    save_ledger(store, &ledger)?;
    curation::save_ledger(store, &curation_ledger)?;

    Ok(ScanSummary {
        files_scanned: files.len(),
        files_with_evidence,
        detections: total_detections,
        patterns_tracked: ledger.patterns.len(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub files_scanned: usize,
    pub files_with_evidence: usize,
    pub detections: usize,
    pub patterns_tracked: usize,
}

#[derive(Parser, Debug)]
#[clap(name = "survival", about = "Observe pattern usage and run promotions")]
pub struct SurvivalCli {
    #[clap(subcommand)]
    pub command: SurvivalCommand,
}

#[derive(Subcommand, Debug)]
pub enum SurvivalCommand {
    /// Scan the source tree for pattern-usage evidence.
    Scan {
        /// Directory to scan (defaults to the project root).
        #[clap(long)]
        path: Option<String>,
    },
    /// Show the ledger, or one pattern's entry.
    Status {
        #[clap(long)]
        pattern: Option<String>,
    },
}

pub fn run_survival_cli(
    store: &Store,
    project_root: &Path,
    cli: SurvivalCli,
) -> Result<(), AtelierError> {
    match cli.command {
        SurvivalCommand::Scan { path } => {
            let scan_root = match path {
                Some(p) => project_root.join(p),
                None => project_root.to_path_buf(),
            };
            let summary = scan_tree(store, &scan_root)?;
            println!(
                "Scanned {} files ({} with evidence, {} detections); tracking {} patterns.",
                summary.files_scanned,
                summary.files_with_evidence,
                summary.detections,
                summary.patterns_tracked
            );
        }
        SurvivalCommand::Status { pattern } => {
            let ledger = load_ledger(store);
            match pattern {
                Some(name) => match ledger.patterns.get(&name) {
                    Some(entry) => println!("{}", serde_json::to_string_pretty(entry)?),
                    None => {
                        return Err(AtelierError::NotFound(format!(
                            "pattern '{}' not tracked",
                            name
                        )));
                    }
                },
                None => println!("{}", serde_json::to_string_pretty(&ledger)?),
            }
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "survival",
        "version": "0.1.0",
        "description": "Pattern-usage evidence and promotion state machine",
        "commands": [
            { "name": "scan", "parameters": ["path"] },
            { "name": "status", "parameters": ["pattern"] }
        ],
        "storage": ["survival.json"]
    })
}
