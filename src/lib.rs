//! Atelier: a design-pattern governance engine.
//!
//! **Atelier is a daemonless, local-first control plane for design
//! governance.** It indexes a codebase's design primitives (zones,
//! materials, timing profiles, components), tracks which implementation
//! patterns recur over time, promotes patterns through evidence-based
//! quality tiers, and statically blocks forbidden dependency directions
//! between tiers.
//!
//! # Core principles
//!
//! - **Local-first**: every ledger is a whole-file JSON document under
//!   `.atelier/`, replaced atomically so readers never see partial state
//! - **Deterministic**: staleness is a pure function of content hashes;
//!   zone resolution is a pure function of path and config
//! - **Evidence-gated**: patterns climb experimental → surviving →
//!   pending-canonical on occurrence counts; only explicit curation makes
//!   them canonical, and rejection is sticky
//! - **Quarantine over trust**: Draft code may use anything, but nothing
//!   reachable from the Gold registry may depend on it, even transitively
//!
//! # Subsystems
//!
//! - `workshop`: content-hash-validated index of materials, components,
//!   physics, zones
//! - `zone`/`physics`: path-pattern zone resolution and timing/sync
//!   validation
//! - `survival`: pattern-usage evidence and the promotion state machine
//! - `curate`: the human gate in front of canonical promotion
//! - `era`: archivable tracking periods for the pattern ledger
//! - `seed`: virtual sanctuary fallback with hard eviction
//! - `sentinel`: the pre-write gate, the only surface allowed to refuse
//!   an operation outright
//!
//! # Crate structure
//!
//! - [`core`]: configuration, store primitives, the workshop index, and the
//!   pure validators (zones, physics, registry contagion)
//! - [`plugins`]: subsystem implementations with their CLI surfaces

pub mod core;
pub mod plugins;

mod cli;

use crate::cli::{
    Cli, Command, PhysicsCommand, SchemaCli, SentinelCommand, WorkshopCommand, ZoneCommand,
};
use crate::core::{config, error, physics, registry, sentinel, store::Store, workshop, zones};
use crate::plugins::{context, curation, era, seed, survival};
use clap::Parser;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// Starter configuration written by `atelier init`.
const STARTER_CONFIG: &str = r#"version = "1"

[[zones]]
name = "critical"
path_patterns = ["**/checkout/**", "**/payment/**", "**/claim/**"]
material = "clay"
motion_profile = "deliberate"

[[zones]]
name = "machinery"
path_patterns = ["**/admin/**", "**/settings/**"]
material = "machinery"
motion_profile = "snappy"

[[zones]]
name = "marketing"
path_patterns = ["**/landing/**", "**/marketing/**"]
material = "glass"
motion_profile = "warm"
"#;

fn project_root() -> Result<PathBuf, error::AtelierError> {
    Ok(std::env::current_dir()?)
}

pub fn run() -> Result<(), error::AtelierError> {
    let cli = Cli::parse();
    let root = project_root()?;
    let store = Store::open(&root);
    let cfg = config::load_config(&root);

    match cli.command {
        Command::Init(init_cli) => {
            let dir = init_cli.dir.unwrap_or(root);
            run_init(&dir)?;
        }
        Command::Workshop(workshop_cli) => match workshop_cli.command {
            WorkshopCommand::Build { force } => {
                if force {
                    let index = workshop::build(&root, &cfg)?;
                    workshop::persist_index(&store, &index)?;
                    println!(
                        "Workshop indexed: {} materials, {} components, {} physics, {} zones.",
                        index.materials.len(),
                        index.components.len(),
                        index.physics.len(),
                        index.zones.len()
                    );
                } else {
                    let (index, ensure) = workshop::ensure_fresh(&store, &root, &cfg)?;
                    if ensure.lock_contended {
                        eprintln!("{}", "warning: rebuild lease held elsewhere".yellow());
                    }
                    if ensure.rebuilt {
                        println!(
                            "Workshop rebuilt ({:?}): {} materials, {} components.",
                            ensure.reason.unwrap_or(workshop::StalenessReason::Missing),
                            index.materials.len(),
                            index.components.len()
                        );
                    } else {
                        println!("Workshop index is {}; nothing to do.", "fresh".green());
                    }
                }
            }
            WorkshopCommand::Status => {
                let staleness = workshop::check_store_staleness(&store, &root);
                if staleness.stale {
                    println!(
                        "{} ({:?})",
                        "stale".yellow().bold(),
                        staleness.reason.unwrap_or(workshop::StalenessReason::Missing)
                    );
                } else {
                    println!("{}", "fresh".green().bold());
                }
            }
            WorkshopCommand::Query { kind, name } => {
                // Queries are pure reads: a missing or corrupt index is
                // rebuilt in memory, never persisted from this path.
                let index = match workshop::load_index(&store) {
                    Some(index) => index,
                    None => workshop::build(&root, &cfg)?,
                };
                let result = match kind.as_str() {
                    "material" => index.query_material(&name).map(|e| serde_json::to_value(e)),
                    "component" => index.query_component(&name).map(|e| serde_json::to_value(e)),
                    "physics" => index.query_physics(&name).map(|e| serde_json::to_value(e)),
                    "zone" => index.query_zone(&name).map(|e| serde_json::to_value(e)),
                    other => {
                        return Err(error::AtelierError::ValidationError(format!(
                            "unknown query kind '{}' (expected material|component|physics|zone)",
                            other
                        )));
                    }
                };
                match result {
                    Some(value) => println!("{}", serde_json::to_string_pretty(&value?)?),
                    None => {
                        return Err(error::AtelierError::NotFound(format!(
                            "{} '{}' not in the workshop index",
                            kind, name
                        )));
                    }
                }
            }
        },
        Command::Zone(zone_cli) => match zone_cli.command {
            ZoneCommand::Resolve { path } => {
                let resolved = zones::resolve_zone(&path, &cfg);
                println!(
                    "{}  material={}  motion={}",
                    resolved.name.bold(),
                    resolved.material,
                    resolved.motion_profile
                );
            }
            ZoneCommand::List => {
                for zone in &cfg.zones {
                    let patterns = if zone.path_patterns.is_empty() {
                        config::fallback_patterns(&zone.name).join(", ")
                    } else {
                        zone.path_patterns.join(", ")
                    };
                    println!(
                        "{:<12} material={:<10} motion={:<12} {}",
                        zone.name, zone.material, zone.motion_profile, patterns
                    );
                }
            }
        },
        Command::Physics(physics_cli) => match physics_cli.command {
            PhysicsCommand::Check {
                path,
                motion,
                timing,
            } => {
                let zone = zones::resolve_zone(&path, &cfg);
                let mut checks = vec![physics::validate_zone_constraints(&zone, &motion)];
                if let Some(timing_ms) = timing {
                    checks.push(physics::validate_timing(&motion, timing_ms));
                    checks.push(physics::validate_material_constraints(&zone.material, timing_ms));
                }
                report_physics_checks(&checks);
            }
            PhysicsCommand::Effect {
                effect,
                sync,
                confirmed,
            } => {
                let check = physics::validate_physics_effect(effect, sync, confirmed);
                report_physics_checks(&[check]);
            }
        },
        Command::Survival(survival_cli) => {
            survival::run_survival_cli(&store, &root, survival_cli)?;
        }
        Command::Curate(curate_cli) => {
            curation::run_curate_cli(&store, curate_cli)?;
        }
        Command::Era(era_cli) => {
            era::run_era_cli(&store, era_cli)?;
        }
        Command::Seed(seed_cli) => {
            seed::run_seed_cli(&store, &root, seed_cli)?;
        }
        Command::Sentinel(sentinel_cli) => match sentinel_cli.command {
            SentinelCommand::Validate {
                file,
                import,
                content,
            } => {
                run_sentinel_validate(&root, &cfg, &file, import.as_deref(), content.as_deref())?;
            }
            SentinelCommand::Scan => {
                let findings = registry::scan_repository(&root, &cfg);
                if findings.is_empty() {
                    println!("{}", "No contagion violations.".green());
                } else {
                    for finding in &findings {
                        let location = match finding.line {
                            Some(line) => format!("{}:{}", finding.file, line),
                            None => finding.file.clone(),
                        };
                        println!(
                            "{} [{}] {}  {}",
                            "violation".red().bold(),
                            finding.rule,
                            location,
                            finding.message
                        );
                    }
                    return Err(error::AtelierError::ValidationError(format!(
                        "{} contagion violation(s)",
                        findings.len()
                    )));
                }
            }
        },
        Command::Context(context_cli) => {
            context::run_context_cli(&cfg, context_cli)?;
        }
        Command::Schema(schema_cli) => {
            run_schema(&schema_cli)?;
        }
        Command::Version => {
            println!("atelier {}", env!("CARGO_PKG_VERSION"));
        }
    }
    Ok(())
}

fn run_init(dir: &Path) -> Result<(), error::AtelierError> {
    let store = Store::open(dir);
    store.ensure()?;
    fs::create_dir_all(store.eras_dir())?;

    let survival_path = store.path(crate::core::store::SURVIVAL_FILE);
    if !survival_path.exists() {
        survival::save_ledger(&store, &survival::SurvivalLedger::new(survival::DEFAULT_ERA))?;
    }

    let config_path = dir.join(config::CONFIG_FILE_NAME);
    if !config_path.exists() {
        fs::write(&config_path, STARTER_CONFIG)?;
        println!("Wrote starter config at {}", config_path.display());
    }
    println!("Initialized atelier state at {}", store.root.display());
    Ok(())
}

fn report_physics_checks(checks: &[physics::PhysicsCheck]) {
    let violations: Vec<&physics::PhysicsViolation> =
        checks.iter().flat_map(|c| c.violations.iter()).collect();
    if violations.is_empty() {
        println!("{}", "valid".green().bold());
        return;
    }
    for violation in violations {
        println!(
            "{} [{}] {}: {}",
            "violation".red().bold(),
            violation.rule,
            violation.subject,
            violation.message
        );
    }
}

fn run_sentinel_validate(
    root: &Path,
    cfg: &config::StudioConfig,
    file: &str,
    import: Option<&str>,
    content: Option<&Path>,
) -> Result<(), error::AtelierError> {
    use crate::core::time::command_envelope;

    if let Some(specifier) = import {
        let decision = sentinel::validate_import(root, cfg, file, specifier);
        let envelope = command_envelope(
            "sentinel.validate",
            if decision.allowed { "allow" } else { "block" },
            serde_json::to_value(&decision)?,
        );
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        if !decision.allowed {
            return Err(error::AtelierError::ContagionViolation {
                rule: decision.rule.unwrap_or_else(|| "tier-contagion".to_string()),
                path: file.to_string(),
                message: decision.reason.unwrap_or_default(),
            });
        }
        return Ok(());
    }

    let Some(content_path) = content else {
        return Err(error::AtelierError::ValidationError(
            "pass --import <specifier> or --content <path>".to_string(),
        ));
    };
    let proposed = fs::read_to_string(content_path)?;
    let response = sentinel::validate_write(root, cfg, file, &proposed);
    let envelope = command_envelope(
        "sentinel.validate",
        if response.allow { "allow" } else { "block" },
        serde_json::to_value(&response)?,
    );
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    if !response.allow {
        return Err(error::AtelierError::ContagionViolation {
            rule: "tier-contagion".to_string(),
            path: file.to_string(),
            message: format!(
                "{} blocking finding(s)",
                response
                    .findings
                    .iter()
                    .filter(|f| f.severity == sentinel::Severity::Error)
                    .count()
            ),
        });
    }
    Ok(())
}

fn run_schema(schema_cli: &SchemaCli) -> Result<(), error::AtelierError> {
    let schemas = vec![
        workshop::schema(),
        registry::schema(),
        sentinel::schema(),
        survival::schema(),
        curation::schema(),
        era::schema(),
        seed::schema(),
        context::schema(),
    ];
    let filtered: Vec<serde_json::Value> = match &schema_cli.subsystem {
        Some(name) => schemas
            .into_iter()
            .filter(|s| s["name"] == name.as_str())
            .collect(),
        None => schemas,
    };
    if filtered.is_empty() {
        return Err(error::AtelierError::NotFound(
            "no subsystem matched".to_string(),
        ));
    }
    let envelope = serde_json::json!({
        "schema_version": "1.0.0",
        "subsystems": filtered
    });
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}
