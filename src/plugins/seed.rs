//! Virtual sanctuary seeds: fallback component definitions for cold starts.
//!
//! Before any real components exist, a seed supplies virtual stand-ins so
//! zone/physics guidance has something to point at. Once a real component
//! with the same name appears in the source tree, the virtual stand-in is
//! evicted permanently; deleting the real component later does not bring
//! the stand-in back. `reset` is the only way to clear eviction state, and
//! it must be invoked explicitly.

use crate::core::error::AtelierError;
use crate::core::store::{self, SEED_FILE, Store};
use crate::core::time::now_epoch_z;
use clap::{Parser, Subcommand};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// The fixed seed catalog, embedded at compile time.
pub const AVAILABLE_SEEDS: [&str; 4] = ["linear-like", "vercel-like", "stripe-like", "blank"];

macro_rules! embedded_seeds {
    ($($id:expr => $const_name:ident),* $(,)?) => {
        $(
            const $const_name: &str =
                include_str!(concat!("../../assets/seeds/", $id, ".toml"));
        )*

        fn embedded_seed(id: &str) -> Option<&'static str> {
            match id {
                $( $id => Some($const_name), )*
                _ => None,
            }
        }
    };
}

embedded_seeds! {
    "linear-like" => SEED_LINEAR_LIKE,
    "vercel-like" => SEED_VERCEL_LIKE,
    "stripe-like" => SEED_STRIPE_LIKE,
    "blank" => SEED_BLANK,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualComponent {
    pub tier: String,
    pub zone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physics: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vocabulary: Vec<String>,
    /// Permanent once set; cleared only by an explicit reset.
    #[serde(default)]
    pub evicted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evicted_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seed {
    pub seed: String,
    pub description: String,
    /// Zone name → default motion profile.
    #[serde(default)]
    pub physics: BTreeMap<String, String>,
    #[serde(default)]
    pub virtual_components: BTreeMap<String, VirtualComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_at: Option<String>,
}

pub fn load_catalog_seed(id: &str) -> Option<Seed> {
    let content = embedded_seed(id)?;
    match toml::from_str::<Seed>(content) {
        Ok(seed) => Some(seed),
        Err(err) => {
            eprintln!("[atelier] embedded seed '{}' failed to parse: {}", id, err);
            None
        }
    }
}

pub fn load_selected_seed(store: &Store) -> Option<Seed> {
    store::load_document(&store.path(SEED_FILE))
}

pub fn save_seed(store: &Store, seed: &Seed) -> Result<(), AtelierError> {
    store.ensure()?;
    store::write_document(&store.path(SEED_FILE), seed)
}

/// Copy a catalog seed into the store as the active seed.
pub fn select_seed(store: &Store, id: &str) -> Result<Seed, AtelierError> {
    let mut seed = load_catalog_seed(id)
        .ok_or_else(|| AtelierError::NotFound(format!("seed '{}' is not in the catalog", id)))?;
    seed.selected_at = Some(now_epoch_z());
    save_seed(store, &seed)?;
    Ok(seed)
}

/// Names of real components observed in the source tree: files carrying an
/// `@atelier-tier` pragma, keyed by file stem.
pub fn real_component_names(project_root: &Path) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let tier_re = Regex::new(r"@atelier-tier\s+\w+").unwrap();
    collect_components(project_root, &tier_re, &mut names);
    names
}

fn collect_components(dir: &Path, tier_re: &Regex, out: &mut BTreeSet<String>) {
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
            collect_components(&path, tier_re, out);
        } else if path.is_file()
            && matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("ts" | "tsx" | "js" | "jsx" | "rs")
            )
        {
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            if tier_re.is_match(&content) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    out.insert(stem.to_string());
                }
            }
        }
    }
}

pub fn sanctuary_is_empty(project_root: &Path) -> bool {
    real_component_names(project_root).is_empty()
}

/// Sweep the source tree and evict every virtual component shadowed by a
/// real one. Eviction is recorded immediately so it outlives the real
/// component's existence.
pub fn observe_real_components(store: &Store, project_root: &Path) -> Result<usize, AtelierError> {
    let Some(mut seed) = load_selected_seed(store) else {
        return Ok(0);
    };
    let real = real_component_names(project_root);
    let mut evicted = 0usize;
    for (name, component) in seed.virtual_components.iter_mut() {
        if !component.evicted && real.contains(name) {
            component.evicted = true;
            component.evicted_at = Some(now_epoch_z());
            evicted += 1;
        }
    }
    if evicted > 0 {
        save_seed(store, &seed)?;
    }
    Ok(evicted)
}

/// Whether the named virtual component has faded behind a real counterpart.
/// Observes the tree first, so a freshly created real component evicts on
/// the spot.
pub fn check_faded_status(
    store: &Store,
    project_root: &Path,
    name: &str,
) -> Result<bool, AtelierError> {
    observe_real_components(store, project_root)?;
    Ok(is_seed_evicted(store, name))
}

/// Pure flag read: no tree observation, no side effects.
pub fn is_seed_evicted(store: &Store, name: &str) -> bool {
    load_selected_seed(store)
        .and_then(|seed| seed.virtual_components.get(name).map(|c| c.evicted))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualComponentQuery {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<VirtualComponent>,
    pub evicted: bool,
}

/// Query a virtual component definition. Evicted stand-ins report
/// `found: false` with the eviction flag set.
pub fn query_virtual_component(
    store: &Store,
    project_root: &Path,
    name: &str,
) -> Result<VirtualComponentQuery, AtelierError> {
    observe_real_components(store, project_root)?;
    let seed = load_selected_seed(store);
    let component = seed.and_then(|s| s.virtual_components.get(name).cloned());
    Ok(match component {
        Some(component) if component.evicted => VirtualComponentQuery {
            found: false,
            component: None,
            evicted: true,
        },
        Some(component) => VirtualComponentQuery {
            found: true,
            component: Some(component),
            evicted: false,
        },
        None => VirtualComponentQuery {
            found: false,
            component: None,
            evicted: false,
        },
    })
}

/// Restore the active seed from the catalog, clearing all eviction flags.
///
/// Refuses while real components still exist, unless `force` is set:
/// resetting under a live sanctuary would reopen the virtual/real
/// oscillation the eviction rule exists to prevent.
pub fn reset_seed(store: &Store, project_root: &Path, force: bool) -> Result<Seed, AtelierError> {
    let current = load_selected_seed(store)
        .ok_or_else(|| AtelierError::NotFound("no seed selected".to_string()))?;
    if !force && !sanctuary_is_empty(project_root) {
        return Err(AtelierError::ValidationError(
            "real components exist; re-run with --force to reset anyway".to_string(),
        ));
    }
    select_seed(store, &current.seed)
}

#[derive(Parser, Debug)]
#[clap(name = "seed", about = "Virtual sanctuary seeds for cold starts")]
pub struct SeedCli {
    #[clap(subcommand)]
    pub command: SeedCommand,
}

#[derive(Subcommand, Debug)]
pub enum SeedCommand {
    /// List the seed catalog.
    List,
    /// Select a seed as the active virtual sanctuary.
    Select {
        #[clap(long)]
        id: String,
    },
    /// Query a virtual component definition.
    Query {
        #[clap(long)]
        name: String,
    },
    /// Show the active seed and its eviction state.
    Status,
    /// Restore the active seed from the catalog, clearing evictions.
    Reset {
        #[clap(long)]
        force: bool,
    },
}

pub fn run_seed_cli(store: &Store, project_root: &Path, cli: SeedCli) -> Result<(), AtelierError> {
    match cli.command {
        SeedCommand::List => {
            for id in AVAILABLE_SEEDS {
                if let Some(seed) = load_catalog_seed(id) {
                    println!("{:<14} {}", id, seed.description);
                }
            }
        }
        SeedCommand::Select { id } => {
            let seed = select_seed(store, &id)?;
            println!(
                "Selected seed '{}' ({} virtual components).",
                seed.seed,
                seed.virtual_components.len()
            );
        }
        SeedCommand::Query { name } => {
            let result = query_virtual_component(store, project_root, &name)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        SeedCommand::Status => match load_selected_seed(store) {
            Some(seed) => println!("{}", serde_json::to_string_pretty(&seed)?),
            None => println!("No seed selected (run `atelier seed select --id <id>`)."),
        },
        SeedCommand::Reset { force } => {
            let seed = reset_seed(store, project_root, force)?;
            println!("Seed '{}' restored from the catalog.", seed.seed);
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "seed",
        "version": "0.1.0",
        "description": "Virtual sanctuary fallback with hard eviction",
        "commands": [
            { "name": "list" },
            { "name": "select", "parameters": ["id"] },
            { "name": "query", "parameters": ["name"] },
            { "name": "status" },
            { "name": "reset", "parameters": ["force"] }
        ],
        "storage": ["seed.json"]
    })
}
