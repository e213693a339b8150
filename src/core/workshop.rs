//! Workshop index: a cached, content-hash-validated snapshot of the
//! project's design primitives (materials, components, physics, zones).
//!
//! The index is owned exclusively by the builder. Readers treat a loaded
//! index as immutable; on any hash mismatch the whole index is rebuilt and
//! atomically replaced, never patched in place. Queries are plain map
//! lookups against the loaded snapshot and never trigger a rebuild
//! themselves.

use crate::core::config::StudioConfig;
use crate::core::error::AtelierError;
use crate::core::store::{self, Store, WORKSHOP_FILE, WORKSHOP_LOCK_FILE};
use crate::core::time::{new_event_id, now_epoch_secs, now_epoch_z};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// How long a rebuild lease is honored before being reclaimed as stale.
pub const REBUILD_LOCK_TTL_SECS: u64 = 30;

/// Cap on recorded vocabulary/import hints per component entry.
const COMPONENT_IMPORT_CAP: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentEntry {
    /// Path relative to the project root.
    pub path: String,
    pub tier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physics: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vocabulary: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsEntry {
    pub timing_ms: u64,
    pub easing: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneEntry {
    pub material: String,
    pub motion_profile: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkshopIndex {
    pub indexed_at: String,
    pub manifest_hash: String,
    pub imports_hash: String,
    pub materials: BTreeMap<String, MaterialEntry>,
    pub components: BTreeMap<String, ComponentEntry>,
    pub physics: BTreeMap<String, PhysicsEntry>,
    pub zones: BTreeMap<String, ZoneEntry>,
}

impl WorkshopIndex {
    pub fn query_material(&self, name: &str) -> Option<&MaterialEntry> {
        self.materials.get(name)
    }

    pub fn query_component(&self, name: &str) -> Option<&ComponentEntry> {
        self.components.get(name)
    }

    pub fn query_physics(&self, name: &str) -> Option<&PhysicsEntry> {
        self.physics.get(name)
    }

    pub fn query_zone(&self, name: &str) -> Option<&ZoneEntry> {
        self.zones.get(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalenessReason {
    ManifestChanged,
    ImportsChanged,
    Missing,
    Corrupt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StalenessCheck {
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<StalenessReason>,
    pub current_manifest_hash: String,
    pub current_imports_hash: String,
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Locate the project's dependency manifest. Cargo and node manifests are
/// both recognized; the first present wins.
fn manifest_path(project_root: &Path) -> Option<std::path::PathBuf> {
    for name in ["package.json", "Cargo.toml"] {
        let candidate = project_root.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Content hash of the dependency manifest text. A missing manifest hashes
/// the empty string so staleness stays deterministic.
pub fn manifest_hash(project_root: &Path) -> String {
    let text = manifest_path(project_root)
        .and_then(|p| fs::read_to_string(p).ok())
        .unwrap_or_default();
    sha256_hex(&text)
}

/// Content hash of the deterministically ordered set of import statements
/// across the scanned surface.
///
/// Only import statement text participates: a change inside an imported file
/// that does not touch its import lines will not flip this hash.
pub fn imports_hash(project_root: &Path) -> String {
    let imports = collect_import_statements(project_root);
    sha256_hex(&imports.into_iter().collect::<Vec<_>>().join("\n"))
}

fn import_patterns() -> Vec<Regex> {
    vec![
        Regex::new(r#"(?m)^\s*import\s+[^;'"]*['"]([^'"]+)['"]"#).unwrap(),
        Regex::new(r#"(?m)^\s*export\s+[^;'"]*from\s+['"]([^'"]+)['"]"#).unwrap(),
        Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap(),
        Regex::new(r#"(?m)^\s*use\s+([A-Za-z0-9_:]+)"#).unwrap(),
    ]
}

fn source_extensions(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("ts" | "tsx" | "js" | "jsx" | "rs")
    )
}

fn walk_sources(dir: &Path, out: &mut Vec<std::path::PathBuf>) {
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
            walk_sources(&path, out);
        } else if path.is_file() && source_extensions(&path) {
            out.push(path);
        }
    }
}

fn collect_import_statements(project_root: &Path) -> BTreeSet<String> {
    let mut files = Vec::new();
    walk_sources(project_root, &mut files);
    files.sort();

    let patterns = import_patterns();
    let mut statements = BTreeSet::new();
    for file in files {
        let Ok(content) = fs::read_to_string(&file) else {
            continue;
        };
        for pattern in &patterns {
            for cap in pattern.captures_iter(&content) {
                if let Some(m) = cap.get(0) {
                    statements.insert(m.as_str().trim().to_string());
                }
            }
        }
    }
    statements
}

fn parse_manifest_materials(project_root: &Path) -> BTreeMap<String, MaterialEntry> {
    let mut materials = BTreeMap::new();
    let Some(path) = manifest_path(project_root) else {
        return materials;
    };
    let Ok(text) = fs::read_to_string(&path) else {
        return materials;
    };

    if path.file_name().and_then(|n| n.to_str()) == Some("package.json") {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
            for section in ["dependencies", "devDependencies"] {
                if let Some(deps) = value.get(section).and_then(|d| d.as_object()) {
                    for (name, version) in deps {
                        materials.insert(
                            name.clone(),
                            MaterialEntry {
                                version: version.as_str().unwrap_or("*").to_string(),
                            },
                        );
                    }
                }
            }
        }
    } else if let Ok(value) = text.parse::<toml::Value>() {
        for section in ["dependencies", "dev-dependencies"] {
            if let Some(deps) = value.get(section).and_then(|d| d.as_table()) {
                for (name, spec) in deps {
                    let version = match spec {
                        toml::Value::String(v) => v.clone(),
                        toml::Value::Table(t) => t
                            .get("version")
                            .and_then(|v| v.as_str())
                            .unwrap_or("*")
                            .to_string(),
                        _ => "*".to_string(),
                    };
                    materials.insert(name.clone(), MaterialEntry { version });
                }
            }
        }
    }
    materials
}

fn pragma_value(content: &str, pragma: &str) -> Option<String> {
    let re = Regex::new(&format!(r"@atelier-{}\s+([A-Za-z0-9_:,\- ]+)", pragma)).ok()?;
    re.captures(content)
        .map(|c| c[1].trim().trim_end_matches("*/").trim().to_string())
}

fn scan_components(project_root: &Path) -> BTreeMap<String, ComponentEntry> {
    let mut files = Vec::new();
    walk_sources(project_root, &mut files);
    files.sort();

    let patterns = import_patterns();
    let mut components = BTreeMap::new();
    for file in files {
        let Ok(content) = fs::read_to_string(&file) else {
            continue;
        };
        let Some(tier) = pragma_value(&content, "tier") else {
            continue;
        };

        let name = file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let rel = file
            .strip_prefix(project_root)
            .unwrap_or(&file)
            .to_string_lossy()
            .replace('\\', "/");

        let mut imports = BTreeSet::new();
        for pattern in &patterns {
            for cap in pattern.captures_iter(&content) {
                if let Some(m) = cap.get(1) {
                    imports.insert(m.as_str().to_string());
                }
            }
        }

        let vocabulary = pragma_value(&content, "vocabulary")
            .map(|v| {
                v.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        components.insert(
            name,
            ComponentEntry {
                path: rel,
                tier,
                zone: pragma_value(&content, "zone"),
                physics: pragma_value(&content, "physics"),
                vocabulary,
                imports: imports.into_iter().take(COMPONENT_IMPORT_CAP).collect(),
            },
        );
    }
    components
}

/// Build a fresh workshop index by scanning the source tree and manifest.
pub fn build(project_root: &Path, config: &StudioConfig) -> Result<WorkshopIndex, AtelierError> {
    let physics = config
        .physics
        .motion_timings
        .iter()
        .map(|(name, timing)| {
            let easing = config
                .physics
                .motion_easings
                .get(name)
                .cloned()
                .unwrap_or_else(|| "ease-in-out".to_string());
            (
                name.clone(),
                PhysicsEntry {
                    timing_ms: *timing,
                    easing,
                },
            )
        })
        .collect();

    let zones = config
        .zones
        .iter()
        .map(|zone| {
            (
                zone.name.clone(),
                ZoneEntry {
                    material: zone.material.clone(),
                    motion_profile: zone.motion_profile.clone(),
                    path_patterns: zone.path_patterns.clone(),
                },
            )
        })
        .collect();

    Ok(WorkshopIndex {
        indexed_at: now_epoch_z(),
        manifest_hash: manifest_hash(project_root),
        imports_hash: imports_hash(project_root),
        materials: parse_manifest_materials(project_root),
        components: scan_components(project_root),
        physics,
        zones,
    })
}

/// Recompute both content hashes and compare against the persisted index.
/// Any mismatch, missing or corrupt index ⇒ stale ⇒ full rebuild.
pub fn check_staleness(project_root: &Path, existing: Option<&WorkshopIndex>) -> StalenessCheck {
    let current_manifest = manifest_hash(project_root);
    let current_imports = imports_hash(project_root);

    let (stale, reason) = match existing {
        None => (true, Some(StalenessReason::Missing)),
        Some(index) if index.manifest_hash != current_manifest => {
            (true, Some(StalenessReason::ManifestChanged))
        }
        Some(index) if index.imports_hash != current_imports => {
            (true, Some(StalenessReason::ImportsChanged))
        }
        Some(_) => (false, None),
    };

    StalenessCheck {
        stale,
        reason,
        current_manifest_hash: current_manifest,
        current_imports_hash: current_imports,
    }
}

pub fn load_index(store: &Store) -> Option<WorkshopIndex> {
    store::load_document(&store.path(WORKSHOP_FILE))
}

/// Staleness of the persisted index, distinguishing a corrupt document from
/// a missing one. Both force a rebuild; neither is fatal.
pub fn check_store_staleness(store: &Store, project_root: &Path) -> StalenessCheck {
    let existing = load_index(store);
    let mut check = check_staleness(project_root, existing.as_ref());
    if existing.is_none() && store.path(WORKSHOP_FILE).exists() {
        check.reason = Some(StalenessReason::Corrupt);
    }
    check
}

pub fn persist_index(store: &Store, index: &WorkshopIndex) -> Result<(), AtelierError> {
    store.ensure()?;
    store::write_document(&store.path(WORKSHOP_FILE), index)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildLock {
    pub owner: String,
    pub acquired_at: u64,
    pub expires_at: u64,
}

/// Try to acquire the rebuild lease. Returns the owner token on success,
/// `None` while another unexpired lease is held. A lease left behind by a
/// crashed builder is reclaimed once expired.
pub fn acquire_rebuild_lock(store: &Store) -> Result<Option<String>, AtelierError> {
    store.ensure()?;
    let lock_path = store.path(WORKSHOP_LOCK_FILE);
    if let Some(existing) = store::load_document::<RebuildLock>(&lock_path) {
        if existing.expires_at > now_epoch_secs() {
            return Ok(None);
        }
    }
    let owner = new_event_id();
    let now = now_epoch_secs();
    let lock = RebuildLock {
        owner: owner.clone(),
        acquired_at: now,
        expires_at: now + REBUILD_LOCK_TTL_SECS,
    };
    store::write_document(&lock_path, &lock)?;
    Ok(Some(owner))
}

pub fn release_rebuild_lock(store: &Store, owner: &str) {
    let lock_path = store.path(WORKSHOP_LOCK_FILE);
    if let Some(existing) = store::load_document::<RebuildLock>(&lock_path) {
        if existing.owner == owner {
            let _ = fs::remove_file(&lock_path);
        }
    }
}

/// Outcome of [`ensure_fresh`]: the index to use plus how it was obtained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsureResult {
    pub rebuilt: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<StalenessReason>,
    /// The caller proceeded with a stale index because the rebuild lease was
    /// held elsewhere. Staleness is preferred over availability loss.
    pub lock_contended: bool,
}

/// Load the persisted index, rebuilding it when stale.
///
/// If the rebuild lease cannot be acquired, the existing (possibly stale)
/// index is returned rather than blocking. With no usable index at all the
/// build still runs in memory; only the persist step needs the lease.
pub fn ensure_fresh(
    store: &Store,
    project_root: &Path,
    config: &StudioConfig,
) -> Result<(WorkshopIndex, EnsureResult), AtelierError> {
    let existing = load_index(store);
    let mut staleness = check_staleness(project_root, existing.as_ref());
    if existing.is_none() && store.path(WORKSHOP_FILE).exists() {
        staleness.reason = Some(StalenessReason::Corrupt);
    }

    // A fresh verdict implies a loaded index exists.
    let existing = match (staleness.stale, existing) {
        (false, Some(index)) => {
            return Ok((
                index,
                EnsureResult {
                    rebuilt: false,
                    reason: None,
                    lock_contended: false,
                },
            ));
        }
        (_, existing) => existing,
    };

    match acquire_rebuild_lock(store)? {
        Some(owner) => {
            let index = build(project_root, config)?;
            persist_index(store, &index)?;
            release_rebuild_lock(store, &owner);
            Ok((
                index,
                EnsureResult {
                    rebuilt: true,
                    reason: staleness.reason,
                    lock_contended: false,
                },
            ))
        }
        None => match existing {
            Some(index) => {
                eprintln!("[atelier] rebuild lease held elsewhere; using stale workshop index");
                Ok((
                    index,
                    EnsureResult {
                        rebuilt: false,
                        reason: staleness.reason,
                        lock_contended: true,
                    },
                ))
            }
            None => {
                let index = build(project_root, config)?;
                Ok((
                    index,
                    EnsureResult {
                        rebuilt: true,
                        reason: staleness.reason,
                        lock_contended: true,
                    },
                ))
            }
        },
    }
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "workshop",
        "version": "0.1.0",
        "description": "Content-hash-validated index of design primitives",
        "commands": [
            { "name": "build", "description": "Rebuild the workshop index" },
            { "name": "status", "description": "Report staleness against current hashes" },
            { "name": "query", "parameters": ["kind", "name"] }
        ],
        "storage": ["workshop.json", "workshop.lock"]
    })
}
