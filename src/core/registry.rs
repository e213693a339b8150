//! Tier registries and contagion rules.
//!
//! Three registries, Gold (canonical), Silver (proven), and Draft
//! (quarantined), each expose a curated entry point whose export
//! statements form a
//! directed graph over project files. Tier membership is the set of files
//! reachable from a registry's entry point, so quarantine holds transitively:
//! a Gold re-export of a Silver file that itself imports Draft is a
//! violation two hops away, found by the same reachability computation.

use crate::core::config::StudioConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryTier {
    Gold,
    Silver,
    Draft,
}

impl fmt::Display for RegistryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gold => write!(f, "gold"),
            Self::Silver => write!(f, "silver"),
            Self::Draft => write!(f, "draft"),
        }
    }
}

/// Which tiers each tier may import from. Draft is quarantined: it may use
/// anything, but nothing canonical may use it.
pub fn allowed_imports(tier: RegistryTier) -> &'static [RegistryTier] {
    match tier {
        RegistryTier::Gold => &[RegistryTier::Gold],
        RegistryTier::Silver => &[RegistryTier::Gold, RegistryTier::Silver],
        RegistryTier::Draft => &[RegistryTier::Gold, RegistryTier::Silver, RegistryTier::Draft],
    }
}

pub fn is_import_allowed(from: RegistryTier, to: RegistryTier) -> bool {
    allowed_imports(from).contains(&to)
}

/// One export statement parsed from a registry entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryExport {
    /// Exported name, `*` for wildcard re-exports.
    pub name: String,
    pub source_path: String,
    pub is_type: bool,
}

/// Parse state of a single registry entry point. A missing entry point is
/// recorded as state, not raised as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryState {
    pub tier: RegistryTier,
    pub path: String,
    pub exists: bool,
    pub exports: Vec<RegistryExport>,
    pub errors: Vec<String>,
}

/// Export/import edges per file, plus the reachable membership set per tier.
#[derive(Debug, Clone)]
pub struct TierGraph {
    pub adjacency: BTreeMap<String, Vec<String>>,
    pub gold: BTreeSet<String>,
    pub silver: BTreeSet<String>,
    pub draft: BTreeSet<String>,
}

impl TierGraph {
    pub fn membership(&self, file: &str) -> Option<RegistryTier> {
        // Gold wins over Silver for files reachable from both.
        if self.gold.contains(file) {
            return Some(RegistryTier::Gold);
        }
        if self.silver.contains(file) {
            return Some(RegistryTier::Silver);
        }
        if self.draft.contains(file) {
            return Some(RegistryTier::Draft);
        }
        None
    }
}

fn export_patterns() -> Vec<(Regex, bool)> {
    // (pattern, is_type)
    vec![
        (
            Regex::new(r#"export\s+type\s+\{\s*([^}]+)\}\s+from\s+['"]([^'"]+)['"]"#).unwrap(),
            true,
        ),
        (
            Regex::new(r#"export\s+\{\s*([^}]+)\}\s+from\s+['"]([^'"]+)['"]"#).unwrap(),
            false,
        ),
        (
            Regex::new(r#"export\s+\*\s+from\s+['"]([^'"]+)['"]"#).unwrap(),
            false,
        ),
    ]
}

/// Extract `export {...} from '...'` and `export * from '...'` statements.
pub fn parse_exports(content: &str) -> Vec<RegistryExport> {
    let mut exports = Vec::new();

    for (pattern, is_type) in export_patterns() {
        for cap in pattern.captures_iter(content) {
            if cap.len() == 3 {
                let source = cap[2].to_string();
                for raw in cap[1].split(',') {
                    let name = raw.trim().split_whitespace().next().unwrap_or("").to_string();
                    if name.is_empty() {
                        continue;
                    }
                    exports.push(RegistryExport {
                        name,
                        source_path: source.clone(),
                        is_type,
                    });
                }
            } else {
                exports.push(RegistryExport {
                    name: "*".to_string(),
                    source_path: cap[1].to_string(),
                    is_type: false,
                });
            }
        }
    }
    exports
}

fn import_specifier_patterns() -> Vec<Regex> {
    vec![
        Regex::new(r#"(?m)^\s*import\s+[^;'"]*['"]([^'"]+)['"]"#).unwrap(),
        Regex::new(r#"(?m)^\s*export\s+[^;'"]*from\s+['"]([^'"]+)['"]"#).unwrap(),
        Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap(),
    ]
}

/// A single import found in a file, with its 1-indexed line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportStatement {
    pub specifier: String,
    pub line: usize,
}

pub fn parse_imports(content: &str) -> Vec<ImportStatement> {
    let patterns = import_specifier_patterns();
    let mut imports = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        for pattern in &patterns {
            if let Some(cap) = pattern.captures(line) {
                imports.push(ImportStatement {
                    specifier: cap[1].to_string(),
                    line: idx + 1,
                });
                break;
            }
        }
    }
    imports
}

/// Normalize `.` / `..` components out of a joined path.
fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<std::ffi::OsString> = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                parts.pop();
            }
            Component::Normal(c) => parts.push(c.to_os_string()),
            Component::CurDir => {}
            _ => {}
        }
    }
    parts.iter().collect()
}

/// Resolve a relative import specifier to a project-relative file path,
/// trying the usual extension and index-file conventions. Bare (package)
/// specifiers resolve to `None`.
pub fn resolve_specifier(
    project_root: &Path,
    from_file: &str,
    specifier: &str,
) -> Option<String> {
    let base = if let Some(rest) = specifier.strip_prefix("@/") {
        PathBuf::from("src").join(rest)
    } else if specifier.starts_with('.') {
        let parent = Path::new(from_file).parent().unwrap_or(Path::new(""));
        normalize(&parent.join(specifier))
    } else {
        return None;
    };

    let candidates = [
        base.clone(),
        base.with_extension("ts"),
        base.with_extension("tsx"),
        base.with_extension("js"),
        base.with_extension("jsx"),
        base.join("index.ts"),
        base.join("index.tsx"),
        base.join("index.js"),
    ];
    for candidate in candidates {
        if project_root.join(&candidate).is_file() {
            return Some(candidate.to_string_lossy().replace('\\', "/"));
        }
    }
    None
}

/// Parse one registry entry point.
pub fn parse_registry(project_root: &Path, entry: &str, tier: RegistryTier) -> RegistryState {
    let mut state = RegistryState {
        tier,
        path: entry.to_string(),
        exists: false,
        exports: Vec::new(),
        errors: Vec::new(),
    };
    let full = project_root.join(entry);
    if !full.is_file() {
        state
            .errors
            .push(format!("registry entry point not found: {}", entry));
        return state;
    }
    state.exists = true;
    match fs::read_to_string(&full) {
        Ok(content) => state.exports = parse_exports(&content),
        Err(err) => state.errors.push(format!("failed to read registry: {}", err)),
    }
    state
}

/// Breadth-first reachability from an entry point over export/import edges.
fn reachable_from(
    project_root: &Path,
    entry: &str,
    adjacency: &mut BTreeMap<String, Vec<String>>,
) -> BTreeSet<String> {
    let mut reached = BTreeSet::new();
    let mut queue = VecDeque::new();

    if project_root.join(entry).is_file() {
        reached.insert(entry.to_string());
        queue.push_back(entry.to_string());
    }

    while let Some(file) = queue.pop_front() {
        let edges = adjacency.entry(file.clone()).or_insert_with(|| {
            let content = fs::read_to_string(project_root.join(&file)).unwrap_or_default();
            parse_imports(&content)
                .into_iter()
                .filter_map(|imp| resolve_specifier(project_root, &file, &imp.specifier))
                .collect()
        });
        for next in edges.clone() {
            if reached.insert(next.clone()) {
                queue.push_back(next);
            }
        }
    }
    reached
}

/// Build the full tier graph: adjacency plus per-tier membership sets.
pub fn build_tier_graph(project_root: &Path, config: &StudioConfig) -> TierGraph {
    let mut adjacency = BTreeMap::new();
    let gold = reachable_from(project_root, &config.registry.gold_entry, &mut adjacency);
    let silver = reachable_from(project_root, &config.registry.silver_entry, &mut adjacency);
    let draft = reachable_from(project_root, &config.registry.draft_entry, &mut adjacency);
    TierGraph {
        adjacency,
        gold,
        silver,
        draft,
    }
}

/// Tier claimed by a path's segments alone (`/gold/`, `/silver/`, `/draft/`).
pub fn tier_from_path(path: &str) -> Option<RegistryTier> {
    let normalized = format!("/{}/", path.replace('\\', "/").trim_matches('/'));
    if normalized.contains("/gold/") {
        Some(RegistryTier::Gold)
    } else if normalized.contains("/silver/") {
        Some(RegistryTier::Silver)
    } else if normalized.contains("/draft/") {
        Some(RegistryTier::Draft)
    } else {
        None
    }
}

/// Tier of a file: path segments first, then registry membership.
pub fn tier_of_file(file: &str, graph: &TierGraph) -> Option<RegistryTier> {
    tier_from_path(file).or_else(|| graph.membership(file))
}

/// Tier of an import target: path segments on the raw specifier, falling
/// back to membership of the resolved file.
pub fn tier_of_import(
    project_root: &Path,
    from_file: &str,
    specifier: &str,
    graph: &TierGraph,
) -> Option<RegistryTier> {
    if let Some(tier) = tier_from_path(specifier) {
        return Some(tier);
    }
    resolve_specifier(project_root, from_file, specifier).and_then(|f| graph.membership(&f))
}

fn is_direct_component_import(specifier: &str) -> bool {
    specifier.contains("/components/") || specifier.starts_with("components/")
}

fn direct_import_allowed(specifier: &str, config: &StudioConfig) -> bool {
    config
        .registry
        .allowed_direct_imports
        .iter()
        .any(|pattern| Regex::new(pattern).map(|re| re.is_match(specifier)).unwrap_or(false))
}

/// A contagion finding from the gate or the whole-repository scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContagionFinding {
    pub rule: String,
    pub file: String,
    pub import: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

/// Decision returned by the pre-write gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl GateDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            rule: None,
        }
    }

    fn block(rule: &str, reason: String) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            rule: Some(rule.to_string()),
        }
    }
}

/// Validate one proposed import edge against the contagion rules.
pub fn validate_import_edge(
    project_root: &Path,
    config: &StudioConfig,
    graph: &TierGraph,
    file_path: &str,
    specifier: &str,
) -> GateDecision {
    let Some(file_tier) = tier_of_file(file_path, graph) else {
        // Files outside every registry may import anything.
        return GateDecision::allow();
    };

    if let Some(import_tier) = tier_of_import(project_root, file_path, specifier, graph) {
        if !is_import_allowed(file_tier, import_tier) {
            return GateDecision::block(
                "tier-contagion",
                format!(
                    "{} cannot import from {}: {} may only import {}",
                    file_tier,
                    import_tier,
                    file_tier,
                    allowed_imports(file_tier)
                        .iter()
                        .map(|t| t.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            );
        }
    }

    // The registry entry point is the indirection itself; its re-exports
    // from component paths are the sanctioned mechanism.
    let is_registry_entry = file_path == config.registry.gold_entry;
    if file_tier == RegistryTier::Gold
        && !is_registry_entry
        && is_direct_component_import(specifier)
        && !direct_import_allowed(specifier, config)
    {
        return GateDecision::block(
            "gold-registry-indirection",
            format!(
                "gold files must import components through the registry, not '{}' directly",
                specifier
            ),
        );
    }

    GateDecision::allow()
}

/// Whole-repository contagion scan.
///
/// Walks every file reachable from the Gold and Silver entry points and
/// flags imports that land in a quarantined tier. Transitive violations fall
/// out of reachability: an offending file two re-export hops from the entry
/// point is still in the reachable set.
pub fn scan_repository(project_root: &Path, config: &StudioConfig) -> Vec<ContagionFinding> {
    let graph = build_tier_graph(project_root, config);
    let mut findings = Vec::new();

    let surfaces: [(&BTreeSet<String>, RegistryTier); 2] =
        [(&graph.gold, RegistryTier::Gold), (&graph.silver, RegistryTier::Silver)];

    for (members, tier) in surfaces {
        for file in members.iter() {
            // A file can be reachable from both entry points; report it once
            // under its strictest membership.
            if tier == RegistryTier::Silver && graph.gold.contains(file) {
                continue;
            }
            let content = fs::read_to_string(project_root.join(file)).unwrap_or_default();
            for import in parse_imports(&content) {
                if let Some(import_tier) =
                    tier_of_import(project_root, file, &import.specifier, &graph)
                {
                    if !is_import_allowed(tier, import_tier) {
                        findings.push(ContagionFinding {
                            rule: "tier-contagion".to_string(),
                            file: file.clone(),
                            import: import.specifier.clone(),
                            line: Some(import.line),
                            message: format!(
                                "{} file '{}' reaches {} via '{}'",
                                tier, file, import_tier, import.specifier
                            ),
                        });
                    }
                }
                if tier == RegistryTier::Gold
                    && file != &config.registry.gold_entry
                    && is_direct_component_import(&import.specifier)
                    && !direct_import_allowed(&import.specifier, config)
                {
                    findings.push(ContagionFinding {
                        rule: "gold-registry-indirection".to_string(),
                        file: file.clone(),
                        import: import.specifier.clone(),
                        line: Some(import.line),
                        message: format!(
                            "gold file '{}' bypasses the registry with direct import '{}'",
                            file, import.specifier
                        ),
                    });
                }
            }
        }
    }
    findings
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "registry",
        "version": "0.1.0",
        "description": "Tier registries and contagion quarantine rules",
        "commands": [
            { "name": "scan", "description": "Whole-repository contagion scan" }
        ],
        "storage": []
    })
}
