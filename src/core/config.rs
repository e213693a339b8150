//! Project configuration: zones, physics tables, vocabulary, registry layout.
//!
//! Configuration lives in `atelier.toml` at (or above) the project root and is
//! discovered by an explicit walk-up with no hidden working-directory state.
//! A
//! missing or unparseable file degrades to the built-in defaults; it never
//! fails the invocation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "atelier.toml";

/// One zone declaration. Zones are matched in declared order, first match
/// wins, so the order of `[[zones]]` tables in the config file is meaningful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    /// Path patterns claiming files for this zone. `*` matches a single path
    /// segment, `**` any depth. Empty ⇒ built-in fallback patterns apply.
    #[serde(default)]
    pub path_patterns: Vec<String>,
    pub material: String,
    pub motion_profile: String,
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsTables {
    /// Motion category → default timing in milliseconds.
    #[serde(default)]
    pub motion_timings: BTreeMap<String, u64>,
    /// Motion category → easing function.
    #[serde(default)]
    pub motion_easings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyTerm {
    pub id: String,
    pub user_facing: String,
    pub physics: String,
}

/// Registry entry points and the allow-list for direct component imports
/// from canonical-tier files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub gold_entry: String,
    pub silver_entry: String,
    pub draft_entry: String,
    /// Regex patterns permitting specific direct component imports from
    /// canonical-tier files that would otherwise be blocked.
    #[serde(default)]
    pub allowed_direct_imports: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            gold_entry: "src/gold/index.ts".to_string(),
            silver_entry: "src/silver/index.ts".to_string(),
            draft_entry: "src/draft/index.ts".to_string(),
            allowed_direct_imports: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioConfig {
    #[serde(default = "default_config_version")]
    pub version: String,
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
    #[serde(default = "default_physics_tables")]
    pub physics: PhysicsTables,
    /// Zone name → vocabulary terms routed to that zone.
    #[serde(default)]
    pub vocabulary: BTreeMap<String, Vec<VocabularyTerm>>,
    #[serde(default)]
    pub registry: RegistryConfig,
}

fn default_config_version() -> String {
    "1".to_string()
}

fn default_physics_tables() -> PhysicsTables {
    PhysicsTables {
        motion_timings: [
            ("instant", 0u64),
            ("snappy", 150),
            ("warm", 300),
            ("deliberate", 800),
            ("reassuring", 1200),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect(),
        motion_easings: [
            ("instant", "linear"),
            ("snappy", "ease-out"),
            ("warm", "ease-in-out"),
            ("deliberate", "ease-out"),
            ("reassuring", "ease-in-out"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
    }
}

fn zone(name: &str, material: &str, motion: &str) -> ZoneConfig {
    ZoneConfig {
        name: name.to_string(),
        path_patterns: Vec::new(),
        material: material.to_string(),
        motion_profile: motion.to_string(),
        constraints: BTreeMap::new(),
    }
}

fn term(id: &str, user_facing: &str, physics: &str) -> VocabularyTerm {
    VocabularyTerm {
        id: id.to_string(),
        user_facing: user_facing.to_string(),
        physics: physics.to_string(),
    }
}

/// Built-in configuration used when no `atelier.toml` is found.
pub fn default_config() -> StudioConfig {
    let mut vocabulary = BTreeMap::new();
    vocabulary.insert(
        "critical".to_string(),
        vec![
            term("claim", "Claim", "deliberate"),
            term("deposit", "Deposit", "deliberate"),
            term("withdraw", "Withdraw", "deliberate"),
            term("payment", "Payment", "deliberate"),
            term("checkout", "Checkout", "deliberate"),
        ],
    );
    vocabulary.insert(
        "standard".to_string(),
        vec![term("browse", "Browse", "warm"), term("search", "Search", "warm")],
    );
    vocabulary.insert(
        "marketing".to_string(),
        vec![term("explore", "Explore", "warm")],
    );

    StudioConfig {
        version: default_config_version(),
        zones: vec![
            zone("critical", "clay", "deliberate"),
            zone("machinery", "machinery", "snappy"),
            zone("marketing", "glass", "warm"),
        ],
        physics: default_physics_tables(),
        vocabulary,
        registry: RegistryConfig::default(),
    }
}

/// The implicit fallback zone applied when no declared zone matches.
pub fn default_zone() -> ZoneConfig {
    zone("default", "standard", "warm")
}

/// Built-in fallback path patterns for well-known zone names, used when a
/// zone declaration carries no explicit patterns.
pub fn fallback_patterns(zone_name: &str) -> &'static [&'static str] {
    match zone_name {
        "critical" => &[
            "**/checkout/**",
            "**/claim/**",
            "**/payment/**",
            "**/transfer/**",
            "**/withdraw/**",
            "**/deposit/**",
            "**/critical/**",
        ],
        "machinery" => &[
            "**/admin/**",
            "**/dashboard/**",
            "**/settings/**",
            "**/machinery/**",
        ],
        "marketing" => &[
            "**/marketing/**",
            "**/landing/**",
            "**/showcase/**",
            "**/glass/**",
        ],
        _ => &[],
    }
}

/// Walk up from `start_dir` looking for `atelier.toml`, stopping at
/// `root_boundary` (inclusive) when given.
pub fn find_config(start_dir: &Path, root_boundary: Option<&Path>) -> Option<PathBuf> {
    let mut current = start_dir;
    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if let Some(boundary) = root_boundary {
            if current == boundary {
                return None;
            }
        }
        current = current.parent()?;
    }
}

/// Load configuration for a project, falling back to the built-in defaults
/// when no config file is found or the file fails to parse.
pub fn load_config(project_root: &Path) -> StudioConfig {
    let Some(path) = find_config(project_root, None) else {
        return default_config();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return default_config(),
    };
    match toml::from_str::<StudioConfig>(&content) {
        Ok(mut config) => {
            // Partial configs inherit the built-in physics tables.
            if config.physics.motion_timings.is_empty() {
                config.physics = default_physics_tables();
            }
            if config.vocabulary.is_empty() {
                config.vocabulary = default_config().vocabulary;
            }
            config
        }
        Err(err) => {
            eprintln!("[atelier] failed to parse {}: {}", path.display(), err);
            default_config()
        }
    }
}
