//! Context resolution for generation orchestrators.
//!
//! Maps a free-text prompt to the governance context that applies to it:
//! which configured vocabulary terms it mentions, which zone those terms
//! route to, and which physics profile that zone carries. Critical-zone
//! terms always win the routing when terms from several zones appear.

use crate::core::config::StudioConfig;
use crate::core::error::AtelierError;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedContext {
    pub vocabulary_terms: Vec<String>,
    pub zone: String,
    pub physics: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

/// Configured vocabulary term ids mentioned in the prompt, matched
/// case-insensitively against both the id and the user-facing label.
pub fn extract_vocabulary_terms(prompt: &str, config: &StudioConfig) -> Vec<String> {
    let haystack = prompt.to_lowercase();
    let mut terms = Vec::new();
    for zone_terms in config.vocabulary.values() {
        for term in zone_terms {
            let id = term.id.to_lowercase();
            let label = term.user_facing.to_lowercase();
            if (haystack.contains(&id) || haystack.contains(&label)) && !terms.contains(&term.id) {
                terms.push(term.id.clone());
            }
        }
    }
    terms.sort();
    terms
}

/// Route vocabulary terms to a zone. Critical membership takes precedence;
/// otherwise the first zone (in config order) owning any term wins; unknown
/// terms land in the default zone.
pub fn resolve_zone_from_vocabulary(terms: &[String], config: &StudioConfig) -> String {
    let owns = |zone: &str| -> bool {
        config
            .vocabulary
            .get(zone)
            .map(|zone_terms| {
                zone_terms
                    .iter()
                    .any(|t| terms.iter().any(|term| *term == t.id))
            })
            .unwrap_or(false)
    };

    if owns("critical") {
        return "critical".to_string();
    }
    for zone in config.vocabulary.keys() {
        if zone != "critical" && owns(zone) {
            return zone.clone();
        }
    }
    "default".to_string()
}

/// Physics profile for a zone: the declared motion profile, or the
/// default zone's profile for unknown zones.
pub fn resolve_physics_from_zone(zone: &str, config: &StudioConfig) -> String {
    config
        .zones
        .iter()
        .find(|z| z.name == zone)
        .map(|z| z.motion_profile.clone())
        .unwrap_or_else(|| "warm".to_string())
}

/// The full context chain: prompt → terms → zone → physics.
pub fn resolve_context(
    prompt: &str,
    component: Option<&str>,
    config: &StudioConfig,
) -> ResolvedContext {
    let vocabulary_terms = extract_vocabulary_terms(prompt, config);
    let zone = resolve_zone_from_vocabulary(&vocabulary_terms, config);
    let physics = resolve_physics_from_zone(&zone, config);
    ResolvedContext {
        vocabulary_terms,
        zone,
        physics,
        component: component.map(|c| c.to_string()),
    }
}

#[derive(Parser, Debug)]
#[clap(name = "context", about = "Resolve governance context for a prompt")]
pub struct ContextCli {
    #[clap(subcommand)]
    pub command: ContextCommand,
}

#[derive(Subcommand, Debug)]
pub enum ContextCommand {
    /// Resolve vocabulary, zone, and physics for a prompt.
    Resolve {
        #[clap(long)]
        prompt: String,
        #[clap(long)]
        component: Option<String>,
    },
}

pub fn run_context_cli(config: &StudioConfig, cli: ContextCli) -> Result<(), AtelierError> {
    match cli.command {
        ContextCommand::Resolve { prompt, component } => {
            let context = resolve_context(&prompt, component.as_deref(), config);
            println!("{}", serde_json::to_string_pretty(&context)?);
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "context",
        "version": "0.1.0",
        "description": "Prompt → vocabulary → zone → physics resolution",
        "commands": [
            { "name": "resolve", "parameters": ["prompt", "component"] }
        ],
        "storage": []
    })
}
