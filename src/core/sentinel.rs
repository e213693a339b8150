//! Pre-write validation gate.
//!
//! Runs synchronously before an editing tool commits a write. Contagion
//! violations block the operation; this is the one place a failure is fatal to the
//! requested operation. Physics findings and nomination notices are
//! advisory: they ride along as warnings/info and never abort the process.

use crate::core::config::StudioConfig;
use crate::core::physics;
use crate::core::registry::{self, GateDecision, RegistryTier, TierGraph};
use crate::core::zones;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingCategory {
    Contagion,
    Physics,
    Nomination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub category: FindingCategory,
    pub severity: Severity,
    pub rule: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelResponse {
    pub allow: bool,
    pub findings: Vec<ValidationFinding>,
    pub duration_ms: u64,
}

/// The §6 pre-write hook: may this file gain this import edge?
pub fn validate_import(
    project_root: &Path,
    config: &StudioConfig,
    file_path: &str,
    proposed_import: &str,
) -> GateDecision {
    let graph = registry::build_tier_graph(project_root, config);
    registry::validate_import_edge(project_root, config, &graph, file_path, proposed_import)
}

/// Validate full proposed file content before a write is committed.
pub fn validate_write(
    project_root: &Path,
    config: &StudioConfig,
    file_path: &str,
    content: &str,
) -> SentinelResponse {
    let start = Instant::now();
    let graph = registry::build_tier_graph(project_root, config);
    let mut findings = Vec::new();

    findings.extend(check_contagion(project_root, config, &graph, file_path, content));
    findings.extend(check_timings(config, file_path, content));
    findings.extend(check_nominations(project_root, file_path, content, &graph));

    let allow = !findings.iter().any(|f| f.severity == Severity::Error);
    SentinelResponse {
        allow,
        findings,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

fn check_contagion(
    project_root: &Path,
    config: &StudioConfig,
    graph: &TierGraph,
    file_path: &str,
    content: &str,
) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    for import in registry::parse_imports(content) {
        let decision = registry::validate_import_edge(
            project_root,
            config,
            graph,
            file_path,
            &import.specifier,
        );
        if !decision.allowed {
            findings.push(ValidationFinding {
                category: FindingCategory::Contagion,
                severity: Severity::Error,
                rule: decision.rule.unwrap_or_else(|| "tier-contagion".to_string()),
                path: file_path.to_string(),
                line: Some(import.line),
                message: decision
                    .reason
                    .unwrap_or_else(|| "forbidden import direction".to_string()),
                suggestion: Some(
                    "promote the imported component to an allowed tier, or drop the import"
                        .to_string(),
                ),
            });
        }
    }
    findings
}

/// Static timing check: literal `<n>ms` durations in the content are
/// validated against the envelope of the file's zone motion profile.
fn check_timings(config: &StudioConfig, file_path: &str, content: &str) -> Vec<ValidationFinding> {
    let zone = zones::resolve_zone(file_path, config);
    let duration_re = Regex::new(r"(?:duration|transition)[^;\n]*?(\d+)\s*ms").unwrap();

    let mut findings = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        for cap in duration_re.captures_iter(line) {
            let Ok(timing) = cap[1].parse::<u64>() else {
                continue;
            };
            let check = physics::validate_timing(&zone.motion_profile, timing);
            for violation in check.violations {
                findings.push(ValidationFinding {
                    category: FindingCategory::Physics,
                    severity: Severity::Warning,
                    rule: violation.rule.to_string(),
                    path: file_path.to_string(),
                    line: Some(idx + 1),
                    message: format!("zone '{}': {}", zone.name, violation.message),
                    suggestion: None,
                });
            }
        }
    }
    findings
}

/// Informational only: surfacing Draft usage nudges promotion, never blocks.
fn check_nominations(
    project_root: &Path,
    file_path: &str,
    content: &str,
    graph: &TierGraph,
) -> Vec<ValidationFinding> {
    let draft_imports: Vec<String> = registry::parse_imports(content)
        .into_iter()
        .filter(|imp| {
            registry::tier_of_import(project_root, file_path, &imp.specifier, graph)
                == Some(RegistryTier::Draft)
        })
        .map(|imp| imp.specifier)
        .collect();

    if draft_imports.is_empty() {
        return Vec::new();
    }
    vec![ValidationFinding {
        category: FindingCategory::Nomination,
        severity: Severity::Info,
        rule: "draft-usage".to_string(),
        path: file_path.to_string(),
        line: None,
        message: format!(
            "uses {} draft import(s): {}",
            draft_imports.len(),
            draft_imports.join(", ")
        ),
        suggestion: Some("consider nominating stable draft components for promotion".to_string()),
    }]
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "sentinel",
        "version": "0.1.0",
        "description": "Pre-write validation gate (contagion blocks, physics advises)",
        "commands": [
            { "name": "validate", "parameters": ["file", "import"] },
            { "name": "scan", "description": "Whole-repository contagion scan" }
        ],
        "storage": []
    })
}
