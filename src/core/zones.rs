//! Zone resolution: mapping a file path to the zone that governs it.
//!
//! Zones are matched in declared order over path patterns. Config-provided
//! patterns take precedence over the built-in fallback patterns for the same
//! zone name. Every path resolves to exactly one zone: the implicit
//! `default` zone when nothing else matches.

use crate::core::config::{self, StudioConfig, ZoneConfig};
use std::collections::BTreeMap;

/// The zone a path resolved to, flattened for downstream validators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedZone {
    pub name: String,
    pub material: String,
    pub motion_profile: String,
    pub constraints: BTreeMap<String, String>,
}

impl From<&ZoneConfig> for ResolvedZone {
    fn from(zone: &ZoneConfig) -> Self {
        Self {
            name: zone.name.clone(),
            material: zone.material.clone(),
            motion_profile: zone.motion_profile.clone(),
            constraints: zone.constraints.clone(),
        }
    }
}

/// Resolve a file path to its zone. First declared zone with a matching
/// pattern wins; the built-in default zone otherwise.
pub fn resolve_zone(path: &str, config: &StudioConfig) -> ResolvedZone {
    let normalized = path.replace('\\', "/");

    for zone in &config.zones {
        if zone.name == "default" {
            continue;
        }
        let matched = if zone.path_patterns.is_empty() {
            config::fallback_patterns(&zone.name)
                .iter()
                .any(|pattern| glob_match(pattern, &normalized))
        } else {
            zone.path_patterns
                .iter()
                .any(|pattern| glob_match(pattern, &normalized))
        };
        if matched {
            return ResolvedZone::from(zone);
        }
    }

    // An explicitly declared `default` zone overrides the built-in one.
    config
        .zones
        .iter()
        .find(|z| z.name == "default")
        .map(ResolvedZone::from)
        .unwrap_or_else(|| ResolvedZone::from(&config::default_zone()))
}

pub fn is_in_zone(path: &str, zone_name: &str, config: &StudioConfig) -> bool {
    resolve_zone(path, config).name == zone_name
}

/// Segment-aware glob match. `*` matches within a single path segment,
/// `**` matches any number of segments (including zero).
pub fn glob_match(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match_segments(&pattern_segments, &path_segments)
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.first() {
        None => path.is_empty(),
        Some(&"**") => {
            // `**` absorbs zero or more segments.
            if match_segments(&pattern[1..], path) {
                return true;
            }
            if path.is_empty() {
                return false;
            }
            match_segments(pattern, &path[1..])
        }
        Some(seg_pattern) => match path.first() {
            None => false,
            Some(seg) => {
                match_segment(seg_pattern, seg) && match_segments(&pattern[1..], &path[1..])
            }
        },
    }
}

/// Match a single segment, where `*` matches any run of characters.
fn match_segment(pattern: &str, segment: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let s: Vec<char> = segment.chars().collect();
    match_chars(&p, &s)
}

fn match_chars(pattern: &[char], segment: &[char]) -> bool {
    match pattern.first() {
        None => segment.is_empty(),
        Some('*') => {
            if match_chars(&pattern[1..], segment) {
                return true;
            }
            if segment.is_empty() {
                return false;
            }
            match_chars(pattern, &segment[1..])
        }
        Some(c) => match segment.first() {
            Some(sc) if sc == c => match_chars(&pattern[1..], &segment[1..]),
            _ => false,
        },
    }
}
