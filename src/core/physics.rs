//! Physics validation: timing envelopes, material constraints, and
//! effect-class sync/confirmation policy.
//!
//! Validation failures here are structured results, never errors: callers
//! render them inline and decide what to do. Only the contagion gate is
//! allowed to refuse an operation outright.

use crate::core::zones::ResolvedZone;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timing envelope for a motion category, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionEnvelope {
    pub min: u64,
    pub max: u64,
}

/// Built-in timing envelopes per motion category.
pub fn motion_envelope(motion: &str) -> Option<MotionEnvelope> {
    let (min, max) = match motion {
        "instant" => (0, 50),
        "snappy" => (100, 200),
        "warm" => (200, 400),
        "deliberate" => (500, 1000),
        "reassuring" => (800, 1500),
        _ => return None,
    };
    Some(MotionEnvelope { min, max })
}

/// Materials with physical weight: they may never transition instantaneously.
const TACTILE_MATERIALS: [&str; 2] = ["clay", "fabric"];

pub fn is_tactile_material(material: &str) -> bool {
    TACTILE_MATERIALS.contains(&material)
}

/// Categorization of an action's consequence, driving sync strategy and
/// confirmation requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EffectClass {
    Financial,
    Destructive,
    SoftDelete,
    Standard,
    Local,
    Navigation,
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SyncStrategy {
    /// Client owns the clock: instant update, silent rollback.
    Optimistic,
    /// Server owns the clock: visible pending state, visible rollback.
    Pessimistic,
    /// Optimistic with a sync indicator.
    Hybrid,
}

/// How an effect class must be guarded before committing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfirmationPolicy {
    /// Explicit confirm step before the effect runs.
    Explicit,
    /// Effect runs immediately but offers a recovery window.
    Undo,
    None,
}

/// Default sync/confirmation policy per effect class.
pub fn default_policy(effect: EffectClass) -> (SyncStrategy, ConfirmationPolicy) {
    match effect {
        EffectClass::Financial | EffectClass::Destructive => {
            (SyncStrategy::Pessimistic, ConfirmationPolicy::Explicit)
        }
        EffectClass::SoftDelete => (SyncStrategy::Optimistic, ConfirmationPolicy::Undo),
        EffectClass::Standard
        | EffectClass::Local
        | EffectClass::Navigation
        | EffectClass::Query => (SyncStrategy::Optimistic, ConfirmationPolicy::None),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhysicsRule {
    ZoneMotion,
    MaterialTiming,
    TimingTooFast,
    TimingTooSlow,
    SyncStrategy,
    ConfirmationRequired,
}

impl fmt::Display for PhysicsRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ZoneMotion => "zone-motion",
            Self::MaterialTiming => "material-timing",
            Self::TimingTooFast => "timing-too-fast",
            Self::TimingTooSlow => "timing-too-slow",
            Self::SyncStrategy => "sync-strategy",
            Self::ConfirmationRequired => "confirmation-required",
        };
        write!(f, "{}", s)
    }
}

/// A single physics violation: rule id, offending subject, readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsViolation {
    pub rule: PhysicsRule,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsCheck {
    pub valid: bool,
    pub violations: Vec<PhysicsViolation>,
}

impl PhysicsCheck {
    fn ok() -> Self {
        Self {
            valid: true,
            violations: Vec::new(),
        }
    }

    fn from_violations(violations: Vec<PhysicsViolation>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
        }
    }
}

/// Check a proposed motion category against a zone's declared profile.
///
/// A zone accepts its own motion profile plus anything listed in its
/// `allowed_motions` constraint (comma-separated).
pub fn validate_zone_constraints(zone: &ResolvedZone, motion: &str) -> PhysicsCheck {
    if motion == zone.motion_profile {
        return PhysicsCheck::ok();
    }
    if let Some(allowed) = zone.constraints.get("allowed_motions") {
        if allowed.split(',').map(str::trim).any(|m| m == motion) {
            return PhysicsCheck::ok();
        }
    }
    PhysicsCheck::from_violations(vec![PhysicsViolation {
        rule: PhysicsRule::ZoneMotion,
        subject: zone.name.clone(),
        message: format!(
            "zone '{}' requires motion '{}', got '{}'",
            zone.name, zone.motion_profile, motion
        ),
    }])
}

/// Tactile materials carry weight; a zero-duration transition breaks the
/// illusion and is rejected.
pub fn validate_material_constraints(material: &str, timing_ms: u64) -> PhysicsCheck {
    if is_tactile_material(material) && timing_ms == 0 {
        return PhysicsCheck::from_violations(vec![PhysicsViolation {
            rule: PhysicsRule::MaterialTiming,
            subject: material.to_string(),
            message: format!(
                "material '{}' forbids instantaneous transitions (0ms)",
                material
            ),
        }]);
    }
    PhysicsCheck::ok()
}

/// Check a proposed duration against the motion category's envelope. The
/// violated bound is carried in the message for inline tooling display.
pub fn validate_timing(motion: &str, timing_ms: u64) -> PhysicsCheck {
    let Some(envelope) = motion_envelope(motion) else {
        return PhysicsCheck::ok();
    };
    if timing_ms < envelope.min {
        return PhysicsCheck::from_violations(vec![PhysicsViolation {
            rule: PhysicsRule::TimingTooFast,
            subject: motion.to_string(),
            message: format!(
                "{}ms is too fast for motion '{}' (min {}ms)",
                timing_ms, motion, envelope.min
            ),
        }]);
    }
    if timing_ms > envelope.max {
        return PhysicsCheck::from_violations(vec![PhysicsViolation {
            rule: PhysicsRule::TimingTooSlow,
            subject: motion.to_string(),
            message: format!(
                "{}ms is too slow for motion '{}' (max {}ms)",
                timing_ms, motion, envelope.max
            ),
        }]);
    }
    PhysicsCheck::ok()
}

/// Validate a proposed sync/confirmation choice for an effect class.
///
/// Financial and Destructive effects must be pessimistic and confirmed. The
/// `in_confirming_container` escape hatch covers call sites already inside a
/// confirming surface (e.g. a dialog). That detection is a heuristic: a
/// containing dialog is assumed to confirm the action, which is not
/// guaranteed. It relaxes the confirmation rule, never the sync rule.
pub fn validate_physics_effect(
    effect: EffectClass,
    sync: SyncStrategy,
    in_confirming_container: bool,
) -> PhysicsCheck {
    let (required_sync, confirmation) = default_policy(effect);
    let mut violations = Vec::new();

    if required_sync == SyncStrategy::Pessimistic && sync != SyncStrategy::Pessimistic {
        violations.push(PhysicsViolation {
            rule: PhysicsRule::SyncStrategy,
            subject: format!("{:?}", effect),
            message: format!(
                "{:?} effects must use pessimistic sync, got {:?}",
                effect, sync
            ),
        });
    }

    if confirmation == ConfirmationPolicy::Explicit && !in_confirming_container {
        violations.push(PhysicsViolation {
            rule: PhysicsRule::ConfirmationRequired,
            subject: format!("{:?}", effect),
            message: format!(
                "{:?} effects require a confirmation mechanism (none detected at call site)",
                effect
            ),
        });
    }

    PhysicsCheck::from_violations(violations)
}
