use atelier::core::config::{CONFIG_FILE_NAME, default_config, load_config};
use atelier::core::physics::{
    self, EffectClass, PhysicsRule, SyncStrategy, validate_material_constraints,
    validate_physics_effect, validate_timing, validate_zone_constraints,
};
use atelier::core::zones::resolve_zone;
use std::fs;
use tempfile::tempdir;

#[test]
fn checkout_path_resolves_to_critical_and_rejects_fast_timing() {
    let config = default_config();

    let zone = resolve_zone("app/checkout/Pay.tsx", &config);
    assert_eq!(zone.name, "critical");
    assert_eq!(zone.motion_profile, "deliberate");

    // 200ms in a 500–1000ms envelope: too fast, citing the violated bound.
    let check = validate_timing(&zone.motion_profile, 200);
    assert!(!check.valid);
    assert_eq!(check.violations[0].rule, PhysicsRule::TimingTooFast);
    assert!(check.violations[0].message.contains("min 500ms"));
}

#[test]
fn zone_resolution_is_deterministic() {
    let config = default_config();
    for _ in 0..10 {
        assert_eq!(resolve_zone("app/checkout/Pay.tsx", &config).name, "critical");
        assert_eq!(resolve_zone("app/admin/Users.tsx", &config).name, "machinery");
        assert_eq!(resolve_zone("app/landing/Hero.tsx", &config).name, "marketing");
        assert_eq!(resolve_zone("lib/util.ts", &config).name, "default");
    }
}

#[test]
fn config_file_zone_patterns_override_builtins() {
    let tmp = tempdir().unwrap();
    fs::write(
        tmp.path().join(CONFIG_FILE_NAME),
        r#"
version = "1"

[[zones]]
name = "critical"
path_patterns = ["**/vault/**"]
material = "clay"
motion_profile = "reassuring"
"#,
    )
    .unwrap();
    let config = load_config(tmp.path());

    let zone = resolve_zone("app/vault/Transfer.tsx", &config);
    assert_eq!(zone.name, "critical");
    assert_eq!(zone.motion_profile, "reassuring");

    // The built-in checkout pattern no longer claims critical.
    assert_eq!(resolve_zone("app/checkout/Pay.tsx", &config).name, "default");
}

#[test]
fn zone_motion_mismatch_is_a_structured_result() {
    let config = default_config();
    let zone = resolve_zone("app/checkout/Pay.tsx", &config);

    let check = validate_zone_constraints(&zone, "snappy");
    assert!(!check.valid);
    assert_eq!(check.violations[0].rule, PhysicsRule::ZoneMotion);
    assert!(check.violations[0].message.contains("critical"));
}

#[test]
fn tactile_material_forbids_instant_transitions() {
    let check = validate_material_constraints("clay", 0);
    assert!(!check.valid);
    assert_eq!(check.violations[0].rule, PhysicsRule::MaterialTiming);

    assert!(validate_material_constraints("clay", 300).valid);
    assert!(validate_material_constraints("glass", 0).valid);
}

#[test]
fn financial_effects_require_pessimistic_sync_and_confirmation() {
    let check = validate_physics_effect(EffectClass::Financial, SyncStrategy::Optimistic, false);
    assert!(!check.valid);
    let rules: Vec<PhysicsRule> = check.violations.iter().map(|v| v.rule).collect();
    assert!(rules.contains(&PhysicsRule::SyncStrategy));
    assert!(rules.contains(&PhysicsRule::ConfirmationRequired));

    assert!(validate_physics_effect(EffectClass::Financial, SyncStrategy::Pessimistic, true).valid);
}

#[test]
fn confirming_container_waives_confirmation_not_sync() {
    let check = validate_physics_effect(EffectClass::Destructive, SyncStrategy::Hybrid, true);
    assert_eq!(check.violations.len(), 1);
    assert_eq!(check.violations[0].rule, PhysicsRule::SyncStrategy);
}

#[test]
fn low_stakes_effects_are_unconstrained() {
    for effect in [
        EffectClass::Standard,
        EffectClass::Local,
        EffectClass::Navigation,
        EffectClass::Query,
    ] {
        assert!(validate_physics_effect(effect, SyncStrategy::Optimistic, false).valid);
    }
}

#[test]
fn timing_envelopes_cover_all_builtin_motions() {
    for motion in ["instant", "snappy", "warm", "deliberate", "reassuring"] {
        assert!(physics::motion_envelope(motion).is_some());
    }
    assert!(physics::motion_envelope("interpretive-dance").is_none());
}
