use atelier::core::store::Store;
use atelier::plugins::era;
use atelier::plugins::survival::{self, PatternEntry, PatternStatus, SurvivalLedger};
use tempfile::tempdir;

fn seed_ledger(store: &Store, era: &str, patterns: &[(&str, u32, PatternStatus)]) {
    let mut ledger = SurvivalLedger::new(era);
    for (name, occurrences, status) in patterns {
        ledger.patterns.insert(
            name.to_string(),
            PatternEntry {
                status: *status,
                occurrences: *occurrences,
                first_seen_era: era.to_string(),
                last_seen_at: "0Z".to_string(),
                files: Vec::new(),
            },
        );
    }
    survival::save_ledger(store, &ledger).unwrap();
}

#[test]
fn new_era_archives_and_resets() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path());
    seed_ledger(
        &store,
        "v1",
        &[("animation:spring", 7, PatternStatus::Canonical)],
    );

    let transition = era::create_new_era(&store, "Tactile", Some("Touch-focused")).unwrap();
    assert_eq!(transition.previous_era, "v1");
    assert_eq!(transition.new_era, "Tactile");

    // The archive froze the old ledger.
    let archive = era::load_era_archive(&store, "v1").unwrap();
    assert_eq!(archive.patterns["animation:spring"].occurrences, 7);
    assert!(!archive.ended.is_empty());

    // The active ledger starts fresh.
    let ledger = survival::load_ledger(&store);
    assert_eq!(ledger.era, "Tactile");
    assert_eq!(ledger.era_description.as_deref(), Some("Touch-focused"));
    assert!(ledger.patterns.is_empty());
}

#[test]
fn rejected_patterns_carry_across_eras() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path());
    seed_ledger(
        &store,
        "v1",
        &[
            ("animation:spring", 5, PatternStatus::PendingCanonical),
            ("effect:confetti", 6, PatternStatus::Rejected),
        ],
    );

    let transition = era::create_new_era(&store, "Flat", None).unwrap();
    assert_eq!(transition.carried_rejections, 1);

    let ledger = survival::load_ledger(&store);
    assert_eq!(ledger.patterns.len(), 1);
    let carried = &ledger.patterns["effect:confetti"];
    assert_eq!(carried.status, PatternStatus::Rejected);
    assert_eq!(carried.occurrences, 0);
    assert_eq!(carried.first_seen_era, "v1");
}

#[test]
fn archive_without_transition_keeps_active_ledger() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path());
    seed_ledger(&store, "v1", &[("layout:stack", 3, PatternStatus::Surviving)]);

    era::archive_current_era(&store).unwrap();

    let ledger = survival::load_ledger(&store);
    assert_eq!(ledger.era, "v1");
    assert_eq!(ledger.patterns.len(), 1);
    assert!(era::load_era_archive(&store, "v1").is_some());
}

#[test]
fn archived_snapshots_are_immutable_under_new_activity() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path());
    seed_ledger(&store, "v1", &[("layout:stack", 3, PatternStatus::Surviving)]);
    era::create_new_era(&store, "v2", None).unwrap();

    // New-era activity mutates only the active ledger.
    let mut ledger = survival::load_ledger(&store);
    ledger.patterns.insert(
        "layout:grid".to_string(),
        PatternEntry {
            status: PatternStatus::Experimental,
            occurrences: 1,
            first_seen_era: "v2".to_string(),
            last_seen_at: "0Z".to_string(),
            files: Vec::new(),
        },
    );
    survival::save_ledger(&store, &ledger).unwrap();

    let archive = era::load_era_archive(&store, "v1").unwrap();
    assert_eq!(archive.patterns.len(), 1);
    assert!(!archive.patterns.contains_key("layout:grid"));
}

#[test]
fn era_history_is_chronological() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path());

    seed_ledger(&store, "v1", &[]);
    era::create_new_era(&store, "v2", None).unwrap();
    era::create_new_era(&store, "v3", None).unwrap();

    let history = era::get_era_history(&store);
    let names: Vec<&str> = history.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["v1", "v2"]);
}

#[test]
fn transition_rules_reject_bad_names() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path());
    seed_ledger(&store, "v1", &[]);

    // Current era name is taken.
    assert!(era::create_new_era(&store, "v1", None).is_err());
    // Invalid shapes are refused.
    assert!(era::create_new_era(&store, "-bad", None).is_err());
    assert!(era::create_new_era(&store, "", None).is_err());

    // Archived names cannot be reused.
    era::create_new_era(&store, "v2", None).unwrap();
    assert!(era::create_new_era(&store, "v1", None).is_err());
}
