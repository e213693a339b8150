use atelier::core::store::Store;
use atelier::plugins::curation::{self, CurateCli, CurateCommand, run_curate_cli};
use atelier::plugins::survival::{self, PatternEntry, PatternStatus, SurvivalLedger};
use tempfile::tempdir;

fn seed_pending(store: &Store, pattern: &str) {
    let mut ledger = SurvivalLedger::new("v1");
    ledger.patterns.insert(
        pattern.to_string(),
        PatternEntry {
            status: PatternStatus::PendingCanonical,
            occurrences: 6,
            first_seen_era: "v1".to_string(),
            last_seen_at: "0Z".to_string(),
            files: vec!["src/Button.tsx".to_string()],
        },
    );
    survival::save_ledger(store, &ledger).unwrap();

    let mut curation_ledger = curation::load_ledger(store);
    curation::enqueue_pending(&mut curation_ledger, pattern, 6);
    curation::save_ledger(store, &curation_ledger).unwrap();
}

#[test]
fn approve_is_the_only_transition_into_canonical() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path());
    seed_pending(&store, "animation:spring");

    run_curate_cli(
        &store,
        CurateCli {
            command: CurateCommand::Approve {
                pattern: "animation:spring".to_string(),
                actor: "taste-key".to_string(),
                reason: Some("earned it".to_string()),
            },
        },
    )
    .unwrap();

    let curation_ledger = curation::load_ledger(&store);
    assert!(curation::is_approved(&curation_ledger, "animation:spring"));
    assert!(curation_ledger.pending.is_empty());

    let survival_ledger = survival::load_ledger(&store);
    assert_eq!(
        survival_ledger.patterns["animation:spring"].status,
        PatternStatus::Canonical
    );
}

#[test]
fn approve_unknown_pattern_fails() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path());

    let result = run_curate_cli(
        &store,
        CurateCli {
            command: CurateCommand::Approve {
                pattern: "never-seen".to_string(),
                actor: "taste-key".to_string(),
                reason: None,
            },
        },
    );
    assert!(result.is_err());
}

#[test]
fn reject_records_rationale_and_marks_ledger() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path());
    seed_pending(&store, "effect:confetti");

    run_curate_cli(
        &store,
        CurateCli {
            command: CurateCommand::Reject {
                pattern: "effect:confetti".to_string(),
                actor: "taste-key".to_string(),
                reason: Some("not aligned".to_string()),
            },
        },
    )
    .unwrap();

    let curation_ledger = curation::load_ledger(&store);
    assert!(curation::is_rejected(&curation_ledger, "effect:confetti"));
    assert_eq!(
        curation_ledger.rejected[0].rationale.as_deref(),
        Some("not aligned")
    );

    let survival_ledger = survival::load_ledger(&store);
    assert_eq!(
        survival_ledger.patterns["effect:confetti"].status,
        PatternStatus::Rejected
    );
}

#[test]
fn reset_reopens_the_pipeline() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path());
    seed_pending(&store, "effect:confetti");

    run_curate_cli(
        &store,
        CurateCli {
            command: CurateCommand::Reject {
                pattern: "effect:confetti".to_string(),
                actor: "taste-key".to_string(),
                reason: None,
            },
        },
    )
    .unwrap();

    run_curate_cli(
        &store,
        CurateCli {
            command: CurateCommand::Reset {
                pattern: "effect:confetti".to_string(),
            },
        },
    )
    .unwrap();

    let curation_ledger = curation::load_ledger(&store);
    assert!(!curation::is_rejected(&curation_ledger, "effect:confetti"));

    let survival_ledger = survival::load_ledger(&store);
    assert_eq!(
        survival_ledger.patterns["effect:confetti"].status,
        PatternStatus::Experimental
    );
}
