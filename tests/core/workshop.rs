use atelier::core::config::default_config;
use atelier::core::store::Store;
use atelier::core::workshop::{
    self, REBUILD_LOCK_TTL_SECS, RebuildLock, StalenessReason, WorkshopIndex,
};
use std::fs;
use std::time::Instant;
use tempfile::tempdir;

fn fixture_project() -> tempfile::TempDir {
    let tmp = tempdir().unwrap();
    fs::write(
        tmp.path().join("package.json"),
        r#"{"dependencies": {"framer-motion": "^11.15.0", "react": "^19.0.0"}}"#,
    )
    .unwrap();
    let src = tmp.path().join("src/sanctuary");
    fs::create_dir_all(&src).unwrap();
    fs::write(
        src.join("ClaimButton.tsx"),
        "// @atelier-tier gold\n// @atelier-zone critical\nimport { motion } from 'framer-motion';\nexport const ClaimButton = () => null;\n",
    )
    .unwrap();
    tmp
}

#[test]
fn build_produces_all_sections() {
    let tmp = fixture_project();
    let config = default_config();

    let index = workshop::build(tmp.path(), &config).unwrap();

    assert!(!index.indexed_at.is_empty());
    assert_eq!(index.manifest_hash.len(), 64);
    assert_eq!(index.imports_hash.len(), 64);
    assert!(index.materials.contains_key("framer-motion"));
    assert!(index.components.contains_key("ClaimButton"));
    assert!(index.physics.contains_key("deliberate"));
    assert!(index.zones.contains_key("critical"));
}

#[test]
fn staleness_is_deterministic() {
    let tmp = fixture_project();
    let config = default_config();

    let index = workshop::build(tmp.path(), &config).unwrap();
    let check = workshop::check_staleness(tmp.path(), Some(&index));
    assert!(!check.stale);

    // Rebuilding over identical inputs yields identical hashes.
    let again = workshop::build(tmp.path(), &config).unwrap();
    assert_eq!(index.manifest_hash, again.manifest_hash);
    assert_eq!(index.imports_hash, again.imports_hash);
}

#[test]
fn single_character_manifest_change_triggers_rebuild() {
    let tmp = fixture_project();
    let config = default_config();
    let index = workshop::build(tmp.path(), &config).unwrap();

    let manifest = tmp.path().join("package.json");
    let content = fs::read_to_string(&manifest).unwrap();
    fs::write(&manifest, content.replace("19.0.0", "19.0.1")).unwrap();

    let check = workshop::check_staleness(tmp.path(), Some(&index));
    assert!(check.stale);
    assert_eq!(check.reason, Some(StalenessReason::ManifestChanged));
}

#[test]
fn import_statement_change_triggers_rebuild() {
    let tmp = fixture_project();
    let config = default_config();
    let index = workshop::build(tmp.path(), &config).unwrap();

    fs::write(
        tmp.path().join("src/sanctuary/New.tsx"),
        "import { useSpring } from 'react-spring';\n",
    )
    .unwrap();

    let check = workshop::check_staleness(tmp.path(), Some(&index));
    assert!(check.stale);
    assert_eq!(check.reason, Some(StalenessReason::ImportsChanged));
}

#[test]
fn missing_and_corrupt_indexes_force_rebuild_not_error() {
    let tmp = fixture_project();
    let store = Store::open(tmp.path());

    let check = workshop::check_store_staleness(&store, tmp.path());
    assert!(check.stale);
    assert_eq!(check.reason, Some(StalenessReason::Missing));

    store.ensure().unwrap();
    fs::write(store.path("workshop.json"), "{definitely not json").unwrap();
    let check = workshop::check_store_staleness(&store, tmp.path());
    assert!(check.stale);
    assert_eq!(check.reason, Some(StalenessReason::Corrupt));

    // ensure_fresh recovers by rebuilding, never by raising.
    let config = default_config();
    let (index, ensure) = workshop::ensure_fresh(&store, tmp.path(), &config).unwrap();
    assert!(ensure.rebuilt);
    assert!(index.materials.contains_key("react"));
}

#[test]
fn queries_are_idempotent_and_fast() {
    let tmp = fixture_project();
    let store = Store::open(tmp.path());
    let config = default_config();

    let index = workshop::build(tmp.path(), &config).unwrap();
    workshop::persist_index(&store, &index).unwrap();

    // Cold load from persisted storage plus 100 queries, averaged.
    let start = Instant::now();
    let loaded: WorkshopIndex = workshop::load_index(&store).unwrap();
    for _ in 0..100 {
        let material = loaded.query_material("framer-motion");
        assert!(material.is_some());
        assert_eq!(material.unwrap().version, "^11.15.0");
    }
    let avg_ms = start.elapsed().as_secs_f64() * 1000.0 / 100.0;
    assert!(avg_ms < 5.0, "average query took {:.3}ms", avg_ms);

    // Reads never mutate cache state.
    let reloaded: WorkshopIndex = workshop::load_index(&store).unwrap();
    assert_eq!(reloaded.indexed_at, index.indexed_at);
    assert_eq!(reloaded.manifest_hash, index.manifest_hash);
}

#[test]
fn rebuild_lock_is_exclusive_until_expiry() {
    let tmp = fixture_project();
    let store = Store::open(tmp.path());

    let owner = workshop::acquire_rebuild_lock(&store).unwrap();
    assert!(owner.is_some());
    assert!(workshop::acquire_rebuild_lock(&store).unwrap().is_none());

    workshop::release_rebuild_lock(&store, &owner.unwrap());
    assert!(workshop::acquire_rebuild_lock(&store).unwrap().is_some());
}

#[test]
fn expired_lock_is_reclaimed() {
    let tmp = fixture_project();
    let store = Store::open(tmp.path());
    store.ensure().unwrap();

    // A crashed builder left a lease behind, long expired.
    let stale_lock = RebuildLock {
        owner: "dead-builder".to_string(),
        acquired_at: 0,
        expires_at: REBUILD_LOCK_TTL_SECS,
    };
    fs::write(
        store.path("workshop.lock"),
        serde_json::to_string(&stale_lock).unwrap(),
    )
    .unwrap();

    assert!(workshop::acquire_rebuild_lock(&store).unwrap().is_some());
}

#[test]
fn contended_lock_serves_stale_index() {
    let tmp = fixture_project();
    let store = Store::open(tmp.path());
    let config = default_config();

    let index = workshop::build(tmp.path(), &config).unwrap();
    workshop::persist_index(&store, &index).unwrap();

    // Invalidate the index, then let another caller hold the lease.
    fs::write(
        tmp.path().join("package.json"),
        r#"{"dependencies": {"framer-motion": "^12.0.0"}}"#,
    )
    .unwrap();
    let holder = workshop::acquire_rebuild_lock(&store).unwrap().unwrap();

    let (served, ensure) = workshop::ensure_fresh(&store, tmp.path(), &config).unwrap();
    assert!(ensure.lock_contended);
    assert!(!ensure.rebuilt);
    // Staleness is preferred over availability loss: the old snapshot wins.
    assert_eq!(served.manifest_hash, index.manifest_hash);

    workshop::release_rebuild_lock(&store, &holder);
}
