use atelier::core::store::Store;
use atelier::plugins::seed::{self, AVAILABLE_SEEDS};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_real_component(root: &Path, name: &str) {
    let dir = root.join("src/sanctuary");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(format!("{}.tsx", name)),
        format!("// @atelier-tier gold\nexport const {} = () => null;\n", name),
    )
    .unwrap();
}

#[test]
fn catalog_lists_four_seeds() {
    assert_eq!(AVAILABLE_SEEDS.len(), 4);
    for id in AVAILABLE_SEEDS {
        assert!(seed::load_catalog_seed(id).is_some());
    }
}

#[test]
fn select_and_query_virtual_component() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path());

    seed::select_seed(&store, "linear-like").unwrap();

    let result = seed::query_virtual_component(&store, tmp.path(), "Button").unwrap();
    assert!(result.found);
    assert!(!result.evicted);
    let component = result.component.unwrap();
    assert_eq!(component.tier, "gold");
    assert_eq!(component.zone, "critical");
}

#[test]
fn unknown_component_is_not_found_not_evicted() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path());
    seed::select_seed(&store, "linear-like").unwrap();

    let result = seed::query_virtual_component(&store, tmp.path(), "Nonexistent").unwrap();
    assert!(!result.found);
    assert!(!result.evicted);
}

#[test]
fn real_component_evicts_virtual_namesake() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path());
    seed::select_seed(&store, "linear-like").unwrap();

    write_real_component(tmp.path(), "Button");

    let result = seed::query_virtual_component(&store, tmp.path(), "Button").unwrap();
    assert!(!result.found);
    assert!(result.evicted);

    // Other virtual components are untouched.
    let card = seed::query_virtual_component(&store, tmp.path(), "Card").unwrap();
    assert!(card.found);
}

#[test]
fn eviction_survives_deleting_the_real_component() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path());
    seed::select_seed(&store, "linear-like").unwrap();

    write_real_component(tmp.path(), "Button");
    assert!(seed::check_faded_status(&store, tmp.path(), "Button").unwrap());

    // Real component disappears; the stand-in stays evicted. No oscillation
    // between virtual and real guidance.
    fs::remove_file(tmp.path().join("src/sanctuary/Button.tsx")).unwrap();
    assert!(seed::is_seed_evicted(&store, "Button"));
    let result = seed::query_virtual_component(&store, tmp.path(), "Button").unwrap();
    assert!(!result.found);
    assert!(result.evicted);
}

#[test]
fn reset_refuses_while_real_components_exist() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path());
    seed::select_seed(&store, "linear-like").unwrap();
    write_real_component(tmp.path(), "Button");
    seed::observe_real_components(&store, tmp.path()).unwrap();

    assert!(seed::reset_seed(&store, tmp.path(), false).is_err());

    // Force overrides the refusal.
    let restored = seed::reset_seed(&store, tmp.path(), true).unwrap();
    assert!(!restored.virtual_components["Button"].evicted);
}

#[test]
fn reset_is_the_only_path_out_of_eviction() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path());
    seed::select_seed(&store, "linear-like").unwrap();

    write_real_component(tmp.path(), "Button");
    seed::observe_real_components(&store, tmp.path()).unwrap();
    fs::remove_file(tmp.path().join("src/sanctuary/Button.tsx")).unwrap();

    // Repeated queries never clear the flag on their own.
    for _ in 0..3 {
        let result = seed::query_virtual_component(&store, tmp.path(), "Button").unwrap();
        assert!(result.evicted);
    }

    seed::reset_seed(&store, tmp.path(), false).unwrap();
    let result = seed::query_virtual_component(&store, tmp.path(), "Button").unwrap();
    assert!(result.found);
    assert!(!result.evicted);
}

#[test]
fn eviction_timestamp_is_recorded() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path());
    seed::select_seed(&store, "linear-like").unwrap();
    write_real_component(tmp.path(), "Card");
    seed::observe_real_components(&store, tmp.path()).unwrap();

    let active = seed::load_selected_seed(&store).unwrap();
    let card = &active.virtual_components["Card"];
    assert!(card.evicted);
    assert!(card.evicted_at.is_some());
}
