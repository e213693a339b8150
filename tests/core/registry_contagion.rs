use atelier::core::config::{StudioConfig, default_config};
use atelier::core::registry::{self, RegistryTier};
use atelier::core::sentinel;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A project where Gold re-exports a component that is Silver by
/// membership, and that component imports Draft two hops from the Gold
/// entry point.
fn transitive_fixture() -> (tempfile::TempDir, StudioConfig) {
    let tmp = tempdir().unwrap();
    let root = tmp.path();

    write(
        root,
        "src/gold/index.ts",
        "export { Fancy } from '../components/Fancy';\n",
    );
    write(
        root,
        "src/silver/index.ts",
        "export { Fancy } from '../components/Fancy';\n",
    );
    write(root, "src/draft/index.ts", "export * from './Sketch';\n");
    write(root, "src/draft/Sketch.tsx", "export const Sketch = 1;\n");
    write(
        root,
        "src/components/Fancy.tsx",
        "import { Sketch } from '../draft/Sketch';\nexport const Fancy = () => Sketch;\n",
    );

    (tmp, default_config())
}

#[test]
fn gold_reachability_includes_reexported_components() {
    let (tmp, config) = transitive_fixture();
    let graph = registry::build_tier_graph(tmp.path(), &config);

    assert!(graph.gold.contains("src/gold/index.ts"));
    assert!(graph.gold.contains("src/components/Fancy.tsx"));
    // The draft file is reachable from gold — that is exactly the problem
    // the scan must report.
    assert!(graph.gold.contains("src/draft/Sketch.tsx"));
}

#[test]
fn transitive_draft_contagion_is_flagged() {
    let (tmp, config) = transitive_fixture();
    let findings = registry::scan_repository(tmp.path(), &config);

    let hit = findings
        .iter()
        .find(|f| f.file == "src/components/Fancy.tsx")
        .expect("the re-exported component's draft import must be flagged");
    assert_eq!(hit.rule, "tier-contagion");
    assert!(hit.message.contains("draft"));
    assert_eq!(hit.line, Some(1));
}

#[test]
fn clean_tiers_scan_without_findings() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    write(
        root,
        "src/gold/index.ts",
        "export { Button } from './Button';\n",
    );
    write(root, "src/gold/Button.tsx", "export const Button = 1;\n");
    write(
        root,
        "src/silver/index.ts",
        "export { Panel } from './Panel';\n",
    );
    write(
        root,
        "src/silver/Panel.tsx",
        "import { Button } from '../gold/Button';\nexport const Panel = () => Button;\n",
    );
    write(root, "src/draft/index.ts", "export * from './Wild';\n");
    write(
        root,
        "src/draft/Wild.tsx",
        "import { Panel } from '../silver/Panel';\nexport const Wild = () => Panel;\n",
    );

    let findings = registry::scan_repository(root, &default_config());
    assert!(findings.is_empty(), "unexpected findings: {:?}", findings);
}

#[test]
fn silver_may_not_import_draft() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    write(
        root,
        "src/silver/index.ts",
        "export { Panel } from './Panel';\n",
    );
    write(
        root,
        "src/silver/Panel.tsx",
        "import { Wild } from '../draft/Wild';\nexport const Panel = () => Wild;\n",
    );
    write(root, "src/draft/Wild.tsx", "export const Wild = 1;\n");

    let findings = registry::scan_repository(root, &default_config());
    assert!(findings.iter().any(|f| f.file == "src/silver/Panel.tsx"));
}

#[test]
fn pre_write_gate_blocks_draft_imports_into_gold() {
    let tmp = tempdir().unwrap();
    let config = default_config();

    let decision =
        sentinel::validate_import(tmp.path(), &config, "src/gold/Button.tsx", "@/draft");
    assert!(!decision.allowed);
    assert_eq!(decision.rule.as_deref(), Some("tier-contagion"));
    assert!(decision.reason.unwrap().contains("gold"));
}

#[test]
fn pre_write_gate_blocks_silver_into_gold_but_not_reverse() {
    let tmp = tempdir().unwrap();
    let config = default_config();

    let blocked =
        sentinel::validate_import(tmp.path(), &config, "src/gold/Button.tsx", "@/silver");
    assert!(!blocked.allowed);

    let allowed =
        sentinel::validate_import(tmp.path(), &config, "src/silver/Panel.tsx", "@/gold");
    assert!(allowed.allowed);

    let draft_any =
        sentinel::validate_import(tmp.path(), &config, "src/draft/Wild.tsx", "@/silver");
    assert!(draft_any.allowed);
}

#[test]
fn gold_direct_component_imports_require_allow_list() {
    let tmp = tempdir().unwrap();
    let mut config = default_config();

    let blocked = sentinel::validate_import(
        tmp.path(),
        &config,
        "src/gold/Button.tsx",
        "../components/RawInput",
    );
    assert!(!blocked.allowed);
    assert_eq!(blocked.rule.as_deref(), Some("gold-registry-indirection"));

    config
        .registry
        .allowed_direct_imports
        .push("tokens$".to_string());
    let allowed = sentinel::validate_import(
        tmp.path(),
        &config,
        "src/gold/Button.tsx",
        "../components/tokens",
    );
    assert!(allowed.allowed);
}

#[test]
fn registry_entry_point_reexports_are_exempt_from_indirection_rule() {
    let (tmp, config) = transitive_fixture();
    let decision = sentinel::validate_import(
        tmp.path(),
        &config,
        "src/gold/index.ts",
        "../components/Fancy",
    );
    // The entry point IS the indirection; only the draft reachability is a
    // problem, and that is the scan's job, not this edge rule's.
    assert!(decision.allowed || decision.rule.as_deref() == Some("tier-contagion"));
}

#[test]
fn files_outside_registries_are_unconstrained() {
    let tmp = tempdir().unwrap();
    let config = default_config();
    let decision =
        sentinel::validate_import(tmp.path(), &config, "src/app/Page.tsx", "@/draft");
    assert!(decision.allowed);
}

#[test]
fn missing_entry_points_are_parse_state_not_errors() {
    let tmp = tempdir().unwrap();
    let state = registry::parse_registry(tmp.path(), "src/gold/index.ts", RegistryTier::Gold);
    assert!(!state.exists);
    assert_eq!(state.errors.len(), 1);
    assert!(state.exports.is_empty());
}
