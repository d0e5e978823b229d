#![cfg(test)]

use std::path::PathBuf;

use crate::plugin_system::candidate::{CandidateRegistry, CandidateUnit};
use crate::plugin_system::manifest::ManifestBuilder;
use crate::plugin_system::tests::common::{id, unit};

#[test]
fn test_register_and_drain() {
    let mut registry = CandidateRegistry::new();
    registry.register(CandidateUnit::core(unit("core", "a", "1.0.0").build())).unwrap();
    registry.register(CandidateUnit::core(unit("core", "b", "1.0.0").build())).unwrap();
    assert_eq!(registry.len(), 2);

    let drained = registry.drain();
    assert!(registry.is_empty());
    assert!(drained.contains_key(&id("core:a")));
    assert!(drained.contains_key(&id("core:b")));
}

#[test]
fn test_duplicate_identifier_is_rejected_but_registry_survives() {
    let mut registry = CandidateRegistry::new();
    registry.register(CandidateUnit::core(unit("core", "a", "1.0.0").build())).unwrap();
    let err = registry
        .register(CandidateUnit::core(unit("core", "a", "2.0.0").build()))
        .unwrap_err();
    assert!(err.to_string().contains("core:a"));
    assert_eq!(registry.len(), 1);
    assert!(registry.contains(&id("core:a")));
}

#[test]
fn test_sub_plugins_register_recursively() {
    let grandchild = ManifestBuilder::sub_unit("grandchild").entry_point("ok").build();
    let child = ManifestBuilder::sub_unit("child")
        .entry_point("ok")
        .sub_plugin(grandchild)
        .build();
    let parent = unit("core", "parent", "1.0.0").sub_plugin(child).build();

    let mut registry = CandidateRegistry::new();
    registry.register(CandidateUnit::core(parent)).unwrap();

    assert_eq!(registry.len(), 3);
    assert!(registry.contains(&id("core:parent")));
    assert!(registry.contains(&id("core:child")));
    assert!(registry.contains(&id("core:grandchild")));

    let drained = registry.drain();
    let grandchild = &drained[&id("core:grandchild")];
    // The grandchild's implicit dependency points at its direct parent.
    assert!(grandchild.manifest.depends_on(&id("core:child")));
}

#[test]
fn test_expanded_children_copy_path_and_core_flag() {
    let child = ManifestBuilder::sub_unit("child").entry_point("ok").build();
    let parent = unit("ext", "parent", "1.0.0").sub_plugin(child).build();
    let parent_unit = CandidateUnit::external(parent, PathBuf::from("plugins/parent"));

    let children = parent_unit.expand().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].path, PathBuf::from("plugins/parent"));
    assert!(!children[0].is_core);
    assert_eq!(children[0].identifier().unwrap(), id("ext:child"));
}

#[test]
fn test_duplicate_sub_plugin_fails_that_unit_only() {
    let mut registry = CandidateRegistry::new();
    registry.register(CandidateUnit::core(unit("core", "child", "1.0.0").build())).unwrap();

    let child = ManifestBuilder::sub_unit("child").entry_point("ok").build();
    let parent = unit("core", "parent", "1.0.0").sub_plugin(child).build();
    assert!(registry.register(CandidateUnit::core(parent)).is_err());

    // The parent itself and the earlier registration both remain.
    assert!(registry.contains(&id("core:parent")));
    assert!(registry.contains(&id("core:child")));
}
