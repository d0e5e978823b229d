#![cfg(test)]

use crate::plugin_system::manifest::{ManifestBuilder, PluginManifest};
use crate::plugin_system::tests::common::{id, range};

#[test]
fn test_builder_populates_fields() {
    let manifest = ManifestBuilder::new("core", "worldgen", "1.2.0")
        .description("Generates the world")
        .website("https://example.invalid/worldgen")
        .author("someone")
        .entry_point("ok")
        .server_version(range(">=1.0"))
        .dependency(id("core:terrain"), Some(range("^1.0")), true)
        .dependency(id("core:biomes"), None, false)
        .load_before(id("core:spawning"), None)
        .disabled_by_default(true)
        .includes_asset_pack(true)
        .core(true)
        .build();

    assert_eq!(manifest.identifier().unwrap(), id("core:worldgen"));
    assert_eq!(manifest.version.as_deref(), Some("1.2.0"));
    assert_eq!(manifest.hard_dependencies().count(), 1);
    assert_eq!(manifest.optional_dependencies().count(), 1);
    assert_eq!(manifest.load_before.len(), 1);
    assert!(manifest.disabled_by_default);
    assert!(manifest.includes_asset_pack);
    assert!(manifest.is_core);
}

#[test]
fn test_validate_rejects_empty_name() {
    let manifest = PluginManifest {
        group: "core".to_string(),
        ..PluginManifest::default()
    };
    let err = manifest.validate().unwrap_err();
    assert!(err.to_string().contains("empty name"));
}

#[test]
fn test_validate_rejects_unparsable_version() {
    let manifest = PluginManifest::new("core", "broken", "one-dot-oh");
    assert!(manifest.validate().is_err());
}

#[test]
fn test_validate_rejects_overlapping_dependency_sets() {
    let manifest = ManifestBuilder::new("core", "overlap", "1.0.0")
        .dependency(id("core:shared"), None, true)
        .dependency(id("core:shared"), None, false)
        .build();
    let err = manifest.validate().unwrap_err();
    assert!(err.to_string().contains("core:shared"));
}

#[test]
fn test_inheritance_fills_unset_fields() {
    let parent = ManifestBuilder::new("core", "parent", "2.1.0")
        .description("parent description")
        .website("https://example.invalid")
        .author("author-one")
        .disabled_by_default(true)
        .build();
    let child = ManifestBuilder::sub_unit("child").build();

    let derived = child.inherit_from(&parent).unwrap();
    assert_eq!(derived.group, "core");
    assert_eq!(derived.version.as_deref(), Some("2.1.0"));
    assert_eq!(derived.description.as_deref(), Some("parent description"));
    assert_eq!(derived.website.as_deref(), Some("https://example.invalid"));
    assert_eq!(derived.authors, vec!["author-one".to_string()]);
    assert!(derived.disabled_by_default);
}

#[test]
fn test_inheritance_keeps_child_fields_when_set() {
    let parent = ManifestBuilder::new("core", "parent", "2.1.0")
        .description("parent description")
        .build();
    let child = ManifestBuilder::new("extras", "child", "0.3.0")
        .description("child description")
        .build();

    let derived = child.inherit_from(&parent).unwrap();
    assert_eq!(derived.group, "extras");
    assert_eq!(derived.version.as_deref(), Some("0.3.0"));
    assert_eq!(derived.description.as_deref(), Some("child description"));
}

#[test]
fn test_inheritance_adds_implicit_parent_dependency() {
    let parent = ManifestBuilder::new("core", "parent", "2.1.0").build();
    let child = ManifestBuilder::sub_unit("child").build();

    let derived = child.inherit_from(&parent).unwrap();
    let dep = derived
        .hard_dependencies()
        .find(|d| d.id == id("core:parent"))
        .expect("implicit dependency on the parent");
    assert_eq!(dep.version_range.as_ref().unwrap().constraint_string(), "=2.1.0");
}

#[test]
fn test_inheritance_without_parent_version_is_unconstrained() {
    let parent = PluginManifest {
        group: "core".to_string(),
        name: "parent".to_string(),
        ..PluginManifest::default()
    };
    let child = ManifestBuilder::sub_unit("child").build();

    let derived = child.inherit_from(&parent).unwrap();
    let dep = derived
        .hard_dependencies()
        .find(|d| d.id == id("core:parent"))
        .unwrap();
    assert!(dep.version_range.is_none());
    assert!(derived.version.is_none());
}

#[test]
fn test_inheritance_replaces_explicit_parent_dependency() {
    let parent = ManifestBuilder::new("core", "parent", "2.1.0").build();
    let child = ManifestBuilder::sub_unit("child")
        .dependency(id("core:parent"), Some(range("^1.0")), true)
        .build();

    let derived = child.inherit_from(&parent).unwrap();
    let deps: Vec<_> = derived.hard_dependencies().filter(|d| d.id == id("core:parent")).collect();
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].version_range.as_ref().unwrap().constraint_string(), "=2.1.0");
}

#[test]
fn test_manifest_deserializes_from_json() {
    let json = r#"{
        "group": "ext",
        "name": "mapper",
        "version": "0.9.1",
        "main": "libmapper.so",
        "server_version": ">=1.0",
        "dependencies": [
            { "id": "core:terrain", "version_range": "^1.0", "required": true },
            { "id": "ext:styles" }
        ],
        "load_before": [ { "id": "ext:overlay" } ],
        "in_server_classpath": false,
        "sub_plugins": [ { "name": "mapper-tiles", "main": "libtiles.so" } ]
    }"#;

    let manifest: PluginManifest = serde_json::from_str(json).unwrap();
    assert_eq!(manifest.identifier().unwrap(), id("ext:mapper"));
    assert_eq!(manifest.entry_point.as_deref(), Some("libmapper.so"));
    assert_eq!(manifest.hard_dependencies().count(), 1);
    assert_eq!(manifest.optional_dependencies().count(), 1);
    assert_eq!(manifest.load_before.len(), 1);
    assert!(!manifest.is_core);
    assert!(!manifest.disabled_by_default);
    assert_eq!(manifest.sub_plugins.len(), 1);
    assert_eq!(manifest.sub_plugins[0].name, "mapper-tiles");
    assert!(manifest.validate().is_ok());
}

#[test]
fn test_sub_plugin_must_not_share_parent_identifier() {
    let parent = ManifestBuilder::new("core", "parent", "2.1.0").build();
    let child = ManifestBuilder::sub_unit("parent").build();
    assert!(child.inherit_from(&parent).is_err());
}
