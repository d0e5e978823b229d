#![cfg(test)]

use crate::plugin_system::identifier::{IdentifierError, PluginIdentifier};

#[test]
fn test_identifier_components() {
    let id = PluginIdentifier::new("core", "worldgen").unwrap();
    assert_eq!(id.group(), "core");
    assert_eq!(id.name(), "worldgen");
    assert_eq!(id.to_string(), "core:worldgen");
}

#[test]
fn test_identifier_round_trip() {
    for text in ["core:worldgen", "a:b", "Some.Group:Some-Name"] {
        let id: PluginIdentifier = text.parse().unwrap();
        let reparsed: PluginIdentifier = id.to_string().parse().unwrap();
        assert_eq!(id, reparsed);
        assert_eq!(id.to_string(), text);
    }
}

#[test]
fn test_identifier_rejects_empty() {
    assert!(matches!("".parse::<PluginIdentifier>(), Err(IdentifierError::Empty)));
}

#[test]
fn test_identifier_rejects_missing_colon() {
    assert!(matches!(
        "coreworldgen".parse::<PluginIdentifier>(),
        Err(IdentifierError::MissingSeparator(_))
    ));
}

#[test]
fn test_identifier_rejects_extra_colon() {
    assert!(matches!(
        "core:world:gen".parse::<PluginIdentifier>(),
        Err(IdentifierError::MissingSeparator(_))
    ));
}

#[test]
fn test_identifier_rejects_empty_components() {
    assert!(matches!(":name".parse::<PluginIdentifier>(), Err(IdentifierError::EmptyGroup(_))));
    assert!(matches!("group:".parse::<PluginIdentifier>(), Err(IdentifierError::EmptyName(_))));
    assert!(PluginIdentifier::new("", "name").is_err());
    assert!(PluginIdentifier::new("group", "").is_err());
}

#[test]
fn test_identifier_equality_is_case_sensitive() {
    let lower: PluginIdentifier = "core:worldgen".parse().unwrap();
    let upper: PluginIdentifier = "core:WorldGen".parse().unwrap();
    assert_ne!(lower, upper);
}

#[test]
fn test_identifier_ordering_by_group_then_name() {
    let a: PluginIdentifier = "alpha:zz".parse().unwrap();
    let b: PluginIdentifier = "beta:aa".parse().unwrap();
    let c: PluginIdentifier = "beta:bb".parse().unwrap();
    assert!(a < b);
    assert!(b < c);
}
