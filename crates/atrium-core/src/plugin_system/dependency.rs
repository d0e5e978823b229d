use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plugin_system::identifier::PluginIdentifier;
use crate::plugin_system::version::VersionRange;

/// Represents a declared relation to another plugin.
///
/// A required relation both gates loading (unsatisfied = fatal for the
/// declaring unit) and orders the load; an optional relation orders the load
/// only when the target is present. The same shape also carries `loadBefore`
/// entries, where the range is informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDependency {
    /// Identifier of the related plugin
    pub id: PluginIdentifier,

    /// The version range that is acceptable
    #[serde(default)]
    pub version_range: Option<VersionRange>,

    /// Whether this is a hard requirement or optional dependency
    #[serde(default)]
    pub required: bool,
}

impl PluginDependency {
    /// Create a new required dependency with a specific version range
    pub fn required(id: PluginIdentifier, version_range: VersionRange) -> Self {
        Self {
            id,
            version_range: Some(version_range),
            required: true,
        }
    }

    /// Create a new required dependency with any version
    pub fn required_any(id: PluginIdentifier) -> Self {
        Self {
            id,
            version_range: None,
            required: true,
        }
    }

    /// Create a new optional dependency with a specific version range
    pub fn optional(id: PluginIdentifier, version_range: VersionRange) -> Self {
        Self {
            id,
            version_range: Some(version_range),
            required: false,
        }
    }

    /// Create a new optional dependency with any version
    pub fn optional_any(id: PluginIdentifier) -> Self {
        Self {
            id,
            version_range: None,
            required: false,
        }
    }

    /// Check if this dependency is satisfied by the given version string
    pub fn is_compatible_with(&self, version_str: &str) -> bool {
        match &self.version_range {
            Some(range) => match semver::Version::parse(version_str) {
                Ok(v) => range.includes(&v),
                Err(_) => false,
            },
            // No version range means any version is acceptable
            None => true,
        }
    }
}

impl fmt::Display for PluginDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let requirement_type = if self.required { "Requires" } else { "Optional" };
        match &self.version_range {
            Some(range) => write!(
                f,
                "{} plugin: {} (version: {})",
                requirement_type,
                self.id,
                range.constraint_string()
            ),
            None => write!(f, "{} plugin: {} (any version)", requirement_type, self.id),
        }
    }
}

/// Error that can occur when validating a single candidate's relations
#[derive(Debug, Error)]
pub enum DependencyError {
    /// The required plugin was not found
    #[error("required plugin not found: {0}")]
    MissingPlugin(PluginIdentifier),

    /// The plugin was found, but carries no version to check against
    #[error("dependency '{0}' declares no version but '{1}' requires one")]
    UnversionedDependency(PluginIdentifier, PluginIdentifier),

    /// The plugin was found, but the version is incompatible
    #[error("plugin version mismatch: '{id}' requires version '{required_range}' but found '{actual_version}'")]
    IncompatibleVersion {
        id: PluginIdentifier,
        required_range: VersionRange,
        actual_version: String,
    },

    /// The host version does not satisfy the candidate's declared range
    #[error("'{id}' requires server version '{required_range}' but the host is '{host_version}'")]
    IncompatibleServerVersion {
        id: PluginIdentifier,
        required_range: VersionRange,
        host_version: String,
    },

    /// Other dependency resolution error
    #[error("dependency error: {0}")]
    Other(String),
}
