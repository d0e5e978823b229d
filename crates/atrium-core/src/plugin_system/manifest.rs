use serde::{Deserialize, Serialize};

use crate::plugin_system::dependency::PluginDependency;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::identifier::{IdentifierError, PluginIdentifier};
use crate::plugin_system::version::{parse_version, VersionRange};

/// Declared metadata for a plugin unit.
///
/// Manifests are immutable once a unit is registered; sub-plugin inheritance
/// works by constructing a derived manifest rather than mutating the parent
/// or sharing its dependency collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginManifest {
    /// Identifier group component. May be empty on a sub-manifest before
    /// inheritance fills it from the parent.
    pub group: String,

    /// Identifier name component. Always required.
    pub name: String,

    /// Declared semantic version. Optional, but any unit another unit
    /// depends on must declare one.
    pub version: Option<String>,

    /// Plugin description
    pub description: Option<String>,

    /// Plugin website URL
    pub website: Option<String>,

    /// Plugin authors
    pub authors: Vec<String>,

    /// Entry-point descriptor handed to the instance factory. `None` means
    /// the unit has no entry point and cannot be instantiated.
    #[serde(rename = "main")]
    pub entry_point: Option<String>,

    /// Version range the host must satisfy
    pub server_version: Option<VersionRange>,

    /// Hard and optional dependencies, distinguished by the `required` flag
    pub dependencies: Vec<PluginDependency>,

    /// Units this one must be ordered before, when they are present
    pub load_before: Vec<PluginDependency>,

    /// Child manifests expanded into their own candidate units
    pub sub_plugins: Vec<PluginManifest>,

    /// Registered as available but not loaded at boot
    pub disabled_by_default: bool,

    /// Informational flag for the asset-pack loader
    pub includes_asset_pack: bool,

    /// Whether the unit ships inside the host binary
    #[serde(alias = "in_server_classpath")]
    pub is_core: bool,
}

impl PluginManifest {
    /// Create a new plugin manifest
    pub fn new(group: &str, name: &str, version: &str) -> Self {
        Self {
            group: group.to_string(),
            name: name.to_string(),
            version: Some(version.to_string()),
            ..Self::default()
        }
    }

    /// The unit's identifier. Fails when group or name is empty, which only
    /// happens for a sub-manifest that has not been through inheritance.
    pub fn identifier(&self) -> Result<PluginIdentifier, IdentifierError> {
        PluginIdentifier::new(&self.group, &self.name)
    }

    /// Iterator over hard dependencies
    pub fn hard_dependencies(&self) -> impl Iterator<Item = &PluginDependency> {
        self.dependencies.iter().filter(|d| d.required)
    }

    /// Iterator over optional dependencies
    pub fn optional_dependencies(&self) -> impl Iterator<Item = &PluginDependency> {
        self.dependencies.iter().filter(|d| !d.required)
    }

    /// Whether this manifest declares a hard dependency on `id`
    pub fn depends_on(&self, id: &PluginIdentifier) -> bool {
        self.hard_dependencies().any(|d| &d.id == id)
    }

    /// Structural validation run at registration time.
    pub fn validate(&self) -> Result<(), PluginSystemError> {
        let unit = format!("{}:{}", self.group, self.name);
        if self.name.is_empty() {
            return Err(PluginSystemError::ManifestError {
                unit,
                message: "manifest has an empty name".to_string(),
            });
        }
        if let Some(version) = &self.version {
            parse_version(version).map_err(|e| PluginSystemError::ManifestError {
                unit: unit.clone(),
                message: e.to_string(),
            })?;
        }
        // Hard and optional dependency sets must be disjoint.
        for dep in self.hard_dependencies() {
            if self.optional_dependencies().any(|opt| opt.id == dep.id) {
                return Err(PluginSystemError::ManifestError {
                    unit,
                    message: format!(
                        "'{}' is declared both as a hard and an optional dependency",
                        dep.id
                    ),
                });
            }
        }
        Ok(())
    }

    /// Construct the manifest a sub-plugin is registered under.
    ///
    /// Empty fields are filled from the parent: group, version, description,
    /// website, authors, and the disabled-by-default flag (the parent's value
    /// wins only when the child's is unset). The child also gains an implicit
    /// hard dependency on the parent, pinned to the parent's version when it
    /// has one.
    pub fn inherit_from(&self, parent: &PluginManifest) -> Result<PluginManifest, PluginSystemError> {
        let mut child = self.clone();

        if child.group.is_empty() {
            child.group = parent.group.clone();
        }
        if child.version.is_none() {
            child.version = parent.version.clone();
        }
        if child.description.is_none() {
            child.description = parent.description.clone();
        }
        if child.website.is_none() {
            child.website = parent.website.clone();
        }
        if child.authors.is_empty() {
            child.authors = parent.authors.clone();
        }
        if !child.disabled_by_default {
            child.disabled_by_default = parent.disabled_by_default;
        }

        let parent_id = parent.identifier().map_err(PluginSystemError::from)?;
        let child_id = child.identifier().map_err(PluginSystemError::from)?;
        if child_id == parent_id {
            return Err(PluginSystemError::ManifestError {
                unit: child_id.to_string(),
                message: format!("sub-plugin shares the identifier of its parent '{}'", parent_id),
            });
        }

        let implicit = match parent.version.as_deref() {
            Some(version) => {
                let parsed = parse_version(version).map_err(|e| PluginSystemError::ManifestError {
                    unit: parent_id.to_string(),
                    message: e.to_string(),
                })?;
                PluginDependency::required(parent_id.clone(), VersionRange::exact(&parsed))
            }
            None => PluginDependency::required_any(parent_id.clone()),
        };
        child.dependencies.retain(|d| d.id != parent_id);
        child.dependencies.push(implicit);

        Ok(child)
    }
}

/// Builder for creating a plugin manifest
pub struct ManifestBuilder {
    manifest: PluginManifest,
}

impl ManifestBuilder {
    /// Create a new manifest builder
    pub fn new(group: &str, name: &str, version: &str) -> Self {
        Self {
            manifest: PluginManifest::new(group, name, version),
        }
    }

    /// Builder for a sub-manifest that inherits its group and version
    pub fn sub_unit(name: &str) -> Self {
        Self {
            manifest: PluginManifest {
                name: name.to_string(),
                ..PluginManifest::default()
            },
        }
    }

    /// Set the plugin description
    pub fn description(mut self, description: &str) -> Self {
        self.manifest.description = Some(description.to_string());
        self
    }

    /// Set the plugin website
    pub fn website(mut self, website: &str) -> Self {
        self.manifest.website = Some(website.to_string());
        self
    }

    /// Add an author
    pub fn author(mut self, author: &str) -> Self {
        self.manifest.authors.push(author.to_string());
        self
    }

    /// Set the entry-point descriptor
    pub fn entry_point(mut self, entry_point: &str) -> Self {
        self.manifest.entry_point = Some(entry_point.to_string());
        self
    }

    /// Require a host version range
    pub fn server_version(mut self, range: VersionRange) -> Self {
        self.manifest.server_version = Some(range);
        self
    }

    /// Add a dependency
    pub fn dependency(mut self, id: PluginIdentifier, version_range: Option<VersionRange>, required: bool) -> Self {
        self.manifest.dependencies.push(PluginDependency {
            id,
            version_range,
            required,
        });
        self
    }

    /// Declare a unit this one must be ordered before
    pub fn load_before(mut self, id: PluginIdentifier, version_range: Option<VersionRange>) -> Self {
        self.manifest.load_before.push(PluginDependency {
            id,
            version_range,
            required: false,
        });
        self
    }

    /// Attach a sub-plugin manifest
    pub fn sub_plugin(mut self, manifest: PluginManifest) -> Self {
        self.manifest.sub_plugins.push(manifest);
        self
    }

    /// Register as available but do not load at boot
    pub fn disabled_by_default(mut self, disabled: bool) -> Self {
        self.manifest.disabled_by_default = disabled;
        self
    }

    /// Mark the unit as carrying an asset pack
    pub fn includes_asset_pack(mut self, includes: bool) -> Self {
        self.manifest.includes_asset_pack = includes;
        self
    }

    /// Mark this as a unit shipped inside the host binary
    pub fn core(mut self, is_core: bool) -> Self {
        self.manifest.is_core = is_core;
        self
    }

    /// Build the manifest
    pub fn build(self) -> PluginManifest {
        self.manifest
    }
}
