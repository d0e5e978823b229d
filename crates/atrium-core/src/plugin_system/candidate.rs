use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::identifier::PluginIdentifier;
use crate::plugin_system::manifest::PluginManifest;

/// A manifest plus origin information, awaiting resolution.
#[derive(Debug, Clone)]
pub struct CandidateUnit {
    pub manifest: Arc<PluginManifest>,
    /// Resource path the unit was discovered at; empty for core units
    pub path: PathBuf,
    /// Whether the unit ships inside the host binary
    pub is_core: bool,
}

impl CandidateUnit {
    /// Candidate for a unit shipped inside the host binary.
    pub fn core(manifest: PluginManifest) -> Self {
        Self {
            manifest: Arc::new(manifest),
            path: PathBuf::new(),
            is_core: true,
        }
    }

    /// Candidate for an externally discovered unit.
    pub fn external(manifest: PluginManifest, path: PathBuf) -> Self {
        Self {
            manifest: Arc::new(manifest),
            path,
            is_core: false,
        }
    }

    pub fn identifier(&self) -> Result<PluginIdentifier, PluginSystemError> {
        self.manifest.identifier().map_err(PluginSystemError::from)
    }

    /// Expand the unit's direct sub-manifests into candidates of their own.
    ///
    /// Expansion is single-level; the registry re-invokes it as the children
    /// are registered, so nested sub-plugins expand transitively. Each child
    /// inherits unset manifest fields from the parent, gains the implicit
    /// hard dependency on it, and copies the parent's path and core flag.
    pub fn expand(&self) -> Result<Vec<CandidateUnit>, PluginSystemError> {
        let mut children = Vec::with_capacity(self.manifest.sub_plugins.len());
        for sub in &self.manifest.sub_plugins {
            let derived = sub.inherit_from(&self.manifest)?;
            children.push(CandidateUnit {
                manifest: Arc::new(derived),
                path: self.path.clone(),
                is_core: self.is_core,
            });
        }
        Ok(children)
    }
}

/// Collects candidate units until the resolver consumes them.
///
/// Iteration order of the backing map is lexicographic on the canonical
/// `group:name` identifier, which is what makes resolution deterministic.
#[derive(Debug, Default)]
pub struct CandidateRegistry {
    candidates: BTreeMap<PluginIdentifier, CandidateUnit>,
}

impl CandidateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit and, recursively, its expanded sub-unit candidates.
    ///
    /// A duplicate identifier fails that unit only; candidates registered
    /// before the failure remain.
    pub fn register(&mut self, unit: CandidateUnit) -> Result<(), PluginSystemError> {
        unit.manifest.validate()?;
        let id = unit.identifier()?;

        if self.candidates.contains_key(&id) {
            return Err(PluginSystemError::RegistrationError {
                id: id.to_string(),
                message: "a candidate with this identifier is already registered".to_string(),
            });
        }

        let children = unit.expand()?;
        self.candidates.insert(id, unit);
        for child in children {
            self.register(child)?;
        }
        Ok(())
    }

    /// Hand the full candidate set to the resolver.
    pub fn drain(&mut self) -> BTreeMap<PluginIdentifier, CandidateUnit> {
        std::mem::take(&mut self.candidates)
    }

    pub fn contains(&self, id: &PluginIdentifier) -> bool {
        self.candidates.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
