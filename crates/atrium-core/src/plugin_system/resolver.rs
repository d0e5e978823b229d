//! Load-order resolution.
//!
//! The resolver is a pure function over the candidate mapping: it validates
//! versions, builds a per-node set of incoming-requirement edges, and peels
//! off nodes with no remaining requirements until the mapping is empty.
//! Candidates are keyed by a `BTreeMap`, so extraction within a pass runs in
//! lexicographic `group:name` order and the output is stable across runs for
//! the same input.

use std::collections::BTreeMap;
use std::fmt;

use semver::Version;
use thiserror::Error;

use crate::plugin_system::candidate::CandidateUnit;
use crate::plugin_system::dependency::DependencyError;
use crate::plugin_system::identifier::PluginIdentifier;
use crate::plugin_system::version::{parse_version, VersionRange};

/// One unresolved relation, attributed to the declaring unit.
#[derive(Debug, Clone)]
pub struct MissingRelation {
    pub unit: PluginIdentifier,
    pub target: PluginIdentifier,
    pub range: Option<VersionRange>,
    /// True for a hard dependency, false for a load-before target
    pub required: bool,
}

impl fmt::Display for MissingRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.required { "requires" } else { "orders before" };
        match &self.range {
            Some(range) => write!(f, "{} {} {} ({})", self.unit, verb, self.target, range),
            None => write!(f, "{} {} {}", self.unit, verb, self.target),
        }
    }
}

/// Composite report of every missing hard dependency and load-before target.
#[derive(Debug, Clone)]
pub struct MissingReport(pub Vec<MissingRelation>);

impl fmt::Display for MissingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, relation) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {}", relation)?;
        }
        Ok(())
    }
}

/// Nodes left over after extraction stalled, each with the identifiers it is
/// still waiting on.
#[derive(Debug, Clone)]
pub struct CycleReport(pub Vec<(PluginIdentifier, Vec<PluginIdentifier>)>);

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (unit, waiting_on)) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let targets: Vec<String> = waiting_on.iter().map(|id| id.to_string()).collect();
            write!(f, "  {} is waiting on {}", unit, targets.join(", "))?;
        }
        Ok(())
    }
}

/// Structured failure of the resolution pass.
#[derive(Debug, Clone, Error)]
pub enum ResolutionError {
    #[error("unresolvable plugin relations:\n{0}")]
    MissingRelations(MissingReport),

    #[error("cyclic dependency between plugins:\n{0}")]
    CyclicDependency(CycleReport),
}

/// Pre-resolution version validation.
///
/// Drops every candidate whose declared `server_version` range the host does
/// not satisfy, and every candidate with a hard dependency whose target is
/// present (pending or already loaded) but unversioned or out of range.
/// Hard dependencies on absent targets are left for [`resolve_load_order`]
/// to report, since a missing requirement is fatal for the whole setup
/// rather than for one candidate.
///
/// Returns the surviving candidates and the dropped ones with their reasons.
pub fn validate_candidates(
    candidates: BTreeMap<PluginIdentifier, CandidateUnit>,
    host_version: &Version,
    loaded_versions: &BTreeMap<PluginIdentifier, Option<Version>>,
) -> (
    BTreeMap<PluginIdentifier, CandidateUnit>,
    Vec<(PluginIdentifier, DependencyError)>,
) {
    let mut dropped = Vec::new();

    let declared_version = |id: &PluginIdentifier| -> Option<Option<Version>> {
        if let Some(unit) = candidates.get(id) {
            return Some(
                unit.manifest
                    .version
                    .as_deref()
                    .and_then(|v| parse_version(v).ok()),
            );
        }
        loaded_versions.get(id).cloned()
    };

    let mut surviving = BTreeMap::new();
    for (id, unit) in &candidates {
        if let Some(err) = validate_one(id, unit, host_version, &declared_version) {
            dropped.push((id.clone(), err));
        } else {
            surviving.insert(id.clone(), unit.clone());
        }
    }

    (surviving, dropped)
}

fn validate_one(
    id: &PluginIdentifier,
    unit: &CandidateUnit,
    host_version: &Version,
    declared_version: &dyn Fn(&PluginIdentifier) -> Option<Option<Version>>,
) -> Option<DependencyError> {
    if let Some(range) = &unit.manifest.server_version {
        if !range.includes(host_version) {
            return Some(DependencyError::IncompatibleServerVersion {
                id: id.clone(),
                required_range: range.clone(),
                host_version: host_version.to_string(),
            });
        }
    }

    for dep in unit.manifest.hard_dependencies() {
        let Some(target_version) = declared_version(&dep.id) else {
            // Absent entirely; the resolver reports it as fatal.
            continue;
        };
        let Some(version) = target_version else {
            return Some(DependencyError::UnversionedDependency(dep.id.clone(), id.clone()));
        };
        if let Some(range) = &dep.version_range {
            if !range.includes(&version) {
                return Some(DependencyError::IncompatibleVersion {
                    id: dep.id.clone(),
                    required_range: range.clone(),
                    actual_version: version.to_string(),
                });
            }
        }
    }

    None
}

/// Compute a load order over the candidate mapping.
///
/// Each node carries the set of identifiers that must be ordered before it:
/// its hard dependencies, its optional dependencies that are present, the
/// flipped side of every present `load_before` declaration, and, for
/// non-core units, every core unit. Nodes whose set is empty are extracted
/// in identifier order until none remain; a stall with nodes left over is a
/// cycle.
pub fn resolve_load_order(
    candidates: BTreeMap<PluginIdentifier, CandidateUnit>,
) -> Result<Vec<CandidateUnit>, ResolutionError> {
    let mut edges: BTreeMap<PluginIdentifier, std::collections::BTreeSet<PluginIdentifier>> =
        candidates.keys().map(|id| (id.clone(), Default::default())).collect();
    let mut missing = Vec::new();

    for (id, unit) in &candidates {
        for dep in unit.manifest.hard_dependencies() {
            if candidates.contains_key(&dep.id) {
                edges.get_mut(id).expect("node exists").insert(dep.id.clone());
            } else {
                missing.push(MissingRelation {
                    unit: id.clone(),
                    target: dep.id.clone(),
                    range: dep.version_range.clone(),
                    required: true,
                });
            }
        }

        for dep in unit.manifest.optional_dependencies() {
            if candidates.contains_key(&dep.id) {
                edges.get_mut(id).expect("node exists").insert(dep.id.clone());
            }
        }

        // loadBefore flips: the declaring unit becomes a requirement of the
        // target, not the other way around.
        for target in &unit.manifest.load_before {
            if let Some(target_edges) = edges.get_mut(&target.id) {
                target_edges.insert(id.clone());
            } else {
                missing.push(MissingRelation {
                    unit: id.clone(),
                    target: target.id.clone(),
                    range: target.version_range.clone(),
                    required: false,
                });
            }
        }
    }

    // Core units always order before external units.
    let core_ids: Vec<PluginIdentifier> = candidates
        .iter()
        .filter(|(_, unit)| unit.is_core)
        .map(|(id, _)| id.clone())
        .collect();
    for (id, unit) in &candidates {
        if !unit.is_core {
            let node_edges = edges.get_mut(id).expect("node exists");
            for core_id in &core_ids {
                node_edges.insert(core_id.clone());
            }
        }
    }

    if !missing.is_empty() {
        return Err(ResolutionError::MissingRelations(MissingReport(missing)));
    }

    let mut remaining = candidates;
    let mut order = Vec::with_capacity(remaining.len());
    while !remaining.is_empty() {
        let ready: Vec<PluginIdentifier> = edges
            .iter()
            .filter(|(_, incoming)| incoming.is_empty())
            .map(|(id, _)| id.clone())
            .collect();

        if ready.is_empty() {
            let stalled = edges
                .iter()
                .map(|(id, incoming)| (id.clone(), incoming.iter().cloned().collect()))
                .collect();
            return Err(ResolutionError::CyclicDependency(CycleReport(stalled)));
        }

        for id in &ready {
            edges.remove(id);
            let unit = remaining.remove(id).expect("extracted node is a candidate");
            order.push(unit);
        }
        for incoming in edges.values_mut() {
            for id in &ready {
                incoming.remove(id);
            }
        }
    }

    Ok(order)
}
