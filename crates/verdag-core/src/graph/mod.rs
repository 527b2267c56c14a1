//! The version DAG and everything that queries or derives from it.
//!
//! # Overview
//!
//! A [`VersionGraph`] is built once, either from provider metadata
//! ([`build`]) or by filtering an existing graph ([`filter`]). Both paths end
//! in the same private constructor, which checks edge symmetry, certifies
//! acyclicity where needed and derives the branch structure before any value
//! is handed out. Graphs are never mutated afterwards.
//!
//! ## Pipeline
//!
//! ```text
//! MetadataProvider
//!        ↓  build::resolve predecessor edges
//! edges_back / edges_fw
//!        ↓  validate::check_edge_symmetry
//!        ↓  cycles::validate_no_cycles            (built graphs)
//!        ↓  validate::find_branch_structure       (two BFS sweeps, component
//!                                                  sweep for built graphs)
//! VersionGraph
//!   ├─ walk:   directional walks, mainline membership
//!   ├─ filter: derived subgraphs with carried-forward tags
//!   └─ tags:   repo tags identifier
//! ```
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A is an immediate predecessor of B". `edges_back`
//! maps each version to its predecessors and `edges_fw` to its successors;
//! the two are exact inverses.

pub mod build;
pub mod cycles;
pub mod filter;
pub mod validate;
pub mod walk;

use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use crate::error::GraphError;
use crate::version::Version;
use validate::IslandCheck;

pub use filter::ArtifactScheme;
pub use walk::{WalkDirection, WalkPolicy};

// ---------------------------------------------------------------------------
// VersionGraph
// ---------------------------------------------------------------------------

/// An immutable DAG of versions with mainline and branch information.
#[derive(Debug, Clone)]
pub struct VersionGraph<V: Version> {
    /// version → immediate predecessors.
    edges_back: BTreeMap<V, BTreeSet<V>>,
    /// version → immediate successors.
    edges_fw: BTreeMap<V, BTreeSet<V>>,
    /// Versions the provider excluded from the main line.
    off_mainline: BTreeSet<V>,
    roots: BTreeSet<V>,
    tips: BTreeSet<V>,
    /// Longest path from each root to any tip. Only ranks roots.
    paths_to_tip: BTreeMap<V, usize>,
    /// Filters and flavours applied to reach this graph, in order.
    tags: Vec<String>,
}

/// Where a set of edges came from, which decides the checks it needs.
enum Provenance<'a, V: Version> {
    /// Resolved from provider metadata. `detached` holds the versions whose
    /// ancestry shares no side with them.
    Built { detached: &'a BTreeSet<V> },
    /// Derived from an already validated graph.
    Filtered,
}

impl<V: Version> VersionGraph<V> {
    /// The only constructor. Returns a fully derived graph or the first
    /// structural error.
    fn assemble(
        edges_back: BTreeMap<V, BTreeSet<V>>,
        edges_fw: BTreeMap<V, BTreeSet<V>>,
        off_mainline: BTreeSet<V>,
        tags: Vec<String>,
        provenance: Provenance<'_, V>,
    ) -> Result<Self, GraphError> {
        validate::check_edge_symmetry(&edges_back, &edges_fw)?;
        let islands = match provenance {
            Provenance::Built { detached } => {
                cycles::validate_no_cycles(&edges_fw)?;
                IslandCheck::Reject { detached }
            }
            Provenance::Filtered => IslandCheck::Skip,
        };
        let structure = validate::find_branch_structure(&edges_back, &edges_fw, islands)?;

        let graph = Self {
            edges_back,
            edges_fw,
            off_mainline,
            roots: structure.roots,
            tips: structure.tips,
            paths_to_tip: structure.paths_to_tip,
            tags,
        };
        info!(
            versions = graph.len(),
            edges = graph.edge_count(),
            roots = graph.roots.len(),
            tips = graph.tips.len(),
            branch_points = structure.branch_points.len(),
            "version graph ready"
        );
        Ok(graph)
    }

    /// Number of versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges_back.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges_back.is_empty()
    }

    /// Number of predecessor edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges_back.values().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn contains(&self, version: &V) -> bool {
        self.edges_back.contains_key(version)
    }

    /// All versions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.edges_back.keys()
    }

    /// Versions with no predecessors.
    #[must_use]
    pub const fn roots(&self) -> &BTreeSet<V> {
        &self.roots
    }

    /// Versions with no successors.
    #[must_use]
    pub const fn tips(&self) -> &BTreeSet<V> {
        &self.tips
    }

    /// Tags accumulated by the filters that produced this graph.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Longest path from `root` to any tip, if `root` is a root.
    #[must_use]
    pub fn path_to_tip(&self, root: &V) -> Option<usize> {
        self.paths_to_tip.get(root).copied()
    }

    /// Immediate predecessors of `version`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownVersion`] if `version` is not in the graph.
    pub fn predecessors(&self, version: &V) -> Result<&BTreeSet<V>, GraphError> {
        self.edges_back
            .get(version)
            .ok_or_else(|| unknown(version))
    }

    /// Immediate successors of `version`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownVersion`] if `version` is not in the graph.
    pub fn successors(&self, version: &V) -> Result<&BTreeSet<V>, GraphError> {
        self.edges_fw.get(version).ok_or_else(|| unknown(version))
    }

    /// Whether the provider left `version` on the main line.
    #[must_use]
    pub fn is_mainline(&self, version: &V) -> bool {
        !self.off_mainline.contains(version)
    }

    /// The root with the longest path to a tip. Ties go to the oldest root.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EmptyRoot`] if the graph has no roots.
    pub fn main_root_version(&self) -> Result<&V, GraphError> {
        let mut best: Option<(&V, usize)> = None;
        for root in &self.roots {
            let length = self.paths_to_tip.get(root).copied().unwrap_or_default();
            if best.is_none_or(|(_, best_length)| length > best_length) {
                best = Some((root, length));
            }
        }
        best.map(|(root, _)| root).ok_or(GraphError::EmptyRoot)
    }

    /// Case-insensitive lookup by launcher-friendly name.
    #[must_use]
    pub fn version_by_name(&self, name: &str) -> Option<&V> {
        self.iter()
            .find(|v| v.launcher_friendly_version_name().eq_ignore_ascii_case(name))
    }

    /// Case-insensitive lookup by normalized semantic version.
    #[must_use]
    pub fn version_by_semantic_version(&self, semantic: &str) -> Option<&V> {
        self.iter()
            .find(|v| v.semantic_version().eq_ignore_ascii_case(semantic))
    }

    /// BLAKE3 hash of the sorted edge list, `blake3:<hex>`.
    ///
    /// Changes whenever the vertex set or any edge changes. Useful as a cache
    /// key next to the human-readable repo tags identifier.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (version, predecessors) in &self.edges_back {
            hasher.update(version.launcher_friendly_version_name().as_bytes());
            hasher.update(b"\x00");
            for predecessor in predecessors {
                hasher.update(predecessor.launcher_friendly_version_name().as_bytes());
                hasher.update(b"\x01");
            }
            hasher.update(b"\x00");
        }
        format!("blake3:{}", hasher.finalize())
    }

    fn neighbors(&self, version: &V, direction: WalkDirection) -> Result<&BTreeSet<V>, GraphError> {
        match direction {
            WalkDirection::Back => self.predecessors(version),
            WalkDirection::Forward => self.successors(version),
        }
    }
}

fn unknown<V: Version>(version: &V) -> GraphError {
    GraphError::UnknownVersion {
        version: version.friendly_version(),
    }
}

/// Friendly names of a version set, in order. Used in diagnostics.
pub(crate) fn friendly_names<'a, V: Version + 'a>(
    versions: impl IntoIterator<Item = &'a V>,
) -> Vec<String> {
    versions.into_iter().map(Version::friendly_version).collect()
}
