//! Graph construction from provider metadata.
//!
//! # Predecessor resolution
//!
//! For every version `v` the builder asks the provider for explicit parent
//! candidates. Without a hint it falls back to the closest lower version in
//! the total order among mainline versions. Each candidate that shares a
//! side with `v` becomes a predecessor edge. A candidate that does not is
//! skipped over: its own candidates are examined against `v` in turn, so a
//! client-only release never becomes the direct parent of a server-only one.
//!
//! That backward walk is bounded by the number of versions. Running past the
//! bound means the hints loop back on themselves, which is reported as
//! [`GraphError::AncestryExhausted`] rather than overflowing the stack.
//!
//! A version whose ancestry has no side-compatible version at all simply gets
//! no predecessors and becomes a root. Such a root is recorded as detached:
//! it may start a component of its own, which the island check otherwise
//! rejects.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};

use crate::error::GraphError;
use crate::graph::{Provenance, VersionGraph};
use crate::provider::{ManifestSource, MetadataProvider};
use crate::runner::TaskRunner;
use crate::version::Version;

impl<V: Version> VersionGraph<V> {
    /// Retrieve every version from `provider` and build a validated graph.
    ///
    /// Retrieval may fan out on `runner`; graph construction starts once it
    /// has completed.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged, or a [`GraphError`] (wrapped in
    /// [`anyhow::Error`]) if the resulting graph is structurally invalid.
    #[instrument(skip_all, fields(provider = provider.internal_name()))]
    pub fn from_metadata<P>(runner: &TaskRunner, provider: &P) -> Result<Self>
    where
        P: MetadataProvider<V> + ?Sized,
    {
        let versions: BTreeSet<V> = provider
            .versions(runner)
            .with_context(|| format!("failed to load versions from {}", provider.internal_name()))?
            .into_values()
            .collect();

        Ok(Self::from_versions(versions, provider)?)
    }

    /// Build a validated graph over an already retrieved version set.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownParent`] for hints outside `versions`,
    /// [`GraphError::AncestryExhausted`] for looping hints,
    /// [`GraphError::CycleDetected`] and [`GraphError::InconsistentGraph`]
    /// for invalid structure.
    #[instrument(skip_all, fields(versions = versions.len()))]
    pub fn from_versions<P>(versions: BTreeSet<V>, provider: &P) -> Result<Self, GraphError>
    where
        P: MetadataProvider<V> + ?Sized,
    {
        let (mainline, off_mainline): (BTreeSet<V>, BTreeSet<V>) = versions
            .iter()
            .cloned()
            .partition(|v| !provider.should_exclude_from_main_branch(v));

        let resolver = AncestryResolver {
            provider,
            versions: &versions,
            mainline: &mainline,
            limit: versions.len(),
        };

        let mut edges_back: BTreeMap<V, BTreeSet<V>> = BTreeMap::new();
        let mut edges_fw: BTreeMap<V, BTreeSet<V>> = BTreeMap::new();
        let mut detached = BTreeSet::new();
        for version in &versions {
            edges_back.entry(version.clone()).or_default();
            edges_fw.entry(version.clone()).or_default();

            let previous = match resolver.previous_versions(version)? {
                Ancestry::Parents(previous) => previous,
                Ancestry::Origin => continue,
                Ancestry::Detached => {
                    detached.insert(version.clone());
                    continue;
                }
            };
            for p in previous {
                edges_fw.entry(p.clone()).or_default().insert(version.clone());
                edges_back.entry(version.clone()).or_default().insert(p);
            }
        }

        let mut tags = Vec::new();
        if provider.source() != ManifestSource::Primary {
            tags.push(format!("manifest_{}", provider.internal_name()));
        }

        Self::assemble(
            edges_back,
            edges_fw,
            off_mainline,
            tags,
            Provenance::Built {
                detached: &detached,
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Outcome of predecessor resolution for one version.
enum Ancestry<V> {
    /// At least one side-compatible predecessor.
    Parents(BTreeSet<V>),
    /// No candidates at all: the start of a history.
    Origin,
    /// Candidates existed but none of the ancestry shares a side. The
    /// version becomes a root that may stand apart from the rest.
    Detached,
}

struct AncestryResolver<'a, V: Version, P: MetadataProvider<V> + ?Sized> {
    provider: &'a P,
    versions: &'a BTreeSet<V>,
    mainline: &'a BTreeSet<V>,
    limit: usize,
}

impl<V: Version, P: MetadataProvider<V> + ?Sized> AncestryResolver<'_, V, P> {
    fn previous_versions(&self, version: &V) -> Result<Ancestry<V>, GraphError> {
        let candidates = self.parent_candidates(version)?;
        if candidates.is_empty() {
            return Ok(Ancestry::Origin);
        }

        let mut previous = BTreeSet::new();
        let mut explored = BTreeSet::new();
        self.collect_valid(candidates, version, 0, &mut explored, &mut previous)?;

        if previous.is_empty() {
            warn!(
                version = %version.friendly_version(),
                "no side-compatible ancestor, version becomes a root"
            );
            return Ok(Ancestry::Detached);
        }
        Ok(Ancestry::Parents(previous))
    }

    /// `explored` holds skipped candidates whose ancestry is already in
    /// `out`, so diamonds are walked once per target.
    fn collect_valid(
        &self,
        candidates: Vec<V>,
        target: &V,
        depth: usize,
        explored: &mut BTreeSet<V>,
        out: &mut BTreeSet<V>,
    ) -> Result<(), GraphError> {
        for candidate in candidates {
            if candidate.has_side_in_common(target) {
                out.insert(candidate);
                continue;
            }
            if explored.contains(&candidate) {
                continue;
            }

            if depth >= self.limit {
                return Err(GraphError::AncestryExhausted {
                    version: target.friendly_version(),
                    depth,
                });
            }
            debug!(
                version = %target.friendly_version(),
                skipped = %candidate.friendly_version(),
                "parent shares no side, walking further back"
            );
            let further = self.parent_candidates(&candidate)?;
            self.collect_valid(further, target, depth + 1, explored, out)?;
            explored.insert(candidate);
        }
        Ok(())
    }

    /// Explicit hints, or the closest lower mainline version.
    fn parent_candidates(&self, version: &V) -> Result<Vec<V>, GraphError> {
        if let Some(parents) = self.provider.parent_versions(version) {
            if let Some(unknown) = parents.iter().find(|p| !self.versions.contains(*p)) {
                return Err(GraphError::UnknownParent {
                    version: version.friendly_version(),
                    parent: unknown.friendly_version(),
                });
            }
            return Ok(parents);
        }

        let fallback = self.mainline.range(..version).next_back().cloned();
        if let Some(parent) = &fallback {
            debug!(
                version = %version.friendly_version(),
                parent = %parent.friendly_version(),
                "no parent hint, using semantic order"
            );
        }
        Ok(fallback.into_iter().collect())
    }
}
