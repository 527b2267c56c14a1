//! Derived subgraphs.
//!
//! [`VersionGraph::filter`] keeps the versions matching a predicate and
//! re-derives edges between them: a kept version gets an edge from every
//! kept version reachable backwards through removed versions only. The
//! result goes through the same structural derivation as a freshly built
//! graph, except for cycle certification and the island check, and carries
//! the source graph's tags plus an optional tag describing the filter.
//!
//! Removing a version can split the history: a side branch that never
//! merges back keeps going on its own once its fork point is filtered out.
//! Each piece then contributes its own roots.
//!
//! The named filters below are all thin wrappers around that mechanism.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument};

use crate::error::GraphError;
use crate::graph::{Provenance, VersionGraph};
use crate::version::Version;

/// Availability of a named per-version artifact (mappings, unpick
/// definitions, ...).
pub trait ArtifactScheme<V> {
    fn name(&self) -> &str;

    /// Whether this scheme provides an artifact for `version`.
    fn exists(&self, version: &V) -> bool;
}

impl<V: Version> VersionGraph<V> {
    /// Keep only versions matching `predicate`, appending `tag` if given.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InconsistentGraph`] if the directed sweeps over
    /// the re-derived edges disagree on the root set.
    #[instrument(skip(self, predicate), fields(from = self.len()))]
    pub fn filter<F>(&self, predicate: F, tag: Option<String>) -> Result<Self, GraphError>
    where
        F: Fn(&V) -> bool,
    {
        let kept: BTreeSet<&V> = self.iter().filter(|v| predicate(v)).collect();

        let mut edges_back: BTreeMap<V, BTreeSet<V>> = BTreeMap::new();
        let mut edges_fw: BTreeMap<V, BTreeSet<V>> = kept
            .iter()
            .map(|v| ((*v).clone(), BTreeSet::new()))
            .collect();

        for version in &kept {
            let previous = self.nearest_kept_predecessors(version, &kept);
            for p in &previous {
                if let Some(successors) = edges_fw.get_mut(*p) {
                    successors.insert((*version).clone());
                }
            }
            edges_back.insert(
                (*version).clone(),
                previous.into_iter().cloned().collect(),
            );
        }

        let off_mainline = self
            .off_mainline
            .iter()
            .filter(|v| kept.contains(v))
            .cloned()
            .collect();

        let mut tags = self.tags.clone();
        if let Some(tag) = tag {
            tags.push(tag);
        }

        debug!(kept = kept.len(), "re-deriving edges for filtered graph");
        Self::assemble(edges_back, edges_fw, off_mainline, tags, Provenance::Filtered)
    }

    /// Kept versions reachable backwards from `version` through removed
    /// versions only.
    fn nearest_kept_predecessors<'a>(&'a self, version: &V, kept: &BTreeSet<&V>) -> BTreeSet<&'a V> {
        let mut found = BTreeSet::new();
        let mut visited: BTreeSet<&V> = BTreeSet::new();
        let mut stack: Vec<&V> = self
            .edges_back
            .get(version)
            .map(|preds| preds.iter().collect())
            .unwrap_or_default();

        while let Some(candidate) = stack.pop() {
            if !visited.insert(candidate) {
                continue;
            }
            if kept.contains(candidate) {
                found.insert(candidate);
            } else if let Some(preds) = self.edges_back.get(candidate) {
                stack.extend(preds.iter());
            }
        }
        found
    }

    /// Keep versions for which `mapping` or any of `fallback` exists. Tagged
    /// with the mapping name.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::filter`].
    pub fn filter_mapping(
        &self,
        mapping: &dyn ArtifactScheme<V>,
        fallback: &[&dyn ArtifactScheme<V>],
    ) -> Result<Self, GraphError> {
        self.filter(
            |v| mapping.exists(v) || fallback.iter().any(|m| m.exists(v)),
            Some(mapping.name().to_string()),
        )
    }

    /// Keep versions for which `unpick` or any of `fallback` exists.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::filter`].
    pub fn filter_unpick(
        &self,
        unpick: &dyn ArtifactScheme<V>,
        fallback: &[&dyn ArtifactScheme<V>],
    ) -> Result<Self, GraphError> {
        self.filter(
            |v| unpick.exists(v) || fallback.iter().any(|u| u.exists(v)),
            None,
        )
    }

    /// Keep versions on the main branch.
    ///
    /// # Errors
    ///
    /// Propagates walk errors ([`GraphError::AmbiguousBranchSelection`]) and
    /// see [`VersionGraph::filter`].
    pub fn filter_mainline_versions(&self) -> Result<Self, GraphError> {
        let mut on_main = BTreeSet::new();
        for version in self.iter() {
            if self.is_on_main_branch(version)? {
                on_main.insert(version);
            }
        }
        self.filter(|v| on_main.contains(v), None)
    }

    /// Keep versions at or after `version`.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::filter`].
    pub fn filter_min_version(&self, version: &V) -> Result<Self, GraphError> {
        self.filter(
            |v| v >= version,
            Some(format!("min-{}", version.launcher_friendly_version_name())),
        )
    }

    /// Keep versions at or before `version`.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::filter`].
    pub fn filter_max_version(&self, version: &V) -> Result<Self, GraphError> {
        self.filter(
            |v| v <= version,
            Some(format!("max-{}", version.launcher_friendly_version_name())),
        )
    }

    /// Keep exactly `versions`, tagged with their names in order.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::filter`].
    pub fn filter_only_versions(&self, versions: &[V]) -> Result<Self, GraphError> {
        let only: BTreeSet<&V> = versions.iter().collect();
        let tag = (!only.is_empty()).then(|| joined_names(&only));
        self.filter(|v| only.contains(v), tag)
    }

    /// Drop `versions`. An empty list returns an unchanged copy.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::filter`].
    pub fn filter_exclude_versions(&self, versions: &[V]) -> Result<Self, GraphError> {
        let excluded: BTreeSet<&V> = versions.iter().collect();
        if excluded.is_empty() {
            return Ok(self.clone());
        }
        let tag = format!("exclude-{}", joined_names(&excluded));
        self.filter(|v| !excluded.contains(v), Some(tag))
    }

    /// Keep releases that are neither snapshots nor pending.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::filter`].
    pub fn filter_stable_releases(&self) -> Result<Self, GraphError> {
        self.filter(|v| !v.is_snapshot_or_pending(), Some("stable".to_string()))
    }

    /// Keep only snapshots and pending releases.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::filter`].
    pub fn filter_snapshots(&self) -> Result<Self, GraphError> {
        self.filter(V::is_snapshot_or_pending, Some("snapshot".to_string()))
    }
}

fn joined_names<V: Version>(versions: &BTreeSet<&V>) -> String {
    versions
        .iter()
        .map(|v| v.launcher_friendly_version_name())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticProvider;
    use crate::runner::TaskRunner;
    use crate::testing::release;
    use crate::version::ReleaseVersion;

    fn chain(ids: &[(&str, &str)]) -> (VersionGraph<ReleaseVersion>, Vec<ReleaseVersion>) {
        let versions: Vec<ReleaseVersion> = ids.iter().map(|(id, s)| release(id, s)).collect();
        let provider = versions
            .iter()
            .fold(StaticProvider::new("test"), |p, v| p.version(v.clone()));
        let graph = VersionGraph::from_metadata(&TaskRunner::sequential(), &provider)
            .expect("valid graph");
        (graph, versions)
    }

    struct Named(&'static str, Vec<&'static str>);

    impl ArtifactScheme<ReleaseVersion> for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn exists(&self, version: &ReleaseVersion) -> bool {
            self.1.contains(&version.id())
        }
    }

    #[test]
    fn removed_versions_are_bridged() {
        let (graph, v) = chain(&[("1.0", "1.0.0"), ("1.1", "1.1.0"), ("1.2", "1.2.0")]);
        let filtered = graph
            .filter(|x| x.id() != "1.1", Some("custom".to_string()))
            .expect("filter");

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.predecessors(&v[2]).expect("known"), &BTreeSet::from([v[0].clone()]));
        assert_eq!(filtered.tags(), ["custom".to_string()]);
        assert_eq!(graph.len(), 3, "source graph is untouched");
    }

    #[test]
    fn min_and_max_tags() {
        let (graph, v) = chain(&[("1.0", "1.0.0"), ("1.1", "1.1.0"), ("1.2", "1.2.0")]);
        let filtered = graph
            .filter_min_version(&v[1])
            .and_then(|g| g.filter_max_version(&v[1]))
            .expect("filter");
        assert_eq!(filtered.iter().collect::<Vec<_>>(), vec![&v[1]]);
        assert_eq!(filtered.tags(), ["min-1.1".to_string(), "max-1.1".to_string()]);
    }

    #[test]
    fn only_and_exclude_tags_are_sorted() {
        let (graph, v) = chain(&[("1.0", "1.0.0"), ("1.1", "1.1.0"), ("1.2", "1.2.0")]);
        let only = graph
            .filter_only_versions(&[v[2].clone(), v[0].clone()])
            .expect("filter");
        assert_eq!(only.tags(), ["1.0-1.2".to_string()]);

        let excluded = graph.filter_exclude_versions(&[v[1].clone()]).expect("filter");
        assert_eq!(excluded.tags(), ["exclude-1.1".to_string()]);
    }

    #[test]
    fn exclude_nothing_is_a_copy() {
        let (graph, _) = chain(&[("1.0", "1.0.0"), ("1.1", "1.1.0")]);
        let same = graph.filter_exclude_versions(&[]).expect("filter");
        assert!(same.tags().is_empty());
        assert_eq!(same.content_hash(), graph.content_hash());
    }

    #[test]
    fn stable_and_snapshot_filters() {
        let (graph, _) = chain(&[
            ("1.0", "1.0.0"),
            ("1.1-pre1", "1.1.0-pre.1"),
            ("1.1", "1.1.0"),
        ]);
        let stable = graph.filter_stable_releases().expect("filter");
        assert_eq!(stable.len(), 2);
        assert_eq!(stable.tags(), ["stable".to_string()]);

        let snapshots = graph.filter_snapshots().expect("filter");
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots.tags(), ["snapshot".to_string()]);
    }

    #[test]
    fn mapping_filter_uses_fallbacks() {
        let (graph, _) = chain(&[("1.0", "1.0.0"), ("1.1", "1.1.0"), ("1.2", "1.2.0")]);
        let primary = Named("yarn", vec!["1.2"]);
        let fallback = Named("calamus", vec!["1.1"]);

        let filtered = graph.filter_mapping(&primary, &[&fallback]).expect("filter");
        let ids: Vec<&str> = filtered.iter().map(ReleaseVersion::id).collect();
        assert_eq!(ids, vec!["1.1", "1.2"]);
        assert_eq!(filtered.tags(), ["yarn".to_string()]);

        let unpicked = graph.filter_unpick(&primary, &[]).expect("filter");
        assert_eq!(unpicked.len(), 1);
        assert!(unpicked.tags().is_empty());
    }

    #[test]
    fn unrelated_survivors_become_separate_roots() {
        // 1.0 → {a, b}: keeping only the two siblings splits the history.
        let root = release("1.0", "1.0.0");
        let a = release("a", "1.1.0-a");
        let b = release("b", "1.1.0-b");
        let provider = StaticProvider::new("test")
            .version(root)
            .side_version(a.clone())
            .side_version(b.clone());
        let graph = VersionGraph::from_metadata(&TaskRunner::sequential(), &provider)
            .expect("valid graph");

        let snapshots = graph.filter_snapshots().expect("split history");
        assert_eq!(snapshots.roots(), &BTreeSet::from([a.clone(), b.clone()]));
        assert_eq!(snapshots.tips(), &BTreeSet::from([a, b]));
        assert_eq!(snapshots.edge_count(), 0);
    }

    #[test]
    fn min_bound_on_unmerged_side_branch() {
        // 1.0 → 1.1 on the main line, 1.0 → exp never merges back.
        let v1_0 = release("1.0", "1.0.0");
        let exp = release("exp", "1.0.5-exp.1");
        let v1_1 = release("1.1", "1.1.0");
        let provider = StaticProvider::new("test")
            .version(v1_0.clone())
            .side_version(exp.clone())
            .version(v1_1.clone());
        let graph = VersionGraph::from_metadata(&TaskRunner::sequential(), &provider)
            .expect("valid graph");
        assert_eq!(graph.roots(), &BTreeSet::from([v1_0.clone()]));

        let bounded = graph.filter_min_version(&exp).expect("split history");
        assert!(!bounded.contains(&v1_0));
        assert_eq!(bounded.roots(), &BTreeSet::from([exp.clone(), v1_1.clone()]));
        assert_eq!(bounded.path_to_tip(&v1_1), Some(0));
        assert!(!bounded.is_mainline(&exp));
        assert_eq!(bounded.tags(), ["min-exp".to_string()]);
    }

    #[test]
    fn filtering_everything_leaves_no_root() {
        let (graph, _) = chain(&[("1.0", "1.0.0")]);
        let empty = graph.filter(|_| false, None).expect("filter");
        assert!(empty.is_empty());
        assert_eq!(empty.main_root_version(), Err(GraphError::EmptyRoot));
    }
}
