//! The metadata capability the graph builder consumes.
//!
//! A [`MetadataProvider`] hands over the full version set and, optionally,
//! explicit parent hints and mainline exclusions. Fetching and parsing the
//! underlying manifests is the provider's business; its errors are passed
//! through untouched.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;

use crate::runner::TaskRunner;
use crate::version::Version;

/// Where a provider's manifest comes from.
///
/// Graphs built from an [`ManifestSource::Alternate`] source carry a
/// `manifest_<name>` tag so derived artifacts never collide with those of
/// the primary source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ManifestSource {
    #[default]
    Primary,
    Alternate,
}

/// Supplies versions and ancestry hints to the graph builder.
pub trait MetadataProvider<V: Version> {
    /// All known versions keyed by id. May fan work out on `runner`; must
    /// not return before that work has finished.
    ///
    /// # Errors
    ///
    /// Any retrieval or parse failure of the underlying manifest.
    fn versions(&self, runner: &TaskRunner) -> Result<BTreeMap<String, V>>;

    /// Explicit, ordered parent candidates for `version`, or `None` when the
    /// manifest gives no hint and the semantic order should be used.
    fn parent_versions(&self, version: &V) -> Option<Vec<V>>;

    /// Whether `version` is kept off the main line (side branches).
    fn should_exclude_from_main_branch(&self, version: &V) -> bool;

    fn source(&self) -> ManifestSource;

    fn internal_name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// StaticProvider
// ---------------------------------------------------------------------------

/// A provider over metadata that is already resolved in memory.
#[derive(Debug, Clone)]
pub struct StaticProvider<V: Version> {
    name: String,
    source: ManifestSource,
    versions: BTreeSet<V>,
    parents: BTreeMap<V, Vec<V>>,
    excluded: BTreeSet<V>,
}

impl<V: Version> StaticProvider<V> {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: ManifestSource::Primary,
            versions: BTreeSet::new(),
            parents: BTreeMap::new(),
            excluded: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: ManifestSource) -> Self {
        self.source = source;
        self
    }

    /// Add a version that follows the semantic order.
    #[must_use]
    pub fn version(mut self, version: V) -> Self {
        self.versions.insert(version);
        self
    }

    /// Add a version with explicit parent candidates.
    #[must_use]
    pub fn version_with_parents(mut self, version: V, parents: Vec<V>) -> Self {
        self.versions.insert(version.clone());
        self.parents.insert(version, parents);
        self
    }

    /// Add a version that is kept off the main line.
    #[must_use]
    pub fn side_version(mut self, version: V) -> Self {
        self.versions.insert(version.clone());
        self.excluded.insert(version);
        self
    }

    /// Mark an already added version as off the main line.
    #[must_use]
    pub fn exclude_from_main_branch(mut self, version: V) -> Self {
        self.excluded.insert(version);
        self
    }

    /// Attach parent hints to an already added version.
    #[must_use]
    pub fn parents(mut self, version: V, parents: Vec<V>) -> Self {
        self.parents.insert(version, parents);
        self
    }
}

impl<V: Version> MetadataProvider<V> for StaticProvider<V> {
    fn versions(&self, _runner: &TaskRunner) -> Result<BTreeMap<String, V>> {
        Ok(self
            .versions
            .iter()
            .map(|v| (v.launcher_friendly_version_name().to_string(), v.clone()))
            .collect())
    }

    fn parent_versions(&self, version: &V) -> Option<Vec<V>> {
        self.parents.get(version).cloned()
    }

    fn should_exclude_from_main_branch(&self, version: &V) -> bool {
        self.excluded.contains(version)
    }

    fn source(&self) -> ManifestSource {
        self.source
    }

    fn internal_name(&self) -> &str {
        &self.name
    }
}
