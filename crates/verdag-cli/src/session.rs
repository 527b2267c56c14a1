//! Manifest → graph → filtered graph, as configured.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};
use verdag_core::{
    ArtifactScheme, GraphError, ReleaseVersion, RepoFlavours, TaskRunner, VersionGraph,
};

use crate::config::{Config, FilterConfig, FlavourConfig};
use crate::manifest::{ArtifactKind, ManifestProvider};

/// Everything a command needs: the provider, the full graph and the graph
/// after the configured filters.
pub struct Session {
    pub provider: ManifestProvider,
    pub full: VersionGraph<ReleaseVersion>,
    pub graph: VersionGraph<ReleaseVersion>,
    pub flavours: RepoFlavours,
}

impl Session {
    /// Load the manifest at `manifest` and apply `config`.
    ///
    /// # Errors
    ///
    /// Manifest failures, structural graph errors, and filters naming
    /// versions that are not in the manifest.
    #[instrument(skip(config))]
    pub fn open(manifest: &Path, config: &Config) -> Result<Self> {
        let runner = config
            .manifest
            .workers
            .map_or_else(TaskRunner::available, TaskRunner::parallel);
        let provider = ManifestProvider::open(manifest)
            .with_context(|| format!("failed to open manifest {}", manifest.display()))?;

        let full = VersionGraph::from_metadata(&runner, &provider)?;
        let graph = apply_filters(&full, &provider, &config.filters, &config.flavours)?;
        info!(
            versions = full.len(),
            kept = graph.len(),
            tags = ?graph.tags(),
            "graph configured"
        );

        Ok(Self {
            provider,
            full,
            graph,
            flavours: config.flavours.repo_flavours(),
        })
    }

    /// Look a version up by launcher name in the configured graph.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownVersion`] if no version has that name.
    pub fn version(&self, name: &str) -> Result<&ReleaseVersion, GraphError> {
        lookup(&self.graph, name)
    }
}

/// The manifest path from the flag, else from config relative to the
/// project root.
pub fn manifest_path(flag: Option<&Path>, config: &Config, project_root: &Path) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| config.manifest.path.as_ref().map(|p| project_root.join(p)))
}

fn lookup<'g>(
    graph: &'g VersionGraph<ReleaseVersion>,
    name: &str,
) -> Result<&'g ReleaseVersion, GraphError> {
    graph
        .version_by_name(name)
        .ok_or_else(|| GraphError::UnknownVersion {
            version: name.to_string(),
        })
}

fn lookup_all(
    graph: &VersionGraph<ReleaseVersion>,
    names: &[String],
) -> Result<Vec<ReleaseVersion>, GraphError> {
    names
        .iter()
        .map(|name| lookup(graph, name).cloned())
        .collect()
}

/// Apply the configured filters in a fixed order: artifact availability,
/// bounds, explicit sets, then release kind.
fn apply_filters(
    full: &VersionGraph<ReleaseVersion>,
    provider: &ManifestProvider,
    filters: &FilterConfig,
    flavours: &FlavourConfig,
) -> Result<VersionGraph<ReleaseVersion>, GraphError> {
    let mut graph = full.clone();

    if provider.declares(ArtifactKind::Mappings) {
        let mapping = provider.scheme(ArtifactKind::Mappings, &flavours.mapping);
        let fallback: Vec<_> = flavours
            .mapping_fallback
            .iter()
            .map(|name| provider.scheme(ArtifactKind::Mappings, name))
            .collect();
        let fallback: Vec<&dyn ArtifactScheme<ReleaseVersion>> =
            fallback.iter().map(|s| s as &dyn ArtifactScheme<ReleaseVersion>).collect();
        graph = graph.filter_mapping(&mapping, &fallback)?;
    } else {
        debug!("manifest lists no mappings, skipping availability filter");
    }

    if let Some(unpick) = &flavours.unpick {
        let primary = provider.scheme(ArtifactKind::Unpick, unpick);
        let fallback: Vec<_> = flavours
            .unpick_fallback
            .iter()
            .map(|name| provider.scheme(ArtifactKind::Unpick, name))
            .collect();
        let fallback: Vec<&dyn ArtifactScheme<ReleaseVersion>> =
            fallback.iter().map(|s| s as &dyn ArtifactScheme<ReleaseVersion>).collect();
        graph = graph.filter_unpick(&primary, &fallback)?;
    }

    if let Some(min) = &filters.min_version {
        let bound = lookup(full, min)?.clone();
        graph = graph.filter_min_version(&bound)?;
    }
    if let Some(max) = &filters.max_version {
        let bound = lookup(full, max)?.clone();
        graph = graph.filter_max_version(&bound)?;
    }
    if !filters.only_versions.is_empty() {
        graph = graph.filter_only_versions(&lookup_all(full, &filters.only_versions)?)?;
    }
    if !filters.exclude_versions.is_empty() {
        graph = graph.filter_exclude_versions(&lookup_all(full, &filters.exclude_versions)?)?;
    }
    if filters.only_mainline {
        graph = graph.filter_mainline_versions()?;
    }
    if filters.only_stable {
        graph = graph.filter_stable_releases()?;
    }
    if filters.only_snapshots {
        graph = graph.filter_snapshots()?;
    }
    Ok(graph)
}
