//! Local version manifests.
//!
//! A manifest is either a single JSON document
//!
//! ```json
//! { "source": "primary", "name": "mojang", "versions": [ { "id": "1.0", ... } ] }
//! ```
//!
//! or a directory holding one JSON version record per file, in which case the
//! directory name is the provider name and the source is primary.
//!
//! Version records are converted (or, for directories, read and parsed) on
//! the caller's [`TaskRunner`].

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument};
use verdag_core::{
    ArtifactScheme, GraphError, ManifestSource, MetadataProvider, ReleaseVersion, TaskRunner,
};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("version {id} has an invalid normalized version `{normalized}`")]
    InvalidVersion {
        id: String,
        normalized: String,
        source: semver::Error,
    },
    #[error("version id {id} appears more than once")]
    DuplicateId { id: String },
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Primary,
    Alternate,
}

impl From<SourceKind> for ManifestSource {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Primary => Self::Primary,
            SourceKind::Alternate => Self::Alternate,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ManifestDocument {
    #[serde(default)]
    source: SourceKind,
    name: String,
    #[serde(default)]
    versions: Vec<VersionRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionRecord {
    pub id: String,
    #[serde(alias = "normalizedVersion")]
    pub normalized_version: String,
    #[serde(default, alias = "displayVersion")]
    pub display_version: Option<String>,
    #[serde(default, alias = "releaseTime")]
    pub release_time: Option<DateTime<Utc>>,
    /// Explicit parent ids; absent means "use the semantic order".
    #[serde(default)]
    pub previous: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub client: bool,
    #[serde(default = "default_true")]
    pub server: bool,
    #[serde(default = "default_true")]
    pub mainline: bool,
    #[serde(default)]
    pub mappings: Vec<String>,
    #[serde(default)]
    pub unpick: Vec<String>,
}

const fn default_true() -> bool {
    true
}

impl VersionRecord {
    fn to_version(&self) -> Result<ReleaseVersion, ManifestError> {
        let semantic = semver::Version::parse(&self.normalized_version).map_err(|source| {
            ManifestError::InvalidVersion {
                id: self.id.clone(),
                normalized: self.normalized_version.clone(),
                source,
            }
        })?;
        let mut version =
            ReleaseVersion::new(self.id.clone(), semantic).with_sides(self.client, self.server);
        if let Some(display) = &self.display_version {
            version = version.with_display(display.clone());
        }
        if let Some(time) = self.release_time {
            version = version.with_release_time(time);
        }
        Ok(version)
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

enum Layout {
    Document(Vec<VersionRecord>),
    Directory(Vec<PathBuf>),
}

#[derive(Debug, Default)]
struct Index {
    by_id: BTreeMap<String, ReleaseVersion>,
    previous: BTreeMap<String, Vec<String>>,
    off_mainline: BTreeSet<String>,
    /// artifact kind → scheme name → version ids
    artifacts: BTreeMap<ArtifactKind, BTreeMap<String, BTreeSet<String>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ArtifactKind {
    Mappings,
    Unpick,
}

/// A [`MetadataProvider`] over a local manifest file or directory.
pub struct ManifestProvider {
    name: String,
    source: ManifestSource,
    location: PathBuf,
    layout: Layout,
    index: OnceLock<Index>,
}

impl ManifestProvider {
    /// Open a manifest file or directory. Version records are not converted
    /// until [`MetadataProvider::versions`] runs.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if the path cannot be read or the document
    /// is not a manifest.
    pub fn open(path: &Path) -> Result<Self, ManifestError> {
        let read_err = |source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        };

        if path.is_dir() {
            let mut files = Vec::new();
            for entry in fs::read_dir(path).map_err(read_err)? {
                let file = entry.map_err(read_err)?.path();
                if file.extension().is_some_and(|ext| ext == "json") {
                    files.push(file);
                }
            }
            files.sort();
            let name = path
                .file_name()
                .map_or_else(|| "manifest".to_string(), |n| n.to_string_lossy().into_owned());
            return Ok(Self {
                name,
                source: ManifestSource::Primary,
                location: path.to_path_buf(),
                layout: Layout::Directory(files),
                index: OnceLock::new(),
            });
        }

        let content = fs::read_to_string(path).map_err(read_err)?;
        let document: ManifestDocument =
            serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            name: document.name,
            source: document.source.into(),
            location: path.to_path_buf(),
            layout: Layout::Document(document.versions),
            index: OnceLock::new(),
        })
    }

    /// Whether any version lists an artifact of `kind`. Only meaningful
    /// after [`MetadataProvider::versions`].
    pub fn declares(&self, kind: ArtifactKind) -> bool {
        self.index()
            .is_some_and(|index| index.artifacts.contains_key(&kind))
    }

    /// Availability of a mapping or unpick scheme, for the graph filters.
    pub fn scheme(&self, kind: ArtifactKind, name: &str) -> SchemeAvailability<'_> {
        SchemeAvailability {
            provider: self,
            kind,
            name: name.to_string(),
        }
    }

    fn load_records(&self, runner: &TaskRunner) -> Result<Vec<VersionRecord>> {
        match &self.layout {
            Layout::Document(records) => Ok(records.clone()),
            Layout::Directory(files) => runner
                .map(files.clone(), |file| read_record(&file))
                .into_iter()
                .collect::<Result<Vec<_>, _>>()
                .map_err(Into::into),
        }
    }

    fn build_index(&self, runner: &TaskRunner, records: &[VersionRecord]) -> Result<Index> {
        let versions = runner.map(records.iter().collect(), VersionRecord::to_version);

        let mut index = Index::default();
        for (record, version) in records.iter().zip(versions) {
            let version = version?;
            if index.by_id.insert(record.id.clone(), version).is_some() {
                return Err(ManifestError::DuplicateId {
                    id: record.id.clone(),
                }
                .into());
            }
            if let Some(previous) = &record.previous {
                index.previous.insert(record.id.clone(), previous.clone());
            }
            if !record.mainline {
                index.off_mainline.insert(record.id.clone());
            }
            for (kind, schemes) in [
                (ArtifactKind::Mappings, &record.mappings),
                (ArtifactKind::Unpick, &record.unpick),
            ] {
                for scheme in schemes {
                    index
                        .artifacts
                        .entry(kind)
                        .or_default()
                        .entry(scheme.clone())
                        .or_default()
                        .insert(record.id.clone());
                }
            }
        }

        for (id, previous) in &index.previous {
            if let Some(missing) = previous.iter().find(|p| !index.by_id.contains_key(*p)) {
                let version = index
                    .by_id
                    .get(id)
                    .map_or_else(|| id.clone(), verdag_core::Version::friendly_version);
                return Err(GraphError::UnknownParent {
                    version,
                    parent: missing.clone(),
                }
                .into());
            }
        }
        Ok(index)
    }

    fn index(&self) -> Option<&Index> {
        self.index.get()
    }
}

fn read_record(path: &Path) -> Result<VersionRecord, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl MetadataProvider<ReleaseVersion> for ManifestProvider {
    #[instrument(skip_all, fields(manifest = %self.location.display(), workers = runner.workers()))]
    fn versions(&self, runner: &TaskRunner) -> Result<BTreeMap<String, ReleaseVersion>> {
        let index = match self.index.get() {
            Some(index) => index,
            None => {
                let records = self.load_records(runner)?;
                debug!(records = records.len(), "version records loaded");
                let built = self
                    .build_index(runner, &records)
                    .with_context(|| format!("invalid manifest {}", self.location.display()))?;
                self.index.get_or_init(|| built)
            }
        };
        info!(versions = index.by_id.len(), "manifest ready");
        Ok(index.by_id.clone())
    }

    fn parent_versions(&self, version: &ReleaseVersion) -> Option<Vec<ReleaseVersion>> {
        let index = self.index()?;
        let previous = index.previous.get(version.id())?;
        Some(
            previous
                .iter()
                .filter_map(|id| index.by_id.get(id).cloned())
                .collect(),
        )
    }

    fn should_exclude_from_main_branch(&self, version: &ReleaseVersion) -> bool {
        self.index()
            .is_some_and(|index| index.off_mainline.contains(version.id()))
    }

    fn source(&self) -> ManifestSource {
        self.source
    }

    fn internal_name(&self) -> &str {
        &self.name
    }
}

/// Whether the manifest lists a named artifact for a version.
pub struct SchemeAvailability<'a> {
    provider: &'a ManifestProvider,
    kind: ArtifactKind,
    name: String,
}

impl ArtifactScheme<ReleaseVersion> for SchemeAvailability<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn exists(&self, version: &ReleaseVersion) -> bool {
        self.provider
            .index()
            .and_then(|index| index.artifacts.get(&self.kind))
            .and_then(|schemes| schemes.get(&self.name))
            .is_some_and(|ids| ids.contains(version.id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use verdag_core::Version;

    fn write_manifest(dir: &Path, value: &serde_json::Value) -> PathBuf {
        let path = dir.join("manifest.json");
        fs::write(&path, serde_json::to_string_pretty(value).expect("json")).expect("write");
        path
    }

    fn sample() -> serde_json::Value {
        json!({
            "source": "alternate",
            "name": "omniarchive",
            "versions": [
                { "id": "1.0", "normalized_version": "1.0.0", "mappings": ["mojmap"] },
                { "id": "1.1", "normalizedVersion": "1.1.0", "displayVersion": "Release 1.1",
                  "release_time": "2011-11-18T00:00:00Z", "mappings": ["mojmap", "yarn"] },
                { "id": "1.1-exp", "normalized_version": "1.1.1-exp.1", "mainline": false,
                  "client": true, "server": false, "unpick": ["yarn"] },
                { "id": "1.2", "normalized_version": "1.2.0", "previous": ["1.1", "1.1-exp"] }
            ]
        })
    }

    #[test]
    fn document_manifest_loads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let provider = ManifestProvider::open(&write_manifest(dir.path(), &sample())).expect("open");
        assert_eq!(provider.internal_name(), "omniarchive");
        assert_eq!(provider.source(), ManifestSource::Alternate);

        let versions = provider.versions(&TaskRunner::parallel(2)).expect("versions");
        assert_eq!(versions.len(), 4);
        assert_eq!(versions["1.1"].friendly_version(), "Release 1.1");
        assert!(versions["1.1"].release_time().is_some());
        assert!(!versions["1.1-exp"].has_server());

        assert!(provider.should_exclude_from_main_branch(&versions["1.1-exp"]));
        assert_eq!(
            provider.parent_versions(&versions["1.2"]),
            Some(vec![versions["1.1"].clone(), versions["1.1-exp"].clone()])
        );
        assert_eq!(provider.parent_versions(&versions["1.1"]), None);
    }

    #[test]
    fn schemes_follow_the_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let provider = ManifestProvider::open(&write_manifest(dir.path(), &sample())).expect("open");
        let versions = provider.versions(&TaskRunner::sequential()).expect("versions");

        let yarn = provider.scheme(ArtifactKind::Mappings, "yarn");
        assert!(yarn.exists(&versions["1.1"]));
        assert!(!yarn.exists(&versions["1.0"]));
        let unpick = provider.scheme(ArtifactKind::Unpick, "yarn");
        assert!(unpick.exists(&versions["1.1-exp"]));
        assert!(!unpick.exists(&versions["1.1"]));
    }

    #[test]
    fn directory_manifest_loads_in_parallel() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("mojang");
        fs::create_dir(&root).expect("mkdir");
        for (id, semantic) in [("a", "1.0.0"), ("b", "1.1.0"), ("c", "1.2.0")] {
            let record = json!({ "id": id, "normalized_version": semantic });
            fs::write(root.join(format!("{id}.json")), record.to_string()).expect("write");
        }
        fs::write(root.join("README.txt"), "ignored").expect("write");

        let provider = ManifestProvider::open(&root).expect("open");
        assert_eq!(provider.internal_name(), "mojang");
        let versions = provider.versions(&TaskRunner::parallel(3)).expect("versions");
        assert_eq!(versions.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn invalid_semver_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = json!({ "name": "bad", "versions": [ { "id": "x", "normalized_version": "one" } ] });
        let provider = ManifestProvider::open(&write_manifest(dir.path(), &manifest)).expect("open");
        let err = provider.versions(&TaskRunner::sequential()).expect_err("bad semver");
        assert!(format!("{err:#}").contains("invalid normalized version"));
    }

    #[test]
    fn unknown_previous_is_a_graph_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = json!({ "name": "bad", "versions": [
            { "id": "x", "normalized_version": "1.0.0", "previous": ["ghost"] }
        ] });
        let provider = ManifestProvider::open(&write_manifest(dir.path(), &manifest)).expect("open");
        let err = provider.versions(&TaskRunner::sequential()).expect_err("unknown parent");
        assert_eq!(
            err.downcast_ref::<GraphError>(),
            Some(&GraphError::UnknownParent {
                version: "x".to_string(),
                parent: "ghost".to_string()
            })
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = json!({ "name": "dup", "versions": [
            { "id": "x", "normalized_version": "1.0.0" },
            { "id": "x", "normalized_version": "1.0.1" }
        ] });
        let provider = ManifestProvider::open(&write_manifest(dir.path(), &manifest)).expect("open");
        let err = provider.versions(&TaskRunner::sequential()).expect_err("duplicate");
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::DuplicateId { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ManifestProvider::open(&dir.path().join("nope.json")).err().expect("missing");
        assert!(matches!(err, ManifestError::Read { .. }));
    }
}
