//! Layered `verdag.toml` configuration.
//!
//! Precedence (highest wins):
//! 1. command-line flags (applied by the caller)
//! 2. project config: `verdag.toml` in the working directory
//! 3. user config: `<config_dir>/verdag/config.toml`
//! 4. built-in defaults
//!
//! Project and user files are merged key by key, so a project file only has
//! to mention what it changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use verdag_core::RepoFlavours;

pub const PROJECT_CONFIG: &str = "verdag.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub manifest: ManifestConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub flavours: FlavourConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Parse workers; unset means available parallelism.
    #[serde(default)]
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub min_version: Option<String>,
    #[serde(default)]
    pub max_version: Option<String>,
    #[serde(default)]
    pub only_versions: Vec<String>,
    #[serde(default)]
    pub exclude_versions: Vec<String>,
    #[serde(default)]
    pub only_stable: bool,
    #[serde(default)]
    pub only_snapshots: bool,
    #[serde(default)]
    pub only_mainline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavourConfig {
    #[serde(default = "default_mapping")]
    pub mapping: String,
    #[serde(default)]
    pub mapping_fallback: Vec<String>,
    #[serde(default)]
    pub unpick: Option<String>,
    #[serde(default)]
    pub unpick_fallback: Vec<String>,
    #[serde(default)]
    pub patch_lvt: bool,
    #[serde(default)]
    pub signatures: Option<String>,
    #[serde(default)]
    pub nests: Option<String>,
    #[serde(default)]
    pub exceptions: Option<String>,
    #[serde(default)]
    pub preening: bool,
}

impl Default for FlavourConfig {
    fn default() -> Self {
        Self {
            mapping: default_mapping(),
            mapping_fallback: Vec::new(),
            unpick: None,
            unpick_fallback: Vec::new(),
            patch_lvt: false,
            signatures: None,
            nests: None,
            exceptions: None,
            preening: false,
        }
    }
}

impl FlavourConfig {
    pub fn repo_flavours(&self) -> RepoFlavours {
        RepoFlavours {
            mapping: self.mapping.clone(),
            mapping_fallback: self.mapping_fallback.clone(),
            patch_lvt: self.patch_lvt,
            signatures: self.signatures.clone(),
            nests: self.nests.clone(),
            exceptions: self.exceptions.clone(),
            preening: self.preening,
        }
    }
}

fn default_mapping() -> String {
    "mojmap".to_string()
}

/// Load and merge the user and project config files.
///
/// # Errors
///
/// Returns [`ConfigError`] if an existing file cannot be read or parsed.
pub fn resolve_config(project_root: &Path) -> Result<Config, ConfigError> {
    let user = dirs::config_dir().map(|dir| dir.join("verdag/config.toml"));
    load_layers(user.as_deref(), &project_root.join(PROJECT_CONFIG))
}

fn load_layers(user: Option<&Path>, project: &Path) -> Result<Config, ConfigError> {
    let mut merged = toml::Table::new();
    for path in user.into_iter().chain(std::iter::once(project)) {
        if let Some(layer) = read_table(path)? {
            merge_tables(&mut merged, layer);
        }
    }

    Config::deserialize(toml::Value::Table(merged)).map_err(|source| ConfigError::Parse {
        path: project.to_path_buf(),
        source,
    })
}

fn read_table(path: &Path) -> Result<Option<toml::Table>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Overlay `top` onto `base`, recursing into nested tables.
fn merge_tables(base: &mut toml::Table, top: toml::Table) {
    for (key, value) in top {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
