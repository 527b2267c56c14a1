//! Repo tags identifier.
//!
//! One deterministic string naming a fully configured derived graph. It is
//! built from the active mapping scheme, the tags carried by the graph's
//! filters and the auxiliary transform flavours, in a fixed order:
//!
//! ```text
//! <mapping>[-fallback-<a>-<b>][-<filter tags>][-lvt][-sig_<x>][-nests_<x>][-exc_<x>][-preened]
//! ```

use crate::graph::VersionGraph;
use crate::version::Version;

const SEPARATOR: &str = "-";

/// The orthogonal flavours that shape derived artifacts.
///
/// `None` / `false` means "default"; defaults contribute nothing to the
/// identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepoFlavours {
    pub mapping: String,
    pub mapping_fallback: Vec<String>,
    pub patch_lvt: bool,
    pub signatures: Option<String>,
    pub nests: Option<String>,
    pub exceptions: Option<String>,
    pub preening: bool,
}

impl RepoFlavours {
    #[must_use]
    pub fn new(mapping: impl Into<String>) -> Self {
        Self {
            mapping: mapping.into(),
            ..Self::default()
        }
    }
}

impl<V: Version> VersionGraph<V> {
    /// The repo tags identifier for this graph under `flavours`.
    #[must_use]
    pub fn repo_tags_identifier(&self, flavours: &RepoFlavours) -> String {
        let mut parts: Vec<String> = vec![flavours.mapping.clone()];

        if !flavours.mapping_fallback.is_empty() {
            parts.push(format!("fallback-{}", flavours.mapping_fallback.join(SEPARATOR)));
        }

        // The mapping filter tags itself with the mapping name.
        parts.extend(
            self.tags()
                .iter()
                .filter(|tag| **tag != flavours.mapping)
                .cloned(),
        );

        if flavours.patch_lvt {
            parts.push("lvt".to_string());
        }
        if let Some(signatures) = non_default(flavours.signatures.as_deref()) {
            parts.push(format!("sig_{signatures}"));
        }
        if let Some(nests) = non_default(flavours.nests.as_deref()) {
            parts.push(format!("nests_{nests}"));
        }
        if let Some(exceptions) = non_default(flavours.exceptions.as_deref()) {
            parts.push(format!("exc_{exceptions}"));
        }
        if flavours.preening {
            parts.push("preened".to_string());
        }

        parts.join(SEPARATOR)
    }
}

/// `"none"` spells the default scheme in config files.
fn non_default(scheme: Option<&str>) -> Option<&str> {
    scheme.filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none"))
}
