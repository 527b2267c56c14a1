//! The vertex capability consumed by the graph, plus a concrete release type.
//!
//! The graph never inspects a version beyond the [`Version`] trait: a total
//! order, a side-compatibility predicate, a pre-release flag and a few names.
//! [`ReleaseVersion`] is the implementation used by the CLI and the tests.

use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};

/// A totally ordered release entity that can be placed in a version graph.
pub trait Version: Ord + Clone + Debug + Send + Sync {
    /// Whether both versions publish at least one comparable distribution
    /// artifact. A direct ancestry edge is only valid between versions that
    /// share a side.
    fn has_side_in_common(&self, other: &Self) -> bool;

    /// Whether this is a snapshot, pre-release or otherwise pending version.
    fn is_snapshot_or_pending(&self) -> bool;

    /// Short name as shown by launchers, used in filter tags and lookups.
    fn launcher_friendly_version_name(&self) -> &str;

    /// Name used in diagnostics.
    fn friendly_version(&self) -> String;

    /// Normalized semantic form, used in lookups.
    fn semantic_version(&self) -> String;
}

// ---------------------------------------------------------------------------
// ReleaseVersion
// ---------------------------------------------------------------------------

/// A release described by an id, a normalized semantic version and the
/// sides (client/server) it ships.
///
/// Ordering and identity are `(semantic, id)`; side flags and display data
/// do not participate.
#[derive(Clone)]
pub struct ReleaseVersion {
    id: String,
    semantic: semver::Version,
    display: Option<String>,
    release_time: Option<DateTime<Utc>>,
    client: bool,
    server: bool,
}

impl ReleaseVersion {
    /// Create a release that ships both a client and a server.
    #[must_use]
    pub fn new(id: impl Into<String>, semantic: semver::Version) -> Self {
        Self {
            id: id.into(),
            semantic,
            display: None,
            release_time: None,
            client: true,
            server: true,
        }
    }

    /// Parse the normalized semantic version and create a release.
    ///
    /// # Errors
    ///
    /// Returns an error if `semantic` is not a valid semantic version.
    pub fn parse(id: impl Into<String>, semantic: &str) -> Result<Self, semver::Error> {
        Ok(Self::new(id, semver::Version::parse(semantic)?))
    }

    #[must_use]
    pub fn with_sides(mut self, client: bool, server: bool) -> Self {
        self.client = client;
        self.server = server;
        self
    }

    #[must_use]
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    #[must_use]
    pub fn with_release_time(mut self, release_time: DateTime<Utc>) -> Self {
        self.release_time = Some(release_time);
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn semantic(&self) -> &semver::Version {
        &self.semantic
    }

    #[must_use]
    pub const fn release_time(&self) -> Option<DateTime<Utc>> {
        self.release_time
    }

    #[must_use]
    pub const fn has_client(&self) -> bool {
        self.client
    }

    #[must_use]
    pub const fn has_server(&self) -> bool {
        self.server
    }
}

impl Version for ReleaseVersion {
    fn has_side_in_common(&self, other: &Self) -> bool {
        (self.client && other.client) || (self.server && other.server)
    }

    fn is_snapshot_or_pending(&self) -> bool {
        !self.semantic.pre.is_empty()
    }

    fn launcher_friendly_version_name(&self) -> &str {
        &self.id
    }

    fn friendly_version(&self) -> String {
        self.display.clone().unwrap_or_else(|| self.id.clone())
    }

    fn semantic_version(&self) -> String {
        self.semantic.to_string()
    }
}

impl PartialEq for ReleaseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReleaseVersion {}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.semantic
            .cmp(&other.semantic)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl Hash for ReleaseVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.semantic.hash(state);
        self.id.hash(state);
    }
}

impl Debug for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(id: &str, semantic: &str) -> ReleaseVersion {
        ReleaseVersion::parse(id, semantic).expect("valid semver")
    }

    #[test]
    fn ordering_follows_semantic_version_not_id() {
        let a = release("b1.7", "0.1.7");
        let b = release("a1.8", "0.1.8");
        assert!(a < b);
    }

    #[test]
    fn prerelease_sorts_before_release() {
        let snapshot = release("1.2-pre1", "1.2.0-pre.1");
        let stable = release("1.2", "1.2.0");
        assert!(snapshot < stable);
        assert!(snapshot.is_snapshot_or_pending());
        assert!(!stable.is_snapshot_or_pending());
    }

    #[test]
    fn identity_ignores_side_flags() {
        let a = release("1.0", "1.0.0");
        let b = release("1.0", "1.0.0").with_sides(true, false);
        assert_eq!(a, b);
    }

    #[test]
    fn sides_in_common() {
        let client = release("c", "1.0.0").with_sides(true, false);
        let server = release("s", "1.1.0").with_sides(false, true);
        let both = release("b", "1.2.0");
        assert!(!client.has_side_in_common(&server));
        assert!(client.has_side_in_common(&both));
        assert!(server.has_side_in_common(&both));
    }

    #[test]
    fn friendly_version_prefers_display_name() {
        let v = release("rd-132211", "0.0.0-rd.132211").with_display("Pre-Classic rd-132211");
        assert_eq!(v.friendly_version(), "Pre-Classic rd-132211");
        assert_eq!(v.launcher_friendly_version_name(), "rd-132211");
        assert_eq!(v.semantic_version(), "0.0.0-rd.132211");
    }
}
