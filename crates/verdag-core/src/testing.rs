//! Shared fixtures for unit tests.

use crate::version::{ReleaseVersion, Version};

// u32 stands in for a version in low-level edge-map tests.
impl Version for u32 {
    fn has_side_in_common(&self, _other: &Self) -> bool {
        true
    }

    fn is_snapshot_or_pending(&self) -> bool {
        false
    }

    fn launcher_friendly_version_name(&self) -> &str {
        "n"
    }

    fn friendly_version(&self) -> String {
        self.to_string()
    }

    fn semantic_version(&self) -> String {
        self.to_string()
    }
}

/// A release shipping both sides.
pub fn release(id: &str, semantic: &str) -> ReleaseVersion {
    ReleaseVersion::parse(id, semantic).expect("valid semver")
}

pub fn client_only(id: &str, semantic: &str) -> ReleaseVersion {
    release(id, semantic).with_sides(true, false)
}

pub fn server_only(id: &str, semantic: &str) -> ReleaseVersion {
    release(id, semantic).with_sides(false, true)
}
