//! Directional walks over the version graph.
//!
//! All eight walks are one state machine parameterized by a direction and a
//! [`WalkPolicy`]:
//!
//! | walk                          | direction | extreme | stop_on_merge |
//! |-------------------------------|-----------|---------|---------------|
//! | `walk_back_to_root`           | back      | yes     | no            |
//! | `walk_back_to_mainline_root`  | back      | yes     | yes           |
//! | `walk_back_to_branch_point`   | back      | no      | no            |
//! | `walk_back_to_first_branch_point` | back  | no      | yes           |
//! | `walk_forward_to_tip`         | forward   | yes     | no            |
//! | `walk_forward_to_mainline_tip`| forward   | yes     | yes           |
//! | `walk_forward_to_merge_point` | forward   | no      | no            |
//! | `walk_forward_to_first_merge_point` | forward | no  | yes           |
//!
//! The walker assumes there are no secondary branches: at any merge or
//! branch point at most one neighbor may be admissible. When more than one
//! is, the walk fails with [`GraphError::AmbiguousBranchSelection`] instead
//! of picking one arbitrarily.

use std::collections::BTreeSet;

use crate::error::GraphError;
use crate::graph::{VersionGraph, friendly_names};
use crate::version::Version;

/// Which edges a walk follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkDirection {
    /// Towards predecessors.
    Back,
    /// Towards successors.
    Forward,
}

/// When a walk stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalkPolicy {
    /// Continue all the way to a root or tip instead of stopping where a
    /// side branch meets the main line.
    pub extreme: bool,
    /// Prefer the main line at merge/branch points; without `extreme`, stop
    /// a side-branch walk at its first merge/branch point.
    pub stop_on_merge: bool,
}

impl WalkPolicy {
    pub const TO_END: Self = Self {
        extreme: true,
        stop_on_merge: false,
    };
    pub const TO_MAINLINE_END: Self = Self {
        extreme: true,
        stop_on_merge: true,
    };
    pub const TO_BRANCH: Self = Self {
        extreme: false,
        stop_on_merge: false,
    };
    pub const TO_FIRST_BRANCH: Self = Self {
        extreme: false,
        stop_on_merge: true,
    };
}

impl<V: Version> VersionGraph<V> {
    /// Walk from `from` in `direction` until `policy` says stop.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownVersion`] if `from` is not in the graph
    /// and [`GraphError::AmbiguousBranchSelection`] if a merge/branch point
    /// offers more than one admissible neighbor.
    pub fn walk(
        &self,
        from: &V,
        direction: WalkDirection,
        policy: WalkPolicy,
    ) -> Result<&V, GraphError> {
        let (mut current, _) = self
            .edges_back
            .get_key_value(from)
            .ok_or_else(|| GraphError::UnknownVersion {
                version: from.friendly_version(),
            })?;

        loop {
            let neighbors = self.neighbors(current, direction)?;
            let mut iter = neighbors.iter();
            current = match (iter.next(), iter.next()) {
                (None, _) => return Ok(current),
                (Some(next), None) => {
                    // first version off the main line, seen from the main line
                    if !policy.extreme && !self.is_mainline(current) && self.is_mainline(next) {
                        return Ok(current);
                    }
                    next
                }
                (Some(_), Some(_)) => {
                    let mainline = self.is_mainline(current);
                    if policy.stop_on_merge && !policy.extreme && !mainline {
                        return Ok(current);
                    }
                    self.select_branch(current, neighbors, mainline, policy)?
                }
            };
        }
    }

    /// Pick the single admissible neighbor at a merge/branch point.
    fn select_branch<'a>(
        &'a self,
        current: &V,
        neighbors: &'a BTreeSet<V>,
        mainline: bool,
        policy: WalkPolicy,
    ) -> Result<&'a V, GraphError> {
        let (on, off): (Vec<&V>, Vec<&V>) = neighbors.iter().partition(|n| self.is_mainline(n));

        // stay on the main line, or switch to it when asked to
        if mainline || policy.stop_on_merge {
            match on.as_slice() {
                [only] => return Ok(*only),
                [] => {}
                _ => return Err(ambiguous(current, neighbors)),
            }
        }

        // follow the side branch, provided it is the only one
        if !mainline {
            if let [only] = off.as_slice() {
                return Ok(*only);
            }
        }

        Err(ambiguous(current, neighbors))
    }

    /// Walk back to a root, following the main line at merges.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::walk`].
    pub fn walk_back_to_root(&self, version: &V) -> Result<&V, GraphError> {
        self.walk(version, WalkDirection::Back, WalkPolicy::TO_END)
    }

    /// Walk back to a root, switching onto the main line as soon as possible.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::walk`].
    pub fn walk_back_to_mainline_root(&self, version: &V) -> Result<&V, GraphError> {
        self.walk(version, WalkDirection::Back, WalkPolicy::TO_MAINLINE_END)
    }

    /// Walk back to the first version of the side branch `version` is on,
    /// or to the root for mainline versions.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::walk`].
    pub fn walk_back_to_branch_point(&self, version: &V) -> Result<&V, GraphError> {
        self.walk(version, WalkDirection::Back, WalkPolicy::TO_BRANCH)
    }

    /// Like [`Self::walk_back_to_branch_point`] but a side branch also stops
    /// at the first merge into it.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::walk`].
    pub fn walk_back_to_first_branch_point(&self, version: &V) -> Result<&V, GraphError> {
        self.walk(version, WalkDirection::Back, WalkPolicy::TO_FIRST_BRANCH)
    }

    /// Walk forward to a tip, following the main line at branch points.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::walk`].
    pub fn walk_forward_to_tip(&self, version: &V) -> Result<&V, GraphError> {
        self.walk(version, WalkDirection::Forward, WalkPolicy::TO_END)
    }

    /// Walk forward to a tip, switching onto the main line as soon as possible.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::walk`].
    pub fn walk_forward_to_mainline_tip(&self, version: &V) -> Result<&V, GraphError> {
        self.walk(version, WalkDirection::Forward, WalkPolicy::TO_MAINLINE_END)
    }

    /// Walk forward to the last version of a side branch before it merges
    /// into the main line, or to the tip for mainline versions.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::walk`].
    pub fn walk_forward_to_merge_point(&self, version: &V) -> Result<&V, GraphError> {
        self.walk(version, WalkDirection::Forward, WalkPolicy::TO_BRANCH)
    }

    /// Like [`Self::walk_forward_to_merge_point`] but a side branch also
    /// stops where it splits.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::walk`].
    pub fn walk_forward_to_first_merge_point(&self, version: &V) -> Result<&V, GraphError> {
        self.walk(version, WalkDirection::Forward, WalkPolicy::TO_FIRST_BRANCH)
    }

    /// Whether walking back from `version` along its branch reaches a root.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::walk`].
    pub fn is_on_main_branch(&self, version: &V) -> Result<bool, GraphError> {
        Ok(self.roots.contains(self.walk_back_to_branch_point(version)?))
    }

    /// The mainline version the side branch containing `version` forks from.
    ///
    /// `None` for versions on the main branch. A side branch that starts
    /// from several versions at once is ambiguous.
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::walk`].
    pub fn branch_origin(&self, version: &V) -> Result<Option<&V>, GraphError> {
        let first = self.walk_back_to_branch_point(version)?;
        if self.roots.contains(first) {
            return Ok(None);
        }
        let predecessors = self.predecessors(first)?;
        let mut iter = predecessors.iter();
        match (iter.next(), iter.next()) {
            (Some(origin), None) => Ok(Some(origin)),
            _ => Err(ambiguous(first, predecessors)),
        }
    }
}

fn ambiguous<V: Version>(version: &V, neighbors: &BTreeSet<V>) -> GraphError {
    GraphError::AmbiguousBranchSelection {
        version: version.friendly_version(),
        neighbors: friendly_names(neighbors),
    }
}
