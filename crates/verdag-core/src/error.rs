//! Fatal graph errors and their machine-readable codes.
//!
//! Every structural problem the graph core can detect is a [`GraphError`].
//! None of them are recoverable: a graph that fails any check must not be
//! used to derive anything. The orchestrator decides whether to abort; the
//! algorithms only return the error.

use std::fmt;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InconsistentGraph,
    CycleDetected,
    EmptyRoot,
    AmbiguousBranchSelection,
    AncestryExhausted,
    UnknownParent,
    BrokenEdgeSymmetry,
    UnknownVersion,
    ManifestUnreadable,
    ConfigParseError,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InconsistentGraph => "E2001",
            Self::CycleDetected => "E2002",
            Self::EmptyRoot => "E2003",
            Self::AmbiguousBranchSelection => "E2004",
            Self::AncestryExhausted => "E2005",
            Self::UnknownParent => "E2006",
            Self::BrokenEdgeSymmetry => "E2007",
            Self::UnknownVersion => "E3001",
            Self::ManifestUnreadable => "E1001",
            Self::ConfigParseError => "E1002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InconsistentGraph => "Version graph is inconsistently structured",
            Self::CycleDetected => "Version graph contains a cycle",
            Self::EmptyRoot => "Version graph has no root version",
            Self::AmbiguousBranchSelection => "Branch to follow is ambiguous",
            Self::AncestryExhausted => "Ancestry walk exceeded the version count",
            Self::UnknownParent => "Parent hint names an unknown version",
            Self::BrokenEdgeSymmetry => "Forward and backward edges disagree",
            Self::UnknownVersion => "Version not found in graph",
            Self::ManifestUnreadable => "Version manifest could not be read",
            Self::ConfigParseError => "Config file parse error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InconsistentGraph => {
                Some("Check the manifest for versions that do not connect to the rest of the history.")
            }
            Self::CycleDetected => Some("Fix the parent hints so that no version is its own ancestor."),
            Self::EmptyRoot => Some("The filters removed every version; loosen them and retry."),
            Self::AmbiguousBranchSelection => {
                Some("Only one side branch may be open at a time; fix the parent hints or mainline flags.")
            }
            Self::AncestryExhausted => Some("Parent hints loop back on themselves; fix the manifest."),
            Self::UnknownParent => Some("Add the missing version to the manifest or drop the hint."),
            Self::BrokenEdgeSymmetry => Some("Report a bug with the manifest that triggered it."),
            Self::UnknownVersion => None,
            Self::ManifestUnreadable => Some("Verify the manifest path and its JSON syntax."),
            Self::ConfigParseError => Some("Fix syntax in verdag.toml and retry."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A fatal structural error raised while building, filtering or walking a
/// version graph.
///
/// Versions are reported by their friendly name so the error stays
/// independent of the vertex type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("version graph is inconsistently structured! tree roots: {tree_roots:?}, walk roots: {walk_roots:?}")]
    InconsistentGraph {
        tree_roots: Vec<String>,
        walk_roots: Vec<String>,
    },

    #[error("cycle detected in version graph at {version}")]
    CycleDetected { version: String },

    #[error("version graph does not contain a root version")]
    EmptyRoot,

    #[error("could not determine which branch to follow from {version} (candidates: {neighbors:?})")]
    AmbiguousBranchSelection {
        version: String,
        neighbors: Vec<String>,
    },

    #[error("ancestry walk for {version} exceeded {depth} steps")]
    AncestryExhausted { version: String, depth: usize },

    #[error("{version} names unknown parent version {parent}")]
    UnknownParent { version: String, parent: String },

    #[error("edge {from} -> {to} is missing its reverse entry")]
    BrokenEdgeSymmetry { from: String, to: String },

    #[error("version {version} is not part of this graph")]
    UnknownVersion { version: String },
}

impl GraphError {
    /// The stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InconsistentGraph { .. } => ErrorCode::InconsistentGraph,
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
            Self::EmptyRoot => ErrorCode::EmptyRoot,
            Self::AmbiguousBranchSelection { .. } => ErrorCode::AmbiguousBranchSelection,
            Self::AncestryExhausted { .. } => ErrorCode::AncestryExhausted,
            Self::UnknownParent { .. } => ErrorCode::UnknownParent,
            Self::BrokenEdgeSymmetry { .. } => ErrorCode::BrokenEdgeSymmetry,
            Self::UnknownVersion { .. } => ErrorCode::UnknownVersion,
        }
    }
}
