#![forbid(unsafe_code)]
//! verdag-core library.
//!
//! Builds a directed acyclic graph of release versions from partial ancestry
//! metadata, certifies it, and answers structural queries over it: main-line
//! membership, walks to the nearest branch or merge point, derived subgraphs
//! and a stable identifier for derived artifacts.
//!
//! # Conventions
//!
//! - **Errors**: Graph invariants are reported as [`GraphError`]; entry points
//!   that call into a [`MetadataProvider`] return `anyhow::Result` and pass
//!   provider errors through untouched.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod error;
pub mod graph;
pub mod provider;
pub mod runner;
pub mod tags;
pub mod version;

#[cfg(test)]
mod testing;

pub use error::{ErrorCode, GraphError};
pub use graph::{ArtifactScheme, VersionGraph, WalkDirection, WalkPolicy};
pub use provider::{ManifestSource, MetadataProvider, StaticProvider};
pub use runner::TaskRunner;
pub use tags::RepoFlavours;
pub use version::{ReleaseVersion, Version};
