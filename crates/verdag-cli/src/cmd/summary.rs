//! `verdag summary`: shape of the configured graph.

use std::io::Write;

use clap::Args;
use serde::Serialize;
use verdag_core::{MetadataProvider, ReleaseVersion, Version};

use crate::output::{OutputMode, render, text_kv};
use crate::session::Session;

/// Arguments for `verdag summary`.
#[derive(Args, Debug, Default)]
pub struct SummaryArgs {}

#[derive(Debug, Serialize)]
struct SummaryOutput {
    provider: String,
    manifest_versions: usize,
    versions: usize,
    edges: usize,
    roots: Vec<String>,
    tips: Vec<String>,
    main_root: String,
    tags: Vec<String>,
    identifier: String,
    content_hash: String,
}

/// Execute `verdag summary`.
///
/// # Errors
///
/// Fails with [`verdag_core::GraphError::EmptyRoot`] when the filters left
/// no version.
pub fn run_summary(_args: &SummaryArgs, output: OutputMode, session: &Session) -> anyhow::Result<()> {
    let graph = &session.graph;
    let main_root = graph.main_root_version()?;
    let payload = SummaryOutput {
        provider: session.provider.internal_name().to_string(),
        manifest_versions: session.full.len(),
        versions: graph.len(),
        edges: graph.edge_count(),
        roots: names(graph.roots()),
        tips: names(graph.tips()),
        main_root: main_root.launcher_friendly_version_name().to_string(),
        tags: graph.tags().to_vec(),
        identifier: graph.repo_tags_identifier(&session.flavours),
        content_hash: graph.content_hash(),
    };

    render(output, &payload, render_summary_text)
}

fn names<'a>(versions: impl IntoIterator<Item = &'a ReleaseVersion>) -> Vec<String> {
    versions.into_iter().map(|v| v.id().to_string()).collect()
}

fn render_summary_text(s: &SummaryOutput, w: &mut dyn Write) -> std::io::Result<()> {
    text_kv(w, "provider", &s.provider)?;
    text_kv(w, "versions", format!("{} of {}", s.versions, s.manifest_versions))?;
    text_kv(w, "edges", s.edges.to_string())?;
    text_kv(w, "roots", s.roots.join(", "))?;
    text_kv(w, "tips", s.tips.join(", "))?;
    text_kv(w, "main root", &s.main_root)?;
    text_kv(w, "identifier", &s.identifier)?;
    text_kv(w, "content hash", &s.content_hash)
}
