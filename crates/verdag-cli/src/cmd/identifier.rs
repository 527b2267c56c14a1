//! `verdag identifier`: name for artifacts derived from the configured graph.

use std::io::Write;

use clap::Args;
use serde::Serialize;

use crate::output::{OutputMode, render};
use crate::session::Session;

/// Arguments for `verdag identifier`.
#[derive(Args, Debug, Default)]
pub struct IdentifierArgs {
    /// Also print the content hash of the configured graph.
    #[arg(long)]
    pub hash: bool,
}

#[derive(Debug, Serialize)]
struct IdentifierOutput {
    identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_hash: Option<String>,
}

/// Execute `verdag identifier`.
pub fn run_identifier(
    args: &IdentifierArgs,
    output: OutputMode,
    session: &Session,
) -> anyhow::Result<()> {
    let payload = IdentifierOutput {
        identifier: session.graph.repo_tags_identifier(&session.flavours),
        content_hash: args.hash.then(|| session.graph.content_hash()),
    };
    render(output, &payload, |p, w| {
        writeln!(w, "{}", p.identifier)?;
        if let Some(hash) = &p.content_hash {
            writeln!(w, "{hash}")?;
        }
        Ok(())
    })
}
