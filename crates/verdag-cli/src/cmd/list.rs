//! `verdag list`: every version with its branch flags.

use std::io::Write;

use clap::Args;
use serde::Serialize;
use verdag_core::{ReleaseVersion, Version, VersionGraph};

use crate::output::{OutputMode, render};
use crate::session::Session;

/// Arguments for `verdag list`.
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only list versions on the main branch.
    #[arg(long)]
    pub main_branch: bool,
}

#[derive(Debug, Serialize)]
struct ListEntry {
    id: String,
    semantic: String,
    friendly: String,
    snapshot: bool,
    mainline: bool,
    on_main_branch: bool,
    previous: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ListOutput {
    versions: Vec<ListEntry>,
}

/// Execute `verdag list`.
pub fn run_list(args: &ListArgs, output: OutputMode, session: &Session) -> anyhow::Result<()> {
    let mut versions = Vec::with_capacity(session.graph.len());
    for version in session.graph.iter() {
        let entry = entry(&session.graph, version)?;
        if !args.main_branch || entry.on_main_branch {
            versions.push(entry);
        }
    }

    render(output, &ListOutput { versions }, render_list_text)
}

fn entry(
    graph: &VersionGraph<ReleaseVersion>,
    version: &ReleaseVersion,
) -> anyhow::Result<ListEntry> {
    Ok(ListEntry {
        id: version.id().to_string(),
        semantic: version.semantic_version(),
        friendly: version.friendly_version(),
        snapshot: version.is_snapshot_or_pending(),
        mainline: graph.is_mainline(version),
        on_main_branch: graph.is_on_main_branch(version)?,
        previous: graph
            .predecessors(version)?
            .iter()
            .map(|p| p.id().to_string())
            .collect(),
    })
}

fn render_list_text(list: &ListOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if list.versions.is_empty() {
        writeln!(w, "No versions.")?;
        return Ok(());
    }
    for v in &list.versions {
        let branch = if v.on_main_branch { "main" } else { "side" };
        let previous = if v.previous.is_empty() {
            "-".to_string()
        } else {
            v.previous.join(",")
        };
        writeln!(w, "{:<20} {:<24} {branch:<4} <- {previous}", v.id, v.semantic)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_args_parse_main_branch_flag() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: ListArgs,
        }

        let parsed = Wrapper::parse_from(["test", "--main-branch"]);
        assert!(parsed.args.main_branch);
    }

    #[test]
    fn text_marks_side_versions() {
        let list = ListOutput {
            versions: vec![
                ListEntry {
                    id: "1.0".to_string(),
                    semantic: "1.0.0".to_string(),
                    friendly: "1.0".to_string(),
                    snapshot: false,
                    mainline: true,
                    on_main_branch: true,
                    previous: Vec::new(),
                },
                ListEntry {
                    id: "1.1-exp".to_string(),
                    semantic: "1.1.0-exp.1".to_string(),
                    friendly: "1.1-exp".to_string(),
                    snapshot: true,
                    mainline: false,
                    on_main_branch: false,
                    previous: vec!["1.0".to_string()],
                },
            ],
        };
        let mut out = Vec::new();
        render_list_text(&list, &mut out).expect("render");
        let rendered = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = rendered.lines().collect();

        assert!(lines[0].contains("main <- -"));
        assert!(lines[1].starts_with("1.1-exp"));
        assert!(lines[1].contains("side <- 1.0"));
    }

    #[test]
    fn empty_list() {
        let mut out = Vec::new();
        render_list_text(&ListOutput { versions: Vec::new() }, &mut out).expect("render");
        assert_eq!(String::from_utf8(out).expect("utf8"), "No versions.\n");
    }
}
