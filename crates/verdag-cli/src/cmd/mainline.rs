//! `verdag mainline`: main-branch membership of one version.

use std::io::Write;

use clap::Args;
use serde::Serialize;

use crate::output::{OutputMode, render};
use crate::session::Session;

/// Arguments for `verdag mainline`.
#[derive(Args, Debug)]
pub struct MainlineArgs {
    /// Version to inspect (launcher name).
    pub version: String,
}

#[derive(Debug, Serialize)]
struct MainlineOutput {
    version: String,
    mainline: bool,
    on_main_branch: bool,
    branch_start: String,
    branch_origin: Option<String>,
}

/// Execute `verdag mainline`.
pub fn run_mainline(args: &MainlineArgs, output: OutputMode, session: &Session) -> anyhow::Result<()> {
    let graph = &session.graph;
    let version = session.version(&args.version)?;

    let payload = MainlineOutput {
        version: version.id().to_string(),
        mainline: graph.is_mainline(version),
        on_main_branch: graph.is_on_main_branch(version)?,
        branch_start: graph.walk_back_to_branch_point(version)?.id().to_string(),
        branch_origin: graph.branch_origin(version)?.map(|v| v.id().to_string()),
    };
    render(output, &payload, render_mainline_text)
}

fn render_mainline_text(m: &MainlineOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if m.on_main_branch {
        return writeln!(w, "{} is on the main branch", m.version);
    }
    match &m.branch_origin {
        Some(origin) => writeln!(
            w,
            "{} is on a side branch starting at {} (forked from {origin})",
            m.version, m.branch_start
        ),
        None => writeln!(
            w,
            "{} is on a side branch starting at {}",
            m.version, m.branch_start
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_branch_text_names_origin() {
        let payload = MainlineOutput {
            version: "1.1.1".to_string(),
            mainline: false,
            on_main_branch: false,
            branch_start: "1.1.1".to_string(),
            branch_origin: Some("1.1".to_string()),
        };
        let mut out = Vec::new();
        render_mainline_text(&payload, &mut out).expect("render");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "1.1.1 is on a side branch starting at 1.1.1 (forked from 1.1)\n"
        );
    }

    #[test]
    fn main_branch_text() {
        let payload = MainlineOutput {
            version: "1.2".to_string(),
            mainline: true,
            on_main_branch: true,
            branch_start: "1.0".to_string(),
            branch_origin: None,
        };
        let mut out = Vec::new();
        render_mainline_text(&payload, &mut out).expect("render");
        assert_eq!(String::from_utf8(out).expect("utf8"), "1.2 is on the main branch\n");
    }
}
