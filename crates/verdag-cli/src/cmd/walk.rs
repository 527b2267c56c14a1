//! `verdag walk`: follow the graph from a version.

use std::io::Write;

use clap::{Args, ValueEnum};
use serde::Serialize;
use verdag_core::{WalkDirection, WalkPolicy};

use crate::output::{OutputMode, render};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Back,
    Forward,
}

/// Where the walk stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Until {
    /// A root (back) or tip (forward).
    Root,
    /// A root or tip, switching onto the main line at the first chance.
    Mainline,
    /// Where the current side branch leaves or joins the main line.
    Branch,
    /// Like `branch`, but a side branch also stops at its own splits and merges.
    FirstBranch,
}

impl From<Direction> for WalkDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Back => Self::Back,
            Direction::Forward => Self::Forward,
        }
    }
}

impl From<Until> for WalkPolicy {
    fn from(until: Until) -> Self {
        match until {
            Until::Root => Self::TO_END,
            Until::Mainline => Self::TO_MAINLINE_END,
            Until::Branch => Self::TO_BRANCH,
            Until::FirstBranch => Self::TO_FIRST_BRANCH,
        }
    }
}

/// Arguments for `verdag walk`.
#[derive(Args, Debug)]
pub struct WalkArgs {
    /// Version to start from (launcher name).
    pub version: String,

    #[arg(long, value_enum, default_value_t = Direction::Back)]
    pub direction: Direction,

    #[arg(long, value_enum, default_value_t = Until::Root)]
    pub until: Until,
}

#[derive(Debug, Serialize)]
struct WalkOutput {
    from: String,
    to: String,
    direction: Direction,
    until: Until,
}

/// Execute `verdag walk`.
pub fn run_walk(args: &WalkArgs, output: OutputMode, session: &Session) -> anyhow::Result<()> {
    let from = session.version(&args.version)?;
    let to = session
        .graph
        .walk(from, args.direction.into(), args.until.into())?;

    let payload = WalkOutput {
        from: from.id().to_string(),
        to: to.id().to_string(),
        direction: args.direction,
        until: args.until,
    };
    render(output, &payload, |w, out| writeln!(out, "{}", w.to))
}
