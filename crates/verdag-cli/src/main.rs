#![forbid(unsafe_code)]

mod cmd;
mod config;
mod manifest;
mod output;
mod session;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use output::{CliError, OutputMode};
use session::Session;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "verdag: release-history DAGs from version manifests",
    long_about = None
)]
struct Cli {
    /// Version manifest: a JSON document or a directory of version records.
    /// Overrides `[manifest] path` in verdag.toml.
    #[arg(long, global = true, value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputMode::Text)]
    format: OutputMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Summarize the configured graph",
        after_help = "EXAMPLES:\n    verdag --manifest versions.json summary\n    verdag summary --format json"
    )]
    Summary(cmd::summary::SummaryArgs),

    #[command(
        about = "List versions with branch flags",
        after_help = "EXAMPLES:\n    verdag list\n    verdag list --main-branch"
    )]
    List(cmd::list::ListArgs),

    #[command(
        about = "Walk from a version to a root, tip, branch or merge point",
        after_help = "EXAMPLES:\n    verdag walk 1.1.1 --until branch\n    verdag walk 1.0 --direction forward --until mainline"
    )]
    Walk(cmd::walk::WalkArgs),

    #[command(
        about = "Show whether a version is on the main branch",
        after_help = "EXAMPLES:\n    verdag mainline 1.1.1"
    )]
    Mainline(cmd::mainline::MainlineArgs),

    #[command(
        about = "Print the repo tags identifier",
        after_help = "EXAMPLES:\n    verdag identifier\n    verdag identifier --hash"
    )]
    Identifier(cmd::identifier::IdentifierArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("VERDAG_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "verdag=debug,info"
        } else {
            "verdag=info,warn"
        })
    });

    let format = env::var("VERDAG_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let project_root = env::current_dir().context("failed to resolve working directory")?;
    let config = config::resolve_config(&project_root)?;
    debug!(?config, "configuration resolved");

    let manifest = session::manifest_path(cli.manifest.as_deref(), &config, &project_root)
        .context("no manifest given: pass --manifest or set [manifest] path in verdag.toml")?;
    let session = Session::open(&manifest, &config)?;

    match &cli.command {
        Commands::Summary(args) => cmd::summary::run_summary(args, cli.format, &session),
        Commands::List(args) => cmd::list::run_list(args, cli.format, &session),
        Commands::Walk(args) => cmd::walk::run_walk(args, cli.format, &session),
        Commands::Mainline(args) => cmd::mainline::run_mainline(args, cli.format, &session),
        Commands::Identifier(args) => {
            cmd::identifier::run_identifier(args, cli.format, &session)
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error = CliError::from_anyhow(&err);
            if output::render_error(cli.format, &error).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
