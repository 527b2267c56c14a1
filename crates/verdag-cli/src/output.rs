//! Shared output layer for text/JSON parity across all commands.
//!
//! Every command handler receives an [`OutputMode`]. Text output is written by
//! a per-command closure; JSON output serializes the same payload, so both
//! modes always carry the same information.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;
use verdag_core::{ErrorCode, GraphError};

use crate::config::ConfigError;
use crate::manifest::ManifestError;

/// Output modes supported by the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Plain text for humans and pipes.
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Render a left-aligned key/value line in text output.
pub fn text_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}

/// A user-facing error with a stable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Classify an error chain. Graph errors keep their own code; manifest and
    /// config failures map to their I/O codes.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let code = if let Some(graph) = err.downcast_ref::<GraphError>() {
            Some(graph.code())
        } else if err.chain().any(|cause| cause.is::<ManifestError>()) {
            Some(ErrorCode::ManifestUnreadable)
        } else if err.chain().any(|cause| cause.is::<ConfigError>()) {
            Some(ErrorCode::ConfigParseError)
        } else {
            None
        };

        Self {
            message: format!("{err:#}"),
            hint: code.and_then(ErrorCode::hint).map(str::to_string),
            error_code: code.map(|c| c.code().to_string()),
        }
    }
}

/// Render a serializable value to stdout in the requested format.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, &mut out)?,
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(mode, error, &mut out)?;
    Ok(())
}

fn write_error(mode: OutputMode, error: &CliError, out: &mut dyn Write) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({ "error": error });
            serde_json::to_writer_pretty(&mut *out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Text => {
            match &error.error_code {
                Some(code) => writeln!(out, "error[{code}]: {}", error.message)?,
                None => writeln!(out, "error: {}", error.message)?,
            }
            if let Some(hint) = &error.hint {
                writeln!(out, "  hint: {hint}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn graph_errors_keep_their_code() {
        let err = anyhow::Error::from(GraphError::EmptyRoot).context("building graph");
        let cli = CliError::from_anyhow(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E2003"));
        assert!(cli.hint.is_some());
        assert!(cli.message.starts_with("building graph"));
    }

    #[test]
    fn manifest_errors_are_unreadable() {
        let err = anyhow::Error::from(ManifestError::DuplicateId { id: "x".to_string() });
        assert_eq!(CliError::from_anyhow(&err).error_code.as_deref(), Some("E1001"));
    }

    #[test]
    fn config_errors_are_parse_errors() {
        let source = std::io::Error::other("denied");
        let err = anyhow::Error::from(ConfigError::Read {
            path: PathBuf::from("verdag.toml"),
            source,
        });
        assert_eq!(CliError::from_anyhow(&err).error_code.as_deref(), Some("E1002"));
    }

    #[test]
    fn other_errors_have_no_code() {
        let cli = CliError::from_anyhow(&anyhow::anyhow!("boom"));
        assert_eq!(cli.error_code, None);
        assert_eq!(cli.hint, None);
    }

    #[test]
    fn text_error_shows_code_and_hint() {
        let cli = CliError::from_anyhow(&anyhow::Error::from(GraphError::CycleDetected {
            version: "1.0".to_string(),
        }));
        let mut out = Vec::new();
        write_error(OutputMode::Text, &cli, &mut out).expect("render");
        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.starts_with("error[E2002]:"));
        assert!(rendered.contains("hint:"));
    }

    #[test]
    fn json_error_is_wrapped() {
        let cli = CliError::from_anyhow(&anyhow::anyhow!("boom"));
        let mut out = Vec::new();
        write_error(OutputMode::Json, &cli, &mut out).expect("render");
        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(value["error"]["message"], "boom");
    }
}
