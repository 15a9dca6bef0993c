//! Shared output layer: every command answers with the response envelope
//! `{success, message, code, data}`.
//!
//! - JSON mode prints the envelope itself (errors included) to stdout.
//! - Pretty/text modes print a human rendering of `data` to stdout and
//!   errors to stderr.

use blotter_core::error::{CounterError, ErrorCode};
use serde::Serialize;
use std::io::{self, Write};
use std::str::FromStr;

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-optimized output (sections, visual framing).
    Pretty,
    /// Plain tab-separated text for pipes.
    Text,
    /// The raw response envelope.
    Json,
}

impl FromStr for OutputMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "pretty" => Ok(Self::Pretty),
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("unknown output mode '{other}'"),
        }
    }
}

/// The response envelope.
#[derive(Debug, Serialize)]
pub struct ResponseBody<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub code: i32,
    pub data: Option<T>,
}

impl<T: Serialize> ResponseBody<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            code: 0,
            data: Some(data),
        }
    }
}

impl ResponseBody<()> {
    /// Failure carrying a specific error code.
    pub fn error_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            code: code.number(),
            data: None,
        }
    }
}

impl From<&CounterError> for ResponseBody<()> {
    fn from(err: &CounterError) -> Self {
        Self::error_code(err.code(), err.to_string())
    }
}

/// Render a successful response.
///
/// JSON mode serializes the envelope; other modes call `human_fn` with the
/// payload.
pub fn render_success<T: Serialize>(
    mode: OutputMode,
    body: &ResponseBody<T>,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, body)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            if let Some(data) = &body.data {
                human_fn(data, &mut out)?;
            } else {
                writeln!(out, "{}", body.message)?;
            }
        }
    }
    Ok(())
}

/// Render a failed response.
pub fn render_error(mode: OutputMode, body: &ResponseBody<()>) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, body)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            let stderr = io::stderr();
            let mut out = stderr.lock();
            writeln!(out, "error: {}", body.message)?;
            if let Some(hint) = code_hint(body.code) {
                writeln!(out, "  suggestion: {hint}")?;
            }
        }
    }
    Ok(())
}

fn code_hint(code: i32) -> Option<&'static str> {
    [
        ErrorCode::NotInitialized,
        ErrorCode::ConfigParseError,
        ErrorCode::ArticleNotFound,
        ErrorCode::ArticleNotExist,
        ErrorCode::UserNotFound,
        ErrorCode::InvalidActor,
        ErrorCode::StoreUnavailable,
    ]
    .into_iter()
    .find(|c| c.number() == code)
    .and_then(ErrorCode::hint)
}

/// Format a microsecond timestamp in local time.
pub fn micros_to_local(us: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_micros(us)
        .map(|ts| {
            ts.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| us.to_string())
}
