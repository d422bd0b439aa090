// ABOUTME: Output formatting for CLI feedback around a status check.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;
use std::io;

use crate::config::OutputFormat;
use crate::status::{ReportFormat, Reporter};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with per-resource status lines
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

impl OutputMode {
    pub fn from_flags(quiet: bool, format: OutputFormat) -> Self {
        match (quiet, format) {
            (_, OutputFormat::Json) => OutputMode::Json,
            (true, OutputFormat::Text) => OutputMode::Quiet,
            (false, OutputFormat::Text) => OutputMode::Normal,
        }
    }
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Reporter writing status lines in the matching format.
    /// Quiet mode discards them.
    pub fn reporter(&self) -> Reporter {
        match self.mode {
            OutputMode::Normal => Reporter::stdout(ReportFormat::Text),
            OutputMode::Quiet => Reporter::new(io::sink(), ReportFormat::Text),
            OutputMode::Json => Reporter::stdout(ReportFormat::Json),
        }
    }

    /// Print the final result line.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                println!("{message}");
            }
            OutputMode::Json => {
                if let Some(json) = self.json_line("success", message) {
                    println!("{json}");
                }
            }
        }
    }

    fn json_line(&self, event: &str, message: &str) -> Option<String> {
        serde_json::to_string(&JsonEvent { event, message }).ok()
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_format_wins_over_quiet() {
        assert_eq!(OutputMode::from_flags(true, OutputFormat::Json), OutputMode::Json);
        assert_eq!(OutputMode::from_flags(true, OutputFormat::Text), OutputMode::Quiet);
        assert_eq!(OutputMode::from_flags(false, OutputFormat::Text), OutputMode::Normal);
    }

    #[test]
    fn json_line_names_event() {
        let output = Output::new(OutputMode::Json);
        assert_eq!(
            output.json_line("success", "done").unwrap(),
            r#"{"event":"success","message":"done"}"#
        );
    }
}
