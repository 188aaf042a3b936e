// Caller-facing renderings of execution results

use crate::types::ExecutionResult;
use serde::{Deserialize, Serialize};

pub const SUCCESS_MARKER: &str = "✅";
pub const FAILURE_MARKER: &str = "❌";

/// Body of the dashboard terminal's `execute` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub command: String,
}

impl TerminalOutput {
    pub fn output(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
            command: command.into(),
        }
    }

    pub fn error(command: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
            command: command.into(),
        }
    }
}

/// Pure formatting of execution results
pub struct ResponseFormatter;

impl ResponseFormatter {
    /// Success- or failure-prefixed display text
    pub fn for_execution(result: &ExecutionResult) -> String {
        if result.success {
            format!("{} {}", SUCCESS_MARKER, result.stdout)
        } else {
            format!("{} {}", FAILURE_MARKER, Self::diagnostic(result))
        }
    }

    /// Dashboard terminal payload for a finished command
    pub fn for_terminal(command: &str, result: &ExecutionResult) -> TerminalOutput {
        if result.success {
            TerminalOutput::output(command, result.stdout.clone())
        } else {
            TerminalOutput::error(command, Self::diagnostic(result))
        }
    }

    /// Best available explanation of a failed run
    pub fn diagnostic(result: &ExecutionResult) -> String {
        if !result.stderr.trim().is_empty() {
            return result.stderr.clone();
        }
        if !result.stdout.trim().is_empty() {
            return result.stdout.clone();
        }
        match result.exit_code {
            Some(code) => format!("Command failed with exit code {}", code),
            None => "Command failed".to_string(),
        }
    }
}
