// Core types shared by the protocol server and the dashboard terminal

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single external program invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// True only when the process exited with status zero
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// None when the process never started or was killed
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(default)]
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Result for a process that could not be started at all
    pub fn not_started(diagnostic: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: diagnostic.into(),
            exit_code: None,
            timed_out: false,
            duration_ms: 0,
        }
    }

    /// Result for a process killed after exceeding its deadline
    pub fn timed_out(timeout_secs: u64, duration_ms: u64) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: format!("Command timed out after {} seconds", timeout_secs),
            exit_code: None,
            timed_out: true,
            duration_ms,
        }
    }
}

/// How a piece of free text was turned into a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionMethod {
    /// Deterministic match against the ordered pattern table
    PatternMatch,
    /// Suggested by the completion capability
    AiConversion,
    /// Nothing else worked; the help command was chosen
    Fallback,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PatternMatch => "pattern-match",
            Self::AiConversion => "ai-conversion",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved terminal command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub command: String,
    pub description: String,
    pub method: ResolutionMethod,
}

impl ConversionResult {
    pub fn new(
        command: impl Into<String>,
        description: impl Into<String>,
        method: ResolutionMethod,
    ) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
            method,
        }
    }
}
