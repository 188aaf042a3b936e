// Natural-language to command resolution: pattern table, then completion, then help

mod completion;
mod patterns;

pub use completion::{CompletionCapability, CompletionError, HttpCompletion};
pub use patterns::{default_patterns, CommandPattern};

use crate::commands::{self, CommandArgument};
use crate::types::{ConversionResult, ResolutionMethod};
use std::sync::Arc;

/// Resolves free text into a terminal command.
///
/// Resolution is a pure function of the input, the pattern table and the injected
/// completion capability. The returned method tag records which stage decided.
pub struct NaturalLanguageResolver {
    patterns: Vec<CommandPattern>,
    completion: Option<Arc<dyn CompletionCapability>>,
    instructions: String,
}

impl NaturalLanguageResolver {
    /// Resolver over the built-in pattern table
    pub fn new(completion: Option<Arc<dyn CompletionCapability>>) -> Result<Self, regex::Error> {
        Ok(Self::with_patterns(default_patterns()?, completion))
    }

    pub fn with_patterns(
        patterns: Vec<CommandPattern>,
        completion: Option<Arc<dyn CompletionCapability>>,
    ) -> Self {
        Self {
            patterns,
            completion,
            instructions: commands::completion_instructions(),
        }
    }

    pub fn patterns(&self) -> &[CommandPattern] {
        &self.patterns
    }

    pub async fn resolve(&self, text: &str) -> ConversionResult {
        if let Some(result) = self.match_pattern(text) {
            return result;
        }

        if let Some(result) = self.ask_completion(text).await {
            return result;
        }

        tracing::debug!("No resolution for input, falling back to help");
        ConversionResult::new(
            commands::HELP,
            commands::describe(commands::HELP),
            ResolutionMethod::Fallback,
        )
    }

    /// Deterministic stage only: first pattern in declared order that matches
    pub fn match_pattern(&self, text: &str) -> Option<ConversionResult> {
        let pattern = self.patterns.iter().find(|p| p.matches(text))?;
        tracing::debug!("Input matched pattern '{}'", pattern.tag);

        Some(ConversionResult::new(
            pattern.render(text),
            pattern.description.clone(),
            ResolutionMethod::PatternMatch,
        ))
    }

    async fn ask_completion(&self, text: &str) -> Option<ConversionResult> {
        if text.trim().is_empty() {
            return None;
        }
        let Some(completion) = self.completion.as_ref() else {
            tracing::warn!("No pattern matched and AI conversion is not configured");
            return None;
        };

        let reply = match completion.complete(&self.instructions, text).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("AI conversion failed: {}", e);
                return None;
            }
        };

        match parse_reply(&reply) {
            Some(command) => Some(ConversionResult::new(
                command.clone(),
                commands::describe(&command),
                ResolutionMethod::AiConversion,
            )),
            None => {
                tracing::warn!("AI conversion returned an unusable reply: {:?}", reply);
                None
            }
        }
    }
}

/// Extract a vocabulary command from a completion reply
fn parse_reply(reply: &str) -> Option<String> {
    let line = reply.lines().map(str::trim).find(|line| !line.is_empty())?;
    let line = line
        .strip_prefix("Output:")
        .or_else(|| line.strip_prefix("output:"))
        .unwrap_or(line);
    let command = line
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim();

    let known = commands::lookup(command)?;
    let rest = shlex::split(&command[known.name.len()..])?;
    let fits = match known.argument {
        CommandArgument::None => rest.is_empty(),
        CommandArgument::Path => rest.len() <= 1,
        CommandArgument::Query => true,
    };

    fits.then(|| command.to_string())
}
