use crate::terminal::TerminalRunner;
use anyhow::{Context, Result};
use nexussync_core::resolver::{CompletionCapability, HttpCompletion};
use nexussync_core::{NaturalLanguageResolver, NexusConfig};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<NaturalLanguageResolver>,
    pub terminal: Arc<TerminalRunner>,
}

impl AppState {
    pub fn new(config: &NexusConfig) -> Result<Self> {
        let completion = HttpCompletion::from_config(&config.completion)
            .context("Failed to create completion client")?
            .map(|client| Arc::new(client) as Arc<dyn CompletionCapability>);

        if completion.is_some() {
            tracing::info!("AI command conversion enabled ({})", config.completion.model);
        } else {
            tracing::info!("AI command conversion disabled, using pattern matching only");
        }

        let resolver = NaturalLanguageResolver::new(completion)
            .context("Failed to compile command patterns")?;
        let terminal = TerminalRunner::from_config(&config.cli);
        tracing::info!("Terminal commands run through {}", terminal.program());

        Ok(Self {
            resolver: Arc::new(resolver),
            terminal: Arc::new(terminal),
        })
    }
}
