// Configuration loaded once at startup and passed into each component

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NexusConfig {
    #[serde(default)]
    pub cli: CliConfig,

    #[serde(default)]
    pub protocol: ProtocolConfig,

    #[serde(default)]
    pub completion: CompletionConfig,
}

/// External program invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Program behind the MCP tools
    #[serde(default = "default_program")]
    pub program: String,

    /// Program behind the dashboard terminal's `jaegis ...` commands
    #[serde(default = "default_terminal_program")]
    pub terminal_program: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Cap applied separately to stdout and stderr
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_program() -> String {
    "youtube-chat".to_string()
}

fn default_terminal_program() -> String {
    "jaegis".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_output_bytes() -> usize {
    1024 * 1024
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            terminal_program: default_terminal_program(),
            timeout_secs: default_timeout_secs(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

impl CliConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Wire protocol settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Longest accepted request line; longer lines are answered with a parse error
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

fn default_max_message_bytes() -> usize {
    4 * 1024 * 1024
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

/// Settings for the text-completion fallback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default)]
    pub enabled: bool,

    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f64 {
    0.1
}

fn default_max_tokens() -> u32 {
    50
}

fn default_completion_timeout_secs() -> u64 {
    15
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_completion_timeout_secs(),
        }
    }
}

impl NexusConfig {
    /// Load configuration from a TOML file, falling back to defaults if it does not exist
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::info!(
                "Configuration file {} not found, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .context("Failed to read configuration file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse configuration file")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.cli.program.trim().is_empty() {
            anyhow::bail!("cli.program must not be empty");
        }
        if self.cli.terminal_program.trim().is_empty() {
            anyhow::bail!("cli.terminal_program must not be empty");
        }
        if self.cli.timeout_secs == 0 {
            anyhow::bail!("cli.timeout_secs must be greater than zero");
        }
        if self.protocol.max_message_bytes == 0 {
            anyhow::bail!("protocol.max_message_bytes must be greater than zero");
        }
        if self.completion.enabled {
            url::Url::parse(&self.completion.endpoint)
                .context("completion.endpoint is not a valid URL")?;
        }
        Ok(())
    }
}
