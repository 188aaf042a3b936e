// Core types and functionality for the NexusSync command layer

pub mod commands;
pub mod config;
pub mod executor;
pub mod format;
pub mod resolver;
pub mod types;

pub use config::NexusConfig;
pub use executor::CommandExecutor;
pub use format::{ResponseFormatter, TerminalOutput};
pub use resolver::NaturalLanguageResolver;
pub use types::*;
