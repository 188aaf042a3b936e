// Dashboard terminal: runs resolved commands against the terminal program

use nexussync_core::commands::{self, CommandArgument, KnownCommand, COMMANDS};
use nexussync_core::config::CliConfig;
use nexussync_core::{CommandExecutor, ResponseFormatter, TerminalOutput};

pub const CLEARED_MESSAGE: &str = "Terminal cleared.";

/// Reasons a terminal command is refused before anything runs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TerminalError {
    #[error("Unknown command: {0}\nType \"help\" to see available commands.")]
    UnknownCommand(String),

    #[error("Could not parse command (unbalanced quotes?): {0}")]
    Unparseable(String),

    #[error("{0} does not take arguments")]
    UnexpectedArguments(&'static str),

    #[error("{0} takes a single path; quote paths containing spaces")]
    TooManyArguments(&'static str),
}

/// What a terminal line turns into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalAction {
    Help,
    Clear,
    Run(Vec<String>),
}

pub struct TerminalRunner {
    program: String,
    executor: CommandExecutor,
}

impl TerminalRunner {
    pub fn new(program: impl Into<String>, executor: CommandExecutor) -> Self {
        Self {
            program: program.into(),
            executor,
        }
    }

    pub fn from_config(config: &CliConfig) -> Self {
        Self::new(
            config.terminal_program.clone(),
            CommandExecutor::from_config(config),
        )
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Decide what `input` does without running anything
    pub fn plan(&self, input: &str) -> Result<TerminalAction, TerminalError> {
        let input = input.trim();
        match input {
            commands::HELP => return Ok(TerminalAction::Help),
            commands::CLEAR => return Ok(TerminalAction::Clear),
            _ => {}
        }

        let tokens = shlex::split(input).ok_or_else(|| TerminalError::Unparseable(input.to_string()))?;
        let (known, rest) = match tokens.as_slice() {
            [head, sub, rest @ ..] if head == "jaegis" => match find_subcommand(sub) {
                Some(known) => (known, rest),
                None => return Err(TerminalError::UnknownCommand(input.to_string())),
            },
            _ => return Err(TerminalError::UnknownCommand(input.to_string())),
        };

        let mut argv = vec![self.program.clone()];
        argv.extend(known.subcommand().map(str::to_string));

        match (known.argument, rest) {
            (_, []) => {}
            (CommandArgument::None, _) => return Err(TerminalError::UnexpectedArguments(known.name)),
            (CommandArgument::Path, [path]) => argv.push(path.clone()),
            (CommandArgument::Path, _) => return Err(TerminalError::TooManyArguments(known.name)),
            (CommandArgument::Query, words) => argv.push(words.join(" ")),
        }

        Ok(TerminalAction::Run(argv))
    }

    /// Run a terminal line and build the dashboard payload
    pub async fn run(&self, input: &str) -> TerminalOutput {
        let command = input.trim();
        match self.plan(command) {
            Ok(TerminalAction::Help) => TerminalOutput::output(command, commands::help_text()),
            Ok(TerminalAction::Clear) => TerminalOutput::output(command, CLEARED_MESSAGE),
            Ok(TerminalAction::Run(argv)) => {
                tracing::info!("Executing terminal command: {}", command);
                tracing::debug!("argv: {:?}", argv);
                let result = self.executor.run(&argv).await;
                ResponseFormatter::for_terminal(command, &result)
            }
            Err(e) => {
                tracing::debug!("Rejected terminal command {:?}: {}", command, e);
                TerminalOutput::error(command, e.to_string())
            }
        }
    }
}

fn find_subcommand(sub: &str) -> Option<&'static KnownCommand> {
    COMMANDS.iter().find(|known| known.subcommand() == Some(sub))
}
