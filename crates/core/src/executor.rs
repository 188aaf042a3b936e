// External program execution with captured output and a per-invocation deadline

use crate::config::CliConfig;
use crate::types::ExecutionResult;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

/// Default deadline for one invocation (120 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default cap for each captured stream (1 MB)
const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

const TRUNCATION_MARKER: &str = "\n... (output truncated)";

/// Runs external programs and always reports an `ExecutionResult`.
///
/// Nothing here returns an error: spawn failures, non-zero exits and timeouts are
/// all captured as `success = false` with the best diagnostic available. No retries.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    timeout: Duration,
    max_output_bytes: usize,
}

impl CommandExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    pub fn from_config(config: &CliConfig) -> Self {
        Self {
            timeout: config.timeout(),
            max_output_bytes: config.max_output_bytes,
        }
    }

    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    /// Run `argv[0]` with the remaining arguments and wait for it to exit
    pub async fn run(&self, argv: &[String]) -> ExecutionResult {
        let Some((program, args)) = argv.split_first() else {
            return ExecutionResult::not_started("No command given");
        };

        tracing::debug!("Executing {} {:?}", program, args);
        let start = Instant::now();

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!("Failed to start {}: {}", program, e);
                return ExecutionResult::not_started(format!("Failed to start {}: {}", program, e));
            }
        };

        // Dropping the pending wait on timeout drops the child, which kills it
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::warn!("Failed to wait for {}: {}", program, e);
                let mut result =
                    ExecutionResult::not_started(format!("Failed to wait for {}: {}", program, e));
                result.duration_ms = elapsed_ms(start);
                return result;
            }
            Err(_) => {
                tracing::warn!(
                    "{} timed out after {} seconds, killing it",
                    program,
                    self.timeout.as_secs()
                );
                return ExecutionResult::timed_out(self.timeout.as_secs(), elapsed_ms(start));
            }
        };

        let duration_ms = elapsed_ms(start);
        let exit_code = output.status.code();
        let stdout = self.capture(&output.stdout);
        let mut stderr = self.capture(&output.stderr);

        if exit_code.is_none() && stderr.is_empty() {
            stderr = format!("{} was terminated by a signal", program);
        }

        tracing::debug!(
            "{} exited with {:?} in {}ms",
            program,
            exit_code,
            duration_ms
        );

        ExecutionResult {
            success: output.status.success(),
            stdout,
            stderr,
            exit_code,
            timed_out: false,
            duration_ms,
        }
    }

    fn capture(&self, bytes: &[u8]) -> String {
        let mut text = String::from_utf8_lossy(bytes).into_owned();
        if text.len() > self.max_output_bytes {
            let mut cut = self.max_output_bytes;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
            text.push_str(TRUNCATION_MARKER);
        }
        text
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
