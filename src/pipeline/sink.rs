//! Sentence consumers drained by the dispatch worker.

use crate::defaults;
use crate::error::{Result, SignSyncError};
use crate::pipeline::types::Sentence;
use std::process::Command;

/// Pluggable handler for finished sentences.
///
/// Called from the single dispatch worker thread, so deliveries never overlap.
pub trait SentenceSink: Send + 'static {
    /// Render or forward one sentence. Exactly one attempt per flush.
    fn deliver(&mut self, sentence: &Sentence) -> Result<()>;

    /// Called once the queue has drained. Return accumulated text if applicable.
    fn finish(&mut self) -> Option<String> {
        None
    }

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Collects sentence texts in memory, one line per sentence.
pub struct CollectorSink {
    separator: String,
    collected: Vec<String>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::with_separator(defaults::TOKEN_SEPARATOR)
    }

    pub fn with_separator(separator: &str) -> Self {
        Self {
            separator: separator.to_string(),
            collected: Vec::new(),
        }
    }
}

impl Default for CollectorSink {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceSink for CollectorSink {
    fn deliver(&mut self, sentence: &Sentence) -> Result<()> {
        self.collected.push(sentence.join(&self.separator));
        Ok(())
    }

    fn finish(&mut self) -> Option<String> {
        if self.collected.is_empty() {
            None
        } else {
            Some(self.collected.join("\n"))
        }
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

/// Pipe mode sink: one line per sentence on stdout.
pub struct StdoutSink {
    separator: String,
}

impl StdoutSink {
    pub fn new(separator: &str) -> Self {
        Self {
            separator: separator.to_string(),
        }
    }
}

impl SentenceSink for StdoutSink {
    fn deliver(&mut self, sentence: &Sentence) -> Result<()> {
        println!("{}", sentence.join(&self.separator));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

/// Trait for executing system commands.
///
/// Object-safe, Send + Sync for use in concurrent contexts.
pub trait CommandExecutor: Send + Sync {
    /// Run `command` with `args`, returning its stdout.
    fn execute(&self, command: &str, args: &[&str]) -> Result<String>;
}

/// Production command executor using std::process::Command.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn execute(&self, command: &str, args: &[&str]) -> Result<String> {
        let output = Command::new(command).args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SignSyncError::OutputCommandNotFound {
                    command: command.to_string(),
                }
            } else {
                SignSyncError::DeliveryFailed {
                    message: format!("Failed to execute {}: {}", command, e),
                }
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SignSyncError::DeliveryFailed {
                message: format!("{} failed with {}: {}", command, output.status, stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Placeholder in command arguments replaced by the sentence text.
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// Hands each sentence to an external program, e.g. a speech synthesizer.
///
/// Arguments containing `{text}` get the sentence substituted in; when none
/// does, the text is appended as the last argument.
pub struct CommandSink<E: CommandExecutor> {
    executor: E,
    command: String,
    args: Vec<String>,
    separator: String,
}

impl<E: CommandExecutor> CommandSink<E> {
    pub fn new(executor: E, command: &str, args: Vec<String>, separator: &str) -> Self {
        Self {
            executor,
            command: command.to_string(),
            args,
            separator: separator.to_string(),
        }
    }

    fn render_args(&self, text: &str) -> Vec<String> {
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace(TEXT_PLACEHOLDER, text))
            .collect();
        if !self.args.iter().any(|arg| arg.contains(TEXT_PLACEHOLDER)) {
            args.push(text.to_string());
        }
        args
    }
}

impl<E: CommandExecutor + 'static> SentenceSink for CommandSink<E> {
    fn deliver(&mut self, sentence: &Sentence) -> Result<()> {
        let text = sentence.join(&self.separator);
        let args = self.render_args(&text);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        tracing::debug!(
            command = %self.command,
            sequence = sentence.sequence,
            "running output command"
        );
        self.executor.execute(&self.command, &arg_refs)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "command"
    }
}
