//! Command-line interface for signsync
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Turn tracked sign gestures into sentences
#[derive(Parser, Debug)]
#[command(name = "signsync", version, about = "Turn tracked sign gestures into sentences")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// No prediction readout, sentences only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read landmark frames and emit sentences
    Run {
        /// JSON-lines landmark file (default: stdin)
        #[arg(long, short = 'i', value_name = "FILE")]
        input: Option<PathBuf>,

        /// Linear classifier model (overrides classifier.model)
        #[arg(long, short = 'm', value_name = "FILE")]
        model: Option<PathBuf>,

        /// Replay at a fixed frame interval, e.g. 33ms (default: as fast as possible)
        #[arg(long, value_name = "DURATION", value_parser = parse_pace)]
        pace: Option<Duration>,
    },

    /// Validate configuration and model without running
    Check {
        /// Linear classifier model (overrides classifier.model)
        #[arg(long, short = 'm', value_name = "FILE")]
        model: Option<PathBuf>,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigAction {
    /// Show the effective configuration (file + environment)
    Show,
    /// Print the default configuration as TOML
    Dump,
    /// Print the configuration file path
    Path,
}

/// Parse a frame interval.
///
/// Accepts anything `humantime` does (`33ms`, `1s`); bare numbers are milliseconds.
fn parse_pace(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_defaults() {
        let cli = Cli::try_parse_from(["signsync", "run"]).unwrap();
        match cli.command {
            Commands::Run { input, model, pace } => {
                assert!(input.is_none());
                assert!(model.is_none());
                assert!(pace.is_none());
            }
            other => panic!("Expected Run command, got {:?}", other),
        }
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_parse_run_with_options() {
        let cli = Cli::try_parse_from([
            "signsync",
            "run",
            "--input",
            "session.jsonl",
            "--model",
            "model.json",
            "--pace",
            "33ms",
        ])
        .unwrap();

        match cli.command {
            Commands::Run { input, model, pace } => {
                assert_eq!(input, Some(PathBuf::from("session.jsonl")));
                assert_eq!(model, Some(PathBuf::from("model.json")));
                assert_eq!(pace, Some(Duration::from_millis(33)));
            }
            other => panic!("Expected Run command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_pace_formats() {
        assert_eq!(parse_pace("40"), Ok(Duration::from_millis(40)));
        assert_eq!(parse_pace("1s"), Ok(Duration::from_secs(1)));
        assert!(parse_pace("soon").is_err());
    }

    #[test]
    fn test_parse_verbose_repeated_flags() {
        let cli = Cli::try_parse_from(["signsync", "-v", "-v", "run"]).unwrap();
        assert_eq!(cli.verbose, 2);

        let cli = Cli::try_parse_from(["signsync", "run", "-vvv"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_parse_global_config() {
        let cli =
            Cli::try_parse_from(["signsync", "check", "--config", "/path/to/config.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.toml")));
        assert!(matches!(cli.command, Commands::Check { model: None }));
    }

    #[test]
    fn test_parse_config_actions() {
        for (arg, expected) in [
            ("show", ConfigAction::Show),
            ("dump", ConfigAction::Dump),
            ("path", ConfigAction::Path),
        ] {
            let cli = Cli::try_parse_from(["signsync", "config", arg]).unwrap();
            match cli.command {
                Commands::Config { action } => assert_eq!(action, expected),
                other => panic!("Expected Config command, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_completions() {
        let cli = Cli::try_parse_from(["signsync", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Bash }
        ));
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["signsync"]).is_err());
    }

    #[test]
    fn test_quiet_and_no_color_flags() {
        let cli = Cli::try_parse_from(["signsync", "run", "-q", "--no-color"]).unwrap();
        assert!(cli.quiet);
        assert!(cli.no_color);
    }
}
