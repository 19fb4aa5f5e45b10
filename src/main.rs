use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use signsync::app::{RunOptions, check_command, run_command};
use signsync::cli::{Cli, Commands, ConfigAction};
use signsync::config::Config;
use std::io::IsTerminal;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();
    signsync::logging::init(cli.verbose, color);
    tracing::debug!(version = %signsync::version_string(), "signsync starting");

    match cli.command {
        Commands::Run { input, model, pace } => {
            let config = load_config(cli.config.as_deref())?;
            let options = RunOptions {
                input,
                model,
                pace,
                quiet: cli.quiet,
                color,
            };
            run_command(config, options).await?;
        }
        Commands::Check { model } => {
            let config = load_config(cli.config.as_deref())?;
            match check_command(config, model) {
                Ok(report) => {
                    println!("{} configuration is valid", "✓".green());
                    println!(
                        "  model: {} ({} classes, {} features)",
                        report.model, report.classes, report.feature_dims
                    );
                    println!(
                        "  window: {} frames, stride {}",
                        report.window_size, report.stride
                    );
                    for (index, label) in report.labels {
                        println!("  class {}: {}", index, label);
                    }
                }
                Err(e) => {
                    eprintln!("{} {}", "✗".red(), e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "signsync",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Load configuration from a custom path or the default location, then apply env overrides.
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = match custom_path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path()?)?,
    };
    config
        .with_env_overrides()
        .context("Invalid environment override")
}

fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Dump => {
            print!("{}", Config::default().to_toml()?);
        }
        ConfigAction::Path => {
            let path = match custom_path {
                Some(path) => path.to_path_buf(),
                None => Config::default_path()?,
            };
            let marker = if path.exists() {
                "exists".green().to_string()
            } else {
                "not found, using defaults".dimmed().to_string()
            };
            println!("{} ({})", path.display(), marker);
        }
    }
    Ok(())
}
