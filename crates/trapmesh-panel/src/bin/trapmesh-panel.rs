//! CLI entrypoint for the trap module control panel.

#[path = "trapmesh-panel/cli.rs"]
mod cli;
#[path = "trapmesh-panel/commands.rs"]
mod commands;
#[path = "trapmesh-panel/output.rs"]
mod output;

use std::fs::File;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use trapmesh_panel::config::URL_ENV;
use trapmesh_panel::PanelConfig;

use cli::{Cli, Command};

fn main() -> anyhow::Result<()> {
    if let Err(err) = run() {
        eprintln!("{}", output::paint(output::Tone::Failed, format!("Error: {err:#}")));
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(Command::Completions { shell }) = cli.command {
        cli::print_completions(shell);
        return Ok(());
    }

    let mut config = PanelConfig::discover(cli.config.as_deref())?;
    let url = cli.url.or_else(|| std::env::var(URL_ENV).ok());
    if let Some(url) = url {
        config.set_url(&url)?;
    }

    let interactive = matches!(cli.command, None | Some(Command::Ui { .. }));
    init_logging(&config, cli.verbose, interactive)?;
    tracing::debug!(url = %config.url, "panel configured");

    match cli.command {
        None => commands::run_ui(&config, None),
        Some(Command::Ui { refresh }) => commands::run_ui(&config, refresh),
        Some(Command::Status) => commands::run_status(&config),
        Some(Command::Graph) => commands::run_graph(&config),
        Some(Command::TimeSync) => commands::run_time_sync(&config),
        Some(Command::Config {
            work,
            mode,
            start,
            end,
        }) => commands::run_config(&config, work, mode, start, end),
        Some(Command::Message { content, node }) => {
            commands::run_message(&config, content, node)
        }
        Some(Command::Snapshot { format }) => commands::run_snapshot(&config, format),
        Some(Command::Gps { action }) => commands::run_gps(&config, action),
        Some(Command::Completions { .. }) => Ok(()),
    }
}

/// Logs go to stderr, except under the terminal UI where they go to the
/// configured log file or nowhere.
fn init_logging(config: &PanelConfig, verbose: bool, interactive: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { config.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    if !interactive {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(());
    }
    let Some(path) = config.log_file.as_ref() else {
        return Ok(());
    };
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
