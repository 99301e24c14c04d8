//! CLI definitions for trapmesh-panel.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "trapmesh-panel",
    version,
    about = "Control panel for mesh trap modules",
    infer_subcommands = true,
    after_help = "Examples:\n  trapmesh-panel                          # terminal UI\n  trapmesh-panel --url http://192.168.4.1 status\n  trapmesh-panel config --work 180 --mode trap --start 6 --end 18\n  trapmesh-panel message \"hello\" --node 2733010421"
)]
pub struct Cli {
    /// Show debug logs.
    #[arg(long, short, global = true)]
    pub verbose: bool,
    /// Module base URL (overrides panel.toml and TRAPMESH_URL).
    #[arg(long, global = true)]
    pub url: Option<String>,
    /// Panel configuration file (default: ./panel.toml if present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive terminal UI (default).
    Ui {
        /// Refresh interval in milliseconds (overrides panel.refresh_ms).
        #[arg(long)]
        refresh: Option<u64>,
    },
    /// Print the module status.
    Status,
    /// Print the mesh topology as nodes and edges.
    Graph,
    /// Send the host clock to the module.
    TimeSync,
    /// Change module settings; omitted values stay unchanged.
    Config {
        /// Work time in minutes.
        #[arg(long)]
        work: Option<u32>,
        /// Trap mode: set or trap.
        #[arg(long)]
        mode: Option<String>,
        /// First active hour (0-24), requires --end.
        #[arg(long, requires = "end")]
        start: Option<u8>,
        /// Last active hour (0-24), requires --start.
        #[arg(long, requires = "start")]
        end: Option<u8>,
    },
    /// Send a debug message through the mesh.
    Message {
        /// Message text.
        content: String,
        /// Target node id (broadcast when omitted).
        #[arg(long)]
        node: Option<u32>,
    },
    /// Ask the module camera for a picture.
    Snapshot {
        /// Picture format code understood by the module.
        #[arg(long)]
        format: Option<u8>,
    },
    /// GPS fix control.
    Gps {
        #[command(subcommand)]
        action: GpsAction,
    },
    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum GpsAction {
    /// Reset the module's GPS fix.
    Init,
    /// Ask the module to acquire a GPS fix.
    Get,
}

/// Writes the completion script for `shell` to stdout.
pub fn print_completions(shell: Shell) {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
}
