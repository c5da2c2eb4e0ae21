mod cmd;
mod output;
mod render;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use cmd::run::RunArgs;
use cmd::simulate::SimulateArgs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "intersection",
    about = "Density-driven four-way signal sequencer",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .intersection/)
    #[arg(long, global = true, env = "INTERSECTION_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP shell (upload images, run, reset, SSE notifications)
    Serve {
        /// Port to listen on (default: server.port from config; 0 = OS-assigned)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Play back a run from fixed per-lane durations
    Simulate(SimulateArgs),

    /// Send four lane images to the density service and play back the result
    Run(RunArgs),

    /// Validate a saved density-service response
    Validate {
        /// Path to the JSON response body
        path: PathBuf,
    },

    /// Manage .intersection/config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Serve { port } => cmd::serve::run(&root, port),
        Commands::Simulate(args) => cmd::simulate::run(&root, args, cli.json),
        Commands::Run(args) => cmd::run::run(&root, args, cli.json),
        Commands::Validate { path } => cmd::validate::run(&path, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
