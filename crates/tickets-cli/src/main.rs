mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tickets",
    about = "Turn lines of a synced text file into Jira tickets",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .tickets/)
    #[arg(long, global = true, env = "TICKETS_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize tickets in the current directory
    Init {
        /// Task file to watch, relative to the project root
        #[arg(long)]
        task_file: Option<PathBuf>,
    },

    /// Run the polling daemon with its local control server
    Run {
        /// Port for the control server (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
        /// Polling interval in seconds (default: poll.interval_secs from config)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Run a single processing cycle in the foreground
    Process,

    /// Show the lines the next cycle would turn into tickets
    Preview,

    /// Show the state of the running daemon
    Status,

    /// Ask the running daemon to process now
    Trigger,

    /// Change the running daemon's polling interval
    Interval {
        /// New interval in seconds
        seconds: u64,
    },

    /// Stop the running daemon
    Stop,

    /// Inspect and validate configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } | Commands::Process => tracing::Level::INFO,
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
        Commands::Init { task_file } => cmd::init::run(&root, task_file),
        Commands::Run { port, interval } => cmd::run::run(&root, port, interval),
        Commands::Process => cmd::process::run(&root, cli.json),
        Commands::Preview => cmd::preview::run(&root, cli.json),
        Commands::Status => cmd::control::status(&root, cli.json),
        Commands::Trigger => cmd::control::trigger(&root, cli.json),
        Commands::Interval { seconds } => cmd::control::interval(&root, seconds, cli.json),
        Commands::Stop => cmd::control::stop(&root, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
