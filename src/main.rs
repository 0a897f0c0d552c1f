//! Command-line driver: replays scripted play sessions against the overlay.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use quest_overlay::replay::{Replay, Script};
use quest_overlay::{OverlayConfig, QuestResult};

#[derive(Parser)]
#[command(
    name = "quest-overlay",
    about = "Replay scripted sessions against the quest overlay",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a session script and print what the player saw
    Run {
        /// TOML script of player actions
        script: PathBuf,

        /// Overlay config (default: built-in settings)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Parse a session script without running it
    Check {
        script: PathBuf,
    },

    /// Print the effective overlay config as TOML
    Config {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> QuestResult<OverlayConfig> {
    match path {
        Some(path) => OverlayConfig::load(path),
        None => Ok(OverlayConfig::default()),
    }
}

fn init_logging(config: &OverlayConfig) {
    let mut filter = EnvFilter::from_default_env();
    let mut bad_directive = None;
    match config.logging.filter.parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => bad_directive = Some(e),
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(e) = bad_directive {
        warn!("Ignoring log filter {:?}: {}", config.logging.filter, e);
    }
}

fn run(script_path: &Path, config_path: Option<&Path>) -> QuestResult<()> {
    let config = load_config(config_path)?;
    init_logging(&config);

    let script = Script::load(script_path)?;
    let mut replay = Replay::new(&config);
    let result = replay.run(&script);

    for line in replay.transcript() {
        println!("{line}");
    }
    result?;

    println!();
    for (kind, state) in replay.summary() {
        println!("{kind}: {}", state.as_str());
    }
    Ok(())
}

fn check(script_path: &Path) -> QuestResult<()> {
    let script = Script::load(script_path)?;
    println!("{} steps OK", script.steps.len());
    Ok(())
}

fn print_config(config_path: Option<&Path>) -> QuestResult<()> {
    let config = load_config(config_path)?;
    let text = toml::to_string_pretty(&config)?;
    print!("{text}");
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { script, config } => run(&script, config.as_deref()),
        Commands::Check { script } => check(&script),
        Commands::Config { config } => print_config(config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
