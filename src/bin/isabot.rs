// src/bin/isabot.rs
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use isabot::config::{self, AgentConfig, Credential};

#[derive(Parser)]
#[command(
    name = "isabot",
    about = "Echoes user messages on the isa-bot Discord channel"
)]
struct Cli {
    /// Authentication token needed to connect to the bot
    #[arg(short = 't', long = "token", value_name = "BOT_ACCESS_TOKEN")]
    token: String,
    /// Print messages the bot reacted to on standard output
    #[arg(short, long)]
    verbose: bool,
    /// Optional TOML file overriding host, channel and timing policy
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Channel to echo in (overrides the config file)
    #[arg(long)]
    channel: Option<String>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "isabot=debug" } else { "isabot=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(cli: &Cli) -> Result<AgentConfig> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?
            .with_context(|| format!("Config file {} not found", path.display()))?,
        None => AgentConfig::default(),
    };
    if let Some(channel) = &cli.channel {
        config.channel = channel.clone();
    }
    config.verbose |= cli.verbose;
    Ok(config)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load(&cli)?;
    if cli.token.trim().is_empty() {
        anyhow::bail!("Bot access token must not be empty");
    }
    let credential = Credential::new(cli.token.trim());

    let err = isabot::session::run(&config, &credential);
    eprintln!("isabot: {err}");
    Ok(ExitCode::from(err.exit_code()))
}
