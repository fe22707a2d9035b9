mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use triage_core::config::{load_dotenv, Config};

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let args = CliArgs::parse();

    let config = match args.profile.as_deref() {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    };

    // RUST_LOG wins; otherwise the configured TRIAGE_LOG directive.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    config.log_summary();

    match args.command {
        Command::Evaluate(a) => commands::evaluate(&config, a),
        Command::TestRule(a) => commands::test_rule(&config, a),
        Command::Sentiment(a) => commands::sentiment(&config, a),
        Command::Validate(a) => commands::validate(&config, a),
        Command::Watch(a) => commands::watch(&config, a).await,
    }
}
