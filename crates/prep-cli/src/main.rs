//! Interview prep CLI entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use prep_cli::cli::Cli;
use prep_cli::commands;

fn main() {
    // Load .env.local first so it wins over .env
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let state_dir = cli.state_dir();
    let result = match cli.client_config() {
        Ok(config) => commands::execute(cli.command, &config, &state_dir),
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
