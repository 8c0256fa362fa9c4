//! Main entry point for the service intake bot.
//!
//! Loads the configuration, wires the configured storage and messaging
//! transport into the intake engine, and runs it until interrupted.

use clap::Parser;
use intake_config::Config;
use std::path::PathBuf;

mod factory_registry;

/// Command-line arguments for the intake bot.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/intake.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the intake bot.
///
/// A `.env` file in the working directory is loaded before the
/// configuration so `${BOT_TOKEN}` and `${ADMIN_ID}` can come from it.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	let dotenv = dotenvy::dotenv();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(args.log_level.clone()));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	match dotenv {
		Ok(path) => tracing::debug!(path = %path.display(), "Loaded environment file"),
		Err(e) if e.not_found() => {},
		Err(e) => tracing::warn!(error = %e, "Failed to read environment file"),
	}

	let config = Config::from_file(&args.config).await.map_err(|e| {
		tracing::error!(path = %args.config.display(), error = %e, "Invalid configuration");
		e
	})?;
	tracing::info!(
		storage = %config.storage.primary,
		transport = %config.transport.primary,
		"Loaded configuration"
	);

	let engine = factory_registry::build_intake_from_config(config)?;
	engine.run().await?;

	tracing::info!("Stopped intake bot");
	Ok(())
}
