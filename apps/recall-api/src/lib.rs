pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = recall_cli::VERSION,
	rename_all = "kebab",
	styles = recall_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = recall_config::load(&args.config)?;

	init_tracing(&config);

	let bind: SocketAddr = config.service.http_bind.parse()?;
	let listener = TcpListener::bind(bind).await?;
	let router = routes::router(AppState::new(config).await?);

	tracing::info!(%bind, version = %recall_cli::long_version(), "Retrieval API listening.");

	axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

	tracing::info!("Retrieval API stopped.");

	Ok(())
}

async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		tracing::warn!(error = %err, "Failed to listen for shutdown signal.");

		std::future::pending::<()>().await;
	}
}

/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(config: &recall_config::Config) {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(&config.service.log_level))
		.unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
