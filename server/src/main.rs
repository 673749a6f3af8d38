mod cli_opts;
mod http;
mod state;

use std::sync::Arc;

use civic_archive::Database;
use civic_archive_common::Config;
use civic_archive_providers::build_provider;

use crate::{cli_opts::CliOpts, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	civic_archive_common::logging::init();

	let cli = CliOpts::parse_args();
	let mut config = Config::from_env()?;
	config.apply_overrides(cli.port, cli.max_age_days);

	civic_archive::database::migrate(&config.database_url).await?;
	let db = Database::new(&config.database_url).await?;

	let provider = Arc::from(build_provider(config.provider, config.provider_key.clone()));
	let state = Arc::new(AppState::new(db, config.clone(), provider));

	let router = http::build_router(state);
	let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
	tracing::info!(port = config.port, provider = %config.provider, "civic-archive-server listening");
	axum::serve(listener, router).await?;

	Ok(())
}
