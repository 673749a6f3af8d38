use std::sync::Arc;

use civic_archive::{Database, SingleFlight, WarmerPool};
use civic_archive_common::Config;
use civic_archive_providers::Provider;

pub struct AppState {
	pub db: Database,
	pub config: Config,
	pub warmer_pool: WarmerPool,
}

impl AppState {
	pub fn new(db: Database, config: Config, provider: Arc<dyn Provider>) -> Self {
		let single_flight = SingleFlight::new(db.pool().clone());
		let warmer_pool = WarmerPool::new(db.pool().clone(), single_flight, provider, config.warmer_pool_size);
		Self { db, config, warmer_pool }
	}
}
