//! Bounded warmer task pool (spec.md §4.4a, §5): warmers run on their own
//! pool so a long warm cannot starve the request-handler pool. The teacher
//! bounds concurrency with an `xtra` `ActorPool`, which exists there to
//! route distinct message kinds to specialized actors; warms are all the
//! same shape, so a `tokio::sync::Semaphore` gating `tokio::spawn` is the
//! direct, tokio-native replacement.

use std::sync::Arc;

use civic_archive_common::PostalCode;
use civic_archive_providers::Provider;
use sqlx::PgPool;
use tokio::sync::Semaphore;

use crate::{singleflight::SingleFlight, warmer};

#[derive(Clone)]
pub struct WarmerPool {
	pool: PgPool,
	single_flight: SingleFlight,
	provider: Arc<dyn Provider>,
	semaphore: Arc<Semaphore>,
}

impl WarmerPool {
	pub fn new(pool: PgPool, single_flight: SingleFlight, provider: Arc<dyn Provider>, capacity: usize) -> Self {
		Self { pool, single_flight, provider, semaphore: Arc::new(Semaphore::new(capacity.max(1))) }
	}

	/// Fire-and-forget: spawns a warm if a pool slot is free. Dedup against
	/// concurrent kicks for the same key is the single-flight coordinator's
	/// job, not this pool's — callers may call `kick` freely.
	pub fn kick(&self, postal_code: PostalCode) {
		let pool = self.pool.clone();
		let single_flight = self.single_flight.clone();
		let provider = Arc::clone(&self.provider);
		let semaphore = Arc::clone(&self.semaphore);

		tokio::spawn(async move {
			let _permit = match semaphore.acquire_owned().await {
				Ok(permit) => permit,
				Err(_) => return,
			};
			if let Err(e) = warmer::warm_key(&pool, &single_flight, provider.as_ref(), &postal_code).await {
				tracing::warn!(postal_code = %postal_code, error = %e, "warm failed");
			}
		});
	}
}
