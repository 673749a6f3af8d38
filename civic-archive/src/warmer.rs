//! Drives adapter → transformer → upsert → association refresh → sweep for
//! one postal code (spec.md §4.4). This is the function the bounded task
//! pool in `pool.rs` spawns, and the function the block-poll request path
//! kicks asynchronously on a stale read.

use std::time::Duration;

use chrono::Utc;
use civic_archive_common::PostalCode;
use civic_archive_providers::Provider;
use sqlx::PgPool;

use crate::{
	database::{queries, upsert},
	error::{ArchiveError, Result},
	singleflight::SingleFlight,
};

/// Spec.md §5 gives warms a generous ceiling so a slow upstream can't pin a
/// worker's warm-pool slot forever.
pub const WARM_DEADLINE: Duration = Duration::from_secs(300);

/// Runs one full warm for `postal_code`, bracketed by the single-flight
/// lock. Returns `Ok(())` both when the warm completed and when another
/// worker already owned it — the caller only needs to know "a warm is (or
/// was) in flight", not who ran it.
pub async fn warm_key(
	pool: &PgPool,
	single_flight: &SingleFlight,
	provider: &dyn Provider,
	postal_code: &PostalCode,
) -> Result<()> {
	match tokio::time::timeout(WARM_DEADLINE, warm_key_inner(pool, single_flight, provider, postal_code)).await
	{
		Ok(result) => result,
		Err(_) => Err(ArchiveError::WarmDeadlineExceeded(postal_code.as_str().to_string())),
	}
}

async fn warm_key_inner(
	pool: &PgPool,
	single_flight: &SingleFlight,
	provider: &dyn Provider,
	postal_code: &PostalCode,
) -> Result<()> {
	let lock_key = postal_code.lock_key();
	if !single_flight.try_acquire(lock_key).await? {
		tracing::debug!(postal_code = %postal_code, "warm already in flight, skipping");
		return Ok(());
	}

	let result = run_warm(pool, provider, postal_code).await;
	if let Err(release_err) = single_flight.release(lock_key).await {
		tracing::warn!(postal_code = %postal_code, error = %release_err, "failed to release single-flight lock");
	}
	result
}

async fn run_warm(pool: &PgPool, provider: &dyn Provider, postal_code: &PostalCode) -> Result<()> {
	let warm_start_time = Utc::now();

	// A provider error before any upsert aborts the warm without touching
	// KeyCache, preserving the previous freshness stamp (spec.md §4.4).
	let officials = provider.fetch_by_key(postal_code.as_str(), None).await?;

	for official in &officials {
		match upsert::upsert_official(pool, official).await {
			Ok(outcome) => {
				if let Err(e) = queries::key_association_upsert(
					pool,
					postal_code.as_str(),
					outcome.official_id,
					warm_start_time,
				)
				.await
				{
					tracing::warn!(
						postal_code = %postal_code,
						official_external_id = %official.external_id,
						error = %e,
						"failed to write key_association after a successful upsert"
					);
				}
			}
			Err(e) => {
				tracing::warn!(
					postal_code = %postal_code,
					official_external_id = %official.external_id,
					error = %e,
					"skipping official: transform or upsert failed"
				);
			}
		}
	}

	// A zero-result upstream is still recorded, so the front-end doesn't
	// hammer the upstream again before max_age elapses (spec.md §4.4).
	let swept = queries::finish_warm(pool, postal_code.as_str(), warm_start_time).await?;
	tracing::info!(
		postal_code = %postal_code,
		fetched = officials.len(),
		swept,
		"warm complete"
	);
	Ok(())
}
