//! Per-key single-flight coordination (spec.md §4.5): a Postgres advisory
//! lock keyed by [`PostalCode::lock_key`], backed by a process-local
//! `DashMap` so co-located requests can skip the round-trip to Postgres
//! entirely when another task on the same worker already owns the warm.
//!
//! Session-level advisory locks are tied to the connection that took them:
//! `pg_advisory_unlock` only succeeds on the same backend that called
//! `pg_advisory_lock`. A pooled connection is returned to the pool as soon
//! as a query finishes, so acquire and release must pin and hold the same
//! [`PoolConnection`] for the lock's whole lifetime rather than going
//! through `&PgPool` on each call — otherwise `release` may unlock nothing
//! (or, worse, unlock on a connection that never held the lock).

use std::sync::Arc;

use dashmap::DashMap;
use sqlx::{pool::PoolConnection, PgPool, Postgres};

use crate::error::Result;

/// Non-blocking by contract (spec.md §5 suspension points): `try_acquire`
/// never uses the session-blocking `pg_advisory_lock` variant.
#[derive(Clone)]
pub struct SingleFlight {
	pool: PgPool,
	held: Arc<DashMap<i32, PoolConnection<Postgres>>>,
}

impl SingleFlight {
	pub fn new(pool: PgPool) -> Self {
		Self { pool, held: Arc::new(DashMap::new()) }
	}

	/// Attempts to become the sole owner of the warm for `lock_key`. Returns
	/// `false` if another worker (or another task in this process) already
	/// holds it — the caller must not spawn a warm in that case.
	pub async fn try_acquire(&self, lock_key: i32) -> Result<bool> {
		if self.held.contains_key(&lock_key) {
			return Ok(false);
		}
		let mut conn = self.pool.acquire().await?;
		let acquired: bool =
			sqlx::query_scalar("SELECT pg_try_advisory_lock($1)").bind(lock_key).fetch_one(&mut *conn).await?;
		if !acquired {
			return Ok(false);
		}
		// Racing tasks may both reach here only if two different connections
		// both won `pg_try_advisory_lock` for the same key, which Postgres
		// never allows; `insert` here cannot observe an existing entry.
		self.held.insert(lock_key, conn);
		Ok(true)
	}

	/// Releases the DB advisory lock on the connection that took it. Crash
	/// safety doesn't depend on this running: Postgres drops advisory locks
	/// when the holding session closes, so a crashed worker's locks are
	/// released automatically and the next request re-acquires.
	pub async fn release(&self, lock_key: i32) -> Result<()> {
		let Some((_, mut conn)) = self.held.remove(&lock_key) else {
			return Ok(());
		};
		sqlx::query("SELECT pg_advisory_unlock($1)").bind(lock_key).execute(&mut *conn).await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn held_map_blocks_a_second_local_caller_before_any_db_round_trip() {
		let held: DashMap<i32, ()> = DashMap::new();
		held.insert(42, ());
		assert!(held.contains_key(&42));
	}
}
