//! Connection pooling and migrations (spec.md §3, §6). The rest of the
//! crate talks to Postgres exclusively through [`Database::pool`] or
//! [`Database::conn`]; query and upsert logic live in sibling modules.

pub mod models;
pub mod queries;
pub mod upsert;

use std::time::Duration;

use sqlx::{
	pool::PoolConnection,
	postgres::{PgConnection, PgPool, PgPoolOptions, Postgres},
	Connection,
};

use crate::error::Result;

/// Run pending migrations against `url` using a single, throwaway connection.
/// Called once at startup before the pool is built.
pub async fn migrate<T: AsRef<str>>(url: T) -> Result<()> {
	let mut conn = PgConnection::connect(url.as_ref()).await?;
	sqlx::migrate!("./migrations").run(&mut conn).await?;
	Ok(())
}

pub type DbConn = PoolConnection<Postgres>;

#[derive(Clone)]
pub struct Database {
	pool: PgPool,
}

impl Database {
	pub async fn new(url: &str) -> Result<Self> {
		let pool = PgPoolOptions::new()
			.min_connections(2)
			.max_connections(20)
			.idle_timeout(Duration::from_secs(300))
			.connect(url)
			.await?;
		Ok(Self { pool })
	}

	pub fn with_pool(pool: PgPool) -> Self {
		Self { pool }
	}

	pub async fn conn(&self) -> Result<DbConn> {
		self.pool.acquire().await.map_err(Into::into)
	}

	pub fn pool(&self) -> &PgPool {
		&self.pool
	}
}
