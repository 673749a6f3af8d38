//! Environment-driven configuration (spec.md §6), with a thin `clap` layer
//! for local-development overrides. Precedence, low to high: `.env` file,
//! process environment, CLI flags.

use std::fmt;

use serde::Deserialize;

/// The two upstream providers this build knows how to talk to. Provider
/// selection is process-wide (spec.md §4.1): there is no per-request
/// fallback between them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
	Cicero,
	Ballotready,
}

impl fmt::Display for Provider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Cicero => write!(f, "cicero"),
			Self::Ballotready => write!(f, "ballotready"),
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("missing required environment variable {0}")]
	MissingVar(&'static str),
	#[error("environment variable PROVIDER must be 'cicero' or 'ballotready', got {0:?}")]
	UnknownProvider(String),
	#[error("environment variable {name} could not be parsed: {source}")]
	InvalidVar { name: &'static str, source: std::num::ParseIntError },
}

/// Process-wide configuration, assembled once at startup and threaded
/// through the warmer and request-handler constructors (spec.md §9 design
/// note: the module-level DB handle becomes an explicit, passed-around
/// resource rather than a global).
#[derive(Clone, Debug)]
pub struct Config {
	pub database_url: String,
	pub provider: Provider,
	pub provider_key: String,
	pub port: u16,
	/// Freshness window (spec.md §4.6). Default 90 days.
	pub max_age_days: i64,
	/// Bound on concurrently in-flight warms per process (spec.md §4.4a).
	pub warmer_pool_size: usize,
}

impl Config {
	/// Load from the process environment (after a best-effort `.env` load).
	/// `clap`-parsed CLI overrides, if any, are applied by the caller via
	/// `apply_overrides`.
	pub fn from_env() -> Result<Self, ConfigError> {
		let _ = dotenv::dotenv(); // local dev convenience; absence is not an error

		let database_url = require_var("DATABASE_URL")?;
		let provider_raw = require_var("PROVIDER")?;
		let provider = match provider_raw.to_lowercase().as_str() {
			"cicero" => Provider::Cicero,
			"ballotready" => Provider::Ballotready,
			_ => return Err(ConfigError::UnknownProvider(provider_raw)),
		};
		let provider_key_var: &'static str = match provider {
			Provider::Cicero => "CICERO_KEY",
			Provider::Ballotready => "BALLOTREADY_KEY",
		};
		let provider_key = require_var(provider_key_var)?;

		let port = optional_var("PORT")
			.map(|v| v.parse::<u16>().map_err(|source| ConfigError::InvalidVar { name: "PORT", source }))
			.transpose()?
			.unwrap_or(5050);

		Ok(Self {
			database_url,
			provider,
			provider_key,
			port,
			max_age_days: 90,
			warmer_pool_size: num_cpus(),
		})
	}

	pub fn apply_overrides(&mut self, port: Option<u16>, max_age_days: Option<i64>) {
		if let Some(port) = port {
			self.port = port;
		}
		if let Some(max_age_days) = max_age_days {
			self.max_age_days = max_age_days;
		}
	}
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
	std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

fn optional_var(name: &'static str) -> Option<String> {
	std::env::var(name).ok()
}

fn num_cpus() -> usize {
	std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}
