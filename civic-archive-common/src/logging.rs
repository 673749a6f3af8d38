//! Structured logging init. Replaces the teacher's `fern`-based dual
//! stdout/file dispatcher with a single `tracing-subscriber` pipeline: a
//! service behind an HTTP front-end is expected to ship logs to a collector
//! rather than a local rotating file, and `tracing`'s spans let the
//! front-end (§4.7) attach `dbread`/`wait`/`total` timings to the same
//! record a human reads.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global `tracing` subscriber. Noisy third-party targets are
/// quieted the same way the teacher's logger quieted `cranelift_wasm` and
/// `sqlx` by default; `RUST_LOG` always wins if set.
pub fn init() {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=info"));

	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_target(true))
		.init();
}
