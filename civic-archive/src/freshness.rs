//! Classifies a key's cache state (spec.md §4.6) from the cache row age and
//! the denormalized row count. Pure function — no DB access here, callers
//! supply both inputs from `database::queries`.

use chrono::{DateTime, Duration, Utc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
	Fresh,
	StaleButPresent,
	Cold,
}

pub fn classify(
	last_fetched: Option<DateTime<Utc>>,
	denormalized_row_count: i64,
	max_age: Duration,
	now: DateTime<Utc>,
) -> Freshness {
	if denormalized_row_count < 1 {
		return Freshness::Cold;
	}
	match last_fetched {
		Some(fetched) if now - fetched < max_age => Freshness::Fresh,
		_ => Freshness::StaleButPresent,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn max_age() -> Duration {
		Duration::days(90)
	}

	#[test]
	fn cold_when_no_rows_regardless_of_cache_row() {
		let now = Utc::now();
		assert_eq!(classify(Some(now), 0, max_age(), now), Freshness::Cold);
		assert_eq!(classify(None, 0, max_age(), now), Freshness::Cold);
	}

	#[test]
	fn fresh_when_row_exists_and_within_max_age() {
		let now = Utc::now();
		let fetched = now - Duration::days(1);
		assert_eq!(classify(Some(fetched), 3, max_age(), now), Freshness::Fresh);
	}

	#[test]
	fn stale_but_present_when_rows_exist_but_no_cache_row() {
		let now = Utc::now();
		assert_eq!(classify(None, 3, max_age(), now), Freshness::StaleButPresent);
	}

	#[test]
	fn stale_but_present_when_rows_exist_and_cache_row_is_too_old() {
		let now = Utc::now();
		let fetched = now - Duration::days(120);
		assert_eq!(classify(Some(fetched), 3, max_age(), now), Freshness::StaleButPresent);
	}
}
