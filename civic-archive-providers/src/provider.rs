//! The provider adapter contract (spec.md §4.1). Both in-scope adapters
//! (`cicero`, `ballotready`) implement this trait; the warmer depends only
//! on it, never on a concrete adapter, so provider selection stays a
//! process-wide configuration value with no per-request fallback.

use async_trait::async_trait;
use civic_archive_common::DistrictType;

use crate::{error::Result, normalized::NormalizedOfficial};

#[async_trait]
pub trait Provider: Send + Sync {
	/// Fetch every official associated with a postal code. Pagination is
	/// fully exhausted before this returns (spec.md §4.1): a short page
	/// terminates, a full-size page forces another round.
	async fn fetch_by_key(
		&self,
		postal_code: &str,
		district_type_filter: Option<&[DistrictType]>,
	) -> Result<Vec<NormalizedOfficial>>;

	/// Fetch the federal rollup (every national-level official).
	async fn fetch_federal(&self) -> Result<Vec<NormalizedOfficial>>;

	/// Fetch every official for a state, seeded by one representative
	/// postal code within that state (some upstreams require a concrete
	/// location to resolve state-level districts).
	async fn fetch_by_state(&self, state: &str, sample_postal_code: &str) -> Result<Vec<NormalizedOfficial>>;

	async fn health_check(&self) -> Result<()>;
}
