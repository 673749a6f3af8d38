//! The core library's error taxonomy (spec.md §7). A `thiserror` enum per
//! crate boundary, same pattern the teacher uses for its own `ArchiveError`.

use civic_archive_providers::ProviderError;

pub type Result<T, E = ArchiveError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
	#[error("database error: {0}")]
	Sql(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migration(#[from] sqlx::migrate::MigrateError),
	#[error("upstream provider error: {0}")]
	Provider(#[from] ProviderError),
	#[error("invalid postal code: {0}")]
	InvalidPostalCode(#[from] civic_archive_common::InvalidPostalCode),
	#[error("record not found")]
	NotFound,
	#[error("warm for key {0} timed out after the 5 minute deadline")]
	WarmDeadlineExceeded(String),
}

impl ArchiveError {
	/// True for the error kinds spec.md §7 says must never stamp `KeyCache`
	/// (rate-limited / upstream-unavailable / provider auth failures).
	pub fn is_provider_failure(&self) -> bool {
		matches!(self, ArchiveError::Provider(_))
	}
}
