//! The provider-agnostic boundary between upstream civic-data APIs and the
//! rest of civic-archive (spec.md §4.1). Consumers should depend on
//! [`Provider`] and [`NormalizedOfficial`] only; `cicero` and `ballotready`
//! are implementation details selected once, at startup, by
//! `civic_archive_common::Provider`.

mod ballotready;
mod cicero;
mod error;
mod normalized;
mod provider;

pub use ballotready::BallotReadyProvider;
pub use cicero::CiceroProvider;
pub use error::{map_transport_err, ProviderError, Result};
pub use normalized::*;
pub use provider::Provider;

/// Build the configured provider adapter from process-wide config.
pub fn build_provider(
	provider: civic_archive_common::Provider,
	api_key: String,
) -> Box<dyn Provider> {
	match provider {
		civic_archive_common::Provider::Cicero => Box::new(CiceroProvider::new(api_key)),
		civic_archive_common::Provider::Ballotready => Box::new(BallotReadyProvider::new(api_key)),
	}
}
