//! Provider error taxonomy (spec.md §4.1, §7): transport and rate-limit
//! failures must surface as a typed error, never as an empty result slice,
//! so the warmer can distinguish "upstream has nothing for this key" from
//! "upstream could not be reached."

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
	#[error("rate limited by upstream provider")]
	RateLimited,
	#[error("upstream provider unavailable: {0}")]
	UpstreamUnavailable(String),
	#[error("upstream provider rejected credentials")]
	Auth,
	#[error("upstream returned a record this adapter could not decode: {0}")]
	Transform(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Classify a transport-level failure into the typed taxonomy. Shared by
/// both adapters so that a 429/401/connect-timeout maps the same way
/// regardless of which provider produced it.
pub fn map_transport_err(err: reqwest::Error) -> ProviderError {
	if err.is_timeout() || err.is_connect() {
		return ProviderError::UpstreamUnavailable(err.to_string());
	}
	if let Some(status) = err.status() {
		if status.as_u16() == 429 {
			return ProviderError::RateLimited;
		}
		if status.as_u16() == 401 || status.as_u16() == 403 {
			return ProviderError::Auth;
		}
		if status.is_server_error() {
			return ProviderError::UpstreamUnavailable(format!("upstream returned {status}"));
		}
	}
	ProviderError::UpstreamUnavailable(err.to_string())
}
