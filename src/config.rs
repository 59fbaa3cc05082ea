//! Validated cache configuration.

pub mod builder;

pub use builder::*;

// self
use crate::_prelude::*;

/// Runtime configuration for a [`FileTokenCache`](crate::cache::FileTokenCache).
///
/// Construct values through [`CacheConfig::builder`] so the TTL/lifetime relationship is
/// always validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
	/// How long an issued token is served from the cache, measured from the start of its
	/// issuance request.
	pub cache_ttl: Duration,
	/// Server-side lifetime of a file token.
	pub token_lifetime: Duration,
	/// Upper bound on a single issuance call; `None` waits indefinitely.
	///
	/// When set it is strictly below `cache_ttl`. An unbounded issuance that outlives the TTL
	/// still answers its waiters, but its token is not cached.
	pub issue_timeout: Option<Duration>,
	/// Base URL of the record store.
	pub base_url: Url,
}
impl CacheConfig {
	/// Default cache TTL, slightly below the store's default file token lifetime.
	pub const DEFAULT_CACHE_TTL: Duration = Duration::seconds(110);
	/// Default issuance timeout.
	pub const DEFAULT_ISSUE_TIMEOUT: Duration = Duration::seconds(30);
	/// Default server-side file token lifetime.
	pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::minutes(2);
	/// Local development address of the record store.
	pub const DEFAULT_BASE_URL: &'static str = "http://127.0.0.1:8090/";

	/// Returns a builder seeded with defaults.
	pub fn builder() -> CacheConfigBuilder {
		CacheConfigBuilder::new()
	}

	/// Time between the cached expiry and the server-side expiry.
	pub fn safety_margin(&self) -> Duration {
		self.token_lifetime - self.cache_ttl
	}

	/// Endpoint that issues file tokens.
	pub fn token_endpoint(&self) -> Url {
		self.endpoint(&["api", "files", "token"])
	}

	/// Appends percent-encoded path segments to the base URL.
	pub fn endpoint(&self, segments: &[&str]) -> Url {
		join_segments(&self.base_url, segments)
	}
}

pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Url {
	let mut url = base.clone();

	// Bases are validated as hierarchical URLs, so the segment iterator is always available.
	if let Ok(mut path) = url.path_segments_mut() {
		path.pop_if_empty().extend(segments);
	}

	url
}
