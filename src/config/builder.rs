//! Validating builder for [`CacheConfig`].

// self
use crate::{_prelude::*, config::CacheConfig, error::ConfigError};

/// Builder for [`CacheConfig`] values.
#[derive(Debug)]
pub struct CacheConfigBuilder {
	/// Cache TTL measured from the start of issuance.
	pub cache_ttl: Duration,
	/// Server-side file token lifetime.
	pub token_lifetime: Duration,
	/// Optional issuance timeout.
	pub issue_timeout: Option<Duration>,
	/// Unparsed record store base URL.
	pub base_url: String,
}
impl CacheConfigBuilder {
	/// Creates a builder seeded with the crate defaults.
	pub fn new() -> Self {
		Self {
			cache_ttl: CacheConfig::DEFAULT_CACHE_TTL,
			token_lifetime: CacheConfig::DEFAULT_TOKEN_LIFETIME,
			issue_timeout: Some(CacheConfig::DEFAULT_ISSUE_TIMEOUT),
			base_url: CacheConfig::DEFAULT_BASE_URL.into(),
		}
	}

	/// Overrides the cache TTL.
	pub fn cache_ttl(mut self, ttl: Duration) -> Self {
		self.cache_ttl = ttl;

		self
	}

	/// Overrides the server-side token lifetime.
	pub fn token_lifetime(mut self, lifetime: Duration) -> Self {
		self.token_lifetime = lifetime;

		self
	}

	/// Bounds each issuance call with `timeout`.
	pub fn issue_timeout(mut self, timeout: Duration) -> Self {
		self.issue_timeout = Some(timeout);

		self
	}

	/// Lets issuance calls run without a deadline.
	pub fn without_issue_timeout(mut self) -> Self {
		self.issue_timeout = None;

		self
	}

	/// Sets the record store base URL.
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = url.into();

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<CacheConfig, ConfigError> {
		if !self.cache_ttl.is_positive() {
			return Err(ConfigError::InvalidTtl);
		}
		if self.cache_ttl >= self.token_lifetime {
			return Err(ConfigError::TtlNotBelowLifetime {
				ttl: self.cache_ttl,
				lifetime: self.token_lifetime,
			});
		}
		if let Some(timeout) = self.issue_timeout {
			if !timeout.is_positive() {
				return Err(ConfigError::NonPositiveTimeout);
			}
			if timeout >= self.cache_ttl {
				return Err(ConfigError::TimeoutNotBelowTtl { timeout, ttl: self.cache_ttl });
			}
		}

		let base_url = parse_base_url(&self.base_url)?;

		Ok(CacheConfig {
			cache_ttl: self.cache_ttl,
			token_lifetime: self.token_lifetime,
			issue_timeout: self.issue_timeout,
			base_url,
		})
	}
}
impl Default for CacheConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(raw)
		.map_err(|e| ConfigError::InvalidBaseUrl { url: raw.into(), source: Some(e) })?;

	if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
		return Err(ConfigError::InvalidBaseUrl { url: raw.into(), source: None });
	}

	Ok(url)
}
