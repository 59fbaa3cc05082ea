//! Cache-level error types shared by the issuer, configuration, and cache layers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The issuance call failed or the session was unauthenticated.
	#[error("File token issuance failed.")]
	TokenIssuanceFailed(
		#[from]
		#[source]
		IssuanceError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Returns the issuance failure, if this error carries one.
	pub fn issuance(&self) -> Option<&IssuanceError> {
		match self {
			Self::TokenIssuanceFailed(inner) => Some(inner),
			Self::Config(_) => None,
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// Record store base URL cannot be used to derive endpoints.
	#[error("Record store base URL is invalid: {url}.")]
	InvalidBaseUrl {
		/// Offending URL.
		url: String,
		/// Underlying parsing failure, when available.
		#[source]
		source: Option<url::ParseError>,
	},
	/// Cache TTL must be positive.
	#[error("The cache TTL must be positive.")]
	InvalidTtl,
	/// Cache TTL must leave a safety margin below the server-side token lifetime.
	#[error("The cache TTL ({ttl}) must be strictly less than the token lifetime ({lifetime}).")]
	TtlNotBelowLifetime {
		/// Configured cache TTL.
		ttl: Duration,
		/// Configured server-side token lifetime.
		lifetime: Duration,
	},
	/// Issuance timeout must be positive when set.
	#[error("The issuance timeout must be positive.")]
	NonPositiveTimeout,
	/// Issuance timeout must expire before a token issued under it would go stale.
	#[error("The issuance timeout ({timeout}) must be strictly less than the cache TTL ({ttl}).")]
	TimeoutNotBelowTtl {
		/// Configured issuance timeout.
		timeout: Duration,
		/// Configured cache TTL.
		ttl: Duration,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Reasons a token issuance attempt failed.
///
/// Values are [`Clone`] so a single failure can be delivered to every caller that joined the
/// same in-flight issuance.
#[derive(Clone, Debug, ThisError)]
pub enum IssuanceError {
	/// No session is available, or the store rejected the session.
	#[error("The session is not authenticated.")]
	Unauthenticated,
	/// Token endpoint answered with a non-success status.
	#[error("Token endpoint rejected the request with status {status}: {message}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Truncated response body.
		message: String,
	},
	/// Network or IO failure while calling the token endpoint.
	#[error("Network error occurred while calling the token endpoint.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: SharedError,
	},
	/// Token endpoint responded with a body that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: Arc<serde_path_to_error::Error<serde_json::Error>>,
	},
	/// Token endpoint returned an empty token.
	#[error("Token endpoint returned an empty token.")]
	EmptyToken,
	/// Issuance did not complete within the configured timeout.
	#[error("Token issuance timed out after {after}.")]
	TimedOut {
		/// Timeout that elapsed.
		after: Duration,
	},
	/// Any other issuer-specific failure.
	#[error("{0}")]
	Other(String),
}
impl IssuanceError {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Transport { source: Arc::new(src) }
	}
}
impl From<serde_path_to_error::Error<serde_json::Error>> for IssuanceError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::MalformedResponse { source: Arc::new(e) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for IssuanceError {
	fn from(e: ReqwestError) -> Self {
		Self::transport(e)
	}
}
