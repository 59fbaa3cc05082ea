//! Token issuance contracts.
//!
//! [`TokenIssuer`] is the cache's only dependency on the record store. The crate ships a
//! reqwest-backed [`HttpTokenIssuer`] (behind the default `reqwest` feature) that speaks the
//! store's `POST /api/files/token` protocol; tests and alternative transports implement the
//! trait directly.

#[cfg(feature = "reqwest")] mod http;

#[cfg(feature = "reqwest")] pub use http::*;

// self
use crate::{_prelude::*, error::IssuanceError, token::TokenSecret};

/// Boxed future returned by [`TokenIssuer::issue`].
pub type IssueFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenSecret, IssuanceError>> + 'a + Send>>;

/// Remote operation that mints a short-lived file token for the current session.
///
/// Implementations must be `Send + Sync + 'static` so a cache can share them across tasks.
/// The cache guarantees at most one outstanding call per cache instance.
pub trait TokenIssuer
where
	Self: 'static + Send + Sync,
{
	/// Requests a fresh token.
	fn issue(&self) -> IssueFuture<'_>;
}
