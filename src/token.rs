//! Token secrets and the cached token record.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` if the wrapped value is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// The single token held by a [`FileTokenCache`](crate::cache::FileTokenCache).
///
/// `expires_at` is derived from the configured cache TTL, which is always shorter than the
/// server-side lifetime, so a token judged valid here stays valid for at least one more use.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
	/// Opaque bearer token for protected asset fetches.
	pub value: TokenSecret,
	/// Instant the issuance request started.
	pub issued_at: OffsetDateTime,
	/// Instant after which the token must not be handed out.
	pub expires_at: OffsetDateTime,
}
impl CachedToken {
	/// Builds a record for a token whose issuance started at `issued_at`.
	pub fn new(value: TokenSecret, issued_at: OffsetDateTime, ttl: Duration) -> Self {
		Self { value, issued_at, expires_at: issued_at + ttl }
	}

	/// Returns `true` while `instant` is strictly before the expiry.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		instant < self.expires_at
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("value", &self.value)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert!(!secret.is_empty());
		assert!(TokenSecret::new("").is_empty());
	}

	#[test]
	fn cached_token_expires_exactly_at_the_boundary() {
		let issued = macros::datetime!(2025-02-20 08:00 UTC);
		let token = CachedToken::new(TokenSecret::new("abc"), issued, Duration::seconds(110));

		assert!(token.is_valid_at(issued));
		assert!(token.is_valid_at(issued + Duration::seconds(109)));
		assert!(!token.is_valid_at(issued + Duration::seconds(110)));
		assert!(!format!("{token:?}").contains("abc"));
	}
}
