//! Reqwest-backed issuer for the record store's file token endpoint.

// crates.io
use reqwest::{
	StatusCode,
	header::{AUTHORIZATION, HeaderValue},
};
// self
use crate::{
	_prelude::*,
	config::CacheConfig,
	error::{ConfigError, IssuanceError},
	issuer::{IssueFuture, TokenIssuer},
	token::TokenSecret,
};

const BODY_PREVIEW_LIMIT: usize = 256;

#[derive(Deserialize)]
struct FileTokenResponse {
	token: String,
}

/// Issues file tokens by calling `POST {base}/api/files/token` with the session token.
///
/// The session token is supplied by whatever layer owns authentication and can be swapped at
/// any time (login, refresh, logout). Without a session the issuer fails with
/// [`IssuanceError::Unauthenticated`] and never touches the network. Redirects should be
/// disabled on custom clients; the endpoint answers directly.
pub struct HttpTokenIssuer {
	client: ReqwestClient,
	endpoint: Url,
	session: RwLock<Option<TokenSecret>>,
}
impl HttpTokenIssuer {
	/// Builds an issuer with a default reqwest client.
	pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::from)?;

		Ok(Self::with_client(config, client))
	}

	/// Wraps an existing reqwest client.
	pub fn with_client(config: &CacheConfig, client: ReqwestClient) -> Self {
		Self { client, endpoint: config.token_endpoint(), session: RwLock::new(None) }
	}

	/// Seeds the session token.
	pub fn with_session(self, session: impl Into<String>) -> Self {
		self.set_session(session);

		self
	}

	/// Replaces the session token used for future issuance calls.
	pub fn set_session(&self, session: impl Into<String>) {
		*self.session.write() = Some(TokenSecret::new(session));
	}

	/// Drops the session token.
	pub fn clear_session(&self) {
		*self.session.write() = None;
	}

	/// Returns `true` when a session token is present.
	pub fn has_session(&self) -> bool {
		self.session.read().is_some()
	}

	/// Endpoint the issuer posts to.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	async fn request_token(&self) -> Result<TokenSecret, IssuanceError> {
		let session = self.session.read().clone().ok_or(IssuanceError::Unauthenticated)?;
		let mut auth = HeaderValue::from_str(session.expose()).map_err(|_| {
			IssuanceError::Other("Session token is not a valid header value.".into())
		})?;

		auth.set_sensitive(true);

		let response =
			self.client.post(self.endpoint.clone()).header(AUTHORIZATION, auth).send().await?;
		let status = response.status();
		let body = response.bytes().await?;

		if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
			return Err(IssuanceError::Unauthenticated);
		}
		if !status.is_success() {
			return Err(IssuanceError::Rejected {
				status: status.as_u16(),
				message: body_preview(&body),
			});
		}

		let mut de = serde_json::Deserializer::from_slice(&body);
		let parsed: FileTokenResponse = serde_path_to_error::deserialize(&mut de)?;

		let token = TokenSecret::new(parsed.token);

		if token.is_empty() {
			return Err(IssuanceError::EmptyToken);
		}

		Ok(token)
	}
}
impl TokenIssuer for HttpTokenIssuer {
	fn issue(&self) -> IssueFuture<'_> {
		Box::pin(self.request_token())
	}
}
impl Debug for HttpTokenIssuer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpTokenIssuer")
			.field("endpoint", &self.endpoint.as_str())
			.field("session_set", &self.has_session())
			.finish()
	}
}

fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let text = text.trim();

	if text.chars().count() <= BODY_PREVIEW_LIMIT {
		return text.to_owned();
	}

	let mut buf: String = text.chars().take(BODY_PREVIEW_LIMIT).collect();

	buf.push('…');

	buf
}
