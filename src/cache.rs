//! Single-flight file token cache.
//!
//! [`FileTokenCache::get_token`] serves the cached token while it is fresh, otherwise joins
//! the issuance already in flight, otherwise starts one. The in-flight issuance is a shared
//! future: every caller that observes it receives that exact outcome, success or failure.
//! The future itself stores a successful token and clears the in-flight marker, so a caller
//! being dropped mid-await never strands the cache.

mod metrics;

pub use metrics::CacheMetrics;

// std
use std::sync::Weak;
// crates.io
use futures::future::{self, BoxFuture, Either, FutureExt, Shared};
use futures_timer::Delay;
// self
use crate::{
	_prelude::*,
	asset::{self, FileRef},
	clock::{Clock, SystemClock},
	config::CacheConfig,
	error::IssuanceError,
	issuer::TokenIssuer,
	obs::{self, CacheOp, CacheOutcome, OpSpan},
	token::{CachedToken, TokenSecret},
};

type IssueOutcome = Result<TokenSecret, IssuanceError>;
type InFlight = Shared<BoxFuture<'static, IssueOutcome>>;

/// Observable cache state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
	/// No usable token; the next call issues one.
	Empty,
	/// A token is cached and unexpired.
	Valid {
		/// Instant the cached token stops being served.
		expires_at: OffsetDateTime,
	},
	/// An issuance is in flight; callers join it.
	Refreshing,
}

/// Process-wide cache for the protected-asset token.
///
/// Cloning is cheap and every clone shares the same cached token and in-flight issuance.
#[derive(Clone)]
pub struct FileTokenCache {
	inner: Arc<CacheInner>,
}
impl FileTokenCache {
	/// Creates a cache backed by the wall clock.
	pub fn new(config: CacheConfig, issuer: Arc<dyn TokenIssuer>) -> Self {
		Self::with_clock(config, issuer, Arc::new(SystemClock))
	}

	/// Creates a cache that reads time from `clock`.
	pub fn with_clock(
		config: CacheConfig,
		issuer: Arc<dyn TokenIssuer>,
		clock: Arc<dyn Clock>,
	) -> Self {
		Self {
			inner: Arc::new(CacheInner {
				config,
				issuer,
				clock,
				slot: Default::default(),
				metrics: Default::default(),
			}),
		}
	}

	/// Configuration the cache was built with.
	pub fn config(&self) -> &CacheConfig {
		&self.inner.config
	}

	/// Per-instance counters.
	pub fn metrics(&self) -> &CacheMetrics {
		&self.inner.metrics
	}

	/// Returns a currently valid token, issuing one if needed.
	///
	/// Concurrent callers that find the cache empty or expired share a single issuance call.
	/// Failures are not cached: the next call after a failure starts a fresh issuance.
	pub async fn get_token(&self) -> Result<TokenSecret> {
		const OP: CacheOp = CacheOp::GetToken;

		let span = OpSpan::new(OP, "get_token");

		span.instrument(async move {
			let (flight, outcome) = match self.inner.acquire() {
				Acquired::Cached(token) => {
					obs::record(OP, CacheOutcome::Hit);

					return Ok(token);
				},
				Acquired::Joined(flight) => (flight, CacheOutcome::Joined),
				Acquired::Started(flight) => (flight, CacheOutcome::Issued),
			};

			match flight.await {
				Ok(token) => {
					obs::record(OP, outcome);

					Ok(token)
				},
				Err(err) => {
					obs::record(OP, CacheOutcome::Failure);

					Err(Error::from(err))
				},
			}
		})
		.await
	}

	/// Appends `token=<value>` to `base_url`.
	///
	/// Never fails: if no token can be obtained the URL is returned unchanged so the asset
	/// endpoint reports the authorization failure itself.
	pub async fn authenticated_url(&self, base_url: &str) -> String {
		match self.get_token().await {
			Ok(token) => asset::append_token(base_url, &token),
			Err(_) => {
				self.inner.metrics.record_fail_open();
				obs::record(CacheOp::AuthenticatedUrl, CacheOutcome::FailOpen);

				base_url.to_owned()
			},
		}
	}

	/// Builds the authorized URL of a record attachment below the configured base URL.
	pub async fn authenticated_file_url(&self, file: &FileRef) -> String {
		let url = file.url(&self.inner.config.base_url);

		self.authenticated_url(url.as_str()).await
	}

	/// Returns the cached token if it is still valid, without issuing.
	pub fn cached(&self) -> Option<CachedToken> {
		let now = self.inner.clock.now();

		self.inner.slot.lock().cached.as_ref().filter(|token| token.is_valid_at(now)).cloned()
	}

	/// Snapshot of the cache state at the current instant.
	pub fn state(&self) -> CacheState {
		let now = self.inner.clock.now();
		let slot = self.inner.slot.lock();

		if slot.in_flight.is_some() {
			return CacheState::Refreshing;
		}

		match slot.cached.as_ref() {
			Some(token) if token.is_valid_at(now) =>
				CacheState::Valid { expires_at: token.expires_at },
			_ => CacheState::Empty,
		}
	}

	/// Drops the cached token. An issuance already in flight still completes and is cached.
	pub fn invalidate(&self) {
		self.inner.slot.lock().cached = None;
	}
}
#[cfg(feature = "reqwest")]
impl FileTokenCache {
	/// Creates a cache backed by an [`HttpTokenIssuer`](crate::issuer::HttpTokenIssuer) for
	/// `config.base_url`.
	///
	/// The issuer is returned alongside the cache so the authentication layer can install or
	/// clear the session token.
	pub fn http(config: CacheConfig) -> Result<(Self, Arc<crate::issuer::HttpTokenIssuer>)> {
		let issuer = Arc::new(crate::issuer::HttpTokenIssuer::new(&config)?);
		let cache = Self::new(config, issuer.clone());

		Ok((cache, issuer))
	}
}
impl Debug for FileTokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FileTokenCache")
			.field("config", &self.inner.config)
			.field("state", &self.state())
			.finish()
	}
}

enum Acquired {
	Cached(TokenSecret),
	Joined(InFlight),
	Started(InFlight),
}

#[derive(Default)]
struct CacheSlot {
	cached: Option<CachedToken>,
	in_flight: Option<InFlight>,
}

struct CacheInner {
	config: CacheConfig,
	issuer: Arc<dyn TokenIssuer>,
	clock: Arc<dyn Clock>,
	slot: Mutex<CacheSlot>,
	metrics: CacheMetrics,
}
impl CacheInner {
	/// Decides how a caller obtains its token. The freshness check and the start of an
	/// issuance happen under one lock so two issuances never overlap.
	fn acquire(self: &Arc<Self>) -> Acquired {
		let now = self.clock.now();
		let mut slot = self.slot.lock();

		let fresh = slot
			.cached
			.as_ref()
			.filter(|token| token.is_valid_at(now))
			.map(|token| token.value.clone());

		if let Some(token) = fresh {
			self.metrics.record_hit();

			return Acquired::Cached(token);
		}

		// Expired tokens are dropped as soon as a caller observes them.
		slot.cached = None;

		if let Some(flight) = slot.in_flight.as_ref() {
			self.metrics.record_join();

			return Acquired::Joined(flight.clone());
		}

		let flight = self.start_issuance(now);

		slot.in_flight = Some(flight.clone());
		self.metrics.record_issuance();

		Acquired::Started(flight)
	}

	fn start_issuance(self: &Arc<Self>, started_at: OffsetDateTime) -> InFlight {
		let issuer = self.issuer.clone();
		let timeout = self.config.issue_timeout;
		let owner: Weak<Self> = Arc::downgrade(self);

		async move {
			let outcome = match timeout {
				Some(limit) => {
					let deadline = Delay::new(limit.unsigned_abs());

					match future::select(issuer.issue(), deadline).await {
						Either::Left((outcome, _)) => outcome,
						Either::Right(((), _)) => Err(IssuanceError::TimedOut { after: limit }),
					}
				},
				None => issuer.issue().await,
			};

			if let Some(owner) = owner.upgrade() {
				owner.complete(started_at, &outcome);
			}

			outcome
		}
		.boxed()
		.shared()
	}

	fn complete(&self, started_at: OffsetDateTime, outcome: &IssueOutcome) {
		let mut slot = self.slot.lock();

		slot.in_flight = None;

		match outcome {
			Ok(token) => {
				let record = CachedToken::new(token.clone(), started_at, self.config.cache_ttl);

				// An issuance that outlived the TTL still answers its waiters but is not kept.
				if record.is_valid_at(self.clock.now()) {
					slot.cached = Some(record);
				}
			},
			Err(_) => self.metrics.record_failure(),
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::{_preludet::ScriptedIssuer, clock::ManualClock};

	fn cache_with(issuer: Arc<ScriptedIssuer>) -> (FileTokenCache, ManualClock) {
		let clock = ManualClock::new(macros::datetime!(2025-02-20 08:00 UTC));
		let config = CacheConfig::builder().build().expect("Default config should be valid.");
		let cache = FileTokenCache::with_clock(config, issuer, Arc::new(clock.clone()));

		(cache, clock)
	}

	#[tokio::test]
	async fn state_follows_the_token_lifecycle() {
		let issuer = Arc::new(ScriptedIssuer::new([Ok("abc")]));
		let (cache, clock) = cache_with(issuer.clone());

		assert_eq!(cache.state(), CacheState::Empty);

		cache.get_token().await.expect("Scripted issuance should succeed.");

		let expires_at = clock.now() + Duration::seconds(110);

		assert_eq!(cache.state(), CacheState::Valid { expires_at });
		assert_eq!(cache.cached().map(|token| token.expires_at), Some(expires_at));

		clock.advance(Duration::seconds(110));

		assert_eq!(cache.state(), CacheState::Empty);
		assert!(cache.cached().is_none());
	}

	#[tokio::test]
	async fn state_reports_refreshing_while_issuance_is_pending() {
		let issuer = Arc::new(ScriptedIssuer::new([Ok("gated")]).gated());
		let (cache, _clock) = cache_with(issuer.clone());
		let waiter = tokio::spawn({
			let cache = cache.clone();

			async move { cache.get_token().await }
		});

		issuer.wait_for_calls(1).await;

		assert_eq!(cache.state(), CacheState::Refreshing);

		issuer.release();

		let token = waiter
			.await
			.expect("Waiter task should not panic.")
			.expect("Gated issuance should succeed once released.");

		assert_eq!(token.expose(), "gated");
		assert!(matches!(cache.state(), CacheState::Valid { .. }));
	}

	#[tokio::test]
	async fn invalidate_forces_reissuance() {
		let issuer = Arc::new(ScriptedIssuer::new([Ok("first"), Ok("second")]));
		let (cache, _clock) = cache_with(issuer.clone());

		assert_eq!(
			cache.get_token().await.expect("First issuance should succeed.").expose(),
			"first"
		);

		cache.invalidate();

		assert_eq!(
			cache.get_token().await.expect("Second issuance should succeed.").expose(),
			"second"
		);
		assert_eq!(issuer.calls(), 2);
		assert_eq!(cache.metrics().issuances(), 2);
	}

	#[tokio::test]
	async fn abandoned_issuance_is_resumed_by_the_next_caller() {
		let issuer = Arc::new(ScriptedIssuer::new([Ok("resumed")]).gated());
		let (cache, _clock) = cache_with(issuer.clone());
		let abandoned = tokio::spawn({
			let cache = cache.clone();

			async move { cache.get_token().await }
		});

		issuer.wait_for_calls(1).await;
		abandoned.abort();
		let _ = abandoned.await;

		assert_eq!(cache.state(), CacheState::Refreshing);

		issuer.release();

		let token = cache.get_token().await.expect("Joined issuance should succeed.");

		assert_eq!(token.expose(), "resumed");
		assert_eq!(issuer.calls(), 1);
		assert_eq!(cache.metrics().joins(), 1);
	}

	#[tokio::test]
	async fn issuance_outliving_the_ttl_is_not_cached() {
		let issuer = Arc::new(ScriptedIssuer::new([Ok("slow"), Ok("next")]).gated());
		let clock = ManualClock::new(macros::datetime!(2025-02-20 08:00 UTC));
		let config = CacheConfig::builder()
			.without_issue_timeout()
			.build()
			.expect("Unbounded issuance should be a valid configuration.");
		let cache = FileTokenCache::with_clock(config, issuer.clone(), Arc::new(clock.clone()));
		let waiter = tokio::spawn({
			let cache = cache.clone();

			async move { cache.get_token().await }
		});

		issuer.wait_for_calls(1).await;
		clock.advance(Duration::seconds(115));
		issuer.release();

		let token = waiter
			.await
			.expect("Waiter task should not panic.")
			.expect("Slow issuance should still answer its waiter.");

		assert_eq!(token.expose(), "slow");
		assert_eq!(cache.state(), CacheState::Empty);
		assert!(cache.cached().is_none());
		assert_eq!(
			cache.get_token().await.expect("The next call should issue again.").expose(),
			"next"
		);
		assert_eq!(issuer.calls(), 2);
	}
}
