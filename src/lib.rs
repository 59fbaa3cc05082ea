//! Single-flight, time-bounded file token cache for protected asset URLs.
//!
//! A [`FileTokenCache`](cache::FileTokenCache) keeps one short-lived file token in memory,
//! coalesces concurrent issuance requests into a single call to a
//! [`TokenIssuer`](issuer::TokenIssuer), refreshes lazily once the token nears expiry, and
//! falls back to the unauthenticated URL when issuance fails.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod asset;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod issuer;
pub mod obs;
pub mod token;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicUsize, Ordering},
	};
	// crates.io
	use tokio::sync::watch;
	// self
	use crate::{
		error::IssuanceError,
		issuer::{IssueFuture, TokenIssuer},
		token::TokenSecret,
	};

	/// Issuer that replays queued outcomes and counts calls.
	///
	/// A gated issuer parks every call until [`ScriptedIssuer::release`] runs, which keeps an
	/// issuance in flight for as long as a test needs.
	#[derive(Debug)]
	pub struct ScriptedIssuer {
		outcomes: Mutex<VecDeque<Result<String, IssuanceError>>>,
		calls: AtomicUsize,
		gate: Option<watch::Sender<bool>>,
	}
	impl ScriptedIssuer {
		/// Creates an issuer that answers with `outcomes` in order.
		pub fn new<I, S>(outcomes: I) -> Self
		where
			I: IntoIterator<Item = Result<S, IssuanceError>>,
			S: Into<String>,
		{
			Self {
				outcomes: Mutex::new(
					outcomes.into_iter().map(|outcome| outcome.map(Into::into)).collect(),
				),
				calls: AtomicUsize::new(0),
				gate: None,
			}
		}

		/// Parks calls until [`ScriptedIssuer::release`] is invoked.
		pub fn gated(mut self) -> Self {
			self.gate = Some(watch::channel(false).0);

			self
		}

		/// Opens the gate for current and future calls.
		pub fn release(&self) {
			if let Some(gate) = &self.gate {
				gate.send_replace(true);
			}
		}

		/// Number of times [`TokenIssuer::issue`] has been invoked.
		pub fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}

		/// Waits until at least `count` calls were observed.
		pub async fn wait_for_calls(&self, count: usize) {
			while self.calls() < count {
				tokio::time::sleep(std::time::Duration::from_millis(1)).await;
			}
		}
	}
	impl TokenIssuer for ScriptedIssuer {
		fn issue(&self) -> IssueFuture<'_> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			let gate = self.gate.as_ref().map(watch::Sender::subscribe);

			Box::pin(async move {
				if let Some(mut gate) = gate {
					loop {
						let open = *gate.borrow_and_update();

						if open || gate.changed().await.is_err() {
							break;
						}
					}
				}

				self.outcomes
					.lock()
					.pop_front()
					.unwrap_or_else(|| Err(IssuanceError::Other("Script exhausted.".into())))
					.map(TokenSecret::new)
			})
		}
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
