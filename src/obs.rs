//! Optional observability helpers for cache operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `file_token_cache.op` with the `op` and
//!   `stage` fields, plus outcome events (`debug` for hits, joins, and issuances; `warn` for
//!   failures). Token values never reach a span or event.
//! - Enable `metrics` to increment the `file_token_cache_op_total` counter for every outcome,
//!   labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Cache operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheOp {
	/// [`FileTokenCache::get_token`](crate::cache::FileTokenCache::get_token).
	GetToken,
	/// [`FileTokenCache::authenticated_url`](crate::cache::FileTokenCache::authenticated_url).
	AuthenticatedUrl,
}
impl CacheOp {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheOp::GetToken => "get_token",
			CacheOp::AuthenticatedUrl => "authenticated_url",
		}
	}
}
impl Display for CacheOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheOutcome {
	/// Served from the cached token.
	Hit,
	/// Joined an issuance another caller started.
	Joined,
	/// Started a new issuance.
	Issued,
	/// Issuance failed and the error reached the caller.
	Failure,
	/// Issuance failed and the URL was returned without a token.
	FailOpen,
}
impl CacheOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheOutcome::Hit => "hit",
			CacheOutcome::Joined => "joined",
			CacheOutcome::Issued => "issued",
			CacheOutcome::Failure => "failure",
			CacheOutcome::FailOpen => "fail_open",
		}
	}

	/// Returns `true` for outcomes that indicate a failed issuance.
	pub const fn is_failure(self) -> bool {
		matches!(self, CacheOutcome::Failure | CacheOutcome::FailOpen)
	}
}
impl Display for CacheOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records `outcome` through every enabled sink.
pub fn record(op: CacheOp, outcome: CacheOutcome) {
	record_op_outcome(op, outcome);
	trace_op_outcome(op, outcome);
}
