// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for a single cache instance.
#[derive(Debug, Default)]
pub struct CacheMetrics {
	hits: AtomicU64,
	joins: AtomicU64,
	issuances: AtomicU64,
	failures: AtomicU64,
	fail_open: AtomicU64,
}
impl CacheMetrics {
	/// Returns the number of calls served from the cached token.
	pub fn hits(&self) -> u64 {
		self.hits.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that joined an in-flight issuance.
	pub fn joins(&self) -> u64 {
		self.joins.load(Ordering::Relaxed)
	}

	/// Returns the number of issuance calls started.
	pub fn issuances(&self) -> u64 {
		self.issuances.load(Ordering::Relaxed)
	}

	/// Returns the number of issuance calls that failed (once per issuance, not per waiter).
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Returns the number of URLs returned without a token.
	pub fn fail_open(&self) -> u64 {
		self.fail_open.load(Ordering::Relaxed)
	}

	pub(crate) fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_join(&self) {
		self.joins.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_issuance(&self) {
		self.issuances.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_fail_open(&self) {
		self.fail_open.fetch_add(1, Ordering::Relaxed);
	}
}
