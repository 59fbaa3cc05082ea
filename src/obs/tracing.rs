// self
use crate::{
	_prelude::*,
	obs::{CacheOp, CacheOutcome},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by cache operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(op: CacheOp, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::debug_span!("file_token_cache.op", op = op.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits an outcome event inside the current span (when enabled).
pub fn trace_op_outcome(op: CacheOp, outcome: CacheOutcome) {
	#[cfg(feature = "tracing")]
	{
		if outcome.is_failure() {
			tracing::warn!(op = op.as_str(), outcome = outcome.as_str(), "file token unavailable");
		} else {
			tracing::debug!(op = op.as_str(), outcome = outcome.as_str(), "file token resolved");
		}
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (op, outcome);
	}
}
