// self
use crate::{_prelude::*, obs::GateAction};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedGate<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedGate<F> = F;

/// A span builder used by gatekeeper entry points.
#[derive(Clone, Debug)]
pub struct GateSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl GateSpan {
	/// Creates a new span tagged with the provided action + stage.
	pub fn new(action: GateAction, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("kv_gatekeeper.gate", action = action.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (action, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedGate<Fut>
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

/// Emits a debug event describing a refused or failed request.
pub fn trace_rejection(action: GateAction, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		match error {
			Error::Denied(denial) =>
				tracing::debug!(action = action.as_str(), reason = denial.code(), "request denied"),
			other => tracing::warn!(action = action.as_str(), error = %other, "request failed"),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (action, error);
	}
}
