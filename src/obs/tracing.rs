// crates.io
use tracing::instrument::Instrumented;
// self
use crate::{_prelude::*, obs::FlowKind};

/// `tea_login.flow` span shared by login and refresh flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		Self { span: tracing::info_span!("tea_login.flow", flow = kind.as_str(), stage) }
	}

	/// Runs `fut` inside the span.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_passes_the_output_through() {
		let span = FlowSpan::new(FlowKind::Refresh, "instrument");

		assert_eq!(span.instrument(async { 42 }).await, 42);
	}
}
