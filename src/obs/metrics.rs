// self
use crate::obs::{FlowKind, FlowOutcome};

/// Counter incremented once per flow attempt and once per terminal outcome.
pub const FLOW_COUNTER: &str = "appfolder_sync_flow_total";

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		let labels = flow_labels(kind, outcome)
			.into_iter()
			.map(|(key, value)| metrics::Label::new(key, value))
			.collect::<Vec<_>>();

		metrics::counter!(FLOW_COUNTER, labels).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = flow_labels(kind, outcome);
	}
}

/// Label pairs attached to [`FLOW_COUNTER`].
pub fn flow_labels(kind: FlowKind, outcome: FlowOutcome) -> [(&'static str, &'static str); 2] {
	[("flow", kind.as_str()), ("outcome", outcome.as_str())]
}
