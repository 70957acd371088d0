// self
use crate::obs::{IssueOutcome, SourceKind};

/// Records an issuance outcome via the global metrics recorder (when enabled).
pub fn record_issue_outcome(kind: SourceKind, outcome: IssueOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"token_source_issue_total",
			"source" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
