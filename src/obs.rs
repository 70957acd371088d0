//! Optional observability helpers for token issuance.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to emit spans named `token_source.issue` with a `source` field
//!   and log cache/issuance events. Events log at `debug`, or `info` when
//!   [`DebugFlags::verbose_logging`](crate::config::DebugFlags) is set.
//! - Enable `metrics` to increment the `token_source_issue_total` counter for every outcome,
//!   labeled by `source` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

pub(crate) use tracing::{auth_log, auth_warn};

// self
use crate::_prelude::*;

/// Token source variants observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
	/// Static bearer credential handed out as-is.
	Direct,
	/// Session credential exchanged for tenant tokens.
	Delegated,
}
impl SourceKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SourceKind::Direct => "direct",
			SourceKind::Delegated => "delegated",
		}
	}
}
impl Display for SourceKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each issuance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssueOutcome {
	/// Static credential returned.
	Passthrough,
	/// Cached token reused.
	CacheHit,
	/// Cache empty, stale, or for another tenant.
	CacheMiss,
	/// New token obtained from the issuer.
	Issued,
	/// Failure propagated back to the caller.
	Failure,
}
impl IssueOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			IssueOutcome::Passthrough => "passthrough",
			IssueOutcome::CacheHit => "cache_hit",
			IssueOutcome::CacheMiss => "cache_miss",
			IssueOutcome::Issued => "issued",
			IssueOutcome::Failure => "failure",
		}
	}
}
impl Display for IssueOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
