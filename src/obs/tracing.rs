// self
use crate::{_prelude::*, obs::SourceKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedIssue<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedIssue<F> = F;

/// Span wrapped around each token issuance.
#[derive(Clone, Debug)]
pub struct IssueSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl IssueSpan {
	/// Creates a new span tagged with the provided source kind.
	pub fn new(kind: SourceKind) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::debug_span!("token_source.issue", source = kind.as_str());

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = kind;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedIssue<Fut>
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

/// Logs an auth event at `info` when `$verbose` is set, `debug` otherwise.
macro_rules! auth_log {
	($verbose:expr, $($arg:tt)+) => {{
		#[cfg(feature = "tracing")]
		{
			if $verbose {
				::tracing::info!($($arg)+);
			} else {
				::tracing::debug!($($arg)+);
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = $verbose;
			let _ = format_args!($($arg)+);
		}
	}};
}

/// Logs a degraded-but-recoverable auth event at `warn`.
macro_rules! auth_warn {
	($($arg:tt)+) => {{
		#[cfg(feature = "tracing")]
		{
			::tracing::warn!($($arg)+);
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = format_args!($($arg)+);
		}
	}};
}

pub(crate) use {auth_log, auth_warn};
