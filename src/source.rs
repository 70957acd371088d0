//! Token sources: the per-call entry point for obtaining a bearer token.
//!
//! A [`TokenSource`] is either [`Direct`](TokenSource::Direct), handing out a static bearer
//! token, or [`Delegated`](TokenSource::Delegated), exchanging a session credential for
//! short-lived tenant tokens through an injected [`IssuerChannel`].
//!
//! Delegated issuance consults `token.cache` before calling the issuer. A cached token is
//! reused only when it outlives the requested minimum duration and was issued for the same
//! tenant as the current session credential. New tokens are requested for twice the minimum
//! duration, capped at one hour, and cached best-effort. Concurrent calls are not coordinated:
//! simultaneous misses each perform their own exchange and the last cache write wins.

// std
use std::time::Instant;
// self
use crate::{
	_prelude::*,
	auth::{TenantId, TokenSecret},
	cache::{CacheError, CachedToken, TokenCache},
	claims,
	config::DebugFlags,
	error::{ClaimsError, ConfigError},
	issuer::IssuerChannel,
	loader::CredentialFile,
	obs::{self, IssueOutcome, IssueSpan, SourceKind},
};

/// Longest lifetime ever requested from the issuer.
pub const MAX_ISSUED_LIFETIME: Duration = Duration::hours(1);

/// Bearer token provider used once per outbound call.
#[derive(Clone, Debug)]
pub enum TokenSource {
	/// Static bearer token; nothing to refresh.
	Direct(DirectSource),
	/// Session credential exchanged for cached tenant tokens.
	Delegated(DelegatedSource),
}
impl TokenSource {
	/// Source that always returns `bearer`.
	pub fn direct(bearer: impl Into<String>) -> Self {
		Self::Direct(DirectSource { bearer: TokenSecret::new(bearer) })
	}

	/// Session-backed source caching into `cache_dir` when provided.
	pub fn delegated(
		session: impl Into<String>,
		cache_dir: Option<&Path>,
		channel: Arc<dyn IssuerChannel>,
		flags: DebugFlags,
	) -> Self {
		Self::Delegated(DelegatedSource {
			session: TokenSecret::new(session),
			cache: cache_dir.map(TokenCache::in_dir),
			channel,
			flags,
		})
	}

	/// Builds a source from a parsed credential file.
	///
	/// A session token takes precedence over a bearer token when both are present; the bearer
	/// token is then discarded. A file with neither fails with [`ConfigError::NoCredential`].
	pub fn from_credential_file(
		file: CredentialFile,
		cache_dir: Option<&Path>,
		channel: Arc<dyn IssuerChannel>,
		flags: DebugFlags,
	) -> Result<Self> {
		match (file.session_token, file.bearer_token) {
			(Some(session), bearer) => {
				if bearer.is_some() {
					obs::auth_warn!(
						"Credential file holds both a session and a bearer token; using the session token."
					);
				}

				Ok(Self::delegated(session, cache_dir, channel, flags))
			},
			(None, Some(bearer)) => Ok(Self::direct(bearer)),
			(None, None) => Err(ConfigError::NoCredential.into()),
		}
	}

	/// Which variant this source is.
	pub fn kind(&self) -> SourceKind {
		match self {
			Self::Direct(_) => SourceKind::Direct,
			Self::Delegated(_) => SourceKind::Delegated,
		}
	}

	/// Cache file consulted by a delegated source, if caching is enabled.
	pub fn cache_path(&self) -> Option<&Path> {
		match self {
			Self::Direct(_) => None,
			Self::Delegated(source) => source.cache.as_ref().map(TokenCache::path),
		}
	}

	/// Returns a bearer token valid for at least `min_duration`.
	///
	/// `force` bypasses the cache. Both arguments are ignored by direct sources. Issuer
	/// failures are returned unchanged and never retried.
	pub async fn issue_token(&self, min_duration: Duration, force: bool) -> Result<TokenSecret> {
		match self {
			Self::Direct(source) => {
				obs::record_issue_outcome(SourceKind::Direct, IssueOutcome::Passthrough);

				Ok(source.bearer.clone())
			},
			Self::Delegated(source) => source.issue_token(min_duration, force).await,
		}
	}

	/// `Authorization` header value carrying a token valid for at least `min_duration`.
	pub async fn authorization_header(&self, min_duration: Duration) -> Result<String> {
		let token = self.issue_token(min_duration, false).await?;

		Ok(format!("Bearer {}", token.expose()))
	}
}

/// Static bearer token holder.
#[derive(Clone, Debug)]
pub struct DirectSource {
	bearer: TokenSecret,
}

/// Session-backed issuer with an optional on-disk cache.
#[derive(Clone)]
pub struct DelegatedSource {
	session: TokenSecret,
	cache: Option<TokenCache>,
	channel: Arc<dyn IssuerChannel>,
	flags: DebugFlags,
}
impl DelegatedSource {
	async fn issue_token(&self, min_duration: Duration, force: bool) -> Result<TokenSecret> {
		let span = IssueSpan::new(SourceKind::Delegated);
		let result = span.instrument(self.exchange(min_duration, force)).await;

		if result.is_err() {
			obs::record_issue_outcome(SourceKind::Delegated, IssueOutcome::Failure);
		}

		result
	}

	async fn exchange(&self, min_duration: Duration, force: bool) -> Result<TokenSecret> {
		let verbose = self.flags.verbose_logging;
		let session_claims =
			claims::extract_claims(self.session.expose()).ok_or(ClaimsError::Undecodable)?;
		let tenant = session_claims.tenant();
		let min_duration = min_duration.max(Duration::ZERO);

		if force || self.flags.force_refresh {
			obs::auth_log!(verbose, "Token cache bypassed: refresh forced.");
		} else {
			if let Some(cached) = self.cached_token(tenant.as_ref(), min_duration).await {
				obs::record_issue_outcome(SourceKind::Delegated, IssueOutcome::CacheHit);

				return Ok(cached.token);
			}

			obs::record_issue_outcome(SourceKind::Delegated, IssueOutcome::CacheMiss);
		}

		let requested = issued_lifetime(min_duration);
		let started = Instant::now();
		let token = self.channel.issue_tenant_token(&self.session, requested).await?;

		obs::auth_log!(
			verbose,
			"Issued tenant token for {requested} in {:?}.",
			started.elapsed()
		);

		let expires_at = claims::extract_claims(token.expose())
			.and_then(|claims| claims.expires_at())
			.unwrap_or_else(|| OffsetDateTime::now_utc() + requested);
		let record = CachedToken::new(token.clone(), expires_at, tenant);

		if let Err(e) = self.write_cache(&record).await {
			if e.is_not_found() {
				obs::auth_log!(verbose, "Token cache directory is missing: {e}");
			} else {
				obs::auth_warn!("Failed to update token cache: {e}");
			}
		}

		obs::record_issue_outcome(SourceKind::Delegated, IssueOutcome::Issued);

		Ok(token)
	}

	async fn cached_token(
		&self,
		tenant: Option<&TenantId>,
		min_duration: Duration,
	) -> Option<CachedToken> {
		let verbose = self.flags.verbose_logging;
		let cache = self.cache.as_ref()?;
		let record = match cache.read().await {
			Ok(Some(record)) => record,
			Ok(None) => {
				obs::auth_log!(verbose, "No cached token at {}.", cache.path().display());

				return None;
			},
			Err(e) => {
				obs::auth_log!(verbose, "Ignoring unreadable token cache: {e}");

				return None;
			},
		};

		if record.tenant_id.as_ref() != tenant {
			obs::auth_log!(verbose, "Cached token belongs to another tenant.");

			return None;
		}

		if !record.is_fresh_at(OffsetDateTime::now_utc(), min_duration) {
			obs::auth_log!(
				verbose,
				"Cached token expires at {} which is within the requested {min_duration}.",
				record.expiration
			);

			return None;
		}

		obs::auth_log!(verbose, "Reusing cached token expiring at {}.", record.expiration);

		Some(record)
	}

	/// Persists `record`; callers log the error instead of failing issuance.
	async fn write_cache(&self, record: &CachedToken) -> Result<(), CacheError> {
		match &self.cache {
			Some(cache) => cache.write(record).await,
			None => Ok(()),
		}
	}
}
impl Debug for DelegatedSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DelegatedSource")
			.field("session", &self.session)
			.field("cache", &self.cache)
			.field("flags", &self.flags)
			.finish()
	}
}

/// Lifetime requested from the issuer: twice `min_duration`, capped at
/// [`MAX_ISSUED_LIFETIME`].
pub fn issued_lifetime(min_duration: Duration) -> Duration {
	min_duration.saturating_mul(2).min(MAX_ISSUED_LIFETIME)
}
