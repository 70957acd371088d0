//! Issuer channel contract for session-to-bearer exchanges plus endpoint resolution.
//!
//! [`IssuerChannel`] is the only dependency token sources have on the network. It is injected
//! at construction time so callers can swap the HTTP implementation in [`http`] for any other
//! transport, or for an in-process fake in tests.

#[cfg(feature = "reqwest")] pub mod http;

#[cfg(feature = "reqwest")] pub use http::HttpIssuerChannel;

// std
use std::env;
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, IssuanceError},
};

/// Explicit issuer endpoint override.
pub const ENDPOINT_ENV: &str = "NSC_IAM_ENDPOINT";
/// Global endpoint override shared with other API clients.
pub const GLOBAL_ENDPOINT_ENV: &str = "NSC_ENDPOINT";
/// Compiled-in issuer endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://iam.namespaceapis.com";
/// Procedure path of the session-to-tenant-token exchange, relative to the endpoint.
pub const ISSUE_TENANT_TOKEN_PROCEDURE: &str =
	"namespace.cloud.iam.v1beta.TokenService/IssueTenantTokenFromSession";

/// Boxed future returned by [`IssuerChannel::issue_tenant_token`].
pub type IssueFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenSecret, IssuanceError>> + 'a + Send>>;

/// Remote capability that exchanges a session credential for a tenant bearer token.
///
/// Implementations must not retry; failures surface to the token source caller unchanged.
pub trait IssuerChannel
where
	Self: Send + Sync,
{
	/// Issues a bearer token valid for `duration`, authenticating with `session`.
	fn issue_tenant_token<'a>(
		&'a self,
		session: &'a TokenSecret,
		duration: Duration,
	) -> IssueFuture<'a>;
}

/// Picks the issuer endpoint: `explicit`, else `global`, else [`DEFAULT_ENDPOINT`].
///
/// Empty values count as unset. Plain `http` is only accepted for loopback hosts.
pub fn resolve_endpoint(explicit: Option<&str>, global: Option<&str>) -> Result<Url, ConfigError> {
	let raw = explicit
		.filter(|value| !value.trim().is_empty())
		.or(global.filter(|value| !value.trim().is_empty()))
		.unwrap_or(DEFAULT_ENDPOINT)
		.trim();
	let invalid = |reason: String| ConfigError::InvalidEndpoint { endpoint: raw.to_owned(), reason };
	let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;

	match url.scheme() {
		"https" => {},
		"http" if is_loopback(url.host()) => {},
		scheme => return Err(invalid(format!("scheme `{scheme}` is not allowed"))),
	}

	// Keep any base path when joining the procedure path.
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	Ok(url)
}

/// Resolves the issuer endpoint from [`ENDPOINT_ENV`] and [`GLOBAL_ENDPOINT_ENV`].
pub fn endpoint_from_env() -> Result<Url, ConfigError> {
	let explicit = env::var(ENDPOINT_ENV).ok();
	let global = env::var(GLOBAL_ENDPOINT_ENV).ok();

	resolve_endpoint(explicit.as_deref(), global.as_deref())
}

/// Full URL of the exchange procedure under `endpoint`.
pub fn procedure_url(endpoint: &Url) -> Result<Url, ConfigError> {
	endpoint.join(ISSUE_TENANT_TOKEN_PROCEDURE).map_err(|e| ConfigError::InvalidEndpoint {
		endpoint: endpoint.to_string(),
		reason: e.to_string(),
	})
}

fn is_loopback(host: Option<Host<&str>>) -> bool {
	match host {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => ip.is_loopback(),
		Some(Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}
