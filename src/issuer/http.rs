//! reqwest-backed [`IssuerChannel`] speaking JSON to the token service.
//!
//! The exchange is a single `POST` to
//! [`ISSUE_TENANT_TOKEN_PROCEDURE`](issuer::ISSUE_TENANT_TOKEN_PROCEDURE) under the resolved
//! endpoint, authenticated with `Authorization: Bearer <session>`. The request body carries
//! the requested lifetime as a protobuf-JSON duration (`"3600s"`); the response carries the
//! minted token in `tenant_token`.

// crates.io
use reqwest::{header::AUTHORIZATION, redirect::Policy};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, IssuanceError},
	issuer::{self, IssueFuture, IssuerChannel},
};

const BODY_PREVIEW_LIMIT: usize = 256;

#[derive(Debug, Serialize)]
struct IssueRequest {
	token_duration: String,
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
	#[serde(default)]
	tenant_token: Option<String>,
}

/// HTTP issuer channel. Redirects are never followed.
#[derive(Clone, Debug)]
pub struct HttpIssuerChannel {
	client: ReqwestClient,
	procedure: Url,
}
impl HttpIssuerChannel {
	/// Builds a channel for `endpoint` with a dedicated reqwest client.
	pub fn new(endpoint: &Url) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().redirect(Policy::none()).build()?;

		Self::with_client(client, endpoint)
	}

	/// Wraps an existing reqwest client. Configure it to not follow redirects.
	pub fn with_client(client: ReqwestClient, endpoint: &Url) -> Result<Self, ConfigError> {
		Ok(Self { client, procedure: issuer::procedure_url(endpoint)? })
	}

	/// Builds a channel for the endpoint resolved from the environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::new(&issuer::endpoint_from_env()?)
	}

	/// Full URL the exchange is posted to.
	pub fn procedure_url(&self) -> &Url {
		&self.procedure
	}

	async fn issue(
		&self,
		session: &TokenSecret,
		duration: Duration,
	) -> Result<TokenSecret, IssuanceError> {
		let request = IssueRequest { token_duration: format_duration(duration) };
		let response = self
			.client
			.post(self.procedure.clone())
			.header(AUTHORIZATION, format!("Bearer {}", session.expose()))
			.json(&request)
			.send()
			.await?;
		let status = response.status();
		let body = response.bytes().await?;

		if !status.is_success() {
			return Err(IssuanceError::Status {
				status: status.as_u16(),
				message: body_preview(&String::from_utf8_lossy(&body)),
			});
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&body);
		let parsed: IssueResponse = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| IssuanceError::ResponseParse { source })?;

		parsed
			.tenant_token
			.filter(|token| !token.is_empty())
			.map(TokenSecret::new)
			.ok_or(IssuanceError::MissingToken)
	}
}
impl IssuerChannel for HttpIssuerChannel {
	fn issue_tenant_token<'a>(
		&'a self,
		session: &'a TokenSecret,
		duration: Duration,
	) -> IssueFuture<'a> {
		Box::pin(self.issue(session, duration))
	}
}

/// Protobuf-JSON duration: whole seconds, with a nanosecond fraction only when needed.
fn format_duration(duration: Duration) -> String {
	let secs = duration.whole_seconds();
	let nanos = duration.subsec_nanoseconds().unsigned_abs();

	if nanos == 0 {
		format!("{secs}s")
	} else {
		let fraction = format!("{nanos:09}");

		format!("{secs}.{}s", fraction.trim_end_matches('0'))
	}
}

fn body_preview(body: &str) -> String {
	let trimmed = body.trim();

	if trimmed.chars().count() <= BODY_PREVIEW_LIMIT {
		return trimmed.to_owned();
	}

	let mut buf: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();

	buf.push('…');

	buf
}
