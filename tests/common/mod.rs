//! Shared fixtures for integration tests: credential builders, scratch directories, and an
//! in-process issuer channel.

#![allow(dead_code)]

// std
use std::{
	env, fs,
	path::{Path, PathBuf},
	process,
	sync::{
		Arc, Mutex,
		atomic::{AtomicU64, Ordering},
	},
};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use time::{Duration, OffsetDateTime};
// self
use token_source::{
	TokenSecret,
	error::IssuanceError,
	issuer::{IssueFuture, IssuerChannel},
};

static DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Builds an unsigned `prefix` + `header.payload.signature` credential.
pub fn credential(prefix: &str, claims: serde_json::Value) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(claims.to_string());

	format!("{prefix}{header}.{payload}.signature")
}

/// Session credential scoped to `tenant`.
pub fn session_for(tenant: &str) -> String {
	credential("st_", serde_json::json!({ "tenant_id": tenant, "sub": "user-1" }))
}

/// Tenant bearer token expiring `ttl` from now.
pub fn tenant_token(tenant: &str, ttl: Duration) -> String {
	let exp = (OffsetDateTime::now_utc() + ttl).unix_timestamp();

	credential("nsct_", serde_json::json!({ "tenant_id": tenant, "exp": exp }))
}

/// Freshly created scratch directory, removed on drop.
pub struct ScratchDir(PathBuf);
impl ScratchDir {
	pub fn new(label: &str) -> Self {
		let dir = env::temp_dir().join(format!(
			"token_source_it_{label}_{}_{}",
			process::id(),
			DIR_COUNTER.fetch_add(1, Ordering::Relaxed)
		));

		let _ = fs::remove_dir_all(&dir);

		fs::create_dir_all(&dir).expect("Failed to create scratch directory.");

		Self(dir)
	}

	pub fn path(&self) -> &Path {
		&self.0
	}

	pub fn join(&self, name: &str) -> PathBuf {
		self.0.join(name)
	}

	/// Writes `contents` to `name` inside the directory and returns its path.
	pub fn write(&self, name: &str, contents: &str) -> PathBuf {
		let path = self.join(name);

		fs::write(&path, contents).expect("Failed to write scratch file.");

		path
	}
}
impl Drop for ScratchDir {
	fn drop(&mut self) {
		let _ = fs::remove_dir_all(&self.0);
	}
}

/// Issuer channel answering from a queue of scripted responses and recording each call.
#[derive(Clone, Default)]
pub struct ScriptedIssuer {
	inner: Arc<Mutex<ScriptedState>>,
}
#[derive(Default)]
struct ScriptedState {
	responses: Vec<Result<String, IssuanceError>>,
	calls: Vec<Call>,
}

/// One recorded issuance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
	pub session: String,
	pub duration: Duration,
}

impl ScriptedIssuer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Queues a successful response.
	pub fn respond_with(&self, token: impl Into<String>) -> &Self {
		self.inner.lock().expect("Issuer state lock poisoned.").responses.push(Ok(token.into()));

		self
	}

	/// Queues a failed response.
	pub fn fail_with(&self, error: IssuanceError) -> &Self {
		self.inner.lock().expect("Issuer state lock poisoned.").responses.push(Err(error));

		self
	}

	pub fn calls(&self) -> Vec<Call> {
		self.inner.lock().expect("Issuer state lock poisoned.").calls.clone()
	}

	pub fn channel(&self) -> Arc<dyn IssuerChannel> {
		Arc::new(self.clone())
	}
}
impl IssuerChannel for ScriptedIssuer {
	fn issue_tenant_token<'a>(
		&'a self,
		session: &'a TokenSecret,
		duration: Duration,
	) -> IssueFuture<'a> {
		let response = {
			let mut state = self.inner.lock().expect("Issuer state lock poisoned.");

			state.calls.push(Call { session: session.expose().to_owned(), duration });

			if state.responses.is_empty() {
				Err(IssuanceError::MissingToken)
			} else {
				state.responses.remove(0)
			}
		};

		Box::pin(async move { response.map(TokenSecret::new) })
	}
}
