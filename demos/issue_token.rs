//! Demonstrates loading a session credential file and exchanging it for cached tenant tokens
//! against a mock issuer.
//!
//! 1. Write a `token.json` holding a session token into a scratch directory.
//! 2. Point [`LoaderConfig`] at it and build a [`CredentialLoader`] with the HTTP channel.
//! 3. Ask the resulting source for tokens; only the first call reaches the issuer.

// std
use std::{env, fs, sync::Arc};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use color_eyre::Result;
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
// self
use token_source::{
	CredentialLoader, LoaderConfig,
	issuer::{self, HttpIssuerChannel},
};

fn unsigned(prefix: &str, claims: serde_json::Value) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);

	format!("{prefix}{header}.{}.demo", URL_SAFE_NO_PAD.encode(claims.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let tenant_token = unsigned(
		"nsct_",
		serde_json::json!({
			"tenant_id": "demo-tenant",
			"exp": (OffsetDateTime::now_utc() + Duration::minutes(20)).unix_timestamp(),
		}),
	);
	let issue_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(format!("/{}", issuer::ISSUE_TENANT_TOKEN_PROCEDURE));
			then.status(200)
				.header("content-type", "application/json")
				.json_body(serde_json::json!({ "tenant_token": tenant_token }));
		})
		.await;
	let dir = env::temp_dir().join(format!("token_source_demo_{}", std::process::id()));

	fs::create_dir_all(&dir)?;

	let credential_path = dir.join("token.json");
	let session = unsigned("st_", serde_json::json!({ "tenant_id": "demo-tenant" }));

	fs::write(&credential_path, serde_json::json!({ "session_token": session }).to_string())?;

	let endpoint = issuer::resolve_endpoint(Some(server.url("/").as_str()), None)?;
	let channel = Arc::new(HttpIssuerChannel::new(&endpoint)?);
	let config = LoaderConfig::new(dir.join("unused.json")).with_override_path(&credential_path);
	let source = CredentialLoader::new(config, channel).load_defaults().await?;

	for attempt in 1..=3 {
		let header = source.authorization_header(Duration::minutes(5)).await?;

		println!("attempt {attempt}: {} chars of Authorization header", header.len());
	}

	issue_mock.assert_calls_async(1).await;
	println!("cache file: {:?}", source.cache_path());

	fs::remove_dir_all(&dir)?;

	Ok(())
}
