//! Credential file discovery and parsing into [`TokenSource`]s.
//!
//! [`CredentialLoader::load_defaults`] checks, in order:
//!
//! 1. the explicit override path, read unconditionally with every failure fatal;
//! 2. the workload path, used only if it exists;
//! 3. the per-user config path.
//!
//! A missing file at a default location is [`Error::NotAuthenticated`], the expected case for
//! a user who has not logged in yet. Delegated sources cache into the credential file's
//! directory.

// std
use std::io::ErrorKind;
// crates.io
use tokio::fs;
// self
use crate::{
	_prelude::*,
	config::LoaderConfig,
	error::ConfigError,
	issuer::IssuerChannel,
	obs,
	source::TokenSource,
};

/// On-disk credential file: a bearer token, a session token, or both.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialFile {
	/// Static bearer token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bearer_token: Option<String>,
	/// Session token exchanged for tenant tokens.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_token: Option<String>,
}
impl CredentialFile {
	/// Parses credential file contents; empty strings count as absent.
	pub fn from_slice(
		bytes: &[u8],
	) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
		let mut deserializer = serde_json::Deserializer::from_slice(bytes);
		let file: Self = serde_path_to_error::deserialize(&mut deserializer)?;

		Ok(Self {
			bearer_token: file.bearer_token.filter(|token| !token.is_empty()),
			session_token: file.session_token.filter(|token| !token.is_empty()),
		})
	}
}
impl Debug for CredentialFile {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialFile")
			.field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
			.field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

/// Resolves and reads credential files, producing token sources wired to an issuer channel.
#[derive(Clone)]
pub struct CredentialLoader {
	config: LoaderConfig,
	channel: Arc<dyn IssuerChannel>,
}
impl CredentialLoader {
	/// Creates a loader handing `channel` to every delegated source it builds.
	pub fn new(config: LoaderConfig, channel: Arc<dyn IssuerChannel>) -> Self {
		Self { config, channel }
	}

	/// Loader configured from the environment with the HTTP issuer channel.
	#[cfg(feature = "reqwest")]
	pub fn from_env() -> Result<Self> {
		let channel = crate::issuer::HttpIssuerChannel::from_env()?;

		Ok(Self::new(LoaderConfig::from_env(), Arc::new(channel)))
	}

	/// Locations and flags in use.
	pub fn config(&self) -> &LoaderConfig {
		&self.config
	}

	/// Loads from the override, workload, or user location, in that order.
	pub async fn load_defaults(&self) -> Result<TokenSource> {
		if let Some(path) = &self.config.override_path {
			return self.load_from_path(path).await;
		}
		if fs::try_exists(&self.config.workload_path).await.unwrap_or(false) {
			return self.load_workload_token().await;
		}

		self.load_user_token().await
	}

	/// Loads the per-user credential file.
	pub async fn load_user_token(&self) -> Result<TokenSource> {
		let path = self.config.user_path.as_deref().ok_or(ConfigError::UnknownConfigDir)?;
		let file = read_default(path).await?;

		self.build(file, path)
	}

	/// Loads the workload credential file, which must carry a bearer token.
	///
	/// Any session token in a workload file is ignored: workloads never perform
	/// session exchanges.
	pub async fn load_workload_token(&self) -> Result<TokenSource> {
		let path = &self.config.workload_path;
		let file = read_default(path).await?;
		let Some(bearer) = file.bearer_token else {
			return Err(ConfigError::WorkloadWithoutBearer { path: path.clone() }.into());
		};

		if file.session_token.is_some() {
			obs::auth_warn!(
				"Ignoring session token in workload credential file {}.",
				path.display()
			);
		}

		Ok(TokenSource::direct(bearer))
	}

	/// Loads an explicit credential file; a missing file is a configuration error.
	pub async fn load_from_path(&self, path: impl AsRef<Path>) -> Result<TokenSource> {
		let path = path.as_ref();
		let file = read_credential_file(path).await?;

		self.build(file, path)
	}

	fn build(&self, file: CredentialFile, path: &Path) -> Result<TokenSource> {
		TokenSource::from_credential_file(
			file,
			Some(cache_dir(path)),
			self.channel.clone(),
			self.config.flags,
		)
	}
}
impl Debug for CredentialLoader {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialLoader").field("config", &self.config).finish()
	}
}

async fn read_credential_file(path: &Path) -> Result<CredentialFile, ConfigError> {
	let bytes = fs::read(path)
		.await
		.map_err(|source| ConfigError::CredentialRead { path: path.to_owned(), source })?;

	CredentialFile::from_slice(&bytes)
		.map_err(|source| ConfigError::CredentialParse { path: path.to_owned(), source })
}

/// Reads a default-location file, reporting a missing file as [`Error::NotAuthenticated`].
async fn read_default(path: &Path) -> Result<CredentialFile> {
	read_credential_file(path).await.map_err(|e| match e {
		ConfigError::CredentialRead { path, source } if source.kind() == ErrorKind::NotFound =>
			Error::NotAuthenticated { path },
		other => other.into(),
	})
}

fn cache_dir(credential_path: &Path) -> &Path {
	match credential_path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	}
}
