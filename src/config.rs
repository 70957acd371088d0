//! Explicit configuration for loaders and token sources.
//!
//! Environment variables are read once, by the `from_env` constructors, and never consulted
//! again afterwards.

// std
use std::env;
// self
use crate::_prelude::*;

/// Overrides the credential file location.
pub const TOKEN_FILE_ENV: &str = "NSC_TOKEN_FILE";
/// Comma-separated debug flags.
pub const DEBUG_ENV: &str = "NS_DEBUG";
/// Config root override honored on Linux and other Unix platforms.
pub const XDG_CONFIG_HOME_ENV: &str = "XDG_CONFIG_HOME";
/// Credential file name inside a config directory.
pub const CREDENTIAL_FILE_NAME: &str = "token.json";
/// Well-known credential location for workloads.
pub const WORKLOAD_TOKEN_PATH: &str = "/var/run/nsc/token.json";

/// Debug flag enabling verbose auth logging.
pub const AUTH_FLAG: &str = "auth";
/// Debug flag forcing every issuance to skip the cache.
pub const FORCE_AUTH_REFRESH_FLAG: &str = "force-auth-refresh";

const CONFIG_DIR_NAME: &str = "ns";

/// Debug switches, usually sourced from [`DEBUG_ENV`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebugFlags {
	/// Log cache hits/misses and issuance timings at `info`.
	pub verbose_logging: bool,
	/// Treat every issuance as forced, bypassing the cache.
	pub force_refresh: bool,
}
impl DebugFlags {
	/// Parses a comma-separated flag list; unknown flags are ignored.
	pub fn parse(raw: &str) -> Self {
		raw.split(',').map(str::trim).fold(Self::default(), |mut flags, flag| {
			match flag {
				AUTH_FLAG => flags.verbose_logging = true,
				FORCE_AUTH_REFRESH_FLAG => flags.force_refresh = true,
				_ => {},
			}

			flags
		})
	}

	/// Reads [`DEBUG_ENV`]; unset or non-unicode values yield the defaults.
	pub fn from_env() -> Self {
		env::var(DEBUG_ENV).map(|raw| Self::parse(&raw)).unwrap_or_default()
	}
}

/// Resolved credential locations plus debug flags consumed by
/// [`CredentialLoader`](crate::loader::CredentialLoader).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
	/// Explicit credential file; when set, no other location is consulted.
	pub override_path: Option<PathBuf>,
	/// Well-known workload credential file.
	pub workload_path: PathBuf,
	/// Per-user credential file, when a config root could be determined.
	pub user_path: Option<PathBuf>,
	/// Debug switches handed to every token source.
	pub flags: DebugFlags,
}
impl LoaderConfig {
	/// Creates a config for the provided user credential file and no override.
	pub fn new(user_path: impl Into<PathBuf>) -> Self {
		Self {
			override_path: None,
			workload_path: PathBuf::from(WORKLOAD_TOKEN_PATH),
			user_path: Some(user_path.into()),
			flags: DebugFlags::default(),
		}
	}

	/// Builds the config from [`TOKEN_FILE_ENV`], [`DEBUG_ENV`], and the platform config root.
	pub fn from_env() -> Self {
		Self {
			override_path: env::var_os(TOKEN_FILE_ENV)
				.filter(|value| !value.is_empty())
				.map(PathBuf::from),
			workload_path: PathBuf::from(WORKLOAD_TOKEN_PATH),
			user_path: user_config_root().map(|root| user_token_path(&root)),
			flags: DebugFlags::from_env(),
		}
	}

	/// Sets the explicit override location.
	pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.override_path = Some(path.into());

		self
	}

	/// Replaces the workload location.
	pub fn with_workload_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.workload_path = path.into();

		self
	}

	/// Replaces the debug flags.
	pub fn with_flags(mut self, flags: DebugFlags) -> Self {
		self.flags = flags;

		self
	}
}

/// Credential file location under a config root.
pub fn user_token_path(config_root: &Path) -> PathBuf {
	config_root.join(CONFIG_DIR_NAME).join(CREDENTIAL_FILE_NAME)
}

/// Platform config root: `~/Library/Application Support` on macOS, `%APPDATA%` on Windows,
/// `$XDG_CONFIG_HOME` or `~/.config` elsewhere.
pub fn user_config_root() -> Option<PathBuf> {
	#[cfg(target_os = "macos")]
	{
		dirs::home_dir().map(|home| home.join("Library").join("Application Support"))
	}
	#[cfg(windows)]
	{
		dirs::config_dir()
	}
	#[cfg(not(any(target_os = "macos", windows)))]
	{
		xdg_config_root(env::var_os(XDG_CONFIG_HOME_ENV).map(PathBuf::from), dirs::home_dir())
	}
}

#[cfg(not(any(target_os = "macos", windows)))]
fn xdg_config_root(xdg: Option<PathBuf>, home: Option<PathBuf>) -> Option<PathBuf> {
	// XDG ignores relative values.
	xdg.filter(|path| path.is_absolute()).or_else(|| home.map(|home| home.join(".config")))
}
