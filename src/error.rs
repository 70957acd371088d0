//! Error taxonomy surfaced by loaders, token sources, and issuer channels.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// No credential file exists at a default location; the user needs to log in.
	#[error("Not authenticated: no credential file at {}.", path.display())]
	NotAuthenticated {
		/// Location that was checked.
		path: PathBuf,
	},
	/// Credential file or client configuration is unusable for the requested role.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Session credential claims could not be decoded.
	#[error(transparent)]
	Claims(#[from] ClaimsError),
	/// The remote session-to-bearer exchange failed.
	#[error(transparent)]
	Issuance(#[from] IssuanceError),
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Neither a bearer nor a session credential is available.
	#[error("No credential available.")]
	NoCredential,
	/// A workload credential file carries no bearer token.
	#[error("Workload credential file {} does not contain a bearer token.", path.display())]
	WorkloadWithoutBearer {
		/// Offending credential file.
		path: PathBuf,
	},
	/// No user config directory could be determined for this platform.
	#[error("Could not determine the user config directory.")]
	UnknownConfigDir,
	/// Credential file could not be read.
	#[error("Failed to read credential file {}.", path.display())]
	CredentialRead {
		/// Credential file location.
		path: PathBuf,
		/// Underlying I/O failure.
		#[source]
		source: std::io::Error,
	},
	/// Credential file is not valid JSON of the expected shape.
	#[error("Failed to parse credential file {}.", path.display())]
	CredentialParse {
		/// Credential file location.
		path: PathBuf,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Issuer endpoint cannot be used.
	#[error("Issuer endpoint `{endpoint}` is invalid: {reason}.")]
	InvalidEndpoint {
		/// Raw endpoint value.
		endpoint: String,
		/// Why the endpoint was rejected.
		reason: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures decoding the claims of a session credential.
#[derive(Debug, ThisError)]
pub enum ClaimsError {
	/// The credential is not a three-segment token with a JSON object payload.
	#[error("Session credential claims could not be decoded.")]
	Undecodable,
}

/// Remote issuance failures; never retried by this crate.
#[derive(Debug, ThisError)]
pub enum IssuanceError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token issuer.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Issuer responded with a non-success status.
	#[error("Token issuer returned status {status}: {message}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Response body preview or issuer-supplied message.
		message: String,
	},
	/// Issuer responded with JSON that could not be parsed.
	#[error("Token issuer returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Issuer responded successfully but without a token.
	#[error("Token issuer response did not contain a token.")]
	MissingToken,
}
impl IssuanceError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for IssuanceError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
