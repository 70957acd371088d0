//! On-disk cache of the most recently issued tenant token.
//!
//! The cache is a single JSON file (`token.cache`) next to the credential file. Every
//! successful exchange overwrites it whole; stale entries are never deleted, only superseded.
//! Nothing here is fatal to issuance: the token source treats read errors as misses and only
//! logs write errors.

// std
use std::{
	io::ErrorKind,
	process,
	sync::atomic::{AtomicU64, Ordering},
};
// crates.io
use tokio::{fs, io::AsyncWriteExt};
// self
use crate::{
	_prelude::*,
	auth::{TenantId, TokenSecret},
};

/// Cache file name, created next to the credential file.
pub const CACHE_FILE_NAME: &str = "token.cache";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Error type produced by [`TokenCache`].
#[derive(Debug, ThisError)]
pub enum CacheError {
	/// Filesystem failure reading or replacing the cache file.
	#[error("Cache I/O failed for {}.", path.display())]
	Io {
		/// Path being accessed.
		path: PathBuf,
		/// Underlying I/O failure.
		#[source]
		source: std::io::Error,
	},
	/// Cache contents could not be encoded or decoded.
	#[error("Cache file {} is not valid.", path.display())]
	Serialization {
		/// Cache file path.
		path: PathBuf,
		/// Underlying JSON failure.
		#[source]
		source: serde_json::Error,
	},
}
impl CacheError {
	/// Returns `true` when the failure is a missing file or directory.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::Io { source, .. } if source.kind() == ErrorKind::NotFound)
	}
}

/// Cached bearer token plus the data needed to decide whether it can be reused.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
	/// Issued bearer token.
	pub token: TokenSecret,
	/// Expiration, unix milliseconds.
	pub expiration: i64,
	/// Tenant of the session credential the token was issued from.
	#[serde(rename = "tenantId", default, skip_serializing_if = "Option::is_none")]
	pub tenant_id: Option<TenantId>,
}
impl CachedToken {
	/// Creates a record expiring at `expires_at`.
	pub fn new(token: TokenSecret, expires_at: OffsetDateTime, tenant_id: Option<TenantId>) -> Self {
		Self { token, expiration: unix_millis(expires_at), tenant_id }
	}

	/// Expiration as an instant, if representable.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.expiration) * 1_000_000).ok()
	}

	/// Returns `true` if the token stays valid for more than `min_duration` after `now`.
	pub fn is_fresh_at(&self, now: OffsetDateTime, min_duration: Duration) -> bool {
		let deadline = now.unix_timestamp_nanos() + min_duration.whole_nanoseconds();

		i128::from(self.expiration) * 1_000_000 > deadline
	}

	/// Returns `true` if the token is fresh for `min_duration` and belongs to `tenant`.
	pub fn is_usable_at(
		&self,
		now: OffsetDateTime,
		min_duration: Duration,
		tenant: Option<&TenantId>,
	) -> bool {
		self.tenant_id.as_ref() == tenant && self.is_fresh_at(now, min_duration)
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("token", &"<redacted>")
			.field("expiration", &self.expiration)
			.field("tenant_id", &self.tenant_id)
			.finish()
	}
}

/// Handle to a cache file location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenCache {
	path: PathBuf,
}
impl TokenCache {
	/// Cache stored as [`CACHE_FILE_NAME`] inside `dir`.
	pub fn in_dir(dir: impl AsRef<Path>) -> Self {
		Self { path: dir.as_ref().join(CACHE_FILE_NAME) }
	}

	/// Cache file location.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Reads the cached record; a missing or empty file is `Ok(None)`.
	pub async fn read(&self) -> Result<Option<CachedToken>, CacheError> {
		let bytes = match fs::read(&self.path).await {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(source) => return Err(CacheError::Io { path: self.path.clone(), source }),
		};

		if bytes.is_empty() {
			return Ok(None);
		}

		serde_json::from_slice(&bytes)
			.map(Some)
			.map_err(|source| CacheError::Serialization { path: self.path.clone(), source })
	}

	/// Replaces the cache file with `record`, owner-only readable where supported.
	///
	/// The record is written to a sibling temp file and renamed into place, so readers see
	/// either the previous or the new contents. The cache directory is never created.
	pub async fn write(&self, record: &CachedToken) -> Result<(), CacheError> {
		let serialized = serde_json::to_vec(record)
			.map_err(|source| CacheError::Serialization { path: self.path.clone(), source })?;
		let tmp_path = self.tmp_path();

		if let Err(e) = Self::write_new(&tmp_path, &serialized).await {
			let _ = fs::remove_file(&tmp_path).await;

			return Err(e);
		}

		if let Err(source) = fs::rename(&tmp_path, &self.path).await {
			let _ = fs::remove_file(&tmp_path).await;

			return Err(CacheError::Io { path: self.path.clone(), source });
		}

		Ok(())
	}

	async fn write_new(path: &Path, contents: &[u8]) -> Result<(), CacheError> {
		let io_err = |source: std::io::Error| CacheError::Io { path: path.to_owned(), source };
		let mut options = fs::OpenOptions::new();

		options.write(true).create(true).truncate(true);

		#[cfg(unix)]
		options.mode(0o600);

		let mut file = options.open(path).await.map_err(io_err)?;

		file.write_all(contents).await.map_err(io_err)?;
		file.sync_all().await.map_err(io_err)?;

		Ok(())
	}

	fn tmp_path(&self) -> PathBuf {
		// Unique per writer so concurrent issuances never share a temp file.
		let unique = format!(
			"{CACHE_FILE_NAME}.{}.{}.tmp",
			process::id(),
			TMP_COUNTER.fetch_add(1, Ordering::Relaxed),
		);

		self.path.with_file_name(unique)
	}
}

/// Unix milliseconds for `instant`, saturating at the `i64` range.
pub(crate) fn unix_millis(instant: OffsetDateTime) -> i64 {
	let millis = instant.unix_timestamp_nanos() / 1_000_000;

	i64::try_from(millis).unwrap_or(if millis.is_negative() { i64::MIN } else { i64::MAX })
}
