//! Bearer token source for outbound RPC calls: hands out a static bearer credential as-is or
//! exchanges a session credential for short-lived tenant tokens, caching them on disk next to
//! the credential file.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod claims;
pub mod config;
pub mod error;
pub mod issuer;
pub mod loader;
pub mod obs;
pub mod source;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::{Path, PathBuf},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};

pub use auth::{TenantId, TokenSecret};
pub use claims::{Claims, extract_claims};
pub use config::{DebugFlags, LoaderConfig};
pub use issuer::IssuerChannel;
pub use loader::CredentialLoader;
pub use source::TokenSource;
