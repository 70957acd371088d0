//! Tenant identifier carried by session and bearer credentials.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

/// Organizational scope a credential is issued for.
///
/// Tenant identifiers are opaque: whatever the issuer put in the claim is kept as-is and only
/// ever compared for equality.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);
impl TenantId {
	/// Wraps a raw tenant claim.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw identifier.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Deref for TenantId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for TenantId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for TenantId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<String> for TenantId {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for TenantId {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl From<TenantId> for String {
	fn from(value: TenantId) -> Self {
		value.0
	}
}
impl Debug for TenantId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Tenant({:?})", self.0)
	}
}
impl Display for TenantId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn any_claim_value_is_accepted() {
		for raw in ["", " tenant", "tenant-123"] {
			assert_eq!(TenantId::new(raw).as_str(), raw);
		}

		assert_eq!(format!("{:?}", TenantId::from("t 1")), "Tenant(\"t 1\")");
	}

	#[test]
	fn serializes_as_plain_string() {
		let tenant: TenantId =
			serde_json::from_str("\"with space\"").expect("Tenant should deserialize.");

		assert_eq!(&*tenant, "with space");
		assert_eq!(
			serde_json::to_string(&TenantId::new("t1")).expect("Tenant should serialize."),
			"\"t1\""
		);
	}
}
