//! Unverified claims decoding for structured credentials.
//!
//! Credentials are `header.payload.signature` strings, optionally carrying a kind prefix
//! such as `st_` (session) or `nsct_` (tenant bearer). [`extract_claims`] base64url-decodes
//! the payload and parses it as JSON. No signature is checked: the result only drives cache
//! and routing decisions and must never be used to authorize access.

// crates.io
use base64::{
	Engine as _, alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, general_purpose},
};
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, auth::TenantId};

/// Kind prefixes stripped before decoding.
pub const CREDENTIAL_PREFIXES: [&str; 4] = [
	// Tenant bearer token.
	"nsct_",
	// Workload bearer token.
	"nscw_",
	// Federated token.
	"nsfd_",
	// Session token.
	"st_",
];
/// Default safety margin applied by [`Claims::is_expired`].
pub const DEFAULT_EXPIRY_BUFFER: Duration = Duration::seconds(60);

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
	&alphabet::URL_SAFE,
	general_purpose::NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Audience claim, which issuers encode either as a single string or a list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
	/// Single audience.
	One(String),
	/// Multiple audiences.
	Many(Vec<String>),
}
impl Audience {
	/// Returns `true` if `value` is among the audiences.
	pub fn contains(&self, value: &str) -> bool {
		match self {
			Self::One(aud) => aud == value,
			Self::Many(auds) => auds.iter().any(|aud| aud == value),
		}
	}
}

/// Decoded claims payload.
///
/// The JSON object is kept verbatim, so a payload re-serializes exactly as it was decoded.
/// Accessors read well-known claims leniently: a claim holding an unexpected JSON type reads
/// as absent instead of failing the whole decode.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);
impl Claims {
	/// Raw claim value.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.0.get(name)
	}

	/// Decoded JSON object.
	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}

	/// Consumes the record, returning the decoded JSON object.
	pub fn into_map(self) -> Map<String, Value> {
		self.0
	}

	/// Issuer.
	pub fn iss(&self) -> Option<&str> {
		self.string_claim("iss")
	}

	/// Subject.
	pub fn sub(&self) -> Option<&str> {
		self.string_claim("sub")
	}

	/// Audience, when it is a string or a list of strings.
	pub fn aud(&self) -> Option<Audience> {
		match self.0.get("aud")? {
			Value::String(aud) => Some(Audience::One(aud.clone())),
			Value::Array(auds) => auds
				.iter()
				.map(|aud| aud.as_str().map(str::to_owned))
				.collect::<Option<Vec<_>>>()
				.map(Audience::Many),
			_ => None,
		}
	}

	/// Expiration, whole unix seconds.
	pub fn exp(&self) -> Option<i64> {
		self.numeric_date_seconds("exp")
	}

	/// Not-before, whole unix seconds.
	pub fn nbf(&self) -> Option<i64> {
		self.numeric_date_seconds("nbf")
	}

	/// Issued-at, whole unix seconds.
	pub fn iat(&self) -> Option<i64> {
		self.numeric_date_seconds("iat")
	}

	/// Unique token id.
	pub fn jti(&self) -> Option<&str> {
		self.string_claim("jti")
	}

	/// Tenant the credential is scoped to; numeric claims are rendered as strings.
	pub fn tenant_id(&self) -> Option<String> {
		match self.0.get("tenant_id")? {
			Value::String(tenant) => Some(tenant.clone()),
			Value::Number(tenant) => Some(tenant.to_string()),
			_ => None,
		}
	}

	/// Actor acting on behalf of the tenant.
	pub fn actor_id(&self) -> Option<&str> {
		self.string_claim("actor_id")
	}

	/// Instance the credential was minted for.
	pub fn instance_id(&self) -> Option<&str> {
		self.string_claim("instance_id")
	}

	/// Owner of the credential.
	pub fn owner_id(&self) -> Option<&str> {
		self.string_claim("owner_id")
	}

	/// Region of the workload holding the credential.
	pub fn workload_region(&self) -> Option<&str> {
		self.string_claim("workload_region")
	}

	/// Tenant scope used to match cached tokens.
	pub fn tenant(&self) -> Option<TenantId> {
		self.tenant_id().map(TenantId::new)
	}

	/// Expiration as an instant, if present and representable.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp_nanos(self.numeric_date_nanos("exp")?).ok()
	}

	/// Expiration in unix milliseconds.
	pub fn expiration_millis(&self) -> Option<i64> {
		i64::try_from(self.numeric_date_nanos("exp")?.div_euclid(1_000_000)).ok()
	}

	/// Returns `true` if the credential expires within [`DEFAULT_EXPIRY_BUFFER`] of now.
	pub fn is_expired(&self) -> bool {
		self.is_expired_within(DEFAULT_EXPIRY_BUFFER)
	}

	/// Returns `true` if the credential expires within `buffer` of now.
	pub fn is_expired_within(&self, buffer: Duration) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc(), buffer)
	}

	/// Returns `true` iff an expiration is present and `now + buffer >= exp`.
	///
	/// A missing or non-numeric `exp` claim never counts as expired.
	pub fn is_expired_at(&self, now: OffsetDateTime, buffer: Duration) -> bool {
		let Some(exp) = self.numeric_date_nanos("exp") else {
			return false;
		};

		now.unix_timestamp_nanos() + buffer.whole_nanoseconds() >= exp
	}

	fn string_claim(&self, name: &str) -> Option<&str> {
		self.0.get(name)?.as_str()
	}

	fn numeric_date_seconds(&self, name: &str) -> Option<i64> {
		i64::try_from(self.numeric_date_nanos(name)?.div_euclid(1_000_000_000)).ok()
	}

	/// NumericDate claims may carry a fractional part.
	fn numeric_date_nanos(&self, name: &str) -> Option<i128> {
		let value = self.0.get(name)?;

		if let Some(secs) = value.as_i64() {
			return Some(i128::from(secs) * 1_000_000_000);
		}

		let secs = value.as_f64().filter(|secs| secs.is_finite())?;
		let whole = secs.floor();

		Some(whole as i128 * 1_000_000_000 + ((secs - whole) * 1e9).floor() as i128)
	}
}
impl From<Map<String, Value>> for Claims {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}

/// Decodes the claims of `credential` without verifying it.
///
/// Returns `None` only for a segment count other than three, a payload that is not base64url,
/// or a payload that is not a JSON object.
pub fn extract_claims(credential: &str) -> Option<Claims> {
	let stripped = strip_prefix(credential);
	let mut segments = stripped.split('.');
	let (Some(_), Some(payload), Some(_), None) =
		(segments.next(), segments.next(), segments.next(), segments.next())
	else {
		return None;
	};
	let bytes = URL_SAFE_LENIENT.decode(payload).ok()?;

	match serde_json::from_slice(&bytes).ok()? {
		Value::Object(map) => Some(Claims(map)),
		_ => None,
	}
}

/// Tenant claim of `credential`, if decodable.
pub fn tenant_id(credential: &str) -> Option<String> {
	extract_claims(credential)?.tenant_id()
}

/// Expiration claim of `credential` in unix milliseconds, if decodable.
pub fn expiration_millis(credential: &str) -> Option<i64> {
	extract_claims(credential)?.expiration_millis()
}

fn strip_prefix(credential: &str) -> &str {
	CREDENTIAL_PREFIXES
		.iter()
		.find_map(|prefix| credential.strip_prefix(prefix))
		.unwrap_or(credential)
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	use time::macros;
	// self
	use super::*;

	fn claims_of(payload: Value) -> Claims {
		match payload {
			Value::Object(map) => Claims::from(map),
			other => panic!("Fixture {other} should be a JSON object."),
		}
	}

	fn encode(payload: &Value) -> String {
		let body = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

		format!("eyJhbGciOiJub25lIn0.{body}.sig")
	}

	#[test]
	fn extracts_known_and_unknown_claims() {
		let payload = json!({
			"iss": "issuer",
			"aud": ["a", "b"],
			"exp": 1_900_000_000,
			"tenant_id": "t1",
			"workload_region": "eu",
			"custom": { "nested": true },
		});
		let claims = extract_claims(&encode(&payload)).expect("Claims should decode.");

		assert_eq!(claims.iss(), Some("issuer"));
		assert!(claims.aud().is_some_and(|aud| aud.contains("b")));
		assert_eq!(claims.tenant_id().as_deref(), Some("t1"));
		assert_eq!(claims.workload_region(), Some("eu"));
		assert_eq!(claims.get("custom"), Some(&json!({ "nested": true })));
		assert_eq!(
			serde_json::to_value(&claims).expect("Claims should serialize back to JSON."),
			payload
		);
	}

	#[test]
	fn unexpected_claim_types_round_trip_verbatim() {
		let payloads = [
			json!({ "tenant_id": "t1", "exp": 1_900_000_000.5 }),
			json!({ "tenant_id": 42 }),
			json!({ "iat": "1700000000", "aud": [1, "a"] }),
			json!({ "sub": null, "tenant_id": "t1" }),
			json!({ "tenant_id": ["t1"], "exp": "never", "nbf": true }),
		];

		for payload in payloads {
			let claims = extract_claims(&encode(&payload))
				.unwrap_or_else(|| panic!("{payload} should decode."));

			assert_eq!(
				serde_json::to_value(&claims).expect("Claims should serialize back to JSON."),
				payload
			);
		}
	}

	#[test]
	fn accessors_read_claims_leniently() {
		let claims = extract_claims(&encode(
			&json!({ "tenant_id": 42, "exp": 1_900_000_000.75, "iat": "1700000000", "aud": [1] }),
		))
		.expect("Claims should decode.");

		assert_eq!(claims.tenant_id().as_deref(), Some("42"));
		assert_eq!(claims.exp(), Some(1_900_000_000));
		assert_eq!(claims.expiration_millis(), Some(1_900_000_000_750));
		assert_eq!(claims.iat(), None);
		assert_eq!(claims.aud(), None);

		let claims = extract_claims(&encode(&json!({ "tenant_id": null, "sub": false })))
			.expect("Claims should decode.");

		assert_eq!(claims.tenant_id(), None);
		assert_eq!(claims.sub(), None);
	}

	#[test]
	fn strips_kind_prefixes() {
		let token = encode(&json!({ "tenant_id": "t2" }));

		for prefix in CREDENTIAL_PREFIXES {
			assert_eq!(tenant_id(&format!("{prefix}{token}")).as_deref(), Some("t2"));
		}
	}

	#[test]
	fn accepts_padded_payloads() {
		let body = general_purpose::URL_SAFE.encode(json!({ "sub": "abc" }).to_string());

		assert!(body.ends_with('='), "Fixture should carry padding.");

		let claims = extract_claims(&format!("h.{body}.s")).expect("Padded payload should decode.");

		assert_eq!(claims.sub().as_deref(), Some("abc"));
	}

	#[test]
	fn malformed_inputs_yield_none() {
		let payload = general_purpose::URL_SAFE_NO_PAD.encode("{\"exp\":1}");

		assert!(extract_claims("").is_none());
		assert!(extract_claims("only.two").is_none());
		assert!(extract_claims(&format!("a.{payload}.c.d")).is_none());
		assert!(extract_claims("a.!!!.c").is_none());
		assert!(
			extract_claims(&format!("a.{}.c", general_purpose::URL_SAFE_NO_PAD.encode("nope")))
				.is_none()
		);
		assert!(
			extract_claims(&format!("a.{}.c", general_purpose::URL_SAFE_NO_PAD.encode("[1,2]")))
				.is_none()
		);
	}

	#[test]
	fn expiry_checks_honor_buffer() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let claims = claims_of(json!({ "exp": now.unix_timestamp() + 120 }));

		assert!(!claims.is_expired_at(now, Duration::seconds(60)));
		assert!(claims.is_expired_at(now, Duration::seconds(120)));
		assert!(claims.is_expired_at(now + Duration::minutes(5), Duration::ZERO));

		let fractional = claims_of(json!({ "exp": now.unix_timestamp() as f64 + 60.5 }));

		assert!(!fractional.is_expired_at(now, Duration::seconds(60)));
		assert!(fractional.is_expired_at(now, Duration::milliseconds(60_500)));
		assert!(!claims_of(json!({ "exp": "soon" })).is_expired_at(now, Duration::days(1)));
	}

	#[test]
	fn missing_expiration_never_expires() {
		let claims = Claims::default();

		assert!(!claims.is_expired());
		assert!(!claims.is_expired_within(Duration::days(3650)));
		assert_eq!(claims.expires_at(), None);
	}

	#[test]
	fn expiration_millis_scales_seconds() {
		let token = encode(&json!({ "exp": 1_700_000_000 }));

		assert_eq!(expiration_millis(&token), Some(1_700_000_000_000));
		assert_eq!(expiration_millis("garbage"), None);
	}

	#[test]
	fn tenant_claims_are_opaque() {
		for raw in ["", "has space", "t1"] {
			let claims = claims_of(json!({ "tenant_id": raw }));

			assert_eq!(claims.tenant().as_deref(), Some(raw));
		}

		assert_eq!(Claims::default().tenant(), None);
	}
}
