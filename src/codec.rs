//! Signed, expiring API keys.
//!
//! Keys are compact HS256 JWTs. The claims carry the subject, role, the canonical
//! [`CredentialId`] (`jti`), and issue/expiry instants in Unix seconds.
//!
//! Validation collapses every failure (shape, signature, algorithm, claims, expiry) into
//! [`Denial::InvalidCredential`]; the precise cause is only visible in debug logs.

// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
// self
use crate::{
	_prelude::*,
	auth::{ApiKey, CredentialId, Role, SubjectId},
	config::SigningSecret,
	error::{ConfigError, Denial},
};

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
	sub: SubjectId,
	role: Role,
	jti: CredentialId,
	iat: i64,
	exp: i64,
}

/// Claims recovered from a valid API key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialClaims {
	/// Canonical credential identifier (`jti`).
	pub credential: CredentialId,
	/// Acting subject (`sub`).
	pub subject: SubjectId,
	/// Role claim.
	pub role: Role,
	/// Issue instant, truncated to whole seconds.
	pub issued_at: OffsetDateTime,
	/// Absolute expiry instant, truncated to whole seconds.
	pub expires_at: OffsetDateTime,
}

#[derive(Debug)]
enum Rejection {
	Token(jsonwebtoken::errors::Error),
	Claims,
	Expired,
}

/// Issues and verifies API keys with a process-wide secret.
#[derive(Clone)]
pub struct CredentialCodec {
	encoding: EncodingKey,
	decoding: DecodingKey,
	validation: Validation,
	ttl: Duration,
}
impl CredentialCodec {
	/// Creates a codec that stamps `ttl` onto every issued key.
	pub fn new(secret: &SigningSecret, ttl: Duration) -> Result<Self, ConfigError> {
		if !ttl.is_positive() {
			return Err(ConfigError::NonPositiveDuration { name: "credential TTL" });
		}

		let mut validation = Validation::new(Algorithm::HS256);

		// Expiry is checked against the injected instant in `verify`.
		validation.validate_exp = false;
		validation.set_required_spec_claims(&["exp", "sub"]);

		Ok(Self {
			encoding: EncodingKey::from_secret(secret.expose()),
			decoding: DecodingKey::from_secret(secret.expose()),
			validation,
			ttl,
		})
	}

	/// Validity period applied at issuance.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Issues a key for the credential using the current clock.
	pub fn issue(
		&self,
		credential: CredentialId,
		subject: SubjectId,
		role: Role,
	) -> Result<(ApiKey, CredentialClaims), ConfigError> {
		self.issue_at(credential, subject, role, OffsetDateTime::now_utc())
	}

	/// Issues a key as if the current instant were `now`.
	pub fn issue_at(
		&self,
		credential: CredentialId,
		subject: SubjectId,
		role: Role,
		now: OffsetDateTime,
	) -> Result<(ApiKey, CredentialClaims), ConfigError> {
		let iat = now.unix_timestamp();
		let exp = iat.saturating_add(self.ttl.whole_seconds());
		let wire = WireClaims { sub: subject, role, jti: credential, iat, exp };
		let claims = wire.to_claims().ok_or(ConfigError::ExpiryOutOfRange)?;
		let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &wire, &self.encoding)
			.map_err(ConfigError::ClaimsEncoding)?;

		Ok((ApiKey::new(token), claims))
	}

	/// Validates a key against the current clock.
	pub fn validate(&self, token: &str) -> Result<CredentialClaims, Denial> {
		self.validate_at(token, OffsetDateTime::now_utc())
	}

	/// Validates a key as if the current instant were `now`.
	pub fn validate_at(&self, token: &str, now: OffsetDateTime) -> Result<CredentialClaims, Denial> {
		self.verify(token, now).map_err(|rejection| {
			#[cfg(feature = "tracing")]
			tracing::debug!(reason = ?rejection, "API key rejected");
			#[cfg(not(feature = "tracing"))]
			let _ = rejection;

			Denial::InvalidCredential
		})
	}

	fn verify(&self, token: &str, now: OffsetDateTime) -> Result<CredentialClaims, Rejection> {
		let wire = jsonwebtoken::decode::<WireClaims>(token, &self.decoding, &self.validation)
			.map_err(Rejection::Token)?
			.claims;

		if now.unix_timestamp() >= wire.exp {
			return Err(Rejection::Expired);
		}

		wire.to_claims().ok_or(Rejection::Claims)
	}
}
impl Debug for CredentialCodec {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialCodec")
			.field("algorithm", &Algorithm::HS256)
			.field("key", &"<redacted>")
			.field("ttl", &self.ttl)
			.finish()
	}
}

impl WireClaims {
	fn to_claims(&self) -> Option<CredentialClaims> {
		Some(CredentialClaims {
			credential: self.jti,
			subject: self.sub.clone(),
			role: self.role,
			issued_at: OffsetDateTime::from_unix_timestamp(self.iat).ok()?,
			expires_at: OffsetDateTime::from_unix_timestamp(self.exp).ok()?,
		})
	}
}
