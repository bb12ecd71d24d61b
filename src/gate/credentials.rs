//! Credential lifecycle: issuance, registration, rate-limit changes, and revocation.

// self
use crate::{
	_prelude::*,
	auth::{ApiKey, CredentialId, Role, SubjectId},
	codec::CredentialClaims,
	error::Denial,
	gate::{Gatekeeper, observed},
	obs::GateAction,
	store::{CredentialRecord, InsertOutcome},
};

/// Result of issuing a credential.
#[derive(Clone, Debug)]
pub struct IssuedCredential {
	/// Signed bearer token to hand to the subject.
	pub api_key: ApiKey,
	/// Claims embedded in the token.
	pub claims: CredentialClaims,
	/// Registered credential record.
	pub record: CredentialRecord,
}
impl IssuedCredential {
	/// Canonical credential identifier.
	pub fn id(&self) -> CredentialId {
		self.record.id
	}
}

impl Gatekeeper {
	/// Issues a signed API key for `subject` and registers its credential record.
	///
	/// `rate_limit` falls back to the configured default.
	pub async fn issue_credential(
		&self,
		subject: SubjectId,
		role: Role,
		rate_limit: Option<u32>,
	) -> Result<IssuedCredential> {
		observed(GateAction::Issue, "issue", async {
			let now = self.now();
			let id = CredentialId::generate();
			let (api_key, claims) = self.codec.issue_at(id, subject, role, now)?;
			let record = self.insert_record(id, rate_limit, now).await?;

			Ok(IssuedCredential { api_key, claims, record })
		})
		.await
	}

	/// Registers an externally chosen credential identifier.
	///
	/// Fails with [`Error::InvalidFormat`] unless `id` is a hyphenated UUID and with
	/// [`Error::CredentialExists`] if it is already registered.
	pub async fn register_credential(
		&self,
		id: &str,
		rate_limit: Option<u32>,
	) -> Result<CredentialRecord> {
		observed(GateAction::Issue, "register", async {
			let id = CredentialId::parse(id)?;

			self.insert_record(id, rate_limit, self.now()).await
		})
		.await
	}

	/// Signs a fresh API key for an already registered credential.
	pub async fn sign_credential(
		&self,
		id: &CredentialId,
		subject: SubjectId,
		role: Role,
	) -> Result<(ApiKey, CredentialClaims)> {
		observed(GateAction::Issue, "sign", async {
			let record =
				self.credentials.fetch_credential(id).await?.ok_or(Denial::UnknownCredential)?;

			Ok(self.codec.issue_at(record.id, subject, role, self.now())?)
		})
		.await
	}

	/// Looks up a credential record.
	pub async fn lookup_credential(&self, id: &CredentialId) -> Result<Option<CredentialRecord>> {
		Ok(self.credentials.fetch_credential(id).await?)
	}

	/// Changes a credential's rate limit without reissuing its key.
	///
	/// The current window keeps its count; a lower limit takes effect on the next check.
	pub async fn set_rate_limit(&self, id: &CredentialId, rate_limit: u32) -> Result<bool> {
		Ok(self.credentials.set_rate_limit(id, rate_limit).await?)
	}

	/// Revokes a credential; returns whether a record existed. Idempotent.
	pub async fn revoke_credential(&self, id: &CredentialId) -> Result<bool> {
		observed(GateAction::Revoke, "revoke", async {
			let removed = self.credentials.remove_credential(id).await?;

			self.limiter.forget(*id);

			Ok(removed)
		})
		.await
	}

	/// Validates an API key and revokes the credential it names.
	pub async fn revoke_api_key(&self, api_key: &str) -> Result<bool> {
		let claims = self.codec.validate_at(api_key, self.now())?;

		self.revoke_credential(&claims.credential).await
	}

	async fn insert_record(
		&self,
		id: CredentialId,
		rate_limit: Option<u32>,
		now: OffsetDateTime,
	) -> Result<CredentialRecord> {
		let record = CredentialRecord::new(id, rate_limit.unwrap_or(self.default_rate_limit), now);

		match self.credentials.insert_credential(record.clone()).await? {
			InsertOutcome::Inserted => Ok(record),
			InsertOutcome::Exists => Err(Error::CredentialExists { id }),
		}
	}
}
