//! Identity resolved from a validated API key and its credential record.

// self
use crate::{
	_prelude::*,
	auth::{CredentialId, Role, SubjectId},
};

/// Authenticated caller: who it is, what it may do, and how fast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
	/// Credential the request was presented with.
	pub credential: CredentialId,
	/// Acting subject.
	pub subject: SubjectId,
	/// Role claim from the signed token.
	pub role: Role,
	/// Admissions per window configured on the credential record.
	pub rate_limit: u32,
}
impl Principal {
	/// Returns `true` when the principal may touch any resource.
	pub fn is_admin(&self) -> bool {
		self.role.is_admin()
	}
}
