//! Strongly typed identifiers enforced across the gatekeeper domain.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use uuid::Uuid;
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $max:expr) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view, $max)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value, $max)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const SUBJECT_MAX_LEN: usize = 128;
const RESOURCE_KEY_MAX_LEN: usize = 512;
const HYPHENATED_UUID_LEN: usize = 36;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (subject, resource key, credential).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (subject, resource key, credential).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed byte count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (subject, resource key, credential).
		kind: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
	/// The credential identifier is not a hyphenated UUID.
	#[error("Credential identifier must be a hyphenated UUID.")]
	NotUuid,
}

def_id! { SubjectId, "Stable identifier of the user on whose behalf operations run.", "Subject", SUBJECT_MAX_LEN }
def_id! { ResourceKey, "Primary key of a stored JSON resource.", "ResourceKey", RESOURCE_KEY_MAX_LEN }

fn validate_view(kind: &'static str, view: &str, max: usize) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > max {
		return Err(IdentifierError::TooLong { kind, max });
	}

	Ok(())
}

/// Canonical credential identifier shared by the signed token (`jti`) and the credential store.
///
/// Always rendered in lowercase hyphenated form; parsing accepts only that shape (any case).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CredentialId(Uuid);
impl CredentialId {
	/// Generates a fresh random (version 4) identifier.
	pub fn generate() -> Self {
		Self(uuid::Builder::from_random_bytes(rand::random()).into_uuid())
	}

	/// Parses a hyphenated UUID string.
	pub fn parse(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		if view.len() != HYPHENATED_UUID_LEN {
			return Err(IdentifierError::NotUuid);
		}

		Uuid::try_parse(view).map(Self).map_err(|_| IdentifierError::NotUuid)
	}

	/// Returns the underlying UUID.
	pub fn as_uuid(&self) -> &Uuid {
		&self.0
	}
}
impl From<CredentialId> for String {
	fn from(value: CredentialId) -> Self {
		value.to_string()
	}
}
impl TryFrom<String> for CredentialId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(value)
	}
}
impl FromStr for CredentialId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
impl Debug for CredentialId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Credential({})", self.0.hyphenated())
	}
}
impl Display for CredentialId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.0.hyphenated(), f)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_reject_whitespace_and_empty() {
		assert!(SubjectId::new(" alice").is_err(), "Leading whitespace must be rejected.");
		assert!(SubjectId::new("").is_err());
		assert!(ResourceKey::new("with space").is_err());

		let subject = SubjectId::new("alice").expect("Subject fixture should be valid.");

		assert_eq!(subject.as_ref(), "alice");
	}

	#[test]
	fn length_limits_differ_per_kind() {
		SubjectId::new("a".repeat(SUBJECT_MAX_LEN)).expect("Exact length should succeed.");

		assert_eq!(
			SubjectId::new("a".repeat(SUBJECT_MAX_LEN + 1)),
			Err(IdentifierError::TooLong { kind: "Subject", max: SUBJECT_MAX_LEN })
		);

		ResourceKey::new("k".repeat(RESOURCE_KEY_MAX_LEN)).expect("Long keys should be accepted.");
	}

	#[test]
	fn credential_ids_require_hyphenated_uuid() {
		let id = CredentialId::parse("6F9619FF-8B86-D011-B42D-00C04FC964FF")
			.expect("Uppercase hyphenated UUID should parse.");

		assert_eq!(id.to_string(), "6f9619ff-8b86-d011-b42d-00c04fc964ff");
		assert_eq!(CredentialId::parse("not-a-uuid"), Err(IdentifierError::NotUuid));
		assert_eq!(
			CredentialId::parse("6f9619ff8b86d011b42d00c04fc964ff"),
			Err(IdentifierError::NotUuid),
			"Simple form is not the canonical shape."
		);
		assert_eq!(
			CredentialId::parse("{6f9619ff-8b86-d011-b42d-00c04fc964f}"),
			Err(IdentifierError::NotUuid)
		);
	}

	#[test]
	fn generated_ids_are_v4_and_round_trip_through_serde() {
		let id = CredentialId::generate();

		assert_eq!(id.as_uuid().get_version_num(), 4);
		assert_ne!(id, CredentialId::generate());

		let payload = serde_json::to_string(&id).expect("Credential id should serialize.");
		let back: CredentialId =
			serde_json::from_str(&payload).expect("Credential id should deserialize.");

		assert_eq!(back, id);
		assert!(serde_json::from_str::<CredentialId>("\"nope\"").is_err());
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<SubjectId, u8> = HashMap::from_iter([(
			SubjectId::new("alice").expect("Subject used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("alice"), Some(&7));
	}
}
