//! Ownership-based authorization.
//!
//! Creation is open to any authenticated subject. Reads, updates, and deletes require the
//! resource to exist (checked first) and the subject to be an admin or the resource owner.

// self
use crate::{
	_prelude::*,
	auth::{ResourceKey, Role, SubjectId},
	error::Denial,
};

/// Storage operation being authorized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
	/// Store a value under a key that does not exist yet.
	Create,
	/// Fetch an existing value.
	Read,
	/// Overwrite an existing value.
	Update,
	/// Remove an existing value.
	Delete,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Create => "create",
			Operation::Read => "read",
			Operation::Update => "update",
			Operation::Delete => "delete",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Decides whether `subject` acting as `role` may perform `operation` on `key`.
///
/// `owner` is the resource's recorded creator, or `None` when the resource does not exist.
pub fn authorize(
	role: Role,
	subject: &SubjectId,
	owner: Option<&SubjectId>,
	key: &ResourceKey,
	operation: Operation,
) -> Result<(), Denial> {
	if operation == Operation::Create {
		return Ok(());
	}

	let Some(owner) = owner else {
		return Err(Denial::ResourceNotFound { key: key.clone() });
	};

	if role.is_admin() || owner == subject {
		Ok(())
	} else {
		Err(Denial::OwnershipDenied { key: key.clone() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const ALL: [Operation; 4] =
		[Operation::Create, Operation::Read, Operation::Update, Operation::Delete];
	const EXISTING: [Operation; 3] = [Operation::Read, Operation::Update, Operation::Delete];

	fn subject(name: &str) -> SubjectId {
		SubjectId::new(name).expect("Subject fixture should be valid.")
	}

	fn key() -> ResourceKey {
		ResourceKey::new("k1").expect("Key fixture should be valid.")
	}

	#[test]
	fn owners_are_permitted_everything() {
		let alice = subject("alice");

		for op in ALL {
			assert_eq!(authorize(Role::User, &alice, Some(&alice), &key(), op), Ok(()), "{op}");
		}
	}

	#[test]
	fn strangers_may_only_create() {
		let alice = subject("alice");
		let bob = subject("bob");

		assert_eq!(authorize(Role::User, &bob, Some(&alice), &key(), Operation::Create), Ok(()));

		for op in EXISTING {
			assert_eq!(
				authorize(Role::User, &bob, Some(&alice), &key(), op),
				Err(Denial::OwnershipDenied { key: key() }),
				"{op}"
			);
		}
	}

	#[test]
	fn admins_are_permitted_everything() {
		let alice = subject("alice");
		let root = subject("root");

		for op in ALL {
			assert_eq!(authorize(Role::Admin, &root, Some(&alice), &key(), op), Ok(()), "{op}");
		}
	}

	#[test]
	fn missing_resources_are_reported_before_ownership() {
		let bob = subject("bob");

		for role in [Role::User, Role::Admin] {
			for op in EXISTING {
				assert_eq!(
					authorize(role, &bob, None, &key(), op),
					Err(Denial::ResourceNotFound { key: key() }),
					"{role} {op}"
				);
			}

			assert_eq!(authorize(role, &bob, None, &key(), Operation::Create), Ok(()));
		}
	}
}
