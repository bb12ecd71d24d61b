//! Role claim carried by every API key.

// self
use crate::_prelude::*;

/// Authorization role embedded in a signed API key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// Unrestricted access to every resource.
	Admin,
	/// Access restricted to resources the subject created.
	#[default]
	User,
}
impl Role {
	/// Returns a stable label suitable for claims, spans, and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Role::Admin => "admin",
			Role::User => "user",
		}
	}

	/// Returns `true` for [`Role::Admin`].
	pub const fn is_admin(self) -> bool {
		matches!(self, Role::Admin)
	}
}
impl Display for Role {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Error returned when a role label is not recognized.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown role `{0}`; expected `admin` or `user`.")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
	type Err = UnknownRole;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"admin" => Ok(Role::Admin),
			"user" => Ok(Role::User),
			other => Err(UnknownRole(other.to_owned())),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn role_labels_round_trip() {
		assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
		assert_eq!(Role::User.to_string(), "user");
		assert!("root".parse::<Role>().is_err());
		assert_eq!(serde_json::to_string(&Role::Admin).expect("Role should serialize."), "\"admin\"");
		assert_eq!(Role::default(), Role::User);
	}
}
