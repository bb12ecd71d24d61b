//! Gatekeeper-level error types shared across the codec, stores, and pipeline.

// self
use crate::{
	_prelude::*,
	auth::{CredentialId, IdentifierError, ResourceKey},
};

/// Gatekeeper-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical gatekeeper error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The request was refused by one of the access controls.
	#[error(transparent)]
	Denied(#[from] Denial),
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// An identifier supplied by the caller is malformed.
	#[error("Invalid identifier format: {0}")]
	InvalidFormat(#[from] IdentifierError),

	/// A credential record already exists for the identifier.
	#[error("Credential `{id}` is already registered.")]
	CredentialExists {
		/// Identifier that collided.
		id: CredentialId,
	},
	/// A strict create targeted a key that is already taken.
	#[error("Resource `{key}` already exists.")]
	ResourceExists {
		/// Key that collided.
		key: ResourceKey,
	},
}
impl Error {
	/// Returns the denial when the error was produced by an access control.
	pub fn denial(&self) -> Option<&Denial> {
		match self {
			Self::Denied(denial) => Some(denial),
			_ => None,
		}
	}

	/// Suggested status code for a request/response boundary.
	pub fn status(&self) -> u16 {
		match self {
			Self::Denied(denial) => denial.status(),
			Self::Storage(_) | Self::Config(_) => 500,
			Self::InvalidFormat(_) => 400,
			Self::CredentialExists { .. } | Self::ResourceExists { .. } => 409,
		}
	}
}

/// Reason a request was refused; every variant maps to a distinct code.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum Denial {
	/// No API key was presented where one is required.
	#[error("API key is required.")]
	MissingCredential,
	/// Signature, shape, or expiry check failed.
	#[error("API key is invalid.")]
	InvalidCredential,
	/// The API key is well signed but no credential record backs it.
	#[error("API key is not recognized.")]
	UnknownCredential,
	/// The credential exhausted its admissions for the current window.
	#[error("Rate limit exceeded; retry at {retry_at}.")]
	RateLimitExceeded {
		/// Instant the current window closes.
		retry_at: OffsetDateTime,
	},
	/// The target key has no resource record.
	#[error("Resource `{key}` was not found.")]
	ResourceNotFound {
		/// Requested key.
		key: ResourceKey,
	},
	/// The subject is neither an admin nor the resource owner.
	#[error("Access to resource `{key}` is forbidden.")]
	OwnershipDenied {
		/// Requested key.
		key: ResourceKey,
	},
}
impl Denial {
	/// Stable reason code for logs, metrics, and response bodies.
	pub const fn code(&self) -> &'static str {
		match self {
			Self::MissingCredential => "MissingCredential",
			Self::InvalidCredential => "InvalidCredential",
			Self::UnknownCredential => "UnknownCredential",
			Self::RateLimitExceeded { .. } => "RateLimitExceeded",
			Self::ResourceNotFound { .. } => "ResourceNotFound",
			Self::OwnershipDenied { .. } => "OwnershipDenied",
		}
	}

	/// Suggested status code for a request/response boundary.
	pub const fn status(&self) -> u16 {
		match self {
			Self::MissingCredential | Self::InvalidCredential | Self::UnknownCredential => 401,
			Self::RateLimitExceeded { .. } => 429,
			Self::ResourceNotFound { .. } => 404,
			Self::OwnershipDenied { .. } => 403,
		}
	}
}

/// Configuration and validation failures raised while building a gatekeeper.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required setting is absent.
	#[error("Configuration value `{name}` is required.")]
	Missing {
		/// Setting name.
		name: &'static str,
	},
	/// A setting could not be parsed.
	#[error("Configuration value `{name}` is invalid: `{value}`.")]
	Invalid {
		/// Setting name.
		name: &'static str,
		/// Raw value that failed to parse.
		value: String,
	},
	/// The signing secret is empty.
	#[error("Signing secret cannot be empty.")]
	EmptySecret,
	/// Issue instant plus TTL falls outside the representable range.
	#[error("API key expiry is out of range.")]
	ExpiryOutOfRange,
	/// API key claims could not be encoded.
	#[error("API key claims could not be encoded.")]
	ClaimsEncoding(#[source] jsonwebtoken::errors::Error),
	/// Window sizes and token lifetimes must be positive.
	#[error("The {name} duration must be positive.")]
	NonPositiveDuration {
		/// Setting name.
		name: &'static str,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn denial_codes_and_statuses_are_distinct() {
		let key = ResourceKey::new("k1").expect("Key fixture should be valid.");
		let denials = [
			Denial::MissingCredential,
			Denial::InvalidCredential,
			Denial::UnknownCredential,
			Denial::RateLimitExceeded { retry_at: OffsetDateTime::UNIX_EPOCH },
			Denial::ResourceNotFound { key: key.clone() },
			Denial::OwnershipDenied { key },
		];
		let codes: std::collections::HashSet<_> = denials.iter().map(Denial::code).collect();

		assert_eq!(codes.len(), denials.len());
		assert_eq!(
			denials.iter().map(Denial::status).collect::<Vec<_>>(),
			[401, 401, 401, 429, 404, 403]
		);
	}

	#[test]
	fn store_error_converts_into_gate_error_with_source() {
		let store_error = StoreError::Backend { message: "database unreachable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert_eq!(error.status(), 500);
		assert!(error.to_string().contains("database unreachable"));

		let source = StdError::source(&error)
			.expect("Gate error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn denial_is_reachable_from_error() {
		let error: Error = Denial::UnknownCredential.into();

		assert_eq!(error.denial(), Some(&Denial::UnknownCredential));
		assert_eq!(error.status(), 401);
		assert_eq!(Error::from(IdentifierError::NotUuid).status(), 400);
	}
}
