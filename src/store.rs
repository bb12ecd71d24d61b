//! Storage contracts and built-in backends for credential and resource records.
//!
//! Resource mutations are exposed only in guarded form: the owner check and the write happen
//! inside one backend call, so a caller can never act on an ownership decision that went stale
//! between the check and the write.

pub mod file;
pub mod memory;

mod tables;

pub use file::FileStore;
pub use memory::MemoryStore;

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{CredentialId, Principal, ResourceKey, SubjectId},
};

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Registry of recognized credentials and their configured rate limits.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Inserts a record unless one already exists for its identifier.
	fn insert_credential(&self, record: CredentialRecord) -> StoreFuture<'_, InsertOutcome>;

	/// Fetches the record for the identifier, if present.
	fn fetch_credential<'a>(
		&'a self,
		id: &'a CredentialId,
	) -> StoreFuture<'a, Option<CredentialRecord>>;

	/// Changes an existing record's rate limit; returns whether a record was updated.
	fn set_rate_limit<'a>(&'a self, id: &'a CredentialId, rate_limit: u32) -> StoreFuture<'a, bool>;

	/// Deletes the record; returns whether one existed.
	fn remove_credential<'a>(&'a self, id: &'a CredentialId) -> StoreFuture<'a, bool>;
}

/// Key-value store for JSON resources with immutable ownership.
pub trait ResourceStore
where
	Self: Send + Sync,
{
	/// Inserts a record unless the key is already taken.
	fn insert_resource(&self, record: ResourceRecord) -> StoreFuture<'_, InsertOutcome>;

	/// Fetches the record stored under the key, if present.
	fn fetch_resource<'a>(&'a self, key: &'a ResourceKey)
	-> StoreFuture<'a, Option<ResourceRecord>>;

	/// Atomically overwrites the value if the guard admits the current owner.
	///
	/// The owner and creation instant are preserved; `updated_at` becomes `at`.
	fn replace_resource<'a>(
		&'a self,
		key: &'a ResourceKey,
		guard: &'a OwnerGuard,
		value: Value,
		at: OffsetDateTime,
	) -> StoreFuture<'a, GuardedOutcome>;

	/// Atomically deletes the record if the guard admits the current owner.
	fn remove_resource<'a>(
		&'a self,
		key: &'a ResourceKey,
		guard: &'a OwnerGuard,
	) -> StoreFuture<'a, GuardedOutcome>;

	/// Aggregates size and timestamp statistics across all resources.
	fn metadata(&self) -> StoreFuture<'_, StoreMetadata>;
}

/// Configuration attached to a credential identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
	/// Canonical credential identifier.
	pub id: CredentialId,
	/// Admissions allowed per window.
	pub rate_limit: u32,
	/// Registration instant.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}
impl CredentialRecord {
	/// Creates a record registered at `created_at`.
	pub fn new(id: CredentialId, rate_limit: u32, created_at: OffsetDateTime) -> Self {
		Self { id, rate_limit, created_at }
	}
}

/// Stored JSON value together with its ownership metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
	/// Primary key.
	pub key: ResourceKey,
	/// Stored JSON document.
	pub value: Value,
	/// Subject that first wrote the key; never changes afterwards.
	pub created_by: SubjectId,
	/// First write instant.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// Latest write instant.
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}
impl ResourceRecord {
	/// Creates a freshly written record owned by `created_by`.
	pub fn new(key: ResourceKey, value: Value, created_by: SubjectId, at: OffsetDateTime) -> Self {
		Self { key, value, created_by, created_at: at, updated_at: at }
	}

	/// Length of the value's compact JSON encoding.
	pub fn size(&self) -> usize {
		self.value.to_string().len()
	}
}

/// Aggregate statistics over the resource store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetadata {
	/// Sum of [`ResourceRecord::size`] across all records.
	pub total_size: u64,
	/// Number of stored records.
	pub total_collections: u64,
	/// Earliest creation instant.
	#[serde(with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
	/// Latest update instant.
	#[serde(with = "time::serde::rfc3339::option")]
	pub updated_at: Option<OffsetDateTime>,
}

/// Result of an insert-if-absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertOutcome {
	/// The record was stored.
	Inserted,
	/// A record already occupied the key; nothing changed.
	Exists,
}

/// Owner condition evaluated atomically with a resource mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnerGuard {
	/// Any owner is acceptable (admin access).
	Any,
	/// The record must be owned by this subject.
	Subject(SubjectId),
}
impl OwnerGuard {
	/// Admins may touch any record; everyone else only their own.
	pub fn for_principal(principal: &Principal) -> Self {
		if principal.is_admin() { Self::Any } else { Self::Subject(principal.subject.clone()) }
	}

	/// Returns `true` if the guard admits a record owned by `owner`.
	pub fn admits(&self, owner: &SubjectId) -> bool {
		match self {
			Self::Any => true,
			Self::Subject(expected) => expected == owner,
		}
	}
}

/// Result of a guarded resource mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum GuardedOutcome {
	/// The mutation happened; carries the record as written (or as removed).
	Applied(ResourceRecord),
	/// The record exists but the guard rejected its owner; nothing changed.
	OwnerMismatch,
	/// No record matched the key.
	Missing,
}

/// Error type produced by store implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
