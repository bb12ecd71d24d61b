//! Table state shared by the built-in backends.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{CredentialId, ResourceKey},
	store::{
		CredentialRecord, GuardedOutcome, InsertOutcome, OwnerGuard, ResourceRecord, StoreMetadata,
	},
};

/// In-process credential and resource tables; every method is one atomic step under the
/// caller's write lock.
#[derive(Clone, Debug, Default)]
pub(crate) struct Tables {
	pub(crate) credentials: HashMap<CredentialId, CredentialRecord>,
	pub(crate) resources: HashMap<ResourceKey, ResourceRecord>,
}
impl Tables {
	pub(crate) fn insert_credential(&mut self, record: CredentialRecord) -> InsertOutcome {
		if self.credentials.contains_key(&record.id) {
			return InsertOutcome::Exists;
		}

		self.credentials.insert(record.id, record);

		InsertOutcome::Inserted
	}

	pub(crate) fn set_rate_limit(&mut self, id: &CredentialId, rate_limit: u32) -> bool {
		match self.credentials.get_mut(id) {
			Some(record) => {
				record.rate_limit = rate_limit;

				true
			},
			None => false,
		}
	}

	pub(crate) fn insert_resource(&mut self, record: ResourceRecord) -> InsertOutcome {
		if self.resources.contains_key(&record.key) {
			return InsertOutcome::Exists;
		}

		self.resources.insert(record.key.clone(), record);

		InsertOutcome::Inserted
	}

	pub(crate) fn replace_resource(
		&mut self,
		key: &ResourceKey,
		guard: &OwnerGuard,
		value: Value,
		at: OffsetDateTime,
	) -> GuardedOutcome {
		match self.resources.get_mut(key) {
			Some(record) if guard.admits(&record.created_by) => {
				record.value = value;
				record.updated_at = at;

				GuardedOutcome::Applied(record.clone())
			},
			Some(_) => GuardedOutcome::OwnerMismatch,
			None => GuardedOutcome::Missing,
		}
	}

	pub(crate) fn remove_resource(&mut self, key: &ResourceKey, guard: &OwnerGuard) -> GuardedOutcome {
		match self.resources.get(key) {
			Some(record) if guard.admits(&record.created_by) => self
				.resources
				.remove(key)
				.map_or(GuardedOutcome::Missing, GuardedOutcome::Applied),
			Some(_) => GuardedOutcome::OwnerMismatch,
			None => GuardedOutcome::Missing,
		}
	}

	pub(crate) fn metadata(&self) -> StoreMetadata {
		self.resources.values().fold(StoreMetadata::default(), |mut meta, record| {
			meta.total_size += record.size() as u64;
			meta.total_collections += 1;
			meta.created_at = Some(match meta.created_at {
				Some(seen) => seen.min(record.created_at),
				None => record.created_at,
			});
			meta.updated_at = Some(match meta.updated_at {
				Some(seen) => seen.max(record.updated_at),
				None => record.updated_at,
			});

			meta
		})
	}
}
