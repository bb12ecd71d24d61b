//! Thread-safe in-memory store for local development and tests.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{CredentialId, ResourceKey},
	store::{
		CredentialRecord, CredentialStore, GuardedOutcome, InsertOutcome, OwnerGuard,
		ResourceRecord, ResourceStore, StoreFuture, StoreMetadata, tables::Tables,
	},
};

/// Storage backend that keeps credentials and resources in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<Tables>>);
impl MemoryStore {
	/// Number of registered credentials.
	pub fn credential_count(&self) -> usize {
		self.0.read().credentials.len()
	}

	/// Number of stored resources.
	pub fn resource_count(&self) -> usize {
		self.0.read().resources.len()
	}
}
impl CredentialStore for MemoryStore {
	fn insert_credential(&self, record: CredentialRecord) -> StoreFuture<'_, InsertOutcome> {
		let tables = self.0.clone();

		Box::pin(async move { Ok(tables.write().insert_credential(record)) })
	}

	fn fetch_credential<'a>(
		&'a self,
		id: &'a CredentialId,
	) -> StoreFuture<'a, Option<CredentialRecord>> {
		let tables = self.0.clone();
		let id = *id;

		Box::pin(async move { Ok(tables.read().credentials.get(&id).cloned()) })
	}

	fn set_rate_limit<'a>(&'a self, id: &'a CredentialId, rate_limit: u32) -> StoreFuture<'a, bool> {
		let tables = self.0.clone();
		let id = *id;

		Box::pin(async move { Ok(tables.write().set_rate_limit(&id, rate_limit)) })
	}

	fn remove_credential<'a>(&'a self, id: &'a CredentialId) -> StoreFuture<'a, bool> {
		let tables = self.0.clone();
		let id = *id;

		Box::pin(async move { Ok(tables.write().credentials.remove(&id).is_some()) })
	}
}
impl ResourceStore for MemoryStore {
	fn insert_resource(&self, record: ResourceRecord) -> StoreFuture<'_, InsertOutcome> {
		let tables = self.0.clone();

		Box::pin(async move { Ok(tables.write().insert_resource(record)) })
	}

	fn fetch_resource<'a>(
		&'a self,
		key: &'a ResourceKey,
	) -> StoreFuture<'a, Option<ResourceRecord>> {
		let tables = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(tables.read().resources.get(&key).cloned()) })
	}

	fn replace_resource<'a>(
		&'a self,
		key: &'a ResourceKey,
		guard: &'a OwnerGuard,
		value: Value,
		at: OffsetDateTime,
	) -> StoreFuture<'a, GuardedOutcome> {
		let tables = self.0.clone();
		let key = key.to_owned();
		let guard = guard.to_owned();

		Box::pin(async move { Ok(tables.write().replace_resource(&key, &guard, value, at)) })
	}

	fn remove_resource<'a>(
		&'a self,
		key: &'a ResourceKey,
		guard: &'a OwnerGuard,
	) -> StoreFuture<'a, GuardedOutcome> {
		let tables = self.0.clone();
		let key = key.to_owned();
		let guard = guard.to_owned();

		Box::pin(async move { Ok(tables.write().remove_resource(&key, &guard)) })
	}

	fn metadata(&self) -> StoreFuture<'_, StoreMetadata> {
		let tables = self.0.clone();

		Box::pin(async move { Ok(tables.read().metadata()) })
	}
}
