//! Simple file-backed store for single-process deployments.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{CredentialId, ResourceKey},
	store::{
		CredentialRecord, CredentialStore, GuardedOutcome, InsertOutcome, OwnerGuard,
		ResourceRecord, ResourceStore, StoreError, StoreFuture, StoreMetadata, tables::Tables,
	},
};

#[derive(Default, Serialize, Deserialize)]
struct Snapshot {
	credentials: Vec<CredentialRecord>,
	resources: Vec<ResourceRecord>,
}
impl From<Snapshot> for Tables {
	fn from(snapshot: Snapshot) -> Self {
		Self {
			credentials: snapshot.credentials.into_iter().map(|r| (r.id, r)).collect(),
			resources: snapshot.resources.into_iter().map(|r| (r.key.clone(), r)).collect(),
		}
	}
}

/// Persists credentials and resources to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Tables>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let tables = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(tables)) })
	}

	/// Location of the snapshot file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Tables, StoreError> {
		if !path.exists() {
			return Ok(Tables::default());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(Tables::default());
		}

		let deserializer = &mut serde_json::Deserializer::from_slice(&bytes);
		let snapshot: Snapshot =
			serde_path_to_error::deserialize(deserializer).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {} at `{}`: {}", path.display(), e.path(), e.inner()),
			})?;

		Ok(snapshot.into())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, tables: &Tables) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let mut credentials: Vec<_> = tables.credentials.values().cloned().collect();
		let mut resources: Vec<_> = tables.resources.values().cloned().collect();

		credentials.sort_by_key(|r| r.id);
		resources.sort_by(|a, b| a.key.cmp(&b.key));

		let serialized = serde_json::to_vec_pretty(&Snapshot { credentials, resources }).map_err(
			|e| StoreError::Serialization { message: format!("Failed to serialize store snapshot: {e}") },
		)?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	/// Applies `mutate` to a staged copy under the write lock.
	///
	/// The copy replaces the live tables only after it has been persisted, so a failed write
	/// leaves memory and disk in agreement.
	fn mutate<T>(
		&self,
		mutate: impl FnOnce(&mut Tables) -> T,
		changed: impl FnOnce(&T) -> bool,
	) -> Result<T, StoreError> {
		let mut guard = self.inner.write();
		let mut staged = guard.clone();
		let outcome = mutate(&mut staged);

		if changed(&outcome) {
			self.persist_locked(&staged)?;

			*guard = staged;
		}

		Ok(outcome)
	}
}
impl CredentialStore for FileStore {
	fn insert_credential(&self, record: CredentialRecord) -> StoreFuture<'_, InsertOutcome> {
		Box::pin(async move {
			self.mutate(|t| t.insert_credential(record), |o| *o == InsertOutcome::Inserted)
		})
	}

	fn fetch_credential<'a>(
		&'a self,
		id: &'a CredentialId,
	) -> StoreFuture<'a, Option<CredentialRecord>> {
		Box::pin(async move { Ok(self.inner.read().credentials.get(id).cloned()) })
	}

	fn set_rate_limit<'a>(&'a self, id: &'a CredentialId, rate_limit: u32) -> StoreFuture<'a, bool> {
		Box::pin(async move { self.mutate(|t| t.set_rate_limit(id, rate_limit), |updated| *updated) })
	}

	fn remove_credential<'a>(&'a self, id: &'a CredentialId) -> StoreFuture<'a, bool> {
		Box::pin(async move {
			self.mutate(|t| t.credentials.remove(id).is_some(), |removed| *removed)
		})
	}
}
impl ResourceStore for FileStore {
	fn insert_resource(&self, record: ResourceRecord) -> StoreFuture<'_, InsertOutcome> {
		Box::pin(async move {
			self.mutate(|t| t.insert_resource(record), |o| *o == InsertOutcome::Inserted)
		})
	}

	fn fetch_resource<'a>(
		&'a self,
		key: &'a ResourceKey,
	) -> StoreFuture<'a, Option<ResourceRecord>> {
		Box::pin(async move { Ok(self.inner.read().resources.get(key).cloned()) })
	}

	fn replace_resource<'a>(
		&'a self,
		key: &'a ResourceKey,
		guard: &'a OwnerGuard,
		value: Value,
		at: OffsetDateTime,
	) -> StoreFuture<'a, GuardedOutcome> {
		Box::pin(async move {
			self.mutate(
				|t| t.replace_resource(key, guard, value, at),
				|o| matches!(o, GuardedOutcome::Applied(_)),
			)
		})
	}

	fn remove_resource<'a>(
		&'a self,
		key: &'a ResourceKey,
		guard: &'a OwnerGuard,
	) -> StoreFuture<'a, GuardedOutcome> {
		Box::pin(async move {
			self.mutate(
				|t| t.remove_resource(key, guard),
				|o| matches!(o, GuardedOutcome::Applied(_)),
			)
		})
	}

	fn metadata(&self) -> StoreFuture<'_, StoreMetadata> {
		Box::pin(async move { Ok(self.inner.read().metadata()) })
	}
}
