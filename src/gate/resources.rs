//! Guarded resource operations.
//!
//! Each operation admits the caller, evaluates ownership against the stored record, and then
//! applies the mutation through an owner-guarded store call. A record that changed owner or
//! vanished between the check and the write is reported as a denial, never retried.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::ResourceKey,
	authorize::{self, Operation},
	error::Denial,
	gate::{Gatekeeper, observed},
	obs::GateAction,
	store::{GuardedOutcome, InsertOutcome, OwnerGuard, ResourceRecord, StoreMetadata},
};

impl Gatekeeper {
	/// Stores `value` under a key that must not exist yet; the caller becomes its owner.
	pub async fn create(
		&self,
		api_key: Option<&str>,
		key: &ResourceKey,
		value: Value,
	) -> Result<ResourceRecord> {
		observed(GateAction::Create, "create", async {
			let permit = self.check_inner(api_key, key, Operation::Create).await?;
			let record = ResourceRecord::new(key.clone(), value, permit.principal.subject, self.now());

			match self.resources.insert_resource(record.clone()).await? {
				InsertOutcome::Inserted => Ok(record),
				InsertOutcome::Exists => Err(Error::ResourceExists { key: key.clone() }),
			}
		})
		.await
	}

	/// Creates the key if absent, otherwise overwrites it when the caller owns it or is an admin.
	///
	/// Ownership never transfers on overwrite.
	pub async fn put(
		&self,
		api_key: Option<&str>,
		key: &ResourceKey,
		value: Value,
	) -> Result<ResourceRecord> {
		observed(GateAction::Put, "put", async {
			let principal = self.admit(api_key).await?;
			let now = self.now();
			let record = ResourceRecord::new(key.clone(), value, principal.subject.clone(), now);

			if self.resources.insert_resource(record.clone()).await? == InsertOutcome::Inserted {
				return Ok(record);
			}

			let existing = self.resources.fetch_resource(key).await?;

			authorize::authorize(
				principal.role,
				&principal.subject,
				existing.as_ref().map(|r| &r.created_by),
				key,
				Operation::Update,
			)?;

			let guard = OwnerGuard::for_principal(&principal);

			applied(key, self.resources.replace_resource(key, &guard, record.value, now).await?)
		})
		.await
	}

	/// Returns the record stored under `key`.
	pub async fn read(&self, api_key: Option<&str>, key: &ResourceKey) -> Result<ResourceRecord> {
		observed(GateAction::Read, "read", async {
			let permit = self.check_inner(api_key, key, Operation::Read).await?;

			permit.resource.ok_or_else(|| Denial::ResourceNotFound { key: key.clone() }.into())
		})
		.await
	}

	/// Overwrites an existing record's value.
	pub async fn update(
		&self,
		api_key: Option<&str>,
		key: &ResourceKey,
		value: Value,
	) -> Result<ResourceRecord> {
		observed(GateAction::Update, "update", async {
			let permit = self.check_inner(api_key, key, Operation::Update).await?;

			applied(
				key,
				self.resources.replace_resource(key, &permit.guard, value, self.now()).await?,
			)
		})
		.await
	}

	/// Deletes an existing record and returns it.
	pub async fn delete(&self, api_key: Option<&str>, key: &ResourceKey) -> Result<ResourceRecord> {
		observed(GateAction::Delete, "delete", async {
			let permit = self.check_inner(api_key, key, Operation::Delete).await?;

			applied(key, self.resources.remove_resource(key, &permit.guard).await?)
		})
		.await
	}

	/// Aggregate store statistics; callers without an API key fall under the anonymous policy.
	pub async fn metadata(&self, api_key: Option<&str>) -> Result<StoreMetadata> {
		observed(GateAction::Metadata, "metadata", async {
			self.admit_optional(api_key).await?;

			Ok(self.resources.metadata().await?)
		})
		.await
	}
}

fn applied(key: &ResourceKey, outcome: GuardedOutcome) -> Result<ResourceRecord> {
	match outcome {
		GuardedOutcome::Applied(record) => Ok(record),
		GuardedOutcome::OwnerMismatch => Err(Denial::OwnershipDenied { key: key.clone() }.into()),
		GuardedOutcome::Missing => Err(Denial::ResourceNotFound { key: key.clone() }.into()),
	}
}
