// std
use std::sync::Arc;
// crates.io
use serde_json::json;
use time::{Duration, OffsetDateTime, macros};
// self
use kv_gatekeeper::{
	auth::{ResourceKey, Role, SubjectId},
	authorize::Operation,
	clock::ManualClock,
	config::{GateConfig, SigningSecret},
	error::{Denial, Error},
	gate::Gatekeeper,
	store::{MemoryStore, OwnerGuard},
};

const START: OffsetDateTime = macros::datetime!(2025-06-01 12:00 UTC);

fn build_gate(config: GateConfig) -> (Gatekeeper, MemoryStore, ManualClock) {
	let clock = ManualClock::new(START);
	let (gate, store) =
		Gatekeeper::in_memory(&config).expect("Gatekeeper should build from a valid config.");

	(gate.with_clock(Arc::new(clock.clone())), store, clock)
}

fn config() -> GateConfig {
	GateConfig::new(SigningSecret::new("test-secret").expect("Secret fixture should be valid."))
}

fn subject(name: &str) -> SubjectId {
	SubjectId::new(name).expect("Subject fixture should be valid.")
}

fn key(name: &str) -> ResourceKey {
	ResourceKey::new(name).expect("Key fixture should be valid.")
}

fn denial(error: Error) -> Denial {
	match error {
		Error::Denied(denial) => denial,
		other => panic!("Expected a denial, got {other:?}."),
	}
}

#[tokio::test]
async fn rate_limit_exhausts_after_configured_admissions() {
	let (gate, _, _) = build_gate(config());
	let alice = gate
		.issue_credential(subject("alice"), Role::User, Some(2))
		.await
		.expect("Issuing alice's credential should succeed.");
	let t1 = Some(alice.api_key.expose());
	let k1 = key("k1");

	gate.create(t1, &k1, json!({ "n": 1 })).await.expect("First call should be admitted.");
	gate.read(t1, &k1).await.expect("Second call should be admitted.");

	let error = gate.read(t1, &k1).await.expect_err("Third call must exceed the rate limit.");

	assert_eq!(error.status(), 429);
	assert_eq!(
		denial(error),
		Denial::RateLimitExceeded { retry_at: START + Duration::hours(1) }
	);
}

#[tokio::test]
async fn window_reset_readmits_exhausted_credential() {
	let (gate, _, clock) = build_gate(config());
	let issued = gate
		.issue_credential(subject("alice"), Role::User, Some(1))
		.await
		.expect("Issuing a credential should succeed.");
	let token = Some(issued.api_key.expose());

	gate.metadata(token).await.expect("First call should be admitted.");
	assert!(matches!(
		gate.metadata(token).await.map_err(denial),
		Err(Denial::RateLimitExceeded { .. })
	));

	clock.advance(Duration::hours(1));

	gate.metadata(token).await.expect("A new window should admit again.");

	let window = gate.limiter().window(issued.id()).expect("Window should be tracked.");

	assert_eq!(window.count, 1);
	assert_eq!(window.window_start, START + Duration::hours(1));
}

#[tokio::test]
async fn ownership_denies_strangers_and_permits_admins() {
	let (gate, store, _) = build_gate(config());
	let alice = gate
		.issue_credential(subject("alice"), Role::User, None)
		.await
		.expect("Issuing alice's credential should succeed.");
	let bob = gate
		.issue_credential(subject("bob"), Role::User, None)
		.await
		.expect("Issuing bob's credential should succeed.");
	let bob_admin = gate
		.issue_credential(subject("bob"), Role::Admin, None)
		.await
		.expect("Issuing bob's admin credential should succeed.");
	let k1 = key("k1");

	gate.create(Some(alice.api_key.expose()), &k1, json!("alice's"))
		.await
		.expect("Alice should create k1.");

	let error = gate
		.delete(Some(bob.api_key.expose()), &k1)
		.await
		.expect_err("Bob must not delete alice's resource.");

	assert_eq!(error.status(), 403);
	assert_eq!(denial(error), Denial::OwnershipDenied { key: k1.clone() });
	assert_eq!(store.resource_count(), 1);

	let removed = gate
		.delete(Some(bob_admin.api_key.expose()), &k1)
		.await
		.expect("An admin may delete any resource.");

	assert_eq!(removed.created_by, subject("alice"));
	assert_eq!(store.resource_count(), 0);
}

#[tokio::test]
async fn revoked_credentials_are_unknown() {
	let (gate, _, _) = build_gate(config());
	let issued = gate
		.issue_credential(subject("alice"), Role::User, None)
		.await
		.expect("Issuing a credential should succeed.");
	let token = Some(issued.api_key.expose());

	gate.put(token, &key("k1"), json!(1)).await.expect("Put should succeed before revocation.");

	assert!(gate.revoke_credential(&issued.id()).await.expect("Revocation should succeed."));
	assert!(!gate.revoke_credential(&issued.id()).await.expect("Revocation is idempotent."));
	assert!(gate.limiter().window(issued.id()).is_none(), "Revocation drops the window.");

	for result in [
		gate.read(token, &key("k1")).await,
		gate.delete(token, &key("k1")).await,
		gate.put(token, &key("k2"), json!(2)).await,
	] {
		assert_eq!(denial(result.expect_err("Revoked keys must be refused.")), Denial::UnknownCredential);
	}
}

#[tokio::test]
async fn credential_failures_are_distinguished() {
	let (gate, _, clock) = build_gate(config());
	let k1 = key("k1");

	assert_eq!(
		denial(gate.read(None, &k1).await.expect_err("Missing keys must be refused.")),
		Denial::MissingCredential
	);
	assert_eq!(
		denial(gate.read(Some("garbage"), &k1).await.expect_err("Garbage must be refused.")),
		Denial::InvalidCredential
	);

	let issued = gate
		.issue_credential(subject("alice"), Role::User, None)
		.await
		.expect("Issuing a credential should succeed.");

	clock.advance(Duration::days(365));

	assert_eq!(
		denial(
			gate.read(Some(issued.api_key.expose()), &k1)
				.await
				.expect_err("Expired keys must be refused.")
		),
		Denial::InvalidCredential
	);
}

#[tokio::test]
async fn keys_signed_with_another_secret_are_invalid() {
	let (gate, _, _) = build_gate(config());
	let (other, _, _) = build_gate(GateConfig::new(
		SigningSecret::new("other-secret").expect("Secret fixture should be valid."),
	));
	let foreign = other
		.issue_credential(subject("mallory"), Role::Admin, None)
		.await
		.expect("Issuing on the other gate should succeed.");

	assert_eq!(
		denial(gate.authenticate(Some(foreign.api_key.expose())).await.expect_err("Foreign key.")),
		Denial::InvalidCredential
	);
}

#[tokio::test]
async fn missing_resources_are_not_found_before_ownership() {
	let (gate, _, _) = build_gate(config());
	let bob = gate
		.issue_credential(subject("bob"), Role::User, None)
		.await
		.expect("Issuing a credential should succeed.");
	let token = Some(bob.api_key.expose());
	let ghost = key("ghost");

	for error in [
		gate.read(token, &ghost).await.expect_err("Read of a missing key."),
		gate.update(token, &ghost, json!(1)).await.expect_err("Update of a missing key."),
		gate.delete(token, &ghost).await.expect_err("Delete of a missing key."),
	] {
		assert_eq!(error.status(), 404);
		assert_eq!(denial(error), Denial::ResourceNotFound { key: ghost.clone() });
	}
}

#[tokio::test]
async fn overwrites_never_transfer_ownership() {
	let (gate, _, clock) = build_gate(config());
	let alice = gate
		.issue_credential(subject("alice"), Role::User, None)
		.await
		.expect("Issuing alice's credential should succeed.");
	let admin = gate
		.issue_credential(subject("root"), Role::Admin, None)
		.await
		.expect("Issuing the admin credential should succeed.");
	let bob = gate
		.issue_credential(subject("bob"), Role::User, None)
		.await
		.expect("Issuing bob's credential should succeed.");
	let k1 = key("k1");

	gate.put(Some(alice.api_key.expose()), &k1, json!({ "v": 1 }))
		.await
		.expect("Alice should create k1 through put.");
	clock.advance(Duration::minutes(5));

	let overwritten = gate
		.put(Some(admin.api_key.expose()), &k1, json!({ "v": 2 }))
		.await
		.expect("Admins may overwrite.");

	assert_eq!(overwritten.created_by, subject("alice"));
	assert_eq!(overwritten.created_at, START);
	assert_eq!(overwritten.updated_at, START + Duration::minutes(5));
	assert_eq!(overwritten.value, json!({ "v": 2 }));

	assert_eq!(
		denial(
			gate.put(Some(bob.api_key.expose()), &k1, json!({ "v": 3 }))
				.await
				.expect_err("Strangers may not overwrite.")
		),
		Denial::OwnershipDenied { key: k1.clone() }
	);

	let updated = gate
		.update(Some(alice.api_key.expose()), &k1, json!({ "v": 4 }))
		.await
		.expect("Owners may update.");

	assert_eq!(updated.created_by, subject("alice"));
	assert_eq!(
		gate.read(Some(bob.api_key.expose()), &k1).await.map_err(denial).err(),
		Some(Denial::OwnershipDenied { key: k1 })
	);
}

#[tokio::test]
async fn strict_create_reports_existing_keys() {
	let (gate, _, _) = build_gate(config());
	let alice = gate
		.issue_credential(subject("alice"), Role::User, None)
		.await
		.expect("Issuing a credential should succeed.");
	let token = Some(alice.api_key.expose());
	let k1 = key("k1");

	gate.create(token, &k1, json!(1)).await.expect("First create should succeed.");

	let error = gate.create(token, &k1, json!(2)).await.expect_err("Second create must fail.");

	assert!(matches!(&error, Error::ResourceExists { key } if key == &k1));
	assert_eq!(error.status(), 409);
	assert_eq!(gate.read(token, &k1).await.expect("Read should succeed.").value, json!(1));
}

#[tokio::test]
async fn check_exposes_guard_for_callers_that_persist_themselves() {
	let (gate, _, _) = build_gate(config());
	let alice = gate
		.issue_credential(subject("alice"), Role::User, None)
		.await
		.expect("Issuing a credential should succeed.");
	let admin = gate
		.issue_credential(subject("root"), Role::Admin, None)
		.await
		.expect("Issuing the admin credential should succeed.");
	let k1 = key("k1");
	let permit = gate
		.check(Some(alice.api_key.expose()), &k1, Operation::Create)
		.await
		.expect("Any authenticated subject may create.");

	assert!(permit.resource.is_none());
	assert_eq!(permit.guard, OwnerGuard::Subject(subject("alice")));

	gate.create(Some(alice.api_key.expose()), &k1, json!(1)).await.expect("Create should succeed.");

	let permit = gate
		.check(Some(admin.api_key.expose()), &k1, Operation::Delete)
		.await
		.expect("Admins may delete.");

	assert_eq!(permit.guard, OwnerGuard::Any);
	assert_eq!(permit.resource.map(|r| r.created_by), Some(subject("alice")));
}

#[tokio::test]
async fn anonymous_metadata_follows_policy() {
	let (open_gate, _, _) = build_gate(config().with_default_rate_limit(1));

	for _ in 0..3 {
		open_gate.metadata(None).await.expect("Anonymous calls bypass limits by default.");
	}

	let (strict_gate, _, _) = build_gate(config().with_default_rate_limit(1).with_limit_anonymous(true));

	strict_gate.metadata(None).await.expect("The first anonymous call fits the shared bucket.");

	assert!(matches!(
		strict_gate.metadata(None).await.map_err(denial),
		Err(Denial::RateLimitExceeded { .. })
	));
}

#[tokio::test]
async fn metadata_reports_store_statistics() {
	let (gate, _, clock) = build_gate(config());
	let alice = gate
		.issue_credential(subject("alice"), Role::User, None)
		.await
		.expect("Issuing a credential should succeed.");
	let token = Some(alice.api_key.expose());

	gate.create(token, &key("a"), json!([1, 2])).await.expect("Create a should succeed.");
	clock.advance(Duration::seconds(30));
	gate.create(token, &key("b"), json!("xyz")).await.expect("Create b should succeed.");

	let meta = gate.metadata(token).await.expect("Metadata should be readable.");

	assert_eq!(meta.total_collections, 2);
	assert_eq!(meta.total_size, ("[1,2]".len() + "\"xyz\"".len()) as u64);
	assert_eq!(meta.created_at, Some(START));
	assert_eq!(meta.updated_at, Some(START + Duration::seconds(30)));
}
