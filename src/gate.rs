//! Admission pipeline facade tying the codec, stores, limiter, and authorizer together.

pub mod credentials;
pub mod resources;

pub use credentials::*;

// self
use crate::{
	_prelude::*,
	auth::{Principal, ResourceKey},
	authorize::{self, Operation},
	clock::{Clock, SystemClock},
	codec::CredentialCodec,
	config::GateConfig,
	error::{ConfigError, Denial},
	obs::{self, DecisionOutcome, GateAction, GateSpan},
	rate_limit::{RateKey, RateLimiter},
	store::{CredentialStore, MemoryStore, OwnerGuard, ResourceRecord, ResourceStore},
};

/// Coordinates credential validation, rate admission, and ownership checks.
///
/// The gatekeeper owns the credential codec, the shared rate limiter, and handles to the
/// credential and resource stores. Every storage entry point runs the same pipeline: validate the
/// API key, resolve its credential record, consume one admission slot, then authorize against
/// the resource owner. Mutations are applied through owner-guarded store calls so the ownership
/// decision and the write are a single step.
#[derive(Clone)]
pub struct Gatekeeper {
	/// Registry of recognized credentials.
	pub credentials: Arc<dyn CredentialStore>,
	/// JSON resource store.
	pub resources: Arc<dyn ResourceStore>,
	codec: CredentialCodec,
	limiter: Arc<RateLimiter>,
	clock: Arc<dyn Clock>,
	default_rate_limit: u32,
	limit_anonymous: bool,
}
impl Gatekeeper {
	/// Creates a gatekeeper over the provided stores.
	pub fn new(
		config: &GateConfig,
		credentials: Arc<dyn CredentialStore>,
		resources: Arc<dyn ResourceStore>,
	) -> Result<Self, ConfigError> {
		Ok(Self {
			credentials,
			resources,
			codec: CredentialCodec::new(&config.signing_secret, config.credential_ttl)?,
			limiter: Arc::new(RateLimiter::new(config.window_size)),
			clock: Arc::new(SystemClock),
			default_rate_limit: config.default_rate_limit,
			limit_anonymous: config.limit_anonymous,
		})
	}

	/// Creates a gatekeeper backed by one shared [`MemoryStore`], returned alongside it.
	pub fn in_memory(config: &GateConfig) -> Result<(Self, MemoryStore), ConfigError> {
		let store = MemoryStore::default();
		let gate = Self::new(config, Arc::new(store.clone()), Arc::new(store.clone()))?;

		Ok((gate, store))
	}

	/// Replaces the time source.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// API key codec used for issuance and validation.
	pub fn codec(&self) -> &CredentialCodec {
		&self.codec
	}

	/// Shared rate limiter.
	pub fn limiter(&self) -> &RateLimiter {
		&self.limiter
	}

	/// Rate limit applied when issuance does not specify one.
	pub fn default_rate_limit(&self) -> u32 {
		self.default_rate_limit
	}

	/// Validates the API key and resolves its credential record.
	///
	/// Does not consume a rate-limit slot.
	pub async fn authenticate(&self, api_key: Option<&str>) -> Result<Principal> {
		let token = api_key.ok_or(Denial::MissingCredential)?;
		let claims = self.codec.validate_at(token, self.now())?;
		let record = self
			.credentials
			.fetch_credential(&claims.credential)
			.await?
			.ok_or(Denial::UnknownCredential)?;

		Ok(Principal {
			credential: record.id,
			subject: claims.subject,
			role: claims.role,
			rate_limit: record.rate_limit,
		})
	}

	/// Authenticates and consumes one admission slot.
	pub async fn admit(&self, api_key: Option<&str>) -> Result<Principal> {
		let principal = self.authenticate(api_key).await?;

		self.limiter
			.admit_at(principal.credential, principal.rate_limit, self.now())
			.into_result()?;

		Ok(principal)
	}

	/// Runs the full pipeline for `operation` on `key` without touching the resource.
	///
	/// On success the caller may proceed; mutations should go through [`Permit::guard`] so the
	/// ownership condition is re-checked atomically by the store.
	pub async fn check(
		&self,
		api_key: Option<&str>,
		key: &ResourceKey,
		operation: Operation,
	) -> Result<Permit> {
		observed(GateAction::from(operation), "check", self.check_inner(api_key, key, operation))
			.await
	}

	pub(crate) async fn check_inner(
		&self,
		api_key: Option<&str>,
		key: &ResourceKey,
		operation: Operation,
	) -> Result<Permit> {
		let principal = self.admit(api_key).await?;
		let resource = self.resources.fetch_resource(key).await?;

		authorize::authorize(
			principal.role,
			&principal.subject,
			resource.as_ref().map(|r| &r.created_by),
			key,
			operation,
		)?;

		Ok(Permit { guard: OwnerGuard::for_principal(&principal), principal, resource })
	}

	/// Admits a request that may lack an API key, applying the anonymous policy.
	pub(crate) async fn admit_optional(&self, api_key: Option<&str>) -> Result<Option<Principal>> {
		if api_key.is_some() {
			return self.admit(api_key).await.map(Some);
		}
		if self.limit_anonymous {
			self.limiter
				.admit_at(RateKey::Anonymous, self.default_rate_limit, self.now())
				.into_result()?;
		}

		Ok(None)
	}

	pub(crate) fn now(&self) -> OffsetDateTime {
		self.clock.now()
	}
}
impl Debug for Gatekeeper {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gatekeeper")
			.field("codec", &self.codec)
			.field("window_size", &self.limiter.window_size())
			.field("default_rate_limit", &self.default_rate_limit)
			.field("limit_anonymous", &self.limit_anonymous)
			.finish()
	}
}

/// Proof that a request passed every control.
#[derive(Clone, Debug)]
pub struct Permit {
	/// Authenticated caller.
	pub principal: Principal,
	/// Resource as observed during the check; `None` for creates of absent keys.
	pub resource: Option<ResourceRecord>,
	/// Owner condition to hand to guarded store mutations.
	pub guard: OwnerGuard,
}

/// Wraps a pipeline future in a span and records its outcome.
pub(crate) async fn observed<T>(
	action: GateAction,
	stage: &'static str,
	fut: impl Future<Output = Result<T>>,
) -> Result<T> {
	let result = GateSpan::new(action, stage).instrument(fut).await;

	if let Err(e) = &result {
		obs::trace_rejection(action, e);
	}

	obs::record_decision(action, DecisionOutcome::of(&result));

	result
}
