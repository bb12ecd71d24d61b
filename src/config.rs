//! Process-wide settings consumed by the gatekeeper.

// self
use crate::{_prelude::*, error::ConfigError};

/// HMAC key used to sign and verify API keys; formatting never reveals it.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(String);
impl SigningSecret {
	/// Wraps a secret after rejecting empty values.
	pub fn new(value: impl Into<String>) -> Result<Self, ConfigError> {
		let value = value.into();

		if value.is_empty() {
			return Err(ConfigError::EmptySecret);
		}

		Ok(Self(value))
	}

	/// Returns the raw key bytes. Callers must avoid logging them.
	pub fn expose(&self) -> &[u8] {
		self.0.as_bytes()
	}
}
impl Debug for SigningSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SigningSecret").field(&"<redacted>").finish()
	}
}
impl Display for SigningSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Gatekeeper configuration.
#[derive(Clone, Debug)]
pub struct GateConfig {
	/// Secret used by the credential codec.
	pub signing_secret: SigningSecret,
	/// Rate limit applied when issuance does not specify one.
	pub default_rate_limit: u32,
	/// Length of a fixed admission window.
	pub window_size: Duration,
	/// Validity period stamped into issued API keys.
	pub credential_ttl: Duration,
	/// Rate-limit requests that present no API key through a shared bucket.
	pub limit_anonymous: bool,
}
impl GateConfig {
	/// Environment variable holding the signing secret.
	pub const ENV_SECRET: &'static str = "SECRET_KEY";
	/// Environment variable holding the default rate limit.
	pub const ENV_DEFAULT_RATE_LIMIT: &'static str = "DEFAULT_RATE_LIMIT";
	/// Environment variable holding the window size in milliseconds.
	pub const ENV_WINDOW_MS: &'static str = "RATE_LIMIT_WINDOW_MS";
	/// Environment variable toggling anonymous rate limiting.
	pub const ENV_LIMIT_ANONYMOUS: &'static str = "LIMIT_ANONYMOUS";

	const DEFAULT_RATE_LIMIT: u32 = 100;
	const DEFAULT_WINDOW: Duration = Duration::hours(1);
	const DEFAULT_CREDENTIAL_TTL: Duration = Duration::days(365);

	/// Creates a configuration with default limits for the provided secret.
	pub fn new(signing_secret: SigningSecret) -> Self {
		Self {
			signing_secret,
			default_rate_limit: Self::DEFAULT_RATE_LIMIT,
			window_size: Self::DEFAULT_WINDOW,
			credential_ttl: Self::DEFAULT_CREDENTIAL_TTL,
			limit_anonymous: false,
		}
	}

	/// Loads the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Loads the configuration through an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let secret = lookup(Self::ENV_SECRET).ok_or(ConfigError::Missing { name: Self::ENV_SECRET })?;
		let mut config = Self::new(SigningSecret::new(secret)?);

		if let Some(raw) = lookup(Self::ENV_DEFAULT_RATE_LIMIT) {
			config.default_rate_limit = parse_setting(Self::ENV_DEFAULT_RATE_LIMIT, &raw)?;
		}
		if let Some(raw) = lookup(Self::ENV_WINDOW_MS) {
			let millis: i64 = parse_setting(Self::ENV_WINDOW_MS, &raw)?;

			config = config.with_window_size(Duration::milliseconds(millis))?;
		}
		if let Some(raw) = lookup(Self::ENV_LIMIT_ANONYMOUS) {
			config.limit_anonymous = parse_setting(Self::ENV_LIMIT_ANONYMOUS, &raw)?;
		}

		Ok(config)
	}

	/// Overrides the default rate limit.
	pub fn with_default_rate_limit(mut self, limit: u32) -> Self {
		self.default_rate_limit = limit;

		self
	}

	/// Overrides the admission window length.
	pub fn with_window_size(mut self, window: Duration) -> Result<Self, ConfigError> {
		if !window.is_positive() {
			return Err(ConfigError::NonPositiveDuration { name: "window size" });
		}

		self.window_size = window;

		Ok(self)
	}

	/// Overrides the API key validity period.
	pub fn with_credential_ttl(mut self, ttl: Duration) -> Result<Self, ConfigError> {
		if !ttl.is_positive() {
			return Err(ConfigError::NonPositiveDuration { name: "credential TTL" });
		}

		self.credential_ttl = ttl;

		Ok(self)
	}

	/// Toggles rate limiting for requests without an API key.
	pub fn with_limit_anonymous(mut self, enabled: bool) -> Self {
		self.limit_anonymous = enabled;

		self
	}
}

fn parse_setting<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
	T: FromStr,
{
	raw.trim().parse().map_err(|_| ConfigError::Invalid { name, value: raw.to_owned() })
}
