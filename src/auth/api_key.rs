//! Bearer API key wrapper that redacts the signed token.

// self
use crate::_prelude::*;

/// Signed API key presented by callers; formatting never reveals the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);
impl ApiKey {
	/// Wraps a token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for ApiKey {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for ApiKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ApiKey").field(&"<redacted>").finish()
	}
}
impl Display for ApiKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn api_key_formatters_redact() {
		let key = ApiKey::new("header.claims.signature");

		assert_eq!(format!("{key:?}"), "ApiKey(\"<redacted>\")");
		assert_eq!(format!("{key}"), "<redacted>");
		assert_eq!(key.expose(), "header.claims.signature");
	}
}
