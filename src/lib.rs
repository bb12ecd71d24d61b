//! Access-control and admission core for multi-tenant JSON key-value stores: signed API keys,
//! fixed-window rate admission, and ownership-guarded storage in one crate.
//!
//! Every storage request flows through the same pipeline:
//!
//! 1. [`codec::CredentialCodec`] verifies the presented API key and yields its claims.
//! 2. [`store::CredentialStore`] resolves the claim's [`auth::CredentialId`] to a configured rate
//!    limit.
//! 3. [`rate_limit::RateLimiter`] admits or rejects the request inside the current window.
//! 4. [`authorize::authorize`] compares the acting subject against the resource owner.
//!
//! [`gate::Gatekeeper`] wires the stages together and applies resource mutations through
//! owner-guarded store operations so the ownership check and the write cannot drift apart.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod authorize;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod gate;
pub mod obs;
pub mod rate_limit;
pub mod store;

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

pub use serde_json;
#[cfg(test)] use color_eyre as _;
