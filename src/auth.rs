//! Identity domain: identifiers, roles, API keys, and resolved principals.

pub mod api_key;
pub mod id;
pub mod principal;
pub mod role;

pub use api_key::*;
pub use id::*;
pub use principal::*;
pub use role::*;
