//! # RDS IAM Auth Library
//!
//! Issues short-lived IAM authentication tokens for RDS database
//! connections and caches them, so that a connection pool opening many
//! connections does not sign a new token for each one.
//!
//! Modules:
//! - `auth` — `TokenProvider`: region resolution, caching, issuing
//! - `cache` — bounded, time-expiring token cache
//! - `signer` — token issuers (SigV4 presigning of the `rds-db` connect action)
//! - `session` — ambient region and credentials
//! - `connect` — "about to connect" hooks that fill in the password
//! - `config` — YAML configuration, validation and provider construction
//!
//! ```no_run
//! use rds_iam_auth::TokenProvider;
//!
//! let provider = TokenProvider::builder()
//!     .region_name("us-west-2")
//!     .cache_timeout(600)
//!     .build()?;
//! let token = provider.generate_auth_token("app", "db.example.com", 5432, None)?;
//! # let _ = token;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod auth;
pub mod cache;
pub mod config;
pub mod connect;
pub mod observability;
pub mod session;
pub mod signer;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::auth::{AuthError, ConfigurationError, TokenProvider, TokenProviderBuilder};
pub use crate::cache::{CacheKey, TokenCache};
pub use crate::connect::{ConnectHooks, ConnectListener, ConnectParams};
pub use crate::session::{Credentials, ProvideCredentials, SdkCredentials, Session};
pub use crate::signer::{AuthTokenIssuer, RdsTokenIssuer, SigningError, TokenRequest};
