//! Token generation: region resolution, cache keys and the issuer call.

mod error;
mod provider;

pub use error::{AuthError, ConfigurationError};
pub use provider::{TokenProvider, TokenProviderBuilder};
