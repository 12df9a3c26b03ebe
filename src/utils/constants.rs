//! Shared constants and invariants

/// Upper bound of live entries per token cache
pub const DEFAULT_CACHE_CAPACITY: usize = 100;
/// Seconds a cached token is reused for (10 minutes)
pub const DEFAULT_CACHE_TIMEOUT_SECS: i64 = 600;
/// Validity requested for a presigned token; RDS rejects anything longer
pub const MAX_TOKEN_EXPIRES_IN_SECS: u64 = 900;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Kept SDK credentials are re-resolved this close to their expiry
pub const CREDENTIALS_REFRESH_MARGIN_SECS: u64 = 300;
