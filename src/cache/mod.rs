pub mod cache_key;
pub mod token_cache;

pub use cache_key::CacheKey;
pub use token_cache::TokenCache;
