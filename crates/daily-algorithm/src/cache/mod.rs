//! Persistent key/value cache with optional TTL expiry.

pub mod keys;
pub mod ttl_cache;

pub use keys::{BundleCacheKey, CacheKey, MediaVariant, VideoCacheKey};
pub use ttl_cache::{CachedPath, TtlCache};
