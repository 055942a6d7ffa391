//! Cached Lookup Providers
//!
//! Read-through decorators for user and app lookups. Each provider wraps
//! an uncached provider by composition and shares the cache handle.
//!
//! No request coalescing: concurrent misses on one key each query the
//! store and each write back. Last writer wins.

mod cached;
mod read_through;
mod stats;

pub use cached::{CachedAppProvider, CachedUserProvider};
pub use read_through::{ReadThrough, DEFAULT_CACHE_OP_TIMEOUT};
pub use stats::{LookupStats, StatsSnapshot};
