pub mod memory;
pub mod read_through;
pub mod redis_cache;
pub mod r#trait;

pub use memory::MemoryCache;
pub use r#trait::{CacheError, CacheJsonExt, CacheResult, CacheTrait};
pub use read_through::{ReadSource, ReadThrough};
pub use redis_cache::RedisCache;
