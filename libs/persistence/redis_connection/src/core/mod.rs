pub mod key;
pub mod pattern;
pub mod value;

pub use key::{CacheKey, CacheKeyArg1, CacheKeyAutoConstruct, CacheKeyValue};
pub use pattern::glob_match;
pub use value::{CacheValue, Json, ValueError};
