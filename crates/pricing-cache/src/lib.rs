//! # Pricing Cache
//!
//! 製程參數快取與髒標記追蹤

pub mod dirty_tracking;
pub mod parameter_cache;

// Re-export 主要類型
pub use dirty_tracking::DirtyTracker;
pub use parameter_cache::{CacheStats, CachedParameterSource, InvalidatingParameterWriter};
