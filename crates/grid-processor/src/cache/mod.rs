//! Cache implementations for grid processing.

mod stage_cache;

pub use stage_cache::{stage_key, StageCache, StageKey};
