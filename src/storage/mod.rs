//! Fact and settings storage for Multiplay.
//!
//! This module provides the profile-scoped persistence contract the engine
//! consumes, with file-based and in-memory backends.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileFactStore;
pub use memory::MemoryFactStore;
pub use traits::{record_key, FactStore};
