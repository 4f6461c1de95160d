//! # storage-adapters
//!
//! Implementations of the `Store<T>` port, plus seed loading.

pub mod memory;
pub mod seed;

pub use memory::MemoryStore;
pub use seed::{SeedData, SeedSummary};
