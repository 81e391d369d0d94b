//! Repository implementations for cache operations

pub mod entries;

pub use entries::*;
