//! # SetAssoc
//!
//! SetAssoc models a set-associative hardware cache of 32-bit words for simulation and teaching
//!
//! Callers feed it decoded addresses through `read` and `write` and inspect hit/miss outcomes and
//! statistics. Lines are replaced least recently used first, tracked with per-line staleness
//! counters. Nothing behind the cache is simulated: a miss allocates the block but produces no
//! data
//!
//! The engine is single-threaded; wrap a whole cache in one lock if several threads must share it

/// Contains the cache implementation, its lines, and a utility enum over the provided policies
pub mod cache;

/// Contains definitions for the JSON configuration format
pub mod config;

/// Contains the error type shared by every fallible operation
pub mod error;

/// Contains address decomposition and the validated cache parameters it relies on
pub mod geometry;

/// Contains the provided replacement policies, with a trait for implementing custom ones
pub mod replacement_policies;

/// Contains the simulator used to replay decoded accesses against a configured cache
pub mod simulator;

/// Contains hit/miss accounting
pub mod stats;
