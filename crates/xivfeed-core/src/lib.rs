//! # xivfeed Core
//!
//! Shared, I/O-free logic for xivfeed: the feed data model, timestamp and
//! search-key normalization, and the merge/ranking engine that collapses
//! many third-party Dalamud repository feeds into one de-duplicated,
//! rankable plugin listing.
//!
//! This crate contains no tokio, reqwest, filesystem access, or other
//! native-only dependencies. The whole merge runs over data already
//! resident in memory and is deterministic for a given input: each stage
//! takes an immutable input collection and produces a new output, so the
//! pass can be re-run from scratch on every data load.

pub mod assemble;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod timestamp;
