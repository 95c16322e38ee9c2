//! # xivfeed
//!
//! Aggregates third-party Dalamud plugin repository feeds into one
//! de-duplicated, searchable listing.
//!
//! Many independent repositories redistribute the same plugin — forks,
//! mirrors, re-published packages — under the same or different developer
//! identity, with different metadata freshness and different supported
//! API levels. The merge engine in [`xivfeed_core`] collapses those into
//! canonical entities; this crate wraps it with configuration, the feed
//! fetch layer, and the `xivfeed` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────┐   ┌──────────────┐
//! │ Feed fetch   │──▶│  Merge engine     │──▶│  Commands    │
//! │ http / file  │   │  (xivfeed-core)   │   │ list/search/ │
//! │ 3 inputs     │   │  group→dedup→rank │   │ export       │
//! └──────────────┘   └───────────────────┘   └──────────────┘
//! ```
//!
//! Nothing is persisted between runs: every command performs one fetch
//! pass, re-runs the merge from scratch, and prints or exports the
//! result.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`feeds`] | Feed fetch layer (HTTP or local file) |
//! | [`sources`] | `xivfeed sources` — input health table |
//! | [`listing`] | `xivfeed list` — ranked plugin table |
//! | [`search`] | `xivfeed search` — normalized substring search |
//! | [`export`] | `xivfeed export` — JSON for the browsing frontend |

pub mod config;
pub mod export;
pub mod feeds;
pub mod listing;
pub mod search;
pub mod sources;
