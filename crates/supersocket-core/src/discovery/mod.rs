//! Multicast name discovery.
//!
//! A discoverable process runs a [`listener`] thread on the discovery group.
//! A process looking for a name runs [`discover`]: it multicasts a lookup
//! request carrying the address of a private reply endpoint, and the process
//! owning the name answers directly to that address.
//!
//! ```text
//! asker                           group 239.0.0.1:5000           owner
//!   |-- LookupRequest(reply ep) ------>|------------------------>  |
//!   |<------------------------------------ LookupReply(bound ep) --|
//!   | add_prepared_endpoint(connect)
//! ```
//!
//! Both loops poll with [`DiscoveryConfig::poll_interval`](crate::config::DiscoveryConfig)
//! and check a `CancellationToken` every iteration.

mod client;
mod listener;

pub use client::discover;
pub use listener::{ListenerHandle, spawn_listener};
