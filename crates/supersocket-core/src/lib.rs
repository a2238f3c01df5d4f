//! Supersocket inter-process messaging.
//!
//! One logical "supersocket" per process aggregates many OS sockets (local
//! and IPv4, datagram and stream) behind index-based send and receive, and
//! finds peers by name over multicast.
//!
//! # Architecture
//!
//! Everything runs on OS threads with blocking socket calls. Application
//! threads send and receive through a [`Registry`]; a discovery listener
//! thread reads the same registry to answer lookups while [`discover`] adds
//! endpoints to it. The registry's reader-writer lock keeps those two sides
//! from observing each other half done.
//!
//! # Components
//!
//! - [`endpoint`]: single socket lifecycle, framed and raw I/O
//! - [`registry`]: endpoint set, fan-out, fair receive
//! - [`discovery`]: multicast lookup listener and asker
//! - [`handles`]: opaque handle table for foreign bindings
//! - [`config`]: discovery constants and configuration
//! - [`error`]: error types

pub mod config;
pub mod discovery;
pub mod endpoint;
pub mod error;
pub mod handles;
mod poll;
pub mod registry;

pub use config::DiscoveryConfig;
pub use discovery::{ListenerHandle, discover, spawn_listener};
pub use endpoint::{Endpoint, reply_to};
pub use error::{ActivationStage, Error, Result};
pub use handles::{Handle, HandleTable};
pub use registry::Registry;
pub use supersocket_proto as proto;
