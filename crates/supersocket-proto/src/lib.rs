//! Wire format for the Supersocket protocol.
//!
//! Two units travel between processes:
//!
//! - [`Message`]: a framed message written as four fixed-order segments
//!   (`sender`, `kind`, `length`, `payload`) in a single vectored write. The
//!   format is not self-describing; both sides agree on the segment widths.
//! - [`EndpointDescriptor`]: a fixed 152-byte description of an endpoint
//!   (name, address family, socket type, roles, status, addresses). It is the
//!   payload of every discovery request and reply.
//!
//! Discovery traffic is distinguished from application traffic by the
//! message kind, see [`DiscoveryKind`] and [`DiscoveryMessage`].
//!
//! # Security
//!
//! All descriptor parsing goes through compile-time verified layouts via
//! `zerocopy`, and every tag is validated on decode. Payloads are capped at
//! 16 MB. Discovery replies are not authenticated.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod descriptor;
pub mod discovery;
pub mod errors;
pub mod flags;
pub mod message;
pub mod name;

pub use descriptor::{EndpointDescriptor, Family, SocketType, Status};
pub use discovery::{DiscoveryKind, DiscoveryMessage};
pub use errors::{ProtocolError, Result};
pub use flags::RoleFlags;
pub use message::{Message, MessageBuffer, Segments};
pub use name::Name;
