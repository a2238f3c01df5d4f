//! Endpoint role flags.

use bitflags::bitflags;

use crate::errors::{ProtocolError, Result};

bitflags! {
    /// Roles requested for an endpoint.
    ///
    /// Several roles combine, e.g. `BIND | MULTICAST` to receive on a
    /// multicast group. The bit values are part of the descriptor layout.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RoleFlags: u8 {
        /// Placeholder role carried by unconfigured endpoints
        const UNINITIALIZED = 1 << 0;
        /// Bind to the configured address and receive on it
        const BIND = 1 << 1;
        /// Connect to the configured address and send to it
        const CONNECT = 1 << 2;
        /// Join the configured multicast group
        const MULTICAST = 1 << 3;
        /// Accept stream connections
        const LISTEN = 1 << 4;
    }
}

impl RoleFlags {
    /// Endpoint binds a local address.
    pub const fn is_bind(self) -> bool {
        self.contains(Self::BIND)
    }

    /// Endpoint connects to a remote address.
    pub const fn is_connect(self) -> bool {
        self.contains(Self::CONNECT)
    }

    /// Endpoint joins a multicast group.
    pub const fn is_multicast(self) -> bool {
        self.contains(Self::MULTICAST)
    }

    /// Endpoint accepts stream connections.
    pub const fn is_listen(self) -> bool {
        self.contains(Self::LISTEN)
    }

    /// Connect at activation time.
    ///
    /// Multicast endpoints are never connected; they send with an
    /// address-targeted primitive instead.
    pub const fn connects_on_activate(self) -> bool {
        self.is_connect() && !self.is_multicast()
    }

    /// Decode the wire byte, rejecting undefined bits.
    pub fn from_wire(bits: u8) -> Result<Self> {
        Self::from_bits(bits).ok_or(ProtocolError::InvalidRoleFlags(bits))
    }
}
