//! Endpoint descriptors.
//!
//! A descriptor is the wire form of an endpoint: enough for a remote process
//! to rebuild an equivalent endpoint and reach it. It is the payload of every
//! discovery request and reply.
//!
//! # Layout (152 bytes)
//!
//! ```text
//! offset size field
//!      0   32 name (NUL padded)
//!     32    1 family tag
//!     33    1 socket type tag
//!     34    1 role flags
//!     35    1 status tag
//!     36    1 address present (0/1)
//!     37    1 reserved, zero
//!     38    2 port (big-endian)
//!     40    4 IPv4 octets
//!     44  108 local socket path (NUL padded)
//! ```

use std::{
    fmt,
    net::{Ipv4Addr, SocketAddrV4},
};

use bytes::Bytes;
use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
    byteorder::{BigEndian, U16},
};

use crate::{
    errors::{ProtocolError, Result},
    flags::RoleFlags,
    name::Name,
};

/// Address family of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Family {
    /// Unix domain socket addressed by a filesystem path
    Local = 1,
    /// IPv4 socket addressed by address and port
    Internet = 2,
}

impl TryFrom<u8> for Family {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Local),
            2 => Ok(Self::Internet),
            other => Err(ProtocolError::InvalidFamily(other)),
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Internet => "internet",
        })
    }
}

/// Transport semantics of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SocketType {
    /// Message oriented, one message per datagram
    Datagram = 1,
    /// Connection oriented byte stream
    Stream = 2,
}

impl TryFrom<u8> for SocketType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Datagram),
            2 => Ok(Self::Stream),
            other => Err(ProtocolError::InvalidSocketType(other)),
        }
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Datagram => "datagram",
            Self::Stream => "stream",
        })
    }
}

/// Lifecycle status of an endpoint.
///
/// ```text
/// Undefined -> Uninitialized -> Initialized
///                    |
///                    +-> SocketError | BindError | ConnectError | ListenError
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Status {
    /// Never configured
    #[default]
    Undefined = 0,
    /// Configured, no socket yet
    Uninitialized = 1,
    /// Socket acquired and every requested role applied
    Initialized = 2,
    /// Socket creation or option tuning failed
    SocketError = 3,
    /// Bind or multicast membership failed
    BindError = 4,
    /// Connect failed
    ConnectError = 5,
    /// Listen failed
    ListenError = 6,
}

impl Status {
    /// True for the terminal activation failure states.
    pub const fn is_error(self) -> bool {
        matches!(
            self,
            Self::SocketError | Self::BindError | Self::ConnectError | Self::ListenError
        )
    }
}

impl TryFrom<u8> for Status {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Undefined),
            1 => Ok(Self::Uninitialized),
            2 => Ok(Self::Initialized),
            3 => Ok(Self::SocketError),
            4 => Ok(Self::BindError),
            5 => Ok(Self::ConnectError),
            6 => Ok(Self::ListenError),
            other => Err(ProtocolError::InvalidStatus(other)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

const LOCAL_PATH_WIDTH: usize = 108;

#[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct DescriptorWire {
    name: Name,
    family: u8,
    socket_type: u8,
    roles: u8,
    status: u8,
    address_present: u8,
    reserved: u8,
    port: U16<BigEndian>,
    ipv4: [u8; 4],
    local_path: [u8; LOCAL_PATH_WIDTH],
}

const _: () = assert!(size_of::<DescriptorWire>() == EndpointDescriptor::SIZE);

/// Wire snapshot of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    /// Logical name
    pub name: Name,
    /// Address family
    pub family: Family,
    /// Transport semantics
    pub socket_type: SocketType,
    /// Requested roles
    pub roles: RoleFlags,
    /// Lifecycle status at snapshot time
    pub status: Status,
    /// IPv4 address and port, if configured
    pub address: Option<SocketAddrV4>,
    /// Local socket path, if any
    pub local_path: Option<String>,
}

impl EndpointDescriptor {
    /// Encoded size.
    pub const SIZE: usize = 152;

    /// Longest local socket path that fits the path field.
    pub const MAX_PATH_LEN: usize = LOCAL_PATH_WIDTH - 1;

    /// Encode into the fixed layout.
    ///
    /// # Errors
    ///
    /// `PathTooLong` if the local path does not fit, or contains NUL.
    pub fn encode(&self) -> Result<Bytes> {
        let mut local_path = [0u8; LOCAL_PATH_WIDTH];
        if let Some(path) = &self.local_path {
            let bytes = path.as_bytes();
            if bytes.len() > Self::MAX_PATH_LEN || bytes.contains(&0) {
                return Err(ProtocolError::PathTooLong {
                    len: bytes.len(),
                    max: Self::MAX_PATH_LEN,
                });
            }
            local_path[..bytes.len()].copy_from_slice(bytes);
        }

        let (address_present, ipv4, port) = match self.address {
            Some(addr) => (1, addr.ip().octets(), addr.port()),
            None => (0, [0; 4], 0),
        };

        let wire = DescriptorWire {
            name: self.name,
            family: self.family as u8,
            socket_type: self.socket_type as u8,
            roles: self.roles.bits(),
            status: self.status as u8,
            address_present,
            reserved: 0,
            port: U16::new(port),
            ipv4,
            local_path,
        };

        Ok(Bytes::copy_from_slice(wire.as_bytes()))
    }

    /// Decode from exactly [`EndpointDescriptor::SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// - `DescriptorSize` if `src` has the wrong length
    /// - `InvalidFamily`, `InvalidSocketType`, `InvalidRoleFlags`,
    ///   `InvalidStatus` for unknown tags
    /// - `PathTooLong` if the local path field has no terminating NUL
    /// - `InvalidUtf8` if the local path is not UTF-8
    pub fn decode(src: &[u8]) -> Result<Self> {
        let wire = DescriptorWire::read_from_bytes(src).map_err(|_| {
            ProtocolError::DescriptorSize { expected: Self::SIZE, actual: src.len() }
        })?;

        let family = Family::try_from(wire.family)?;
        let socket_type = SocketType::try_from(wire.socket_type)?;
        let roles = RoleFlags::from_wire(wire.roles)?;
        let status = Status::try_from(wire.status)?;

        let address = (wire.address_present != 0)
            .then(|| SocketAddrV4::new(Ipv4Addr::from(wire.ipv4), wire.port.get()));

        let path_end = wire.local_path.iter().position(|&b| b == 0).ok_or(
            ProtocolError::PathTooLong { len: LOCAL_PATH_WIDTH, max: Self::MAX_PATH_LEN },
        )?;
        let local_path = match &wire.local_path[..path_end] {
            [] => None,
            bytes => Some(
                std::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)?.to_owned(),
            ),
        };

        Ok(Self { name: wire.name, family, socket_type, roles, status, address, local_path })
    }
}

impl fmt::Display for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {}, roles {:?}, {})",
            self.name, self.family, self.socket_type, self.roles, self.status
        )?;
        if let Some(addr) = self.address {
            write!(f, " at {addr}")?;
        }
        if let Some(path) = &self.local_path {
            write!(f, " path {path}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use proptest::prelude::*;

    use super::*;

    fn sample() -> EndpointDescriptor {
        EndpointDescriptor {
            name: Name::new("Bob").unwrap(),
            family: Family::Internet,
            socket_type: SocketType::Datagram,
            roles: RoleFlags::BIND,
            status: Status::Initialized,
            address: Some(SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 20), 40000)),
            local_path: Some("/tmp/p_Bob".to_owned()),
        }
    }

    #[test]
    fn layout_offsets() {
        let wire = sample().encode().unwrap();
        assert_eq!(wire.len(), EndpointDescriptor::SIZE);
        assert_eq!(&wire[..3], b"Bob");
        assert_eq!(wire[32..38], hex!("02 01 02 02 01 00"));
        assert_eq!(wire[38..40], 40000u16.to_be_bytes());
        assert_eq!(wire[40..44], hex!("c0 a8 01 14"));
        assert_eq!(&wire[44..54], b"/tmp/p_Bob");
        assert!(wire[54..].iter().all(|&b| b == 0));
    }

    #[test]
    fn round_trip() {
        let descriptor = sample();
        let decoded = EndpointDescriptor::decode(&descriptor.encode().unwrap()).unwrap();
        assert_eq!(decoded, descriptor);
    }

    #[test]
    fn absent_fields_stay_absent() {
        let descriptor = EndpointDescriptor { address: None, local_path: None, ..sample() };
        let decoded = EndpointDescriptor::decode(&descriptor.encode().unwrap()).unwrap();
        assert_eq!(decoded.address, None);
        assert_eq!(decoded.local_path, None);
    }

    #[test]
    fn wrong_size_rejected() {
        assert_eq!(
            EndpointDescriptor::decode(&[0u8; 151]),
            Err(ProtocolError::DescriptorSize { expected: 152, actual: 151 })
        );
    }

    #[test]
    fn unknown_tags_rejected() {
        let good = sample().encode().unwrap().to_vec();

        let mut bad = good.clone();
        bad[32] = 9;
        assert_eq!(EndpointDescriptor::decode(&bad), Err(ProtocolError::InvalidFamily(9)));

        let mut bad = good.clone();
        bad[33] = 0;
        assert_eq!(EndpointDescriptor::decode(&bad), Err(ProtocolError::InvalidSocketType(0)));

        let mut bad = good.clone();
        bad[34] = 0x80;
        assert_eq!(EndpointDescriptor::decode(&bad), Err(ProtocolError::InvalidRoleFlags(0x80)));

        let mut bad = good;
        bad[35] = 7;
        assert_eq!(EndpointDescriptor::decode(&bad), Err(ProtocolError::InvalidStatus(7)));
    }

    #[test]
    fn long_path_rejected() {
        let descriptor = EndpointDescriptor {
            local_path: Some("p".repeat(EndpointDescriptor::MAX_PATH_LEN + 1)),
            ..sample()
        };
        assert_eq!(
            descriptor.encode(),
            Err(ProtocolError::PathTooLong {
                len: EndpointDescriptor::MAX_PATH_LEN + 1,
                max: EndpointDescriptor::MAX_PATH_LEN,
            })
        );
    }

    #[test]
    fn unterminated_path_rejected() {
        let mut wire = sample().encode().unwrap().to_vec();
        wire[44..].fill(b'p');
        assert_eq!(
            EndpointDescriptor::decode(&wire),
            Err(ProtocolError::PathTooLong { len: 108, max: 107 })
        );
    }

    #[test]
    fn status_error_states() {
        assert!(Status::BindError.is_error());
        assert!(!Status::Initialized.is_error());
        assert_eq!(Status::default(), Status::Undefined);
    }

    proptest! {
        #[test]
        fn decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 152)) {
            let _ = EndpointDescriptor::decode(&bytes);
        }
    }
}
