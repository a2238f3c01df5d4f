//! Error types for endpoints, the registry and discovery.

use std::{fmt, io};

use supersocket_proto::{ProtocolError, Status};
use thiserror::Error;

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Activation stage that failed.
///
/// Each stage maps to the terminal status the endpoint is left in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationStage {
    /// Socket creation
    Socket,
    /// Socket option tuning (address reuse, multicast loopback)
    Options,
    /// Bind, including stale socket file removal and address read-back
    Bind,
    /// Listen for stream connections
    Listen,
    /// Multicast group membership
    Multicast,
    /// Connect to the configured address
    Connect,
}

impl ActivationStage {
    /// Status recorded when this stage fails.
    pub const fn failure_status(self) -> Status {
        match self {
            Self::Socket | Self::Options => Status::SocketError,
            Self::Bind | Self::Multicast => Status::BindError,
            Self::Listen => Status::ListenError,
            Self::Connect => Status::ConnectError,
        }
    }
}

impl fmt::Display for ActivationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Socket => "socket creation",
            Self::Options => "socket options",
            Self::Bind => "bind",
            Self::Listen => "listen",
            Self::Multicast => "multicast membership",
            Self::Connect => "connect",
        })
    }
}

/// Errors raised by endpoint, registry and discovery operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed wire data or out-of-range field.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Address text is not an IPv4 address.
    #[error("invalid IPv4 address: {0:?}")]
    InvalidAddress(String),

    /// Operation needs an internet address the endpoint does not have.
    #[error("endpoint {name} has no internet address")]
    MissingAddress {
        /// Endpoint name
        name: String,
    },

    /// A stage of socket acquisition failed.
    #[error("endpoint {name}: {stage} failed: {source}")]
    Activation {
        /// Endpoint name
        name: String,
        /// Failing stage
        stage: ActivationStage,
        /// Underlying system error
        #[source]
        source: io::Error,
    },

    /// Activation requested from a state other than `Uninitialized`.
    #[error("endpoint {name} cannot activate from status {status}")]
    InvalidState {
        /// Endpoint name
        name: String,
        /// Current status
        status: Status,
    },

    /// Endpoint has no socket.
    #[error("endpoint {name} is not initialized")]
    Uninitialized {
        /// Endpoint name
        name: String,
    },

    /// Receive on an endpoint without the bind role.
    #[error("endpoint {name} is not bound")]
    NotBound {
        /// Endpoint name
        name: String,
    },

    /// Registry index out of range.
    #[error("endpoint index {target} out of range ({count} endpoints)")]
    TargetOutOfRange {
        /// Requested index
        target: usize,
        /// Number of endpoints in the registry
        count: usize,
    },

    /// Registry has nothing to receive on.
    #[error("registry has no bound endpoints")]
    NoBoundEndpoints,

    /// Poll reported readiness but no bound endpoint was ready.
    #[error("poll reported readiness without a ready endpoint")]
    NoReadyEndpoint,

    /// I/O failure on an activated endpoint.
    #[error("endpoint {name}: {source}")]
    Io {
        /// Endpoint name
        name: String,
        /// Underlying system error
        #[source]
        source: io::Error,
    },

    /// Discovery gave up after its attempt or time bound.
    #[error("no reply for {target} after {attempts} attempts")]
    DiscoveryExhausted {
        /// Sought name
        target: String,
        /// Requests sent
        attempts: u32,
    },

    /// Discovery was cancelled.
    #[error("discovery of {target} cancelled")]
    Cancelled {
        /// Sought name
        target: String,
    },
}

impl Error {
    pub(crate) fn io(name: impl Into<String>, source: io::Error) -> Self {
        Self::Io { name: name.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_status_mapping() {
        assert_eq!(ActivationStage::Socket.failure_status(), Status::SocketError);
        assert_eq!(ActivationStage::Options.failure_status(), Status::SocketError);
        assert_eq!(ActivationStage::Bind.failure_status(), Status::BindError);
        assert_eq!(ActivationStage::Multicast.failure_status(), Status::BindError);
        assert_eq!(ActivationStage::Listen.failure_status(), Status::ListenError);
        assert_eq!(ActivationStage::Connect.failure_status(), Status::ConnectError);
    }

    #[test]
    fn activation_error_names_stage() {
        let err = Error::Activation {
            name: "X".to_owned(),
            stage: ActivationStage::Bind,
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        let text = err.to_string();
        assert!(text.starts_with("endpoint X: bind failed"));
    }
}
