//! Protocol error types.

use thiserror::Error;

/// Result alias for wire-format operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while building or decoding wire units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Name does not fit the fixed-width name field.
    #[error("name is {len} bytes, limit is {max}")]
    NameTooLong {
        /// Length of the rejected name in bytes
        len: usize,
        /// Longest accepted name
        max: usize,
    },

    /// Names are NUL padded on the wire, so they cannot contain NUL.
    #[error("name contains an interior NUL byte")]
    NameContainsNul,

    /// Local socket path does not fit the descriptor path field.
    #[error("local socket path is {len} bytes, limit is {max}")]
    PathTooLong {
        /// Length of the rejected path in bytes
        len: usize,
        /// Longest accepted path
        max: usize,
    },

    /// Fewer bytes than the fixed header were received.
    #[error("frame truncated: got {actual} bytes, header needs {expected}")]
    Truncated {
        /// Minimum number of bytes required
        expected: usize,
        /// Number of bytes actually available
        actual: usize,
    },

    /// Length field claims more payload than was received.
    #[error("length field declares {declared} payload bytes, only {actual} received")]
    LengthMismatch {
        /// Value of the length field
        declared: u32,
        /// Payload bytes actually received
        actual: usize,
    },

    /// Payload exceeds the protocol limit.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Size of the rejected payload
        size: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// Descriptor payload has the wrong size.
    #[error("descriptor is {actual} bytes, expected {expected}")]
    DescriptorSize {
        /// Fixed descriptor size
        expected: usize,
        /// Size of the received payload
        actual: usize,
    },

    /// Unknown address family tag.
    #[error("invalid address family tag: {0}")]
    InvalidFamily(u8),

    /// Unknown socket type tag.
    #[error("invalid socket type tag: {0}")]
    InvalidSocketType(u8),

    /// Unknown status tag.
    #[error("invalid status tag: {0}")]
    InvalidStatus(u8),

    /// Role flag byte carries undefined bits.
    #[error("invalid role flags: {0:#04x}")]
    InvalidRoleFlags(u8),

    /// Text field is not valid UTF-8.
    #[error("field is not valid UTF-8")]
    InvalidUtf8,
}
