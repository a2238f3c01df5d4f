//! Fixed-width process names.
//!
//! Sender names and endpoint names share one 32-byte, NUL-padded field
//! layout. Content is at most 31 bytes so a terminating NUL always fits,
//! which keeps the layout readable by C peers.

use std::{borrow::Cow, fmt};

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::errors::{ProtocolError, Result};

/// A name stored in a fixed 32-byte field.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
#[repr(transparent)]
pub struct Name([u8; Name::WIDTH]);

impl Name {
    /// Width of the name field on the wire.
    pub const WIDTH: usize = 32;

    /// Longest name content in bytes.
    pub const MAX_LEN: usize = Self::WIDTH - 1;

    /// Build a name from text.
    ///
    /// # Errors
    ///
    /// - `NameTooLong` if `name` exceeds [`Name::MAX_LEN`] bytes
    /// - `NameContainsNul` if `name` contains a NUL byte
    pub fn new(name: &str) -> Result<Self> {
        let bytes = name.as_bytes();
        if bytes.len() > Self::MAX_LEN {
            return Err(ProtocolError::NameTooLong { len: bytes.len(), max: Self::MAX_LEN });
        }
        if bytes.contains(&0) {
            return Err(ProtocolError::NameContainsNul);
        }

        let mut raw = [0u8; Self::WIDTH];
        raw[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(raw))
    }

    /// Wrap a raw field exactly as received.
    ///
    /// No validation happens here: a peer may send 32 bytes without a NUL,
    /// in which case the whole field is the name.
    pub const fn from_raw(raw: [u8; Self::WIDTH]) -> Self {
        Self(raw)
    }

    /// The full 32-byte field, padding included.
    pub const fn raw(&self) -> &[u8; Self::WIDTH] {
        &self.0
    }

    /// Name content without padding.
    pub fn as_bytes(&self) -> &[u8] {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(Self::WIDTH);
        &self.0[..end]
    }

    /// Name content as UTF-8.
    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(self.as_bytes()).map_err(|_| ProtocolError::InvalidUtf8)
    }

    /// Name content with invalid UTF-8 replaced, for logging.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// Byte-exact comparison against a textual name.
    pub fn matches(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }

    /// True if the name has no content.
    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Name").field(&self.to_string_lossy()).finish()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl TryFrom<&str> for Name {
    type Error = ProtocolError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_with_nul() {
        let name = Name::new("Alice").unwrap();
        assert_eq!(&name.raw()[..5], b"Alice");
        assert!(name.raw()[5..].iter().all(|&b| b == 0));
        assert_eq!(name.as_str().unwrap(), "Alice");
        assert!(name.matches("Alice"));
        assert!(!name.matches("Alic"));
    }

    #[test]
    fn rejects_long_names() {
        let long = "x".repeat(Name::WIDTH);
        assert_eq!(
            Name::new(&long),
            Err(ProtocolError::NameTooLong { len: Name::WIDTH, max: Name::MAX_LEN })
        );
        assert!(Name::new(&"x".repeat(Name::MAX_LEN)).is_ok());
    }

    #[test]
    fn rejects_interior_nul() {
        assert_eq!(Name::new("a\0b"), Err(ProtocolError::NameContainsNul));
    }

    #[test]
    fn unterminated_raw_field_uses_whole_width() {
        let name = Name::from_raw([b'z'; Name::WIDTH]);
        assert_eq!(name.as_bytes().len(), Name::WIDTH);
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let mut raw = [0u8; Name::WIDTH];
        raw[0] = 0xff;
        let name = Name::from_raw(raw);
        assert_eq!(name.as_str(), Err(ProtocolError::InvalidUtf8));
        assert_eq!(name.to_string_lossy(), "\u{fffd}");
    }
}
