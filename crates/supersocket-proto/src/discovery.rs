//! Discovery messages.
//!
//! Discovery runs over the multicast group with ordinary framed messages.
//! The kind tag selects request or reply; the payload is always an
//! [`EndpointDescriptor`]:
//!
//! - request: descriptor name is the sought name, its address is where the
//!   asker waits for replies
//! - reply: descriptor of the matching endpoint, sender is its name

use crate::{
    descriptor::EndpointDescriptor,
    errors::Result,
    message::Message,
    name::Name,
};

/// Kind tags used on the discovery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DiscoveryKind {
    /// Who has this name?
    LookupRequest = 1,
    /// I do, reach me here
    LookupReply = 2,
}

impl DiscoveryKind {
    /// Parse a kind tag. Unknown tags are not discovery traffic.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::LookupRequest),
            2 => Some(Self::LookupReply),
            _ => None,
        }
    }

    /// Wire tag.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// A decoded discovery message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryMessage {
    /// Lookup request carrying the asker's reply endpoint
    LookupRequest(EndpointDescriptor),
    /// Lookup reply carrying the matched endpoint
    LookupReply(EndpointDescriptor),
}

impl DiscoveryMessage {
    /// Interpret a framed message.
    ///
    /// Returns `Ok(None)` for kinds that are not discovery traffic.
    ///
    /// # Errors
    ///
    /// Descriptor decode errors for discovery kinds with a bad payload.
    pub fn parse(message: &Message) -> Result<Option<Self>> {
        let Some(kind) = DiscoveryKind::from_u8(message.kind()) else {
            return Ok(None);
        };
        let descriptor = EndpointDescriptor::decode(message.payload())?;
        Ok(Some(match kind {
            DiscoveryKind::LookupRequest => Self::LookupRequest(descriptor),
            DiscoveryKind::LookupReply => Self::LookupReply(descriptor),
        }))
    }

    /// Kind tag of this message.
    pub const fn kind(&self) -> DiscoveryKind {
        match self {
            Self::LookupRequest(_) => DiscoveryKind::LookupRequest,
            Self::LookupReply(_) => DiscoveryKind::LookupReply,
        }
    }

    /// Carried descriptor.
    pub const fn descriptor(&self) -> &EndpointDescriptor {
        match self {
            Self::LookupRequest(d) | Self::LookupReply(d) => d,
        }
    }

    /// Frame as a message from `sender`.
    ///
    /// # Errors
    ///
    /// Descriptor encode errors.
    pub fn into_message(self, sender: Name) -> Result<Message> {
        let payload = self.descriptor().encode()?;
        Message::new(sender, self.kind().to_u8(), payload)
    }
}
