//! Framed messages.
//!
//! A message is four segments written back to back with one vectored write:
//!
//! ```text
//! [sender: 32][kind: 1][length: 4, LE][payload: length]
//! ```
//!
//! Receivers scatter the same four segments into a [`MessageBuffer`] with one
//! vectored read, so a datagram maps to exactly one message.

use std::io::{IoSlice, IoSliceMut};

use bytes::{BufMut, Bytes};

use crate::{
    errors::{ProtocolError, Result},
    name::Name,
};

/// Width of the sender segment.
pub const SENDER_WIDTH: usize = Name::WIDTH;

/// Width of the kind segment.
pub const KIND_WIDTH: usize = 1;

/// Width of the length segment.
pub const LENGTH_WIDTH: usize = 4;

/// Bytes preceding the payload.
pub const HEADER_SIZE: usize = SENDER_WIDTH + KIND_WIDTH + LENGTH_WIDTH;

/// Largest payload accepted in either direction (16 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Payload capacity of a default receive buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 1500;

/// A framed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    sender: Name,
    kind: u8,
    payload: Bytes,
}

impl Message {
    /// Build a message.
    ///
    /// # Errors
    ///
    /// `PayloadTooLarge` if the payload exceeds [`MAX_PAYLOAD_SIZE`].
    pub fn new(sender: Name, kind: u8, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(Self { sender, kind, payload })
    }

    /// Name of the sending process.
    pub fn sender(&self) -> &Name {
        &self.sender
    }

    /// Kind tag.
    pub fn kind(&self) -> u8 {
        self.kind
    }

    /// Payload bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Consume the message, keeping the payload.
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Value of the length field.
    pub fn length(&self) -> u32 {
        // payload size is capped well below u32::MAX in `new` and `decode`
        u32::try_from(self.payload.len()).unwrap_or(u32::MAX)
    }

    /// Total encoded size.
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Borrow the four wire segments for a vectored write.
    pub fn segments(&self) -> Segments<'_> {
        Segments {
            sender: self.sender.raw(),
            kind: [self.kind],
            length: self.length().to_le_bytes(),
            payload: &self.payload,
        }
    }

    /// Append the encoded message to `dst`.
    pub fn encode(&self, dst: &mut impl BufMut) {
        let segments = self.segments();
        dst.put_slice(segments.sender);
        dst.put_slice(&segments.kind);
        dst.put_slice(&segments.length);
        dst.put_slice(segments.payload);
    }

    /// Encode into a fresh contiguous buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode(&mut out);
        Bytes::from(out)
    }

    /// Decode a message from contiguous bytes.
    ///
    /// Bytes beyond the declared payload length are ignored.
    ///
    /// # Errors
    ///
    /// - `Truncated` if `src` is shorter than the header
    /// - `PayloadTooLarge` if the length field exceeds [`MAX_PAYLOAD_SIZE`]
    /// - `LengthMismatch` if fewer payload bytes follow than declared
    pub fn decode(src: &[u8]) -> Result<Self> {
        if src.len() < HEADER_SIZE {
            return Err(ProtocolError::Truncated { expected: HEADER_SIZE, actual: src.len() });
        }

        let (sender, rest) = src.split_at(SENDER_WIDTH);
        let (kind, rest) = rest.split_at(KIND_WIDTH);
        let (length, payload) = rest.split_at(LENGTH_WIDTH);

        let mut sender_raw = [0u8; SENDER_WIDTH];
        sender_raw.copy_from_slice(sender);
        let mut length_raw = [0u8; LENGTH_WIDTH];
        length_raw.copy_from_slice(length);

        assemble(Name::from_raw(sender_raw), kind[0], length_raw, payload)
    }
}

fn assemble(sender: Name, kind: u8, length: [u8; LENGTH_WIDTH], received: &[u8]) -> Result<Message> {
    let declared = u32::from_le_bytes(length);
    let declared_len = declared as usize;
    if declared_len > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge { size: declared_len, max: MAX_PAYLOAD_SIZE });
    }
    if declared_len > received.len() {
        return Err(ProtocolError::LengthMismatch { declared, actual: received.len() });
    }

    Ok(Message { sender, kind, payload: Bytes::copy_from_slice(&received[..declared_len]) })
}

/// Borrowed wire segments of a [`Message`].
#[derive(Debug)]
pub struct Segments<'a> {
    sender: &'a [u8; SENDER_WIDTH],
    kind: [u8; KIND_WIDTH],
    length: [u8; LENGTH_WIDTH],
    payload: &'a [u8],
}

impl Segments<'_> {
    /// The four segments in wire order.
    pub fn io_slices(&self) -> [IoSlice<'_>; 4] {
        [
            IoSlice::new(self.sender),
            IoSlice::new(&self.kind),
            IoSlice::new(&self.length),
            IoSlice::new(self.payload),
        ]
    }
}

/// Reusable receive buffer.
///
/// Allocated once with a payload capacity; every receive scatters into the
/// same storage. A message whose payload exceeds the capacity is reported as
/// a [`ProtocolError::LengthMismatch`] by [`MessageBuffer::finish`].
#[derive(Debug, Clone)]
pub struct MessageBuffer {
    sender: [u8; SENDER_WIDTH],
    kind: [u8; KIND_WIDTH],
    length: [u8; LENGTH_WIDTH],
    payload: Vec<u8>,
}

impl MessageBuffer {
    /// Allocate a buffer holding payloads up to `capacity` bytes.
    ///
    /// The capacity is clamped to [`MAX_PAYLOAD_SIZE`].
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sender: [0; SENDER_WIDTH],
            kind: [0; KIND_WIDTH],
            length: [0; LENGTH_WIDTH],
            payload: vec![0; capacity.min(MAX_PAYLOAD_SIZE)],
        }
    }

    /// Payload capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.payload.len()
    }

    /// The four segments in wire order, for a vectored read.
    pub fn io_slices_mut(&mut self) -> [IoSliceMut<'_>; 4] {
        [
            IoSliceMut::new(&mut self.sender),
            IoSliceMut::new(&mut self.kind),
            IoSliceMut::new(&mut self.length),
            IoSliceMut::new(&mut self.payload),
        ]
    }

    /// Validate the first `received` bytes and produce a message.
    ///
    /// # Errors
    ///
    /// - `Truncated` if fewer than [`HEADER_SIZE`] bytes were received
    /// - `PayloadTooLarge` if the length field exceeds [`MAX_PAYLOAD_SIZE`]
    /// - `LengthMismatch` if fewer payload bytes were received than declared
    pub fn finish(&self, received: usize) -> Result<Message> {
        if received < HEADER_SIZE {
            return Err(ProtocolError::Truncated { expected: HEADER_SIZE, actual: received });
        }
        let payload_len = (received - HEADER_SIZE).min(self.payload.len());
        assemble(
            Name::from_raw(self.sender),
            self.kind[0],
            self.length,
            &self.payload[..payload_len],
        )
    }
}

impl Default for MessageBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use hex_literal::hex;
    use proptest::prelude::*;

    use super::*;

    fn scatter(wire: &[u8], buffer: &mut MessageBuffer) -> usize {
        let mut src = wire;
        src.read_vectored(&mut buffer.io_slices_mut()).unwrap()
    }

    #[test]
    fn hello_round_trip() {
        let message = Message::new(Name::new("A").unwrap(), 7, &b"hello"[..]).unwrap();
        let wire = message.to_bytes();

        assert_eq!(wire.len(), HEADER_SIZE + 5);
        assert_eq!(wire[0], b'A');
        assert!(wire[1..SENDER_WIDTH].iter().all(|&b| b == 0));
        assert_eq!(wire[SENDER_WIDTH..HEADER_SIZE], hex!("07 05000000"));
        assert_eq!(&wire[HEADER_SIZE..], b"hello");

        let mut buffer = MessageBuffer::default();
        let received = scatter(&wire, &mut buffer);
        let decoded = buffer.finish(received).unwrap();

        assert!(decoded.sender().matches("A"));
        assert_eq!(decoded.kind(), 7);
        assert_eq!(decoded.length(), 5);
        assert_eq!(decoded.payload().as_ref(), b"hello");
        assert_eq!(decoded.into_payload(), Bytes::from_static(b"hello"));
    }

    #[test]
    fn segments_are_in_wire_order() {
        let message = Message::new(Name::new("seg").unwrap(), 3, vec![9u8; 4]).unwrap();
        let segments = message.segments();
        let slices = segments.io_slices();

        let lens: Vec<usize> = slices.iter().map(|s| s.len()).collect();
        assert_eq!(lens, vec![SENDER_WIDTH, KIND_WIDTH, LENGTH_WIDTH, 4]);
        assert_eq!(&*slices[2], &4u32.to_le_bytes());
    }

    #[test]
    fn short_frame_is_truncated() {
        let buffer = MessageBuffer::default();
        assert_eq!(
            buffer.finish(HEADER_SIZE - 1),
            Err(ProtocolError::Truncated { expected: HEADER_SIZE, actual: HEADER_SIZE - 1 })
        );
        assert_eq!(
            Message::decode(&[0u8; 10]),
            Err(ProtocolError::Truncated { expected: HEADER_SIZE, actual: 10 })
        );
    }

    #[test]
    fn payload_beyond_capacity_is_a_length_mismatch() {
        let message = Message::new(Name::new("big").unwrap(), 1, vec![1u8; 64]).unwrap();
        let wire = message.to_bytes();

        let mut buffer = MessageBuffer::with_capacity(16);
        let received = scatter(&wire, &mut buffer);
        assert_eq!(received, HEADER_SIZE + 16);
        assert_eq!(
            buffer.finish(received),
            Err(ProtocolError::LengthMismatch { declared: 64, actual: 16 })
        );
    }

    #[test]
    fn oversized_length_field_rejected() {
        let mut wire = vec![0u8; HEADER_SIZE];
        let too_big = u32::try_from(MAX_PAYLOAD_SIZE + 1).unwrap();
        wire[SENDER_WIDTH + KIND_WIDTH..HEADER_SIZE].copy_from_slice(&too_big.to_le_bytes());
        assert_eq!(
            Message::decode(&wire),
            Err(ProtocolError::PayloadTooLarge { size: MAX_PAYLOAD_SIZE + 1, max: MAX_PAYLOAD_SIZE })
        );
    }

    #[test]
    fn trailing_bytes_ignored() {
        let message = Message::new(Name::new("t").unwrap(), 2, &b"ab"[..]).unwrap();
        let mut wire = message.to_bytes().to_vec();
        wire.extend_from_slice(b"garbage");
        assert_eq!(Message::decode(&wire).unwrap(), message);
    }

    proptest! {
        #[test]
        fn scatter_matches_contiguous_decode(
            name in "[a-zA-Z0-9_]{0,31}",
            kind in any::<u8>(),
            payload in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let message = Message::new(Name::new(&name).unwrap(), kind, payload).unwrap();
            let wire = message.to_bytes();

            let mut buffer = MessageBuffer::with_capacity(256);
            let received = scatter(&wire, &mut buffer);

            prop_assert_eq!(received, message.encoded_len());
            prop_assert_eq!(buffer.finish(received).unwrap(), message.clone());
            prop_assert_eq!(Message::decode(&wire).unwrap(), message);
        }
    }
}
