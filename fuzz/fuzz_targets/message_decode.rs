//! Framed message decoding: contiguous and scattered paths must agree.

#![no_main]

use std::io::Read;

use libfuzzer_sys::fuzz_target;
use supersocket_proto::{Message, MessageBuffer};

fuzz_target!(|data: &[u8]| {
    let contiguous = Message::decode(data);

    let mut buffer = MessageBuffer::with_capacity(data.len());
    let mut src = data;
    let Ok(received) = src.read_vectored(&mut buffer.io_slices_mut()) else {
        return;
    };
    let scattered = buffer.finish(received);

    assert_eq!(contiguous, scattered);
    if let Ok(message) = contiguous {
        let encoded = message.to_bytes();
        assert_eq!(&data[..encoded.len()], &encoded[..]);
    }
});
