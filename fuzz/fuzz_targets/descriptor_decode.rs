//! Descriptor decoding: accepted input re-encodes to itself, modulo bytes
//! past the NUL terminators and the address fields of address-less
//! descriptors.

#![no_main]

use libfuzzer_sys::fuzz_target;
use supersocket_proto::EndpointDescriptor;

fuzz_target!(|data: &[u8]| {
    let Ok(descriptor) = EndpointDescriptor::decode(data) else {
        return;
    };
    let encoded = descriptor.encode().expect("decoded descriptor re-encodes");
    let again = EndpointDescriptor::decode(&encoded).expect("re-encoded descriptor decodes");
    assert_eq!(descriptor, again);
});
