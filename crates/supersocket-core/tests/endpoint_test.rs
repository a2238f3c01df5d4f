//! Endpoint exchange tests
//!
//! Real sockets on the loopback interface and in temporary directories:
//! local datagram round trips and stream connection recycling.

use std::time::Duration;

use supersocket_core::{
    Endpoint, Error,
    proto::{Family, Message, MessageBuffer, Name, RoleFlags, SocketType, Status},
};
use tempfile::TempDir;

fn local(dir: &TempDir, name: &str, roles: RoleFlags) -> Endpoint {
    let mut endpoint =
        Endpoint::configure(name, None, 0, Family::Local, SocketType::Datagram, roles)
            .unwrap()
            .with_local_dir(dir.path())
            .unwrap();
    endpoint.activate().unwrap();
    endpoint
}

fn message(sender: &str, kind: u8, payload: &'static [u8]) -> Message {
    Message::new(Name::new(sender).unwrap(), kind, payload).unwrap()
}

#[test]
fn local_datagram_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut x = local(&dir, "X", RoleFlags::BIND);
    // a connect endpoint is named after its destination
    let mut to_x = local(&dir, "X", RoleFlags::CONNECT);
    assert!(to_x.is_connected());

    let sent = to_x.send_message(&message("Y", 7, b"ping")).unwrap();
    assert_eq!(sent, 37 + 4);

    let mut buffer = MessageBuffer::default();
    let received = x.receive_message(&mut buffer).unwrap();
    assert!(received.sender().matches("Y"));
    assert_eq!(received.kind(), 7);
    assert_eq!(received.payload().as_ref(), b"ping");
}

#[test]
fn buffer_is_reused_across_receives() {
    let dir = tempfile::tempdir().unwrap();
    let mut x = local(&dir, "X", RoleFlags::BIND);
    let mut to_x = local(&dir, "X", RoleFlags::CONNECT);

    to_x.send_message(&message("Y", 1, b"first, longer payload")).unwrap();
    to_x.send_message(&message("Y", 2, b"second")).unwrap();

    let mut buffer = MessageBuffer::with_capacity(64);
    let first = x.receive_message(&mut buffer).unwrap();
    let second = x.receive_message(&mut buffer).unwrap();
    assert_eq!(first.payload().as_ref(), b"first, longer payload");
    assert_eq!(second.kind(), 2);
    assert_eq!(second.payload().as_ref(), b"second");
}

#[test]
fn unconnected_endpoint_connects_on_demand() {
    let dir = tempfile::tempdir().unwrap();
    let mut x = local(&dir, "X", RoleFlags::BIND);
    let mut plain = local(&dir, "X", RoleFlags::empty());
    assert!(!plain.is_connected());

    plain.send_data(b"late").unwrap();
    assert!(plain.is_connected());

    let mut buf = [0u8; 8];
    let n = x.receive_data(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"late");
}

#[test]
fn oversized_datagram_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut x = local(&dir, "X", RoleFlags::BIND);
    let mut to_x = local(&dir, "X", RoleFlags::CONNECT);
    to_x.send_message(&message("Y", 1, &[0xAB; 100])).unwrap();

    let mut small = MessageBuffer::with_capacity(10);
    assert!(matches!(x.receive_message(&mut small), Err(Error::Protocol(_))));
}

#[test]
fn stream_sends_recycle_the_connection() {
    let mut server = Endpoint::configure(
        "srv",
        Some("127.0.0.1"),
        0,
        Family::Internet,
        SocketType::Stream,
        RoleFlags::BIND | RoleFlags::LISTEN,
    )
    .unwrap();
    server.activate().unwrap();
    let port = server.address().unwrap().port();

    let mut client = Endpoint::configure(
        "srv",
        Some("127.0.0.1"),
        port,
        Family::Internet,
        SocketType::Stream,
        RoleFlags::CONNECT,
    )
    .unwrap();
    client.activate().unwrap();

    let mut buffer = MessageBuffer::default();
    for (kind, payload) in [(1u8, &b"one"[..]), (2, &b"two"[..])] {
        client.send_message(&message("cli", kind, payload)).unwrap();
        assert!(!client.is_connected());
        assert_eq!(client.status(), Status::Initialized);

        assert!(server.poll_readable(Some(Duration::from_secs(5))).unwrap());
        let received = server.receive_message(&mut buffer).unwrap();
        assert_eq!(received.kind(), kind);
        assert_eq!(received.payload().as_ref(), payload);
        assert!(received.sender().matches("cli"));
    }
}

#[test]
fn closed_endpoint_refuses_io() {
    let dir = tempfile::tempdir().unwrap();
    let mut x = local(&dir, "X", RoleFlags::BIND);
    x.close();
    x.close();

    let mut buf = [0u8; 4];
    assert!(matches!(x.receive_data(&mut buf), Err(Error::Uninitialized { .. })));
    assert!(matches!(x.poll_readable(Some(Duration::ZERO)), Err(Error::Uninitialized { .. })));

    // closing resets to Uninitialized, so the endpoint can be activated again
    x.activate().unwrap();
    assert_eq!(x.status(), Status::Initialized);
}
