//! A single socket endpoint.
//!
//! An [`Endpoint`] pairs a socket with the configuration needed to create it:
//! name, address family, socket type, roles and addresses. Configuration is
//! pure data; [`Endpoint::activate`] acquires the socket in stages:
//!
//! ```text
//! socket -> SO_REUSEADDR -> bind -> listen -> multicast join -> connect
//! ```
//!
//! Each stage runs only if the roles request it. The first failing stage
//! decides the terminal status (see [`ActivationStage::failure_status`]) and
//! the partially set up socket is released.
//!
//! # Sending
//!
//! Multicast endpoints send with an address-targeted write. Every other
//! endpoint connects on demand if it is not connected yet. After a stream
//! send the connection is closed and replaced by a fresh unconnected socket,
//! so every stream message travels over its own connection.
//!
//! # Receiving
//!
//! Only bound endpoints receive. Listening endpoints accept one connection,
//! read it until the peer closes or the buffer is full, then drop it.

use std::{
    fs,
    io::{self, IoSliceMut, Read},
    net::{Ipv4Addr, SocketAddrV4},
    os::fd::{AsFd, BorrowedFd},
    path::{Path, PathBuf},
    time::Duration,
};

use socket2::{Domain, SockAddr, Socket, Type};
use supersocket_proto::{
    EndpointDescriptor, Family, Message, MessageBuffer, Name, ProtocolError, RoleFlags,
    SocketType, Status,
};
use tracing::{debug, error, warn};

use crate::{
    config::{self, DEFAULT_LOCAL_DIR, LISTEN_BACKLOG},
    error::{ActivationStage, Error, Result},
    poll,
};

type StageResult<T> = std::result::Result<T, (ActivationStage, io::Error)>;

trait AtStage<T> {
    fn at(self, stage: ActivationStage) -> StageResult<T>;
}

impl<T> AtStage<T> for io::Result<T> {
    fn at(self, stage: ActivationStage) -> StageResult<T> {
        self.map_err(|e| (stage, e))
    }
}

/// A configured, possibly activated socket endpoint.
#[derive(Debug)]
pub struct Endpoint {
    name: Name,
    family: Family,
    socket_type: SocketType,
    roles: RoleFlags,
    status: Status,
    socket: Option<Socket>,
    connected: bool,
    address: Option<SocketAddrV4>,
    local_path: PathBuf,
}

impl Endpoint {
    /// Configure an endpoint without touching the network.
    ///
    /// `address` is IPv4 text; `None` leaves the internet address unset.
    /// The local socket path is `/tmp/p_<name>`, see
    /// [`Endpoint::with_local_dir`].
    ///
    /// # Errors
    ///
    /// - `Protocol(NameTooLong | NameContainsNul)` for a bad name
    /// - `InvalidAddress` if `address` is not IPv4
    /// - `Protocol(PathTooLong)` if the local path does not fit
    pub fn configure(
        name: &str,
        address: Option<&str>,
        port: u16,
        family: Family,
        socket_type: SocketType,
        roles: RoleFlags,
    ) -> Result<Self> {
        let name_field = Name::new(name)?;
        let address = address
            .map(|text| {
                text.parse::<Ipv4Addr>()
                    .map(|ip| SocketAddrV4::new(ip, port))
                    .map_err(|_| Error::InvalidAddress(text.to_owned()))
            })
            .transpose()?;
        let local_path = checked_path(config::local_path(Path::new(DEFAULT_LOCAL_DIR), name))?;

        Ok(Self {
            name: name_field,
            family,
            socket_type,
            roles,
            status: Status::Uninitialized,
            socket: None,
            connected: false,
            address,
            local_path,
        })
    }

    /// Rebuild a configured endpoint from a received descriptor.
    ///
    /// The result is `Uninitialized` whatever the descriptor status says.
    /// Without a path in the descriptor the default local directory is used.
    pub fn from_descriptor(descriptor: &EndpointDescriptor) -> Result<Self> {
        let local_path = match &descriptor.local_path {
            Some(path) => checked_path(PathBuf::from(path))?,
            None => checked_path(config::local_path(
                Path::new(DEFAULT_LOCAL_DIR),
                descriptor.name.as_str()?,
            ))?,
        };

        Ok(Self {
            name: descriptor.name,
            family: descriptor.family,
            socket_type: descriptor.socket_type,
            roles: descriptor.roles,
            status: Status::Uninitialized,
            socket: None,
            connected: false,
            address: descriptor.address,
            local_path,
        })
    }

    /// Place the local socket file under `dir` instead of `/tmp`.
    pub fn with_local_dir(mut self, dir: impl AsRef<Path>) -> Result<Self> {
        self.local_path = checked_path(config::local_path(dir.as_ref(), self.name.as_str()?))?;
        Ok(self)
    }

    /// Replace the requested roles before activation.
    pub fn with_roles(mut self, roles: RoleFlags) -> Self {
        self.roles = roles;
        self
    }

    /// Replace the address family before activation.
    pub fn with_family(mut self, family: Family) -> Self {
        self.family = family;
        self
    }

    /// Logical name.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Address family.
    pub fn family(&self) -> Family {
        self.family
    }

    /// Socket type.
    pub fn socket_type(&self) -> SocketType {
        self.socket_type
    }

    /// Requested roles.
    pub fn roles(&self) -> RoleFlags {
        self.roles
    }

    /// Lifecycle status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Internet address; the kernel-assigned one once bound.
    pub fn address(&self) -> Option<SocketAddrV4> {
        self.address
    }

    /// Local socket path.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// True if the socket is connected to its configured address.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Wire snapshot of this endpoint.
    pub fn descriptor(&self) -> EndpointDescriptor {
        EndpointDescriptor {
            name: self.name,
            family: self.family,
            socket_type: self.socket_type,
            roles: self.roles,
            status: self.status,
            address: self.address,
            local_path: self.local_path.to_str().map(str::to_owned),
        }
    }

    /// Acquire the socket and apply every requested role.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless the endpoint is `Uninitialized`
    /// - `MissingAddress` if an internet bind or connect has no address
    /// - `Activation` naming the failing stage; the status records it
    pub fn activate(&mut self) -> Result<()> {
        if self.status != Status::Uninitialized {
            return Err(Error::InvalidState { name: self.name.to_string(), status: self.status });
        }
        if self.family == Family::Internet
            && self.address.is_none()
            && (self.roles.is_bind() || self.roles.is_connect())
        {
            return Err(Error::MissingAddress { name: self.name.to_string() });
        }

        match self.open() {
            Ok((socket, connected)) => {
                self.socket = Some(socket);
                self.connected = connected;
                self.status = Status::Initialized;
                debug!(
                    endpoint = %self.name,
                    family = %self.family,
                    socket_type = %self.socket_type,
                    roles = ?self.roles,
                    address = ?self.address,
                    "endpoint initialized"
                );
                Ok(())
            },
            Err((stage, source)) => {
                self.status = stage.failure_status();
                error!(endpoint = %self.name, %stage, error = %source, "activation failed");
                Err(Error::Activation { name: self.name.to_string(), stage, source })
            },
        }
    }

    fn open(&mut self) -> StageResult<(Socket, bool)> {
        let socket =
            Socket::new(self.domain(), self.sock_type(), None).at(ActivationStage::Socket)?;
        socket.set_reuse_address(true).at(ActivationStage::Options)?;

        if self.roles.is_bind() {
            if self.family == Family::Local {
                remove_stale(&self.local_path).at(ActivationStage::Bind)?;
            }
            let addr = self.target_addr().at(ActivationStage::Bind)?;
            socket.bind(&addr).at(ActivationStage::Bind)?;
            if self.family == Family::Internet {
                let bound = socket.local_addr().at(ActivationStage::Bind)?;
                self.address = bound.as_socket_ipv4().or(self.address);
            }
        }

        if self.roles.is_listen() {
            socket.listen(LISTEN_BACKLOG).at(ActivationStage::Listen)?;
        }

        if self.roles.is_multicast() {
            let group = self.address.map_or(Ipv4Addr::UNSPECIFIED, |a| *a.ip());
            socket
                .join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)
                .at(ActivationStage::Multicast)?;
            socket.set_multicast_loop_v4(true).at(ActivationStage::Options)?;
        }

        let connected = self.roles.connects_on_activate();
        if connected {
            let addr = self.target_addr().at(ActivationStage::Connect)?;
            socket.connect(&addr).at(ActivationStage::Connect)?;
        }

        Ok((socket, connected))
    }

    /// Release the socket and reset to `Uninitialized`.
    ///
    /// A bound local endpoint also removes its socket file. Closing twice is
    /// a no-op.
    pub fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            drop(socket);
            if self.family == Family::Local
                && self.roles.is_bind()
                && let Err(e) = remove_stale(&self.local_path)
            {
                warn!(
                    endpoint = %self.name,
                    path = %self.local_path.display(),
                    error = %e,
                    "failed to remove socket file"
                );
            }
            debug!(endpoint = %self.name, "endpoint closed");
        }
        self.connected = false;
        if self.status != Status::Undefined {
            self.status = Status::Uninitialized;
        }
    }

    /// Send a framed message with one vectored write.
    ///
    /// Returns the number of bytes written.
    pub fn send_message(&mut self, message: &Message) -> Result<usize> {
        let segments = message.segments();
        let slices = segments.io_slices();
        self.send_with(|socket, target| match target {
            Some(addr) => socket.send_to_vectored(&slices, addr),
            None => socket.send_vectored(&slices),
        })
    }

    /// Send a raw buffer.
    ///
    /// Returns the number of bytes written.
    pub fn send_data(&mut self, data: &[u8]) -> Result<usize> {
        self.send_with(|socket, target| match target {
            Some(addr) => socket.send_to(data, addr),
            None => socket.send(data),
        })
    }

    fn send_with(
        &mut self,
        write: impl FnOnce(&Socket, Option<&SockAddr>) -> io::Result<usize>,
    ) -> Result<usize> {
        let socket = match (&self.socket, self.status) {
            (Some(socket), Status::Initialized) => socket,
            _ => return Err(Error::Uninitialized { name: self.name.to_string() }),
        };

        if self.roles.is_multicast() {
            let target = self.target_addr_checked()?;
            return write(socket, Some(&target)).map_err(|e| self.io_failure("send", e));
        }

        if !self.connected {
            let target = self.target_addr_checked()?;
            socket.connect(&target).map_err(|e| self.io_failure("connect", e))?;
            self.connected = true;
        }

        let sent = write(socket, None).map_err(|e| self.io_failure("send", e))?;

        if self.socket_type == SocketType::Stream {
            self.recycle();
        }
        Ok(sent)
    }

    /// Close a used stream connection and open a fresh unconnected socket.
    fn recycle(&mut self) {
        self.socket = None;
        self.connected = false;
        match Socket::new(self.domain(), Type::STREAM, None) {
            Ok(socket) => self.socket = Some(socket),
            Err(e) => {
                self.status = Status::SocketError;
                error!(endpoint = %self.name, error = %e, "failed to recreate stream socket");
            },
        }
    }

    /// Receive one framed message into `buffer`.
    ///
    /// # Errors
    ///
    /// - `Uninitialized` or `NotBound` if the endpoint cannot receive
    /// - `Io` for socket failures
    /// - `Protocol` if the received bytes are not a complete message
    pub fn receive_message(&mut self, buffer: &mut MessageBuffer) -> Result<Message> {
        let socket_type = self.socket_type;
        let received = self.with_reader(|reader| read_frame(reader, socket_type, buffer))?;
        Ok(buffer.finish(received)?)
    }

    /// Receive raw bytes into `buf`.
    ///
    /// Returns the number of bytes read.
    pub fn receive_data(&mut self, buf: &mut [u8]) -> Result<usize> {
        let socket_type = self.socket_type;
        self.with_reader(|reader| read_raw(reader, socket_type, buf))
    }

    fn with_reader(&self, read: impl FnOnce(&Socket) -> io::Result<usize>) -> Result<usize> {
        let socket = self.receiving_socket()?;
        if self.roles.is_listen() {
            let (connection, peer) = socket.accept().map_err(|e| self.io_failure("accept", e))?;
            debug!(endpoint = %self.name, peer = ?peer.as_socket(), "accepted connection");
            read(&connection).map_err(|e| self.io_failure("receive", e))
        } else {
            read(socket).map_err(|e| self.io_failure("receive", e))
        }
    }

    /// Wait until data is waiting on the socket.
    ///
    /// `None` waits indefinitely. Returns `false` on timeout.
    pub fn poll_readable(&self, timeout: Option<Duration>) -> Result<bool> {
        let fd = self.poll_fd()?;
        let ready =
            poll::wait_readable(&[fd], timeout).map_err(|e| self.io_failure("poll", e))?;
        Ok(ready.first().copied().unwrap_or(false))
    }

    /// Descriptor to poll for readability.
    pub(crate) fn poll_fd(&self) -> Result<BorrowedFd<'_>> {
        match (&self.socket, self.status) {
            (Some(socket), Status::Initialized) => Ok(socket.as_fd()),
            _ => Err(Error::Uninitialized { name: self.name.to_string() }),
        }
    }

    /// Duplicate the socket for polling from another thread.
    pub(crate) fn try_clone_socket(&self) -> Result<Socket> {
        match (&self.socket, self.status) {
            (Some(socket), Status::Initialized) => {
                socket.try_clone().map_err(|e| self.io_failure("dup", e))
            },
            _ => Err(Error::Uninitialized { name: self.name.to_string() }),
        }
    }

    fn receiving_socket(&self) -> Result<&Socket> {
        let socket = match (&self.socket, self.status) {
            (Some(socket), Status::Initialized) => socket,
            _ => return Err(Error::Uninitialized { name: self.name.to_string() }),
        };
        if !self.roles.is_bind() {
            return Err(Error::NotBound { name: self.name.to_string() });
        }
        Ok(socket)
    }

    fn domain(&self) -> Domain {
        match self.family {
            Family::Local => Domain::UNIX,
            Family::Internet => Domain::IPV4,
        }
    }

    fn sock_type(&self) -> Type {
        match self.socket_type {
            SocketType::Datagram => Type::DGRAM,
            SocketType::Stream => Type::STREAM,
        }
    }

    fn target_addr(&self) -> io::Result<SockAddr> {
        match self.family {
            Family::Local => SockAddr::unix(&self.local_path),
            Family::Internet => self.address.map(SockAddr::from).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "no internet address")
            }),
        }
    }

    fn target_addr_checked(&self) -> Result<SockAddr> {
        if self.family == Family::Internet && self.address.is_none() {
            return Err(Error::MissingAddress { name: self.name.to_string() });
        }
        self.target_addr().map_err(|e| Error::io(self.name.to_string(), e))
    }

    fn io_failure(&self, op: &str, source: io::Error) -> Error {
        warn!(endpoint = %self.name, op, error = %source, "endpoint I/O failed");
        Error::io(self.name.to_string(), source)
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.close();
    }
}

/// Send `message` from an unconnected datagram socket to the internet
/// address inside `destination`.
///
/// Discovery answers requests this way: the destination is the reply
/// endpoint the asker advertised.
pub fn reply_to(
    socket: &Socket,
    destination: &EndpointDescriptor,
    message: &Message,
) -> Result<usize> {
    let addr = destination
        .address
        .ok_or_else(|| Error::MissingAddress { name: destination.name.to_string() })?;
    let segments = message.segments();
    socket
        .send_to_vectored(&segments.io_slices(), &SockAddr::from(addr))
        .map_err(|e| Error::io(destination.name.to_string(), e))
}

fn checked_path(path: PathBuf) -> Result<PathBuf> {
    let len = path.as_os_str().len();
    if len > EndpointDescriptor::MAX_PATH_LEN {
        let max = EndpointDescriptor::MAX_PATH_LEN;
        return Err(ProtocolError::PathTooLong { len, max }.into());
    }
    Ok(path)
}

fn remove_stale(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Scatter one message into `buffer`.
///
/// Datagrams arrive whole in one read. Streams are read until the peer
/// closes or the buffer is full.
fn read_frame(
    mut reader: &Socket,
    socket_type: SocketType,
    buffer: &mut MessageBuffer,
) -> io::Result<usize> {
    let mut slices = buffer.io_slices_mut();
    if socket_type == SocketType::Datagram {
        return reader.read_vectored(&mut slices);
    }

    let mut remaining: &mut [IoSliceMut<'_>] = &mut slices;
    let mut total = 0;
    while !remaining.is_empty() {
        match reader.read_vectored(remaining) {
            Ok(0) => break,
            Ok(n) => {
                total += n;
                IoSliceMut::advance_slices(&mut remaining, n);
            },
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

fn read_raw(mut reader: &Socket, socket_type: SocketType, buf: &mut [u8]) -> io::Result<usize> {
    if socket_type == SocketType::Datagram {
        return reader.read(buf);
    }

    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(dir: &Path, name: &str, roles: RoleFlags) -> Endpoint {
        Endpoint::configure(name, None, 0, Family::Local, SocketType::Datagram, roles)
            .unwrap()
            .with_local_dir(dir)
            .unwrap()
    }

    #[test]
    fn configure_is_pure_data() {
        let endpoint = Endpoint::configure(
            "X",
            Some("127.0.0.1"),
            4000,
            Family::Internet,
            SocketType::Datagram,
            RoleFlags::BIND,
        )
        .unwrap();

        assert_eq!(endpoint.status(), Status::Uninitialized);
        assert_eq!(endpoint.address(), Some(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 4000)));
        assert_eq!(endpoint.local_path(), Path::new("/tmp/p_X"));
        assert!(!endpoint.is_connected());
    }

    #[test]
    fn configure_rejects_bad_input() {
        let long = "n".repeat(40);
        assert!(matches!(
            Endpoint::configure(&long, None, 0, Family::Local, SocketType::Datagram, RoleFlags::BIND),
            Err(Error::Protocol(ProtocolError::NameTooLong { .. }))
        ));
        assert!(matches!(
            Endpoint::configure(
                "X",
                Some("not-an-ip"),
                0,
                Family::Internet,
                SocketType::Datagram,
                RoleFlags::BIND
            ),
            Err(Error::InvalidAddress(_))
        ));

        let deep = format!("/{}", "d".repeat(EndpointDescriptor::MAX_PATH_LEN));
        let endpoint =
            Endpoint::configure("X", None, 0, Family::Local, SocketType::Datagram, RoleFlags::BIND)
                .unwrap();
        assert!(matches!(
            endpoint.with_local_dir(deep),
            Err(Error::Protocol(ProtocolError::PathTooLong { .. }))
        ));
    }

    #[test]
    fn internet_bind_reads_back_port() {
        let mut endpoint = Endpoint::configure(
            "X",
            Some("127.0.0.1"),
            0,
            Family::Internet,
            SocketType::Datagram,
            RoleFlags::BIND,
        )
        .unwrap();
        endpoint.activate().unwrap();

        assert_eq!(endpoint.status(), Status::Initialized);
        let address = endpoint.address().unwrap();
        assert_eq!(*address.ip(), Ipv4Addr::LOCALHOST);
        assert_ne!(address.port(), 0);
    }

    #[test]
    fn missing_address_surfaces_before_activation() {
        let mut endpoint = Endpoint::configure(
            "X",
            None,
            0,
            Family::Internet,
            SocketType::Datagram,
            RoleFlags::CONNECT,
        )
        .unwrap();
        assert!(matches!(endpoint.activate(), Err(Error::MissingAddress { .. })));
        assert_eq!(endpoint.status(), Status::Uninitialized);
    }

    #[test]
    fn connect_failure_records_connect_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut endpoint = local(dir.path(), "nobody", RoleFlags::CONNECT);

        let err = endpoint.activate().unwrap_err();
        assert!(matches!(err, Error::Activation { stage: ActivationStage::Connect, .. }));
        assert_eq!(endpoint.status(), Status::ConnectError);
        assert!(endpoint.poll_fd().is_err());
    }

    #[test]
    fn bind_failure_records_bind_error() {
        let mut endpoint = Endpoint::configure(
            "X",
            Some("192.0.2.1"),
            0,
            Family::Internet,
            SocketType::Datagram,
            RoleFlags::BIND,
        )
        .unwrap();

        let err = endpoint.activate().unwrap_err();
        assert!(matches!(err, Error::Activation { stage: ActivationStage::Bind, .. }));
        assert_eq!(endpoint.status(), Status::BindError);
    }

    #[test]
    fn activate_twice_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut endpoint = local(dir.path(), "twice", RoleFlags::BIND);
        endpoint.activate().unwrap();
        assert!(matches!(
            endpoint.activate(),
            Err(Error::InvalidState { status: Status::Initialized, .. })
        ));
    }

    #[test]
    fn close_is_idempotent_and_removes_socket_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut endpoint = local(dir.path(), "X", RoleFlags::BIND);
        endpoint.activate().unwrap();
        assert!(endpoint.local_path().exists());

        endpoint.close();
        assert_eq!(endpoint.status(), Status::Uninitialized);
        assert!(!endpoint.local_path().exists());

        endpoint.close();
        assert_eq!(endpoint.status(), Status::Uninitialized);
    }

    #[test]
    fn stale_socket_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = local(dir.path(), "X", RoleFlags::BIND);
        first.activate().unwrap();
        // keep the file without the owning socket
        std::mem::forget(first);

        let mut second = local(dir.path(), "X", RoleFlags::BIND);
        second.activate().unwrap();
        assert_eq!(second.status(), Status::Initialized);
    }

    #[test]
    fn send_and_receive_require_initialization() {
        let dir = tempfile::tempdir().unwrap();
        let mut endpoint = local(dir.path(), "X", RoleFlags::BIND);
        assert!(matches!(endpoint.send_data(b"x"), Err(Error::Uninitialized { .. })));

        let mut buffer = MessageBuffer::default();
        assert!(matches!(
            endpoint.receive_message(&mut buffer),
            Err(Error::Uninitialized { .. })
        ));
    }

    #[test]
    fn receive_requires_bind_role() {
        let dir = tempfile::tempdir().unwrap();
        let mut receiver = local(dir.path(), "X", RoleFlags::BIND);
        receiver.activate().unwrap();
        let mut sender = local(dir.path(), "X", RoleFlags::CONNECT);
        sender.activate().unwrap();

        let mut buf = [0u8; 8];
        assert!(matches!(sender.receive_data(&mut buf), Err(Error::NotBound { .. })));
    }

    #[test]
    fn poll_times_out_then_sees_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut receiver = local(dir.path(), "X", RoleFlags::BIND);
        receiver.activate().unwrap();
        assert!(!receiver.poll_readable(Some(Duration::from_millis(10))).unwrap());

        let mut sender = local(dir.path(), "X", RoleFlags::CONNECT);
        sender.activate().unwrap();
        sender.send_data(b"raw").unwrap();

        assert!(receiver.poll_readable(Some(Duration::from_secs(5))).unwrap());
        let mut buf = [0u8; 16];
        let n = receiver.receive_data(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"raw");
    }

    #[test]
    fn descriptor_round_trips_into_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let mut endpoint = local(dir.path(), "X", RoleFlags::BIND);
        endpoint.activate().unwrap();

        let descriptor = endpoint.descriptor();
        assert_eq!(descriptor.status, Status::Initialized);

        let rebuilt = Endpoint::from_descriptor(&descriptor).unwrap();
        assert_eq!(rebuilt.status(), Status::Uninitialized);
        assert_eq!(rebuilt.local_path(), endpoint.local_path());
        assert_eq!(rebuilt.roles(), RoleFlags::BIND);
    }
}
