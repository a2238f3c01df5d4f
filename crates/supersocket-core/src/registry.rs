//! Endpoint registry.
//!
//! A [`Registry`] owns an ordered set of endpoints under one process name.
//! Indices are assigned at insertion and never change meaning. Two index
//! lists are maintained alongside the table:
//!
//! - `bound`: endpoints with the bind role, in receive rotation order
//! - `connected`: endpoints with the connect role, the broadcast fan-out set
//!
//! # Concurrency
//!
//! The table sits behind an `RwLock`. Insertion holds the write lock for the
//! whole append so readers never observe a half-grown table. Send, receive
//! and poll only hold the read lock long enough to snapshot the entries they
//! need, then work outside it. Each endpoint has its own `Mutex`; bound
//! entries also keep a duplicated socket used only for polling, so a poll
//! never waits on an endpoint lock. [`Registry::close`] drops the duplicate
//! together with the endpoint's socket, so a closed endpoint stops receiving.

use std::{
    os::fd::{AsFd, BorrowedFd},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use socket2::Socket;
use supersocket_proto::{
    EndpointDescriptor, Family, Message, MessageBuffer, Name, RoleFlags, SocketType,
};
use tracing::{debug, info, warn};

use crate::{
    config::DEFAULT_LOCAL_DIR,
    endpoint::Endpoint,
    error::{Error, Result},
    poll,
};

#[derive(Debug)]
struct Slot {
    endpoint: Mutex<Endpoint>,
    /// Snapshot taken right after activation
    descriptor: EndpointDescriptor,
    /// Duplicate of a bound endpoint's socket, for polling. `None` once
    /// closed.
    poll_socket: Mutex<Option<Arc<Socket>>>,
}

impl Slot {
    fn lock(&self) -> MutexGuard<'_, Endpoint> {
        self.endpoint.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn poll_socket(&self) -> Option<Arc<Socket>> {
        self.poll_socket.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn close(&self) {
        self.poll_socket.lock().unwrap_or_else(PoisonError::into_inner).take();
        self.lock().close();
    }
}

/// Bound entry captured for one poll.
type Polled = (usize, Arc<Slot>, Arc<Socket>);

#[derive(Debug, Default)]
struct Table {
    slots: Vec<Arc<Slot>>,
    bound: Vec<usize>,
    connected: Vec<usize>,
}

/// An ordered set of endpoints owned by one process name.
#[derive(Debug)]
pub struct Registry {
    name: Name,
    local_dir: PathBuf,
    table: RwLock<Table>,
}

impl Registry {
    /// Empty registry with local sockets under `/tmp`.
    pub fn new(name: &str) -> Result<Self> {
        Self::with_local_dir(name, DEFAULT_LOCAL_DIR)
    }

    /// Empty registry with local sockets under `dir`.
    pub fn with_local_dir(name: &str, dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            name: Name::new(name)?,
            local_dir: dir.as_ref().to_path_buf(),
            table: RwLock::new(Table::default()),
        })
    }

    /// Registry with the default endpoint pair, see
    /// [`Registry::add_default_endpoints`].
    pub fn initialize(name: &str, address: &str, port: u16) -> Result<Self> {
        let registry = Self::new(name)?;
        registry.add_default_endpoints(address, port)?;
        Ok(registry)
    }

    /// Add an internet datagram endpoint bound to `address:port` and a local
    /// datagram endpoint, both bound and named after the registry.
    pub fn add_default_endpoints(&self, address: &str, port: u16) -> Result<()> {
        let name = self.name.as_str()?.to_owned();
        self.add_endpoint(
            &name,
            Some(address),
            port,
            Family::Internet,
            SocketType::Datagram,
            RoleFlags::BIND,
        )?;
        self.add_endpoint(
            &name,
            Some(address),
            port,
            Family::Local,
            SocketType::Datagram,
            RoleFlags::BIND,
        )?;
        Ok(())
    }

    /// Registry name, used as sender name by discovery.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Directory holding this registry's local socket files.
    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    /// Configure, activate and insert an endpoint.
    ///
    /// Returns the new index. On failure the registry is unchanged.
    pub fn add_endpoint(
        &self,
        name: &str,
        address: Option<&str>,
        port: u16,
        family: Family,
        socket_type: SocketType,
        roles: RoleFlags,
    ) -> Result<usize> {
        let endpoint = Endpoint::configure(name, address, port, family, socket_type, roles)?
            .with_local_dir(&self.local_dir)?;
        self.add_prepared_endpoint(endpoint)
    }

    /// Activate and insert a configured endpoint.
    ///
    /// Returns the new index. On failure the registry is unchanged and the
    /// endpoint is dropped.
    pub fn add_prepared_endpoint(&self, mut endpoint: Endpoint) -> Result<usize> {
        endpoint.activate()?;

        let roles = endpoint.roles();
        let poll_socket =
            if roles.is_bind() { Some(Arc::new(endpoint.try_clone_socket()?)) } else { None };
        let descriptor = endpoint.descriptor();
        let slot = Arc::new(Slot {
            endpoint: Mutex::new(endpoint),
            descriptor,
            poll_socket: Mutex::new(poll_socket),
        });

        let mut table = self.write();
        let index = table.slots.len();
        if roles.is_bind() {
            table.bound.push(index);
        }
        if roles.is_connect() {
            table.connected.push(index);
        }
        info!(registry = %self.name, index, endpoint = %slot.descriptor, "endpoint added");
        table.slots.push(slot);
        Ok(index)
    }

    /// Number of endpoints.
    pub fn len(&self) -> usize {
        self.read().slots.len()
    }

    /// True if no endpoint was added.
    pub fn is_empty(&self) -> bool {
        self.read().slots.is_empty()
    }

    /// Bound indices in receive rotation order.
    pub fn bound_indices(&self) -> Vec<usize> {
        self.read().bound.clone()
    }

    /// Connected indices in insertion order.
    pub fn connected_indices(&self) -> Vec<usize> {
        self.read().connected.clone()
    }

    /// Descriptor of the endpoint at `index`, as recorded at insertion.
    pub fn descriptor(&self, index: usize) -> Option<EndpointDescriptor> {
        self.read().slots.get(index).map(|slot| slot.descriptor.clone())
    }

    /// Descriptors of every endpoint in index order.
    pub fn descriptors(&self) -> Vec<EndpointDescriptor> {
        self.read().slots.iter().map(|slot| slot.descriptor.clone()).collect()
    }

    /// First bound internet endpoint called `name`.
    pub fn find_bound_internet(&self, name: &Name) -> Option<EndpointDescriptor> {
        let table = self.read();
        table
            .bound
            .iter()
            .map(|&index| &table.slots[index].descriptor)
            .find(|d| d.family == Family::Internet && d.name.as_bytes() == name.as_bytes())
            .cloned()
    }

    /// Log every endpoint at info level.
    pub fn log_summary(&self) {
        let table = self.read();
        info!(
            registry = %self.name,
            endpoints = table.slots.len(),
            bound = ?table.bound,
            connected = ?table.connected,
            "registry summary"
        );
        for (index, slot) in table.slots.iter().enumerate() {
            info!(registry = %self.name, index, endpoint = %slot.descriptor);
        }
    }

    /// Send raw bytes through the endpoint at `target`.
    pub fn send_data(&self, target: usize, data: &[u8]) -> Result<usize> {
        self.slot(target)?.lock().send_data(data)
    }

    /// Send a framed message through the endpoint at `target`.
    pub fn send_message(&self, target: usize, message: &Message) -> Result<usize> {
        self.slot(target)?.lock().send_message(message)
    }

    /// Send raw bytes through every connected endpoint.
    ///
    /// Failures are logged and skipped. Returns the number of successful
    /// sends.
    pub fn broadcast_data(&self, data: &[u8]) -> usize {
        self.fan_out(|endpoint| endpoint.send_data(data))
    }

    /// Send a framed message through every connected endpoint.
    ///
    /// Failures are logged and skipped. Returns the number of successful
    /// sends.
    pub fn broadcast_message(&self, message: &Message) -> usize {
        self.fan_out(|endpoint| endpoint.send_message(message))
    }

    fn fan_out(&self, mut send: impl FnMut(&mut Endpoint) -> Result<usize>) -> usize {
        let targets: Vec<(usize, Arc<Slot>)> = {
            let table = self.read();
            table.connected.iter().map(|&i| (i, Arc::clone(&table.slots[i]))).collect()
        };

        let mut delivered = 0;
        for (index, slot) in targets {
            match send(&mut slot.lock()) {
                Ok(_) => delivered += 1,
                Err(e) => warn!(registry = %self.name, index, error = %e, "broadcast send failed"),
            }
        }
        delivered
    }

    /// Poll every open bound endpoint once.
    ///
    /// Returns how many are readable; zero on timeout. `None` waits
    /// indefinitely. Closed endpoints are skipped; with none left this fails
    /// with [`Error::NoBoundEndpoints`].
    pub fn poll_bound(&self, timeout: Option<Duration>) -> Result<usize> {
        let bound = self.bound_snapshot()?;
        let ready = self.wait(&bound, timeout)?;
        Ok(ready.iter().filter(|&&r| r).count())
    }

    /// Receive one framed message from the next ready bound endpoint.
    ///
    /// Waits indefinitely. The serviced endpoint moves to the back of the
    /// rotation so busy endpoints cannot starve the others.
    pub fn receive_message(&self, buffer: &mut MessageBuffer) -> Result<Message> {
        let (index, slot) = self.next_ready()?;
        let message = slot.lock().receive_message(buffer)?;
        self.rotate(index);
        Ok(message)
    }

    /// Receive raw bytes from the next ready bound endpoint.
    ///
    /// Same rotation as [`Registry::receive_message`].
    pub fn receive_data(&self, buf: &mut [u8]) -> Result<usize> {
        let (index, slot) = self.next_ready()?;
        let n = slot.lock().receive_data(buf)?;
        self.rotate(index);
        Ok(n)
    }

    fn next_ready(&self) -> Result<(usize, Arc<Slot>)> {
        let bound = self.bound_snapshot()?;
        let ready = self.wait(&bound, None)?;
        bound
            .into_iter()
            .zip(ready)
            .find_map(|((index, slot, _), ready)| ready.then_some((index, slot)))
            .ok_or(Error::NoReadyEndpoint)
    }

    /// Open bound entries in rotation order.
    fn bound_snapshot(&self) -> Result<Vec<Polled>> {
        let bound: Vec<Polled> = {
            let table = self.read();
            table
                .bound
                .iter()
                .filter_map(|&i| {
                    let slot = Arc::clone(&table.slots[i]);
                    slot.poll_socket().map(|socket| (i, slot, socket))
                })
                .collect()
        };
        if bound.is_empty() {
            return Err(Error::NoBoundEndpoints);
        }
        Ok(bound)
    }

    fn wait(&self, bound: &[Polled], timeout: Option<Duration>) -> Result<Vec<bool>> {
        let fds: Vec<BorrowedFd<'_>> = bound.iter().map(|(_, _, socket)| socket.as_fd()).collect();
        poll::wait_readable(&fds, timeout).map_err(|e| {
            warn!(registry = %self.name, error = %e, "poll failed");
            Error::io(self.name.to_string(), e)
        })
    }

    fn rotate(&self, index: usize) {
        let mut table = self.write();
        if let Some(pos) = table.bound.iter().position(|&i| i == index) {
            let serviced = table.bound.remove(pos);
            table.bound.push(serviced);
        }
    }

    fn slot(&self, target: usize) -> Result<Arc<Slot>> {
        let table = self.read();
        table
            .slots
            .get(target)
            .cloned()
            .ok_or(Error::TargetOutOfRange { target, count: table.slots.len() })
    }

    /// Close every endpoint.
    ///
    /// Indices stay valid; the endpoints are `Uninitialized` afterwards and
    /// their sockets are released, including the polling duplicates. A poll
    /// already in flight holds its duplicate until it returns.
    pub fn close(&self) {
        let slots: Vec<Arc<Slot>> = self.read().slots.clone();
        for slot in &slots {
            slot.close();
        }
        debug!(registry = %self.name, endpoints = slots.len(), "registry closed");
    }

    fn read(&self) -> RwLockReadGuard<'_, Table> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Table> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }
}
