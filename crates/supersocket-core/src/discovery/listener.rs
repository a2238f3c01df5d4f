//! Discovery listener thread.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use socket2::{Domain, Socket, Type};
use supersocket_proto::{DiscoveryMessage, Family, Message, MessageBuffer, RoleFlags, SocketType};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::{
    config::DiscoveryConfig,
    endpoint::{Endpoint, reply_to},
    error::{Error, Result},
    registry::Registry,
};

/// Running listener. Dropping it cancels the loop and joins the thread.
#[derive(Debug)]
pub struct ListenerHandle {
    cancel: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// Token that stops the listener when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel and wait for the thread to exit.
    ///
    /// The thread notices within one poll interval.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            error!("discovery listener panicked");
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Make `registry` discoverable.
///
/// Binds a multicast endpoint on the discovery group and answers lookup
/// requests for names of bound internet endpoints in the registry. Sockets
/// are acquired before the thread starts, so setup failures are returned
/// here. `cancel` stops the loop; a child token is used so cancelling the
/// handle leaves the caller's token alone.
pub fn spawn_listener(
    registry: Arc<Registry>,
    config: &DiscoveryConfig,
    cancel: &CancellationToken,
) -> Result<ListenerHandle> {
    let group = config.group;
    let mut endpoint = Endpoint::configure(
        registry.name().as_str()?,
        Some(&group.ip().to_string()),
        group.port(),
        Family::Internet,
        SocketType::Datagram,
        RoleFlags::BIND | RoleFlags::MULTICAST,
    )?;
    endpoint.activate()?;

    let reply_socket = Socket::new(Domain::IPV4, Type::DGRAM, None)
        .and_then(|s| s.set_multicast_loop_v4(true).map(|()| s))
        .map_err(|e| Error::io(registry.name().to_string(), e))?;

    let cancel = cancel.child_token();
    let loop_cancel = cancel.clone();
    let buffer = MessageBuffer::with_capacity(config.listener_buffer);
    let interval = config.poll_interval;

    let thread = thread::Builder::new()
        .name(format!("discovery-{}", registry.name()))
        .spawn(move || {
            info!(registry = %registry.name(), %group, "discovery listener started");
            let mut listener = Listener { registry, endpoint, reply_socket, buffer };
            while !loop_cancel.is_cancelled() {
                match listener.endpoint.poll_readable(Some(interval)) {
                    Ok(true) => listener.service(),
                    Ok(false) => {},
                    Err(e) => {
                        error!(error = %e, "discovery listener poll failed, stopping");
                        break;
                    },
                }
            }
            info!(registry = %listener.registry.name(), "discovery listener stopped");
        })
        .map_err(|e| Error::io(group.to_string(), e))?;

    Ok(ListenerHandle { cancel, thread: Some(thread) })
}

struct Listener {
    registry: Arc<Registry>,
    endpoint: Endpoint,
    reply_socket: Socket,
    buffer: MessageBuffer,
}

impl Listener {
    fn service(&mut self) {
        let message = match self.endpoint.receive_message(&mut self.buffer) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "dropping unreadable discovery datagram");
                return;
            },
        };

        let request = match DiscoveryMessage::parse(&message) {
            Ok(Some(DiscoveryMessage::LookupRequest(request))) => request,
            Ok(_) => {
                trace!(kind = message.kind(), sender = %message.sender(), "ignoring non-request");
                return;
            },
            Err(e) => {
                debug!(sender = %message.sender(), error = %e, "ignoring malformed request");
                return;
            },
        };

        let Some(found) = self.registry.find_bound_internet(&request.name) else {
            trace!(sought = %request.name, "no matching endpoint");
            return;
        };

        debug!(
            sought = %request.name,
            asker = %message.sender(),
            reply_to = ?request.address,
            "answering lookup"
        );
        let reply: Result<Message> = DiscoveryMessage::LookupReply(found)
            .into_message(request.name)
            .map_err(Error::from);
        if let Err(e) = reply.and_then(|reply| reply_to(&self.reply_socket, &request, &reply)) {
            warn!(sought = %request.name, error = %e, "failed to send lookup reply");
        }
    }
}
