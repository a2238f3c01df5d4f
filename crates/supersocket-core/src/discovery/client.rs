//! Discovery asker.

use std::{
    path::Path,
    time::{Duration, Instant},
};

use supersocket_proto::{
    DiscoveryMessage, EndpointDescriptor, Family, MessageBuffer, RoleFlags, SocketType,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::{
    config::DiscoveryConfig,
    endpoint::Endpoint,
    error::{Error, Result},
    registry::Registry,
};

/// Find the process owning `target` and add a connected endpoint for it.
///
/// Multicasts a lookup request every poll interval until a reply names
/// `target`. The local transport is preferred when the reply's socket path
/// exists on this host. Returns the index of the new endpoint.
///
/// # Errors
///
/// - `Cancelled` once `cancel` fires
/// - `DiscoveryExhausted` when `max_attempts` or `deadline` runs out
/// - setup and insertion errors
pub fn discover(
    registry: &Registry,
    target: &str,
    config: &DiscoveryConfig,
    cancel: &CancellationToken,
) -> Result<usize> {
    let group = config.group;
    let group_ip = group.ip().to_string();

    let mut sender = Endpoint::configure(
        target,
        Some(&group_ip),
        group.port(),
        Family::Internet,
        SocketType::Datagram,
        RoleFlags::CONNECT | RoleFlags::MULTICAST,
    )?;
    sender.activate()?;

    let mut replies = Endpoint::configure(
        target,
        Some(&group_ip),
        0,
        Family::Internet,
        SocketType::Datagram,
        RoleFlags::BIND | RoleFlags::MULTICAST,
    )?;
    replies.activate()?;

    let request =
        DiscoveryMessage::LookupRequest(replies.descriptor()).into_message(*registry.name())?;
    let mut buffer = MessageBuffer::with_capacity(config.asker_buffer);

    let started = Instant::now();
    let deadline = config.deadline.map(|d| started + d);
    let mut attempts = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled { target: target.to_owned() });
        }
        let out_of_attempts = config.max_attempts.is_some_and(|max| attempts >= max);
        let out_of_time = deadline.is_some_and(|d| Instant::now() >= d);
        if out_of_attempts || out_of_time {
            warn!(peer = target, attempts, "discovery gave up");
            return Err(Error::DiscoveryExhausted { target: target.to_owned(), attempts });
        }

        attempts += 1;
        debug!(
            registry = %registry.name(),
            peer = target,
            attempt = attempts,
            "sending lookup request"
        );
        if let Err(e) = sender.send_message(&request) {
            warn!(peer = target, error = %e, "lookup request send failed");
        }

        let window_end = {
            let end = Instant::now() + config.poll_interval;
            deadline.map_or(end, |d| end.min(d))
        };

        while let Some(remaining) = remaining_until(window_end) {
            if cancel.is_cancelled() {
                break;
            }
            if !replies.poll_readable(Some(remaining))? {
                break;
            }
            let message = match replies.receive_message(&mut buffer) {
                Ok(message) => message,
                Err(e) => {
                    debug!(error = %e, "dropping unreadable reply");
                    continue;
                },
            };
            match DiscoveryMessage::parse(&message) {
                Ok(Some(DiscoveryMessage::LookupReply(found))) if found.name.matches(target) => {
                    return adopt(registry, &found, attempts, started.elapsed());
                },
                Ok(_) => trace!(kind = message.kind(), "ignoring unrelated reply"),
                Err(e) => debug!(error = %e, "ignoring malformed reply"),
            }
        }
    }
}

fn remaining_until(end: Instant) -> Option<Duration> {
    let remaining = end.saturating_duration_since(Instant::now());
    (!remaining.is_zero()).then_some(remaining)
}

fn adopt(
    registry: &Registry,
    found: &EndpointDescriptor,
    attempts: u32,
    elapsed: Duration,
) -> Result<usize> {
    let local = found.local_path.as_deref().is_some_and(|path| Path::new(path).exists());
    let family = if local { Family::Local } else { Family::Internet };

    let endpoint = Endpoint::from_descriptor(found)?
        .with_family(family)
        .with_roles(RoleFlags::CONNECT);
    let index = registry.add_prepared_endpoint(endpoint)?;

    info!(
        registry = %registry.name(),
        peer = %found.name,
        %family,
        index,
        attempts,
        elapsed_ms = elapsed.as_millis(),
        "peer discovered"
    );
    Ok(index)
}
