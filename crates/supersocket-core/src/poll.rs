//! Readiness polling over raw socket descriptors.

use std::{
    io,
    os::fd::BorrowedFd,
    time::{Duration, Instant},
};

use nix::{
    errno::Errno,
    poll::{PollFd, PollFlags, PollTimeout, poll},
};

/// Wait until any descriptor is readable or `timeout` elapses.
///
/// Returns one readiness flag per descriptor, all `false` on timeout. Error
/// and hang-up conditions count as readable so the following read reports
/// them. `None` waits indefinitely. Interrupted waits resume with the
/// remaining time.
pub(crate) fn wait_readable(
    fds: &[BorrowedFd<'_>],
    timeout: Option<Duration>,
) -> io::Result<Vec<bool>> {
    let deadline = timeout.map(|t| Instant::now() + t);

    loop {
        let mut pollfds: Vec<PollFd<'_>> =
            fds.iter().map(|fd| PollFd::new(*fd, PollFlags::POLLIN)).collect();

        let poll_timeout = match deadline {
            None => PollTimeout::NONE,
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                PollTimeout::try_from(remaining).unwrap_or(PollTimeout::MAX)
            },
        };

        match poll(&mut pollfds, poll_timeout) {
            Ok(0) => return Ok(vec![false; fds.len()]),
            Ok(_) => {
                let readable = PollFlags::POLLIN | PollFlags::POLLERR | PollFlags::POLLHUP;
                return Ok(pollfds
                    .iter()
                    .map(|p| p.revents().is_some_and(|r| r.intersects(readable)))
                    .collect());
            },
            Err(Errno::EINTR) => {},
            Err(errno) => return Err(io::Error::from(errno)),
        }
    }
}
