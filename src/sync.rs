//! Periodic exchange of draw commands with a sync transport.
//!
//! No network transport exists yet; [`LogTransport`] stands in for one. It only reports what it
//! would send and never receives anything.

use std::time::{Duration, Instant};

use crate::{
    command::{CommandColumns, DrawCommand},
    session::Session,
};

/// A change made by a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remote {
    Draw(DrawCommand),
    Clear,
}

/// Something that can exchange commands with peers.
pub trait Transport {
    /// Delivers `batch`. Returning an error leaves the commands pending for the next attempt.
    fn ship(&mut self, batch: &CommandColumns) -> anyhow::Result<()>;

    /// Takes everything received from peers since the last call, oldest first.
    fn receive(&mut self) -> Vec<Remote>;
}

#[derive(Debug, Default)]
pub struct LogTransport {
    shipped: usize,
}

impl Transport for LogTransport {
    fn ship(&mut self, batch: &CommandColumns) -> anyhow::Result<()> {
        self.shipped += batch.len();
        log::debug!(
            "would send {} draw commands ({} total)",
            batch.len(),
            self.shipped
        );
        Ok(())
    }

    fn receive(&mut self) -> Vec<Remote> {
        Vec::new()
    }
}

/// Result of one [`Outbox::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Polled {
    /// Local commands delivered to the transport.
    pub sent: usize,
    /// Remote changes applied to the session.
    pub received: usize,
}

/// Exchanges a [`Session`]'s commands with a [`Transport`] at a fixed interval.
pub struct Outbox<T> {
    transport: T,
    interval: Duration,
    next_flush: Instant,
}

impl<T: Transport> Outbox<T> {
    pub fn new(transport: T, interval: Duration, now: Instant) -> Self {
        Self {
            transport,
            interval,
            next_flush: now + interval,
        }
    }

    /// The time the next exchange is due.
    pub fn deadline(&self) -> Instant {
        self.next_flush
    }

    /// If the deadline has passed, applies everything received to `session`, flushes its pending
    /// commands, and schedules the next exchange.
    pub fn poll(&mut self, now: Instant, session: &mut Session) -> Polled {
        if now < self.next_flush {
            return Polled::default();
        }
        self.next_flush = now + self.interval;

        let inbound = self.transport.receive();
        let received = inbound.len();
        if received > 0 {
            log::debug!("applying {received} remote changes");
        }
        for remote in inbound {
            session.apply_remote(remote);
        }

        let transport = &mut self.transport;
        let log = session.log_mut();
        let flushed = log.flush(|pending| transport.ship(&CommandColumns::from_commands(pending)));
        let sent = match flushed {
            Ok(n) => n,
            Err(e) => {
                log::warn!("failed to send {} draw commands: {e}", log.pending_count());
                0
            }
        };
        Polled { sent, received }
    }
}
