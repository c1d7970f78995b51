use std::fmt;

use flume::{Receiver, Sender, TrySendError};

use crate::{Balance, Shared, SinkError};

/// The number of undelivered notifications kept before new ones are dropped
pub const NOTIFICATION_CAPACITY: usize = 32;

/// A change worth showing to the user
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A sink write failed after previously succeeding
    SinkFailed(SinkError),
    /// A sink write succeeded after previously failing
    SinkRecovered,
    /// The resolved endpoint's display name changed
    EndpointChanged(String),
    /// Auto-panning was turned on or off
    AutoPan(bool),
}

/// The latest known state of the output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Status {
    /// The error from the most recent sink write, if it failed
    pub last_error: Option<SinkError>,
    /// The most recent balance the sink accepted
    pub last_applied: Option<Balance>,
    /// The display name of the resolved endpoint
    pub endpoint_name: Option<String>,
    /// The number of consecutive failed writes
    pub failure_streak: u32,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = self.endpoint_name.as_deref().unwrap_or(crate::UNKNOWN_ENDPOINT);
        match (&self.last_error, self.last_applied) {
            (Some(e), _) => write!(f, "{name}: {e} ({} failed writes)", self.failure_streak),
            (None, Some(b)) => write!(f, "{name}: {b}"),
            (None, None) => write!(f, "{name}: idle"),
        }
    }
}

/**
Collects sink results into a [`Status`] and announces changes as [`Notification`]s

Cloning yields another handle to the same board.
*/
#[derive(Debug, Clone)]
pub struct StatusBoard {
    status: Shared<Status>,
    send: Sender<Notification>,
    recv: Receiver<Notification>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        let (send, recv) = flume::bounded(NOTIFICATION_CAPACITY);
        StatusBoard {
            status: Shared::default(),
            send,
            recv,
        }
    }
}

impl StatusBoard {
    /// Create a new empty board
    pub fn new() -> Self {
        Self::default()
    }
    /// Get a copy of the current status
    pub fn status(&self) -> Status {
        self.status.cloned()
    }
    /// Get a receiver for notifications
    ///
    /// All receivers share one queue, so each notification is delivered to only one of them.
    pub fn notifications(&self) -> Receiver<Notification> {
        self.recv.clone()
    }
    /// Record a successful write
    ///
    /// Returns `true` if this ended a failure streak.
    pub fn record_success(&self, balance: Balance) -> bool {
        let recovered = self.status.update(|s| {
            s.last_applied = Some(balance);
            s.failure_streak = 0;
            s.last_error.take().is_some()
        });
        if recovered {
            self.notify(Notification::SinkRecovered);
        }
        recovered
    }
    /// Record a failed write
    ///
    /// Returns `true` if this started a failure streak or changed the kind of failure.
    pub fn record_failure(&self, error: &SinkError) -> bool {
        let fresh = self.status.update(|s| {
            s.failure_streak = s.failure_streak.saturating_add(1);
            let fresh = s.last_error.as_ref() != Some(error);
            s.last_error = Some(error.clone());
            fresh
        });
        if fresh {
            self.notify(Notification::SinkFailed(error.clone()));
        }
        fresh
    }
    /// Record the endpoint's display name
    pub fn set_endpoint_name(&self, name: &str) {
        let changed = self.status.update(|s| {
            if s.endpoint_name.as_deref() == Some(name) {
                false
            } else {
                s.endpoint_name = Some(name.into());
                true
            }
        });
        if changed {
            self.notify(Notification::EndpointChanged(name.into()));
        }
    }
    /// Send a notification, dropping it if nobody is keeping up
    pub fn notify(&self, notification: Notification) {
        if let Err(TrySendError::Full(n)) = self.send.try_send(notification) {
            log::debug!("Notification queue full, dropping {n:?}");
        }
    }
}
