use crate::guide::error::{CancelReason, GuideError, GuideResult};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::info;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Handle a run holds on its own tracker entry.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    key: String,
    cancelled: Arc<AtomicBool>,
    superseded_previous: bool,
    created_at: DateTime<Utc>,
}

impl RequestTicket {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether registering this ticket cancelled an older run on the same key.
    pub fn superseded_previous(&self) -> bool {
        self.superseded_previous
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Tracks in-flight guide runs so that only the newest run per key finishes.
///
/// Cancellation is cooperative: setting a flag never interrupts a run, it
/// only makes that run's next [`RequestTracker::check_cancelled`] fail.
#[derive(Default)]
pub struct RequestTracker {
    active: DashMap<String, Arc<AtomicBool>>,
    shutting_down: AtomicBool,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a run for `key`, flagging any run already registered under it.
    pub fn start(&self, key: &str) -> RequestTicket {
        let cancelled = Arc::new(AtomicBool::new(false));
        let previous = self.active.insert(key.to_string(), Arc::clone(&cancelled));

        let superseded_previous = match previous {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                info!("Superseded previous request: {}", key);
                true
            }
            None => false,
        };

        info!("Started request: {}", key);
        RequestTicket {
            key: key.to_string(),
            cancelled,
            superseded_previous,
            created_at: Utc::now(),
        }
    }

    /// Drops the ticket's entry whatever its flag says. A newer run's entry
    /// under the same key is left alone.
    pub fn end(&self, ticket: &RequestTicket) {
        let removed = self
            .active
            .remove_if(&ticket.key, |_, flag| Arc::ptr_eq(flag, &ticket.cancelled))
            .is_some();
        if removed {
            info!("Ended request: {}", ticket.key);
        }
    }

    /// Flags the run currently registered under `key` without untracking it.
    /// Returns false when nothing was running.
    pub fn mark_externally_cancelled(&self, key: &str) -> bool {
        match self.active.get(key) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                info!("Client cancelled request: {}", key);
                true
            }
            None => false,
        }
    }

    /// Checkpoint consulted between pipeline stages.
    pub fn check_cancelled(&self, ticket: &RequestTicket) -> GuideResult<()> {
        if self.shutting_down.load(Ordering::SeqCst) {
            info!("Cancelling {}: shutting down", ticket.key);
            return Err(GuideError::Cancelled(CancelReason::ShuttingDown));
        }

        // The ticket's own flag outlives its map entry
        let reason = if ticket.is_cancelled() {
            Some(CancelReason::Superseded)
        } else {
            match self.active.get(&ticket.key) {
                None => Some(CancelReason::NotTracked),
                Some(flag) if !Arc::ptr_eq(flag.value(), &ticket.cancelled) => Some(CancelReason::Superseded),
                Some(_) => None,
            }
        };

        match reason {
            Some(reason) => {
                info!("Request cancelled: {} ({})", ticket.key, reason);
                Err(GuideError::Cancelled(reason))
            }
            None => Ok(()),
        }
    }

    pub fn shutdown(&self) {
        if !self.shutting_down.swap(true, Ordering::SeqCst) {
            info!("Request tracker shutting down with {} active request(s)", self.active_count());
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}
