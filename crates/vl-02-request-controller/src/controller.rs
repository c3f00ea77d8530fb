//! Pending request table.
//!
//! Maps correlation ids to the handler waiting for a reply. Completion and
//! expiry both go through a single atomic removal, so for any id exactly one
//! of `complete` or `sweep` returns the handler.

use crate::error::{ControllerError, ControllerResult};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shared_types::CorrelationId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Receipt for a registered request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub correlation_id: CorrelationId,
    /// Absolute expiry time.
    pub deadline: Instant,
    pub timeout: Duration,
}

struct PendingEntry<H> {
    handler: H,
    registered_at: Instant,
    deadline: Instant,
}

/// Statistics for the request controller
#[derive(Debug, Default)]
pub struct ControllerStats {
    /// Total requests registered
    pub total_registered: AtomicU64,
    /// Total requests completed by a reply
    pub total_completed: AtomicU64,
    /// Total requests reclaimed by `sweep`
    pub total_timeouts: AtomicU64,
    /// Total requests cancelled or drained
    pub total_cancelled: AtomicU64,
    /// Total `add` calls rejected for a duplicate id
    pub total_rejected: AtomicU64,
}

impl ControllerStats {
    /// Requests currently accounted as in flight.
    pub fn in_flight(&self) -> u64 {
        let closed = self.total_completed.load(Ordering::Relaxed)
            + self.total_timeouts.load(Ordering::Relaxed)
            + self.total_cancelled.load(Ordering::Relaxed);
        self.total_registered
            .load(Ordering::Relaxed)
            .saturating_sub(closed)
    }
}

/// In-flight outbound requests indexed by correlation id.
///
/// Flow:
/// 1. A command that expects a reply calls `add()` with its own timeout
/// 2. The reply's observer calls `complete()` and proceeds only on `Some`
/// 3. The sweeper calls `sweep()` and fails whatever expired
pub struct RequestController<H> {
    pending: DashMap<CorrelationId, PendingEntry<H>>,
    stats: ControllerStats,
}

impl<H> Default for RequestController<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RequestController<H> {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            stats: ControllerStats::default(),
        }
    }

    /// Register a pending request expiring `timeout` from now.
    ///
    /// Fails if `correlation_id` is already pending.
    pub fn add(
        &self,
        correlation_id: CorrelationId,
        handler: H,
        timeout: Duration,
    ) -> ControllerResult<Ticket> {
        let registered_at = Instant::now();
        let deadline = registered_at
            .checked_add(timeout)
            .ok_or(ControllerError::InvalidTimeout(timeout))?;

        match self.pending.entry(correlation_id) {
            Entry::Occupied(_) => {
                self.stats.total_rejected.fetch_add(1, Ordering::Relaxed);
                warn!(
                    correlation_id = %correlation_id,
                    "Rejected duplicate correlation id"
                );
                Err(ControllerError::DuplicateCorrelationId(correlation_id))
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingEntry {
                    handler,
                    registered_at,
                    deadline,
                });
                self.stats.total_registered.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    timeout_ms = timeout.as_millis(),
                    "Registered pending request"
                );
                Ok(Ticket {
                    correlation_id,
                    deadline,
                    timeout,
                })
            }
        }
    }

    /// Remove and return the handler for `correlation_id`.
    ///
    /// `None` means the id already completed, timed out or was never
    /// registered. Callers treat it as a no-op.
    pub fn complete(&self, correlation_id: CorrelationId) -> Option<H> {
        match self.pending.remove(&correlation_id) {
            Some((_, entry)) => {
                self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    response_time_ms = entry.registered_at.elapsed().as_millis(),
                    "Completed pending request"
                );
                Some(entry.handler)
            }
            None => {
                debug!(
                    correlation_id = %correlation_id,
                    "Completion for unknown or expired correlation id"
                );
                None
            }
        }
    }

    /// Remove every entry whose deadline is at or before `now`.
    ///
    /// Order of the returned entries is unspecified.
    pub fn sweep(&self, now: Instant) -> Vec<(CorrelationId, H)> {
        let candidates: Vec<CorrelationId> = self
            .pending
            .iter()
            .filter(|entry| entry.deadline <= now)
            .map(|entry| *entry.key())
            .collect();

        let mut expired = Vec::with_capacity(candidates.len());
        for id in candidates {
            // A concurrent complete() may have won; remove_if sees absence.
            if let Some((id, entry)) = self.pending.remove_if(&id, |_, e| e.deadline <= now) {
                warn!(
                    correlation_id = %id,
                    elapsed_ms = now.saturating_duration_since(entry.registered_at).as_millis(),
                    "Pending request timed out"
                );
                self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
                expired.push((id, entry.handler));
            }
        }
        expired
    }

    /// Remove a pending request without completing it.
    ///
    /// Used to roll back an `add` whose paired subscription failed.
    pub fn cancel(&self, correlation_id: CorrelationId) -> Option<H> {
        let (_, entry) = self.pending.remove(&correlation_id)?;
        self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
        debug!(correlation_id = %correlation_id, "Cancelled pending request");
        Some(entry.handler)
    }

    /// Remove every entry matching `predicate`.
    pub fn remove_matching<F>(&self, predicate: F) -> Vec<(CorrelationId, H)>
    where
        F: Fn(&CorrelationId, &H) -> bool,
    {
        let candidates: Vec<CorrelationId> = self
            .pending
            .iter()
            .filter(|entry| predicate(entry.key(), &entry.handler))
            .map(|entry| *entry.key())
            .collect();

        let removed: Vec<(CorrelationId, H)> = candidates
            .into_iter()
            .filter_map(|id| self.pending.remove(&id))
            .map(|(id, entry)| (id, entry.handler))
            .collect();

        self.stats
            .total_cancelled
            .fetch_add(removed.len() as u64, Ordering::Relaxed);
        removed
    }

    /// Remove every pending entry.
    pub fn drain(&self) -> Vec<(CorrelationId, H)> {
        self.remove_matching(|_, _| true)
    }

    pub fn is_pending(&self, correlation_id: CorrelationId) -> bool {
        self.pending.contains_key(&correlation_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Earliest deadline among pending entries.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|entry| entry.deadline).min()
    }

    pub fn stats(&self) -> &ControllerStats {
        &self.stats
    }
}
