use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Delivery counters shared by every request handler of one service.
#[derive(Debug, Default)]
pub struct DeliveryMetrics {
    polls: AtomicU64,
    empty_polls: AtomicU64,
    blocks_delivered: AtomicU64,
    blocks_acknowledged: AtomicU64,
    jobs_enqueued: AtomicU64,
    blocks_enqueued: AtomicU64,
    blocks_cleared: AtomicU64,
    poll_wait_total_ms: AtomicU64,
    poll_wait_max_ms: AtomicU64,
}

impl DeliveryMetrics {
    #[inline]
    pub(crate) fn record_poll(&self, delivered: bool, waited: Duration) {
        self.polls.fetch_add(1, Ordering::Relaxed);
        if delivered {
            self.blocks_delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.empty_polls.fetch_add(1, Ordering::Relaxed);
        }

        let millis = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX);
        self.poll_wait_total_ms.fetch_add(millis, Ordering::Relaxed);
        update_max(&self.poll_wait_max_ms, millis);
    }

    #[inline]
    pub(crate) fn record_acknowledged(&self, blocks: usize) {
        self.blocks_acknowledged
            .fetch_add(blocks as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_job(&self, blocks: usize) {
        self.jobs_enqueued.fetch_add(1, Ordering::Relaxed);
        self.blocks_enqueued
            .fetch_add(blocks as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_cleared(&self, blocks: usize) {
        self.blocks_cleared.fetch_add(blocks as u64, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            polls: self.polls.load(Ordering::Relaxed),
            empty_polls: self.empty_polls.load(Ordering::Relaxed),
            blocks_delivered: self.blocks_delivered.load(Ordering::Relaxed),
            blocks_acknowledged: self.blocks_acknowledged.load(Ordering::Relaxed),
            jobs_enqueued: self.jobs_enqueued.load(Ordering::Relaxed),
            blocks_enqueued: self.blocks_enqueued.load(Ordering::Relaxed),
            blocks_cleared: self.blocks_cleared.load(Ordering::Relaxed),
            poll_wait_total_ms: self.poll_wait_total_ms.load(Ordering::Relaxed),
            poll_wait_max_ms: self.poll_wait_max_ms.load(Ordering::Relaxed),
        }
    }
}

fn update_max(target: &AtomicU64, candidate: u64) {
    let mut current = target.load(Ordering::Relaxed);
    while candidate > current {
        match target.compare_exchange_weak(
            current,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return,
            Err(old) => current = old,
        }
    }
}

/// Lightweight snapshot of the delivery counters.
#[allow(missing_docs)]
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub polls: u64,
    pub empty_polls: u64,
    pub blocks_delivered: u64,
    pub blocks_acknowledged: u64,
    pub jobs_enqueued: u64,
    pub blocks_enqueued: u64,
    pub blocks_cleared: u64,
    pub poll_wait_total_ms: u64,
    pub poll_wait_max_ms: u64,
}

impl MetricsSnapshot {
    /// Average time a poll spent waiting, in milliseconds.
    #[must_use]
    pub fn avg_poll_wait_ms(&self) -> Option<u64> {
        if self.polls == 0 {
            return None;
        }
        Some(self.poll_wait_total_ms / self.polls)
    }
}
