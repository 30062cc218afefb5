//! Per-client block queue with blocking, timeout-bounded peeks.
//!
//! One mutex guards the pending blocks and the block counter; one condition
//! variable wakes pollers when work arrives. A job is appended inside a single
//! critical section, so concurrent jobs for the same client never interleave.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::assembler::Job;
use super::block::{Block, BlockNumber};
use super::error::{DeliveryError, Result};
use crate::protocol::MAX_BLOCK_IDENTIFIER;

/// Outcome of appending a job to a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobReceipt {
    /// Job identifier.
    pub job_id: Uuid,
    /// Blocks appended.
    pub blocks: usize,
    /// Number of the job's first block.
    pub first_block: u32,
    /// Number of the job's last block.
    pub last_block: u32,
}

#[derive(Debug, Default)]
struct QueueState {
    blocks: VecDeque<Block>,
    last_number: u32,
}

/// Ordered pending blocks for one device.
#[derive(Debug, Default)]
pub struct ClientQueue {
    state: Mutex<QueueState>,
    work_available: Condvar,
}

impl ClientQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Every critical section leaves the deque valid, so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append every block of `job` to the tail and wake waiting pollers.
    ///
    /// Numbering restarts at 1 when the queue is empty; otherwise it continues
    /// from the last block handed out.
    pub fn enqueue_job(&self, job: &Job) -> JobReceipt {
        let receipt = {
            let mut state = self.lock();
            if state.blocks.is_empty() {
                state.last_number = 0;
            }
            let first = BlockNumber::new(state.last_number).next();
            for block in job.blocks(first) {
                state.last_number = block.number().get();
                state.blocks.push_back(block);
            }

            if state.last_number > MAX_BLOCK_IDENTIFIER {
                warn!(
                    job = %job.id(),
                    last_block = state.last_number,
                    "block numbers exceed the 12-bit identifier and will wrap on the wire"
                );
            }

            JobReceipt {
                job_id: job.id(),
                blocks: job.block_count(),
                first_block: first.get(),
                last_block: state.last_number,
            }
        };
        self.work_available.notify_all();

        info!(
            job = %receipt.job_id,
            blocks = receipt.blocks,
            first_block = receipt.first_block,
            last_block = receipt.last_block,
            "job enqueued"
        );
        receipt
    }

    /// Return the head block without removing it, waiting up to `timeout` for one.
    ///
    /// The head stays queued until acknowledged, so a device that never
    /// acknowledges receives the same block again on its next poll.
    pub fn peek_next(&self, timeout: Duration) -> Result<Block> {
        let started = Instant::now();
        let guard = self.lock();
        let (state, wait) = self
            .work_available
            .wait_timeout_while(guard, timeout, |state| state.blocks.is_empty())
            .unwrap_or_else(PoisonError::into_inner);

        match state.blocks.front() {
            Some(block) => {
                trace!(
                    block = %block.number(),
                    waited_ms = millis(started.elapsed()),
                    "head block available"
                );
                Ok(block.clone())
            }
            None => {
                debug!(
                    timed_out = wait.timed_out(),
                    timeout_ms = millis(timeout),
                    "no work available"
                );
                Err(DeliveryError::NoWork)
            }
        }
    }

    /// Remove every head block numbered `<= number`; returns how many were removed.
    ///
    /// Stops at the first higher-numbered block. Acknowledging the same number
    /// twice is a no-op the second time.
    pub fn acknowledge_up_to(&self, number: BlockNumber) -> usize {
        let mut state = self.lock();
        let mut removed = 0;
        while state
            .blocks
            .front()
            .is_some_and(|block| block.number() <= number)
        {
            state.blocks.pop_front();
            removed += 1;
        }
        debug!(
            ack = %number,
            removed,
            remaining = state.blocks.len(),
            "acknowledged blocks"
        );
        removed
    }

    /// Drop every pending block; returns how many were discarded.
    pub fn clear(&self) -> usize {
        let mut state = self.lock();
        let cleared = state.blocks.len();
        state.blocks.clear();
        info!(cleared, "queue cleared");
        cleared
    }

    /// Number of pending blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().blocks.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().blocks.is_empty()
    }

    /// Copy of every pending block, head first.
    #[must_use]
    pub fn pending(&self) -> Vec<Block> {
        self.lock().blocks.iter().cloned().collect()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
