//! Footer insertion and block slicing for drawing jobs.

use std::ops::Range;

use bytes::{Bytes, BytesMut};
use tracing::trace;
use uuid::Uuid;

use super::block::{Block, BlockNumber, FIRST_HEADER_SIZE, header_size};
use super::error::{DeliveryError, Result};
use crate::protocol::{Encoder, INSTRUCTION_SIZE};

/// Largest block the device firmware accepts, header included.
pub const MAX_BLOCK_BYTES: usize = 768;

/// Footer appended to every job: return to origin, stop drawing.
#[must_use]
pub fn footer() -> [u8; 2 * INSTRUCTION_SIZE] {
    let origin = Encoder::default().move_to(0, 0);
    let stop = Encoder::stop_drawing();
    let mut out = [0u8; 2 * INSTRUCTION_SIZE];
    out[..INSTRUCTION_SIZE].copy_from_slice(origin.as_bytes());
    out[INSTRUCTION_SIZE..].copy_from_slice(stop.as_bytes());
    out
}

/// Slices raw instruction streams into device-sized jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobAssembler {
    max_block_bytes: usize,
}

impl Default for JobAssembler {
    fn default() -> Self {
        Self {
            max_block_bytes: MAX_BLOCK_BYTES,
        }
    }
}

impl JobAssembler {
    /// Create an assembler for a transport limit of `max_block_bytes`.
    ///
    /// The limit must fit the first-block header plus one instruction.
    pub fn new(max_block_bytes: usize) -> Result<Self> {
        let required = FIRST_HEADER_SIZE + INSTRUCTION_SIZE;
        if max_block_bytes < required {
            return Err(DeliveryError::BlockLimitTooSmall {
                max: max_block_bytes,
                required,
            });
        }
        Ok(Self { max_block_bytes })
    }

    /// Configured block limit.
    #[must_use]
    pub const fn max_block_bytes(&self) -> usize {
        self.max_block_bytes
    }

    /// Body bytes a block can carry after its header, rounded down to whole instructions.
    #[must_use]
    pub const fn body_capacity(&self, is_first: bool) -> usize {
        let room = self.max_block_bytes - header_size(is_first);
        room - room % INSTRUCTION_SIZE
    }

    /// Append the footer to `raw` and plan its block boundaries.
    ///
    /// `raw` must be a whole number of instructions. An empty stream still
    /// yields one footer-only block.
    pub fn assemble(&self, raw: &[u8]) -> Result<Job> {
        if raw.len() % INSTRUCTION_SIZE != 0 {
            return Err(DeliveryError::MisalignedPayload { len: raw.len() });
        }

        let footer = footer();
        let mut body = BytesMut::with_capacity(raw.len() + footer.len());
        body.extend_from_slice(raw);
        body.extend_from_slice(&footer);
        let body = body.freeze();

        let mut slices = Vec::with_capacity(body.len() / self.body_capacity(false) + 1);
        let mut start = 0;
        while start < body.len() {
            let take = self.body_capacity(slices.is_empty()).min(body.len() - start);
            slices.push(start..start + take);
            start += take;
        }

        let job = Job {
            id: Uuid::new_v4(),
            body,
            slices,
        };
        trace!(job = %job.id, bytes = job.body.len(), blocks = job.block_count(), "job assembled");
        Ok(job)
    }
}

/// A footer-terminated instruction stream with planned block boundaries.
///
/// Block numbers are assigned only when the job is appended to a queue.
#[derive(Debug, Clone)]
pub struct Job {
    id: Uuid,
    body: Bytes,
    slices: Vec<Range<usize>>,
}

impl Job {
    /// Unique job identifier, for correlating logs and receipts.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Number of blocks the job occupies.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.slices.len()
    }

    /// Instruction stream including the footer.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Materialise the blocks, numbering them from `first`.
    pub fn blocks(&self, first: BlockNumber) -> impl Iterator<Item = Block> + '_ {
        let mut number = first;
        self.slices.iter().enumerate().map(move |(index, range)| {
            let block = Block::build(number, index == 0, &self.body[range.clone()]);
            number = number.next();
            block
        })
    }
}
