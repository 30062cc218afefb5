//! Size-bounded, header-prefixed blocks of a drawing job.

use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::protocol::{Encoder, INSTRUCTION_SIZE};

/// Header instructions on the first block of a job (packet start, block id, start drawing).
pub const FIRST_HEADER_INSTRUCTIONS: usize = 3;
/// Header instructions on every later block (packet start, block id).
pub const SUBSEQUENT_HEADER_INSTRUCTIONS: usize = 2;
/// First-block header size in bytes.
pub const FIRST_HEADER_SIZE: usize = FIRST_HEADER_INSTRUCTIONS * INSTRUCTION_SIZE;
/// Later-block header size in bytes.
pub const SUBSEQUENT_HEADER_SIZE: usize = SUBSEQUENT_HEADER_INSTRUCTIONS * INSTRUCTION_SIZE;

/// Sequence number of a block within a client's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockNumber(u32);

impl BlockNumber {
    /// Wrap a raw number.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Following block number.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u32> for BlockNumber {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Header size in bytes for a block.
#[must_use]
pub const fn header_size(is_first: bool) -> usize {
    if is_first {
        FIRST_HEADER_SIZE
    } else {
        SUBSEQUENT_HEADER_SIZE
    }
}

/// One transmittable chunk of a job: header followed by a slice of the job body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    number: BlockNumber,
    first_of_job: bool,
    payload: Bytes,
}

impl Block {
    /// Build a block by prefixing `body` with the header for `number`.
    #[must_use]
    pub fn build(number: BlockNumber, first_of_job: bool, body: &[u8]) -> Self {
        let mut payload = BytesMut::with_capacity(header_size(first_of_job) + body.len());
        payload.extend_from_slice(Encoder::packet_start().as_bytes());
        payload.extend_from_slice(Encoder::block_identifier(number.get()).as_bytes());
        if first_of_job {
            payload.extend_from_slice(Encoder::start_drawing().as_bytes());
        }
        payload.extend_from_slice(body);

        Self {
            number,
            first_of_job,
            payload: payload.freeze(),
        }
    }

    /// Sequence number.
    #[must_use]
    pub const fn number(&self) -> BlockNumber {
        self.number
    }

    /// Whether this block opens a job (carries the start-drawing marker).
    #[must_use]
    pub const fn is_first_of_job(&self) -> bool {
        self.first_of_job
    }

    /// Full wire payload, header included.
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Header bytes.
    #[must_use]
    pub fn header(&self) -> &[u8] {
        &self.payload[..header_size(self.first_of_job)]
    }

    /// Job bytes carried after the header.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.payload[header_size(self.first_of_job)..]
    }

    /// Wire length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
