//! Store-and-forward delivery of drawing jobs to polling devices.
//!
//! Jobs are sliced into header-prefixed blocks, queued per device, handed out
//! one at a time on each poll, and evicted once the device acknowledges them.

mod assembler;
mod block;
mod error;
mod metrics;
mod poll;
mod queue;
mod registry;
mod service;

pub use assembler::{Job, JobAssembler, MAX_BLOCK_BYTES, footer};
pub use block::{
    Block, BlockNumber, FIRST_HEADER_INSTRUCTIONS, FIRST_HEADER_SIZE,
    SUBSEQUENT_HEADER_INSTRUCTIONS, SUBSEQUENT_HEADER_SIZE, header_size,
};
pub use error::{DeliveryError, Result};
pub use metrics::{DeliveryMetrics, MetricsSnapshot};
pub use poll::{DEFAULT_POLL_TIMEOUT, DevicePoll, DeviceReply, EMPTY_REPLY, serve_poll};
pub use queue::{ClientQueue, JobReceipt};
pub use registry::{Client, ClientId, ClientRegistry, ClientStatus, MAX_CLIENT_ID_LEN};
pub use service::{DeliveryConfig, DeliveryService, ServiceStatus};
