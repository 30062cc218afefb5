//! Board bot - store-and-forward drawing delivery for polling plotter robots
//!
//! A board bot has no persistent connection: it polls over HTTP for the next
//! thing to draw, executes it, and polls again. This crate turns arbitrarily
//! large instruction streams into size-bounded blocks, queues them per device,
//! and hands them out in order until the device acknowledges them.
//!
//! # Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use boardbot::delivery::{
//!     BlockNumber, ClientId, DeliveryConfig, DeliveryService, DevicePoll, DeviceReply,
//! };
//! use boardbot::protocol::{Encoder, BoardGeometry};
//!
//! let service = DeliveryService::new(DeliveryConfig {
//!     poll_timeout: Duration::from_millis(10),
//!     ..DeliveryConfig::default()
//! })?;
//! let device = ClientId::parse("IWBB-01")?;
//!
//! // A rasterizer hands over already-encoded instructions.
//! let raw = Encoder::new(BoardGeometry::default()).move_to(100, 100);
//! let receipt = service.enqueue_job(&device, raw.as_bytes())?;
//! assert_eq!(receipt.first_block, 1);
//!
//! // The device polls and receives the block verbatim.
//! let reply = service.poll(&DevicePoll::new(device.clone(), None));
//! assert!(matches!(reply, DeviceReply::Block(_)));
//!
//! // Acknowledging block 1 drains the queue; the next poll comes back empty.
//! let reply = service.poll(&DevicePoll::new(device, Some(BlockNumber::new(1))));
//! assert_eq!(reply, DeviceReply::Empty);
//! # Ok::<(), boardbot::delivery::DeliveryError>(())
//! ```
//!
//! # Modules
//!
//! - [`protocol`] - 3-byte instruction encoding, command set, transports
//! - [`delivery`] - job chunking, per-device queues, poll protocol
//! - [`server`] - axum HTTP surface and configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod delivery;
pub mod protocol;
pub mod server;

pub use delivery::{
    Block, BlockNumber, ClientId, DeliveryError, DeliveryService, DeviceReply, MAX_BLOCK_BYTES,
    Result,
};
pub use protocol::{BoardGeometry, Command, Encoder, INSTRUCTION_SIZE, Instruction};
