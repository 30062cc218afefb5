//! Board bot wire format.
//!
//! This module provides the 3-byte instruction encoding, the command set
//! built on top of it, and the transports that consume commands.

mod command;
mod instruction;
pub mod program;
mod transport;

pub use command::{
    BLOCK_MARKER, BoardGeometry, Command, DROP_PEN, ERASER_DOWN, Encoder, LIFT_PEN,
    MAX_BLOCK_IDENTIFIER, MAX_EXTENT, PACKET_START, PACKET_START_CODE, START_DRAWING,
    STOP_DRAWING,
};
pub use instruction::{COORDINATE_MASK, Instruction, instructions};
pub use transport::{CommandTransport, HardwareTransport, Segment, SimulatorTransport};

/// Size of every instruction in bytes.
pub const INSTRUCTION_SIZE: usize = 3;
