//! Board bot command set: primitive robot operations and their encoding.

use std::fmt;

use super::instruction::Instruction;

/// Coordinate-form prefix shared by the block identifier and packet start.
pub const BLOCK_MARKER: u16 = 4009;
/// Second half of the packet-start sentinel.
pub const PACKET_START_CODE: u16 = 4001;
/// Largest block number the 12-bit identifier field carries unchanged.
pub const MAX_BLOCK_IDENTIFIER: u32 = 4095;

/// `4001 4001` start drawing (new draw).
pub const START_DRAWING: Instruction = Instruction::raw(0xFA, 0x1F, 0xA1);
/// `4002 0000` stop drawing.
pub const STOP_DRAWING: Instruction = Instruction::raw(0xFA, 0x20, 0x00);
/// `4003 0000` pen lift.
pub const LIFT_PEN: Instruction = Instruction::raw(0xFA, 0x30, 0x00);
/// `4004 0000` pen down.
pub const DROP_PEN: Instruction = Instruction::raw(0xFA, 0x40, 0x00);
/// `4005 0000` eraser down.
pub const ERASER_DOWN: Instruction = Instruction::raw(0xFA, 0x50, 0x00);
/// `4009 4001` start of packet.
pub const PACKET_START: Instruction = Instruction::coordinate(BLOCK_MARKER, PACKET_START_CODE);

/// Largest board extent. Coordinates at or above 4000 collide with command codes.
pub const MAX_EXTENT: u16 = 4000;

/// Drawing area of a board, in device units.
///
/// Coordinates are valid in `[0, max_width)` × `[0, max_height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardGeometry {
    /// Exclusive upper bound on x.
    pub max_width: u16,
    /// Exclusive upper bound on y.
    pub max_height: u16,
}

impl BoardGeometry {
    /// Create a geometry with extents bounded to `1..=MAX_EXTENT`.
    #[must_use]
    pub const fn new(max_width: u16, max_height: u16) -> Self {
        Self {
            max_width: bound_extent(max_width),
            max_height: bound_extent(max_height),
        }
    }

    /// Clamp a point onto the board.
    #[must_use]
    pub fn clamp(&self, x: i32, y: i32) -> (u16, u16) {
        (
            clamp_axis(x, self.max_width),
            clamp_axis(y, self.max_height),
        )
    }
}

impl Default for BoardGeometry {
    fn default() -> Self {
        Self::new(3580, 1200)
    }
}

const fn bound_extent(extent: u16) -> u16 {
    match extent {
        0 => 1,
        e if e > MAX_EXTENT => MAX_EXTENT,
        e => e,
    }
}

fn clamp_axis(value: i32, max: u16) -> u16 {
    // Public fields can bypass `new`.
    let upper = i32::from(bound_extent(max) - 1);
    // In range after the clamp, so the conversion cannot fail.
    u16::try_from(value.clamp(0, upper)).unwrap_or(0)
}

/// A primitive robot operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move the head to an absolute position (pen state unchanged).
    MoveTo {
        /// Horizontal position.
        x: i32,
        /// Vertical position.
        y: i32,
    },
    /// Raise the pen.
    LiftPen,
    /// Lower the pen.
    DropPen,
    /// Begin a new drawing.
    StartDrawing,
    /// Finish the current drawing.
    StopDrawing,
    /// Lower the eraser.
    EraserDown,
    /// Tag the enclosing packet with a block number.
    BlockIdentifier(u32),
    /// Start of packet sentinel.
    PacketStart,
}

impl Command {
    /// Decode one instruction back into the command that produced it.
    ///
    /// Fixed codes are matched first; everything else is read as coordinate
    /// form. Returns `None` for words in the reserved command range that are
    /// not part of the command set.
    #[must_use]
    pub fn decode(instruction: Instruction) -> Option<Self> {
        match instruction {
            START_DRAWING => return Some(Self::StartDrawing),
            STOP_DRAWING => return Some(Self::StopDrawing),
            LIFT_PEN => return Some(Self::LiftPen),
            DROP_PEN => return Some(Self::DropPen),
            ERASER_DOWN => return Some(Self::EraserDown),
            PACKET_START => return Some(Self::PacketStart),
            _ => {}
        }

        match instruction.coordinates() {
            (BLOCK_MARKER, number) => Some(Self::BlockIdentifier(u32::from(number))),
            (a, _) if a >= MAX_EXTENT => None,
            (x, y) => Some(Self::MoveTo {
                x: i32::from(x),
                y: i32::from(y),
            }),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MoveTo { x, y } => write!(f, "MoveTo({x}, {y})"),
            Self::LiftPen => write!(f, "LiftPen"),
            Self::DropPen => write!(f, "DropPen"),
            Self::StartDrawing => write!(f, "StartDrawing"),
            Self::StopDrawing => write!(f, "StopDrawing"),
            Self::EraserDown => write!(f, "EraserDown"),
            Self::BlockIdentifier(n) => write!(f, "BlockIdentifier({n})"),
            Self::PacketStart => write!(f, "PacketStart"),
        }
    }
}

/// Pure encoder for the hardware command set.
///
/// Holds the board geometry so that `move_to` can clamp; every other
/// operation is geometry independent. No operation can fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Encoder {
    geometry: BoardGeometry,
}

impl Encoder {
    /// Create an encoder for the given board.
    #[must_use]
    pub const fn new(geometry: BoardGeometry) -> Self {
        Self { geometry }
    }

    /// Board this encoder clamps against.
    #[must_use]
    pub const fn geometry(&self) -> BoardGeometry {
        self.geometry
    }

    /// Encode any command.
    #[must_use]
    pub fn encode(&self, command: Command) -> Instruction {
        match command {
            Command::MoveTo { x, y } => self.move_to(x, y),
            Command::LiftPen => Self::lift_pen(),
            Command::DropPen => Self::drop_pen(),
            Command::StartDrawing => Self::start_drawing(),
            Command::StopDrawing => Self::stop_drawing(),
            Command::EraserDown => Self::eraser_down(),
            Command::BlockIdentifier(n) => Self::block_identifier(n),
            Command::PacketStart => Self::packet_start(),
        }
    }

    /// Move to `(x, y)`, clamped onto the board.
    #[must_use]
    pub fn move_to(&self, x: i32, y: i32) -> Instruction {
        let (x, y) = self.geometry.clamp(x, y);
        Instruction::coordinate(x, y)
    }

    /// Raise the pen.
    #[must_use]
    pub const fn lift_pen() -> Instruction {
        LIFT_PEN
    }

    /// Lower the pen.
    #[must_use]
    pub const fn drop_pen() -> Instruction {
        DROP_PEN
    }

    /// Start a drawing.
    #[must_use]
    pub const fn start_drawing() -> Instruction {
        START_DRAWING
    }

    /// Stop a drawing.
    #[must_use]
    pub const fn stop_drawing() -> Instruction {
        STOP_DRAWING
    }

    /// Lower the eraser.
    #[must_use]
    pub const fn eraser_down() -> Instruction {
        ERASER_DOWN
    }

    /// Block number marker `(4009, n)`.
    ///
    /// Only the low 12 bits of `n` survive the packing; numbers above
    /// [`MAX_BLOCK_IDENTIFIER`] wrap.
    #[must_use]
    pub const fn block_identifier(n: u32) -> Instruction {
        Instruction::coordinate(BLOCK_MARKER, (n & 0x0FFF) as u16)
    }

    /// Packet start sentinel `(4009, 4001)`.
    #[must_use]
    pub const fn packet_start() -> Instruction {
        PACKET_START
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> Encoder {
        Encoder::new(BoardGeometry::new(3580, 1200))
    }

    #[test]
    fn move_to_in_bounds_is_exact() {
        assert_eq!(encoder().move_to(100, 100).coordinates(), (100, 100));
        assert_eq!(encoder().move_to(3579, 1199).coordinates(), (3579, 1199));
    }

    #[test]
    fn move_to_clamps_to_boundary() {
        assert_eq!(encoder().move_to(3580, 1200).coordinates(), (3579, 1199));
        assert_eq!(encoder().move_to(-5, 99_999).coordinates(), (0, 1199));
    }

    #[test]
    fn fixed_codes_match_firmware_table() {
        assert_eq!(Encoder::start_drawing().as_bytes(), &[0xFA, 0x1F, 0xA1]);
        assert_eq!(Encoder::stop_drawing().as_bytes(), &[0xFA, 0x20, 0x00]);
        assert_eq!(Encoder::lift_pen().as_bytes(), &[0xFA, 0x30, 0x00]);
        assert_eq!(Encoder::drop_pen().as_bytes(), &[0xFA, 0x40, 0x00]);
        assert_eq!(Encoder::eraser_down().as_bytes(), &[0xFA, 0x50, 0x00]);
    }

    #[test]
    fn block_identifier_uses_marker_prefix() {
        assert_eq!(Encoder::block_identifier(1).coordinates(), (4009, 1));
        assert_eq!(Encoder::packet_start().coordinates(), (4009, 4001));
    }

    #[test]
    fn block_identifier_wraps_past_twelve_bits() {
        assert_eq!(
            Encoder::block_identifier(MAX_BLOCK_IDENTIFIER + 2),
            Encoder::block_identifier(1)
        );
    }

    #[test]
    fn decode_inverts_encode() {
        let commands = [
            Command::MoveTo { x: 12, y: 34 },
            Command::LiftPen,
            Command::DropPen,
            Command::StartDrawing,
            Command::StopDrawing,
            Command::EraserDown,
            Command::BlockIdentifier(17),
            Command::PacketStart,
        ];
        for command in commands {
            assert_eq!(Command::decode(encoder().encode(command)), Some(command));
        }
    }

    #[test]
    fn decode_rejects_unknown_reserved_codes() {
        assert_eq!(Command::decode(Instruction::raw(0xFA, 0x60, 0x00)), None);
    }

    #[test]
    fn zero_geometry_is_raised() {
        let geometry = BoardGeometry::new(0, 0);
        assert_eq!(geometry.clamp(10, 10), (0, 0));
    }

    #[test]
    fn oversized_geometry_is_capped_below_command_codes() {
        let geometry = BoardGeometry::new(5000, 5000);
        assert_eq!((geometry.max_width, geometry.max_height), (MAX_EXTENT, MAX_EXTENT));

        let encoder = Encoder::new(geometry);
        let instruction = encoder.move_to(4009, 4001);
        assert_ne!(instruction, PACKET_START);
        assert_eq!(instruction.coordinates(), (MAX_EXTENT - 1, MAX_EXTENT - 1));
        assert_eq!(
            Command::decode(instruction),
            Some(Command::MoveTo { x: 3999, y: 3999 })
        );
        assert_eq!(encoder.move_to(4500, 10).coordinates(), (3999, 10));
    }

    #[test]
    fn hand_built_geometry_is_still_capped() {
        let geometry = BoardGeometry {
            max_width: u16::MAX,
            max_height: u16::MAX,
        };
        assert_eq!(geometry.clamp(60_000, 4001), (3999, 3999));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: in-bounds moves decode to exactly the input point
            #[test]
            fn prop_move_in_bounds_roundtrip(x in 0i32..3580, y in 0i32..1200) {
                let (a, b) = encoder().move_to(x, y).coordinates();
                prop_assert_eq!((i32::from(a), i32::from(b)), (x, y));
            }

            /// Property: out-of-range moves land on the clamped boundary
            #[test]
            fn prop_move_out_of_bounds_clamps(x in 3580i32..100_000, y in 1200i32..100_000) {
                prop_assert_eq!(encoder().move_to(x, y).coordinates(), (3579, 1199));
            }

            /// Property: n commands always encode to 3n bytes
            #[test]
            fn prop_encoded_length_is_three_per_command(
                points in prop::collection::vec((any::<i32>(), any::<i32>()), 0..200),
            ) {
                let mut out = Vec::new();
                for (x, y) in &points {
                    encoder().move_to(*x, *y).write_to(&mut out);
                }
                prop_assert_eq!(out.len(), 3 * points.len());
            }
        }
    }
}
