//! Canned command programs used by the control plane.

use super::command::{BoardGeometry, Command};
use super::transport::CommandTransport;

/// Horizontal distance between eraser passes, in board units.
pub const ERASER_STEP: i32 = 150;

/// Wipe the whole board with the eraser.
///
/// The eraser sweeps bottom-to-top and back in vertical passes across the
/// full width, then the head parks at the origin.
#[must_use]
pub fn erase_all(geometry: BoardGeometry) -> Vec<Command> {
    let top = i32::from(geometry.max_height) - 1;
    let right = i32::from(geometry.max_width) - 1;

    let mut program = vec![
        Command::LiftPen,
        Command::MoveTo { x: 0, y: 0 },
        Command::EraserDown,
    ];

    let mut x = 0;
    let mut at_bottom = true;
    loop {
        let y = if at_bottom { top } else { 0 };
        program.push(Command::MoveTo { x, y });
        at_bottom = !at_bottom;
        if x >= right {
            break;
        }
        x = (x + ERASER_STEP).min(right);
        program.push(Command::MoveTo { x, y });
    }

    program.push(Command::LiftPen);
    program.push(Command::MoveTo { x: 0, y: 0 });
    program
}

/// Dummy drawing used to exercise the delivery path.
///
/// Size `0` is a single short stroke; size `n` is a grid of `2n × 5n` short
/// horizontal strokes, large enough to span several blocks.
#[must_use]
pub fn mock_drawing(size: u32) -> Vec<Command> {
    let mut program = vec![Command::LiftPen, Command::MoveTo { x: 0, y: 0 }];

    if size == 0 {
        program.extend([
            Command::MoveTo { x: 1000, y: 1000 },
            Command::DropPen,
            Command::MoveTo { x: 1500, y: 1000 },
            Command::LiftPen,
        ]);
        return program;
    }

    let columns = i64::from(size) * 2;
    let rows = i64::from(size) * 5;
    for column in 0..columns {
        for row in 0..rows {
            let x = saturate(1000 + column * 100);
            let y = saturate(1000 - row * 25);
            program.extend([
                Command::MoveTo { x, y },
                Command::DropPen,
                Command::MoveTo { x: x.saturating_add(50), y },
                Command::LiftPen,
            ]);
        }
    }
    program
}

fn saturate(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

/// Run `program` through `transport` and collect the device bytes.
pub fn encode_program<T, I>(transport: &mut T, program: I) -> Vec<u8>
where
    T: CommandTransport,
    I: IntoIterator<Item = Command>,
{
    let mut out = Vec::new();
    transport.encode_all(program, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::transport::{HardwareTransport, SimulatorTransport};

    #[test]
    fn erase_all_covers_full_width_with_eraser() {
        let geometry = BoardGeometry::new(1000, 500);
        let program = erase_all(geometry);

        assert_eq!(program[2], Command::EraserDown);
        assert_eq!(program.last(), Some(&Command::MoveTo { x: 0, y: 0 }));
        let max_x = program
            .iter()
            .filter_map(|command| match command {
                Command::MoveTo { x, .. } => Some(*x),
                _ => None,
            })
            .max();
        assert_eq!(max_x, Some(999));
    }

    #[test]
    fn mock_drawing_sizes() {
        assert_eq!(mock_drawing(0).len(), 6);
        // 2 prefix commands plus 4 per stroke, 2 × 5 strokes.
        assert_eq!(mock_drawing(1).len(), 2 + 4 * 10);
    }

    #[test]
    fn encode_program_depends_on_transport() {
        let geometry = BoardGeometry::default();
        let bytes = encode_program(&mut HardwareTransport::new(geometry), mock_drawing(0));
        assert_eq!(bytes.len(), 18);

        let mut simulator = SimulatorTransport::new(geometry);
        let bytes = encode_program(&mut simulator, mock_drawing(0));
        assert!(bytes.is_empty());
        assert_eq!(simulator.segments().len(), 1);
    }
}
