//! Command transports: where encoded commands end up.
//!
//! Drawing producers talk to a [`CommandTransport`] and never to the wire
//! format directly, so the same producer can feed a physical board or the
//! on-screen simulator.

use std::fmt::Write as _;

use tracing::{debug, trace};

use super::command::{BoardGeometry, Command, Encoder};
use super::instruction::instructions;

/// Capability set shared by the hardware encoder and the simulator.
pub trait CommandTransport {
    /// Apply `command`, appending any bytes destined for the device to `out`.
    fn encode(&mut self, command: Command, out: &mut Vec<u8>);

    /// Render what has been drawn so far, if this transport can.
    fn render(&mut self) -> Option<String>;

    /// Apply a sequence of commands.
    fn encode_all<I>(&mut self, commands: I, out: &mut Vec<u8>)
    where
        I: IntoIterator<Item = Command>,
        Self: Sized,
    {
        for command in commands {
            self.encode(command, out);
        }
    }
}

/// Transport for a physical board: commands become 3-byte instructions.
#[derive(Debug, Clone, Copy, Default)]
pub struct HardwareTransport {
    encoder: Encoder,
}

impl HardwareTransport {
    /// Create a transport for the given board.
    #[must_use]
    pub const fn new(geometry: BoardGeometry) -> Self {
        Self {
            encoder: Encoder::new(geometry),
        }
    }
}

impl CommandTransport for HardwareTransport {
    fn encode(&mut self, command: Command, out: &mut Vec<u8>) {
        self.encoder.encode(command).write_to(out);
    }

    fn render(&mut self) -> Option<String> {
        None
    }
}

/// One pen stroke in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Start point.
    pub from: (u32, u32),
    /// End point.
    pub to: (u32, u32),
}

/// Transport that draws in memory instead of emitting bytes.
///
/// The board origin is bottom-left while screen space is top-left, so y is
/// flipped; everything is scaled by `scale`.
#[derive(Debug, Clone)]
pub struct SimulatorTransport {
    geometry: BoardGeometry,
    scale: f64,
    pen_down: bool,
    location: (u32, u32),
    segments: Vec<Segment>,
    drawings_finished: u32,
}

impl SimulatorTransport {
    /// Default screen scale relative to board units.
    pub const DEFAULT_SCALE: f64 = 0.33;

    /// Create a simulator for the given board.
    #[must_use]
    pub fn new(geometry: BoardGeometry) -> Self {
        Self::with_scale(geometry, Self::DEFAULT_SCALE)
    }

    /// Create a simulator with an explicit scale factor.
    #[must_use]
    pub fn with_scale(geometry: BoardGeometry, scale: f64) -> Self {
        let mut simulator = Self {
            geometry,
            scale,
            pen_down: false,
            location: (0, 0),
            segments: Vec::new(),
            drawings_finished: 0,
        };
        simulator.location = simulator.to_screen(0, 0);
        simulator
    }

    /// Replay encoded instruction bytes, such as a queued block payload.
    ///
    /// Block headers are no-ops on the simulator; unknown words are skipped.
    pub fn replay(&mut self, bytes: &[u8]) {
        let mut sink = Vec::new();
        for instruction in instructions(bytes) {
            match Command::decode(instruction) {
                Some(command) => self.encode(command, &mut sink),
                None => trace!(%instruction, "simulator skipping unknown instruction"),
            }
        }
    }

    /// Strokes drawn since the last erase.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the pen is currently on the board.
    #[must_use]
    pub const fn is_pen_down(&self) -> bool {
        self.pen_down
    }

    /// Number of completed drawings (stop-drawing commands seen).
    #[must_use]
    pub const fn drawings_finished(&self) -> u32 {
        self.drawings_finished
    }

    /// Screen size in pixels.
    #[must_use]
    pub fn screen_size(&self) -> (u32, u32) {
        (
            scaled(f64::from(self.geometry.max_width), self.scale),
            scaled(f64::from(self.geometry.max_height), self.scale),
        )
    }

    fn to_screen(&self, x: u16, y: u16) -> (u32, u32) {
        let flipped = self.geometry.max_height.saturating_sub(y);
        (
            scaled(f64::from(x), self.scale),
            scaled(f64::from(flipped), self.scale),
        )
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled(value: f64, scale: f64) -> u32 {
    let pixels = (value * scale).floor();
    if pixels <= 0.0 {
        0
    } else if pixels >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        pixels as u32
    }
}

impl CommandTransport for SimulatorTransport {
    fn encode(&mut self, command: Command, _out: &mut Vec<u8>) {
        match command {
            Command::MoveTo { x, y } => {
                let (x, y) = self.geometry.clamp(x, y);
                let next = self.to_screen(x, y);
                if self.pen_down {
                    self.segments.push(Segment {
                        from: self.location,
                        to: next,
                    });
                }
                self.location = next;
            }
            Command::DropPen => self.pen_down = true,
            Command::LiftPen => self.pen_down = false,
            Command::EraserDown => {
                self.pen_down = false;
                self.segments.clear();
            }
            Command::StopDrawing => {
                self.drawings_finished += 1;
                debug!(
                    drawing = self.drawings_finished,
                    segments = self.segments.len(),
                    "simulated drawing finished"
                );
            }
            Command::StartDrawing | Command::BlockIdentifier(_) | Command::PacketStart => {}
        }
    }

    fn render(&mut self) -> Option<String> {
        let (width, height) = self.screen_size();
        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
             viewBox=\"0 0 {width} {height}\">\n"
        );
        for segment in &self.segments {
            let _ = writeln!(
                svg,
                "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"blue\" stroke-width=\"1\"/>",
                segment.from.0, segment.from.1, segment.to.0, segment.to.1
            );
        }
        svg.push_str("</svg>\n");
        Some(svg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> BoardGeometry {
        BoardGeometry::new(1000, 1000)
    }

    #[test]
    fn hardware_emits_three_bytes_per_command() {
        let mut transport = HardwareTransport::new(geometry());
        let mut out = Vec::new();
        transport.encode_all(
            [
                Command::LiftPen,
                Command::MoveTo { x: 1, y: 2 },
                Command::DropPen,
            ],
            &mut out,
        );
        assert_eq!(out.len(), 9);
        assert!(transport.render().is_none());
    }

    #[test]
    fn simulator_emits_no_bytes_and_tracks_strokes() {
        let mut simulator = SimulatorTransport::with_scale(geometry(), 1.0);
        let mut out = Vec::new();
        simulator.encode_all(
            [
                Command::MoveTo { x: 100, y: 100 },
                Command::DropPen,
                Command::MoveTo { x: 200, y: 100 },
                Command::LiftPen,
                Command::MoveTo { x: 500, y: 500 },
            ],
            &mut out,
        );
        assert!(out.is_empty());
        assert_eq!(
            simulator.segments(),
            &[Segment {
                from: (100, 900),
                to: (200, 900)
            }]
        );
        assert!(!simulator.is_pen_down());
    }

    #[test]
    fn simulator_eraser_wipes_board() {
        let mut simulator = SimulatorTransport::new(geometry());
        let mut out = Vec::new();
        simulator.encode_all(
            [
                Command::DropPen,
                Command::MoveTo { x: 300, y: 300 },
                Command::EraserDown,
                Command::MoveTo { x: 0, y: 0 },
            ],
            &mut out,
        );
        assert!(simulator.segments().is_empty());
    }

    #[test]
    fn simulator_replays_hardware_bytes() {
        let mut hardware = HardwareTransport::new(geometry());
        let mut bytes = Vec::new();
        hardware.encode_all(
            [
                Command::PacketStart,
                Command::BlockIdentifier(1),
                Command::StartDrawing,
                Command::DropPen,
                Command::MoveTo { x: 10, y: 10 },
                Command::StopDrawing,
            ],
            &mut bytes,
        );

        let mut simulator = SimulatorTransport::with_scale(geometry(), 1.0);
        simulator.replay(&bytes);
        assert_eq!(simulator.segments().len(), 1);
        assert_eq!(simulator.drawings_finished(), 1);

        let svg = simulator.render().expect("simulator renders");
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<line").count(), 1);
    }
}
