//! Fixed-width 3-byte robot instructions.

use std::fmt;

use super::INSTRUCTION_SIZE;

/// Largest value representable in one 12-bit coordinate field.
pub const COORDINATE_MASK: u16 = 0x0FFF;

/// A single 3-byte board bot instruction.
///
/// Two encodings share the same width:
///
/// ```text
/// coordinate form: [ a (12 bits) | b (12 bits) ]   big-endian, (a << 12) | b
/// raw-byte form:   [ x (8 bits) | y (8 bits) | z (8 bits) ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction([u8; INSTRUCTION_SIZE]);

impl Instruction {
    /// Pack two 12-bit values into a coordinate-form instruction.
    ///
    /// Bits above the low 12 of either value are discarded.
    #[must_use]
    pub const fn coordinate(a: u16, b: u16) -> Self {
        let high = a as u32 & COORDINATE_MASK as u32;
        let low = b as u32 & COORDINATE_MASK as u32;
        let packed = (high << 12) | low;
        Self([(packed >> 16) as u8, (packed >> 8) as u8, packed as u8])
    }

    /// Build a raw-byte instruction from three independent bytes.
    #[must_use]
    pub const fn raw(x: u8, y: u8, z: u8) -> Self {
        Self([x, y, z])
    }

    /// Reinterpret the first three bytes of `bytes` as an instruction.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let head: [u8; INSTRUCTION_SIZE] = bytes.get(..INSTRUCTION_SIZE)?.try_into().ok()?;
        Some(Self(head))
    }

    /// Split the 24-bit value back into its two 12-bit halves.
    #[must_use]
    pub const fn coordinates(self) -> (u16, u16) {
        let packed = ((self.0[0] as u32) << 16) | ((self.0[1] as u32) << 8) | self.0[2] as u32;
        (
            ((packed >> 12) & COORDINATE_MASK as u32) as u16,
            (packed & COORDINATE_MASK as u32) as u16,
        )
    }

    /// Borrow the encoded bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; INSTRUCTION_SIZE] {
        &self.0
    }

    /// Append the encoded bytes to `out`.
    pub fn write_to(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }
}

impl From<Instruction> for [u8; INSTRUCTION_SIZE] {
    fn from(instruction: Instruction) -> Self {
        instruction.0
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

/// Iterate over the whole instructions contained in `bytes`.
///
/// A trailing partial instruction is ignored.
pub fn instructions(bytes: &[u8]) -> impl Iterator<Item = Instruction> + '_ {
    bytes
        .chunks_exact(INSTRUCTION_SIZE)
        .filter_map(Instruction::from_slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_form_is_big_endian_24_bit() {
        let instruction = Instruction::coordinate(4009, 4001);
        assert_eq!(instruction.as_bytes(), &[0xFA, 0x9F, 0xA1]);
        assert_eq!(instruction.coordinates(), (4009, 4001));
    }

    #[test]
    fn coordinate_form_wraps_above_twelve_bits() {
        let instruction = Instruction::coordinate(4009, 4096 + 7);
        assert_eq!(instruction.coordinates(), (4009, 7));
    }

    #[test]
    fn raw_form_keeps_bytes_verbatim() {
        let instruction = Instruction::raw(0xFA, 0x1F, 0xA1);
        assert_eq!(instruction.as_bytes(), &[0xFA, 0x1F, 0xA1]);
        assert_eq!(instruction.to_string(), "FA1FA1");
    }

    #[test]
    fn instructions_ignores_trailing_fragment() {
        let bytes = [1, 2, 3, 4, 5, 6, 7];
        let decoded: Vec<_> = instructions(&bytes).collect();
        assert_eq!(decoded, vec![Instruction::raw(1, 2, 3), Instruction::raw(4, 5, 6)]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: coordinate packing is invertible for 12-bit inputs
            #[test]
            fn prop_coordinate_roundtrip(a in 0u16..=COORDINATE_MASK, b in 0u16..=COORDINATE_MASK) {
                prop_assert_eq!(Instruction::coordinate(a, b).coordinates(), (a, b));
            }
        }
    }
}
