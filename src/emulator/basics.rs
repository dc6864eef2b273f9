pub const MEMORY_SIZE: usize = 4096;
pub const SCREEN_WIDTH: u8 = 64;
pub const SCREEN_HEIGHT: u8 = 32;
pub const FONT_OFFSET: u16 = 0;
pub const FONT_GLYPH_SIZE: u16 = 5;
pub const PROGRAM_OFFSET: u16 = 0x200;
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_OFFSET as usize;
pub const STACK_DEPTH: usize = 16;
pub const REGISTER_COUNT: usize = 16;
pub const KEY_COUNT: usize = 16;

/// A 16 bit address. Only the low 12 bits address memory, the rest is kept
/// so that runaway arithmetic on `I` or the program counter shows up as an
/// out of bounds access instead of silently wrapping.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct Address(pub u16);

impl Address {
    /// Moves to the next instruction.
    pub fn advance(&mut self) {
        self.0 = self.0.wrapping_add(2);
    }

    /// `None` once the sum no longer fits in 16 bits.
    pub fn offset(self, delta: u16) -> Option<Address> {
        self.0.checked_add(delta).map(Address)
    }
}

/// Index of one of the general registers V0 to VF.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Register(pub u8);

pub const VF: Register = Register(0xF);

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Value(pub u8);
