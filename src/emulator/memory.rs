use super::basics::{FONT_OFFSET, MEMORY_SIZE};
use super::error::VmError;

/// The built-in hexadecimal font, one 4x5 glyph per digit 0 to F.
pub const FONT_SET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Flat 4K of RAM. Every access is checked; nothing outside
/// `0x000..0x1000` is ever clamped or wrapped.
pub struct Memory {
    bytes: Box<[u8; MEMORY_SIZE]>,
}

impl Memory {
    /// Zeroed memory with the font installed at `FONT_OFFSET`.
    pub fn new() -> Memory {
        let mut memory = Memory {
            bytes: Box::new([0; MEMORY_SIZE]),
        };
        let font_range = FONT_OFFSET as usize..FONT_OFFSET as usize + FONT_SET.len();
        memory.bytes[font_range].copy_from_slice(&FONT_SET);
        memory
    }

    pub fn read(&self, address: usize) -> Result<u8, VmError> {
        self.bytes
            .get(address)
            .copied()
            .ok_or(VmError::OutOfBounds { address })
    }

    pub fn write(&mut self, address: usize, value: u8) -> Result<(), VmError> {
        let cell = self
            .bytes
            .get_mut(address)
            .ok_or(VmError::OutOfBounds { address })?;
        *cell = value;
        Ok(())
    }

    /// Copies `data` into memory starting at `offset`. Nothing is written
    /// unless the whole range fits.
    pub fn load(&mut self, offset: usize, data: &[u8]) -> Result<(), VmError> {
        let target = self.range_mut(offset, data.len())?;
        target.copy_from_slice(data);
        Ok(())
    }

    /// Borrows `len` bytes starting at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&[u8], VmError> {
        let end = Self::end_of(offset, len)?;
        Ok(&self.bytes[offset..end])
    }

    fn range_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8], VmError> {
        let end = Self::end_of(offset, len)?;
        Ok(&mut self.bytes[offset..end])
    }

    fn end_of(offset: usize, len: usize) -> Result<usize, VmError> {
        if offset >= MEMORY_SIZE && len > 0 {
            return Err(VmError::OutOfBounds { address: offset });
        }
        match offset.checked_add(len) {
            Some(end) if end <= MEMORY_SIZE => Ok(end),
            // report the first address that does not exist
            _ => Err(VmError::OutOfBounds {
                address: MEMORY_SIZE,
            }),
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new()
    }
}
