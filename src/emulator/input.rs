use super::basics::KEY_COUNT;
use super::error::VmError;

/// The 16 key hex keypad. Written by whatever reads the physical keyboard,
/// only ever read by the interpreter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Keypad {
        Keypad::default()
    }

    pub fn set_pressed(&mut self, key: u8, pressed: bool) -> Result<(), VmError> {
        let slot = self
            .keys
            .get_mut(key as usize)
            .ok_or(VmError::InvalidKey(key))?;
        *slot = pressed;
        Ok(())
    }

    /// Keys outside 0x0..=0xF are never held.
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys.get(key as usize).copied().unwrap_or(false)
    }

    /// The lowest held key, if any.
    pub fn any_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|held| *held).map(|key| key as u8)
    }

    /// The lowest key held now that was not held in `baseline`. Keys that
    /// have been released since are dropped from `baseline`, so pressing them
    /// again counts.
    pub fn newly_pressed(&self, baseline: &mut Keypad) -> Option<u8> {
        for (held, was_held) in self.keys.iter().zip(baseline.keys.iter_mut()) {
            *was_held &= *held;
        }
        self.keys
            .iter()
            .zip(baseline.keys.iter())
            .position(|(held, was_held)| *held && !*was_held)
            .map(|key| key as u8)
    }

    pub fn release_all(&mut self) {
        self.keys = [false; KEY_COUNT];
    }
}
