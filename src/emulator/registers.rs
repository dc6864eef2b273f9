use super::basics::{Address, Register, PROGRAM_OFFSET, REGISTER_COUNT, STACK_DEPTH, VF};
use super::error::VmError;
use arrayvec::ArrayVec;

/// V0 to VF, the index register, the program counter and the call stack.
#[derive(Clone, Debug)]
pub struct Registers {
    v: [u8; REGISTER_COUNT],
    pub i: Address,
    pub pc: Address,
    stack: ArrayVec<[Address; STACK_DEPTH]>,
}

impl Registers {
    pub fn new() -> Registers {
        Registers {
            v: [0; REGISTER_COUNT],
            i: Address(0),
            pc: Address(PROGRAM_OFFSET),
            stack: ArrayVec::new(),
        }
    }

    /// Returns the value of one of the registers.
    pub fn get(&self, reg: Register) -> Result<u8, VmError> {
        self.v
            .get(reg.0 as usize)
            .copied()
            .ok_or(VmError::InvalidRegister(reg.0))
    }

    pub fn set(&mut self, reg: Register, value: u8) -> Result<(), VmError> {
        let slot = self
            .v
            .get_mut(reg.0 as usize)
            .ok_or(VmError::InvalidRegister(reg.0))?;
        *slot = value;
        Ok(())
    }

    /// Sets VF to 1 or 0.
    pub fn set_flag(&mut self, flag: bool) {
        self.v[VF.0 as usize] = flag as u8;
    }

    pub fn values(&self) -> [u8; REGISTER_COUNT] {
        self.v
    }

    /// Saves a return address. Fails once all 16 levels are in use.
    pub fn push(&mut self, addr: Address) -> Result<(), VmError> {
        self.stack
            .try_push(addr)
            .map_err(|_| VmError::StackOverflow)
    }

    pub fn pop(&mut self) -> Result<Address, VmError> {
        self.stack.pop().ok_or(VmError::StackUnderflow)
    }

    /// Saved addresses, oldest first.
    pub fn stack(&self) -> &[Address] {
        &self.stack
    }
}

impl Default for Registers {
    fn default() -> Self {
        Registers::new()
    }
}

/// Delay and sound timer. Both count down at 60 Hz, independent of how
/// many instructions run in between.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    pub fn is_sounding(&self) -> bool {
        self.sound > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_new() {
        let regs = Registers::new();
        assert_eq!(regs.pc, Address(0x200));
        assert_eq!(regs.i, Address(0));
        assert_eq!(regs.values(), [0; 16]);
        assert!(regs.stack().is_empty());
    }

    #[test]
    fn test_register_index_checked() {
        let mut regs = Registers::new();
        regs.set(Register(0xA), 7).unwrap();
        assert_eq!(regs.get(Register(0xA)), Ok(7));
        assert_eq!(regs.get(Register(16)), Err(VmError::InvalidRegister(16)));
        assert_eq!(regs.set(Register(200), 1), Err(VmError::InvalidRegister(200)));
    }

    #[test]
    fn test_flag() {
        let mut regs = Registers::new();
        regs.set_flag(true);
        assert_eq!(regs.get(VF), Ok(1));
        regs.set_flag(false);
        assert_eq!(regs.get(VF), Ok(0));
    }

    #[test]
    fn test_stack_no_overflow() {
        let mut regs = Registers::new();
        for n in 0..STACK_DEPTH as u16 {
            regs.push(Address(n)).unwrap();
        }
        assert_eq!(regs.stack().len(), STACK_DEPTH);
        assert_eq!(regs.stack().last(), Some(&Address(15)));
    }

    #[test]
    fn test_stack_overflow() {
        let mut regs = Registers::new();
        for _ in 0..STACK_DEPTH {
            regs.push(Address(0x200)).unwrap();
        }
        assert_eq!(regs.push(Address(0x200)), Err(VmError::StackOverflow));
    }

    #[test]
    fn test_stack_empty() {
        let mut regs = Registers::new();
        assert_eq!(regs.pop(), Err(VmError::StackUnderflow));
        regs.push(Address(0x345)).unwrap();
        assert_eq!(regs.pop(), Ok(Address(0x345)));
        assert_eq!(regs.pop(), Err(VmError::StackUnderflow));
    }

    #[test]
    fn test_timers_floor_at_zero() {
        let mut timers = Timers { delay: 2, sound: 1 };
        timers.tick();
        assert_eq!(timers, Timers { delay: 1, sound: 0 });
        assert!(!timers.is_sounding());
        timers.tick();
        timers.tick();
        assert_eq!(timers, Timers { delay: 0, sound: 0 });
    }
}
