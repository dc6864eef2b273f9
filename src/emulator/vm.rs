use super::basics::{
    Address, Register, Value, FONT_GLYPH_SIZE, FONT_OFFSET, MAX_PROGRAM_SIZE, PROGRAM_OFFSET,
    SCREEN_HEIGHT, SCREEN_WIDTH,
};
use super::display::{Display, Frame, Framebuffer};
use super::error::{Fault, VmError};
use super::input::Keypad;
use super::memory::Memory;
use super::observer::{CycleEvent, CycleObserver};
use super::program::{Instruction, Opcode};
use super::registers::{Registers, Timers};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum VmState {
    Running,
    /// Blocked on `FX0A` until a key is held; the key goes into the register.
    WaitingForKey(Register),
    Halted,
}

/// What to do with words outside the instruction table.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum OpcodePolicy {
    /// Skip them, logging at debug level.
    Permissive,
    /// Stop with `VmError::UnknownOpcode`.
    Strict,
}

impl Default for OpcodePolicy {
    fn default() -> Self {
        OpcodePolicy::Permissive
    }
}

/// The parts of the machine that other threads touch: the renderer reads
/// the display and writes the keypad, the 60 Hz clock decrements the timers.
pub struct VMInterface {
    pub display: Box<dyn Display>,
    pub keypad: Keypad,
    pub timers: Timers,
}

impl VMInterface {
    pub fn new(display: Box<dyn Display>) -> VMInterface {
        VMInterface {
            display,
            keypad: Keypad::new(),
            timers: Timers::default(),
        }
    }
}

impl Default for VMInterface {
    fn default() -> Self {
        VMInterface::new(Box::new(Framebuffer::new()))
    }
}

/// Holds the logic of a virtual machine in action, including things like the
/// program counter and the memory.
pub struct VirtualMachine {
    registers: Registers,
    memory: Memory,
    state: VmState,
    /// Keys already held when `FX0A` started waiting.
    wait_baseline: Keypad,
    policy: OpcodePolicy,
    rng: Box<dyn RngCore + Send>,
    observer: Option<Box<dyn CycleObserver>>,
    pub interface: Arc<Mutex<VMInterface>>,
}

impl VirtualMachine {
    /// Creates a new VM instance with all registers and memory set accordingly.
    pub fn new() -> VirtualMachine {
        VirtualMachine {
            registers: Registers::new(),
            memory: Memory::new(),
            state: VmState::Running,
            wait_baseline: Keypad::new(),
            policy: OpcodePolicy::default(),
            rng: Box::new(StdRng::from_entropy()),
            observer: None,
            interface: Arc::new(Mutex::new(VMInterface::default())),
        }
    }

    /// Creates a VM with `program` loaded at `PROGRAM_OFFSET`.
    pub fn with_program(program: &[u8]) -> Result<VirtualMachine, VmError> {
        let mut vm = VirtualMachine::new();
        vm.load_program(program)?;
        Ok(vm)
    }

    pub fn load_program(&mut self, program: &[u8]) -> Result<(), VmError> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(VmError::ImageTooLarge {
                size: program.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        self.memory.load(PROGRAM_OFFSET as usize, program)?;
        log::info!("loaded program of {} bytes", program.len());
        Ok(())
    }

    pub fn set_opcode_policy(&mut self, policy: OpcodePolicy) {
        self.policy = policy;
    }

    /// Replaces the random source behind `CXNN`, e.g. with a seeded one.
    pub fn set_rng(&mut self, rng: Box<dyn RngCore + Send>) {
        self.rng = rng;
    }

    pub fn set_observer(&mut self, observer: Option<Box<dyn CycleObserver>>) {
        self.observer = observer;
    }

    pub fn set_display(&mut self, display: Box<dyn Display>) {
        self.lock_interface().display = display;
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn program_counter(&self) -> Address {
        self.registers.pc
    }

    pub fn set_program_counter(&mut self, pc: Address) {
        self.registers.pc = pc;
    }

    pub fn index(&self) -> Address {
        self.registers.i
    }

    pub fn set_index(&mut self, i: Address) {
        self.registers.i = i;
    }

    pub fn register(&self, reg: Register) -> Result<u8, VmError> {
        self.registers.get(reg)
    }

    pub fn set_register(&mut self, reg: Register, value: u8) -> Result<(), VmError> {
        self.registers.set(reg, value)
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn stack(&self) -> &[Address] {
        self.registers.stack()
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn timers(&self) -> Timers {
        self.lock_interface().timers
    }

    pub fn set_timers(&mut self, timers: Timers) {
        self.lock_interface().timers = timers;
    }

    /// One 60 Hz timer tick.
    pub fn tick_timers(&self) {
        self.lock_interface().timers.tick();
    }

    pub fn set_key(&self, key: u8, pressed: bool) -> Result<(), VmError> {
        self.lock_interface().keypad.set_pressed(key, pressed)
    }

    pub fn frame(&self) -> Frame {
        self.lock_interface().display.snapshot()
    }

    /// Stops the machine for good.
    pub fn halt(&mut self) {
        if self.state != VmState::Halted {
            log::info!("halted at {:#05X}", self.registers.pc.0);
        }
        self.state = VmState::Halted;
    }

    /// Locks the shared part of the machine. A renderer that panicked while
    /// holding the lock leaves plain data behind, so poisoning is ignored.
    pub fn lock_interface(&self) -> MutexGuard<'_, VMInterface> {
        self.interface
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs one cycle. While waiting for a key this only polls the keypad;
    /// once halted it does nothing. Any fatal error halts the machine and is
    /// returned together with the offending instruction.
    pub fn step(&mut self) -> Result<VmState, Fault> {
        match self.state {
            VmState::Halted => return Ok(VmState::Halted),
            VmState::WaitingForKey(reg) => {
                if let Err(kind) = self.poll_key(reg) {
                    let pc = Address(self.registers.pc.0.wrapping_sub(2));
                    let opcode = Opcode(0xF00A | (reg.0 as u16) << 8);
                    return Err(self.fault(pc, opcode, kind));
                }
                return Ok(self.state);
            }
            VmState::Running => (),
        }

        let pc = self.registers.pc;
        let opcode = match self.fetch() {
            Ok(opcode) => opcode,
            Err(kind) => return Err(self.fault(pc, Opcode(0), kind)),
        };
        let instruction = Instruction::decode(opcode);
        let before = self.observer.as_ref().map(|_| self.registers.values());

        if let Err(kind) = self.execute_instruction(&instruction) {
            return Err(self.fault(pc, opcode, kind));
        }

        if let (Some(observer), Some(before)) = (self.observer.as_mut(), before) {
            let after = self.registers.values();
            let register_changes = before
                .iter()
                .zip(after.iter())
                .enumerate()
                .filter(|(_, (old, new))| old != new)
                .map(|(reg, (old, new))| (Register(reg as u8), *old, *new))
                .collect();
            observer.on_cycle(&CycleEvent {
                pc,
                opcode,
                instruction,
                next_pc: self.registers.pc,
                index: self.registers.i,
                state: self.state,
                register_changes,
            });
        }
        Ok(self.state)
    }

    fn fetch(&self) -> Result<Opcode, VmError> {
        let pc = self.registers.pc.0 as usize;
        let high = self.memory.read(pc)?;
        let low = self.memory.read(pc + 1)?;
        Ok(Opcode::from_bytes(high, low))
    }

    fn fault(&mut self, pc: Address, opcode: Opcode, kind: VmError) -> Fault {
        self.state = VmState::Halted;
        let fault = Fault { pc, opcode, kind };
        log::error!("{}", fault);
        fault
    }

    /// Resumes once a key goes down that was not already held when the wait
    /// began.
    fn poll_key(&mut self, reg: Register) -> Result<(), VmError> {
        let keypad = self.lock_interface().keypad;
        if let Some(key) = keypad.newly_pressed(&mut self.wait_baseline) {
            self.registers.set(reg, key)?;
            self.state = VmState::Running;
            log::debug!("key {:X} pressed, resuming", key);
        }
        Ok(())
    }

    /// Clears the entire display of a running VM to black.
    fn clear_display(&mut self) {
        self.lock_interface().display.clear();
    }

    /// Returns to the instruction after the matching call.
    fn return_subroutine(&mut self) -> Result<(), VmError> {
        let call_site = self.registers.pop()?;
        self.registers.pc = call_site;
        self.registers.pc.advance();
        Ok(())
    }

    /// Calls a subroutine. The stack keeps the address of the call itself.
    fn call_subroutine(&mut self, call_site: Address, target: Address) -> Result<(), VmError> {
        self.registers.push(call_site)?;
        self.registers.pc = target;
        Ok(())
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.registers.pc.advance();
        }
    }

    /// Writes the flag first and the result last, so for `x == F` the result
    /// wins.
    fn set_with_flag(&mut self, reg: Register, value: u8, flag: bool) -> Result<(), VmError> {
        self.registers.set_flag(flag);
        self.registers.set(reg, value)
    }

    /// XORs an `n` row sprite from `I` onto the display at `(vx, vy)`, wrapping
    /// at the screen edges. VF reports whether any lit pixel was switched off.
    fn draw_sprite(&mut self, vx: Register, vy: Register, rows: Value) -> Result<(), VmError> {
        let x0 = self.registers.get(vx)? as u16;
        let y0 = self.registers.get(vy)? as u16;
        let sprite = self
            .memory
            .slice(self.registers.i.0 as usize, rows.0 as usize)?
            .to_vec();

        let mut collision = false;
        {
            let mut interface = self.lock_interface();
            for (y_off, row) in sprite.iter().enumerate() {
                let y = ((y0 + y_off as u16) % SCREEN_HEIGHT as u16) as u8;
                for x_off in 0..8u16 {
                    if row & (0x80 >> x_off) == 0 {
                        continue;
                    }
                    let x = ((x0 + x_off) % SCREEN_WIDTH as u16) as u8;
                    collision |= interface.display.toggle(x, y);
                }
            }
        }
        self.registers.set_flag(collision);
        Ok(())
    }

    /// Stores the hundreds, tens and ones of VX at I, I+1 and I+2.
    fn store_decimal(&mut self, vx: Register) -> Result<(), VmError> {
        let value = self.registers.get(vx)?;
        let i = self.registers.i.0 as usize;
        self.memory.write(i, value / 100)?;
        self.memory.write(i + 1, value / 10 % 10)?;
        self.memory.write(i + 2, value % 10)?;
        Ok(())
    }

    /// Executes a single instruction. The program counter moves past the
    /// instruction first, so jumps, calls and skips work on absolute targets.
    pub fn execute_instruction(&mut self, instruction: &Instruction) -> Result<(), VmError> {
        let current = self.registers.pc;
        self.registers.pc.advance();
        match *instruction {
            // Jumps
            Instruction::CallSubroutine(addr) => self.call_subroutine(current, addr)?,
            Instruction::ReturnSubroutine => self.return_subroutine()?,
            Instruction::Jump(addr) => self.registers.pc = addr,
            Instruction::JumpAdd(addr) => {
                let v0 = self.registers.get(Register(0))? as u16;
                self.registers.pc = Address(addr.0 + v0);
            }

            // Conditionals
            Instruction::SkipIfEqualConst(vx, n) => {
                let x = self.registers.get(vx)?;
                self.skip_if(x == n.0);
            }
            Instruction::SkipIfNotEqualConst(vx, n) => {
                let x = self.registers.get(vx)?;
                self.skip_if(x != n.0);
            }
            Instruction::SkipIfEqual(vx, vy) => {
                let x = self.registers.get(vx)?;
                let y = self.registers.get(vy)?;
                self.skip_if(x == y);
            }
            Instruction::SkipIfNotEqual(vx, vy) => {
                let x = self.registers.get(vx)?;
                let y = self.registers.get(vy)?;
                self.skip_if(x != y);
            }

            // Register Arithmetic
            Instruction::SetConst(vx, n) => self.registers.set(vx, n.0)?,
            Instruction::AddConst(vx, n) => {
                let x = self.registers.get(vx)?;
                self.registers.set(vx, x.wrapping_add(n.0))?;
            }
            Instruction::Set(vx, vy) => {
                let y = self.registers.get(vy)?;
                self.registers.set(vx, y)?;
            }
            Instruction::Or(vx, vy) => {
                let value = self.registers.get(vx)? | self.registers.get(vy)?;
                self.registers.set(vx, value)?;
            }
            Instruction::And(vx, vy) => {
                let value = self.registers.get(vx)? & self.registers.get(vy)?;
                self.registers.set(vx, value)?;
            }
            Instruction::Xor(vx, vy) => {
                let value = self.registers.get(vx)? ^ self.registers.get(vy)?;
                self.registers.set(vx, value)?;
            }
            Instruction::Add(vx, vy) => {
                let (sum, carry) = self.registers.get(vx)?.overflowing_add(self.registers.get(vy)?);
                self.set_with_flag(vx, sum, carry)?;
            }
            Instruction::Sub(vx, vy) => {
                let x = self.registers.get(vx)?;
                let y = self.registers.get(vy)?;
                self.set_with_flag(vx, x.wrapping_sub(y), x >= y)?;
            }
            Instruction::RightShift(vx) => {
                let x = self.registers.get(vx)?;
                self.set_with_flag(vx, x >> 1, x & 0x01 == 1)?;
            }
            Instruction::NegSub(vx, vy) => {
                let x = self.registers.get(vx)?;
                let y = self.registers.get(vy)?;
                self.set_with_flag(vx, y.wrapping_sub(x), y >= x)?;
            }
            Instruction::LeftShift(vx) => {
                let x = self.registers.get(vx)?;
                self.set_with_flag(vx, x << 1, (x >> 7) & 0x01 == 1)?;
            }

            // Key presses
            Instruction::SkipIfKey(vx) => {
                let key = self.registers.get(vx)?;
                let held = self.lock_interface().keypad.is_pressed(key);
                self.skip_if(held);
            }
            Instruction::SkipIfNotKey(vx) => {
                let key = self.registers.get(vx)?;
                let held = self.lock_interface().keypad.is_pressed(key);
                self.skip_if(!held);
            }
            Instruction::WaitKey(vx) => {
                self.registers.get(vx)?;
                let held = self.lock_interface().keypad;
                self.wait_baseline = held;
                self.state = VmState::WaitingForKey(vx);
                log::debug!("waiting for a key into V{:X}", vx.0);
            }

            // Graphics
            Instruction::Draw(vx, vy, n) => self.draw_sprite(vx, vy, n)?,
            Instruction::ClearDisplay => self.clear_display(),
            Instruction::SpriteAddr(vx) => {
                let digit = self.registers.get(vx)? as u16;
                self.registers.i = Address(FONT_OFFSET + digit * FONT_GLYPH_SIZE);
            }

            // Timers
            Instruction::GetDelayTimer(vx) => {
                let delay = self.lock_interface().timers.delay;
                self.registers.set(vx, delay)?;
            }
            Instruction::SetDelayTimer(vx) => {
                let x = self.registers.get(vx)?;
                self.lock_interface().timers.delay = x;
            }
            Instruction::SetSoundTimer(vx) => {
                let x = self.registers.get(vx)?;
                self.lock_interface().timers.sound = x;
            }

            // I register
            Instruction::SetI(addr) => self.registers.i = addr,
            Instruction::AddToI(vx) => {
                let x = self.registers.get(vx)? as u16;
                let i = self.registers.i;
                self.registers.i = i.offset(x).ok_or(VmError::OutOfBounds {
                    address: i.0 as usize + x as usize,
                })?;
            }
            Instruction::Decimal(vx) => self.store_decimal(vx)?,
            Instruction::StoreRegisters(vx) => {
                let index = self.registers.i.0 as usize;
                for r in 0..=vx.0 {
                    let value = self.registers.get(Register(r))?;
                    self.memory.write(index + r as usize, value)?;
                }
            }
            Instruction::LoadRegisters(vx) => {
                let index = self.registers.i.0 as usize;
                for r in 0..=vx.0 {
                    let value = self.memory.read(index + r as usize)?;
                    self.registers.set(Register(r), value)?;
                }
            }

            // Misc
            Instruction::Rand(vx, n) => {
                let random: u8 = self.rng.gen();
                self.registers.set(vx, random & n.0)?;
            }
            Instruction::Unknown(op) => match self.policy {
                OpcodePolicy::Permissive => log::debug!("ignoring unknown opcode {}", op),
                OpcodePolicy::Strict => return Err(VmError::UnknownOpcode(op.0)),
            },
        }
        Ok(())
    }
}

impl Default for VirtualMachine {
    fn default() -> Self {
        VirtualMachine::new()
    }
}
