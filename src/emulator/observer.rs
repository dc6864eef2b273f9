use super::basics::{Address, Register};
use super::program::{Instruction, Opcode};
use super::vm::VmState;

/// What happened during one fetch/decode/execute cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleEvent {
    pub pc: Address,
    pub opcode: Opcode,
    pub instruction: Instruction,
    pub next_pc: Address,
    pub index: Address,
    pub state: VmState,
    /// `(register, before, after)` for every general register that changed.
    pub register_changes: Vec<(Register, u8, u8)>,
}

/// Hook for tracing execution without the interpreter printing anything
/// itself.
pub trait CycleObserver: Send {
    fn on_cycle(&mut self, event: &CycleEvent);
}

/// Forwards every cycle to `log::trace!`.
#[derive(Default)]
pub struct LogObserver;

impl CycleObserver for LogObserver {
    fn on_cycle(&mut self, event: &CycleEvent) {
        let op = event.opcode;
        log::trace!(
            "{:#05X} {} nnn={:03X} nn={:02X} n={:X} x={:X} y={:X} {:?} -> pc={:#05X} i={:#05X} {:?}",
            event.pc.0,
            op,
            op.nnn(),
            op.nn(),
            op.n(),
            op.x(),
            op.y(),
            event.instruction,
            event.next_pc.0,
            event.index.0,
            event.state,
        );
        for (reg, before, after) in &event.register_changes {
            log::trace!("  V{:X}: {:#04X} -> {:#04X}", reg.0, before, after);
        }
    }
}
