use super::basics::Address;
use super::program::Opcode;
use thiserror::Error;

/// Conditions that stop the interpreter.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum VmError {
    #[error("memory access out of bounds at {address:#06X}")]
    OutOfBounds { address: usize },
    #[error("register index {0} out of range")]
    InvalidRegister(u8),
    #[error("key {0:#X} out of range")]
    InvalidKey(u8),
    #[error("call stack overflow")]
    StackOverflow,
    #[error("return with an empty call stack")]
    StackUnderflow,
    #[error("unknown opcode {0:#06X}")]
    UnknownOpcode(u16),
    #[error("program image is {size} bytes, at most {max} fit into memory")]
    ImageTooLarge { size: usize, max: usize },
}

/// A fatal error together with the instruction that raised it.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("fault at {:#05X} while executing {:#06X}: {kind}", .pc.0, .opcode.0)]
pub struct Fault {
    pub pc: Address,
    pub opcode: Opcode,
    #[source]
    pub kind: VmError,
}
