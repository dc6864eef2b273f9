use super::basics::{Address, Register, Value};
use std::fmt;

/// One raw 16 bit instruction word.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Opcode(pub u16);

impl Opcode {
    pub fn from_bytes(high: u8, low: u8) -> Opcode {
        Opcode(u16::from_be_bytes([high, low]))
    }

    /// The four nibbles, most significant first.
    pub fn nibbles(self) -> (u8, u8, u8, u8) {
        let [a, b] = self.0.to_be_bytes();
        (a >> 4, a & 0x0F, b >> 4, b & 0x0F)
    }

    pub fn nnn(self) -> u16 {
        self.0 & 0x0FFF
    }

    pub fn nn(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    pub fn n(self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    pub fn x(self) -> u8 {
        ((self.0 & 0x0F00) >> 8) as u8
    }

    pub fn y(self) -> u8 {
        ((self.0 & 0x00F0) >> 4) as u8
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Instruction {
    ClearDisplay,
    ReturnSubroutine,
    Jump(Address),
    CallSubroutine(Address),
    SkipIfEqualConst(Register, Value),
    SkipIfNotEqualConst(Register, Value),
    SkipIfEqual(Register, Register),
    SetConst(Register, Value),
    AddConst(Register, Value),
    Set(Register, Register),
    Or(Register, Register),
    And(Register, Register),
    Xor(Register, Register),
    Add(Register, Register),
    Sub(Register, Register),
    RightShift(Register),
    NegSub(Register, Register),
    LeftShift(Register),
    SkipIfNotEqual(Register, Register),
    SetI(Address),
    JumpAdd(Address),
    Rand(Register, Value),
    Draw(Register, Register, Value),
    SkipIfKey(Register),
    SkipIfNotKey(Register),
    GetDelayTimer(Register),
    WaitKey(Register),
    SetDelayTimer(Register),
    SetSoundTimer(Register),
    AddToI(Register),
    SpriteAddr(Register),
    Decimal(Register),
    StoreRegisters(Register),
    LoadRegisters(Register),
    /// Anything outside the table, including `0NNN` machine code calls.
    Unknown(Opcode),
}

macro_rules! NNN {
    ($op:expr) => {
        Address($op.nnn())
    };
}

macro_rules! NN {
    ($op:expr) => {
        Value($op.nn())
    };
}

macro_rules! N {
    ($op:expr) => {
        Value($op.n())
    };
}

macro_rules! X {
    ($op:expr) => {
        Register($op.x())
    };
}

macro_rules! Y {
    ($op:expr) => {
        Register($op.y())
    };
}

impl Instruction {
    /// Never fails: words outside the instruction table decode to `Unknown`.
    pub fn decode(op: Opcode) -> Instruction {
        match op.nibbles() {
            (0x0, 0x0, 0xE, 0x0) => Instruction::ClearDisplay,
            (0x0, 0x0, 0xE, 0xE) => Instruction::ReturnSubroutine,
            (0x1, _, _, _) => Instruction::Jump(NNN!(op)),
            (0x2, _, _, _) => Instruction::CallSubroutine(NNN!(op)),
            (0x3, _, _, _) => Instruction::SkipIfEqualConst(X!(op), NN!(op)),
            (0x4, _, _, _) => Instruction::SkipIfNotEqualConst(X!(op), NN!(op)),
            (0x5, _, _, 0x0) => Instruction::SkipIfEqual(X!(op), Y!(op)),
            (0x6, _, _, _) => Instruction::SetConst(X!(op), NN!(op)),
            (0x7, _, _, _) => Instruction::AddConst(X!(op), NN!(op)),
            (0x8, _, _, 0x0) => Instruction::Set(X!(op), Y!(op)),
            (0x8, _, _, 0x1) => Instruction::Or(X!(op), Y!(op)),
            (0x8, _, _, 0x2) => Instruction::And(X!(op), Y!(op)),
            (0x8, _, _, 0x3) => Instruction::Xor(X!(op), Y!(op)),
            (0x8, _, _, 0x4) => Instruction::Add(X!(op), Y!(op)),
            (0x8, _, _, 0x5) => Instruction::Sub(X!(op), Y!(op)),
            (0x8, _, _, 0x6) => Instruction::RightShift(X!(op)),
            (0x8, _, _, 0x7) => Instruction::NegSub(X!(op), Y!(op)),
            (0x8, _, _, 0xE) => Instruction::LeftShift(X!(op)),
            (0x9, _, _, 0x0) => Instruction::SkipIfNotEqual(X!(op), Y!(op)),
            (0xA, _, _, _) => Instruction::SetI(NNN!(op)),
            (0xB, _, _, _) => Instruction::JumpAdd(NNN!(op)),
            (0xC, _, _, _) => Instruction::Rand(X!(op), NN!(op)),
            (0xD, _, _, _) => Instruction::Draw(X!(op), Y!(op), N!(op)),
            (0xE, _, 0x9, 0xE) => Instruction::SkipIfKey(X!(op)),
            (0xE, _, 0xA, 0x1) => Instruction::SkipIfNotKey(X!(op)),
            (0xF, _, 0x0, 0x7) => Instruction::GetDelayTimer(X!(op)),
            (0xF, _, 0x0, 0xA) => Instruction::WaitKey(X!(op)),
            (0xF, _, 0x1, 0x5) => Instruction::SetDelayTimer(X!(op)),
            (0xF, _, 0x1, 0x8) => Instruction::SetSoundTimer(X!(op)),
            (0xF, _, 0x1, 0xE) => Instruction::AddToI(X!(op)),
            (0xF, _, 0x2, 0x9) => Instruction::SpriteAddr(X!(op)),
            (0xF, _, 0x3, 0x3) => Instruction::Decimal(X!(op)),
            (0xF, _, 0x5, 0x5) => Instruction::StoreRegisters(X!(op)),
            (0xF, _, 0x6, 0x5) => Instruction::LoadRegisters(X!(op)),
            _ => Instruction::Unknown(op),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields() {
        let op = Opcode::from_bytes(0x12, 0x25);
        assert_eq!(op, Opcode(0x1225));
        assert_eq!(op.nnn(), 0x225);
        assert_eq!(op.nn(), 0x25);
        assert_eq!(op.n(), 0x5);
        assert_eq!(op.x(), 0x2);
        assert_eq!(op.y(), 0x2);
        assert_eq!(op.nibbles(), (0x1, 0x2, 0x2, 0x5));
        assert_eq!(op.to_string(), "1225");
    }

    #[test]
    fn test_decode_families() {
        assert_eq!(Instruction::decode(Opcode(0x00E0)), Instruction::ClearDisplay);
        assert_eq!(Instruction::decode(Opcode(0x00EE)), Instruction::ReturnSubroutine);
        assert_eq!(
            Instruction::decode(Opcode(0x2ABC)),
            Instruction::CallSubroutine(Address(0xABC))
        );
        assert_eq!(
            Instruction::decode(Opcode(0x8AB4)),
            Instruction::Add(Register(0xA), Register(0xB))
        );
        assert_eq!(
            Instruction::decode(Opcode(0x8A0E)),
            Instruction::LeftShift(Register(0xA))
        );
        assert_eq!(
            Instruction::decode(Opcode(0xD12F)),
            Instruction::Draw(Register(1), Register(2), Value(0xF))
        );
        assert_eq!(
            Instruction::decode(Opcode(0xE3A1)),
            Instruction::SkipIfNotKey(Register(3))
        );
        assert_eq!(
            Instruction::decode(Opcode(0xF565)),
            Instruction::LoadRegisters(Register(5))
        );
    }

    #[test]
    fn test_decode_unmatched() {
        for word in &[0x0000, 0x0123, 0x5121, 0x8128, 0x912F, 0xE1FF, 0xF1FF, 0xF000] {
            assert_eq!(
                Instruction::decode(Opcode(*word)),
                Instruction::Unknown(Opcode(*word)),
                "{:04X}",
                word
            );
        }
    }
}
