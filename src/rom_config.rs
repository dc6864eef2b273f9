use crate::emulator::basics::MAX_PROGRAM_SIZE;
use crate::emulator::display::BufferedDisplay;
use crate::emulator::error::VmError;
use crate::emulator::executor::{Executor, TIMER_INTERVAL};
use crate::emulator::observer::LogObserver;
use crate::emulator::vm::{OpcodePolicy, VirtualMachine};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::{fs, io, path::Path, time::Duration};
use thiserror::Error;

/// How to run a particular program.
#[derive(Clone, Debug, PartialEq)]
pub struct RomConfig {
    /// Frames a switched off pixel keeps glowing.
    pub display_fade: u32,
    pub instruction_sleep: Duration,
    pub timer_interval: Duration,
    /// CHIP-8 key to keyboard character.
    pub keymap: HashMap<u8, char>,
    pub opcode_policy: OpcodePolicy,
}

impl RomConfig {
    /// The CHIP-8 key bound to a keyboard character.
    pub fn key_for_char(&self, c: char) -> Option<u8> {
        let c = c.to_ascii_lowercase();
        self.keymap
            .iter()
            .find(|(_, bound)| **bound == c)
            .map(|(key, _)| *key)
    }
}

impl Default for RomConfig {
    fn default() -> Self {
        PRESETS["default"].clone()
    }
}

lazy_static! {
    /// Keys labelled like the hex digits they stand for.
    pub static ref DEFAULT_KEYMAP: HashMap<u8, char> = vec![
        (0x0, '0'),
        (0x1, '1'),
        (0x2, '2'),
        (0x3, '3'),
        (0x4, '4'),
        (0x5, '5'),
        (0x6, '6'),
        (0x7, '7'),
        (0x8, '8'),
        (0x9, '9'),
        (0xA, 'a'),
        (0xB, 'b'),
        (0xC, 'c'),
        (0xD, 'd'),
        (0xE, 'e'),
        (0xF, 'f'),
    ]
    .into_iter()
    .collect();

    /// The COSMAC VIP keypad laid over the left of a QWERTY keyboard:
    ///
    /// ```text
    /// 1 2 3 C      1 2 3 4
    /// 4 5 6 D      Q W E R
    /// 7 8 9 E      A S D F
    /// A 0 B F      Z X C V
    /// ```
    pub static ref COSMAC_KEYMAP: HashMap<u8, char> = vec![
        (0x1, '1'),
        (0x2, '2'),
        (0x3, '3'),
        (0xC, '4'),
        (0x4, 'q'),
        (0x5, 'w'),
        (0x6, 'e'),
        (0xD, 'r'),
        (0x7, 'a'),
        (0x8, 's'),
        (0x9, 'd'),
        (0xE, 'f'),
        (0xA, 'z'),
        (0x0, 'x'),
        (0xB, 'c'),
        (0xF, 'v'),
    ]
    .into_iter()
    .collect();
}

lazy_static! {
    static ref PRESETS: HashMap<&'static str, RomConfig> = vec![
        ("default", RomConfig {
            display_fade: 3,
            instruction_sleep: Duration::from_millis(2),
            timer_interval: TIMER_INTERVAL,
            keymap: COSMAC_KEYMAP.clone(),
            opcode_policy: OpcodePolicy::Permissive,
        }),
        ("hex", RomConfig {
            display_fade: 3,
            instruction_sleep: Duration::from_millis(2),
            timer_interval: TIMER_INTERVAL,
            keymap: DEFAULT_KEYMAP.clone(),
            opcode_policy: OpcodePolicy::Permissive,
        }),
        ("15puzzle", RomConfig {
            display_fade: 1,
            instruction_sleep: Duration::from_micros(100),
            timer_interval: TIMER_INTERVAL,
            keymap: COSMAC_KEYMAP.clone(),
            opcode_policy: OpcodePolicy::Permissive,
        }),
        ("blinky", RomConfig {
            display_fade: 1,
            instruction_sleep: Duration::from_millis(1),
            timer_interval: TIMER_INTERVAL,
            keymap: vec![(0x3, 'w'), (0x6, 's'), (0x7, 'a'), (0x8, 'd')]
                .into_iter()
                .collect(),
            opcode_policy: OpcodePolicy::Permissive,
        }),
        ("brix", RomConfig {
            display_fade: 3,
            instruction_sleep: Duration::from_millis(2),
            timer_interval: TIMER_INTERVAL,
            keymap: vec![(0x4, 'a'), (0x6, 'd')].into_iter().collect(),
            opcode_policy: OpcodePolicy::Permissive,
        }),
        ("connect4", RomConfig {
            display_fade: 3,
            instruction_sleep: Duration::from_millis(15),
            timer_interval: TIMER_INTERVAL,
            keymap: vec![(0x4, 'a'), (0x5, 's'), (0x6, 'd')].into_iter().collect(),
            opcode_policy: OpcodePolicy::Permissive,
        }),
        ("invaders", RomConfig {
            display_fade: 3,
            instruction_sleep: Duration::from_millis(2),
            timer_interval: TIMER_INTERVAL,
            keymap: vec![(0x4, 'a'), (0x5, 'w'), (0x6, 'd')].into_iter().collect(),
            opcode_policy: OpcodePolicy::Permissive,
        }),
        ("pong", RomConfig {
            display_fade: 3,
            instruction_sleep: Duration::from_millis(2),
            timer_interval: TIMER_INTERVAL,
            keymap: vec![(0x1, '1'), (0x4, 'q'), (0xC, '4'), (0xD, 'r')]
                .into_iter()
                .collect(),
            opcode_policy: OpcodePolicy::Permissive,
        }),
        ("tetris", RomConfig {
            display_fade: 2,
            instruction_sleep: Duration::from_millis(2),
            timer_interval: TIMER_INTERVAL,
            keymap: vec![(0x4, 'w'), (0x5, 'a'), (0x6, 'd'), (0x7, 's')]
                .into_iter()
                .collect(),
            opcode_policy: OpcodePolicy::Permissive,
        }),
    ]
    .into_iter()
    .collect();
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Vm(#[from] VmError),
    #[error("unknown preset {0:?}")]
    UnknownPreset(String),
}

pub fn preset(name: &str) -> Result<RomConfig, LoadError> {
    PRESETS
        .get(name)
        .cloned()
        .ok_or_else(|| LoadError::UnknownPreset(name.to_string()))
}

pub fn preset_names() -> Vec<&'static str> {
    let mut names: Vec<_> = PRESETS.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Reads a raw program image, refusing anything that would not fit between
/// 0x200 and the end of memory.
pub fn load_rom_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    let raw_rom = fs::read(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if raw_rom.len() > MAX_PROGRAM_SIZE {
        return Err(VmError::ImageTooLarge {
            size: raw_rom.len(),
            max: MAX_PROGRAM_SIZE,
        }
        .into());
    }
    Ok(raw_rom)
}

/// Sets up a machine for `path` according to `config`, ready to run.
pub fn load_rom(path: &Path, config: &RomConfig, trace: bool) -> Result<Executor, LoadError> {
    let raw_rom = load_rom_file(path)?;
    let mut vm = VirtualMachine::with_program(&raw_rom)?;
    vm.set_display(Box::new(BufferedDisplay::new(config.display_fade)));
    vm.set_opcode_policy(config.opcode_policy);
    if trace {
        vm.set_observer(Some(Box::new(LogObserver)));
    }
    log::info!("loaded {} ({} bytes)", path.display(), raw_rom.len());
    Ok(Executor::new(config.instruction_sleep, config.timer_interval, vm))
}
