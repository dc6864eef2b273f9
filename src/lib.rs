pub mod emulator;
pub mod rom_config;
#[cfg(feature = "visualizer")]
pub mod visualizer;
