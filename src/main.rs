use anyhow::Context;
use chip8::emulator::executor::Executor;
use chip8::emulator::vm::OpcodePolicy;
use chip8::rom_config::{self, RomConfig};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Runs a CHIP-8 program.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Program image, loaded at 0x200.
    rom: PathBuf,

    /// Timing and keyboard preset.
    #[arg(short, long, default_value = "default")]
    preset: String,

    /// Fault on opcodes outside the instruction set instead of skipping them.
    #[arg(long)]
    strict: bool,

    /// Pause between instructions, overriding the preset.
    #[arg(long, value_name = "MICROSECONDS")]
    instruction_sleep_us: Option<u64>,

    /// Run this many 60 Hz frames without a window and print the screen.
    #[arg(long)]
    frames: Option<usize>,

    /// Log every executed instruction at trace level.
    #[arg(long)]
    trace: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = rom_config::preset(&args.preset).with_context(|| {
        format!("available presets: {}", rom_config::preset_names().join(", "))
    })?;
    if args.strict {
        config.opcode_policy = OpcodePolicy::Strict;
    }
    if let Some(us) = args.instruction_sleep_us {
        config.instruction_sleep = Duration::from_micros(us);
    }

    let executor = rom_config::load_rom(&args.rom, &config, args.trace)
        .with_context(|| format!("failed to load {}", args.rom.display()))?;

    match args.frames {
        Some(frames) => run_headless(executor, frames),
        None => run_windowed(executor, &config),
    }
}

fn run_headless(mut executor: Executor, frames: usize) -> anyhow::Result<()> {
    let cycles = executor.cycles_per_frame();
    let result = executor.run_frames(frames, cycles);
    chip8::emulator::ascii_display::draw_vm_display(executor.vm());
    let state = result?;
    log::info!("stopped after {} frames in state {:?}", frames, state);
    Ok(())
}

#[cfg(feature = "visualizer")]
fn run_windowed(executor: Executor, config: &RomConfig) -> anyhow::Result<()> {
    use chip8::visualizer::Visualizer;
    use std::sync::{Arc, Mutex};

    let visualizer = Visualizer::new(executor.vm().interface.clone(), config);
    visualizer.wait_for_init();
    let handle = executor.run_concurrent_until(Arc::new(Mutex::new(false)));
    visualizer.wait_for_close();
    handle.join()?;
    Ok(())
}

#[cfg(not(feature = "visualizer"))]
fn run_windowed(_executor: Executor, _config: &RomConfig) -> anyhow::Result<()> {
    anyhow::bail!("built without the `visualizer` feature, pass --frames to run headless")
}
