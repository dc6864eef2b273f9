use super::error::Fault;
use super::vm::{VirtualMachine, VmState};
use std::{
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
    time::Duration,
};

pub const INSTRUCTION_SLEEP: Duration = Duration::from_millis(2);
pub const TIMER_INTERVAL: Duration = Duration::from_micros(16667);

/// Drives a `VirtualMachine`: instructions at one pace, the timers at 60 Hz.
pub struct Executor {
    instruction_sleep: Duration,
    timer_interval: Duration,
    vm: VirtualMachine,
}

/// Threads started by `Executor::run_concurrent_until`.
pub struct ExecutorHandle {
    stopper: Arc<Mutex<bool>>,
    vm_thread: JoinHandle<Result<(), Fault>>,
    timer_thread: JoinHandle<()>,
}

impl ExecutorHandle {
    pub fn stop(&self) {
        *self.stopper.lock().unwrap_or_else(|e| e.into_inner()) = true;
    }

    pub fn is_finished(&self) -> bool {
        self.vm_thread.is_finished()
    }

    /// Stops both threads and reports how the machine ended.
    pub fn join(self) -> Result<(), Fault> {
        self.stop();
        let _ = self.timer_thread.join();
        match self.vm_thread.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

fn stopped(stopper: &Mutex<bool>) -> bool {
    *stopper.lock().unwrap_or_else(|e| e.into_inner())
}

impl Executor {
    pub fn new(instruction_sleep: Duration, timer_interval: Duration, vm: VirtualMachine) -> Executor {
        Executor {
            instruction_sleep,
            timer_interval,
            vm,
        }
    }

    pub fn vm(&self) -> &VirtualMachine {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut VirtualMachine {
        &mut self.vm
    }

    /// Runs the machine on its own thread and the timers on another until
    /// `stopper` is set, the machine halts or it faults. Stopping halts the
    /// machine.
    pub fn run_concurrent_until(self, stopper: Arc<Mutex<bool>>) -> ExecutorHandle {
        let Executor {
            instruction_sleep,
            timer_interval,
            mut vm,
        } = self;

        let interface = vm.interface.clone();
        let timer_stopper = stopper.clone();
        let timer_thread = thread::spawn(move || loop {
            if stopped(&timer_stopper) {
                break;
            }
            interface
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .timers
                .tick();
            thread::sleep(timer_interval);
        });

        let vm_stopper = stopper.clone();
        let vm_thread = thread::spawn(move || {
            let result = loop {
                if stopped(&vm_stopper) {
                    vm.halt();
                    break Ok(());
                }
                match vm.step() {
                    Ok(VmState::Halted) => break Ok(()),
                    Ok(_) => (),
                    Err(fault) => break Err(fault),
                }
                thread::sleep(instruction_sleep);
            };
            // the timer thread has nothing left to count down for
            *vm_stopper.lock().unwrap_or_else(|e| e.into_inner()) = true;
            result
        });

        ExecutorHandle {
            stopper,
            vm_thread,
            timer_thread,
        }
    }

    /// Deterministic single threaded run: every frame executes
    /// `cycles_per_frame` cycles and then ticks the timers once.
    pub fn run_frames(&mut self, frames: usize, cycles_per_frame: usize) -> Result<VmState, Fault> {
        for _ in 0..frames {
            for _ in 0..cycles_per_frame {
                if self.vm.step()? == VmState::Halted {
                    return Ok(VmState::Halted);
                }
            }
            self.vm.tick_timers();
        }
        Ok(self.vm.state())
    }

    /// Cycles per 60 Hz frame at the configured instruction pace.
    pub fn cycles_per_frame(&self) -> usize {
        let sleep = self.instruction_sleep.as_micros().max(1);
        ((self.timer_interval.as_micros() / sleep) as usize).max(1)
    }
}
