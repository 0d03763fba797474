use color_eyre::eyre::{Result, WrapErr};
use log::*;

use crate::error::MachineError;
use crate::graphics::{GraphicsUnit, Resolution};
use crate::memory::{Memory, Word};
use crate::processor::{Processor, Step};
use crate::register::Register;

/// The standard board: 16 Mi words of memory
pub type StdMachine = Machine<0x100_0000>;

/// Everything the processor is wired to
#[derive(Debug, Clone)]
pub struct Machine<const S: usize> {
    pub processor: Processor,
    pub memory: Memory<S>,
    pub gpu: GraphicsUnit,
}

/// How a bounded run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Instructions executed, not counting the final `HALT`
    pub steps: usize,
    pub halted: bool,
}

impl<const S: usize> Default for Machine<S> {
    fn default() -> Self {
        Self::new(Resolution::DEFAULT)
    }
}

impl<const S: usize> Machine<S> {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            processor: Processor::default(),
            memory: Memory::default(),
            gpu: GraphicsUnit::new(resolution),
        }
    }

    /// Places `words` at address 0, where execution starts
    pub fn load_program(&mut self, words: &[Word]) -> Result<(), MachineError> {
        self.memory.write_array(0, words)
    }

    /// Loads a big endian program image at address 0
    pub fn boot(&mut self, image: &[u8]) -> Result<usize, MachineError> {
        self.memory.load_image(image)
    }

    /// Runs one instruction. Hosts call this at whatever pace they redraw.
    pub fn step(&mut self) -> Result<Step, MachineError> {
        self.processor.step(&mut self.memory, &mut self.gpu)
    }

    /// Back to power on: registers, memory and both framebuffers are zeroed
    pub fn reset(&mut self) {
        self.processor.reset(&mut self.memory);
        self.gpu.clear();
    }

    /// The buffer a display should show
    pub fn front_buffer(&self) -> &[Word] {
        self.gpu.front_buffer()
    }

    /// Steps until `HALT` is reached or `max_steps` instructions ran
    pub fn run(&mut self, max_steps: usize) -> Result<RunSummary> {
        for steps in 0..max_steps {
            let step = self.step().wrap_err_with(|| {
                let registers = &self.processor.registers;
                format!(
                    "Execution failed at step {} (CS 0x{:x}, IP 0x{:x})",
                    steps,
                    registers.get(Register::CS),
                    registers.get(Register::IP)
                )
            })?;

            if step == Step::Halted {
                info!("Program halted after {} steps", steps);
                return Ok(RunSummary {
                    steps,
                    halted: true,
                });
            }
        }

        info!("Step limit of {} reached", max_steps);
        Ok(RunSummary {
            steps: max_steps,
            halted: false,
        })
    }
}
