use std::convert::TryFrom;

use crate::error::{MachineError, Result};
use crate::graphics::GraphicsUnit;
use crate::isa::{self, Decoded, Opcode, OperandKind, MAX_OPERANDS};
use crate::memory::{segmented, Memory, Word};
use crate::register::{Register, RegisterFile};
use log::*;

/// Flags after reset. No instruction changes them yet.
pub const INITIAL_FLAGS: Word = 0x0000_0001;

/// How to treat words that decode but do nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// Unknown opcodes and `CMP` are no-ops after the fetch
    Lenient,
    /// Unknown opcodes and `CMP` fail with [`MachineError::UnimplementedOpcode`]
    Strict,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        Self::Lenient
    }
}

/// What a single step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Sitting on `HALT`, nothing changed
    Halted,
    /// The word at `CS:IP` was executed
    Executed { opcode: Word },
}

/// Emulates a CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Processor {
    pub registers: RegisterFile,
    /// Status flags, see [`INITIAL_FLAGS`]
    pub flags: Word,
    pub mode: ExecutionMode,
}

impl Default for Processor {
    /// Initializes a new CPU
    fn default() -> Self {
        Self::new(RegisterFile::default())
    }
}

impl Processor {
    /// Initializes a new CPU starting from `registers`
    pub fn new(registers: RegisterFile) -> Self {
        Self {
            registers,
            flags: INITIAL_FLAGS,
            mode: ExecutionMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Zeroes the registers, restores the flags and clears `memory`
    pub fn reset<const S: usize>(&mut self, memory: &mut Memory<S>) {
        self.registers.reset();
        self.flags = INITIAL_FLAGS;
        memory.reset();
    }

    /// Runs one fetch, decode and execute cycle.
    ///
    /// `IP` is moved past the instruction before it takes effect, so jumps and
    /// calls see the address of the following instruction.
    pub fn step<const S: usize>(
        &mut self,
        memory: &mut Memory<S>,
        gpu: &mut GraphicsUnit,
    ) -> Result<Step> {
        let ip = self.registers.get(Register::IP);
        let address = segmented(self.registers.get(Register::CS), ip)?;
        let opcode = memory.read(address)?;

        let count = isa::operand_count(opcode);
        let mut operands = [0; MAX_OPERANDS];
        if count > 0 {
            let words = memory.read_slice(segmented(address, 1)?, count as Word)?;
            operands[..count].copy_from_slice(words);
        }

        if opcode == Opcode::Halt as Word {
            trace!("HALT at 0x{:x}", address);
            return Ok(Step::Halted);
        }

        debug!(
            "0x{:x}: {}",
            address,
            Decoded {
                opcode,
                operands: &operands[..count]
            }
        );

        self.registers
            .set(Register::IP, ip.wrapping_add(1 + count as Word));

        match Opcode::try_from(opcode) {
            Ok(Opcode::CmpRR) | Err(_) => self.unimplemented(opcode, address)?,
            Ok(instruction) => self.execute_instruction(instruction, operands, memory, gpu)?,
        }

        Ok(Step::Executed { opcode })
    }

    /// Applies the effect of an already fetched instruction
    fn execute_instruction<const S: usize>(
        &mut self,
        instruction: Opcode,
        f: [Word; MAX_OPERANDS],
        memory: &mut Memory<S>,
        gpu: &mut GraphicsUnit,
    ) -> Result<()> {
        use Opcode::*;

        match instruction {
            // HALT never gets here, CMP has no flags to set
            Halt | CmpRR => {}
            MovRR | MovRM | MovRC | LeaRM => {
                let value = match instruction {
                    // LEA takes the offset itself
                    LeaRM => f[1],
                    _ => self.source(instruction, 1, f, memory)?,
                };
                self.registers.write(f[0], value)?;
            }
            MovMR | MovMC => {
                let value = self.source(instruction, 1, f, memory)?;
                self.store(memory, f[0], value)?;
            }
            AddRR | AddRM | AddRC => {
                let value = self.source(instruction, 1, f, memory)?;
                self.registers.update(f[0], |r| r.wrapping_add(value))?;
            }
            AddMR | AddMC => {
                let value = self.source(instruction, 1, f, memory)?;
                self.modify(memory, f[0], |m| m.wrapping_add(value))?;
            }
            SubRR | SubRM | SubRC => {
                let value = self.source(instruction, 1, f, memory)?;
                self.registers.update(f[0], |r| r.wrapping_sub(value))?;
            }
            SubMR | SubMC => {
                let value = self.source(instruction, 1, f, memory)?;
                self.modify(memory, f[0], |m| m.wrapping_sub(value))?;
            }
            IncR => self.registers.update(f[0], |r| r.wrapping_add(1))?,
            IncM => self.modify(memory, f[0], |m| m.wrapping_add(1))?,
            DecR => self.registers.update(f[0], |r| r.wrapping_sub(1))?,
            DecM => self.modify(memory, f[0], |m| m.wrapping_sub(1))?,
            PushR | PushM | PushC => {
                let value = self.source(instruction, 0, f, memory)?;
                self.push(memory, value)?;
            }
            PopR => {
                let value = self.pop(memory)?;
                self.registers.write(f[0], value)?;
            }
            PopM => {
                let value = self.pop(memory)?;
                self.store(memory, f[0], value)?;
            }
            Call => {
                self.push(memory, self.registers.get(Register::IP))?;
                self.registers.set(Register::IP, f[0]);
            }
            Ret => {
                let ip = self.pop(memory)?;
                self.registers.set(Register::IP, ip);
            }
            Jmpc => {
                self.registers.set(Register::CS, f[0]);
                self.registers.set(Register::IP, 0);
            }
            GmovR => {
                let value = self.registers.read(f[0])?;
                gpu.fill_buffer(&[value])?;
            }
            GmovMM | GmovMC => {
                let len = self.source(instruction, 1, f, memory)?;
                let start = segmented(self.registers.get(Register::DS), f[0])?;
                gpu.fill_buffer(memory.read_slice(start, len)?)?;
            }
            GposRR | GposRM | GposMR | GposMM | GposRC | GposMC | GposCC | GposCM | GposCR => {
                let x = self.source(instruction, 0, f, memory)?;
                let y = self.source(instruction, 1, f, memory)?;
                gpu.position(x, y);
            }
            GselectRR | GselectRM | GselectMR | GselectMM | GselectRC | GselectMC | GselectCC
            | GselectCM | GselectCR => {
                let width = self.source(instruction, 0, f, memory)?;
                let height = self.source(instruction, 1, f, memory)?;
                gpu.select(width, height);
            }
            GsetR | GsetM | GsetC => {
                let color = self.source(instruction, 0, f, memory)?;
                gpu.set(color)?;
            }
            Greset => gpu.reset(),
            Gflip => gpu.flip(),
        }

        Ok(())
    }

    fn unimplemented(&self, opcode: Word, address: Word) -> Result<()> {
        match self.mode {
            ExecutionMode::Lenient => {
                warn!("Opcode 0x{:02X} at 0x{:x} has no effect", opcode, address);
                Ok(())
            }
            ExecutionMode::Strict => Err(MachineError::UnimplementedOpcode { opcode, address }),
        }
    }

    /// Reads operand `index` according to the kind the instruction's
    /// signature gives it.
    fn source<const S: usize>(
        &self,
        instruction: Opcode,
        index: usize,
        f: [Word; MAX_OPERANDS],
        memory: &Memory<S>,
    ) -> Result<Word> {
        let kind = instruction.signatures()[0]
            .chars()
            .nth(index)
            .and_then(OperandKind::from_code);

        match kind {
            Some(OperandKind::Register) => self.registers.read(f[index]),
            Some(OperandKind::Memory) => self.load(memory, f[index]),
            _ => Ok(f[index]),
        }
    }

    /// Reads `DS + offset`
    fn load<const S: usize>(&self, memory: &Memory<S>, offset: Word) -> Result<Word> {
        memory.read(segmented(self.registers.get(Register::DS), offset)?)
    }

    /// Writes `DS + offset`
    fn store<const S: usize>(&self, memory: &mut Memory<S>, offset: Word, value: Word) -> Result<()> {
        memory.write(segmented(self.registers.get(Register::DS), offset)?, value)
    }

    fn modify<const S: usize, F>(&self, memory: &mut Memory<S>, offset: Word, f: F) -> Result<()>
    where
        F: FnOnce(Word) -> Word,
    {
        let value = self.load(memory, offset)?;
        self.store(memory, offset, f(value))
    }

    /// Increments `SP`, then writes to `SS + SP`. `SS + 0` is never used.
    fn push<const S: usize>(&mut self, memory: &mut Memory<S>, value: Word) -> Result<()> {
        let sp = self.registers.get(Register::SP).wrapping_add(1);
        self.registers.set(Register::SP, sp);
        memory.write(segmented(self.registers.get(Register::SS), sp)?, value)
    }

    /// Reads `SS + SP`, then decrements `SP`
    fn pop<const S: usize>(&mut self, memory: &Memory<S>) -> Result<Word> {
        let sp = self.registers.get(Register::SP);
        let value = memory.read(segmented(self.registers.get(Register::SS), sp)?)?;
        self.registers.set(Register::SP, sp.wrapping_sub(1));
        Ok(value)
    }
}
