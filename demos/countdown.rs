use color_eyre::eyre::Result;

use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use wordvm::assembler::assemble;
use wordvm::machine::Machine;
use wordvm::processor::Step;
use wordvm::register::Register;

/// Where the stack lives, well away from the program
const STACK_SEGMENT: u32 = 0x800;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new().with_level(LevelFilter::Info).init()?; // logging

    let program = assemble(include_str!("programs/countdown.asm"))?;
    let count = program
        .symbols()
        .data_offset("count")
        .unwrap_or_default();

    let mut board = Machine::<0x1000>::default();
    board.load_program(program.words())?;
    board.processor.registers.set(Register::SS, STACK_SEGMENT);

    // the program never halts; the host steps it until the counter is spent
    loop {
        if board.step()? == Step::Halted {
            break;
        }

        let ds = board.processor.registers.get(Register::DS);
        let value = board.memory.read(ds + count)?;
        if board.processor.registers.get(Register::IP) == 0 {
            info!("count = {}", value);
            if value == 0 {
                break;
            }
        }
    }

    Ok(())
}
