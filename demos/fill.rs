use color_eyre::eyre::Result;

use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use wordvm::assembler::assemble;
use wordvm::graphics::Resolution;
use wordvm::machine::Machine;
use wordvm::memory::Word;

const SCREEN: Resolution = Resolution::new(16, 8);

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new().with_level(LevelFilter::Info).init()?; // logging

    let program = assemble(include_str!("programs/fill.asm"))?;

    let mut board = Machine::<0x1000>::new(SCREEN);
    board.load_program(program.words())?;
    board.run(100)?;

    show(board.front_buffer());

    Ok(())
}

/// Prints every pixel as the character its value encodes
fn show(buffer: &[Word]) {
    for row in buffer.chunks(SCREEN.width as usize) {
        let line: String = row
            .iter()
            .map(|&pixel| match pixel {
                0 => '.',
                _ => std::char::from_u32(pixel).unwrap_or('?'),
            })
            .collect();
        info!("{}", line);
    }
}
