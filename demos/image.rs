use color_eyre::eyre::{eyre, Result};

use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use wordvm::assembler::assemble;
use wordvm::graphics::Resolution;
use wordvm::machine::Machine;

const SCREEN: Resolution = Resolution::new(16, 8);

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new().with_level(LevelFilter::Debug).init()?; // logging

    // go through the binary image, the way a program file would be loaded
    let image = assemble(include_str!("programs/image.asm"))?.to_bytes();
    info!("Image is {} bytes", image.len());

    let mut board = Machine::<0x1000>::new(SCREEN);
    board.boot(&image)?;

    let summary = board.run(100)?;
    if !summary.halted {
        return Err(eyre!("program did not halt"));
    }

    for row in board.front_buffer().chunks(SCREEN.width as usize) {
        let line: String = row
            .iter()
            .map(|&pixel| std::char::from_u32(pixel).filter(|c| c.is_ascii_graphic()).unwrap_or('.'))
            .collect();
        info!("{}", line);
    }

    Ok(())
}
