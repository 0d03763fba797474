//! Double buffered framebuffer driven by the graphics opcodes. Commands draw
//! into the back buffer; [`GraphicsUnit::flip`] swaps the two.

use std::iter;

use crate::error::{Domain, MachineError, Result};
use crate::memory::Word;

/// Size of the screen in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: Word,
    pub height: Word,
}

impl Resolution {
    pub const DEFAULT: Self = Self {
        width: 800,
        height: 600,
    };

    pub const fn new(width: Word, height: Word) -> Self {
        Self { width, height }
    }

    pub fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Pixel store behind the `G*` opcodes.
///
/// Pixel `(x, y)` lives at index `y * width + x` of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicsUnit {
    resolution: Resolution,
    buffers: [Vec<Word>; 2],
    /// Slot currently presented
    front: usize,
    position: Option<(Word, Word)>,
    selection: Option<(Word, Word)>,
}

impl Default for GraphicsUnit {
    fn default() -> Self {
        Self::new(Resolution::DEFAULT)
    }
}

impl GraphicsUnit {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            buffers: [vec![0; resolution.pixels()], vec![0; resolution.pixels()]],
            front: 0,
            position: None,
            selection: None,
        }
    }

    /// Current cursor, if one was set
    pub fn cursor(&self) -> Option<(Word, Word)> {
        self.position
    }

    /// Current selection size, if one was set
    pub fn selection(&self) -> Option<(Word, Word)> {
        self.selection
    }

    /// Moves the cursor. The selection is left alone.
    pub fn position(&mut self, x: Word, y: Word) {
        log::debug!("GPU position ({}, {})", x, y);
        self.position = Some((x, y));
    }

    /// Sets the selection size, putting the cursor at the origin if it was
    /// never placed.
    pub fn select(&mut self, width: Word, height: Word) {
        log::debug!("GPU select {}x{}", width, height);
        self.selection = Some((width, height));
        self.position.get_or_insert((0, 0));
    }

    /// Forgets cursor and selection
    pub fn reset(&mut self) {
        self.position = None;
        self.selection = None;
    }

    /// Paints with `color`.
    ///
    /// - nothing placed: the first pixel of the back buffer
    /// - cursor and selection: the selected rectangle
    /// - cursor only: [`MachineError::PositionWithoutSelection`]
    pub fn set(&mut self, color: Word) -> Result<()> {
        match (self.position, self.selection) {
            (None, _) => self.write_back(0, 0, color),
            (Some(_), None) => Err(MachineError::PositionWithoutSelection),
            (Some(_), Some((width, height))) => {
                log::debug!("GPU set 0x{:08X}", color);
                let count = (width as usize).saturating_mul(height as usize);
                self.fill(iter::repeat(color).take(count), count)
            }
        }
    }

    /// Writes `values` row by row starting at the cursor.
    ///
    /// Rows are as wide as the selection, or as `values` when nothing is
    /// selected. Writing stops once the row index is past the selection
    /// height, so a selection of height `h` accepts `h + 1` rows.
    pub fn fill_buffer(&mut self, values: &[Word]) -> Result<()> {
        self.fill(values.iter().copied(), values.len())
    }

    fn fill<I>(&mut self, values: I, len: usize) -> Result<()>
    where
        I: IntoIterator<Item = Word>,
    {
        let (x, y) = self.position.unwrap_or((0, 0));
        let (width, height) = match self.selection {
            Some((width, height)) => (width as u64, height as u64),
            None => (len as u64, 0),
        };

        let mut column = 0u64;
        let mut row = 0u64;
        for value in values {
            if column >= width {
                row += 1;
                column = 0;
            }
            if row > height {
                break;
            }

            self.write_back(x as u64 + column, y as u64 + row, value)?;
            column += 1;
        }

        Ok(())
    }

    fn write_back(&mut self, x: u64, y: u64, value: Word) -> Result<()> {
        let Resolution { width, height } = self.resolution;
        if x >= width as u64 || y >= height as u64 {
            return Err(MachineError::out_of_bounds(
                Domain::Framebuffer,
                y.saturating_mul(width as u64).saturating_add(x),
            ));
        }

        let index = (y * width as u64 + x) as usize;
        self.back_buffer_mut()[index] = value;

        Ok(())
    }

    /// Presents the back buffer and starts drawing into the old front one
    pub fn flip(&mut self) {
        self.front = 1 - self.front;
    }

    /// Zeroes both buffers and goes back to the power on state
    pub fn clear(&mut self) {
        for buffer in self.buffers.iter_mut() {
            buffer.iter_mut().for_each(|pixel| *pixel = 0);
        }
        self.front = 0;
        self.reset();
    }

    /// The buffer to present
    pub fn front_buffer(&self) -> &[Word] {
        &self.buffers[self.front]
    }

    /// The buffer commands draw into
    pub fn back_buffer(&self) -> &[Word] {
        &self.buffers[self.back_slot()]
    }

    /// Which of the two buffer slots is currently the back buffer
    pub fn back_slot(&self) -> usize {
        1 - self.front
    }

    /// Reads a pixel of the back buffer
    pub fn back_pixel(&self, x: Word, y: Word) -> Option<Word> {
        if x >= self.resolution.width || y >= self.resolution.height {
            return None;
        }
        self.back_buffer()
            .get(y as usize * self.resolution.width as usize + x as usize)
            .copied()
    }

    fn back_buffer_mut(&mut self) -> &mut [Word] {
        let slot = self.back_slot();
        &mut self.buffers[slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::Result;

    fn small() -> GraphicsUnit {
        GraphicsUnit::new(Resolution::new(8, 6))
    }

    #[test]
    fn test_set_without_position() -> Result<()> {
        let mut gpu = small();
        gpu.set(0xFF)?;

        assert_eq!(gpu.back_buffer()[0], 0xFF);
        assert_eq!(gpu.back_buffer().iter().filter(|p| **p != 0).count(), 1);

        Ok(())
    }

    #[test]
    fn test_set_selection() -> Result<()> {
        let mut gpu = small();
        gpu.position(2, 1);
        gpu.select(3, 2);
        gpu.set(7)?;

        for y in 0..6 {
            for x in 0..8 {
                let inside = (2..5).contains(&x) && (1..3).contains(&y);
                assert_eq!(gpu.back_pixel(x, y), Some(if inside { 7 } else { 0 }));
            }
        }

        Ok(())
    }

    #[test]
    fn test_select_defaults_position() -> Result<()> {
        let mut gpu = small();
        gpu.select(2, 2);

        assert_eq!(gpu.cursor(), Some((0, 0)));

        gpu.position(4, 4);
        gpu.select(1, 1);
        assert_eq!(gpu.cursor(), Some((4, 4)));

        Ok(())
    }

    #[test]
    fn test_set_position_without_selection() -> Result<()> {
        let mut gpu = small();
        gpu.position(1, 1);

        assert_eq!(gpu.set(3), Err(MachineError::PositionWithoutSelection));
        assert!(gpu.back_buffer().iter().all(|p| *p == 0));

        Ok(())
    }

    #[test]
    fn test_reset_forgets_cursor() -> Result<()> {
        let mut gpu = small();
        gpu.position(1, 1);
        gpu.select(2, 2);
        gpu.reset();

        assert_eq!(gpu.cursor(), None);
        assert_eq!(gpu.selection(), None);
        gpu.set(9)?;
        assert_eq!(gpu.back_pixel(0, 0), Some(9));

        Ok(())
    }

    #[test]
    fn test_fill_buffer_single_row() -> Result<()> {
        let mut gpu = small();
        gpu.position(1, 2);
        gpu.fill_buffer(&[1, 2, 3])?;

        assert_eq!(gpu.back_pixel(1, 2), Some(1));
        assert_eq!(gpu.back_pixel(2, 2), Some(2));
        assert_eq!(gpu.back_pixel(3, 2), Some(3));

        Ok(())
    }

    #[test]
    fn test_fill_buffer_writes_one_extra_row() -> Result<()> {
        let mut gpu = small();
        gpu.select(2, 1);
        gpu.fill_buffer(&[1, 2, 3, 4, 5, 6])?;

        // height 1 still takes rows 0 and 1
        assert_eq!(gpu.back_pixel(0, 0), Some(1));
        assert_eq!(gpu.back_pixel(1, 0), Some(2));
        assert_eq!(gpu.back_pixel(0, 1), Some(3));
        assert_eq!(gpu.back_pixel(1, 1), Some(4));
        assert_eq!(gpu.back_pixel(0, 2), Some(0));
        assert_eq!(gpu.back_pixel(1, 2), Some(0));

        Ok(())
    }

    #[test]
    fn test_fill_outside_screen() -> Result<()> {
        let mut gpu = small();
        gpu.position(7, 0);

        assert_eq!(
            gpu.fill_buffer(&[1, 2]),
            Err(MachineError::OutOfBounds {
                domain: Domain::Framebuffer,
                index: 8
            })
        );

        Ok(())
    }

    #[test]
    fn test_flip_swaps_without_copy() -> Result<()> {
        let mut gpu = small();
        let original = gpu.back_slot();
        gpu.set(5)?;
        gpu.flip();

        assert_ne!(gpu.back_slot(), original);
        assert_eq!(gpu.front_buffer()[0], 5);
        assert_eq!(gpu.back_buffer()[0], 0);

        gpu.flip();
        assert_eq!(gpu.back_slot(), original);
        assert_eq!(gpu.back_buffer()[0], 5);

        Ok(())
    }

    #[test]
    fn test_clear() -> Result<()> {
        let mut gpu = small();
        gpu.set(5)?;
        gpu.flip();
        gpu.set(6)?;
        gpu.clear();

        assert_eq!(gpu, small());

        Ok(())
    }
}
