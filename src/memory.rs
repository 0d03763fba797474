use std::convert::TryInto;
use std::ops::Range;

use crate::error::{Domain, MachineError, Result};

pub type Word = u32; // 4 bytes

/// Number of bytes a word occupies in a program image
pub const WORD_BYTES: usize = 4;

/// Default memory: 16 Mi words
pub type StdMem = Memory<0x100_0000>;

/// Emulates word addressed memory for use with the CPU
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Memory<const S: usize> {
    /// The actual data of the memory
    data: Box<[Word]>,
}

impl<const S: usize> Default for Memory<S> {
    /// Initializes the memory
    fn default() -> Self {
        Memory {
            data: vec![0; S].into_boxed_slice(),
        }
    }
}

/// Forms the absolute address `segment + offset`, out of bounds on overflow
pub fn segmented(segment: Word, offset: Word) -> Result<Word> {
    segment.checked_add(offset).ok_or_else(|| {
        MachineError::out_of_bounds(Domain::Memory, segment as u64 + offset as u64)
    })
}

impl<const S: usize> Memory<S> {
    fn range(&self, position: Word, len: Word) -> Result<Range<usize>> {
        let start = position as usize;
        let end = start + len as usize;
        if end > S {
            return Err(MachineError::out_of_bounds(
                Domain::Memory,
                end.max(start + 1) as u64 - 1,
            ));
        }

        Ok(start..end)
    }

    /// Reads a word from the memory
    pub fn read(&self, position: Word) -> Result<Word> {
        self.data
            .get(position as usize)
            .copied()
            .ok_or_else(|| MachineError::out_of_bounds(Domain::Memory, position))
    }

    /// Writes a word to the memory
    pub fn write(&mut self, position: Word, value: Word) -> Result<()> {
        let slot = self
            .data
            .get_mut(position as usize)
            .ok_or_else(|| MachineError::out_of_bounds(Domain::Memory, position))?;
        *slot = value;

        Ok(())
    }

    /// Borrows `len` consecutive words starting at `position`
    pub fn read_slice(&self, position: Word, len: Word) -> Result<&[Word]> {
        let range = self.range(position, len)?;
        Ok(&self.data[range])
    }

    /// Writes an array of words to the memory
    pub fn write_array(&mut self, position: Word, data: &[Word]) -> Result<()> {
        let range = self.range(position, data.len() as Word)?;
        self.data[range].copy_from_slice(data);

        Ok(())
    }

    /// Loads a big endian program image at address 0 and returns the number
    /// of words written.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<usize> {
        let words = words_from_image(bytes)?;
        self.write_array(0, &words)?;

        log::debug!("Loaded {} words of program image", words.len());

        Ok(words.len())
    }

    /// Sets every word back to zero
    pub fn reset(&mut self) {
        self.data.iter_mut().for_each(|word| *word = 0);
    }
}

/// Decodes a big endian program image into words.
pub fn words_from_image(bytes: &[u8]) -> Result<Vec<Word>> {
    if bytes.len() % WORD_BYTES != 0 {
        return Err(MachineError::MisalignedImage { len: bytes.len() });
    }

    Ok(bytes
        .chunks_exact(WORD_BYTES)
        .map(|chunk| Word::from_be_bytes(chunk.try_into().unwrap_or_default()))
        .collect())
}

/// Encodes words into a big endian program image.
pub fn image_from_words(words: &[Word]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_be_bytes()).collect()
}

/// Writes a block of words directly into the memory
#[macro_export]
macro_rules! write_words {
    ( $mem:ident : $pos:expr => $( $word:expr ),+ ) => {
        $mem.write_array($pos, &[
            $(
                $word as $crate::memory::Word,
            )+
        ])
    };
}

#[cfg(test)]
mod tests {
    use crate::isa::Opcode;
    use crate::register::Register;

    use super::*;
    use color_eyre::eyre::Result;

    type SmallMem = Memory<0x100>;

    #[test]
    fn test_read_word() -> Result<()> {
        let mut mem = SmallMem::default();
        mem.data[0x2] = 0x1234_5678;
        assert_eq!(mem.read(0x2)?, 0x1234_5678);

        Ok(())
    }

    #[test]
    fn test_write_word() -> Result<()> {
        let mut mem = SmallMem::default();
        mem.write(0x44, 12)?;
        assert_eq!(mem.data[0x44], 12);

        Ok(())
    }

    #[test]
    fn test_out_of_bounds() -> Result<()> {
        let mut mem = SmallMem::default();

        assert_eq!(
            mem.read(0x100),
            Err(MachineError::OutOfBounds {
                domain: Domain::Memory,
                index: 0x100
            })
        );
        assert!(mem.write(0x1000, 1).is_err());
        assert!(mem.read_slice(0xFE, 3).is_err());
        assert!(mem.write_array(0xFF, &[1, 2]).is_err());

        Ok(())
    }

    #[test]
    fn test_segmented_overflow() -> Result<()> {
        assert_eq!(segmented(0x10, 0x5)?, 0x15);
        assert!(matches!(
            segmented(Word::MAX, 1),
            Err(MachineError::OutOfBounds {
                domain: Domain::Memory,
                ..
            })
        ));

        Ok(())
    }

    #[test]
    fn test_write_array() -> Result<()> {
        let mut mem = SmallMem::default();
        mem.write_array(0x44, &[0x12, 0x34, 0x56, 0x78])?;
        assert_eq!(mem.read_slice(0x44, 4)?, &[0x12, 0x34, 0x56, 0x78]);

        Ok(())
    }

    #[test]
    fn test_load_image_big_endian() -> Result<()> {
        let mut mem = SmallMem::default();
        let loaded = mem.load_image(&[0x00, 0x00, 0x00, 0xA3, 0xDE, 0xAD, 0xBE, 0xEF])?;

        assert_eq!(loaded, 2);
        assert_eq!(mem.read(0)?, 0xA3);
        assert_eq!(mem.read(1)?, 0xDEAD_BEEF);
        assert_eq!(image_from_words(&[0xA3, 0xDEAD_BEEF])[4..], [0xDE, 0xAD, 0xBE, 0xEF]);

        Ok(())
    }

    #[test]
    fn test_load_misaligned_image() -> Result<()> {
        let mut mem = SmallMem::default();

        assert_eq!(
            mem.load_image(&[0, 0, 1]),
            Err(MachineError::MisalignedImage { len: 3 })
        );
        assert_eq!(mem, SmallMem::default());

        Ok(())
    }

    #[test]
    fn test_reset() -> Result<()> {
        let mut mem = SmallMem::default();
        mem.write_array(0, &[1, 2, 3])?;
        mem.reset();

        assert_eq!(mem, SmallMem::default());

        Ok(())
    }

    #[test]
    fn test_write_words() -> Result<()> {
        let mut mem = SmallMem::default();

        mem.write_array(
            0x10,
            &[
                Opcode::MovRC as Word,
                Register::EAL as Word,
                5,
                Opcode::Halt as Word,
            ],
        )?;

        let mut mem2 = SmallMem::default();
        use crate::isa::Opcode::*;
        write_words!(mem2 : 0x10 => MovRC, Register::EAL, 5, Halt)?;

        assert_eq!(mem, mem2);

        Ok(())
    }
}
