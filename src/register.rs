use std::convert::TryFrom;

use crate::error::{Domain, MachineError, Result};
use crate::memory::Word;
use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;

macro_rules! registers {
    ( $( $( #[doc = $doc:expr] )* $name:ident = $repr:literal , )+ ) => {
        /// The architectural registers. Their ids double as indices into the
        /// [`RegisterFile`] and are what the assembler encodes as operands.
        #[repr(u32)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Register {
            $(
                $( #[doc = $doc] )*
                $name = $repr,
            )+
        }

        impl Register {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$name => stringify!($name) , )+
                }
            }
        }

        impl ::std::fmt::Display for Register {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }
    }
}

registers! {
    /// Accumulator, high half
    EAH = 0,
    /// Accumulator, low half
    EAL = 1,
    EBH = 2,
    EBL = 3,
    ECH = 4,
    ECL = 5,
    EDH = 6,
    EDL = 7,
    /// Source index
    SI = 8,
    /// Destination index
    DI = 9,
    /// Base pointer
    BP = 10,
    /// Stack pointer, relative to `SS`
    SP = 11,
    /// Instruction pointer, relative to `CS`
    IP = 12,
    /// Code segment
    CS = 13,
    /// Data segment
    DS = 14,
    /// Extra segment
    ES = 15,
    /// Stack segment
    SS = 16,
}

impl Register {
    pub const COUNT: usize = Self::ALL.len();

    /// Looks up a register by its assembly name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|register| register.name() == name)
    }
}

/// Register id -> value. Everything is zero after a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RegisterFile {
    values: [Word; Register::COUNT],
}

impl RegisterFile {
    /// Reads a named register
    pub fn get(&self, register: Register) -> Word {
        self.values[register as usize]
    }

    /// Writes a named register
    pub fn set(&mut self, register: Register, value: Word) {
        self.values[register as usize] = value;
    }

    /// Reads a register by the raw id found in an operand word
    pub fn read(&self, id: Word) -> Result<Word> {
        Ok(self.get(Self::resolve(id)?))
    }

    /// Writes a register by the raw id found in an operand word
    pub fn write(&mut self, id: Word, value: Word) -> Result<()> {
        self.set(Self::resolve(id)?, value);
        Ok(())
    }

    /// Applies `f` to the register with the raw id `id`
    pub fn update<F>(&mut self, id: Word, f: F) -> Result<()>
    where
        F: FnOnce(Word) -> Word,
    {
        let register = Self::resolve(id)?;
        self.set(register, f(self.get(register)));
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn resolve(id: Word) -> Result<Register> {
        Register::try_from(id).map_err(|_| MachineError::out_of_bounds(Domain::Register, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::Result;

    #[test]
    fn test_register_ids_are_indices() -> Result<()> {
        for (index, register) in Register::ALL.iter().enumerate() {
            assert_eq!(*register as usize, index);
        }
        assert_eq!(Register::COUNT, 17);

        Ok(())
    }

    #[test]
    fn test_from_name() -> Result<()> {
        assert_eq!(Register::from_name("EAL"), Some(Register::EAL));
        assert_eq!(Register::from_name("SS"), Some(Register::SS));
        assert_eq!(Register::from_name("eal"), None);
        assert_eq!(Register::from_name("start"), None);

        Ok(())
    }

    #[test]
    fn test_raw_access() -> Result<()> {
        let mut registers = RegisterFile::default();
        registers.write(Register::DS as Word, 5)?;
        registers.update(Register::DS as Word, |value| value.wrapping_add(2))?;

        assert_eq!(registers.get(Register::DS), 7);
        assert_eq!(registers.read(14)?, 7);

        Ok(())
    }

    #[test]
    fn test_unknown_register_id() -> Result<()> {
        let mut registers = RegisterFile::default();

        assert_eq!(
            registers.write(17, 1),
            Err(MachineError::OutOfBounds {
                domain: Domain::Register,
                index: 17
            })
        );
        assert!(registers.read(Word::MAX).is_err());
        assert_eq!(registers, RegisterFile::default());

        Ok(())
    }
}
