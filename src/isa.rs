//! The instruction set shared by the assembler and the processor.
//!
//! Every instruction is an opcode word followed by a fixed number of operand
//! words. One mnemonic can map to several opcodes; the assembler picks the
//! opcode by the kinds of the operands it was given, written as a signature
//! string with one letter per operand (see [`OperandKind`]). An opcode may
//! accept more than one signature, but they all have the same length, which
//! is the number of operand words.

use std::convert::TryFrom;
use std::fmt;

use crate::memory::Word;
use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;

/// What an operand denotes at assembly time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    Register,
    Memory,
    Constant,
    Label,
}

impl OperandKind {
    /// The letter this kind contributes to a signature
    pub fn code(&self) -> char {
        match self {
            OperandKind::Register => 'r',
            OperandKind::Memory => 'm',
            OperandKind::Constant => 'c',
            OperandKind::Label => 'l',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'r' => Some(OperandKind::Register),
            'm' => Some(OperandKind::Memory),
            'c' => Some(OperandKind::Constant),
            'l' => Some(OperandKind::Label),
            _ => None,
        }
    }
}

/// Largest number of operand words any opcode takes
pub const MAX_OPERANDS: usize = 2;

/// Builds the signature string for a list of operand kinds
pub fn signature<I>(kinds: I) -> String
where
    I: IntoIterator<Item = OperandKind>,
{
    kinds.into_iter().map(|kind| kind.code()).collect()
}

macro_rules! instructions {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $repr:literal , $mnemonic:literal [ $( $signature:literal ),+ ] , )+ ) => {
        /// Defines the opcodes
        #[repr(u32)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Opcode {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Opcode {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$name => stringify!($name) , )+
                }
            }

            /// The assembly mnemonic
            pub fn mnemonic(&self) -> &'static str {
                match self {
                    $( Self::$name => $mnemonic , )+
                }
            }

            /// Operand kind signatures accepted, one letter per operand word
            pub fn signatures(&self) -> &'static [&'static str] {
                match self {
                    $( Self::$name => &[ $( $signature ),+ ] , )+
                }
            }
        }
    }
}

instructions! {
    /// Stop. The instruction pointer is not advanced, so the machine stays here
    Halt = 0x00, "HALT" [""],
    /// Far jump: `CS = c0; IP = 0`
    Jmpc = 0x0B, "JMPC" ["c", "l"],
    /// Push `IP`, then `IP = c0`
    Call = 0x1B, "CALL" ["l", "c"],
    /// Pop `IP`
    Ret = 0x1C, "RET" [""],
    /// `r0 += r1`
    AddRR = 0x20, "ADD" ["rr"],
    /// `r0 += [m1]`
    AddRM = 0x21, "ADD" ["rm"],
    /// `[m0] += r1`
    AddMR = 0x22, "ADD" ["mr"],
    /// `r0 += c1`
    AddRC = 0x23, "ADD" ["rc"],
    /// `[m0] += c1`
    AddMC = 0x24, "ADD" ["mc"],
    /// `r0 += 1`
    IncR = 0x25, "INC" ["r"],
    /// `[m0] += 1`
    IncM = 0x26, "INC" ["m"],
    /// `r0 -= 1`
    DecR = 0x27, "DEC" ["r"],
    /// `[m0] -= 1`
    DecM = 0x28, "DEC" ["m"],
    /// `r0 -= r1`
    SubRR = 0x29, "SUB" ["rr"],
    /// `r0 -= [m1]`
    SubRM = 0x2A, "SUB" ["rm"],
    /// `[m0] -= r1`
    SubMR = 0x2B, "SUB" ["mr"],
    /// `r0 -= c1`
    SubRC = 0x2C, "SUB" ["rc"],
    /// `[m0] -= c1`
    SubMC = 0x2D, "SUB" ["mc"],
    /// Compare. Reserved: flags are never set, so it has no effect
    CmpRR = 0x38, "CMP" ["rr"],
    /// Write one register value to the framebuffer at the cursor
    GmovR = 0x43, "GMOV" ["r"],
    /// Forget the graphics position and selection
    Greset = 0x44, "GRESET" [""],
    /// Copy `[m1]` words starting at `m0` to the framebuffer
    GmovMM = 0x45, "GMOV" ["mm"],
    /// Copy `c1` words starting at `m0` to the framebuffer
    GmovMC = 0x47, "GMOV" ["mc"],
    /// Set the graphics cursor
    GposRR = 0x48, "GPOS" ["rr"],
    /// Set the graphics cursor
    GposRM = 0x49, "GPOS" ["rm"],
    /// Set the graphics cursor
    GposMR = 0x4A, "GPOS" ["mr"],
    /// Set the graphics cursor
    GposMM = 0x4B, "GPOS" ["mm"],
    /// Set the graphics cursor
    GposRC = 0x4C, "GPOS" ["rc"],
    /// Set the graphics cursor
    GposMC = 0x4D, "GPOS" ["mc"],
    /// Set the graphics cursor
    GposCC = 0x4E, "GPOS" ["cc"],
    /// Set the graphics cursor
    GposCM = 0x4F, "GPOS" ["cm"],
    /// Set the graphics cursor
    GposCR = 0x50, "GPOS" ["cr"],
    /// Fill the selection with a register value
    GsetR = 0x51, "GSET" ["r"],
    /// Fill the selection with a memory value
    GsetM = 0x52, "GSET" ["m"],
    /// Fill the selection with a constant
    GsetC = 0x53, "GSET" ["c"],
    /// Set the selection size
    GselectRR = 0x54, "GSELECT" ["rr"],
    /// Set the selection size
    GselectRM = 0x55, "GSELECT" ["rm"],
    /// Set the selection size
    GselectMR = 0x56, "GSELECT" ["mr"],
    /// Set the selection size
    GselectMM = 0x57, "GSELECT" ["mm"],
    /// Set the selection size
    GselectRC = 0x58, "GSELECT" ["rc"],
    /// Set the selection size
    GselectMC = 0x59, "GSELECT" ["mc"],
    /// Set the selection size
    GselectCC = 0x5A, "GSELECT" ["cc"],
    /// Set the selection size
    GselectCM = 0x5B, "GSELECT" ["cm"],
    /// Set the selection size
    GselectCR = 0x5C, "GSELECT" ["cr"],
    /// Swap front and back framebuffer
    Gflip = 0x5D, "GFLIP" [""],
    /// `r0 = r1`
    MovRR = 0xA0, "MOV" ["rr"],
    /// `r0 = [m1]`
    MovRM = 0xA1, "MOV" ["rm"],
    /// `[m0] = r1`
    MovMR = 0xA2, "MOV" ["mr"],
    /// `r0 = c1`
    MovRC = 0xA3, "MOV" ["rc"],
    /// `[m0] = c1`
    MovMC = 0xA4, "MOV" ["mc"],
    /// Push a register
    PushR = 0xA5, "PUSH" ["r"],
    /// Push a memory value
    PushM = 0xA6, "PUSH" ["m"],
    /// Push a constant
    PushC = 0xA7, "PUSH" ["c"],
    /// Pop into a register
    PopR = 0xA8, "POP" ["r"],
    /// Pop into memory
    PopM = 0xA9, "POP" ["m"],
    /// `r0 = m1`, the offset itself rather than the value stored there
    LeaRM = 0xAA, "LEA" ["rm"],
}

impl Opcode {
    /// Number of operand words following the opcode word
    pub fn arity(&self) -> usize {
        self.signatures()[0].len()
    }

    /// Finds the opcode for a mnemonic used with the given operand kinds
    pub fn lookup(mnemonic: &str, signature: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| {
            op.mnemonic() == mnemonic && op.signatures().iter().any(|sig| *sig == signature)
        })
    }

    /// Whether any opcode is written with this mnemonic
    pub fn is_mnemonic(mnemonic: &str) -> bool {
        Self::ALL.iter().any(|op| op.mnemonic() == mnemonic)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.arity() {
            0 => f.write_str(self.mnemonic()),
            _ => write!(f, "{} {}", self.mnemonic(), self.signatures().join("|")),
        }
    }
}

/// Number of operand words that follow the opcode word `word`.
///
/// Words that are not an opcode take no operands.
pub fn operand_count(word: Word) -> usize {
    Opcode::try_from(word).map(|op| op.arity()).unwrap_or(0)
}

/// One instruction as read back from a word stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded<'a> {
    pub opcode: Word,
    pub operands: &'a [Word],
}

impl<'a> Decoded<'a> {
    /// Words occupied by this instruction
    pub fn len(&self) -> usize {
        1 + self.operands.len()
    }
}

impl fmt::Display for Decoded<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Opcode::try_from(self.opcode) {
            Ok(op) => f.write_str(op.mnemonic())?,
            Err(_) => write!(f, "?0x{:02X}", self.opcode)?,
        }
        for (i, operand) in self.operands.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{}", sep, operand)?;
        }

        Ok(())
    }
}

/// Reads the instruction at the start of `words`.
///
/// Returns `None` when the stream ends before the instruction does.
pub fn decode(words: &[Word]) -> Option<Decoded<'_>> {
    let (&opcode, rest) = words.split_first()?;
    let operands = rest.get(..operand_count(opcode))?;

    Some(Decoded { opcode, operands })
}
