//! Emits the final word stream.
//!
//! ```text
//! 0: MOV DS, 5            ; data starts right after these two instructions
//! 3: JMPC 5 + data len    ; continue with the first instruction
//! 5: data words
//!    instruction words
//! ```

use crate::isa::{self, Opcode};
use crate::memory::{image_from_words, Word};
use crate::register::Register;

use super::error::AsmError;
use super::symbol::SymbolTable;
use super::{Constant, Instruction, Listing, Operand, Radix};

/// Words taken by the bootstrap instructions in front of the data block
pub const PREAMBLE_LEN: usize = 5;

/// Name of the label reported by [`AssembledProgram::entry`]
pub const ENTRY_LABEL: &str = "start";

/// Encodes one resolved instruction: the opcode word, then one word per
/// operand.
pub fn encode(instruction: &Instruction) -> Result<Vec<Word>, AsmError> {
    let signature = isa::signature(instruction.operands.iter().map(Operand::kind));
    let opcode = Opcode::lookup(&instruction.mnemonic, &signature).ok_or_else(|| {
        AsmError::OpcodeEncoding {
            mnemonic: instruction.mnemonic.clone(),
            signature: signature.clone(),
            line_nr: instruction.line_nr,
        }
    })?;

    let mut words: Vec<Word> = Vec::with_capacity(1 + instruction.operands.len());
    words.push(opcode.into());
    for operand in &instruction.operands {
        let word = match operand {
            Operand::Register(register) => *register as Word,
            Operand::Constant(constant) => constant.value,
            Operand::Memory(reference) | Operand::Label(reference) => {
                reference.offset.ok_or_else(|| AsmError::UnresolvedSymbol {
                    name: reference.name.clone(),
                    line_nr: instruction.line_nr,
                })?
            }
        };
        words.push(word);
    }

    Ok(words)
}

fn constant(value: Word) -> Operand {
    Operand::Constant(Constant {
        radix: Radix::Decimal,
        value,
    })
}

/// The two instructions every program begins with
fn preamble(data_len: usize) -> [Instruction; 2] {
    [
        Instruction::new(
            "MOV",
            vec![Operand::Register(Register::DS), constant(PREAMBLE_LEN as Word)],
        ),
        Instruction::new("JMPC", vec![constant((PREAMBLE_LEN + data_len) as Word)]),
    ]
}

/// A finished program, ready to be loaded at address 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledProgram {
    words: Vec<Word>,
    data_len: usize,
    symbols: SymbolTable,
}

impl AssembledProgram {
    /// The complete program
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn preamble(&self) -> &[Word] {
        &self.words[..PREAMBLE_LEN]
    }

    /// The data block, as placed in memory
    pub fn data(&self) -> &[Word] {
        &self.words[PREAMBLE_LEN..PREAMBLE_LEN + self.data_len]
    }

    /// The encoded instructions
    pub fn text(&self) -> &[Word] {
        &self.words[PREAMBLE_LEN + self.data_len..]
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Instruction index of the `start` label, if the program has one
    pub fn entry(&self) -> Option<Word> {
        self.symbols.label_offset(ENTRY_LABEL)
    }

    /// The big endian binary image
    pub fn to_bytes(&self) -> Vec<u8> {
        image_from_words(&self.words)
    }
}

/// Lays out preamble, data block and text section of a resolved listing.
pub fn link(listing: &Listing, symbols: SymbolTable) -> Result<AssembledProgram, AsmError> {
    let data_len: usize = listing.data.iter().map(|declaration| declaration.size()).sum();

    let mut words = Vec::with_capacity(PREAMBLE_LEN + data_len);
    for instruction in &preamble(data_len) {
        words.extend(encode(instruction)?);
    }
    debug_assert_eq!(words.len(), PREAMBLE_LEN);

    words.extend(
        listing
            .data
            .iter()
            .flat_map(|declaration| declaration.values.iter().map(|constant| constant.value)),
    );

    for instruction in &listing.text {
        let encoded = encode(instruction)?;
        log::trace!("[{}] {:?}", instruction.line_nr, isa::decode(&encoded));
        words.extend(encoded);
    }

    Ok(AssembledProgram {
        words,
        data_len,
        symbols,
    })
}
