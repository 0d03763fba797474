//! Assembler for the textual assembly language.
//!
//! ```text
//! .DATA
//! count: 3
//! colors: 0xFF0000, 0x00FF00, b1111
//!
//! .TEXT
//! start: MOV EAL, [count]
//!        GSET [colors]     ; paint
//!        HALT
//! ```

use crate::isa::OperandKind;
use crate::memory::Word;
use crate::register::Register;

pub mod encode;
pub mod error;
pub mod parse;
pub mod symbol;
pub mod token;

pub use encode::{AssembledProgram, PREAMBLE_LEN};
pub use error::{AsmError, SyntaxError, SyntaxErrorKind};
pub use symbol::{Symbol, SymbolTable};

/// Base a constant was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Radix {
    Binary = 2,
    Decimal = 10,
    Hexadecimal = 16,
}

/// A numeric literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constant {
    pub radix: Radix,
    pub value: Word,
}

/// A use of a name, filled in by the text pass
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub name: String,
    pub offset: Option<Word>,
}

impl Reference {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            offset: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Register(Register),
    Constant(Constant),
    /// `[name]`, a data declaration
    Memory(Reference),
    /// A bare name, a label in the text section
    Label(Reference),
}

impl Operand {
    pub fn kind(&self) -> OperandKind {
        match self {
            Operand::Register(_) => OperandKind::Register,
            Operand::Constant(_) => OperandKind::Constant,
            Operand::Memory(_) => OperandKind::Memory,
            Operand::Label(_) => OperandKind::Label,
        }
    }

    /// The operand word, `None` while a reference is unresolved
    pub fn value(&self) -> Option<Word> {
        match self {
            Operand::Register(register) => Some(*register as Word),
            Operand::Constant(constant) => Some(constant.value),
            Operand::Memory(reference) | Operand::Label(reference) => reference.offset,
        }
    }
}

/// Names an instruction. Its offset is the instruction's index in the text
/// section, not a word address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    pub name: String,
    pub offset: Option<Word>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub mnemonic: String,
    pub operands: Vec<Operand>,
    /// Labels written in front of this instruction
    pub labels: Vec<Label>,
    pub line_nr: usize,
}

impl Instruction {
    pub fn new<S: Into<String>>(mnemonic: S, operands: Vec<Operand>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            operands,
            labels: Vec::new(),
            line_nr: 0,
        }
    }
}

/// A named run of constants in the data section
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Declaration {
    pub name: String,
    pub values: Vec<Constant>,
    /// Word offset inside the data block, set by the data pass
    pub offset: Option<Word>,
    pub line_nr: usize,
}

impl Declaration {
    pub fn size(&self) -> usize {
        self.values.len()
    }
}

/// Both sections of a parsed source, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub data: Vec<Declaration>,
    pub text: Vec<Instruction>,
}

/// Parses `source` into a [`Listing`], reporting every malformed line
pub fn parse(source: &str) -> Result<Listing, AsmError> {
    Ok(parse::Parser::new(source).parse()?)
}

/// Assembles `source` into a bootable program.
///
/// Nothing is produced unless every stage succeeds.
pub fn assemble(source: &str) -> Result<AssembledProgram, AsmError> {
    let mut listing = parse(source)?;
    let mut symbols = symbol::resolve_data(&mut listing.data)?;
    symbol::resolve_text(&mut listing.text, &mut symbols)?;
    let program = encode::link(&listing, symbols)?;

    log::info!(
        "Assembled {} data words and {} instructions into {} words",
        program.data().len(),
        listing.text.len(),
        program.words().len()
    );

    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::Opcode;
    use color_eyre::eyre::Result;

    #[test]
    fn test_assemble_layout() -> Result<()> {
        let source = r#"
            .DATA
            count: 3
            pair: 1, 2

            .TEXT
            start: MOV EAL, [pair]
                   ADD EAL, 0x10
                   HALT
        "#;

        let program = assemble(source)?;
        let ds = Register::DS as Word;

        assert_eq!(
            program.words(),
            &[
                Opcode::MovRC as Word, ds, 5,
                Opcode::Jmpc as Word, 8,
                3, 1, 2,
                Opcode::MovRM as Word, Register::EAL as Word, 1,
                Opcode::AddRC as Word, Register::EAL as Word, 0x10,
                Opcode::Halt as Word,
            ]
        );
        assert_eq!(program.entry(), Some(0));

        Ok(())
    }

    #[test]
    fn test_comma_declarations() -> Result<()> {
        let program = assemble(".DATA\ncount, 3\npair, 1, 2\n.TEXT\nHALT\n")?;

        assert_eq!(program.data(), &[3, 1, 2]);
        assert_eq!(program.symbols().data_offset("pair"), Some(1));
        assert_eq!(
            program.symbols().get("pair"),
            Some(Symbol::Data { offset: 1, size: 2 })
        );

        Ok(())
    }

    #[test]
    fn test_empty_text_section() -> Result<()> {
        let program = assemble(".DATA\nvalues: 7, 8, 9\n.TEXT\n")?;

        assert_eq!(program.data(), &[7, 8, 9]);
        assert!(program.text().is_empty());
        assert_eq!(program.words().len(), PREAMBLE_LEN + 3);
        assert_eq!(program.words()[4], (PREAMBLE_LEN + 3) as Word);

        Ok(())
    }

    #[test]
    fn test_nothing_on_syntax_error() -> Result<()> {
        let err = assemble(".TEXT\nMOV EAL, 5\nFROB EAL\nMOV EBL, 0xZZ\n").unwrap_err();

        match err {
            AsmError::Syntax(errors) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].line_nr(), 3);
                assert_eq!(errors[1].line_nr(), 4);
            }
            other => panic!("unexpected error {}", other),
        }

        Ok(())
    }

    #[test]
    fn test_unresolved_memory_operand() -> Result<()> {
        let err = assemble(".DATA\na: 1\n.TEXT\nMOV EAL, [b]\n").unwrap_err();

        assert_eq!(
            err,
            AsmError::UnresolvedSymbol {
                name: "b".into(),
                line_nr: 4
            }
        );

        Ok(())
    }

    #[test]
    fn test_unknown_signature() -> Result<()> {
        let err = assemble(".TEXT\nMOV 5, EAL\n").unwrap_err();

        assert_eq!(
            err,
            AsmError::OpcodeEncoding {
                mnemonic: "MOV".into(),
                signature: "cr".into(),
                line_nr: 2
            }
        );

        Ok(())
    }
}
