//! Symbol resolution. Data names and labels share one table.

use std::collections::hash_map::{self, HashMap};

use crate::memory::Word;

use super::error::AsmError;
use super::{Declaration, Instruction, Operand};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// A declaration: word offset inside the data block and its length
    Data { offset: Word, size: Word },
    /// A label: index of the instruction it names
    Label { offset: Word },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a symbol, refusing names that are already taken
    pub fn insert(&mut self, name: &str, symbol: Symbol, line_nr: usize) -> Result<(), AsmError> {
        match self.symbols.entry(name.to_string()) {
            hash_map::Entry::Occupied(_) => Err(AsmError::DuplicateSymbol {
                name: name.to_string(),
                line_nr,
            }),
            hash_map::Entry::Vacant(entry) => {
                log::trace!("Symbol `{}` = {:?}", name, symbol);
                entry.insert(symbol);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).copied()
    }

    pub fn data_offset(&self, name: &str) -> Option<Word> {
        match self.get(name)? {
            Symbol::Data { offset, .. } => Some(offset),
            Symbol::Label { .. } => None,
        }
    }

    pub fn label_offset(&self, name: &str) -> Option<Word> {
        match self.get(name)? {
            Symbol::Label { offset } => Some(offset),
            Symbol::Data { .. } => None,
        }
    }
}

/// First pass: lays the declarations out back to back, in source order,
/// starting at offset 0.
pub fn resolve_data(data: &mut [Declaration]) -> Result<SymbolTable, AsmError> {
    let mut symbols = SymbolTable::new();
    let mut offset: Word = 0;

    for declaration in data.iter_mut() {
        let size = declaration.size() as Word;
        symbols.insert(
            &declaration.name,
            Symbol::Data { offset, size },
            declaration.line_nr,
        )?;
        declaration.offset = Some(offset);
        offset = offset.wrapping_add(size);
    }

    Ok(symbols)
}

/// Second pass: numbers the labels by instruction index, then fills in every
/// operand reference.
///
/// `[name]` must name a declaration and a bare name must name a label.
pub fn resolve_text(text: &mut [Instruction], symbols: &mut SymbolTable) -> Result<(), AsmError> {
    for (index, instruction) in text.iter_mut().enumerate() {
        let offset = index as Word;
        for label in instruction.labels.iter_mut() {
            symbols.insert(&label.name, Symbol::Label { offset }, instruction.line_nr)?;
            label.offset = Some(offset);
        }
    }

    for instruction in text.iter_mut() {
        let line_nr = instruction.line_nr;
        for operand in instruction.operands.iter_mut() {
            let (reference, offset) = match operand {
                Operand::Memory(reference) => {
                    let offset = symbols.data_offset(&reference.name);
                    (reference, offset)
                }
                Operand::Label(reference) => {
                    let offset = symbols.label_offset(&reference.name);
                    (reference, offset)
                }
                Operand::Register(_) | Operand::Constant(_) => continue,
            };

            match offset {
                Some(offset) => reference.offset = Some(offset),
                None => {
                    return Err(AsmError::UnresolvedSymbol {
                        name: reference.name.clone(),
                        line_nr,
                    })
                }
            }
        }
    }

    Ok(())
}
