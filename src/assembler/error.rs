use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    InvalidSection,
    InvalidNumber { radix: u32 },
    InvalidDeclaration,
    InvalidInstruction,
    InvalidOperand,
    OutsideSection,
    DanglingLabel,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxErrorKind::InvalidSection => f.write_str("invalid section directive"),
            SyntaxErrorKind::InvalidNumber { radix } => {
                write!(f, "failed to parse number with radix `{}`", radix)
            }
            SyntaxErrorKind::InvalidDeclaration => f.write_str("invalid data declaration"),
            SyntaxErrorKind::InvalidInstruction => f.write_str("invalid instruction"),
            SyntaxErrorKind::InvalidOperand => f.write_str("invalid operand"),
            SyntaxErrorKind::OutsideSection => f.write_str("statement outside of a section"),
            SyntaxErrorKind::DanglingLabel => f.write_str("label without instruction"),
        }
    }
}

/// A malformed source line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error [ln: {line_nr}]: {kind} - {context}")]
pub struct SyntaxError {
    kind: SyntaxErrorKind,
    context: String,
    line_nr: usize,
}

impl SyntaxError {
    pub(crate) fn new<S: Into<String>>(kind: SyntaxErrorKind, context: S, line_nr: usize) -> Self {
        Self {
            kind,
            context: context.into(),
            line_nr,
        }
    }

    pub fn kind(&self) -> SyntaxErrorKind {
        self.kind
    }

    pub fn line_nr(&self) -> usize {
        self.line_nr
    }
}

/// Why an assembly run produced no output
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    #[error("{}", render_all(.0))]
    Syntax(Vec<SyntaxError>),
    #[error("error [ln: {line_nr}]: unresolved symbol `{name}`")]
    UnresolvedSymbol { name: String, line_nr: usize },
    #[error("error [ln: {line_nr}]: symbol `{name}` is already defined")]
    DuplicateSymbol { name: String, line_nr: usize },
    #[error("error [ln: {line_nr}]: no opcode for `{mnemonic}` with operands `{signature}`")]
    OpcodeEncoding {
        mnemonic: String,
        signature: String,
        line_nr: usize,
    },
}

fn render_all(errors: &[SyntaxError]) -> String {
    errors
        .iter()
        .map(|err| err.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<Vec<SyntaxError>> for AsmError {
    fn from(errors: Vec<SyntaxError>) -> Self {
        AsmError::Syntax(errors)
    }
}
