//! .DATA
//! count: 3
//! .TEXT
//! loop: DEC [count]
//!       HALT

use std::str::Lines;

use crate::isa::Opcode;
use crate::memory::Word;
use crate::register::Register;

use super::error::{SyntaxError, SyntaxErrorKind};
use super::token::{tokenize, Token, TokenKind};
use super::{Constant, Declaration, Instruction, Label, Listing, Operand, Radix, Reference};

pub type Result<T, E = SyntaxError> = std::result::Result<T, E>;

/// Parses a numeric literal: `0x` hexadecimal, `b` binary or decimal.
/// On failure the radix that was attempted is returned.
pub fn parse_constant(text: &str) -> std::result::Result<Constant, Radix> {
    let (radix, offset) = match text.as_bytes() {
        [b'0', b'x', ..] | [b'0', b'X', ..] => (Radix::Hexadecimal, 2),
        [b'b', ..] | [b'B', ..] => (Radix::Binary, 1),
        _ => (Radix::Decimal, 0),
    };

    Word::from_str_radix(&text[offset..], radix as u32)
        .map(|value| Constant { radix, value })
        .map_err(|_| radix)
}

/// Identifiers like `b0110` are binary literals rather than names
fn is_binary_literal(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some('b') | Some('B'))
        && !chars.as_str().is_empty()
        && chars.all(|c| c == '0' || c == '1')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Data,
    Text,
}

/// Token stream of one line
struct Line<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    line_nr: usize,
}

impl<'a> Line<'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_nth(&self, n: usize) -> Option<Token<'a>> {
        self.tokens.get(self.pos + n).copied()
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn error<S: Into<String>>(&self, kind: SyntaxErrorKind, context: S) -> SyntaxError {
        SyntaxError::new(kind, context, self.line_nr)
    }

    /// Takes a comma separated list, requiring at least one item
    fn list<T, F>(&mut self, kind: SyntaxErrorKind, mut item: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        let mut items = vec![item(self)?];
        while let Some(token) = self.next() {
            if !token.is(TokenKind::Comma) {
                return Err(self.error(kind, format!("expected `,` but found `{}`", token.text)));
            }
            items.push(item(self)?);
        }

        Ok(items)
    }

    fn constant(&mut self, kind: SyntaxErrorKind) -> Result<Constant> {
        let token = self
            .next()
            .ok_or_else(|| self.error(kind, "expected a constant"))?;

        match token.kind {
            TokenKind::Number => self.number(token.text),
            TokenKind::Ident if is_binary_literal(token.text) => self.number(token.text),
            _ => Err(self.error(kind, format!("`{}` is not a constant", token.text))),
        }
    }

    fn number(&self, text: &str) -> Result<Constant> {
        parse_constant(text).map_err(|radix| {
            self.error(
                SyntaxErrorKind::InvalidNumber {
                    radix: radix as u32,
                },
                format!("`{}` does not fit a word", text),
            )
        })
    }

    fn operand(&mut self) -> Result<Operand> {
        let token = self
            .next()
            .ok_or_else(|| self.error(SyntaxErrorKind::InvalidOperand, "expected an operand"))?;

        match token.kind {
            TokenKind::OpenBracket => {
                let name = match (self.next(), self.next()) {
                    (Some(name), Some(close))
                        if name.is(TokenKind::Ident) && close.is(TokenKind::CloseBracket) =>
                    {
                        name.text
                    }
                    _ => {
                        return Err(self.error(
                            SyntaxErrorKind::InvalidOperand,
                            "memory operands are written `[name]`",
                        ))
                    }
                };
                Ok(Operand::Memory(Reference::new(name)))
            }
            TokenKind::Number => Ok(Operand::Constant(self.number(token.text)?)),
            TokenKind::Ident => {
                if let Some(register) = Register::from_name(token.text) {
                    Ok(Operand::Register(register))
                } else if is_binary_literal(token.text) {
                    Ok(Operand::Constant(self.number(token.text)?))
                } else {
                    Ok(Operand::Label(Reference::new(token.text)))
                }
            }
            _ => Err(self.error(
                SyntaxErrorKind::InvalidOperand,
                format!("unexpected `{}`", token.text),
            )),
        }
    }
}

/// Turns source text into a [`Listing`], one line at a time.
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lines: Lines<'a>,
    line_nr: usize,
    section: Option<Section>,
    /// Labels waiting for the next instruction
    labels: Vec<Label>,
    label_line_nr: usize,
    listing: Listing,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            line_nr: 0,
            section: None,
            labels: Vec::new(),
            label_line_nr: 0,
            listing: Listing::default(),
        }
    }

    /// Consumes `self` and tries to parse the whole source.
    ///
    /// # Errors
    ///
    /// All errors which may occur are collected and returned at the end.
    pub fn parse(mut self) -> Result<Listing, Vec<SyntaxError>> {
        let mut errors = Vec::new();

        while let Some(res) = self.parse_next_line() {
            if let Err(err) = res {
                log::error!("{}", err);
                errors.push(err);
            }
        }

        if let Some(label) = self.labels.first() {
            let err = SyntaxError::new(
                SyntaxErrorKind::DanglingLabel,
                format!("`{}` is not followed by an instruction", label.name),
                self.label_line_nr,
            );
            log::error!("{}", err);
            errors.push(err);
        }

        if errors.is_empty() {
            Ok(self.listing)
        } else {
            Err(errors)
        }
    }

    /// Tries to parse the next line. Each statement is on its own line.
    fn parse_next_line(&mut self) -> Option<Result<()>> {
        let line = self.lines.next()?;
        self.line_nr += 1;

        let mut line = Line {
            tokens: tokenize(line),
            pos: 0,
            line_nr: self.line_nr,
        };

        let res = match (line.peek(), self.section) {
            // Comment or empty line; skip
            (None, _) => Ok(()),
            (Some(token), _) if token.is(TokenKind::Dot) => self.parse_section(&mut line),
            (Some(_), Some(Section::Data)) => self.parse_declaration(&mut line),
            (Some(_), Some(Section::Text)) => self.parse_instruction(&mut line),
            (Some(_), None) => Err(line.error(
                SyntaxErrorKind::OutsideSection,
                "start with `.DATA` or `.TEXT`",
            )),
        };

        Some(res)
    }

    /// # Examples
    ///
    /// - `.DATA`
    /// - `.TEXT`
    fn parse_section(&mut self, line: &mut Line<'_>) -> Result<()> {
        line.next();
        let section = match line.next() {
            Some(token) if token.text == "DATA" => Section::Data,
            Some(token) if token.text == "TEXT" => Section::Text,
            _ => return Err(line.error(SyntaxErrorKind::InvalidSection, "expected DATA or TEXT")),
        };
        if !line.is_empty() {
            return Err(line.error(
                SyntaxErrorKind::InvalidSection,
                "a section directive stands alone",
            ));
        }

        log::debug!("[{}] Found section {:?}", self.line_nr, section);
        self.section = Some(section);

        Ok(())
    }

    /// # Examples
    ///
    /// - `count, 3`
    /// - `count: 3`
    /// - `palette 0xFF0000, 0x00FF00, b1`
    fn parse_declaration(&mut self, line: &mut Line<'_>) -> Result<()> {
        let name = match line.next() {
            Some(token) if token.is(TokenKind::Ident) && !is_binary_literal(token.text) => {
                token.text
            }
            _ => {
                return Err(line.error(
                    SyntaxErrorKind::InvalidDeclaration,
                    "a declaration starts with its name",
                ))
            }
        };
        // `name, 1, 2` and `name: 1, 2` are both accepted
        if line
            .peek()
            .map_or(false, |token| token.is(TokenKind::Colon) || token.is(TokenKind::Comma))
        {
            line.next();
        }

        let kind = SyntaxErrorKind::InvalidDeclaration;
        let values = line.list(kind, |line| line.constant(kind))?;

        log::debug!("[{}] Found declaration `{}`", self.line_nr, name);
        self.listing.data.push(Declaration {
            name: name.to_string(),
            values,
            offset: None,
            line_nr: self.line_nr,
        });

        Ok(())
    }

    /// # Examples
    ///
    /// - `HALT`
    /// - `loop: SUB EAL, 1`
    /// - `done:` (labels the next instruction)
    fn parse_instruction(&mut self, line: &mut Line<'_>) -> Result<()> {
        let mut labels = Vec::new();
        while let (Some(name), Some(colon)) = (line.peek(), line.peek_nth(1)) {
            if !(name.is(TokenKind::Ident) && colon.is(TokenKind::Colon)) {
                break;
            }
            if is_binary_literal(name.text) {
                return Err(line.error(
                    SyntaxErrorKind::InvalidInstruction,
                    format!("label `{}` reads as a binary literal", name.text),
                ));
            }
            line.next();
            line.next();
            labels.push(Label {
                name: name.text.to_string(),
                offset: None,
            });
        }

        let mnemonic = match line.next() {
            None => {
                // label only line
                self.take_labels(labels);
                return Ok(());
            }
            Some(token) if token.is(TokenKind::Ident) && Opcode::is_mnemonic(token.text) => {
                token.text
            }
            Some(token) => {
                return Err(line.error(
                    SyntaxErrorKind::InvalidInstruction,
                    format!("no instruction named `{}`", token.text),
                ))
            }
        };

        let operands = if line.is_empty() {
            Vec::new()
        } else {
            line.list(SyntaxErrorKind::InvalidOperand, Line::operand)?
        };

        log::debug!("[{}] Found instruction {}", self.line_nr, mnemonic);

        self.take_labels(labels);
        let mut instruction = Instruction::new(mnemonic, operands);
        instruction.labels = std::mem::take(&mut self.labels);
        instruction.line_nr = self.line_nr;
        self.listing.text.push(instruction);

        Ok(())
    }

    fn take_labels(&mut self, labels: Vec<Label>) {
        if self.labels.is_empty() && !labels.is_empty() {
            self.label_line_nr = self.line_nr;
        }
        self.labels.extend(labels);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::Result;

    fn parse(source: &str) -> std::result::Result<Listing, Vec<SyntaxError>> {
        Parser::new(source).parse()
    }

    fn kinds(source: &str) -> Vec<SyntaxErrorKind> {
        parse(source)
            .unwrap_err()
            .iter()
            .map(|err| err.kind())
            .collect()
    }

    #[test]
    fn parse_constants() -> Result<()> {
        assert_eq!(
            parse_constant("42"),
            Ok(Constant {
                radix: Radix::Decimal,
                value: 42
            })
        );
        assert_eq!(parse_constant("0xFF").map(|c| c.value), Ok(0xFF));
        assert_eq!(parse_constant("b101").map(|c| c.value), Ok(0b101));
        assert_eq!(parse_constant("0xFFFFFFFF").map(|c| c.value), Ok(Word::MAX));
        assert_eq!(parse_constant("0x100000000"), Err(Radix::Hexadecimal));
        assert_eq!(parse_constant("12a"), Err(Radix::Decimal));
        assert_eq!(parse_constant("b"), Err(Radix::Binary));

        Ok(())
    }

    #[test]
    fn parse_declarations() -> Result<()> {
        let listing = parse(
            r#"
            ; the data block
            .DATA
            count: 3
            palette 0xFF0000, 0x00FF00, b11
            pair, 1, 2
        "#,
        )
        .unwrap();

        assert_eq!(listing.data.len(), 3);
        assert_eq!(listing.data[0].name, "count");
        assert_eq!(listing.data[0].size(), 1);
        assert_eq!(listing.data[1].name, "palette");
        let values: Vec<_> = listing.data[1].values.iter().map(|c| c.value).collect();
        assert_eq!(values, [0xFF0000, 0x00FF00, 3]);
        assert_eq!(listing.data[1].values[2].radix, Radix::Binary);
        assert_eq!(listing.data[2].name, "pair");
        let values: Vec<_> = listing.data[2].values.iter().map(|c| c.value).collect();
        assert_eq!(values, [1, 2]);
        assert!(listing.text.is_empty());

        Ok(())
    }

    #[test]
    fn parse_instructions() -> Result<()> {
        let listing = parse(
            r#"
            .TEXT
            start: MOV EAL, [count]
                   CALL draw
                   PUSH b10
            draw:
            again: GFLIP
                   RET
        "#,
        )
        .unwrap();

        let text = &listing.text;
        assert_eq!(text.len(), 5);

        assert_eq!(text[0].mnemonic, "MOV");
        assert_eq!(text[0].labels[0].name, "start");
        assert_eq!(
            text[0].operands,
            [
                Operand::Register(Register::EAL),
                Operand::Memory(Reference::new("count"))
            ]
        );
        assert_eq!(text[1].operands, [Operand::Label(Reference::new("draw"))]);
        assert_eq!(
            text[2].operands,
            [Operand::Constant(Constant {
                radix: Radix::Binary,
                value: 2
            })]
        );

        let names: Vec<_> = text[3].labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["draw", "again"]);
        assert!(text[3].operands.is_empty());
        assert_eq!(text[4].line_nr, 8);

        Ok(())
    }

    #[test]
    fn parse_errors_are_collected() -> Result<()> {
        assert_eq!(
            kinds(
                r#"MOV EAL, 1
.CODE
.TEXT
MOV EAL,
FROB
MOV [x EAL
.DATA
x: EAL
1: 2
"#
            ),
            [
                SyntaxErrorKind::OutsideSection,
                SyntaxErrorKind::InvalidSection,
                SyntaxErrorKind::InvalidOperand,
                SyntaxErrorKind::InvalidInstruction,
                SyntaxErrorKind::InvalidOperand,
                SyntaxErrorKind::InvalidDeclaration,
                SyntaxErrorKind::InvalidDeclaration,
            ]
        );

        Ok(())
    }

    #[test]
    fn parse_binary_looking_label() -> Result<()> {
        let errors = parse(".TEXT\nb1: HALT\nCALL b1\n").unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), SyntaxErrorKind::InvalidInstruction);
        assert_eq!(errors[0].line_nr(), 2);

        Ok(())
    }

    #[test]
    fn parse_dangling_label() -> Result<()> {
        let errors = parse(".TEXT\nHALT\nend:\n\n").unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), SyntaxErrorKind::DanglingLabel);
        assert_eq!(errors[0].line_nr(), 3);

        Ok(())
    }

    #[test]
    fn parse_number_overflow() -> Result<()> {
        assert_eq!(
            kinds(".DATA\nbig: 4294967296\n"),
            [SyntaxErrorKind::InvalidNumber { radix: 10 }]
        );

        Ok(())
    }
}
