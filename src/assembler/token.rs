//! Splits a single source line into tokens.

/// Kind of a lexed token
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    /// Names, mnemonics, registers and `b`-prefixed binary literals
    Ident,
    /// Anything starting with a digit: decimal or `0x` hexadecimal
    Number,
    Comma,
    Colon,
    Dot,
    OpenBracket,
    CloseBracket,
    Unknown,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

/// Test if a character can be part of an identifier or number.
fn is_id(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Peekable position in a line
struct Cursor<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a str) -> Self {
        Cursor { line, pos: 0 }
    }

    fn first(&self) -> Option<char> {
        self.line[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.first()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn take_while<F: Fn(char) -> bool>(&mut self, predicate: F) {
        while self.first().map_or(false, &predicate) {
            self.bump();
        }
    }

    fn advance_token(&mut self) -> Option<Token<'a>> {
        self.take_while(char::is_whitespace);

        let start = self.pos;
        let kind = match self.bump()? {
            // comment runs to the end of the line
            ';' => {
                self.pos = self.line.len();
                return None;
            }
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '[' => TokenKind::OpenBracket,
            ']' => TokenKind::CloseBracket,
            c if c.is_ascii_digit() => {
                self.take_while(is_id);
                TokenKind::Number
            }
            c if is_id(c) => {
                self.take_while(is_id);
                TokenKind::Ident
            }
            _ => TokenKind::Unknown,
        };

        Some(Token {
            kind,
            text: &self.line[start..self.pos],
        })
    }
}

/// Lexes `line`, dropping whitespace and any `;` comment.
pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut cursor = Cursor::new(line);
    std::iter::from_fn(|| cursor.advance_token()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::Result;

    fn kinds(line: &str) -> Vec<TokenKind> {
        tokenize(line).iter().map(|token| token.kind).collect()
    }

    #[test]
    fn test_instruction_line() -> Result<()> {
        let tokens = tokenize("start: MOV EAL, [count] ; load it");
        let texts: Vec<_> = tokens.iter().map(|token| token.text).collect();

        assert_eq!(texts, ["start", ":", "MOV", "EAL", ",", "[", "count", "]"]);
        assert_eq!(
            kinds("start: MOV EAL, [count]"),
            [
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Comma,
                TokenKind::OpenBracket,
                TokenKind::Ident,
                TokenKind::CloseBracket,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_numbers() -> Result<()> {
        let tokens = tokenize("0x1F, 42 b101");

        assert_eq!(tokens[0], Token { kind: TokenKind::Number, text: "0x1F" });
        assert_eq!(tokens[2], Token { kind: TokenKind::Number, text: "42" });
        assert_eq!(tokens[3], Token { kind: TokenKind::Ident, text: "b101" });

        Ok(())
    }

    #[test]
    fn test_section_and_comment() -> Result<()> {
        assert_eq!(kinds(".DATA"), [TokenKind::Dot, TokenKind::Ident]);
        assert!(tokenize("   ; only a comment").is_empty());
        assert!(tokenize("").is_empty());
        assert_eq!(kinds("MOV $"), [TokenKind::Ident, TokenKind::Unknown]);

        Ok(())
    }
}
