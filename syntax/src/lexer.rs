//! The lexer, which parses a source file into a stream of tokens.
//!
//! Finch tokenizes context-free, so a single set of lexing rules suffices.
//! Newlines are significant and are produced as tokens; the parser decides
//! where they act as statement separators.

use crate::error::ParseError;
use crate::source::{SourceCursor, SourceFile};
use crate::tokens::{Token, TokenInfo};

/// Tokenizes a file into a series of tokens.
pub(crate) struct Lexer {
    cursor: SourceCursor,
}

impl From<SourceFile> for Lexer {
    fn from(file: SourceFile) -> Self {
        Self {
            cursor: SourceCursor::from(file),
        }
    }
}

impl Lexer {
    /// Advance to the next token in the source.
    pub fn lex(&mut self) -> Result<TokenInfo, ParseError> {
        self.cursor.mark();

        let token = self.next_token()?;

        log::trace!("token: {:?}", token);

        Ok(TokenInfo {
            token,
            span: self.cursor.span(),
        })
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        loop {
            match self.cursor.advance() {
                // Simple one-character tokens.
                Some(b'(') => return Ok(Token::LeftParen),
                Some(b')') => return Ok(Token::RightParen),
                Some(b'{') => return Ok(Token::LeftBrace),
                Some(b'}') => return Ok(Token::RightBrace),
                Some(b'[') => return Ok(Token::LeftBracket),
                Some(b']') => return Ok(Token::RightBracket),
                Some(b'|') => return Ok(Token::Pipe),
                Some(b'.') => return Ok(Token::EndOfStatement),
                Some(b',') => return Ok(Token::Comma),

                // Ignore horizontal whitespace.
                Some(b' ') | Some(0x09) | Some(0x0c) => continue,

                // Start of a line comment, ignore all following characters
                // until end of line.
                Some(b'/') if self.cursor.peek() == Some(b'/') => {
                    loop {
                        match self.cursor.peek() {
                            Some(b'\r') | Some(b'\n') | None => break,
                            _ => self.cursor.advance(),
                        };
                    }
                    continue;
                }

                // To handle newlines in a platform-generic way, any of the
                // following sequences are treated as a single newline token:
                // \r \r\n \n
                Some(b'\n') => return Ok(Token::EndOfLine),
                Some(b'\r') => {
                    if self.cursor.peek() == Some(b'\n') {
                        self.cursor.advance();
                    }
                    return Ok(Token::EndOfLine);
                }

                // String literal.
                Some(b'"') => return self.lex_string_literal(),

                // Number literal.
                Some(byte) if byte.is_ascii_digit() => return self.lex_number_literal(byte),

                // Name or keyword.
                Some(byte) if is_name_start(byte) => return Ok(self.lex_name(byte)),

                // Operator, possibly one of the assignment arrows.
                Some(byte) if is_operator_char(byte) => return Ok(self.lex_operator(byte)),

                Some(_) => return Err(self.create_error("unexpected character")),

                None => return Ok(Token::EndOfFile),
            }
        }
    }

    fn lex_string_literal(&mut self) -> Result<Token, ParseError> {
        let mut bytes = Vec::new();

        loop {
            match self.cursor.advance() {
                // End of the string.
                Some(b'"') => break,

                // Character escape.
                Some(b'\\') => match self.cursor.advance() {
                    Some(byte) => bytes.push(translate_escape(byte)),
                    None => return Err(self.create_error("unexpected eof in string literal")),
                },

                // Just a regular byte in the string.
                Some(byte) => bytes.push(byte),

                None => return Err(self.create_error("unexpected eof, expecting end of string \"")),
            }
        }

        match String::from_utf8(bytes) {
            Ok(string) => Ok(Token::String(string)),
            Err(_) => Err(self.create_error("string literal is not valid utf-8")),
        }
    }

    fn lex_number_literal(&mut self, first_byte: u8) -> Result<Token, ParseError> {
        let mut bytes = vec![first_byte];
        let mut seen_decimal = false;

        while let Some(byte) = self.cursor.peek() {
            if byte.is_ascii_digit() {
                bytes.push(byte);
                self.cursor.advance();
            } else if byte == b'.' && !seen_decimal {
                // Only consume the point when a digit follows; a bare point
                // after a number is a statement separator.
                match self.cursor.peek_second() {
                    Some(next) if next.is_ascii_digit() => {
                        seen_decimal = true;
                        bytes.push(byte);
                        self.cursor.advance();
                    }
                    _ => break,
                }
            } else {
                break;
            }
        }

        let string = String::from_utf8(bytes).unwrap();

        match string.parse() {
            Ok(number) => Ok(Token::Number(number)),
            Err(_) => Err(self.create_error("malformed number literal")),
        }
    }

    fn lex_name(&mut self, first_byte: u8) -> Token {
        let mut bytes = vec![first_byte];

        while let Some(byte) = self.cursor.peek() {
            if !is_name_char(byte) {
                break;
            }

            self.cursor.advance();
            bytes.push(byte);
        }

        let mut name = String::from_utf8(bytes).unwrap();

        // A name directly followed by a colon is one part of a keyword
        // message, colon included.
        if self.cursor.peek() == Some(b':') {
            self.cursor.advance();
            name.push(':');
            return Token::Keyword(name);
        }

        Token::Name(name)
    }

    fn lex_operator(&mut self, first_byte: u8) -> Token {
        let mut bytes = vec![first_byte];

        while let Some(byte) = self.cursor.peek() {
            if !is_operator_char(byte) {
                break;
            }

            self.cursor.advance();
            bytes.push(byte);
        }

        let operator = String::from_utf8(bytes).unwrap();

        match operator.as_str() {
            "<-" => Token::DefineArrow,
            "<--" => Token::AssignArrow,
            _ => Token::Operator(operator),
        }
    }

    fn create_error<S: Into<String>>(&self, message: S) -> ParseError {
        ParseError::new(message, self.cursor.pos().into())
    }
}

/// Get the value corresponding to a given escape character.
fn translate_escape(byte: u8) -> u8 {
    match byte {
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        _ => byte, // interpret all other chars as their literal
    }
}

fn is_name_start(byte: u8) -> bool {
    byte == b'_' || byte.is_ascii_alphabetic()
}

fn is_name_char(byte: u8) -> bool {
    byte == b'_' || byte == b'-' || byte.is_ascii_alphanumeric()
}

fn is_operator_char(byte: u8) -> bool {
    matches!(
        byte,
        b'+' | b'-' | b'*' | b'/' | b'<' | b'>' | b'=' | b'!' | b'%' | b'&' | b'~' | b'?'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_tokens {
        (
            $($source:expr => [
                $($token:expr,)*
            ];)*
        ) => {
            $({
                use Token::*;
                let mut lexer = Lexer::from(SourceFile::from($source));
                $(
                    assert_eq!(lexer.lex().unwrap().token, $token);
                )*
            })*
        };
    }

    #[test]
    fn punctuation_and_arrows() {
        assert_tokens! {
            "a <- 1" => [
                Name("a".into()),
                DefineArrow,
                Number(1.0),
                EndOfFile,
            ];
            "a <-- a + 1" => [
                Name("a".into()),
                AssignArrow,
                Name("a".into()),
                Operator("+".into()),
                Number(1.0),
                EndOfFile,
            ];
            "( ) { } [ ] | . ," => [
                LeftParen, RightParen,
                LeftBrace, RightBrace,
                LeftBracket, RightBracket,
                Pipe, EndOfStatement, Comma,
                EndOfFile,
            ];
        }
    }

    #[test]
    fn names_and_keywords() {
        assert_tokens! {
            "write-line: _count Object" => [
                Keyword("write-line:".into()),
                Name("_count".into()),
                Name("Object".into()),
                EndOfFile,
            ];
            "add-field: \"name\" value: \"Finch\"" => [
                Keyword("add-field:".into()),
                String("name".into()),
                Keyword("value:".into()),
                String("Finch".into()),
                EndOfFile,
            ];
        }
    }

    #[test]
    fn numbers_and_separators() {
        assert_tokens! {
            "1.5" => [
                Number(1.5),
                EndOfFile,
            ];
            // The point terminates the statement rather than the literal.
            "1. x" => [
                Number(1.0),
                EndOfStatement,
                Name("x".into()),
                EndOfFile,
            ];
        }
    }

    #[test]
    fn comments_and_newlines() {
        assert_tokens! {
            "a // trailing\r\nb" => [
                Name("a".into()),
                EndOfLine,
                Name("b".into()),
                EndOfFile,
            ];
        }
    }

    #[test]
    fn string_escapes() {
        assert_tokens! {
            r#""a\n\"b\"""# => [
                String("a\n\"b\"".into()),
                EndOfFile,
            ];
        }
    }
}
