//! Abstractions over reading files and source code used in the parser.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// A reference to a location in a source file. Useful for error messages.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Position {
    /// The line number. Begins at 1.
    pub line: usize,

    /// The column position in the current line. Begins at 1.
    pub column: usize,

    /// Byte offset from the beginning of the file.
    pub offset: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span of characters in a source file.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Span {
    /// The starting position.
    pub start: Position,

    /// The ending position.
    pub end: Position,
}

impl From<Position> for Span {
    fn from(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

/// Holds information about a source file being parsed in memory.
#[derive(Clone, Debug)]
pub struct SourceFile {
    name: Option<String>,
    buffer: String,
}

impl SourceFile {
    /// Create a new file map using an in-memory buffer.
    pub fn buffer(name: impl Into<Option<String>>, buffer: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buffer: buffer.into(),
        }
    }

    /// Create a new named file map from an in-memory buffer.
    pub fn named(name: impl Into<String>, buffer: impl Into<String>) -> Self {
        Self::buffer(name.into(), buffer)
    }

    /// Open a file as a file map.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let name = path.file_name().map(|s| s.to_string_lossy().into_owned());

        fs::read_to_string(path).map(|string| Self::buffer(name, string))
    }

    /// Get the name of the file.
    pub fn name(&self) -> &str {
        self.name
            .as_ref()
            .map(String::as_str)
            .unwrap_or("<unknown>")
    }

    pub fn source(&self) -> &str {
        &self.buffer
    }
}

impl<'a> From<&'a str> for SourceFile {
    fn from(source: &str) -> Self {
        Self::buffer(None, source)
    }
}

impl From<String> for SourceFile {
    fn from(source: String) -> Self {
        Self::buffer(None, source)
    }
}

/// A cursor over the bytes of a source file that tracks line and column
/// positions as it advances.
pub(crate) struct SourceCursor {
    file: SourceFile,
    pos: Position,
    mark: Position,
}

impl From<SourceFile> for SourceCursor {
    fn from(file: SourceFile) -> Self {
        Self {
            file,
            pos: Position::default(),
            mark: Position::default(),
        }
    }
}

impl SourceCursor {
    /// Get the current position in the file.
    pub fn pos(&self) -> Position {
        self.pos
    }

    /// Remember the current position as the start of a token.
    pub fn mark(&mut self) {
        self.mark = self.pos;
    }

    /// Get the span from the last mark to the current position.
    pub fn span(&self) -> Span {
        Span {
            start: self.mark,
            end: self.pos,
        }
    }

    /// Look at the next byte without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.file.buffer.as_bytes().get(self.pos.offset).copied()
    }

    /// Look one byte past the next one without consuming anything.
    pub fn peek_second(&self) -> Option<u8> {
        self.file.buffer.as_bytes().get(self.pos.offset + 1).copied()
    }

    /// Consume the next byte.
    pub fn advance(&mut self) -> Option<u8> {
        match self.file.buffer.as_bytes().get(self.pos.offset) {
            Some(&b'\n') => {
                self.pos.offset += 1;
                self.pos.line += 1;
                self.pos.column = 1;
                Some(b'\n')
            }
            Some(&byte) => {
                self.pos.offset += 1;
                self.pos.column += 1;
                Some(byte)
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_from_string() {
        let s = "hello world";
        let mut cursor = SourceCursor::from(SourceFile::from(s));

        for expected in s.bytes() {
            assert_eq!(cursor.advance(), Some(expected));
        }

        assert_eq!(cursor.advance(), None);
    }

    #[test]
    fn test_position_tracking() {
        let mut cursor = SourceCursor::from(SourceFile::from("a\nb"));

        cursor.advance();
        assert_eq!(cursor.pos().line, 1);
        cursor.advance();
        assert_eq!(cursor.pos().line, 2);
        assert_eq!(cursor.pos().column, 1);
    }
}
