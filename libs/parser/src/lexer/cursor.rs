//! # Character Cursor
//!
//! Peekable character cursor for the lexer.
//! Tracks position (byte, line, column) as it advances.
//!
//! ## Example
//!
//! ```rust
//! use openscad_parser::lexer::Cursor;
//!
//! let mut cursor = Cursor::new("hello");
//! assert_eq!(cursor.peek(), Some('h'));
//! cursor.advance();
//! assert_eq!(cursor.peek(), Some('e'));
//! ```

use crate::span::Position;

// =============================================================================
// CURSOR
// =============================================================================

/// Character cursor with position tracking.
///
/// The cursor can start anywhere in the source, which is what lets the
/// scanner resume from an arbitrary offset.
///
/// ## Example
///
/// ```rust
/// let mut cursor = Cursor::new("cube");
/// assert_eq!(cursor.advance(), Some('c'));
/// assert_eq!(cursor.position().byte, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    source: &'a str,
    position: Position,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the start of the source.
    pub fn new(source: &'a str) -> Self {
        Self::at(source, Position::zero())
    }

    /// Create a cursor at `position`.
    ///
    /// ## Parameters
    ///
    /// - `source`: Full source text
    /// - `position`: Where to start; the byte offset must lie on a char
    ///   boundary, offsets past the end are clamped
    ///
    /// ## Example
    ///
    /// ```rust
    /// let cursor = Cursor::at("a b", Position::new(2, 0, 2));
    /// assert_eq!(cursor.peek(), Some('b'));
    /// ```
    pub fn at(source: &'a str, position: Position) -> Self {
        let mut position = position;
        position.byte = position.byte.min(source.len());
        Self { source, position }
    }

    /// Get current position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Check if at end of file.
    pub fn is_eof(&self) -> bool {
        self.position.byte >= self.source.len()
    }

    /// Text not yet consumed.
    pub fn rest(&self) -> &'a str {
        self.source.get(self.position.byte..).unwrap_or("")
    }

    /// Text between `start` and the current position.
    pub fn slice_from(&self, start: Position) -> &'a str {
        self.source
            .get(start.byte..self.position.byte)
            .unwrap_or("")
    }

    /// Peek at current character without consuming it.
    ///
    /// ## Example
    ///
    /// ```rust
    /// let cursor = Cursor::new("abc");
    /// assert_eq!(cursor.peek(), Some('a'));
    /// assert_eq!(cursor.peek(), Some('a')); // Still 'a'
    /// ```
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Advance to next character.
    ///
    /// ## Returns
    ///
    /// Character that was consumed, or None if at EOF
    ///
    /// ## Example
    ///
    /// ```rust
    /// let mut cursor = Cursor::new("ab");
    /// assert_eq!(cursor.advance(), Some('a'));
    /// assert_eq!(cursor.advance(), Some('b'));
    /// assert_eq!(cursor.advance(), None);
    /// ```
    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;

        self.position.byte += c.len_utf8();
        if c == '\n' {
            self.position.line += 1;
            self.position.column = 0;
        } else {
            self.position.column += 1;
        }

        Some(c)
    }

    /// Consume the current character if it equals `expected`.
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advance while predicate is true.
    ///
    /// ## Example
    ///
    /// ```rust
    /// let mut cursor = Cursor::new("abc123");
    /// cursor.advance_while(|c| c.is_alphabetic());
    /// assert_eq!(cursor.peek(), Some('1'));
    /// ```
    pub fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            self.advance();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
