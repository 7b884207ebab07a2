//! # Source Spans
//!
//! Byte offsets with line/column coordinates for tokens and diagnostics.
//!
//! ## Example
//!
//! ```rust
//! use openscad_parser::span::{LineIndex, Span};
//!
//! let span = Span::from_bytes(0, 4);
//! assert_eq!(span.len(), 4);
//!
//! let index = LineIndex::new("a\nbc");
//! assert_eq!(index.position(3).line, 1);
//! ```

use serde::{Deserialize, Serialize};
use text_size::{TextRange, TextSize};

// =============================================================================
// POSITION
// =============================================================================

/// A location in source text.
///
/// `line` and `column` are 0-indexed; `column` counts characters, not bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Byte offset from the start of the source.
    pub byte: usize,
    /// Line number (0-indexed).
    pub line: usize,
    /// Column in characters (0-indexed).
    pub column: usize,
}

impl Position {
    /// Create a new position.
    pub const fn new(byte: usize, line: usize, column: usize) -> Self {
        Self { byte, line, column }
    }

    /// Start of the source.
    pub const fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    /// Position reached after walking over `text` starting here.
    ///
    /// ## Example
    ///
    /// ```rust
    /// let end = Position::zero().advanced_by("ab\ncd");
    /// assert_eq!((end.byte, end.line, end.column), (5, 1, 2));
    /// ```
    pub fn advanced_by(self, text: &str) -> Self {
        let mut position = self;
        for c in text.chars() {
            position.byte += c.len_utf8();
            if c == '\n' {
                position.line += 1;
                position.column = 0;
            } else {
                position.column += 1;
            }
        }
        position
    }
}

// =============================================================================
// SPAN
// =============================================================================

/// A half-open source region `[start, end)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// First position covered.
    pub start: Position,
    /// Position just past the region.
    pub end: Position,
}

impl Span {
    /// Create a span from two positions.
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a span from byte offsets only (line/column left at zero).
    ///
    /// Handy in tests and for synthetic spans.
    pub const fn from_bytes(start: usize, end: usize) -> Self {
        Self {
            start: Position::new(start, 0, 0),
            end: Position::new(end, 0, 0),
        }
    }

    /// Empty span at the start of the source.
    pub const fn zero() -> Self {
        Self::new(Position::zero(), Position::zero())
    }

    /// Length in bytes.
    pub const fn len(&self) -> usize {
        self.end.byte - self.start.byte
    }

    /// Check if the span covers no bytes.
    pub const fn is_empty(&self) -> bool {
        self.start.byte == self.end.byte
    }

    /// Byte range of the span, for slicing source text.
    pub const fn range(&self) -> std::ops::Range<usize> {
        self.start.byte..self.end.byte
    }
}

/// Anything that knows where it came from.
pub trait Spanned {
    /// Source span of the item.
    fn span(&self) -> Span;
}

// =============================================================================
// LINE INDEX
// =============================================================================

/// Maps byte offsets back to line/column positions.
///
/// Built once per source text; lookups are a binary search over line starts.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    /// Index the line starts of `text`.
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { text, line_starts }
    }

    /// Position of a byte offset. Offsets past the end clamp to the end.
    pub fn position(&self, byte: usize) -> Position {
        let byte = byte.min(self.text.len());
        let line = match self.line_starts.binary_search(&byte) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = self
            .text
            .get(line_start..byte)
            .map_or(byte - line_start, |prefix| prefix.chars().count());
        Position::new(byte, line, column)
    }

    /// Span covering a tree range.
    pub fn span(&self, range: TextRange) -> Span {
        Span::new(
            self.position(usize::from(range.start())),
            self.position(usize::from(range.end())),
        )
    }
}

/// Convert a byte offset into a tree offset.
///
/// Callers guarantee the source fits the 32-bit limit checked at parse entry.
pub(crate) fn text_size(offset: usize) -> TextSize {
    TextSize::try_from(offset).unwrap_or_else(|_| {
        panic!("offset {offset} exceeds the 32-bit source limit")
    })
}

// =============================================================================
// TESTS
// =============================================================================
