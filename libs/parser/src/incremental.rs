//! # Incremental Reparsing
//!
//! Updates a tree after a text edit by reparsing only the innermost block
//! around it.
//!
//! A candidate is a `{ ... }` block whose braces lie strictly outside the
//! edited range. Its new text is parsed on its own with the `block` entry
//! point; if that succeeds cleanly the new block replaces the old one and
//! only its ancestors are rebuilt. Every other subtree is shared with the old
//! tree. When no candidate parses cleanly the whole document is reparsed.
//!
//! The result is always the tree a full parse of the new text produces: the
//! parser state right after `{` is the same in every context, the scanner is
//! in its default mode at both braces, and the tokens outside the block are
//! unchanged.
//!
//! ## Example
//!
//! ```rust
//! use openscad_parser::{InputEdit, Parser};
//!
//! let parser = Parser::new();
//! let old_source = "union() { cube(1); }";
//! let old = parser.parse(old_source);
//!
//! let (edit, new_source) = InputEdit::replace(old_source, 15..16, "10")?;
//! let new = parser.reparse(&old, &edit, &new_source)?;
//! assert_eq!(new, parser.parse(&new_source));
//! ```

use std::ops::Range;

use config::constants::MAX_SOURCE_LEN;
use serde::{Deserialize, Serialize};
use text_size::TextSize;
use tracing::debug;

use crate::cst::{Cst, CstElement, CstNode, GreenNode, NodeKind};
use crate::error::EditError;
use crate::lexer::TokenKind;
use crate::parser::Parser;
use crate::span::{text_size, LineIndex, Position};

// =============================================================================
// INPUT EDIT
// =============================================================================

/// One contiguous text replacement: `[start, old_end)` of the old text
/// became `[start, new_end)` of the new text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputEdit {
    pub start: Position,
    pub old_end: Position,
    pub new_end: Position,
}

impl InputEdit {
    /// Replace `range` of `old_source` with `replacement`.
    ///
    /// Returns the edit and the new text.
    ///
    /// ## Example
    ///
    /// ```rust
    /// let (edit, text) = InputEdit::replace("a = 1;\nb = 2;", 11..12, "42")?;
    /// assert_eq!(text, "a = 1;\nb = 42;");
    /// assert_eq!((edit.start.line, edit.start.column), (1, 4));
    /// ```
    pub fn replace(
        old_source: &str,
        range: Range<usize>,
        replacement: &str,
    ) -> Result<(Self, String), EditError> {
        if range.start > range.end {
            return Err(EditError::InvertedRange {
                start: range.start,
                end: range.end,
            });
        }
        if range.end > old_source.len() {
            return Err(EditError::OutOfBounds {
                end: range.end,
                len: old_source.len(),
            });
        }
        for offset in [range.start, range.end] {
            if !old_source.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary(offset));
            }
        }

        let index = LineIndex::new(old_source);
        let start = index.position(range.start);
        let edit = Self {
            start,
            old_end: index.position(range.end),
            new_end: start.advanced_by(replacement),
        };

        let mut new_source =
            String::with_capacity(old_source.len() - range.len() + replacement.len());
        new_source.push_str(&old_source[..range.start]);
        new_source.push_str(replacement);
        new_source.push_str(&old_source[range.end..]);
        Ok((edit, new_source))
    }

    /// Replaced bytes of the old text.
    pub fn old_range(&self) -> Range<usize> {
        self.start.byte..self.old_end.byte
    }

    /// Inserted bytes of the new text.
    pub fn new_range(&self) -> Range<usize> {
        self.start.byte..self.new_end.byte
    }

    /// Check the edit against the old text length and the new text.
    pub fn validate(&self, old_len: usize, new_source: &str) -> Result<(), EditError> {
        if new_source.len() > MAX_SOURCE_LEN {
            return Err(EditError::SourceTooLarge(new_source.len()));
        }
        for end in [self.old_end.byte, self.new_end.byte] {
            if self.start.byte > end {
                return Err(EditError::InvertedRange {
                    start: self.start.byte,
                    end,
                });
            }
        }
        if self.old_end.byte > old_len {
            return Err(EditError::OutOfBounds {
                end: self.old_end.byte,
                len: old_len,
            });
        }
        let expected = old_len - self.old_range().len() + self.new_range().len();
        if expected != new_source.len() {
            return Err(EditError::LengthMismatch {
                expected,
                actual: new_source.len(),
            });
        }
        for offset in [self.start.byte, self.new_end.byte] {
            if !new_source.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary(offset));
            }
        }
        Ok(())
    }
}

// =============================================================================
// REPARSE
// =============================================================================

impl Parser<'_> {
    /// Tree for `new_source`, which is the text of `old` with `edit` applied.
    ///
    /// Equal to `self.parse(new_source)`, but subtrees outside the reparsed
    /// block are shared with `old`.
    pub fn reparse(&self, old: &Cst, edit: &InputEdit, new_source: &str) -> Result<Cst, EditError> {
        edit.validate(old.text_len(), new_source)?;

        let start = text_size(edit.start.byte);
        let end = text_size(edit.old_end.byte);
        for block in enclosing_blocks(&old.root(), start, end) {
            let range = block.text_range();
            let region_end = usize::from(range.end()) - edit.old_end.byte + edit.new_end.byte;
            let region = &new_source[usize::from(range.start())..region_end];

            match self.parse_exact(NodeKind::Block, region) {
                Some(green) if !green.has_error() && usize::from(green.text_len()) == region.len() => {
                    debug!(
                        old = ?range,
                        new_len = region.len(),
                        "reparsed enclosing block"
                    );
                    return Ok(Cst::new(splice(&block, green)));
                }
                _ => debug!(block = ?range, "block does not reparse cleanly"),
            }
        }

        debug!(bytes = new_source.len(), "no reusable block, reparsing document");
        Ok(self.parse(new_source))
    }
}

/// Blocks whose real braces enclose `start..end`, innermost first.
fn enclosing_blocks(root: &CstNode, start: TextSize, end: TextSize) -> Vec<CstNode> {
    let encloses = |node: &CstNode| {
        let range = node.text_range();
        range.start() < start && end < range.end()
    };
    let mut blocks = Vec::new();
    let mut node = root.clone();
    loop {
        if node.kind() == NodeKind::Block && encloses(&node) && has_real_braces(&node) {
            blocks.push(node.clone());
        }
        match node.child_nodes().find(|child| encloses(child)) {
            Some(child) => node = child,
            None => break,
        }
    }
    blocks.reverse();
    blocks
}

fn has_real_braces(block: &CstNode) -> bool {
    let is_real = |child: Option<CstElement>, kind: TokenKind| {
        child
            .and_then(CstElement::into_token)
            .is_some_and(|token| token.kind() == kind && !token.is_missing())
    };
    let count = block.child_count();
    count >= 2
        && is_real(block.child(0), TokenKind::LBrace)
        && is_real(block.child(count - 1), TokenKind::RBrace)
}

/// Root of a copy of `old`'s tree with `old` replaced by `new`, sharing
/// everything off the path to the root.
fn splice(old: &CstNode, new: GreenNode) -> GreenNode {
    let mut green = new;
    let mut node = old.clone();
    while let Some(parent) = node.parent() {
        green = parent.green().replace_child(node.index(), green.into());
        node = parent;
    }
    green
}

// =============================================================================
// TESTS
// =============================================================================
