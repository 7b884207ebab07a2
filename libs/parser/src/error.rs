//! # Errors
//!
//! Syntax diagnostics and API error types for the OpenSCAD parser.
//!
//! Syntax errors never abort a parse: they live in the tree as error nodes,
//! lexical error tokens and missing tokens, and [`ParseError`]s are derived
//! from the tree on demand. The `Result`-returning API surfaces
//! ([`Language::from_grammar`](crate::Language::from_grammar) and
//! [`Parser::reparse`](crate::Parser::reparse)) use [`GrammarError`] and
//! [`EditError`].
//!
//! ## Example
//!
//! ```rust
//! let cst = openscad_parser::parse("cube(10");
//! for error in cst.errors() {
//!     println!("{error}");
//! }
//! ```

use crate::lexer::TokenKind;
use crate::span::Span;
use thiserror::Error;

// =============================================================================
// PARSE ERROR
// =============================================================================

/// A syntax diagnostic with location information.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {}:{}", .span.start.line + 1, .span.start.column + 1)]
pub struct ParseError {
    /// Error kind with details.
    pub kind: ParseErrorKind,
    /// Source location of error.
    pub span: Span,
}

impl ParseError {
    /// Create a new parse error.
    pub const fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Kinds of syntax diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// Material skipped by error recovery.
    #[error("unexpected {found}")]
    UnexpectedToken {
        /// First skipped token, or `end of file`.
        found: String,
    },

    /// Token inserted by error recovery.
    #[error("missing '{}'", .expected.display())]
    Missing {
        /// The inserted token.
        expected: TokenKind,
    },

    /// String literal without its closing quote.
    #[error("unterminated string literal")]
    UnterminatedString,

    /// Block comment without its closing `*/`.
    #[error("unterminated block comment")]
    UnterminatedComment,

    /// Include path without its closing `>`.
    #[error("unterminated include path")]
    UnterminatedPath,

    /// Character that starts no token.
    #[error("invalid character '{text}'")]
    InvalidCharacter {
        /// The offending text.
        text: String,
    },
}

impl ParseErrorKind {
    /// Classify the text of a lexical error token.
    pub fn from_error_token(text: &str) -> Self {
        if text.starts_with('"') {
            Self::UnterminatedString
        } else if text.starts_with("/*") {
            Self::UnterminatedComment
        } else if text.starts_with('<') {
            Self::UnterminatedPath
        } else {
            Self::InvalidCharacter {
                text: text.to_string(),
            }
        }
    }
}

// =============================================================================
// GRAMMAR ERROR
// =============================================================================

/// Rejected grammar definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("rule `{rule}` references undefined rule `{missing}`")]
    UndefinedRule { rule: String, missing: String },

    #[error("rule `{0}` is defined more than once")]
    DuplicateRule(String),

    #[error("rule `{0}` has no alternatives")]
    EmptyRule(String),

    #[error("precedence level `{0}` is declared more than once")]
    DuplicateLevel(String),

    #[error("rule `{rule}` uses undeclared precedence level `{level}`")]
    UnknownPrecedence { rule: String, level: String },

    #[error("token `{}` appears in more than one precedence level", .0.display())]
    DuplicatePrecedence(TokenKind),

    #[error("rule `{rule}` uses reserved token `{}`", .token.display())]
    ReservedToken { rule: String, token: TokenKind },

    #[error("grammar declares no entry point")]
    NoEntryPoint,

    #[error("entry point `{0}` is not a defined rule")]
    UndefinedEntry(String),

    #[error("entry point `{0}` must be a visible rule")]
    HiddenEntry(String),
}

// =============================================================================
// EDIT ERROR
// =============================================================================

/// Edit descriptor that does not fit the trees and texts it is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit start {start} is past its end {end}")]
    InvertedRange { start: usize, end: usize },

    #[error("edit ends at byte {end} but the old text is {len} bytes long")]
    OutOfBounds { end: usize, len: usize },

    #[error("edit implies a new text of {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("byte {0} is not on a character boundary")]
    NotCharBoundary(usize),

    #[error("source of {0} bytes exceeds the 32-bit offset limit")]
    SourceTooLarge(usize),
}

// =============================================================================
// TESTS
// =============================================================================
