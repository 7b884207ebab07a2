//! # Tokens
//!
//! Token types for the OpenSCAD lexer.
//!
//! ## Example
//!
//! ```rust
//! use openscad_parser::lexer::{Token, TokenKind};
//! use openscad_parser::span::Span;
//!
//! let token = Token::new(TokenKind::Number, Span::from_bytes(0, 2), "10".to_string());
//! assert_eq!(token.kind, TokenKind::Number);
//! ```

use crate::span::{Span, Spanned};
use serde::{Deserialize, Serialize};

// =============================================================================
// TOKEN
// =============================================================================

/// A token produced by the lexer.
///
/// Trivia (whitespace and comments) are tokens too: the tree keeps every
/// byte of the source.
///
/// ## Example
///
/// ```rust
/// let token = Token::new(TokenKind::Identifier, Span::from_bytes(0, 4), "cube".to_string());
/// assert_eq!(token.text, "cube");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token type.
    pub kind: TokenKind,
    /// Source span.
    pub span: Span,
    /// Token text.
    pub text: String,
}

impl Token {
    /// Create a new token.
    ///
    /// ## Parameters
    ///
    /// - `kind`: Token type
    /// - `span`: Source location
    /// - `text`: Token text
    pub fn new(kind: TokenKind, span: Span, text: String) -> Self {
        Self { kind, span, text }
    }

    /// Check if token is EOF.
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// Check if token is an error.
    pub fn is_error(&self) -> bool {
        self.kind == TokenKind::Error
    }

    /// Check if token is whitespace or a comment.
    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }
}

impl Spanned for Token {
    fn span(&self) -> Span {
        self.span
    }
}

// =============================================================================
// TOKEN KIND
// =============================================================================

/// Types of tokens.
///
/// These are the terminal symbols of the grammar. The discriminant doubles
/// as the column index in the parse table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TokenKind {
    // Literals
    /// Number literal like `10` or `3.14`
    Number,
    /// String literal like `"hello"`
    String,
    /// Boolean true
    True,
    /// Boolean false
    False,
    /// Undef value
    Undef,

    // Identifiers
    /// Identifier like `cube` or `myVar`
    Identifier,
    /// Special variable like `$fn`
    SpecialVariable,
    /// Library path like `<MCAD/boxes.scad>` after `include` or `use`
    IncludePath,

    // Keywords
    /// `module` keyword
    Module,
    /// `function` keyword
    Function,
    /// `if` keyword
    If,
    /// `else` keyword
    Else,
    /// `for` keyword
    For,
    /// `let` keyword
    Let,
    /// `each` keyword
    Each,
    /// `include` keyword
    Include,
    /// `use` keyword
    Use,
    /// `echo` keyword
    Echo,
    /// `assert` keyword
    Assert,

    // Operators
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `^`
    Caret,
    /// `!`
    Bang,
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `!=`
    BangEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `?`
    Question,
    /// `:`
    Colon,

    // Delimiters
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `.`
    Dot,

    // Modifiers
    /// `#`
    Hash,

    // Trivia
    /// Run of whitespace
    Whitespace,
    /// `// ...` up to the end of the line
    LineComment,
    /// `/* ... */`
    BlockComment,

    // Meta
    /// End of file
    Eof,
    /// Error token
    Error,
}

impl TokenKind {
    /// Number of token kinds.
    pub const COUNT: usize = Self::ALL.len();

    /// Every token kind, in discriminant order.
    pub const ALL: [TokenKind; 52] = [
        Self::Number,
        Self::String,
        Self::True,
        Self::False,
        Self::Undef,
        Self::Identifier,
        Self::SpecialVariable,
        Self::IncludePath,
        Self::Module,
        Self::Function,
        Self::If,
        Self::Else,
        Self::For,
        Self::Let,
        Self::Each,
        Self::Include,
        Self::Use,
        Self::Echo,
        Self::Assert,
        Self::Plus,
        Self::Minus,
        Self::Star,
        Self::Slash,
        Self::Percent,
        Self::Caret,
        Self::Bang,
        Self::Eq,
        Self::EqEq,
        Self::BangEq,
        Self::Lt,
        Self::Gt,
        Self::LtEq,
        Self::GtEq,
        Self::AmpAmp,
        Self::PipePipe,
        Self::Question,
        Self::Colon,
        Self::LParen,
        Self::RParen,
        Self::LBracket,
        Self::RBracket,
        Self::LBrace,
        Self::RBrace,
        Self::Semicolon,
        Self::Comma,
        Self::Dot,
        Self::Hash,
        Self::Whitespace,
        Self::LineComment,
        Self::BlockComment,
        Self::Eof,
        Self::Error,
    ];

    /// Table column of this kind.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`TokenKind::index`].
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Look up a keyword by its text.
    pub fn keyword(text: &str) -> Option<Self> {
        let kind = match text {
            "true" => Self::True,
            "false" => Self::False,
            "undef" => Self::Undef,
            "module" => Self::Module,
            "function" => Self::Function,
            "if" => Self::If,
            "else" => Self::Else,
            "for" => Self::For,
            "let" => Self::Let,
            "each" => Self::Each,
            "include" => Self::Include,
            "use" => Self::Use,
            "echo" => Self::Echo,
            "assert" => Self::Assert,
            _ => return None,
        };
        Some(kind)
    }

    /// Check if this is a literal token.
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Number | Self::String | Self::True | Self::False | Self::Undef)
    }

    /// Check if this is a keyword token.
    pub const fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::Module
                | Self::Function
                | Self::If
                | Self::Else
                | Self::For
                | Self::Let
                | Self::Each
                | Self::Include
                | Self::Use
                | Self::Echo
                | Self::Assert
                | Self::True
                | Self::False
                | Self::Undef
        )
    }

    /// Check if this is an operator token.
    pub const fn is_operator(&self) -> bool {
        matches!(
            self,
            Self::Plus
                | Self::Minus
                | Self::Star
                | Self::Slash
                | Self::Percent
                | Self::Caret
                | Self::Bang
                | Self::Eq
                | Self::EqEq
                | Self::BangEq
                | Self::Lt
                | Self::Gt
                | Self::LtEq
                | Self::GtEq
                | Self::AmpAmp
                | Self::PipePipe
                | Self::Question
                | Self::Colon
        )
    }

    /// Check if this token is skipped by the grammar but kept in the tree.
    pub const fn is_trivia(&self) -> bool {
        matches!(self, Self::Whitespace | Self::LineComment | Self::BlockComment)
    }

    /// Check if this kind can appear as a grammar symbol.
    pub const fn is_terminal(&self) -> bool {
        !self.is_trivia() && !matches!(self, Self::Eof | Self::Error)
    }

    /// Check if tokens of this kind carry variable text.
    ///
    /// Named tokens print by kind in S-expressions; the rest print their text.
    pub const fn is_named(&self) -> bool {
        matches!(
            self,
            Self::Number
                | Self::String
                | Self::Identifier
                | Self::SpecialVariable
                | Self::IncludePath
                | Self::LineComment
                | Self::BlockComment
                | Self::Whitespace
        )
    }

    /// Snake-case name used in S-expressions and dumps.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Identifier => "identifier",
            Self::SpecialVariable => "special_variable",
            Self::IncludePath => "include_path",
            Self::Whitespace => "whitespace",
            Self::LineComment => "line_comment",
            Self::BlockComment => "block_comment",
            Self::Eof => "eof",
            Self::Error => "error",
            _ => self.display(),
        }
    }

    /// Get display string for error messages.
    pub const fn display(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::True => "true",
            Self::False => "false",
            Self::Undef => "undef",
            Self::Identifier => "identifier",
            Self::SpecialVariable => "special variable",
            Self::IncludePath => "include path",
            Self::Module => "module",
            Self::Function => "function",
            Self::If => "if",
            Self::Else => "else",
            Self::For => "for",
            Self::Let => "let",
            Self::Each => "each",
            Self::Include => "include",
            Self::Use => "use",
            Self::Echo => "echo",
            Self::Assert => "assert",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Caret => "^",
            Self::Bang => "!",
            Self::Eq => "=",
            Self::EqEq => "==",
            Self::BangEq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::AmpAmp => "&&",
            Self::PipePipe => "||",
            Self::Question => "?",
            Self::Colon => ":",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::Semicolon => ";",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::Hash => "#",
            Self::Whitespace => "whitespace",
            Self::LineComment => "comment",
            Self::BlockComment => "comment",
            Self::Eof => "end of file",
            Self::Error => "error",
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_literal() {
        assert!(TokenKind::Number.is_literal());
        assert!(TokenKind::String.is_literal());
        assert!(!TokenKind::Identifier.is_literal());
    }

    #[test]
    fn test_token_is_keyword() {
        assert!(TokenKind::Module.is_keyword());
        assert!(TokenKind::True.is_keyword());
        assert!(!TokenKind::Identifier.is_keyword());
    }

    #[test]
    fn test_token_display() {
        assert_eq!(TokenKind::LParen.display(), "(");
        assert_eq!(TokenKind::Identifier.display(), "identifier");
    }

    #[test]
    fn test_all_is_in_discriminant_order() {
        for (index, kind) in TokenKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), index, "{kind:?} out of order");
            assert_eq!(TokenKind::from_index(index), Some(*kind));
        }
        assert_eq!(TokenKind::from_index(TokenKind::COUNT), None);
    }

    #[test]
    fn test_trivia_is_not_terminal() {
        assert!(TokenKind::Whitespace.is_trivia());
        assert!(!TokenKind::Whitespace.is_terminal());
        assert!(!TokenKind::Eof.is_terminal());
        assert!(!TokenKind::Error.is_terminal());
        assert!(TokenKind::Semicolon.is_terminal());
    }

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(TokenKind::keyword("echo"), Some(TokenKind::Echo));
        assert_eq!(TokenKind::keyword("cube"), None);
    }
}
