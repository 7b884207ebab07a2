//! # OpenSCAD Lexer
//!
//! Tokenizes OpenSCAD source code into tokens, trivia included.
//!
//! The primitive is [`scan`]: one token from an arbitrary position, with the
//! scanner mode passed in and handed back. [`Lexer`] threads the mode through
//! successive calls and yields tokens lazily.
//!
//! ## Example
//!
//! ```rust
//! use openscad_parser::lexer::{Lexer, TokenKind};
//!
//! let tokens = Lexer::new("cube(10);").tokenize();
//! assert_eq!(tokens[0].kind, TokenKind::Identifier);
//! ```

mod cursor;
mod token;

pub use cursor::Cursor;
pub use token::{Token, TokenKind};

use crate::span::{Position, Span};

// =============================================================================
// LEX MODE
// =============================================================================

/// Scanner context carried between tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LexMode {
    /// Ordinary code.
    #[default]
    Normal,
    /// After `include` or `use`: `<...>` is a library path.
    IncludePath,
}

impl LexMode {
    /// Mode in effect after a token of `kind` was scanned in this mode.
    fn after(self, kind: TokenKind) -> Self {
        match kind {
            TokenKind::Include | TokenKind::Use => Self::IncludePath,
            kind if kind.is_trivia() => self,
            _ => Self::Normal,
        }
    }
}

// =============================================================================
// SCAN
// =============================================================================

/// Scan one token starting at `start`.
///
/// ## Parameters
///
/// - `source`: Full source text
/// - `start`: Where scanning begins (must be on a char boundary)
/// - `mode`: Scanner mode in effect at `start`
///
/// ## Returns
///
/// The token and the mode for the next call, or `None` at end of input.
/// A returned token is never empty.
///
/// ## Example
///
/// ```rust
/// let (token, mode) = scan("use <a.scad>", Position::new(3, 0, 3), LexMode::IncludePath).unwrap();
/// assert_eq!(token.kind, TokenKind::Whitespace);
/// assert_eq!(mode, LexMode::IncludePath);
/// ```
pub fn scan(source: &str, start: Position, mode: LexMode) -> Option<(Token, LexMode)> {
    let mut cursor = Cursor::at(source, start);
    let start = cursor.position();
    let c = cursor.advance()?;

    let kind = match c {
        c if c.is_whitespace() => {
            cursor.advance_while(char::is_whitespace);
            TokenKind::Whitespace
        }

        '/' if cursor.peek() == Some('/') => {
            cursor.advance_while(|c| c != '\n');
            TokenKind::LineComment
        }
        '/' if cursor.peek() == Some('*') => scan_block_comment(&mut cursor),

        '<' if mode == LexMode::IncludePath => scan_include_path(&mut cursor),

        // Single-character tokens
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        '[' => TokenKind::LBracket,
        ']' => TokenKind::RBracket,
        '{' => TokenKind::LBrace,
        '}' => TokenKind::RBrace,
        ';' => TokenKind::Semicolon,
        ',' => TokenKind::Comma,
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Star,
        '/' => TokenKind::Slash,
        '%' => TokenKind::Percent,
        '^' => TokenKind::Caret,
        '#' => TokenKind::Hash,
        '?' => TokenKind::Question,
        ':' => TokenKind::Colon,

        // Two-character tokens
        '=' if cursor.eat('=') => TokenKind::EqEq,
        '=' => TokenKind::Eq,
        '!' if cursor.eat('=') => TokenKind::BangEq,
        '!' => TokenKind::Bang,
        '<' if cursor.eat('=') => TokenKind::LtEq,
        '<' => TokenKind::Lt,
        '>' if cursor.eat('=') => TokenKind::GtEq,
        '>' => TokenKind::Gt,
        '&' if cursor.eat('&') => TokenKind::AmpAmp,
        '|' if cursor.eat('|') => TokenKind::PipePipe,

        '"' => scan_string(&mut cursor),

        '.' if cursor.peek().is_some_and(|c| c.is_ascii_digit()) => {
            scan_number(&mut cursor, true)
        }
        '.' => TokenKind::Dot,
        '0'..='9' => scan_number(&mut cursor, false),

        c if is_ident_start(c) => {
            cursor.advance_while(is_ident_continue);
            TokenKind::keyword(cursor.slice_from(start)).unwrap_or(TokenKind::Identifier)
        }

        '$' if cursor.peek().is_some_and(is_ident_continue) => {
            cursor.advance_while(is_ident_continue);
            TokenKind::SpecialVariable
        }

        // Lone `&`, `|`, `$` and anything unknown
        _ => TokenKind::Error,
    };

    let end = cursor.position();
    let token = Token::new(kind, Span::new(start, end), cursor.slice_from(start).to_string());
    Some((token, mode.after(kind)))
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Rest of a `/* ... */` comment; the `/` is already consumed.
fn scan_block_comment(cursor: &mut Cursor<'_>) -> TokenKind {
    cursor.advance();
    while let Some(c) = cursor.advance() {
        if c == '*' && cursor.eat('/') {
            return TokenKind::BlockComment;
        }
    }
    TokenKind::Error
}

/// Rest of a string literal; the opening quote is already consumed.
fn scan_string(cursor: &mut Cursor<'_>) -> TokenKind {
    while let Some(c) = cursor.advance() {
        match c {
            '"' => return TokenKind::String,
            '\\' => {
                cursor.advance();
            }
            _ => {}
        }
    }
    TokenKind::Error
}

/// Rest of a `<path>`; the `<` is already consumed. Paths end at the line.
fn scan_include_path(cursor: &mut Cursor<'_>) -> TokenKind {
    while let Some(c) = cursor.peek() {
        match c {
            '>' => {
                cursor.advance();
                return TokenKind::IncludePath;
            }
            '\n' => break,
            _ => {
                cursor.advance();
            }
        }
    }
    TokenKind::Error
}

/// Rest of a number literal.
///
/// `seen_dot` is set when the literal started with `.`; the first character
/// is already consumed either way.
fn scan_number(cursor: &mut Cursor<'_>, seen_dot: bool) -> TokenKind {
    cursor.advance_while(|c| c.is_ascii_digit());

    if !seen_dot && cursor.peek() == Some('.') {
        cursor.advance();
        cursor.advance_while(|c| c.is_ascii_digit());
    }

    // Exponent only when digits follow; `2e` is a number then an identifier.
    if matches!(cursor.peek(), Some('e' | 'E')) {
        let mut lookahead = cursor.clone();
        lookahead.advance();
        if matches!(lookahead.peek(), Some('+' | '-')) {
            lookahead.advance();
        }
        if lookahead.peek().is_some_and(|c| c.is_ascii_digit()) {
            lookahead.advance_while(|c| c.is_ascii_digit());
            *cursor = lookahead;
        }
    }

    TokenKind::Number
}

// =============================================================================
// LEXER
// =============================================================================

/// OpenSCAD lexer.
///
/// Iterates over every token of the source, trivia included. Concatenating
/// the token texts reproduces the source exactly.
///
/// ## Example
///
/// ```rust
/// let kinds: Vec<_> = Lexer::new("a = 1;").map(|t| t.kind).collect();
/// assert_eq!(kinds[0], TokenKind::Identifier);
/// assert_eq!(kinds[1], TokenKind::Whitespace);
/// ```
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    position: Position,
    mode: LexMode,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for source text.
    pub fn new(source: &'a str) -> Self {
        Self::at(source, Position::zero(), LexMode::Normal)
    }

    /// Create a lexer that resumes at `position` in `mode`.
    pub fn at(source: &'a str, position: Position, mode: LexMode) -> Self {
        Self { source, position, mode }
    }

    /// Position of the next token.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Mode in effect for the next token.
    pub fn mode(&self) -> LexMode {
        self.mode
    }

    /// Tokenize the rest of the source.
    ///
    /// ## Returns
    ///
    /// Vector of tokens ending with a zero-width EOF token.
    ///
    /// ## Example
    ///
    /// ```rust
    /// let tokens = Lexer::new("cube(10);").tokenize();
    /// assert!(tokens.last().is_some_and(|t| t.kind == TokenKind::Eof));
    /// ```
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens: Vec<Token> = self.by_ref().collect();
        let eof = self.position;
        tokens.push(Token::new(TokenKind::Eof, Span::new(eof, eof), String::new()));
        tokens
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let (token, mode) = scan(self.source, self.position, self.mode)?;
        self.position = token.span.end;
        self.mode = mode;
        Some(token)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn significant(source: &str) -> Vec<Token> {
        Lexer::new(source)
            .tokenize()
            .into_iter()
            .filter(|t| !t.is_trivia())
            .collect()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        significant(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_cube() {
        let tokens = Lexer::new("cube(10);").tokenize();

        // cube, (, 10, ), ;, EOF = 6 tokens
        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "cube");
        assert_eq!(tokens[1].kind, TokenKind::LParen);
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(tokens[2].text, "10");
        assert_eq!(tokens[3].kind, TokenKind::RParen);
        assert_eq!(tokens[4].kind, TokenKind::Semicolon);
        assert_eq!(tokens[5].kind, TokenKind::Eof);
        assert_eq!(tokens[5].span.start.byte, 9);
    }

    #[test]
    fn test_tokenize_keeps_trivia() {
        let tokens = Lexer::new("// comment\ncube(10); /* c */").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::LineComment);
        assert_eq!(tokens[0].text, "// comment");
        assert_eq!(tokens[1].kind, TokenKind::Whitespace);
        assert_eq!(tokens[2].text, "cube");
        assert_eq!(tokens[2].span.start.line, 1);
        assert_eq!(tokens[8].kind, TokenKind::BlockComment);
    }

    #[test]
    fn test_token_texts_reproduce_source() {
        let source = "module m(a=1) { echo(\"x\\\"y\"); } // end\n$fn = 2e3;";
        let text: String = Lexer::new(source).map(|t| t.text).collect();
        assert_eq!(text, source);
    }

    #[test]
    fn test_tokenize_keywords() {
        assert_eq!(
            kinds("true false undef echo assert"),
            vec![
                TokenKind::True,
                TokenKind::False,
                TokenKind::Undef,
                TokenKind::Echo,
                TokenKind::Assert,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_special_variable() {
        let tokens = significant("$fn");
        assert_eq!(tokens[0].kind, TokenKind::SpecialVariable);
        assert_eq!(tokens[0].text, "$fn");
    }

    #[test]
    fn test_tokenize_operators() {
        assert_eq!(
            kinds("== != <= >= && || !"),
            vec![
                TokenKind::EqEq,
                TokenKind::BangEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::Bang,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers() {
        let tokens = significant("3.14 .5 1e-3 2e x.y");
        assert_eq!(tokens[0].text, "3.14");
        assert_eq!(tokens[1].text, ".5");
        assert_eq!(tokens[2].text, "1e-3");
        assert_eq!(tokens[3].text, "2");
        assert_eq!(tokens[4].kind, TokenKind::Identifier);
        assert_eq!(tokens[4].text, "e");
        assert_eq!(tokens[6].kind, TokenKind::Dot);
    }

    #[test]
    fn test_include_path_mode() {
        let tokens = significant("include <MCAD/boxes.scad>\na < b;");
        assert_eq!(tokens[0].kind, TokenKind::Include);
        assert_eq!(tokens[1].kind, TokenKind::IncludePath);
        assert_eq!(tokens[1].text, "<MCAD/boxes.scad>");
        assert_eq!(tokens[3].kind, TokenKind::Lt);
    }

    #[test]
    fn test_include_path_unterminated_stops_at_line_end() {
        let tokens = Lexer::new("use <lib\nx;").tokenize();
        assert_eq!(tokens[2].kind, TokenKind::Error);
        assert_eq!(tokens[2].text, "<lib");
        assert_eq!(tokens[3].kind, TokenKind::Whitespace);
        assert_eq!(tokens[4].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_unterminated_string_and_comment() {
        let tokens = significant("x = \"abc");
        assert_eq!(tokens[2].kind, TokenKind::Error);
        assert_eq!(tokens[2].text, "\"abc");

        let tokens = significant("/* open");
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].text, "/* open");
    }

    #[test]
    fn test_invalid_characters_advance() {
        let tokens = significant("@ & | $ é");
        let errors: Vec<_> = tokens.iter().filter(|t| t.is_error()).map(|t| t.text.as_str()).collect();
        assert_eq!(errors, vec!["@", "&", "|", "$", "é"]);
    }

    #[test]
    fn test_scan_resumes_mid_source() {
        let source = "a = 1;\nb = 2;";
        let (token, mode) = scan(source, Position::new(7, 1, 0), LexMode::Normal).expect("token");
        assert_eq!(token.text, "b");
        assert_eq!(token.span.start.line, 1);
        assert_eq!(mode, LexMode::Normal);
        assert!(scan(source, Position::new(source.len(), 1, 6), LexMode::Normal).is_none());
    }
}
