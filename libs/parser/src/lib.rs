//! # OpenSCAD Parser (Pure Rust)
//!
//! An incremental, error-tolerant parser for OpenSCAD source code.
//! No C dependencies - compiles directly to WASM.
//!
//! ## Architecture
//!
//! ```text
//! Source Text → Lexer → Tokens → LALR(1) Engine → CST
//!                                    ↑
//!                      Grammar → Parse Table (built once)
//! ```
//!
//! - [`lexer`]: re-entrant scanner with an explicit mode
//! - [`grammar`]: declarative grammar and LALR(1) table generation
//! - [`language()`]: the process-wide OpenSCAD table
//! - [`parser`]: table-driven engine with local error recovery
//! - [`cst`]: lossless green/red syntax tree
//! - [`incremental`]: block-level reparsing after edits
//!
//! ## Example
//!
//! ```rust
//! use openscad_parser::parse;
//!
//! let cst = parse("cube(10);");
//! assert!(cst.errors().is_empty());
//! ```

pub mod cst;
pub mod error;
pub mod grammar;
pub mod incremental;
mod language;
pub mod lexer;
pub mod parser;
pub mod span;

// Re-export public API
pub use config::constants::ParserConfig;
pub use cst::{Cst, CstNode, CstToken, NodeKind, SyntaxDump};
pub use error::{EditError, GrammarError, ParseError, ParseErrorKind};
pub use incremental::InputEdit;
pub use language::{language, Language};
pub use parser::Parser;
pub use span::{Position, Span, Spanned};

// =============================================================================
// PUBLIC API
// =============================================================================

/// Parse OpenSCAD source code into a Concrete Syntax Tree.
///
/// This is the main entry point for the parser.
///
/// ## Parameters
///
/// - `source`: OpenSCAD source code string
///
/// ## Returns
///
/// `Cst` covering every byte of `source`, with syntax errors recorded in
/// the tree
///
/// ## Example
///
/// ```rust
/// use openscad_parser::parse;
///
/// let cst = parse("cube(10);");
/// assert!(cst.is_ok());
/// assert_eq!(cst.root().kind(), openscad_parser::NodeKind::SourceFile);
/// ```
///
/// ## Error Handling
///
/// The parser recovers from errors and always produces a tree.
/// Check `cst.is_ok()` for success and `cst.errors()` for diagnostics.
///
/// ```rust
/// use openscad_parser::parse;
///
/// let cst = parse("cube(;"); // Syntax error
/// assert!(!cst.is_ok());
/// println!("Errors: {:?}", cst.errors());
/// ```
pub fn parse(source: &str) -> Cst {
    Parser::new().parse(source)
}

// =============================================================================
// TESTS
// =============================================================================
