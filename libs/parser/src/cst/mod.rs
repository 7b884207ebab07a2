//! # Concrete Syntax Tree (CST)
//!
//! Lossless syntax trees for OpenSCAD source code. Every byte of the source,
//! whitespace and comments included, is covered by exactly one leaf token.
//!
//! The tree has two layers:
//!
//! - [`green`]: immutable, reference-counted nodes storing kinds, children and
//!   lengths. Shared between tree versions after incremental reparses.
//! - [`node`]: red cursors ([`CstNode`], [`CstToken`]) that add absolute
//!   offsets and parent back-references on demand.
//!
//! ## Example
//!
//! ```rust
//! use openscad_parser::cst::NodeKind;
//!
//! let cst = openscad_parser::parse("cube(10);");
//! assert_eq!(cst.root().kind(), NodeKind::SourceFile);
//! assert_eq!(
//!     cst.to_sexp(),
//!     "(source_file (transform_chain (module_call (identifier) (arguments (number)))))"
//! );
//! ```

pub mod green;
mod kind;
pub mod node;

pub use green::{GreenElement, GreenNode, GreenToken};
pub use kind::NodeKind;
pub use node::{CstChildren, CstElement, CstNode, CstToken, CstTokens};

use std::fmt::Write as _;

use config::constants::{STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES};
use serde::{Deserialize, Serialize};
use stacker::maybe_grow;
use text_size::TextSize;

use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::TokenKind;
use crate::span::LineIndex;

// =============================================================================
// CST
// =============================================================================

/// Concrete Syntax Tree result.
///
/// Immutable. Cloning shares the whole tree. Equality compares structure,
/// so a reparsed tree equals the tree a full parse of the same text yields.
///
/// ## Example
///
/// ```rust
/// let cst = openscad_parser::parse("cube(10);");
/// if cst.is_ok() {
///     println!("Parsed successfully!");
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cst {
    green: GreenNode,
}

impl Cst {
    /// Wrap a green root.
    pub fn new(green: GreenNode) -> Self {
        Self { green }
    }

    /// Red cursor at the root.
    pub fn root(&self) -> CstNode {
        CstNode::new_root(self.green.clone())
    }

    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    /// Length in bytes of the source this tree was parsed from.
    pub fn text_len(&self) -> usize {
        usize::from(self.green.text_len())
    }

    /// True if the tree contains any error node, lexical error or missing token.
    pub fn has_error(&self) -> bool {
        self.green.has_error()
    }

    /// Check if parsing was successful (no errors).
    pub fn is_ok(&self) -> bool {
        !self.has_error()
    }

    /// The source text, reconstructed from the leaves.
    pub fn text(&self) -> String {
        self.green.text()
    }

    /// Diagnostics for every error in the tree, in source order.
    ///
    /// ## Example
    ///
    /// ```rust
    /// let cst = openscad_parser::parse("cube(10");
    /// let messages: Vec<String> = cst.errors().iter().map(|e| e.to_string()).collect();
    /// assert_eq!(messages, vec!["missing ')' at 1:8", "missing ';' at 1:8"]);
    /// ```
    pub fn errors(&self) -> Vec<ParseError> {
        if !self.has_error() {
            return Vec::new();
        }

        let text = self.text();
        let index = LineIndex::new(&text);
        let root = self.root();
        let mut errors: Vec<(TextSize, ParseError)> = Vec::new();

        for node in root.descendants() {
            if node.kind() != NodeKind::Error
                || node.ancestors().any(|a| a.kind() == NodeKind::Error)
            {
                continue;
            }
            let significant: Vec<CstToken> = node
                .tokens()
                .filter(|token| !token.is_trivia() && !token.is_missing())
                .collect();
            let found = match significant.first() {
                // Lexical errors and missing tokens report themselves.
                Some(_) if significant.iter().all(CstToken::is_error) => continue,
                Some(token) => format!("'{}'", token.text()),
                None if node.tokens().any(|token| token.is_missing()) => continue,
                None => "syntax".to_string(),
            };
            let range = node.text_range();
            errors.push((
                range.start(),
                ParseError::new(ParseErrorKind::UnexpectedToken { found }, index.span(range)),
            ));
        }

        for token in root.tokens() {
            let kind = if token.is_missing() {
                ParseErrorKind::Missing {
                    expected: token.kind(),
                }
            } else if token.is_error() {
                ParseErrorKind::from_error_token(token.text())
            } else {
                continue;
            };
            let range = token.text_range();
            errors.push((range.start(), ParseError::new(kind, index.span(range))));
        }

        errors.sort_by_key(|(start, _)| *start);
        errors.into_iter().map(|(_, error)| error).collect()
    }

    /// Compact S-expression of the tree.
    ///
    /// Shows visible nodes and named tokens (identifiers, literals, paths).
    /// Trivia and punctuation are omitted; recovery output appears as
    /// `(ERROR ...)` and `(MISSING ";")`.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        write_sexp(&self.green, &mut out);
        out
    }

    /// Full-fidelity serializable dump: every node and token with offsets.
    pub fn dump(&self) -> SyntaxDump {
        dump_node(&self.green, TextSize::from(0))
    }
}

fn write_sexp(node: &GreenNode, out: &mut String) {
    maybe_grow(STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES, || {
        out.push('(');
        out.push_str(node.kind().name());
        for child in node.children() {
            match child {
                GreenElement::Node(child) => {
                    out.push(' ');
                    write_sexp(child, out);
                }
                GreenElement::Token(token) if token.is_missing() => {
                    let _ = write!(out, " (MISSING \"{}\")", token.kind().display());
                }
                GreenElement::Token(token)
                    if token.kind().is_named() && !token.kind().is_trivia() =>
                {
                    let _ = write!(out, " ({})", token.kind().name());
                }
                GreenElement::Token(_) => {}
            }
        }
        out.push(')');
    })
}

// =============================================================================
// DUMP
// =============================================================================

/// Serializable snapshot of a syntax tree.
///
/// Two parses of the same text produce byte-identical serializations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyntaxDump {
    Node {
        kind: NodeKind,
        start: u32,
        end: u32,
        has_error: bool,
        children: Vec<SyntaxDump>,
    },
    Token {
        kind: TokenKind,
        start: u32,
        end: u32,
        text: String,
    },
}

fn dump_node(node: &GreenNode, offset: TextSize) -> SyntaxDump {
    maybe_grow(STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES, || {
        let mut children = Vec::with_capacity(node.children().len());
        let mut child_offset = offset;
        for child in node.children() {
            children.push(match child {
                GreenElement::Node(child) => dump_node(child, child_offset),
                GreenElement::Token(token) => SyntaxDump::Token {
                    kind: token.kind(),
                    start: child_offset.into(),
                    end: (child_offset + token.text_len()).into(),
                    text: token.text().to_string(),
                },
            });
            child_offset += child.text_len();
        }
        SyntaxDump::Node {
            kind: node.kind(),
            start: offset.into(),
            end: (offset + node.text_len()).into(),
            has_error: node.has_error(),
            children,
        }
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, text: &str) -> GreenElement {
        GreenToken::new(kind, text).into()
    }

    fn broken_call() -> Cst {
        // `cube(10` with recovery output
        let args = GreenNode::new(
            NodeKind::Arguments,
            vec![
                tok(TokenKind::LParen, "("),
                tok(TokenKind::Number, "10"),
                GreenToken::missing(TokenKind::RParen).into(),
            ],
        );
        let call = GreenNode::new(
            NodeKind::ModuleCall,
            vec![tok(TokenKind::Identifier, "cube"), args.into()],
        );
        let chain = GreenNode::new(
            NodeKind::TransformChain,
            vec![call.into(), GreenToken::missing(TokenKind::Semicolon).into()],
        );
        Cst::new(GreenNode::new(NodeKind::SourceFile, vec![chain.into()]))
    }

    #[test]
    fn test_sexp_marks_missing_tokens() {
        assert_eq!(
            broken_call().to_sexp(),
            "(source_file (transform_chain (module_call (identifier) \
             (arguments (number) (MISSING \")\"))) (MISSING \";\")))"
        );
    }

    #[test]
    fn test_errors_from_missing_tokens() {
        let cst = broken_call();
        assert!(cst.has_error());
        let errors = cst.errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0].kind,
            ParseErrorKind::Missing {
                expected: TokenKind::RParen
            }
        );
        assert_eq!(errors[1].span.start.byte, 7);
        assert!(errors[1].span.is_empty());
    }

    #[test]
    fn test_errors_from_error_node() {
        let error = GreenNode::new(
            NodeKind::Error,
            vec![tok(TokenKind::RParen, ")"), tok(TokenKind::Whitespace, " ")],
        );
        let root = GreenNode::new(
            NodeKind::SourceFile,
            vec![tok(TokenKind::Whitespace, "\n"), error.into()],
        );
        let errors = Cst::new(root).errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].kind,
            ParseErrorKind::UnexpectedToken {
                found: "')'".to_string()
            }
        );
        assert_eq!(errors[0].span.start.line, 1);
    }

    #[test]
    fn test_lexical_error_reported_once() {
        let error = GreenNode::new(NodeKind::Error, vec![tok(TokenKind::Error, "@")]);
        let root = GreenNode::new(NodeKind::SourceFile, vec![error.into()]);
        let errors = Cst::new(root).errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].kind,
            ParseErrorKind::InvalidCharacter {
                text: "@".to_string()
            }
        );
    }

    #[test]
    fn test_dump_offsets() {
        let dump = broken_call().dump();
        let SyntaxDump::Node { end, children, .. } = dump else {
            panic!("root should be a node");
        };
        assert_eq!(end, 7);
        assert_eq!(children.len(), 1);
    }
}
