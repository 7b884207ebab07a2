#![allow(dead_code)]

use openscad_parser::cst::CstElement;
use openscad_parser::{Cst, CstNode, NodeKind};
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;

/// Install a test-writer subscriber.
///
/// Tests run concurrently, so only the first call wins.
pub fn init_tracing() {
    let _ = init_subscriber(Level::INFO);
}

fn init_subscriber(level: Level) -> Result<(), SetGlobalDefaultError> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .with_test_writer()
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}

/// Pieces of OpenSCAD, valid and broken, for building random sources.
pub const FRAGMENTS: &[&str] = &[
    "cube(10);",
    "sphere(r = 5);",
    "translate([1, 0, 0])",
    "union()",
    "module m(a, b = 2)",
    "function f(x) = x * 2;",
    "include <lib.scad>",
    "use <util.scad>",
    "x = 1 + 2 * 3;",
    "v = [for (i = [0:2]) i];",
    "if (a)",
    "else",
    "for (i = [0 : 1 : 3])",
    "let (t = 1)",
    "{",
    "}",
    "(",
    ")",
    "[",
    "]",
    ";",
    ",",
    "=",
    "?",
    ":",
    "x",
    "$fn",
    "1.5e3",
    "\"text\"",
    "+",
    "-",
    "*",
    "!",
    "#",
    "%",
    ".",
    "&&",
    "each",
    "@",
    "\"open",
    "/* open",
    " ",
    "\n",
    "  ",
    "// note\n",
    "/* block */",
];

/// Assert the structural invariants of a tree parsed from `source`.
///
/// - leaves reproduce the source exactly
/// - children tile their parent's range in order
/// - only missing tokens are zero-width
/// - `has_error` is the disjunction over the subtree
pub fn assert_well_formed(cst: &Cst, source: &str) {
    assert_eq!(cst.text(), source);
    assert_eq!(cst.text_len(), source.len());
    let root = cst.root();
    assert_eq!(usize::from(root.text_range().start()), 0);
    assert_eq!(usize::from(root.text_range().end()), source.len());
    check_node(&root);
}

fn check_node(node: &CstNode) {
    let range = node.text_range();
    let mut offset = range.start();
    let mut has_error = node.kind() == NodeKind::Error;
    for child in node.children() {
        let child_range = child.text_range();
        assert_eq!(child_range.start(), offset, "gap or overlap in {:?}", node.kind());
        offset = child_range.end();
        match child {
            CstElement::Node(child) => {
                has_error |= child.has_error();
                check_node(&child);
            }
            CstElement::Token(token) => {
                assert!(
                    !token.text_range().is_empty() || token.is_missing(),
                    "zero-width {:?} token",
                    token.kind()
                );
                has_error |= token.is_missing() || token.is_error();
            }
        }
    }
    assert_eq!(offset, range.end(), "children do not reach the end of {:?}", node.kind());
    assert_eq!(node.has_error(), has_error, "has_error of {:?}", node.kind());
}
