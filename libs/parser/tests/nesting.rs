mod common;

use common::init_tracing;
use openscad_parser::{parse, NodeKind, ParseErrorKind};

fn parenthesized(depth: usize) -> String {
    format!("x = {}1{};", "(".repeat(depth), ")".repeat(depth))
}

#[test]
fn deep_nesting_parses_compares_and_drops() {
    init_tracing();
    let source = parenthesized(100_000);
    let cst = parse(&source);
    assert!(cst.is_ok());
    assert_eq!(cst.text_len(), source.len());

    let again = parse(&source);
    assert_eq!(cst, again);
    assert_ne!(cst, parse(&parenthesized(99_999)));
    drop(cst);
    drop(again);
}

#[test]
fn deep_unclosed_nesting_recovers() {
    let source = format!("x = {}1;\ny = 2;\n", "(".repeat(20_000));
    let cst = parse(&source);
    assert_eq!(cst.text(), source);

    let errors = cst.errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(
        errors[0].kind,
        ParseErrorKind::UnexpectedToken {
            found: "'x'".to_string()
        }
    );
    let assignment = cst.root().find_child(NodeKind::Assignment).unwrap();
    assert_eq!(assignment.text(), "y = 2;");
    assert!(!assignment.has_error());
}
