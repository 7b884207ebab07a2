//! Property-based tests for the parser.
//!
//! Sources are assembled from OpenSCAD fragments (valid and broken) or drawn
//! from arbitrary text, and every tree is checked for lossless coverage,
//! determinism and agreement between incremental and full parses.

mod common;

use common::{assert_well_formed, FRAGMENTS};
use openscad_parser::{parse, InputEdit, Parser};
use proptest::prelude::*;

fn fragment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(FRAGMENTS)
}

fn source() -> impl Strategy<Value = String> {
    prop::collection::vec(fragment(), 0..24).prop_map(|parts| parts.join(" "))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn fragments_are_covered_losslessly(source in source()) {
        assert_well_formed(&parse(&source), &source);
    }

    #[test]
    fn arbitrary_text_is_covered_losslessly(source in "\\PC{0,48}") {
        assert_well_formed(&parse(&source), &source);
    }

    #[test]
    fn parsing_is_deterministic(source in source()) {
        let first = serde_json::to_string(&parse(&source).dump()).unwrap();
        let second = serde_json::to_string(&parse(&source).dump()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn reparse_equals_full_parse(
        source in source(),
        start in 0usize..256,
        len in 0usize..12,
        replacement in fragment(),
    ) {
        let start = start.min(source.len());
        let end = (start + len).min(source.len());
        let parser = Parser::new();
        let old = parser.parse(&source);
        let (edit, new_source) = InputEdit::replace(&source, start..end, replacement).unwrap();
        let new = parser.reparse(&old, &edit, &new_source).unwrap();
        assert_well_formed(&new, &new_source);
        prop_assert_eq!(new, parser.parse(&new_source));
    }

    #[test]
    fn reparse_inside_blocks_equals_full_parse(
        body in prop::collection::vec(fragment(), 0..8),
        offset in 0usize..64,
        replacement in fragment(),
    ) {
        let body = body.join(" ");
        let source = format!("module m() {{ {body} }}\nunion() {{ cube(1); {{ sphere(2); }} }}\n");
        // Edits land after `module m() {`
        let start = (12 + offset).min(source.len());
        let parser = Parser::new();
        let old = parser.parse(&source);
        let (edit, new_source) = InputEdit::replace(&source, start..start, replacement).unwrap();
        let new = parser.reparse(&old, &edit, &new_source).unwrap();
        prop_assert_eq!(new, parser.parse(&new_source));
    }
}

#[test]
fn empty_and_blank_inputs_parse() {
    for source in ["", " ", "\n\n", "\t", "// only a comment"] {
        let cst = parse(source);
        assert!(cst.is_ok(), "{source:?}");
        assert_well_formed(&cst, source);
    }
}

#[test]
fn dump_serializes_with_kinds_and_offsets() {
    let json = serde_json::to_value(parse("cube(10);").dump()).unwrap();
    assert_eq!(json["type"], "node");
    assert_eq!(json["kind"], "source_file");
    assert_eq!(json["end"], 9);
    let chain = &json["children"][0];
    assert_eq!(chain["kind"], "transform_chain");
    assert_eq!(chain["start"], 0);
    assert_eq!(chain["end"], 9);
}
