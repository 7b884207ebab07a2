mod common;

use common::{assert_well_formed, init_tracing};
use openscad_parser::cst::GreenNode;
use openscad_parser::{Cst, EditError, InputEdit, NodeKind, Parser};

const DOCUMENT: &str = "\
module wheel(r = 10) {
    rotate([90, 0, 0]) cylinder(r = r, h = 4);
}

module axle() {
    cube([2, 40, 2], center = true);
}

translate([0, 0, 5]) {
    wheel();
    axle();
}
";

fn nodes_of(cst: &Cst, kind: NodeKind) -> Vec<GreenNode> {
    cst.root()
        .descendants()
        .filter(|node| node.kind() == kind)
        .map(|node| node.green().clone())
        .collect()
}

fn apply(parser: &Parser<'_>, old: &Cst, source: &str, needle: &str, replacement: &str) -> (Cst, String) {
    let start = source.find(needle).unwrap();
    let (edit, new_source) =
        InputEdit::replace(source, start..start + needle.len(), replacement).unwrap();
    let new = parser.reparse(old, &edit, &new_source).unwrap();
    (new, new_source)
}

#[test]
fn edit_in_one_module_shares_the_others() {
    init_tracing();
    let parser = Parser::new();
    let old = parser.parse(DOCUMENT);
    assert!(old.is_ok(), "{:?}", old.errors());

    let (new, new_source) = apply(&parser, &old, DOCUMENT, "h = 4", "h = 6");
    assert_well_formed(&new, &new_source);
    assert_eq!(new, parser.parse(&new_source));

    let old_modules = nodes_of(&old, NodeKind::ModuleDeclaration);
    let new_modules = nodes_of(&new, NodeKind::ModuleDeclaration);
    assert!(!old_modules[0].ptr_eq(&new_modules[0]));
    assert!(old_modules[1].ptr_eq(&new_modules[1]));

    // The trailing translate block is untouched as well
    let old_blocks = nodes_of(&old, NodeKind::Block);
    let new_blocks = nodes_of(&new, NodeKind::Block);
    assert!(old_blocks.last().unwrap().ptr_eq(new_blocks.last().unwrap()));
}

#[test]
fn offsets_after_the_edit_shift() {
    let parser = Parser::new();
    let old = parser.parse(DOCUMENT);
    let (new, new_source) = apply(&parser, &old, DOCUMENT, "r = 10", "r = 12.5");

    let axle = |cst: &Cst| {
        cst.root()
            .descendants()
            .filter(|node| node.kind() == NodeKind::ModuleDeclaration)
            .nth(1)
            .unwrap()
            .text_range()
    };
    // Edit is in the parameters, outside any block: full parse, same result
    assert_eq!(new, parser.parse(&new_source));
    assert_eq!(
        u32::from(axle(&new).start()),
        u32::from(axle(&old).start()) + 2
    );
}

#[test]
fn successive_edits_stay_equivalent() {
    let parser = Parser::new();
    let mut source = DOCUMENT.to_string();
    let mut cst = parser.parse(&source);
    for (needle, replacement) in [
        ("wheel();", "wheel(r = 3);"),
        ("axle();", "axle(); sphere(1);"),
        ("sphere(1);", "sphere(1"),
        ("sphere(1", "sphere(2);"),
        ("center = true", "center = false"),
    ] {
        let (next, next_source) = apply(&parser, &cst, &source, needle, replacement);
        assert_eq!(next, parser.parse(&next_source), "after {needle:?} -> {replacement:?}");
        cst = next;
        source = next_source;
    }
    assert!(cst.is_ok(), "{:?}", cst.errors());
}

#[test]
fn errors_are_derived_from_reparsed_trees() {
    let parser = Parser::new();
    let old = parser.parse(DOCUMENT);
    let (new, _) = apply(&parser, &old, DOCUMENT, "axle();", "axle(");
    let errors = new.errors();
    assert!(!errors.is_empty());
    assert!(errors.iter().all(|error| error.span.start.line == 10));
}

#[test]
fn invalid_edits_are_rejected() {
    let parser = Parser::new();
    let old = parser.parse("cube(1);");
    let (edit, _) = InputEdit::replace("cube(1);", 5..6, "2").unwrap();
    assert_eq!(
        parser.reparse(&old, &edit, "cube(1);;"),
        Err(EditError::LengthMismatch {
            expected: 8,
            actual: 9
        })
    );
    let (edit, _) = InputEdit::replace("cube(1); cube(2);", 12..16, "").unwrap();
    assert!(matches!(
        parser.reparse(&old, &edit, "cube(1); cub"),
        Err(EditError::OutOfBounds { end: 16, len: 8 })
    ));
}
