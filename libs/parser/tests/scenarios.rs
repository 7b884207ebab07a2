mod common;

use common::{assert_well_formed, init_tracing};
use openscad_parser::{parse, CstNode, NodeKind, ParseErrorKind};

const SAMPLE: &str = r#"// Parametric gear blank
include <MCAD/units.scad>
use <lib/shapes.scad>

$fn = 64;
teeth = 12;
cfg = [["large", 20], ["small", 8]];

function spokes(n, r = 5) = [
    for (i = [0 : n - 1])
        let (a = i * 360 / n)
            [r * cos(a), r * sin(a)]
];

function mirror_x(pts) = [for (p = pts) if (p.x > 0) p else [-p.x, p.y]];
function flatten(l) = [each l[0], each l[1]];

module blank(big = true, h = 4) {
    r = big ? cfg.large : cfg.small;
    difference() {
        cylinder(r = r, h = h);
        for (s = spokes(teeth)) translate([s[0], s[1], -1]) cylinder(r = 1, h = h + 2);
    }
}

if (teeth > 10) % blank(); else # blank(false);

echo("teeth", teeth);
assert(teeth % 2 == 0, "even tooth count");
* sphere(100);
! translate([0, 0, 10]) blank(h = 2 ^ 3);
"#;

fn kinds(nodes: impl Iterator<Item = CstNode>) -> Vec<NodeKind> {
    nodes.map(|node| node.kind()).collect()
}

#[test]
fn single_call_produces_transform_chain() {
    init_tracing();
    let cst = parse("cube(10);");
    assert!(cst.is_ok());

    let chain = cst.root().find_child(NodeKind::TransformChain).unwrap();
    assert_eq!(u32::from(chain.text_range().start()), 0);
    assert_eq!(u32::from(chain.text_range().end()), 9);

    let call = chain.find_child(NodeKind::ModuleCall).unwrap();
    assert_eq!(call.text(), "cube(10)");
    assert_eq!(kinds(call.child_nodes()), vec![NodeKind::Arguments]);
    assert_eq!(call.first_significant_token().unwrap().text(), "cube");
}

#[test]
fn unterminated_call_is_repaired_in_place() {
    let cst = parse("cube(10");
    assert_well_formed(&cst, "cube(10");
    assert_eq!(u32::from(cst.root().text_range().end()), 7);

    let call = cst
        .root()
        .descendants()
        .find(|node| node.kind() == NodeKind::ModuleCall)
        .unwrap();
    assert!(call.has_error());
    assert_eq!(call.text(), "cube(10");

    let errors = cst.errors();
    assert!(!errors.is_empty());
    assert!(errors
        .iter()
        .all(|error| matches!(error.kind, ParseErrorKind::Missing { .. })));
}

#[test]
fn errors_stay_on_their_line() {
    let source = "a = 1;\nb = ;\nc = 3;\n";
    let cst = parse(source);
    assert_well_formed(&cst, source);

    let errors = cst.errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].span.start.line, 1);

    let assignments = cst.root().find_children(NodeKind::Assignment);
    let names: Vec<String> = assignments
        .iter()
        .map(|node| node.first_significant_token().unwrap().text().to_string())
        .collect();
    assert_eq!(names, vec!["a", "c"]);
    assert!(assignments.iter().all(|node| !node.has_error()));
}

#[test]
fn realistic_document_parses_cleanly() {
    let cst = parse(SAMPLE);
    assert!(cst.is_ok(), "{:?}", cst.errors());
    assert_well_formed(&cst, SAMPLE);

    let top = kinds(cst.root().child_nodes());
    assert_eq!(
        top,
        vec![
            NodeKind::IncludeStatement,
            NodeKind::UseStatement,
            NodeKind::Assignment,
            NodeKind::Assignment,
            NodeKind::Assignment,
            NodeKind::FunctionDeclaration,
            NodeKind::FunctionDeclaration,
            NodeKind::FunctionDeclaration,
            NodeKind::ModuleDeclaration,
            NodeKind::IfBlock,
            NodeKind::TransformChain,
            NodeKind::TransformChain,
            NodeKind::Modifier,
            NodeKind::Modifier,
        ]
    );

    let all = kinds(cst.root().descendants());
    for kind in [
        NodeKind::ForClause,
        NodeKind::IfClause,
        NodeKind::EachClause,
        NodeKind::LetExpression,
        NodeKind::Range,
        NodeKind::TernaryExpression,
        NodeKind::DotExpression,
        NodeKind::IndexExpression,
        NodeKind::ForBlock,
        NodeKind::Block,
        NodeKind::NamedArgument,
        NodeKind::Parameter,
    ] {
        assert!(all.contains(&kind), "no {kind:?} in sample");
    }
}

#[test]
fn if_else_keeps_modifiers_on_their_branches() {
    let cst = parse("if (x) % cube(1); else # sphere(1);");
    assert!(cst.is_ok(), "{:?}", cst.errors());
    let if_block = cst.root().find_child(NodeKind::IfBlock).unwrap();
    let modifiers = if_block.find_children(NodeKind::Modifier);
    assert_eq!(modifiers.len(), 2);
    assert_eq!(modifiers[0].text(), "% cube(1);");
    assert_eq!(modifiers[1].text(), "# sphere(1);");
}

#[test]
fn include_path_is_one_token() {
    let cst = parse("include <a b/c.scad>\ncube(1);");
    assert!(cst.is_ok(), "{:?}", cst.errors());
    let include = cst.root().find_child(NodeKind::IncludeStatement).unwrap();
    assert_eq!(include.text(), "include <a b/c.scad>");
}
