//! # OpenSCAD Grammar
//!
//! The built-in grammar.
//!
//! ## Grammar
//!
//! ```text
//! source_file      → statement*
//! statement        → ";" | include <path> | use <path> | assignment
//!                  | module_declaration | function_declaration | child
//! child            → block | transform_chain | for_block | if_block
//!                  | let_block | modifier
//! transform_chain  → module_call (";" | child)
//! module_call      → (identifier | echo | assert) arguments
//! expression       → literal | identifier | special_variable
//!                  | unary | binary | ternary | call | index | member
//!                  | list | range | let | function literal | echo | assert
//! ```
//!
//! ## Precedence
//!
//! Lowest to highest: prefix forms (`let`, `function`, `echo`, `assert`,
//! comprehensions), dangling `if`, `else`, `?:`, `||`, `&&`, `== !=`,
//! `< > <= >=`, `+ -`, `* / %`, `^` (right), unary, call/index/member.

use crate::cst::NodeKind;
use crate::grammar::{alt, r, t, Alternative, Assoc, GrammarSpec, Sym};
use crate::lexer::TokenKind as T;

// Precedence level names
const PREFIX: &str = "Prefix";
const IF_THEN: &str = "IfThen";
const UNARY: &str = "Unary";

/// The OpenSCAD grammar with `source_file` and `block` entry points.
pub fn openscad() -> GrammarSpec {
    let spec = GrammarSpec::new()
        .precedence(PREFIX, Assoc::Right, &[])
        .precedence(IF_THEN, Assoc::NonAssoc, &[])
        .precedence("Else", Assoc::NonAssoc, &[T::Else])
        .precedence("Ternary", Assoc::Right, &[T::Question, T::Colon])
        .precedence("Or", Assoc::Left, &[T::PipePipe])
        .precedence("And", Assoc::Left, &[T::AmpAmp])
        .precedence("Equality", Assoc::Left, &[T::EqEq, T::BangEq])
        .precedence("Comparison", Assoc::Left, &[T::Lt, T::Gt, T::LtEq, T::GtEq])
        .precedence("Additive", Assoc::Left, &[T::Plus, T::Minus])
        .precedence("Multiplicative", Assoc::Left, &[T::Star, T::Slash, T::Percent])
        .precedence("Power", Assoc::Right, &[T::Caret])
        .precedence(UNARY, Assoc::Right, &[])
        .precedence("Call", Assoc::Left, &[T::LParen, T::LBracket, T::Dot]);

    let spec = statements(spec);
    let spec = expressions(spec);
    spec.entry("source_file").entry("block")
}

// =============================================================================
// STATEMENTS
// =============================================================================

fn statements(spec: GrammarSpec) -> GrammarSpec {
    spec.node(NodeKind::SourceFile, "source_file", vec![alt([r("_statements")])])
        .hidden(
            "_statements",
            vec![alt([]), alt([r("_statements"), r("_statement")])],
        )
        .hidden(
            "_statement",
            vec![
                alt([r("empty_statement")]),
                alt([r("include_statement")]),
                alt([r("use_statement")]),
                alt([r("assignment")]),
                alt([r("module_declaration")]),
                alt([r("function_declaration")]),
                alt([r("_child")]),
            ],
        )
        .hidden(
            "_child_statement",
            vec![alt([r("empty_statement")]), alt([r("_child")])],
        )
        .hidden(
            "_child",
            vec![
                alt([r("block")]),
                alt([r("transform_chain")]),
                alt([r("for_block")]),
                alt([r("if_block")]),
                alt([r("let_block")]),
                alt([r("modifier")]),
            ],
        )
        .node(NodeKind::EmptyStatement, "empty_statement", vec![alt([t(T::Semicolon)])])
        .node(
            NodeKind::Block,
            "block",
            vec![alt([t(T::LBrace), r("_statements"), t(T::RBrace)])],
        )
        .node(
            NodeKind::IncludeStatement,
            "include_statement",
            vec![alt([t(T::Include), t(T::IncludePath)])],
        )
        .node(
            NodeKind::UseStatement,
            "use_statement",
            vec![alt([t(T::Use), t(T::IncludePath)])],
        )
        .node(
            NodeKind::Assignment,
            "assignment",
            vec![alt([r("_variable"), t(T::Eq), r("_expr"), t(T::Semicolon)])],
        )
        .hidden(
            "_variable",
            vec![alt([t(T::Identifier)]), alt([t(T::SpecialVariable)])],
        )
        .node(
            NodeKind::ModuleDeclaration,
            "module_declaration",
            vec![alt([
                t(T::Module),
                t(T::Identifier),
                r("parameters"),
                r("_child_statement"),
            ])],
        )
        .node(
            NodeKind::FunctionDeclaration,
            "function_declaration",
            vec![alt([
                t(T::Function),
                t(T::Identifier),
                r("parameters"),
                t(T::Eq),
                r("_expr"),
                t(T::Semicolon),
            ])],
        )
        .node(
            NodeKind::TransformChain,
            "transform_chain",
            vec![
                alt([r("module_call"), t(T::Semicolon)]),
                alt([r("module_call"), r("_child")]),
            ],
        )
        .node(
            NodeKind::ModuleCall,
            "module_call",
            vec![
                alt([t(T::Identifier), r("arguments")]),
                alt([t(T::Echo), r("arguments")]),
                alt([t(T::Assert), r("arguments")]),
            ],
        )
        .node(
            NodeKind::ForBlock,
            "for_block",
            vec![alt([t(T::For), r("bindings"), r("_child_statement")])],
        )
        .node(
            NodeKind::IfBlock,
            "if_block",
            vec![
                alt([t(T::If), r("_condition"), r("_child_statement")]).prec(IF_THEN),
                alt([
                    t(T::If),
                    r("_condition"),
                    r("_child_statement"),
                    t(T::Else),
                    r("_child_statement"),
                ]),
            ],
        )
        .hidden(
            "_condition",
            vec![alt([t(T::LParen), r("_expr"), t(T::RParen)])],
        )
        .node(
            NodeKind::LetBlock,
            "let_block",
            vec![alt([t(T::Let), r("bindings"), r("_child_statement")])],
        )
        .node(
            NodeKind::Modifier,
            "modifier",
            [T::Star, T::Bang, T::Hash, T::Percent]
                .into_iter()
                .map(|modifier| alt([t(modifier), r("_child_statement")]))
                .collect(),
        )
        .node(NodeKind::Arguments, "arguments", delimited(T::LParen, "_argument", T::RParen))
        .hidden(&list_rule("_argument"), comma_separated("_argument"))
        .hidden(
            "_argument",
            vec![alt([r("_expr")]), alt([r("named_argument")])],
        )
        .node(
            NodeKind::NamedArgument,
            "named_argument",
            vec![alt([r("_variable"), t(T::Eq), r("_expr")])],
        )
        .node(
            NodeKind::Parameters,
            "parameters",
            delimited(T::LParen, "parameter", T::RParen),
        )
        .hidden(&list_rule("parameter"), comma_separated("parameter"))
        .node(
            NodeKind::Parameter,
            "parameter",
            vec![
                alt([r("_variable")]),
                alt([r("_variable"), t(T::Eq), r("_expr")]),
            ],
        )
        .node(NodeKind::Bindings, "bindings", delimited(T::LParen, "binding", T::RParen))
        .hidden(&list_rule("binding"), comma_separated("binding"))
        .node(
            NodeKind::Binding,
            "binding",
            vec![alt([r("_variable"), t(T::Eq), r("_expr")])],
        )
}

// =============================================================================
// EXPRESSIONS
// =============================================================================

fn expressions(spec: GrammarSpec) -> GrammarSpec {
    let binary_operators = [
        T::PipePipe,
        T::AmpAmp,
        T::EqEq,
        T::BangEq,
        T::Lt,
        T::Gt,
        T::LtEq,
        T::GtEq,
        T::Plus,
        T::Minus,
        T::Star,
        T::Slash,
        T::Percent,
        T::Caret,
    ];

    spec.hidden(
        "_expr",
        vec![
            alt([t(T::Number)]),
            alt([t(T::String)]),
            alt([t(T::True)]),
            alt([t(T::False)]),
            alt([t(T::Undef)]),
            alt([t(T::Identifier)]),
            alt([t(T::SpecialVariable)]),
            alt([r("parenthesized_expression")]),
            alt([r("unary_expression")]),
            alt([r("binary_expression")]),
            alt([r("ternary_expression")]),
            alt([r("function_call")]),
            alt([r("index_expression")]),
            alt([r("dot_expression")]),
            alt([r("list")]),
            alt([r("range")]),
            alt([r("let_expression")]),
            alt([r("function_literal")]),
            alt([r("echo_expression")]),
            alt([r("assert_expression")]),
        ],
    )
    .node(
        NodeKind::ParenthesizedExpression,
        "parenthesized_expression",
        vec![alt([t(T::LParen), r("_expr"), t(T::RParen)])],
    )
    .node(
        NodeKind::UnaryExpression,
        "unary_expression",
        [T::Minus, T::Plus, T::Bang]
            .into_iter()
            .map(|operator| alt([t(operator), r("_expr")]).prec(UNARY))
            .collect(),
    )
    .node(
        NodeKind::BinaryExpression,
        "binary_expression",
        binary_operators
            .into_iter()
            .map(|operator| alt([r("_expr"), t(operator), r("_expr")]))
            .collect(),
    )
    .node(
        NodeKind::TernaryExpression,
        "ternary_expression",
        vec![alt([
            r("_expr"),
            t(T::Question),
            r("_expr"),
            t(T::Colon),
            r("_expr"),
        ])],
    )
    .node(
        NodeKind::FunctionCall,
        "function_call",
        vec![alt([r("_expr"), r("arguments")])],
    )
    .node(
        NodeKind::IndexExpression,
        "index_expression",
        vec![alt([r("_expr"), t(T::LBracket), r("_expr"), t(T::RBracket)])],
    )
    .node(
        NodeKind::DotExpression,
        "dot_expression",
        vec![alt([r("_expr"), t(T::Dot), t(T::Identifier)])],
    )
    .node(NodeKind::List, "list", delimited(T::LBracket, "_list_element", T::RBracket))
    .hidden(&list_rule("_list_element"), comma_separated("_list_element"))
    .node(
        NodeKind::Range,
        "range",
        vec![
            alt([t(T::LBracket), r("_expr"), t(T::Colon), r("_expr"), t(T::RBracket)]),
            alt([
                t(T::LBracket),
                r("_expr"),
                t(T::Colon),
                r("_expr"),
                t(T::Colon),
                r("_expr"),
                t(T::RBracket),
            ]),
        ],
    )
    .hidden(
        "_list_element",
        vec![
            alt([r("_expr")]),
            alt([r("for_clause")]),
            alt([r("if_clause")]),
            alt([r("each_clause")]),
        ],
    )
    .node(
        NodeKind::ForClause,
        "for_clause",
        vec![alt([t(T::For), r("bindings"), r("_list_element")]).prec(PREFIX)],
    )
    .node(
        NodeKind::IfClause,
        "if_clause",
        vec![
            alt([t(T::If), r("_condition"), r("_list_element")]).prec(IF_THEN),
            alt([
                t(T::If),
                r("_condition"),
                r("_list_element"),
                t(T::Else),
                r("_list_element"),
            ]),
        ],
    )
    .node(
        NodeKind::EachClause,
        "each_clause",
        vec![alt([t(T::Each), r("_list_element")]).prec(PREFIX)],
    )
    .node(
        NodeKind::LetExpression,
        "let_expression",
        vec![alt([t(T::Let), r("bindings"), r("_expr")]).prec(PREFIX)],
    )
    .node(
        NodeKind::FunctionLiteral,
        "function_literal",
        vec![alt([t(T::Function), r("parameters"), r("_expr")]).prec(PREFIX)],
    )
    .node(
        NodeKind::EchoExpression,
        "echo_expression",
        prefixed_by_call(T::Echo),
    )
    .node(
        NodeKind::AssertExpression,
        "assert_expression",
        prefixed_by_call(T::Assert),
    )
}

/// Name of the hidden rule listing `item`s separated by commas.
fn list_rule(item: &str) -> String {
    format!("_{}_list", item.trim_start_matches('_'))
}

/// `item | list "," item`, left-recursive.
fn comma_separated(item: &str) -> Vec<Alternative> {
    vec![
        alt([r(item)]),
        alt([Sym::Rule(list_rule(item)), t(T::Comma), r(item)]),
    ]
}

/// `open close | open items close | open items "," close`, allowing a
/// trailing comma.
fn delimited(open: T, item: &str, close: T) -> Vec<Alternative> {
    let items = Sym::Rule(list_rule(item));
    vec![
        alt([t(open), t(close)]),
        alt([t(open), items.clone(), t(close)]),
        alt([t(open), items, t(T::Comma), t(close)]),
    ]
}

/// `echo(...) expr` and `assert(...) expr`, with the expression optional.
fn prefixed_by_call(keyword: T) -> Vec<Alternative> {
    vec![
        alt([t(keyword), r("arguments"), r("_expr")]).prec(PREFIX),
        alt([t(keyword), r("arguments")]).prec(PREFIX),
    ]
}
