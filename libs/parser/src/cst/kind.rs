//! # Node Kinds
//!
//! Nonterminal kinds of the concrete syntax tree. Terminals are
//! [`TokenKind`](crate::lexer::TokenKind)s.

use serde::{Deserialize, Serialize};

// =============================================================================
// NODE KIND
// =============================================================================

/// Types of CST nodes.
///
/// One kind per visible grammar rule, plus [`NodeKind::Error`] for material
/// wrapped by error recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    // Top-level
    /// Root node containing all statements.
    SourceFile,

    // Statements
    /// Block of statements `{ ... }`
    Block,
    /// Lone `;`
    EmptyStatement,
    /// Module call with its child like `translate([1, 0, 0]) cube(10);`
    TransformChain,
    /// Module instantiation like `cube(10)`
    ModuleCall,
    /// Variable assignment like `x = 10;`
    Assignment,
    /// Module definition like `module foo() { ... }`
    ModuleDeclaration,
    /// Function definition like `function foo() = ...;`
    FunctionDeclaration,
    /// For loop like `for (i = [0:10]) { ... }`
    ForBlock,
    /// If statement like `if (x > 0) { ... }`
    IfBlock,
    /// Let block like `let (x = 1) { ... }`
    LetBlock,
    /// Include statement `include <file.scad>`
    IncludeStatement,
    /// Use statement `use <file.scad>`
    UseStatement,
    /// Modifier like `*`, `!`, `#`, `%` applied to a statement
    Modifier,

    // Arguments and parameters
    /// Arguments list `(10, center=true)`
    Arguments,
    /// Named argument `center=true`
    NamedArgument,
    /// Parameters list `(x, y=0)`
    Parameters,
    /// Single parameter
    Parameter,
    /// Binding list of `for` and `let`: `(i = [0:10], j = 2)`
    Bindings,
    /// Single binding `i = [0:10]`
    Binding,

    // Expressions
    /// Binary operation like `a + b`
    BinaryExpression,
    /// Unary operation like `-x` or `!x`
    UnaryExpression,
    /// Ternary operation like `a ? b : c`
    TernaryExpression,
    /// Parenthesized expression `(a)`
    ParenthesizedExpression,
    /// Function call like `sin(x)`
    FunctionCall,
    /// Index access like `arr[0]`
    IndexExpression,
    /// Dot access like `obj.x`
    DotExpression,
    /// List literal like `[1, 2, 3]`
    List,
    /// Range like `[0:10]` or `[0:1:10]`
    Range,
    /// Comprehension `for (i = x) e` inside a list
    ForClause,
    /// Comprehension `if (c) e` or `if (c) e else f` inside a list
    IfClause,
    /// Comprehension `each e` inside a list
    EachClause,
    /// Let expression `let (x = 1) x * 2`
    LetExpression,
    /// Anonymous function `function (x) x * 2`
    FunctionLiteral,
    /// Echo expression `echo(x) y`
    EchoExpression,
    /// Assert expression `assert(x > 0) x`
    AssertExpression,

    // Other
    /// Tokens and nodes skipped by error recovery.
    Error,
}

impl NodeKind {
    /// Snake-case name used in S-expressions and dumps.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SourceFile => "source_file",
            Self::Block => "block",
            Self::EmptyStatement => "empty_statement",
            Self::TransformChain => "transform_chain",
            Self::ModuleCall => "module_call",
            Self::Assignment => "assignment",
            Self::ModuleDeclaration => "module_declaration",
            Self::FunctionDeclaration => "function_declaration",
            Self::ForBlock => "for_block",
            Self::IfBlock => "if_block",
            Self::LetBlock => "let_block",
            Self::IncludeStatement => "include_statement",
            Self::UseStatement => "use_statement",
            Self::Modifier => "modifier",
            Self::Arguments => "arguments",
            Self::NamedArgument => "named_argument",
            Self::Parameters => "parameters",
            Self::Parameter => "parameter",
            Self::Bindings => "bindings",
            Self::Binding => "binding",
            Self::BinaryExpression => "binary_expression",
            Self::UnaryExpression => "unary_expression",
            Self::TernaryExpression => "ternary_expression",
            Self::ParenthesizedExpression => "parenthesized_expression",
            Self::FunctionCall => "function_call",
            Self::IndexExpression => "index_expression",
            Self::DotExpression => "dot_expression",
            Self::List => "list",
            Self::Range => "range",
            Self::ForClause => "for_clause",
            Self::IfClause => "if_clause",
            Self::EachClause => "each_clause",
            Self::LetExpression => "let_expression",
            Self::FunctionLiteral => "function_literal",
            Self::EchoExpression => "echo_expression",
            Self::AssertExpression => "assert_expression",
            Self::Error => "ERROR",
        }
    }

    /// Check if this is an expression node.
    pub const fn is_expression(&self) -> bool {
        matches!(
            self,
            Self::BinaryExpression
                | Self::UnaryExpression
                | Self::TernaryExpression
                | Self::ParenthesizedExpression
                | Self::FunctionCall
                | Self::IndexExpression
                | Self::DotExpression
                | Self::List
                | Self::Range
                | Self::LetExpression
                | Self::FunctionLiteral
                | Self::EchoExpression
                | Self::AssertExpression
        )
    }

    /// Check if this is a statement node.
    pub const fn is_statement(&self) -> bool {
        matches!(
            self,
            Self::Block
                | Self::EmptyStatement
                | Self::TransformChain
                | Self::Assignment
                | Self::ModuleDeclaration
                | Self::FunctionDeclaration
                | Self::ForBlock
                | Self::IfBlock
                | Self::LetBlock
                | Self::IncludeStatement
                | Self::UseStatement
                | Self::Modifier
        )
    }

    /// Check if this is a list-comprehension clause.
    pub const fn is_comprehension(&self) -> bool {
        matches!(self, Self::ForClause | Self::IfClause | Self::EachClause)
    }
}

// =============================================================================
// TESTS
// =============================================================================
