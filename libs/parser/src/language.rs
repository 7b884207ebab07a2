//! # Language
//!
//! A compiled grammar together with its LALR(1) table.
//!
//! The built-in OpenSCAD language is generated once per process, on first
//! use, and shared read-only by every parser on every thread.
//!
//! ## Example
//!
//! ```rust
//! let language = openscad_parser::language();
//! assert!(std::ptr::eq(language, openscad_parser::language()));
//! ```

use once_cell::sync::Lazy;
use tracing::info;

use crate::cst::NodeKind;
use crate::error::GrammarError;
use crate::grammar::table::{ConflictReport, ParseTable, StateId};
use crate::grammar::{self, Grammar, GrammarSpec};

static LANGUAGE: Lazy<Language> = Lazy::new(|| {
    info!("generating OpenSCAD parse table");
    Language::from_grammar(&grammar::openscad())
        .unwrap_or_else(|error| panic!("built-in OpenSCAD grammar is invalid: {error}"))
});

/// The process-wide OpenSCAD language.
///
/// Every call returns the same instance.
pub fn language() -> &'static Language {
    &LANGUAGE
}

/// Grammar and parse table. Immutable once built.
#[derive(Debug, Clone)]
pub struct Language {
    grammar: Grammar,
    table: ParseTable,
}

impl Language {
    /// Compile `spec` and generate its table.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use openscad_parser::{grammar, Language, NodeKind};
    ///
    /// let language = Language::from_grammar(&grammar::openscad()).unwrap();
    /// assert!(language.entry_state(NodeKind::SourceFile).is_some());
    /// ```
    pub fn from_grammar(spec: &GrammarSpec) -> Result<Self, GrammarError> {
        let grammar = Grammar::compile(spec)?;
        let table = ParseTable::build(&grammar);
        Ok(Self { grammar, table })
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn table(&self) -> &ParseTable {
        &self.table
    }

    /// Start state for parsing a `kind` node, if the grammar declares that
    /// entry point.
    pub fn entry_state(&self, kind: NodeKind) -> Option<StateId> {
        self.grammar
            .entries()
            .iter()
            .position(|entry| entry.kind == kind)
            .map(|index| self.table.entry_states()[index])
    }

    pub fn conflicts(&self) -> ConflictReport {
        self.table.conflicts()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::table::Action;
    use crate::lexer::TokenKind;

    #[test]
    fn test_language_is_a_singleton() {
        assert!(std::ptr::eq(language(), language()));
    }

    #[test]
    fn test_entry_points() {
        let language = language();
        let file = language.entry_state(NodeKind::SourceFile).unwrap();
        let block = language.entry_state(NodeKind::Block).unwrap();
        assert_ne!(file, block);
        assert!(language.entry_state(NodeKind::ModuleCall).is_none());
    }

    #[test]
    fn test_empty_file_is_accepted() {
        let language = language();
        let start = language.entry_state(NodeKind::SourceFile).unwrap();
        // `_statements -> ε` first, then accept
        assert!(matches!(
            language.table().action(start, TokenKind::Eof),
            Action::Reduce(_)
        ));
    }

    #[test]
    fn test_block_entry_expects_brace() {
        let language = language();
        let start = language.entry_state(NodeKind::Block).unwrap();
        let expected: Vec<TokenKind> = language.table().expected(start).collect();
        assert_eq!(expected, vec![TokenKind::LBrace]);
    }

    #[test]
    fn test_builtin_grammar_conflicts_are_all_resolved_by_precedence() {
        let conflicts = language().conflicts();
        assert_eq!(conflicts.reduce_reduce, 0, "{conflicts:?}");
        assert_eq!(conflicts.shift_reduce_defaulted, 0, "{conflicts:?}");
        assert!(conflicts.shift_reduce_by_precedence > 0);
    }

    #[test]
    fn test_from_grammar_reports_errors() {
        let spec = GrammarSpec::new();
        assert_eq!(
            Language::from_grammar(&spec).unwrap_err(),
            GrammarError::NoEntryPoint
        );
    }
}
