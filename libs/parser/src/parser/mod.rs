//! # OpenSCAD Parser
//!
//! Table-driven shift/reduce parser producing a lossless [`Cst`].
//!
//! The engine reads actions from the LALR(1) table of a [`Language`]. Tokens
//! are shifted as leaves, reductions build green nodes bottom-up (or splice
//! children for hidden rules), and trivia is carried as *extra* stack
//! entries that never change the automaton state. Syntax errors trigger the
//! bounded recovery in [`recovery`].
//!
//! ## Example
//!
//! ```rust
//! use openscad_parser::Parser;
//!
//! let cst = Parser::new().parse("cube(10);");
//! assert!(cst.is_ok());
//! ```

mod recovery;

use config::constants::{ParserConfig, MAX_SOURCE_LEN};
use tracing::{debug, trace};

use crate::cst::{Cst, GreenElement, GreenNode, GreenToken, NodeKind};
use crate::grammar::table::{describe, Action, ParseTable, StateId};
use crate::grammar::ProductionId;
use crate::language::{language, Language};
use crate::lexer::{Lexer, Token};

// =============================================================================
// PARSER
// =============================================================================

/// Parser bound to a language and a set of recovery bounds.
///
/// Cheap to create and to copy; all heavy state lives in the shared
/// [`Language`].
///
/// ## Example
///
/// ```rust
/// let parser = Parser::new();
/// let cst = parser.parse("cube(10);");
/// assert_eq!(cst.root().kind(), NodeKind::SourceFile);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Parser<'l> {
    language: &'l Language,
    config: ParserConfig,
}

impl Parser<'static> {
    /// Parser for the built-in OpenSCAD language with default bounds.
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    /// Parser for the built-in OpenSCAD language with custom bounds.
    pub fn with_config(config: ParserConfig) -> Self {
        Self::with_language(language(), config)
    }
}

impl Default for Parser<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'l> Parser<'l> {
    /// Parser for any language built with
    /// [`Language::from_grammar`](crate::Language::from_grammar).
    pub fn with_language(language: &'l Language, config: ParserConfig) -> Self {
        Self { language, config }
    }

    pub fn language(&self) -> &'l Language {
        self.language
    }

    pub fn config(&self) -> ParserConfig {
        self.config
    }

    /// Parse a whole document.
    ///
    /// Never fails: syntax errors are recovered from and recorded in the
    /// tree. See [`Cst::errors`].
    ///
    /// # Panics
    ///
    /// If `source` is longer than [`MAX_SOURCE_LEN`] bytes.
    ///
    /// ## Example
    ///
    /// ```rust
    /// let cst = Parser::new().parse("cube(; sphere(5);");
    /// assert!(!cst.is_ok());
    /// assert_eq!(cst.text(), "cube(; sphere(5);");
    /// ```
    pub fn parse(&self, source: &str) -> Cst {
        assert!(
            source.len() <= MAX_SOURCE_LEN,
            "source of {} bytes exceeds the 32-bit offset limit",
            source.len()
        );
        let tokens = Lexer::new(source).tokenize();
        let (kind, start) = self.document_entry();
        let mut engine = Engine::new(self.language, self.config, &tokens, kind, start, true);
        let outcome = engine.run();
        debug!(?outcome, bytes = source.len(), tokens = tokens.len(), "parsed document");
        Cst::new(engine.into_tree())
    }

    /// Parse `source` as exactly one `kind` node, without error recovery.
    ///
    /// Returns `None` when the text is not a single well-formed `kind`.
    pub(crate) fn parse_exact(&self, kind: NodeKind, source: &str) -> Option<GreenNode> {
        let start = self.language.entry_state(kind)?;
        let tokens = Lexer::new(source).tokenize();
        let mut engine = Engine::new(self.language, self.config, &tokens, kind, start, false);
        match engine.run() {
            EngineState::Accepted => Some(engine.into_tree()),
            _ => None,
        }
    }

    /// The `source_file` entry, or the first entry of a custom grammar
    /// without one.
    fn document_entry(&self) -> (NodeKind, StateId) {
        let grammar = self.language.grammar();
        let index = grammar
            .entries()
            .iter()
            .position(|entry| entry.kind == NodeKind::SourceFile)
            .unwrap_or(0);
        (
            grammar.entries()[index].kind,
            self.language.table().entry_states()[index],
        )
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Lifecycle of a single parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Ready,
    Parsing,
    Recovering,
    Accepted,
    /// Recovery found no way to continue, or was disabled.
    Failed,
}

/// One slot of the parse stack.
///
/// Symbol entries carry the state reached after the symbol. Extra entries
/// (trivia, error nodes) repeat the state below them.
#[derive(Debug)]
struct StackEntry {
    state: StateId,
    children: Vec<GreenElement>,
    is_extra: bool,
}

/// Shift/reduce driver over one token buffer.
struct Engine<'a> {
    language: &'a Language,
    config: ParserConfig,
    tokens: &'a [Token],
    /// First token not yet pushed.
    pos: usize,
    stack: Vec<StackEntry>,
    start: StateId,
    root: NodeKind,
    recovery_enabled: bool,
    state: EngineState,
}

impl<'a> Engine<'a> {
    fn new(
        language: &'a Language,
        config: ParserConfig,
        tokens: &'a [Token],
        root: NodeKind,
        start: StateId,
        recovery_enabled: bool,
    ) -> Self {
        Self {
            language,
            config,
            tokens,
            pos: 0,
            stack: Vec::new(),
            start,
            root,
            recovery_enabled,
            state: EngineState::Ready,
        }
    }

    fn table(&self) -> &'a ParseTable {
        self.language.table()
    }

    /// Drive the automaton until it accepts or gives up.
    fn run(&mut self) -> EngineState {
        self.state = EngineState::Parsing;
        while self.state == EngineState::Parsing {
            let lookahead = self.lookahead();
            let kind = self.tokens[lookahead].kind;
            match self.table().action(self.top_state(), kind) {
                Action::Shift(next) => self.shift(lookahead, next),
                Action::Reduce(production) => self.reduce(production),
                Action::Accept => self.state = EngineState::Accepted,
                Action::Error if self.recovery_enabled => {
                    self.state = EngineState::Recovering;
                    self.state = if self.recover(lookahead) {
                        EngineState::Parsing
                    } else {
                        EngineState::Failed
                    };
                }
                Action::Error => {
                    trace!(token = ?kind, state = self.top_state(), "syntax error");
                    self.state = EngineState::Failed;
                }
            }
        }
        self.state
    }

    /// Index of the next significant token.
    fn lookahead(&self) -> usize {
        self.next_significant(self.pos)
    }

    fn next_significant(&self, from: usize) -> usize {
        self.tokens[from..]
            .iter()
            .position(|token| !token.is_trivia())
            .map_or(self.tokens.len() - 1, |offset| from + offset)
    }

    fn top_state(&self) -> StateId {
        self.stack.last().map_or(self.start, |entry| entry.state)
    }

    /// States of the symbol entries, bottom first, starting with the start
    /// state.
    fn state_stack(&self) -> Vec<StateId> {
        std::iter::once(self.start)
            .chain(
                self.stack
                    .iter()
                    .filter(|entry| !entry.is_extra)
                    .map(|entry| entry.state),
            )
            .collect()
    }

    fn push_extra(&mut self, element: GreenElement) {
        let state = self.top_state();
        self.stack.push(StackEntry {
            state,
            children: vec![element],
            is_extra: true,
        });
    }

    /// Push the tokens in `pos..end` as extras.
    fn push_trivia(&mut self, end: usize) {
        while self.pos < end {
            let token = green_token(&self.tokens[self.pos]);
            self.push_extra(token.into());
            self.pos += 1;
        }
    }

    fn shift(&mut self, lookahead: usize, next: StateId) {
        self.push_trivia(lookahead);
        let token = &self.tokens[lookahead];
        trace!(token = ?token.kind, state = next, "shift");
        self.stack.push(StackEntry {
            state: next,
            children: vec![green_token(token).into()],
            is_extra: false,
        });
        self.pos = lookahead + 1;
    }

    /// Push a zero-width token that is not in the source.
    fn shift_missing(&mut self, next: StateId, token: GreenToken) {
        trace!(token = ?token.kind(), state = next, "shift missing");
        self.stack.push(StackEntry {
            state: next,
            children: vec![token.into()],
            is_extra: false,
        });
    }

    fn reduce(&mut self, id: ProductionId) {
        let grammar = self.language.grammar();
        let production = grammar.production(id);

        let trailing = self.pop_extras();
        let children = self.pop_symbols(production.rhs.len());
        let below = self.top_state();
        let target = self.table().goto(below, production.lhs).unwrap_or_else(|| {
            panic!(
                "parse table has no goto from state {below} on `{}`",
                grammar.rule(production.lhs).name
            )
        });
        trace!(production = %describe(grammar, id), state = target, "reduce");

        let children = match grammar.rule(production.lhs).kind {
            Some(kind) => vec![GreenNode::new(kind, children).into()],
            None => children,
        };
        self.stack.push(StackEntry {
            state: target,
            children,
            is_extra: false,
        });
        for extra in trailing {
            self.stack.push(StackEntry {
                state: target,
                ..extra
            });
        }
    }

    /// Pop the extras above the topmost symbol entry.
    fn pop_extras(&mut self) -> Vec<StackEntry> {
        let split = self
            .stack
            .iter()
            .rposition(|entry| !entry.is_extra)
            .map_or(0, |index| index + 1);
        self.stack.split_off(split)
    }

    /// Pop `count` symbol entries and the extras between them.
    fn pop_entries(&mut self, count: usize) -> Vec<StackEntry> {
        if count == 0 {
            return Vec::new();
        }
        let split = self
            .stack
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, entry)| !entry.is_extra)
            .nth(count - 1)
            .map(|(index, _)| index)
            .unwrap_or_else(|| panic!("parse stack holds fewer than {count} symbols"));
        self.stack.split_off(split)
    }

    fn pop_symbols(&mut self, count: usize) -> Vec<GreenElement> {
        self.pop_entries(count)
            .into_iter()
            .flat_map(|entry| entry.children)
            .collect()
    }

    /// Final tree.
    ///
    /// After acceptance the root node is rebuilt around everything left on
    /// the stack and the trailing trivia, so it spans the whole input. After
    /// a failure the unparsed rest is wrapped in an error node.
    fn into_tree(self) -> GreenNode {
        let accepted = self.state == EngineState::Accepted;
        let root = self.root;
        let mut children = Vec::new();
        for entry in self.stack {
            for child in entry.children {
                match child {
                    GreenElement::Node(node)
                        if accepted && !entry.is_extra && node.kind() == root =>
                    {
                        children.extend(node.children().iter().cloned());
                    }
                    child => children.push(child),
                }
            }
        }

        let rest = self.tokens[self.pos..]
            .iter()
            .filter(|token| !token.is_eof())
            .map(|token| GreenElement::from(green_token(token)));
        if accepted {
            children.extend(rest);
        } else {
            children.push(GreenNode::new(NodeKind::Error, rest.collect()).into());
        }
        GreenNode::new(root, children)
    }
}

fn green_token(token: &Token) -> GreenToken {
    GreenToken::new(token.kind, &token.text)
}

// =============================================================================
// TESTS
// =============================================================================
