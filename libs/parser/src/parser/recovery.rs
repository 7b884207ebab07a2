//! # Error Recovery
//!
//! Local, bounded repair of the parse stack after a syntax error.
//!
//! Strategies are tried in order, and every candidate is checked by running
//! the table on a simulated state stack before anything is committed:
//!
//! 1. **Insert**: the shortest sequence of zero-width `;` `)` `]` `}` tokens
//!    after which the lookahead is accepted.
//! 2. **Skip/pop**: the fewest upcoming tokens to discard and, for each
//!    count, the fewest stack symbols to pop, until some token is accepted.
//!    Discarded material is wrapped into one `ERROR` node.
//! 3. **Drop**: discard the lookahead alone.

use std::collections::BTreeSet;

use tracing::debug;

use super::{green_token, Engine};
use crate::cst::{GreenElement, GreenNode, GreenToken, NodeKind};
use crate::grammar::table::{Action, StateId};
use crate::language::Language;
use crate::lexer::TokenKind;

/// Tokens recovery may insert, in order of preference.
const INSERTABLE: [TokenKind; 4] = [
    TokenKind::Semicolon,
    TokenKind::RParen,
    TokenKind::RBracket,
    TokenKind::RBrace,
];

/// Where to resume after discarding input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Resync {
    /// Symbol entries to pop.
    depth: usize,
    /// Index one past the last discarded token.
    skipped_end: usize,
}

impl Engine<'_> {
    /// Repair the stack so that parsing can continue at `lookahead`.
    ///
    /// Returns `false` only at end of input when no repair exists.
    pub(super) fn recover(&mut self, lookahead: usize) -> bool {
        let kind = self.tokens[lookahead].kind;
        let at = self.tokens[lookahead].span.start.byte;

        if let Some(missing) = self.find_insertion(kind) {
            debug!(?missing, at, "recovered by inserting tokens");
            for token in missing {
                self.insert_missing(token);
            }
            return true;
        }

        if let Some(resync) = self.find_resync(lookahead) {
            debug!(
                depth = resync.depth,
                skipped = resync.skipped_end.saturating_sub(self.pos),
                at,
                "recovered by discarding input"
            );
            self.discard(resync);
            return true;
        }

        if kind == TokenKind::Eof {
            debug!(at, "recovery exhausted at end of input");
            return false;
        }
        debug!(token = ?kind, at, "recovered by dropping the lookahead");
        self.discard(Resync {
            depth: 0,
            skipped_end: lookahead + 1,
        });
        true
    }

    /// Breadth-first search over insertion sequences up to the configured
    /// length.
    ///
    /// Sequences leading to a state stack already seen are pruned, so each
    /// level holds at most one entry per distinct stack.
    fn find_insertion(&self, lookahead: TokenKind) -> Option<Vec<TokenKind>> {
        let states = self.state_stack();
        let start = SimulatedStack::new(&states);
        let mut seen = BTreeSet::from([start.key()]);
        let mut frontier = vec![(start, Vec::new())];
        for _ in 0..self.config.max_missing_tokens() {
            let mut next = Vec::new();
            for (stack, inserted) in &frontier {
                for token in INSERTABLE {
                    let mut stack = stack.clone();
                    if !simulate(self.language, &mut stack, token) {
                        continue;
                    }
                    let mut inserted = inserted.clone();
                    inserted.push(token);
                    if simulate(self.language, &mut stack.clone(), lookahead) {
                        return Some(inserted);
                    }
                    if seen.insert(stack.key()) {
                        next.push((stack, inserted));
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        None
    }

    /// Shift a missing `kind` token, performing the reductions it triggers.
    fn insert_missing(&mut self, kind: TokenKind) {
        loop {
            match self.table().action(self.top_state(), kind) {
                Action::Reduce(production) => self.reduce(production),
                Action::Shift(next) => {
                    self.shift_missing(next, GreenToken::missing(kind));
                    return;
                }
                action => panic!("inserted token {kind:?} hit {action:?} after simulation"),
            }
        }
    }

    /// Smallest `(skip, depth)`, skip first, at which the next kept token
    /// is accepted.
    fn find_resync(&self, lookahead: usize) -> Option<Resync> {
        let states = self.state_stack();
        let mut candidate = lookahead;
        let mut skipped_end = self.pos;

        for skip in 0..=self.config.max_skipped_tokens() {
            let kind = self.tokens[candidate].kind;
            for depth in 0..states.len() {
                if skip == 0 && depth == 0 {
                    continue;
                }
                let mut prefix = SimulatedStack::new(&states);
                prefix.pop(depth);
                if simulate(self.language, &mut prefix, kind) {
                    return Some(Resync { depth, skipped_end });
                }
            }
            if kind == TokenKind::Eof {
                break;
            }
            skipped_end = candidate + 1;
            candidate = self.next_significant(skipped_end);
        }
        None
    }

    /// Pop `depth` symbols and consume the tokens up to `skipped_end`,
    /// pushing everything removed as one error node.
    fn discard(&mut self, resync: Resync) {
        let mut children: Vec<GreenElement> = self
            .pop_entries(resync.depth)
            .into_iter()
            .flat_map(|entry| entry.children)
            .collect();

        if resync.skipped_end > self.pos {
            if children.is_empty() {
                // Leading trivia stays outside the error node.
                let first = self.next_significant(self.pos);
                self.push_trivia(first);
            }
            children.extend(
                self.tokens[self.pos..resync.skipped_end]
                    .iter()
                    .map(|token| GreenElement::from(green_token(token))),
            );
            self.pos = resync.skipped_end;
        }

        self.push_extra(GreenNode::new(NodeKind::Error, children).into());
    }
}

/// State stack of a simulation: a prefix of the engine's states followed by
/// the states pushed since, so candidates never copy the whole stack.
///
/// The split is kept canonical (the prefix is as long as possible), which
/// makes [`SimulatedStack::key`] identify equal stacks.
#[derive(Debug, Clone)]
struct SimulatedStack<'s> {
    states: &'s [StateId],
    prefix: usize,
    pushed: Vec<StateId>,
}

impl<'s> SimulatedStack<'s> {
    fn new(states: &'s [StateId]) -> Self {
        Self {
            states,
            prefix: states.len(),
            pushed: Vec::new(),
        }
    }

    fn top(&self) -> StateId {
        match self.pushed.last() {
            Some(&state) => state,
            None => self.states[self.prefix - 1],
        }
    }

    fn below(&self, count: usize) -> StateId {
        if count < self.pushed.len() {
            self.pushed[self.pushed.len() - count - 1]
        } else {
            self.states[self.prefix - (count - self.pushed.len()) - 1]
        }
    }

    fn pop(&mut self, count: usize) {
        let from_pushed = count.min(self.pushed.len());
        self.pushed.truncate(self.pushed.len() - from_pushed);
        self.prefix -= count - from_pushed;
    }

    fn push(&mut self, state: StateId) {
        if self.pushed.is_empty() && self.states.get(self.prefix) == Some(&state) {
            self.prefix += 1;
        } else {
            self.pushed.push(state);
        }
    }

    fn key(&self) -> (usize, Vec<StateId>) {
        (self.prefix, self.pushed.clone())
    }
}

/// Run `token` through the table on a simulated state stack.
///
/// Returns true if it is shifted or accepted after any reductions.
fn simulate(language: &Language, stack: &mut SimulatedStack<'_>, token: TokenKind) -> bool {
    let table = language.table();
    let grammar = language.grammar();
    loop {
        match table.action(stack.top(), token) {
            Action::Shift(next) => {
                stack.push(next);
                return true;
            }
            Action::Accept => return true,
            Action::Error => return false,
            Action::Reduce(id) => {
                let production = grammar.production(id);
                let below = stack.below(production.rhs.len());
                stack.pop(production.rhs.len());
                let target = table.goto(below, production.lhs).unwrap_or_else(|| {
                    panic!(
                        "parse table has no goto from state {below} on `{}`",
                        grammar.rule(production.lhs).name
                    )
                });
                stack.push(target);
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
