//! # Parse Table
//!
//! LALR(1) table generation.
//!
//! The LR(0) automaton is built first; lookaheads are then propagated through
//! its transitions until nothing changes, which yields the same table as
//! building canonical LR(1) item sets and merging states with equal cores.
//!
//! Conflicts are settled here, never at parse time:
//!
//! - shift/reduce with precedence on both sides: the higher level wins; on a
//!   tie `Left` reduces, `Right` shifts and `NonAssoc` makes the cell an error;
//! - shift/reduce without precedence: shift;
//! - reduce/reduce: the production declared first.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use crate::grammar::{Assoc, Grammar, ProductionId, RuleId, Symbol};
use crate::lexer::TokenKind;

pub type StateId = usize;

type Item = (ProductionId, usize);

const _: () = assert!(TokenKind::COUNT <= 128, "token sets are 128-bit masks");

// =============================================================================
// TERMINAL SETS
// =============================================================================

/// Set of token kinds.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TermSet(u128);

impl TermSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn single(kind: TokenKind) -> Self {
        Self(1 << kind.index())
    }

    pub fn contains(&self, kind: TokenKind) -> bool {
        self.0 & (1 << kind.index()) != 0
    }

    /// Add `kind`; true if it was not present.
    pub fn insert(&mut self, kind: TokenKind) -> bool {
        self.union_with(Self::single(kind))
    }

    /// Add every member of `other`; true if the set grew.
    pub fn union_with(&mut self, other: TermSet) -> bool {
        let before = self.0;
        self.0 |= other.0;
        self.0 != before
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Members in kind order.
    pub fn iter(&self) -> impl Iterator<Item = TokenKind> + '_ {
        TokenKind::ALL.iter().copied().filter(|kind| self.contains(*kind))
    }
}

impl std::fmt::Debug for TermSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter().map(|kind| kind.display())).finish()
    }
}

// =============================================================================
// FIRST SETS
// =============================================================================

struct FirstSets {
    first: Vec<TermSet>,
    nullable: Vec<bool>,
}

impl FirstSets {
    fn compute(grammar: &Grammar) -> Self {
        let count = grammar.rules().len();
        let mut first = vec![TermSet::empty(); count];
        let mut nullable = vec![false; count];

        let mut changed = true;
        while changed {
            changed = false;
            for production in grammar.productions() {
                let lhs = production.lhs;
                let mut derives_empty = true;
                for symbol in &production.rhs {
                    match *symbol {
                        Symbol::Token(token) => {
                            changed |= first[lhs].insert(token);
                            derives_empty = false;
                        }
                        Symbol::Rule(rule) => {
                            let rule_first = first[rule];
                            changed |= first[lhs].union_with(rule_first);
                            derives_empty = nullable[rule];
                        }
                    }
                    if !derives_empty {
                        break;
                    }
                }
                if derives_empty && !nullable[lhs] {
                    nullable[lhs] = true;
                    changed = true;
                }
            }
        }

        Self { first, nullable }
    }

    /// FIRST of `symbols` followed by anything in `follow`.
    fn of_sequence(&self, symbols: &[Symbol], follow: TermSet) -> TermSet {
        let mut set = TermSet::empty();
        for symbol in symbols {
            match *symbol {
                Symbol::Token(token) => {
                    set.insert(token);
                    return set;
                }
                Symbol::Rule(rule) => {
                    set.union_with(self.first[rule]);
                    if !self.nullable[rule] {
                        return set;
                    }
                }
            }
        }
        set.union_with(follow);
        set
    }
}

// =============================================================================
// ACTIONS
// =============================================================================

/// Table cell for a (state, lookahead) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Error,
    Shift(StateId),
    Reduce(ProductionId),
    Accept,
}

/// Conflicts met while filling the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConflictReport {
    /// Shift/reduce settled by declared precedence.
    pub shift_reduce_by_precedence: usize,
    /// Shift/reduce without precedence information, settled by shifting.
    pub shift_reduce_defaulted: usize,
    /// Reduce/reduce, settled by the earlier production.
    pub reduce_reduce: usize,
}

// =============================================================================
// PARSE TABLE
// =============================================================================

/// Action and goto tables of an LALR(1) automaton.
#[derive(Debug, Clone)]
pub struct ParseTable {
    state_count: usize,
    rule_count: usize,
    actions: Vec<Action>,
    gotos: Vec<Option<StateId>>,
    entry_states: Vec<StateId>,
    conflicts: ConflictReport,
}

struct State {
    kernel: Vec<Item>,
    transitions: BTreeMap<Symbol, StateId>,
}

impl ParseTable {
    /// Generate the table for `grammar`.
    pub fn build(grammar: &Grammar) -> Self {
        let firsts = FirstSets::compute(grammar);
        let (states, entry_states) = lr0_automaton(grammar);
        let lookaheads = propagate_lookaheads(grammar, &firsts, &states, &entry_states);

        let columns = TokenKind::COUNT;
        let rule_count = grammar.rules().len();
        let mut cells: Vec<Option<Action>> = vec![None; states.len() * columns];
        let mut gotos = vec![None; states.len() * rule_count];
        let mut conflicts = ConflictReport::default();

        for (id, state) in states.iter().enumerate() {
            for (symbol, &target) in &state.transitions {
                match *symbol {
                    Symbol::Token(token) => {
                        cells[id * columns + token.index()] = Some(Action::Shift(target));
                    }
                    Symbol::Rule(rule) => gotos[id * rule_count + rule] = Some(target),
                }
            }

            for ((production, dot), lookahead) in
                closure(grammar, &firsts, &state.kernel, &lookaheads[id])
            {
                if dot < grammar.production(production).rhs.len() {
                    continue;
                }
                if grammar
                    .entries()
                    .iter()
                    .any(|entry| entry.accept_production == production)
                {
                    if lookahead.contains(TokenKind::Eof) {
                        cells[id * columns + TokenKind::Eof.index()] = Some(Action::Accept);
                    }
                    continue;
                }
                for token in lookahead.iter() {
                    let cell = &mut cells[id * columns + token.index()];
                    *cell = Some(resolve(grammar, &mut conflicts, id, *cell, production, token));
                }
            }
        }

        info!(
            states = states.len(),
            productions = grammar.productions().len(),
            ?conflicts,
            "built LALR(1) table"
        );

        Self {
            state_count: states.len(),
            rule_count,
            actions: cells.into_iter().map(|cell| cell.unwrap_or(Action::Error)).collect(),
            gotos,
            entry_states,
            conflicts,
        }
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    /// Action for `token` in `state`.
    pub fn action(&self, state: StateId, token: TokenKind) -> Action {
        self.actions[state * TokenKind::COUNT + token.index()]
    }

    /// Successor of `state` after reducing to `rule`.
    pub fn goto(&self, state: StateId, rule: RuleId) -> Option<StateId> {
        self.gotos[state * self.rule_count + rule]
    }

    /// Start states, parallel to [`Grammar::entries`].
    pub fn entry_states(&self) -> &[StateId] {
        &self.entry_states
    }

    pub fn conflicts(&self) -> ConflictReport {
        self.conflicts
    }

    /// Tokens with a non-error action in `state`.
    pub fn expected(&self, state: StateId) -> impl Iterator<Item = TokenKind> + '_ {
        TokenKind::ALL
            .iter()
            .copied()
            .filter(move |&token| self.action(state, token) != Action::Error)
    }
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

fn lr0_automaton(grammar: &Grammar) -> (Vec<State>, Vec<StateId>) {
    let mut states = Vec::new();
    let mut index = HashMap::new();

    let entry_states = grammar
        .entries()
        .iter()
        .map(|entry| intern(&mut states, &mut index, vec![(entry.accept_production, 0)]))
        .collect();

    let mut next = 0;
    while next < states.len() {
        let mut successors: BTreeMap<Symbol, Vec<Item>> = BTreeMap::new();
        for (production, dot) in closure0(grammar, &states[next].kernel) {
            if let Some(&symbol) = grammar.production(production).rhs.get(dot) {
                successors.entry(symbol).or_default().push((production, dot + 1));
            }
        }
        for (symbol, mut kernel) in successors {
            kernel.sort_unstable();
            kernel.dedup();
            let target = intern(&mut states, &mut index, kernel);
            states[next].transitions.insert(symbol, target);
        }
        next += 1;
    }

    (states, entry_states)
}

fn intern(states: &mut Vec<State>, index: &mut HashMap<Vec<Item>, StateId>, kernel: Vec<Item>) -> StateId {
    if let Some(&id) = index.get(&kernel) {
        return id;
    }
    let id = states.len();
    index.insert(kernel.clone(), id);
    states.push(State {
        kernel,
        transitions: BTreeMap::new(),
    });
    id
}

/// LR(0) closure of a kernel.
fn closure0(grammar: &Grammar, kernel: &[Item]) -> Vec<Item> {
    let mut items = kernel.to_vec();
    let mut expanded = vec![false; grammar.rules().len()];
    let mut i = 0;
    while i < items.len() {
        let (production, dot) = items[i];
        if let Some(&Symbol::Rule(rule)) = grammar.production(production).rhs.get(dot) {
            if !expanded[rule] {
                expanded[rule] = true;
                items.extend(grammar.productions_of(rule).iter().map(|&p| (p, 0)));
            }
        }
        i += 1;
    }
    items
}

/// LR(1) closure of a kernel whose items carry `lookaheads`.
fn closure(
    grammar: &Grammar,
    firsts: &FirstSets,
    kernel: &[Item],
    lookaheads: &[TermSet],
) -> Vec<(Item, TermSet)> {
    let mut items: Vec<(Item, TermSet)> =
        kernel.iter().copied().zip(lookaheads.iter().copied()).collect();
    let mut position: HashMap<Item, usize> =
        items.iter().enumerate().map(|(i, (item, _))| (*item, i)).collect();
    let mut worklist: Vec<usize> = (0..items.len()).rev().collect();

    while let Some(i) = worklist.pop() {
        let ((production, dot), lookahead) = items[i];
        let rhs = &grammar.production(production).rhs;
        let Some(&Symbol::Rule(rule)) = rhs.get(dot) else {
            continue;
        };
        let follow = firsts.of_sequence(&rhs[dot + 1..], lookahead);
        for &child in grammar.productions_of(rule) {
            let item = (child, 0);
            match position.get(&item) {
                Some(&j) => {
                    if items[j].1.union_with(follow) {
                        worklist.push(j);
                    }
                }
                None => {
                    position.insert(item, items.len());
                    items.push((item, follow));
                    worklist.push(items.len() - 1);
                }
            }
        }
    }

    items
}

/// Kernel lookaheads of every state, propagated to a fixpoint.
fn propagate_lookaheads(
    grammar: &Grammar,
    firsts: &FirstSets,
    states: &[State],
    entry_states: &[StateId],
) -> Vec<Vec<TermSet>> {
    let mut lookaheads: Vec<Vec<TermSet>> = states
        .iter()
        .map(|state| vec![TermSet::empty(); state.kernel.len()])
        .collect();
    for &state in entry_states {
        lookaheads[state][0].insert(TokenKind::Eof);
    }

    let mut rounds = 0;
    let mut changed = true;
    while changed {
        changed = false;
        rounds += 1;
        for (id, state) in states.iter().enumerate() {
            for ((production, dot), lookahead) in
                closure(grammar, firsts, &state.kernel, &lookaheads[id])
            {
                let Some(symbol) = grammar.production(production).rhs.get(dot) else {
                    continue;
                };
                let target = state.transitions[symbol];
                let Ok(slot) = states[target].kernel.binary_search(&(production, dot + 1)) else {
                    unreachable!("state {target} lacks the advanced item of production {production}");
                };
                changed |= lookaheads[target][slot].union_with(lookahead);
            }
        }
    }
    debug!(rounds, "lookahead propagation converged");

    lookaheads
}

fn resolve(
    grammar: &Grammar,
    conflicts: &mut ConflictReport,
    state: StateId,
    existing: Option<Action>,
    production: ProductionId,
    token: TokenKind,
) -> Action {
    match existing {
        None => Action::Reduce(production),
        Some(Action::Shift(target)) => {
            let rule_prec = grammar.production(production).prec;
            match (rule_prec, grammar.token_prec(token)) {
                (Some(rule_prec), Some(token_prec)) => {
                    conflicts.shift_reduce_by_precedence += 1;
                    match rule_prec.level.cmp(&token_prec.level) {
                        Ordering::Greater => Action::Reduce(production),
                        Ordering::Less => Action::Shift(target),
                        Ordering::Equal => match token_prec.assoc {
                            Assoc::Left => Action::Reduce(production),
                            Assoc::Right => Action::Shift(target),
                            Assoc::NonAssoc => Action::Error,
                        },
                    }
                }
                _ => {
                    conflicts.shift_reduce_defaulted += 1;
                    debug!(
                        state,
                        token = token.display(),
                        production = %describe(grammar, production),
                        "shift/reduce conflict without precedence, shifting"
                    );
                    Action::Shift(target)
                }
            }
        }
        Some(Action::Reduce(other)) => {
            conflicts.reduce_reduce += 1;
            let kept = other.min(production);
            debug!(
                state,
                token = token.display(),
                kept = %describe(grammar, kept),
                dropped = %describe(grammar, other.max(production)),
                "reduce/reduce conflict"
            );
            Action::Reduce(kept)
        }
        Some(action) => action,
    }
}

/// `lhs -> a b c`, for logs.
pub(crate) fn describe(grammar: &Grammar, production: ProductionId) -> String {
    let production = grammar.production(production);
    let mut text = format!("{} ->", grammar.rule(production.lhs).name);
    for symbol in &production.rhs {
        text.push(' ');
        match *symbol {
            Symbol::Token(token) => text.push_str(token.display()),
            Symbol::Rule(rule) => text.push_str(&grammar.rule(rule).name),
        }
    }
    text
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::NodeKind;
    use crate::grammar::{alt, r, t, GrammarSpec};

    fn arithmetic(assoc: Assoc) -> Grammar {
        let spec = GrammarSpec::new()
            .precedence("Additive", assoc, &[TokenKind::Plus])
            .precedence("Multiplicative", Assoc::Left, &[TokenKind::Star])
            .node(NodeKind::SourceFile, "source_file", vec![alt([r("_expr")])])
            .hidden(
                "_expr",
                vec![alt([t(TokenKind::Number)]), alt([r("binary_expression")])],
            )
            .node(
                NodeKind::BinaryExpression,
                "binary_expression",
                vec![
                    alt([r("_expr"), t(TokenKind::Plus), r("_expr")]),
                    alt([r("_expr"), t(TokenKind::Star), r("_expr")]),
                ],
            )
            .entry("source_file");
        Grammar::compile(&spec).expect("valid grammar")
    }

    /// Drive the table over `tokens`, returning the productions reduced.
    fn reductions(grammar: &Grammar, table: &ParseTable, tokens: &[TokenKind]) -> Option<Vec<ProductionId>> {
        let mut stack = vec![table.entry_states()[0]];
        let mut input = tokens.iter().copied().chain([TokenKind::Eof]);
        let mut lookahead = input.next()?;
        let mut reduced = Vec::new();
        loop {
            let top = *stack.last()?;
            match table.action(top, lookahead) {
                Action::Shift(next) => {
                    stack.push(next);
                    lookahead = input.next()?;
                }
                Action::Reduce(production) => {
                    let production_data = grammar.production(production);
                    stack.truncate(stack.len() - production_data.rhs.len());
                    let top = *stack.last()?;
                    stack.push(table.goto(top, production_data.lhs)?);
                    reduced.push(production);
                }
                Action::Accept => return Some(reduced),
                Action::Error => return None,
            }
        }
    }

    #[test]
    fn test_termset() {
        let mut set = TermSet::empty();
        assert!(set.insert(TokenKind::Plus));
        assert!(!set.insert(TokenKind::Plus));
        assert!(set.union_with(TermSet::single(TokenKind::Eof)));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![TokenKind::Plus, TokenKind::Eof]);
    }

    #[test]
    fn test_precedence_orders_reductions() {
        let grammar = arithmetic(Assoc::Left);
        let table = ParseTable::build(&grammar);
        use TokenKind::{Number, Plus, Star};

        // 1 + 2 * 3: the multiplication is reduced first
        let reduced = reductions(&grammar, &table, &[Number, Plus, Number, Star, Number]).expect("accepts");
        let binaries: Vec<_> = reduced.into_iter().filter(|&p| p == 3 || p == 4).collect();
        assert_eq!(binaries, vec![4, 3]);

        assert_eq!(table.conflicts().shift_reduce_defaulted, 0);
        assert!(table.conflicts().shift_reduce_by_precedence > 0);
    }

    #[test]
    fn test_nonassoc_rejects_chains() {
        let grammar = arithmetic(Assoc::NonAssoc);
        let table = ParseTable::build(&grammar);
        use TokenKind::{Number, Plus};
        assert!(reductions(&grammar, &table, &[Number, Plus, Number]).is_some());
        assert!(reductions(&grammar, &table, &[Number, Plus, Number, Plus, Number]).is_none());
    }

    #[test]
    fn test_rejects_invalid_input() {
        let grammar = arithmetic(Assoc::Left);
        let table = ParseTable::build(&grammar);
        assert!(reductions(&grammar, &table, &[TokenKind::Plus]).is_none());
        assert!(reductions(&grammar, &table, &[]).is_none());
    }

    #[test]
    fn test_unresolved_conflict_defaults_to_shift() {
        // _list -> _list Number | Number | ε is ambiguous without precedence
        let spec = GrammarSpec::new()
            .node(NodeKind::SourceFile, "source_file", vec![alt([r("_list")])])
            .hidden(
                "_list",
                vec![alt([]), alt([r("_list"), t(TokenKind::Number)]), alt([t(TokenKind::Number)])],
            )
            .entry("source_file");
        let grammar = Grammar::compile(&spec).expect("valid grammar");
        let table = ParseTable::build(&grammar);
        assert!(table.conflicts().shift_reduce_defaulted > 0);
        assert!(reductions(&grammar, &table, &[TokenKind::Number, TokenKind::Number]).is_some());
    }

    #[test]
    fn test_reduce_reduce_prefers_earlier_production() {
        let spec = GrammarSpec::new()
            .node(NodeKind::SourceFile, "source_file", vec![alt([r("_a")]), alt([r("_b")])])
            .hidden("_a", vec![alt([t(TokenKind::Number)])])
            .hidden("_b", vec![alt([t(TokenKind::Number)])])
            .entry("source_file");
        let grammar = Grammar::compile(&spec).expect("valid grammar");
        let table = ParseTable::build(&grammar);
        assert_eq!(table.conflicts().reduce_reduce, 1);
        let reduced = reductions(&grammar, &table, &[TokenKind::Number]).expect("accepts");
        assert_eq!(reduced[0], 2, "`_a -> number` wins");
    }

    #[test]
    fn test_build_is_deterministic() {
        let grammar = arithmetic(Assoc::Left);
        let a = ParseTable::build(&grammar);
        let b = ParseTable::build(&grammar);
        assert_eq!(a.actions, b.actions);
        assert_eq!(a.gotos, b.gotos);
    }
}
