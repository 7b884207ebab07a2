//! # Grammar
//!
//! Declarative grammar definitions and their compiled form.
//!
//! A [`GrammarSpec`] names rules, lists their alternatives and declares
//! yacc-style precedence levels. [`Grammar::compile`] validates it and
//! resolves names into indices; [`table::ParseTable::build`] then generates
//! the LALR(1) table the engine runs on.
//!
//! Rules come in two flavours:
//!
//! - **visible** rules produce a node of their [`NodeKind`];
//! - **hidden** rules (lists, choices) splice their children into the parent.
//!
//! ## Example
//!
//! ```rust
//! use openscad_parser::grammar::{alt, r, t, Assoc, Grammar, GrammarSpec};
//! use openscad_parser::cst::NodeKind;
//! use openscad_parser::lexer::TokenKind;
//!
//! let spec = GrammarSpec::new()
//!     .precedence("Additive", Assoc::Left, &[TokenKind::Plus])
//!     .node(NodeKind::SourceFile, "source_file", vec![alt([r("_expr")])])
//!     .hidden("_expr", vec![alt([t(TokenKind::Number)]), alt([r("binary_expression")])])
//!     .node(
//!         NodeKind::BinaryExpression,
//!         "binary_expression",
//!         vec![alt([r("_expr"), t(TokenKind::Plus), r("_expr")])],
//!     )
//!     .entry("source_file");
//! let grammar = Grammar::compile(&spec).unwrap();
//! assert_eq!(grammar.entries().len(), 1);
//! ```

mod openscad;
pub mod table;

pub use openscad::openscad;

use std::collections::{BTreeSet, HashMap};

use crate::cst::NodeKind;
use crate::error::GrammarError;
use crate::lexer::TokenKind;

pub type RuleId = usize;
pub type ProductionId = usize;

// =============================================================================
// SPEC
// =============================================================================

/// Associativity of a precedence level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assoc {
    Left,
    Right,
    NonAssoc,
}

/// Symbol of an alternative, by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sym {
    Token(TokenKind),
    Rule(String),
}

/// Token symbol.
pub fn t(kind: TokenKind) -> Sym {
    Sym::Token(kind)
}

/// Rule symbol.
pub fn r(name: &str) -> Sym {
    Sym::Rule(name.to_string())
}

/// One alternative of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    symbols: Vec<Sym>,
    prec: Option<String>,
}

impl Alternative {
    /// Override the precedence this alternative takes from its last token.
    pub fn prec(mut self, level: &str) -> Self {
        self.prec = Some(level.to_string());
        self
    }
}

/// Alternative made of `symbols`; an empty list derives the empty string.
pub fn alt(symbols: impl IntoIterator<Item = Sym>) -> Alternative {
    Alternative {
        symbols: symbols.into_iter().collect(),
        prec: None,
    }
}

#[derive(Debug, Clone)]
struct LevelSpec {
    name: String,
    assoc: Assoc,
    tokens: Vec<TokenKind>,
}

#[derive(Debug, Clone)]
struct RuleSpec {
    name: String,
    kind: Option<NodeKind>,
    alternatives: Vec<Alternative>,
}

/// Declarative grammar, built with chained calls.
#[derive(Debug, Clone, Default)]
pub struct GrammarSpec {
    levels: Vec<LevelSpec>,
    rules: Vec<RuleSpec>,
    entries: Vec<String>,
}

impl GrammarSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a precedence level. Levels bind tighter the later they are
    /// declared.
    pub fn precedence(mut self, name: &str, assoc: Assoc, tokens: &[TokenKind]) -> Self {
        self.levels.push(LevelSpec {
            name: name.to_string(),
            assoc,
            tokens: tokens.to_vec(),
        });
        self
    }

    /// Declare a visible rule producing `kind` nodes.
    pub fn node(mut self, kind: NodeKind, name: &str, alternatives: Vec<Alternative>) -> Self {
        self.rules.push(RuleSpec {
            name: name.to_string(),
            kind: Some(kind),
            alternatives,
        });
        self
    }

    /// Declare a hidden rule whose children are spliced into the parent.
    pub fn hidden(mut self, name: &str, alternatives: Vec<Alternative>) -> Self {
        self.rules.push(RuleSpec {
            name: name.to_string(),
            kind: None,
            alternatives,
        });
        self
    }

    /// Make a visible rule an entry point.
    pub fn entry(mut self, name: &str) -> Self {
        self.entries.push(name.to_string());
        self
    }
}

// =============================================================================
// COMPILED GRAMMAR
// =============================================================================

/// Grammar symbol after name resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Token(TokenKind),
    Rule(RuleId),
}

/// Resolved precedence: higher `level` binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prec {
    pub level: usize,
    pub assoc: Assoc,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    /// `None` for hidden rules.
    pub kind: Option<NodeKind>,
}

#[derive(Debug, Clone)]
pub struct Production {
    pub lhs: RuleId,
    pub rhs: Vec<Symbol>,
    pub prec: Option<Prec>,
}

/// An entry point and the augmented rule `$accept → rule` wrapping it.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub kind: NodeKind,
    pub rule: RuleId,
    pub accept_production: ProductionId,
}

/// Validated grammar with rule names resolved into indices.
#[derive(Debug, Clone)]
pub struct Grammar {
    rules: Vec<Rule>,
    productions: Vec<Production>,
    by_lhs: Vec<Vec<ProductionId>>,
    token_prec: [Option<Prec>; TokenKind::COUNT],
    entries: Vec<Entry>,
}

impl Grammar {
    /// Validate `spec` and resolve it.
    pub fn compile(spec: &GrammarSpec) -> Result<Self, GrammarError> {
        let mut level_ids = HashMap::new();
        let mut token_prec = [None; TokenKind::COUNT];
        for (level, spec_level) in spec.levels.iter().enumerate() {
            if level_ids.insert(spec_level.name.as_str(), level).is_some() {
                return Err(GrammarError::DuplicateLevel(spec_level.name.clone()));
            }
            for &token in &spec_level.tokens {
                if !token.is_terminal() {
                    return Err(GrammarError::ReservedToken {
                        rule: spec_level.name.clone(),
                        token,
                    });
                }
                let slot = &mut token_prec[token.index()];
                if slot.is_some() {
                    return Err(GrammarError::DuplicatePrecedence(token));
                }
                *slot = Some(Prec {
                    level,
                    assoc: spec_level.assoc,
                });
            }
        }

        let mut rule_ids = HashMap::new();
        let mut rules = Vec::with_capacity(spec.rules.len() + spec.entries.len());
        for (id, rule) in spec.rules.iter().enumerate() {
            if rule_ids.insert(rule.name.as_str(), id).is_some() {
                return Err(GrammarError::DuplicateRule(rule.name.clone()));
            }
            if rule.alternatives.is_empty() {
                return Err(GrammarError::EmptyRule(rule.name.clone()));
            }
            rules.push(Rule {
                name: rule.name.clone(),
                kind: rule.kind,
            });
        }

        let mut productions = Vec::new();
        for (lhs, rule) in spec.rules.iter().enumerate() {
            for alternative in &rule.alternatives {
                let mut rhs = Vec::with_capacity(alternative.symbols.len());
                for symbol in &alternative.symbols {
                    rhs.push(match symbol {
                        Sym::Token(token) if !token.is_terminal() => {
                            return Err(GrammarError::ReservedToken {
                                rule: rule.name.clone(),
                                token: *token,
                            });
                        }
                        Sym::Token(token) => Symbol::Token(*token),
                        Sym::Rule(name) => match rule_ids.get(name.as_str()) {
                            Some(&id) => Symbol::Rule(id),
                            None => {
                                return Err(GrammarError::UndefinedRule {
                                    rule: rule.name.clone(),
                                    missing: name.clone(),
                                });
                            }
                        },
                    });
                }

                let prec = match &alternative.prec {
                    Some(level) => {
                        let level = *level_ids.get(level.as_str()).ok_or_else(|| {
                            GrammarError::UnknownPrecedence {
                                rule: rule.name.clone(),
                                level: level.clone(),
                            }
                        })?;
                        Some(Prec {
                            level,
                            assoc: spec.levels[level].assoc,
                        })
                    }
                    None => rhs.iter().rev().find_map(|symbol| match symbol {
                        Symbol::Token(token) => Some(token_prec[token.index()]),
                        Symbol::Rule(_) => None,
                    }).flatten(),
                };

                productions.push(Production { lhs, rhs, prec });
            }
        }

        if spec.entries.is_empty() {
            return Err(GrammarError::NoEntryPoint);
        }
        let mut entries = Vec::with_capacity(spec.entries.len());
        for name in &spec.entries {
            let rule = *rule_ids
                .get(name.as_str())
                .ok_or_else(|| GrammarError::UndefinedEntry(name.clone()))?;
            let kind = rules[rule]
                .kind
                .ok_or_else(|| GrammarError::HiddenEntry(name.clone()))?;
            let accept_rule = rules.len();
            rules.push(Rule {
                name: format!("$accept_{name}"),
                kind: None,
            });
            entries.push(Entry {
                kind,
                rule,
                accept_production: productions.len(),
            });
            productions.push(Production {
                lhs: accept_rule,
                rhs: vec![Symbol::Rule(rule)],
                prec: None,
            });
        }

        let mut by_lhs = vec![Vec::new(); rules.len()];
        for (id, production) in productions.iter().enumerate() {
            by_lhs[production.lhs].push(id);
        }

        Ok(Self {
            rules,
            productions,
            by_lhs,
            token_prec,
            entries,
        })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id]
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id]
    }

    /// Productions whose left-hand side is `rule`, in declaration order.
    pub fn productions_of(&self, rule: RuleId) -> &[ProductionId] {
        &self.by_lhs[rule]
    }

    pub fn token_prec(&self, token: TokenKind) -> Option<Prec> {
        self.token_prec[token.index()]
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Entry point producing `kind` nodes.
    pub fn entry(&self, kind: NodeKind) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.kind == kind)
    }

    /// Terminals the grammar mentions, in kind order.
    pub fn terminals(&self) -> BTreeSet<TokenKind> {
        self.productions
            .iter()
            .flat_map(|production| production.rhs.iter())
            .filter_map(|symbol| match symbol {
                Symbol::Token(token) => Some(*token),
                Symbol::Rule(_) => None,
            })
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
