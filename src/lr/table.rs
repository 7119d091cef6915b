// LR(0) item machinery and action-table construction.

use super::grammar::{Grammar, dump_symbol_map};
use crate::diag::{Diagnostics, Warning};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A partially-parsed production: a rule index plus a dot position.
///
/// `pos` is the offset the dot sits to the left of; `pos ==
/// pattern.len()` means the whole pattern has been recognized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
    pub rule: usize,
    pub pos: usize,
}

impl Item {
    /// The next symbol the item would match, or `None` when the item is
    /// at the end of its pattern.
    pub fn next_sym<'g>(&self, grammar: &'g Grammar) -> Option<&'g str> {
        grammar.rules[self.rule]
            .pattern
            .get(self.pos)
            .map(String::as_str)
    }
}

/// A set of items, compared extensionally.
pub type ItemSet = BTreeSet<Item>;

/// An entry in the action table; an absent entry means error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Accept the next token and move to the given state. On a
    /// nonterminal this is the goto entry consulted after a reduction.
    Shift(usize),
    /// Pop the stack per the given rule. Reducing rule 0 with `$` as
    /// the lookahead accepts the input.
    Reduce(usize),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Shift(state) => write!(f, "shift {state}"),
            Action::Reduce(rule) => write!(f, "reduce {rule}"),
        }
    }
}

/// One row per state; each row maps symbols to actions.
pub type ActionTable = Vec<BTreeMap<String, Action>>;

/// Expands `set` in place with every rule whose LHS is the next symbol
/// of some member, repeating until nothing new turns up.
pub fn closure(set: &mut ItemSet, grammar: &Grammar) {
    let mut expanded: BTreeSet<&str> = BTreeSet::new();

    let mut changed = true;
    while changed {
        changed = false;
        for item in set.clone() {
            // Given an item like x -> a.b, grab b.
            let Some(sym) = item.next_sym(grammar) else {
                continue;
            };
            if expanded.contains(sym) {
                continue;
            }
            for (i, rule) in grammar.rules.iter().enumerate() {
                if rule.symbol == sym {
                    if set.insert(Item { rule: i, pos: 0 }) {
                        changed = true;
                    }
                    expanded.insert(sym);
                }
            }
        }
    }
}

/// Computes the successor item set reached by consuming `x`.
pub fn goto(set: &ItemSet, grammar: &Grammar, x: &str) -> ItemSet {
    let mut out = ItemSet::new();
    for item in set {
        if item.next_sym(grammar) == Some(x) {
            out.insert(Item {
                rule: item.rule,
                pos: item.pos + 1,
            });
        }
    }
    closure(&mut out, grammar);
    out
}

/// Builds the canonical collection of item sets and the action table.
///
/// Rows are indexed by state. Shift entries on nonterminals double as
/// the goto function. Conflicting entries are reported through `diags`;
/// the later reduce overwrites.
pub fn compute_actions(grammar: &Grammar, diags: &mut Diagnostics) -> ActionTable {
    let first = grammar.first();
    let follow = grammar.follow(&first);
    dump_symbol_map(&follow, "follow set");

    let mut table: ActionTable = Vec::new();

    let mut start = ItemSet::from([Item { rule: 0, pos: 0 }]);
    closure(&mut start, grammar);
    let mut states = vec![start];

    // Construct the state list by computing goto() for each state and
    // symbol; new sets are appended and visited in turn.
    let mut i = 0;
    while i < states.len() {
        let mut actions = BTreeMap::new();
        for sym in grammar.symbols() {
            let next = goto(&states[i], grammar, sym);
            if next.is_empty() {
                continue;
            }
            let id = match states.iter().position(|s| *s == next) {
                Some(id) => id,
                None => {
                    states.push(next);
                    states.len() - 1
                }
            };
            actions.insert(sym.clone(), Action::Shift(id));
        }
        table.push(actions);
        i += 1;
    }

    // Add a reduce action for every item that has consumed its full
    // pattern, keyed by the follow set of its LHS.
    for (i, set) in states.iter().enumerate() {
        let actions = &mut table[i];
        for item in set {
            if item.next_sym(grammar).is_some() {
                continue;
            }
            let rule = &grammar.rules[item.rule];
            let Some(follow_set) = follow.get(&rule.symbol) else {
                continue;
            };
            for term in follow_set {
                let replacement = Action::Reduce(item.rule);
                if let Some(&existing) = actions.get(term) {
                    if log::log_enabled!(log::Level::Trace) {
                        for it in set {
                            log::trace!("  {}", grammar.rules[it.rule].show("->", Some(it.pos)));
                        }
                    }
                    diags.warn(Warning::Conflict {
                        state: i,
                        lookahead: term.clone(),
                        existing,
                        replacement,
                    });
                }
                actions.insert(term.clone(), replacement);
            }
        }
    }

    if log::log_enabled!(log::Level::Debug) {
        for (i, set) in states.iter().enumerate() {
            log::debug!("set {i}:");
            for item in set {
                log::debug!("  {}", grammar.rules[item.rule].show("->", Some(item.pos)));
            }
        }
    }

    table
}

/// Logs the action table at debug level.
pub fn dump_actions(table: &ActionTable) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    log::debug!("parsing table:");
    for (i, actions) in table.iter().enumerate() {
        let mut line = format!("{i:2}");
        for (sym, action) in actions {
            line.push_str(&format!(" {sym}:{action}"));
        }
        log::debug!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lr::grammar::Rule;

    fn rule(symbol: &str, pattern: &[&str]) -> Rule {
        Rule {
            symbol: symbol.to_owned(),
            typ: String::new(),
            pattern: pattern.iter().map(|s| (*s).to_owned()).collect(),
            vars: vec![String::new(); pattern.len()],
            code: String::new(),
        }
    }

    #[test]
    fn closure_pulls_in_productions() {
        let g = Grammar::new(vec![rule("s", &["a"]), rule("a", &["x"])]);
        let mut set = ItemSet::from([Item { rule: 0, pos: 0 }]);
        closure(&mut set, &g);
        assert_eq!(
            set,
            ItemSet::from([Item { rule: 0, pos: 0 }, Item { rule: 1, pos: 0 }])
        );
    }

    #[test]
    fn goto_advances_the_dot() {
        let g = Grammar::new(vec![rule("s", &["a"]), rule("a", &["x"])]);
        let mut set = ItemSet::from([Item { rule: 0, pos: 0 }]);
        closure(&mut set, &g);
        let next = goto(&set, &g, "x");
        assert_eq!(next, ItemSet::from([Item { rule: 1, pos: 1 }]));
    }

    #[test]
    fn single_rule_grammar_has_two_states() {
        let g = Grammar::new(vec![rule("start", &["t"])]);
        let mut diags = Diagnostics::new();
        let table = compute_actions(&g, &mut diags);

        assert_eq!(table.len(), 2);
        assert_eq!(table[0].get("t"), Some(&Action::Shift(1)));
        assert_eq!(table[1].get("$"), Some(&Action::Reduce(0)));
        assert!(diags.is_empty());
    }

    #[test]
    fn arithmetic_grammar_has_six_states() {
        let g = Grammar::new(vec![
            rule("expr", &["expr", "+", "num"]),
            rule("expr", &["num"]),
            rule("num", &["digit"]),
        ]);
        let mut diags = Diagnostics::new();
        let table = compute_actions(&g, &mut diags);

        assert_eq!(table.len(), 6);
        assert!(diags.is_empty());
    }

    #[test]
    fn left_recursion_is_conflict_free() {
        let g = Grammar::new(vec![
            rule("list", &["list", "item"]),
            rule("list", &["item"]),
        ]);
        let mut diags = Diagnostics::new();
        compute_actions(&g, &mut diags);
        assert!(diags.is_empty());
    }

    #[test]
    fn reduce_reduce_conflict_is_reported_and_later_reduce_wins() {
        let g = Grammar::new(vec![
            rule("s", &["a"]),
            rule("s", &["b"]),
            rule("a", &["x"]),
            rule("b", &["x"]),
        ]);
        let mut diags = Diagnostics::new();
        let table = compute_actions(&g, &mut diags);

        let conflicts: Vec<_> = diags
            .warnings()
            .iter()
            .filter(|w| matches!(w, Warning::Conflict { .. }))
            .collect();
        assert_eq!(conflicts.len(), 1);
        let Warning::Conflict {
            lookahead,
            existing,
            replacement,
            state,
        } = conflicts[0]
        else {
            unreachable!();
        };
        assert_eq!(lookahead, "$");
        assert_eq!(*existing, Action::Reduce(2));
        assert_eq!(*replacement, Action::Reduce(3));
        assert_eq!(table[*state].get("x"), None);
        assert_eq!(table[*state].get("$"), Some(&Action::Reduce(3)));
    }

    #[test]
    fn no_two_states_are_equal() {
        let g = Grammar::new(vec![
            rule("expr", &["expr", "+", "num"]),
            rule("expr", &["num"]),
            rule("num", &["digit"]),
        ]);
        let mut diags = Diagnostics::new();
        // Rebuild the state list the same way compute_actions does and
        // check pairwise inequality.
        let mut start = ItemSet::from([Item { rule: 0, pos: 0 }]);
        closure(&mut start, &g);
        let mut states = vec![start];
        let mut i = 0;
        while i < states.len() {
            for sym in g.symbols() {
                let next = goto(&states[i], &g, sym);
                if !next.is_empty() && !states.contains(&next) {
                    states.push(next);
                }
            }
            i += 1;
        }
        for (a, sa) in states.iter().enumerate() {
            for (b, sb) in states.iter().enumerate() {
                if a != b {
                    assert_ne!(sa, sb);
                }
            }
        }
        compute_actions(&g, &mut diags);
    }
}
