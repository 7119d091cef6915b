// Grammar terminology: a grammar is a collection of rules, statements
// like `expr := term + term`. There, "+" is a terminal, "expr" and
// "term" are nonterminals, and all of them are symbols. A symbol is a
// nonterminal exactly when some rule produces it.

use std::collections::{BTreeMap, BTreeSet};

/// The end-of-input pseudo-terminal.
pub const END_MARKER: &str = "$";

const MIDDOT: char = '\u{b7}';

/// A set of symbols.
pub type SymbolSet = BTreeSet<String>;

/// Maps symbols to symbol sets; the shape of FIRST and FOLLOW.
pub type SymbolMap = BTreeMap<String, SymbolSet>;

/// A grammar rule: one production plus the text of its semantic action.
///
/// For `exp Expr = A=num + B=num { a + b } ;` the rule has symbol
/// `exp`, type `Expr`, pattern `["num", "+", "num"]`, vars
/// `["A", "", "B"]`, and code `a + b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// The nonterminal the rule produces.
    pub symbol: String,
    /// The semantic value's type in the generated code; opaque here.
    pub typ: String,
    /// The symbols the rule matches, in order. Never empty.
    pub pattern: Vec<String>,
    /// Variable labels parallel to `pattern`; empty where unbound.
    pub vars: Vec<String>,
    /// The semantic action text; opaque here.
    pub code: String,
}

impl Rule {
    /// Renders the rule with `arrow` between LHS and RHS, inserting a
    /// dot before position `mark` when given.
    pub fn show(&self, arrow: &str, mark: Option<usize>) -> String {
        let mut out = format!("{} {}", self.symbol, arrow);
        for (i, pat) in self.pattern.iter().enumerate() {
            if mark == Some(i) {
                out.push(' ');
                out.push(MIDDOT);
            }
            out.push(' ');
            out.push_str(pat);
        }
        if mark == Some(self.pattern.len()) {
            out.push(' ');
            out.push(MIDDOT);
        }
        out
    }
}

/// An ordered collection of rules; rule 0 is the start rule.
#[derive(Debug, Default)]
pub struct Grammar {
    pub rules: Vec<Rule>,
    symbols: SymbolSet,
    terminals: SymbolSet,
    nonterminals: SymbolSet,
}

impl Grammar {
    /// Builds a grammar, walking all rules to collect the symbols and
    /// label them terminal or not based on whether they have any
    /// productions.
    pub fn new(rules: Vec<Rule>) -> Self {
        let mut g = Grammar {
            rules,
            ..Default::default()
        };
        for rule in &g.rules {
            g.nonterminals.insert(rule.symbol.clone());
            g.symbols.insert(rule.symbol.clone());
        }
        for rule in &g.rules {
            for sym in &rule.pattern {
                g.symbols.insert(sym.clone());
                if !g.nonterminals.contains(sym) {
                    g.terminals.insert(sym.clone());
                }
            }
        }

        if log::log_enabled!(log::Level::Debug) {
            let terms: Vec<&str> = g.terminals.iter().map(String::as_str).collect();
            log::debug!("terminals: {}", terms.join(" "));
        }
        g
    }

    pub fn symbols(&self) -> &SymbolSet {
        &self.symbols
    }

    pub fn terminals(&self) -> &SymbolSet {
        &self.terminals
    }

    pub fn nonterminals(&self) -> &SymbolSet {
        &self.nonterminals
    }

    /// The LHS of the start rule.
    pub fn start_symbol(&self) -> &str {
        &self.rules[0].symbol
    }

    /// Computes the FIRST sets: for each symbol, the terminals that can
    /// begin one of its derivations.
    ///
    /// Nullable productions are not modeled; every rule consumes at
    /// least one symbol.
    pub fn first(&self) -> SymbolMap {
        let mut first = SymbolMap::new();

        // Terminals begin with themselves.
        for term in &self.terminals {
            first
                .entry(term.clone())
                .or_default()
                .insert(term.clone());
        }

        // Seed each nonterminal with the head of each of its patterns.
        // Heads may themselves be nonterminals at this point.
        for rule in &self.rules {
            first
                .entry(rule.symbol.clone())
                .or_default()
                .insert(rule.pattern[0].clone());
        }

        // Iterate until stable: whatever a member can begin with, the
        // owning symbol can begin with too.
        // (Given E -> A and A -> x, iteration is what gets x into
        // first[E].)
        let mut changed = true;
        while changed {
            changed = false;
            let keys: Vec<String> = first.keys().cloned().collect();
            for key in keys {
                let members: Vec<String> = first[&key].iter().cloned().collect();
                for member in members {
                    let Some(expansion) = first.get(&member).cloned() else {
                        continue;
                    };
                    let set = first.get_mut(&key).expect("key seeded above");
                    let before = set.len();
                    set.extend(expansion);
                    if set.len() != before {
                        changed = true;
                    }
                }
            }
        }

        // Drop the nonterminal members left over from seeding.
        for set in first.values_mut() {
            set.retain(|sym| !self.nonterminals.contains(sym));
        }

        first
    }

    /// Computes the FOLLOW sets: for each symbol, the terminals that
    /// can occur immediately after it in a sentential form derived from
    /// the start symbol.
    pub fn follow(&self, first: &SymbolMap) -> SymbolMap {
        let mut follow = SymbolMap::new();
        follow
            .entry(self.start_symbol().to_owned())
            .or_default()
            .insert(END_MARKER.to_owned());

        let mut changed = true;
        while changed {
            changed = false;
            for rule in &self.rules {
                for (i, pat_sym) in rule.pattern.iter().enumerate() {
                    let merged: SymbolSet = if i + 1 < rule.pattern.len() {
                        let next_sym = &rule.pattern[i + 1];
                        first.get(next_sym).cloned().unwrap_or_default()
                    } else {
                        follow.get(&rule.symbol).cloned().unwrap_or_default()
                    };
                    let set = follow.entry(pat_sym.clone()).or_default();
                    let before = set.len();
                    set.extend(merged);
                    if set.len() != before {
                        changed = true;
                    }
                }
            }
        }
        follow
    }
}

/// Logs a FIRST/FOLLOW-style map at debug level.
pub fn dump_symbol_map(map: &SymbolMap, label: &str) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    log::debug!("{label}:");
    for (sym, set) in map {
        let members: Vec<&str> = set.iter().map(String::as_str).collect();
        log::debug!("  {sym}: {}", members.join(" "));
    }
}
