use super::tokens::{Block, LexToken};
use std::collections::BTreeMap;

/// A byte-dispatch trie over the `Symbol`-block literals.
///
/// Each node records the token accepted exactly there, if any, and its
/// children keyed by the next byte. Children are kept in sorted byte
/// order so emission is deterministic.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SymTrie {
    accept: Option<String>,
    next: BTreeMap<u8, SymTrie>,
}

impl SymTrie {
    /// Builds the trie from the token list; only `Symbol` entries
    /// participate.
    pub fn from_tokens(tokens: &[LexToken]) -> SymTrie {
        let mut root = SymTrie::default();
        for tok in tokens {
            if tok.block == Block::Symbol {
                root.add(tok.literal.as_bytes(), &tok.name);
            }
        }
        root
    }

    fn add(&mut self, literal: &[u8], accept: &str) {
        match literal.split_first() {
            None => self.accept = Some(accept.to_owned()),
            Some((&b, rest)) => self.next.entry(b).or_default().add(rest, accept),
        }
    }

    /// The token recognized exactly at this node, if any.
    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    /// The child reached on `b`.
    pub fn child(&self, b: u8) -> Option<&SymTrie> {
        self.next.get(&b)
    }

    /// The children in ascending byte order.
    pub fn children(&self) -> impl Iterator<Item = (u8, &SymTrie)> {
        self.next.iter().map(|(&b, child)| (b, child))
    }

    pub fn is_leaf(&self) -> bool {
        self.next.is_empty()
    }
}
