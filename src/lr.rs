//! The `lr` parser generator.
//!
//! This module exposes the [`generate`] function, which reads a rule
//! description file and produces Rust source code for a table-driven LR
//! parser: the rule list with compiled semantic actions, the action
//! table, and a parser shell driving both.

mod generate;
mod grammar;
mod input;
mod table;

pub use generate::generate;
pub use grammar::{END_MARKER, Grammar, Rule, SymbolMap, SymbolSet};
pub use input::{InputError, Params, extract};
pub use table::{Action, ActionTable, Item, ItemSet, closure, compute_actions, goto};
