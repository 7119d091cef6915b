//! The `lex` lexer generator.
//!
//! This module exposes the [`generate`] function, which reads a token
//! description file and produces Rust source code for a byte-dispatch
//! recognizer plus the token id tables the caller's lexer builds on.

mod generate;
mod tokens;
mod trie;

pub use generate::generate;
pub use tokens::{Block, LexToken, read_tokens};
pub use trie::SymTrie;
