//! Lexer and parser generators.
//!
//! `parsegen` turns declarative language descriptions into Rust source
//! code. It provides two generators behind the `gen` binary:
//!  * **`lex`** — builds a byte-dispatch recognizer from a token list
//!  * **`lr`** — builds a table-driven LR parser from a grammar
//!
//! The library entry points are [`lex::generate`] and [`lr::generate`].
//! Both return formatted source text; non-fatal problems (grammar
//! conflicts, unknown configuration keys) are collected in a
//! [`diag::Diagnostics`] value so callers decide how to surface them.

pub mod codegen;
pub mod diag;
pub mod lex;
pub mod lr;
