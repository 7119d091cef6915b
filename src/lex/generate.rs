use super::tokens::{Block, LexToken, read_tokens};
use super::trie::SymTrie;
use crate::codegen::Writer;
use anyhow::Result;
use std::fmt::Write as _;

/// Generates lexer code for the token description in `src`.
///
/// The output defines the `TokenId` enum, literal and keyword tables,
/// and a `lex` recognizer for the symbol tokens. `module` names the
/// input in the generated header.
pub fn generate(src: &str, module: &str) -> Result<String> {
    let tokens = read_tokens(src)?;

    let mut w = Writer::new();
    writeln!(w, "//! Code generated by gen lex from `{module}`. Do not edit.")?;
    w.line("");
    w.line("/// The byte source the generated `lex` function reads from.");
    w.line("pub trait ByteReader {");
    w.line("/// Reads another byte, returning 0 at end of input.");
    w.line("fn next(&mut self) -> u8;");
    w.line("/// Backs up by one byte.");
    w.line("fn back(&mut self);");
    w.line("}");
    w.line("");

    write_token_ids(&mut w, &tokens)?;
    w.line("");
    write_token_names(&mut w, &tokens)?;
    w.line("");
    write_token_lookup(&mut w, &tokens)?;
    w.line("");
    write_keywords(&mut w, &tokens)?;
    w.line("");
    write_machine(&mut w, &tokens)?;

    w.format()
}

/// Emits the `TokenId` enum: the `None` sentinel first, then the
/// declared tokens in file order.
fn write_token_ids(w: &mut Writer, tokens: &[LexToken]) -> Result<()> {
    w.line("#[derive(Clone, Copy, Debug, PartialEq, Eq)]");
    w.line("pub enum TokenId {");
    w.line("None = 0,");
    for tok in tokens {
        writeln!(w, "{},", tok.name)?;
    }
    w.line("}");
    Ok(())
}

/// Emits the literal table indexed by token id.
fn write_token_names(w: &mut Writer, tokens: &[LexToken]) -> Result<()> {
    w.line("pub const TOKEN_NAMES: &[&str] = &[");
    w.line("\"\",");
    for tok in tokens {
        writeln!(w, "{:?},", tok.literal)?;
    }
    w.line("];");
    Ok(())
}

/// Emits the literal-to-id table covering every declared token.
fn write_token_lookup(w: &mut Writer, tokens: &[LexToken]) -> Result<()> {
    w.line("pub const TOKEN_IDS: &[(&str, TokenId)] = &[");
    for tok in tokens {
        writeln!(w, "({:?}, TokenId::{}),", tok.literal, tok.name)?;
    }
    w.line("];");
    w.line("");
    w.line("pub fn token_id(literal: &str) -> Option<TokenId> {");
    w.line("TOKEN_IDS.iter().find(|(l, _)| *l == literal).map(|(_, id)| *id)");
    w.line("}");
    Ok(())
}

/// Emits the keyword table used to specialize identifiers, restricted
/// to the `keywords:` block.
fn write_keywords(w: &mut Writer, tokens: &[LexToken]) -> Result<()> {
    w.line("pub const KEYWORDS: &[(&str, TokenId)] = &[");
    for tok in tokens {
        if tok.block == Block::Keyword {
            writeln!(w, "({:?}, TokenId::{}),", tok.literal, tok.name)?;
        }
    }
    w.line("];");
    w.line("");
    w.line("pub fn keyword(ident: &str) -> Option<TokenId> {");
    w.line("KEYWORDS.iter().find(|(k, _)| *k == ident).map(|(_, id)| *id)");
    w.line("}");
    Ok(())
}

/// Emits the recognizer for the symbol tokens. Identifiers and keywords
/// are left to the caller: read an identifier, then consult `keyword`.
fn write_machine(w: &mut Writer, tokens: &[LexToken]) -> Result<()> {
    let trie = SymTrie::from_tokens(tokens);
    let eof = tokens
        .iter()
        .find(|t| t.block == Block::Special && t.literal == "$")
        .map(|t| t.name.as_str());

    w.line("pub fn lex(r: &mut impl ByteReader) -> TokenId {");
    write_dispatch(w, &trie, eof)?;
    w.line("}");
    Ok(())
}

/// Emits one `match r.next()` level of the dispatch tree. `eof` is the
/// token returned for byte 0; only the root names one.
fn write_dispatch(w: &mut Writer, node: &SymTrie, eof: Option<&str>) -> Result<()> {
    w.line("match r.next() {");
    if let Some(eof) = eof {
        writeln!(w, "0 => TokenId::{eof},")?;
    }
    for (b, child) in node.children() {
        if child.is_leaf() {
            let accept = child.accept().expect("leaf nodes accept a token");
            writeln!(w, "{} => TokenId::{},", byte_literal(b), accept)?;
        } else {
            writeln!(w, "{} => {{", byte_literal(b))?;
            write_dispatch(w, child, None)?;
            w.line("}");
        }
    }
    w.line("_ => {");
    w.line("r.back();");
    match node.accept() {
        Some(accept) => writeln!(w, "TokenId::{accept}")?,
        // The caller tries identifier and keyword classification next.
        None => w.line("TokenId::None"),
    }
    w.line("}");
    w.line("}");
    Ok(())
}

fn byte_literal(b: u8) -> String {
    match b {
        b'\'' => r"b'\''".to_owned(),
        b'\\' => r"b'\\'".to_owned(),
        0x20..=0x7e => format!("b'{}'", b as char),
        _ => format!("{b:#04x}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKENS: &str = "\
symbols:  Semi ; Equals = EqualsEquals ==
keywords: For  for Return return
specials: EOF  $
";

    #[test]
    fn enum_lists_tokens_in_file_order_after_none() {
        let out = generate(TOKENS, "tokens").unwrap();
        let none = out.find("None = 0,").unwrap();
        let semi = out.find("Semi,").unwrap();
        let eof = out.find("EOF,").unwrap();
        assert!(none < semi && semi < eof);
    }

    #[test]
    fn keywords_table_is_restricted_to_the_keyword_block() {
        let out = generate(TOKENS, "tokens").unwrap();
        assert!(out.contains("(\"for\", TokenId::For)"));
        assert!(out.contains("(\"return\", TokenId::Return)"));

        let keywords = &out[out.find("KEYWORDS").unwrap()..out.find("pub fn keyword").unwrap()];
        assert!(!keywords.contains("Semi"));
        assert!(!keywords.contains("EOF"));
    }

    #[test]
    fn root_dispatch_maps_byte_zero_to_eof() {
        let out = generate(TOKENS, "tokens").unwrap();
        assert!(out.contains("0 => TokenId::EOF,"));
    }

    #[test]
    fn no_end_special_omits_the_zero_arm() {
        let out = generate("symbols: Eq = Neq != Semi ;\n", "tokens").unwrap();
        assert!(!out.contains("0 => TokenId::"));
    }

    #[test]
    fn shared_prefix_emits_nested_dispatch_with_unget() {
        let out = generate(TOKENS, "tokens").unwrap();
        // `=` has a continuation, so it dispatches again; `;` is final.
        assert!(out.contains("b';' => TokenId::Semi,"));
        assert!(out.contains("b'=' => TokenId::EqualsEquals,"));
        assert!(out.contains("r.back();"));
        assert!(out.contains("TokenId::Equals"));
    }

    #[test]
    fn specials_only_reach_the_tables() {
        let out = generate(TOKENS, "tokens").unwrap();
        assert!(out.contains("(\"$\", TokenId::EOF)"));
        assert!(!out.contains("b'$'"));
    }

    #[test]
    fn output_is_deterministic() {
        let a = generate(TOKENS, "tokens").unwrap();
        let b = generate(TOKENS, "tokens").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn byte_literals_escape_awkward_bytes() {
        assert_eq!(byte_literal(b';'), "b';'");
        assert_eq!(byte_literal(b'\''), r"b'\''");
        assert_eq!(byte_literal(b'\\'), r"b'\\'");
        assert_eq!(byte_literal(0x01), "0x01");
    }
}
