// Reads the token description format: whitespace-delimited blocks, each
// headed by `specials:`, `symbols:`, or `keywords:` and containing
// NAME LITERAL pairs.

use anyhow::{Result, anyhow, bail};
use chumsky::prelude::*;
use logos::Logos;

/// The section of the token file a token was declared in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Block {
    /// Declared but not matched by the generated recognizer.
    Special,
    /// Matched by the byte-dispatch machine.
    Symbol,
    /// Checked against identifier text after the fact.
    Keyword,
}

/// A token declaration: a name, the literal text, and its block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexToken {
    pub name: String,
    pub literal: String,
    pub block: Block,
}

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawTok {
    #[token("specials:", |_| Block::Special)]
    #[token("symbols:", |_| Block::Symbol)]
    #[token("keywords:", |_| Block::Keyword)]
    Header(Block),
    #[regex(r"[A-Za-z]+:", priority = 3)]
    UnknownHeader,
    #[regex(r"[^ \t\r\n\f]+", |lex| lex.slice().to_owned(), priority = 2)]
    Word(String),
}

fn parser<'a>() -> impl Parser<'a, &'a [RawTok], Vec<LexToken>> {
    let header = select! { RawTok::Header(block) => block }.labelled("block header");
    let word = select! { RawTok::Word(word) => word }.labelled("word");

    let pair = word.clone().then(word);

    let block = header
        .then(pair.repeated().collect::<Vec<_>>())
        .map(|(block, pairs)| {
            pairs
                .into_iter()
                .map(move |(name, literal)| LexToken {
                    name,
                    literal,
                    block,
                })
                .collect::<Vec<_>>()
        });

    block
        .repeated()
        .collect::<Vec<_>>()
        .map(|blocks| blocks.into_iter().flatten().collect())
}

/// Parses the token file format, yielding the declarations in file
/// order. Unknown block headers and malformed pairs are fatal.
pub fn read_tokens(src: &str) -> Result<Vec<LexToken>> {
    let mut toks = Vec::new();
    for (tok, span) in RawTok::lexer(src).spanned() {
        match tok {
            Ok(RawTok::UnknownHeader) => {
                let name = src[span].trim_end_matches(':');
                bail!("unknown block {name:?}");
            }
            Ok(t) => toks.push(t),
            Err(()) => bail!("unreadable token file near byte {}", span.start),
        }
    }

    parser()
        .parse(&toks)
        .into_result()
        .map_err(|_| anyhow!("malformed token file: tokens must come in NAME LITERAL pairs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_classify_tokens() {
        let tokens = read_tokens(
            "symbols:  Semi ; Equals =\nkeywords: For  for Return return\nspecials: EOF  $\n",
        )
        .unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(
            tokens[0],
            LexToken {
                name: "Semi".to_owned(),
                literal: ";".to_owned(),
                block: Block::Symbol,
            }
        );
        assert_eq!(tokens[2].block, Block::Keyword);
        assert_eq!(tokens[2].literal, "for");
        assert_eq!(
            tokens[4],
            LexToken {
                name: "EOF".to_owned(),
                literal: "$".to_owned(),
                block: Block::Special,
            }
        );
    }

    #[test]
    fn unknown_block_is_fatal() {
        let err = read_tokens("widgets: Foo f\n").unwrap_err();
        assert!(err.to_string().contains("unknown block \"widgets\""));
    }

    #[test]
    fn dangling_name_is_fatal() {
        assert!(read_tokens("symbols: Semi ; Equals\n").is_err());
    }

    #[test]
    fn tokens_before_any_header_are_fatal() {
        assert!(read_tokens("Semi ;\n").is_err());
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(read_tokens("").unwrap().is_empty());
    }
}
