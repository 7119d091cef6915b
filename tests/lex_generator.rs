// End-to-end scenarios for the `lex` generator: trie behavior under the
// emitted dispatch semantics, keyword classification, and determinism.

use parsegen::lex::{Block, LexToken, SymTrie, generate, read_tokens};

/// Walks the trie the way the emitted recognizer does: descend while a
/// child matches, then stop and report the current node's accept. The
/// byte that failed to match stays unconsumed, mirroring the generated
/// single-byte unget.
fn run_trie<'t>(trie: &'t SymTrie, input: &[u8]) -> (Option<&'t str>, usize) {
    let mut node = trie;
    let mut consumed = 0;
    while consumed < input.len() {
        match node.child(input[consumed]) {
            Some(child) => {
                node = child;
                consumed += 1;
            }
            None => break,
        }
    }
    (node.accept(), consumed)
}

/// Classifies identifier text the way callers of the generated code do:
/// keyword table first, identifier otherwise.
fn classify<'a>(tokens: &'a [LexToken], ident: &str) -> Option<&'a str> {
    tokens
        .iter()
        .find(|t| t.block == Block::Keyword && t.literal == ident)
        .map(|t| t.name.as_str())
}

#[test]
fn equals_pair_disambiguates_on_lookahead() {
    let tokens = read_tokens("symbols: Equals = EqualsEquals ==\n").unwrap();
    let trie = SymTrie::from_tokens(&tokens);

    let (accept, consumed) = run_trie(&trie, b"=x");
    assert_eq!(accept, Some("Equals"));
    assert_eq!(consumed, 1, "lookahead byte must stay unread");

    let (accept, consumed) = run_trie(&trie, b"==");
    assert_eq!(accept, Some("EqualsEquals"));
    assert_eq!(consumed, 2);
}

#[test]
fn neq_and_semi_stream() {
    let tokens = read_tokens("symbols: Eq = Neq != Semi ;\n").unwrap();
    let trie = SymTrie::from_tokens(&tokens);

    // "!= ;" yields Neq then (after whitespace) Semi.
    let input = b"!= ;";
    let (accept, consumed) = run_trie(&trie, input);
    assert_eq!(accept, Some("Neq"));
    assert_eq!(consumed, 2);

    let rest = &input[consumed + 1..];
    let (accept, consumed) = run_trie(&trie, rest);
    assert_eq!(accept, Some("Semi"));
    assert_eq!(consumed, 1);

    // "= x" yields Eq with the x unread.
    let (accept, consumed) = run_trie(&trie, b"= x");
    assert_eq!(accept, Some("Eq"));
    assert_eq!(consumed, 1);
}

#[test]
fn unmatched_prefix_yields_no_token() {
    let tokens = read_tokens("symbols: Neq !=\n").unwrap();
    let trie = SymTrie::from_tokens(&tokens);

    let (accept, consumed) = run_trie(&trie, b"!!");
    assert_eq!(accept, None);
    assert_eq!(consumed, 1);
}

#[test]
fn keywords_specialize_identifiers() {
    let tokens = read_tokens("keywords: For for\n").unwrap();

    // "for foo": the first identifier is the For keyword, the second
    // stays an identifier.
    assert_eq!(classify(&tokens, "for"), Some("For"));
    assert_eq!(classify(&tokens, "foo"), None);
}

#[test]
fn generated_source_carries_the_keyword_table() {
    let out = generate("keywords: For for\nspecials: EOF $\n", "tokens").unwrap();
    assert!(out.contains("(\"for\", TokenId::For)"));
    assert!(out.contains("pub fn keyword"));
    assert!(!out.contains("b'f'"), "keywords must stay out of the trie");
}

#[test]
fn identical_input_generates_identical_output() {
    let src = "symbols: Semi ; Equals = EqualsEquals ==\nkeywords: For for\nspecials: EOF $\n";
    let first = generate(src, "tokens").unwrap();
    let second = generate(src, "tokens").unwrap();
    assert_eq!(first, second);
}
