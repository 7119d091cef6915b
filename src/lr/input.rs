// Extracts grammar rules from a rule description file.
//
// The description is a sequence of `const` configuration items and
// function-shaped rule definitions. Each `syntax("...")` statement in a
// function body starts a new rule: the LHS is the function's name, the
// semantic type is the declared result type, and the statements up to
// the next `syntax` (or the end of the body) are the rule's semantic
// action, recovered verbatim from the source.

use super::grammar::Rule;
use crate::diag::{Diagnostics, Warning};
use logos::Logos;
use std::ops::Range;
use thiserror::Error;

/// A fatal problem in the input description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}")]
pub struct InputError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// Generation knobs read from the input description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params {
    /// Inserted as a prefix on all generated identifiers; useful to
    /// prevent conflicts between generated files.
    pub prefix: String,
    /// The module the output was generated from; the input file stem.
    pub module: String,
    /// The name of the token type fed to the generated parser.
    pub token_type: String,
    /// Whether the generated parser logs each step as it parses.
    pub trace: bool,
}

impl Params {
    fn new(module: &str) -> Self {
        Params {
            prefix: String::new(),
            module: module.to_owned(),
            token_type: "Token".to_owned(),
            trace: false,
        }
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
enum Tok {
    #[token("const")]
    Const,
    #[token("fn")]
    Fn,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
    #[regex(r"[0-9][A-Za-z0-9_.]*")]
    Number,
    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,
    #[token("->")]
    Arrow,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semi,
    #[token("=")]
    Eq,
    #[regex(r".", priority = 0)]
    Other,
}

fn line_col(src: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (i, ch) in src.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

struct Cursor<'a> {
    src: &'a str,
    toks: Vec<(Tok, Range<usize>)>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<Tok> {
        self.toks.get(self.pos).map(|(t, _)| *t)
    }

    fn peek2(&self) -> Option<Tok> {
        self.toks.get(self.pos + 1).map(|(t, _)| *t)
    }

    /// Byte offset of the current token, or the end of input.
    fn offset(&self) -> usize {
        self.toks
            .get(self.pos)
            .map(|(_, span)| span.start)
            .unwrap_or(self.src.len())
    }

    /// Source text of the current token.
    fn slice(&self) -> &'a str {
        self.toks
            .get(self.pos)
            .map(|(_, span)| &self.src[span.clone()])
            .unwrap_or("")
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn position(&self) -> (usize, usize) {
        line_col(self.src, self.offset())
    }

    fn error(&self, message: impl Into<String>) -> InputError {
        let (line, column) = self.position();
        InputError {
            message: message.into(),
            line,
            column,
        }
    }

    fn expect(&mut self, tok: Tok, what: &str) -> Result<&'a str, InputError> {
        match self.peek() {
            Some(t) if t == tok => {
                let text = self.slice();
                self.bump();
                Ok(text)
            }
            _ => Err(self.error(format!("expected {what}"))),
        }
    }

    fn expect_str(&mut self, what: &str) -> Result<String, InputError> {
        let quoted = self.expect(Tok::Str, what)?;
        Ok(unquote(quoted))
    }
}

fn unquote(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Splits pattern text like `A=expr '+' B=expr` into symbols and
/// variable labels. `X=sym` binds variable `X`; single quotes mark a
/// literal symbol and are stripped.
fn parse_pattern(text: &str) -> (Vec<String>, Vec<String>) {
    let mut pattern = Vec::new();
    let mut vars = Vec::new();
    for word in text.split_whitespace() {
        let bytes = word.as_bytes();
        if bytes.len() > 2 && bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\'' {
            pattern.push(word[1..word.len() - 1].to_owned());
            vars.push(String::new());
        } else if bytes.len() > 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b'=' {
            vars.push(word[..1].to_owned());
            pattern.push(word[2..].to_owned());
        } else {
            pattern.push(word.to_owned());
            vars.push(String::new());
        }
    }
    (pattern, vars)
}

/// Reads an input description and yields the generation parameters and
/// the grammar rules in source order. Unknown configuration keys are
/// reported through `diags` and skipped.
pub fn extract(
    src: &str,
    module: &str,
    diags: &mut Diagnostics,
) -> Result<(Params, Vec<Rule>), InputError> {
    let mut toks = Vec::new();
    let mut lexer = Tok::lexer(src);
    while let Some(tok) = lexer.next() {
        let span = lexer.span();
        match tok {
            Ok(t) => toks.push((t, span)),
            Err(()) => {
                let (line, column) = line_col(src, span.start);
                return Err(InputError {
                    message: format!("unrecognized input {:?}", &src[span]),
                    line,
                    column,
                });
            }
        }
    }

    let mut cursor = Cursor { src, toks, pos: 0 };
    let mut params = Params::new(module);
    let mut rules = Vec::new();

    while let Some(tok) = cursor.peek() {
        match tok {
            Tok::Const => parse_const(&mut cursor, &mut params, diags)?,
            Tok::Fn => parse_fn(&mut cursor, &mut rules)?,
            _ => {
                return Err(
                    cursor.error(format!("expected `fn` or `const`, found `{}`", cursor.slice()))
                );
            }
        }
    }

    if rules.is_empty() {
        return Err(InputError {
            message: "input defines no rules".to_owned(),
            line: 1,
            column: 1,
        });
    }

    Ok((params, rules))
}

fn parse_const(
    cursor: &mut Cursor,
    params: &mut Params,
    diags: &mut Diagnostics,
) -> Result<(), InputError> {
    cursor.bump();
    let (line, column) = cursor.position();
    let name = cursor.expect(Tok::Ident, "configuration name")?;

    // The declared type carries no information here; skip to the `=`.
    loop {
        match cursor.peek() {
            Some(Tok::Eq) => {
                cursor.bump();
                break;
            }
            Some(Tok::Semi) | None => {
                return Err(cursor.error("expected `=` in configuration item"));
            }
            Some(_) => cursor.bump(),
        }
    }

    match name {
        "PREFIX" => params.prefix = cursor.expect_str("string value for PREFIX")?,
        "TOKEN_TYPE" => params.token_type = cursor.expect_str("string value for TOKEN_TYPE")?,
        "TRACE" => {
            let value = cursor.expect(Tok::Ident, "`true` or `false` for TRACE")?;
            params.trace = match value {
                "true" => true,
                "false" => false,
                _ => return Err(cursor.error("expected `true` or `false` for TRACE")),
            };
        }
        _ => {
            diags.warn(Warning::UnknownKey {
                name: name.to_owned(),
                line,
                column,
            });
            while !matches!(cursor.peek(), Some(Tok::Semi) | None) {
                cursor.bump();
            }
        }
    }

    cursor.expect(Tok::Semi, "`;` after configuration item")?;
    Ok(())
}

fn parse_fn(cursor: &mut Cursor, rules: &mut Vec<Rule>) -> Result<(), InputError> {
    cursor.bump();
    let symbol = cursor.expect(Tok::Ident, "rule name")?.to_owned();
    cursor.expect(Tok::LParen, "`(`")?;
    cursor.expect(Tok::RParen, "`)`")?;
    cursor.expect(Tok::Arrow, "`->`")?;

    // The result type runs up to the opening brace, taken verbatim.
    let typ_start = cursor.offset();
    while !matches!(cursor.peek(), Some(Tok::LBrace)) {
        if cursor.peek().is_none() {
            return Err(cursor.error("expected `{` after result type"));
        }
        cursor.bump();
    }
    let typ = cursor.src[typ_start..cursor.offset()].trim().to_owned();
    if typ.is_empty() {
        return Err(cursor.error("expected result type"));
    }
    cursor.bump();

    let mut depth = 1usize;
    let mut pending: Option<(Vec<String>, Vec<String>)> = None;
    let mut code_start = cursor.offset();

    loop {
        match cursor.peek() {
            None => return Err(cursor.error("unexpected end of input in rule body")),
            Some(Tok::LBrace) => {
                depth += 1;
                cursor.bump();
            }
            Some(Tok::RBrace) => {
                depth -= 1;
                let close = cursor.offset();
                cursor.bump();
                if depth == 0 {
                    if let Some((pattern, vars)) = pending.take() {
                        rules.push(Rule {
                            symbol: symbol.clone(),
                            typ: typ.clone(),
                            pattern,
                            vars,
                            code: cursor.src[code_start..close].trim().to_owned(),
                        });
                    }
                    return Ok(());
                }
            }
            Some(Tok::Ident)
                if depth == 1
                    && cursor.slice() == "syntax"
                    && cursor.peek2() == Some(Tok::LParen) =>
            {
                let syntax_start = cursor.offset();
                if let Some((pattern, vars)) = pending.take() {
                    rules.push(Rule {
                        symbol: symbol.clone(),
                        typ: typ.clone(),
                        pattern,
                        vars,
                        code: cursor.src[code_start..syntax_start].trim().to_owned(),
                    });
                }
                cursor.bump();
                cursor.bump();
                let pattern_text = cursor.expect_str("pattern string in syntax declaration")?;
                cursor.expect(Tok::RParen, "`)` after pattern")?;
                cursor.expect(Tok::Semi, "`;` after syntax declaration")?;
                let (pattern, vars) = parse_pattern(&pattern_text);
                if pattern.is_empty() {
                    return Err(cursor.error("empty pattern in syntax declaration"));
                }
                pending = Some((pattern, vars));
                code_start = cursor.offset();
            }
            Some(_) => cursor.bump(),
        }
    }
}
