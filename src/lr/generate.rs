use super::grammar::{Grammar, Rule};
use super::input::{Params, extract};
use super::table::{self, Action, ActionTable};
use crate::codegen::Writer;
use crate::diag::Diagnostics;
use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt::Write as _;

fn capitalize_first(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// The prefix as it appears on generated type names: `ex` -> `Ex`.
fn type_prefix(prefix: &str) -> String {
    capitalize_first(prefix)
}

/// The prefix as it appears on generated consts: `ex` -> `EX_`.
fn const_prefix(prefix: &str) -> String {
    if prefix.is_empty() {
        String::new()
    } else {
        format!("{}_", prefix.to_uppercase())
    }
}

/// The prefix as it appears on generated functions: `ex` -> `ex_`.
fn fn_prefix(prefix: &str) -> String {
    if prefix.is_empty() {
        String::new()
    } else {
        format!("{}_", prefix.to_lowercase())
    }
}

/// Generates LR parser code for the grammar described in `src`.
///
/// `module` names the input, typically the file stem; it appears in the
/// generated header. Conflicts and unknown configuration keys land in
/// `diags`; generation continues past them.
pub fn generate(src: &str, module: &str, diags: &mut Diagnostics) -> Result<String> {
    let (params, rules) = extract(src, module, diags)?;

    if log::log_enabled!(log::Level::Debug) {
        log::debug!("loaded rule table");
        for (i, rule) in rules.iter().enumerate() {
            log::debug!("  {i}: {}", rule.show(":=", None));
        }
    }

    let grammar = Grammar::new(rules);
    let table = table::compute_actions(&grammar, diags);
    table::dump_actions(&table);

    let mut w = Writer::new();
    writeln!(
        w,
        "//! Code generated by gen lr from `{}`. Do not edit.",
        params.module
    )?;
    w.line("");
    write_parser(&mut w, &grammar, &params)?;
    write_tables(&mut w, &grammar, &table, &params)?;

    w.format()
}

/// Emits the value alias, the action and rule types, and the parser
/// shell driving the tables.
fn write_parser(w: &mut Writer, grammar: &Grammar, params: &Params) -> Result<()> {
    let tp = type_prefix(&params.prefix);
    let cp = const_prefix(&params.prefix);
    let fp = fn_prefix(&params.prefix);
    let token = &params.token_type;
    let result_type = &grammar.rules[0].typ;

    writeln!(w, "pub type {tp}Value = Box<dyn std::any::Any>;")?;
    w.line("");

    w.line("#[derive(Clone, Copy, Debug, PartialEq, Eq)]");
    writeln!(w, "pub enum {tp}Action {{")?;
    w.line("Shift(usize),");
    w.line("Reduce(usize),");
    w.line("}");
    w.line("");

    writeln!(w, "pub struct {tp}Rule {{")?;
    w.line("pub symbol: &'static str,");
    w.line("pub pattern: &'static [&'static str],");
    writeln!(w, "pub action: Option<fn(Vec<{tp}Value>) -> {tp}Value>,")?;
    w.line("}");
    w.line("");

    writeln!(w, "pub struct {tp}Parser {{")?;
    w.line("states: Vec<usize>,");
    writeln!(w, "data: Vec<{tp}Value>,")?;
    w.line("}");
    w.line("");

    writeln!(w, "impl {tp}Parser {{")?;
    writeln!(w, "pub fn new() -> {tp}Parser {{")?;
    writeln!(w, "{tp}Parser {{ states: vec![0], data: Vec::new() }}")?;
    w.line("}");
    w.line("");

    w.line("/// Runs the parser over `tokens`, which must end with the");
    w.line("/// end-of-input token (id `\"$\"`).");
    writeln!(
        w,
        "pub fn parse(&mut self, tokens: impl IntoIterator<Item = {token}>) -> Result<(), String> {{"
    )?;
    w.line("let mut tokens = tokens.into_iter();");
    w.line("let mut tok = tokens.next().ok_or(\"empty token stream\")?;");
    w.line("loop {");
    w.line("let state = *self.states.last().expect(\"state stack\");");
    writeln!(w, "match {fp}lookup(state, tok.id()) {{")?;

    writeln!(w, "Some({tp}Action::Shift(next)) => {{")?;
    if params.trace {
        w.line("log::trace!(\"state {state}: shift {next} on {}\", tok.id());");
    }
    w.line("self.states.push(next);");
    w.line("self.data.push(Box::new(tok));");
    w.line("tok = tokens.next().ok_or(\"token stream ended early\")?;");
    w.line("}");

    writeln!(w, "Some({tp}Action::Reduce(rule)) => {{")?;
    if params.trace {
        w.line("log::trace!(\"state {state}: reduce {rule}\");");
    }
    w.line("let accept = rule == 0 && tok.id() == \"$\";");
    writeln!(w, "let rule = &{cp}RULES[rule];")?;
    w.line("let n = rule.pattern.len();");
    w.line("let args = self.data.split_off(self.data.len() - n);");
    w.line("self.states.truncate(self.states.len() - n);");
    w.line("let value = match rule.action {");
    w.line("Some(action) => action(args),");
    w.line("None => args.into_iter().next().expect(\"nonempty pattern\"),");
    w.line("};");
    w.line("self.data.push(value);");
    w.line("if accept {");
    w.line("return Ok(());");
    w.line("}");
    w.line("let state = *self.states.last().expect(\"state stack\");");
    writeln!(w, "match {fp}lookup(state, rule.symbol) {{")?;
    writeln!(w, "Some({tp}Action::Shift(next)) => self.states.push(next),")?;
    w.line("_ => return Err(format!(\"state {state}: no goto on {}\", rule.symbol)),");
    w.line("}");
    w.line("}");

    w.line("None => {");
    w.line("return Err(format!(\"state {state}: unexpected token {}\", tok.id()));");
    w.line("}");
    w.line("}");
    w.line("}");
    w.line("}");
    w.line("");

    w.line("/// Returns the final result of a successful parse.");
    writeln!(w, "pub fn result(mut self) -> {result_type} {{")?;
    writeln!(
        w,
        "*self.data.remove(0).downcast::<{result_type}>().expect(\"result type\")"
    )?;
    w.line("}");
    w.line("}");
    w.line("");

    writeln!(w, "fn {fp}lookup(state: usize, sym: &str) -> Option<{tp}Action> {{")?;
    writeln!(
        w,
        "{cp}ACTIONS[state].iter().find(|(s, _)| *s == sym).map(|(_, action)| *action)"
    )?;
    w.line("}");
    w.line("");
    Ok(())
}

/// Emits the rule list with compiled semantic actions and the action
/// table, rows in state order and entries in sorted symbol order.
fn write_tables(
    w: &mut Writer,
    grammar: &Grammar,
    table: &ActionTable,
    params: &Params,
) -> Result<()> {
    let tp = type_prefix(&params.prefix);
    let cp = const_prefix(&params.prefix);
    let token = &params.token_type;

    let mut types: BTreeMap<&str, &str> = BTreeMap::new();
    for rule in &grammar.rules {
        types.insert(&rule.symbol, &rule.typ);
    }

    writeln!(w, "pub static {cp}RULES: &[{tp}Rule] = &[")?;
    for rule in &grammar.rules {
        writeln!(w, "{tp}Rule {{")?;
        writeln!(w, "symbol: {:?},", rule.symbol)?;
        let pattern: Vec<String> = rule.pattern.iter().map(|p| format!("{p:?}")).collect();
        writeln!(w, "pattern: &[{}],", pattern.join(", "))?;
        if rule.code.is_empty() {
            w.line("action: None,");
        } else {
            let param = if rule.vars.iter().any(|v| !v.is_empty()) {
                "data"
            } else {
                "_data"
            };
            writeln!(w, "action: Some(|{param}: Vec<{tp}Value>| -> {tp}Value {{")?;
            write_bindings(w, rule, &types, token)?;
            w.line("Box::new({");
            w.line(rule.code.trim());
            w.line("})");
            w.line("}),");
        }
        w.line("},");
    }
    w.line("];");
    w.line("");

    writeln!(w, "pub static {cp}ACTIONS: &[&[(&str, {tp}Action)]] = &[")?;
    for actions in table {
        w.line("&[");
        for (sym, action) in actions {
            let encoded = match action {
                Action::Shift(state) => format!("{tp}Action::Shift({state})"),
                Action::Reduce(rule) => format!("{tp}Action::Reduce({rule})"),
            };
            writeln!(w, "({sym:?}, {encoded}),")?;
        }
        w.line("],");
    }
    w.line("];");
    Ok(())
}

/// Emits the `let` bindings that unpack the value stack window into the
/// rule's named variables, consuming positions in order.
fn write_bindings(
    w: &mut Writer,
    rule: &Rule,
    types: &BTreeMap<&str, &str>,
    token: &str,
) -> Result<()> {
    let last_bound = match rule.vars.iter().rposition(|v| !v.is_empty()) {
        Some(last) => last,
        None => return Ok(()),
    };
    w.line("let mut data = data.into_iter();");
    for (j, var) in rule.vars.iter().enumerate().take(last_bound + 1) {
        if var.is_empty() {
            w.line("let _ = data.next();");
        } else {
            let typ = types
                .get(rule.pattern[j].as_str())
                .copied()
                .filter(|t| !t.is_empty())
                .unwrap_or(token);
            writeln!(
                w,
                "let {var} = *data.next().expect(\"pattern arity\").downcast::<{typ}>().expect(\"value type\");"
            )?;
        }
    }
    Ok(())
}
