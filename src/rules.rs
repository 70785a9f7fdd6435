use std::path::Path;

use crate::alphabet::{Alphabet, SymbolId};

/// A rule as read from a rule file, before quantization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRule {
    pub head: String,
    pub tokens: Vec<String>,
}

/// A rule-body token, classified by how the constructor must treat it.
///
/// The classification is made from the *original string* before
/// quantization collapses everything to integers: a structural operator
/// keeps its reserved id, a single character (or an escape form of one) is
/// a literal to match against input, and anything else is assumed to name
/// another rule's head and gets spliced in as a sub-automaton rather than
/// matched against input directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleToken {
    Operator(SymbolId),
    Literal(SymbolId),
    Reference(SymbolId),
}

/// A rule after every token has been resolved to a symbol id and classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedRule {
    pub head: SymbolId,
    pub tokens: Vec<RuleToken>,
}

/// Parses a single `HEAD := tok tok tok` line. Returns `None` for blank
/// lines or lines that don't split into exactly one nonempty head and one
/// nonempty body around `:=`; such lines are silently skipped by
/// `load_rules`, matching the rule-file format's tolerance for comments or
/// stray text.
pub fn parse_rule_line(line: &str) -> Option<RawRule> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let mut parts = line.splitn(2, ":=");
    let head = parts.next()?.trim();
    let body = parts.next()?.trim();
    if head.is_empty() || body.is_empty() {
        return None;
    }

    let tokens: Vec<String> = body
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect();
    if tokens.is_empty() {
        return None;
    }

    Some(RawRule {
        head: head.to_string(),
        tokens,
    })
}

/// Parses every line of `text` into `RawRule`s, preserving order and
/// skipping malformed lines.
pub fn parse_rules(text: &str) -> Vec<RawRule> {
    text.lines().filter_map(parse_rule_line).collect()
}

/// Reads and parses a rule file. The only I/O performed inside the core: a
/// single `read_to_string` with no retry, streaming, or logging concerns of
/// its own, kept here purely as a convenience so callers don't have to
/// thread a `String` through by hand.
pub fn load_rules(path: &Path) -> std::io::Result<Vec<RawRule>> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_rules(&text))
}

fn classify(token: &str, alphabet: &mut Alphabet) -> RuleToken {
    if Alphabet::is_operator_str(token) {
        RuleToken::Operator(alphabet.quantize(token))
    } else if Alphabet::is_escape_form(token) {
        RuleToken::Literal(alphabet.quantize(token))
    } else if token.chars().count() == 1 {
        RuleToken::Literal(alphabet.quantize(token))
    } else {
        RuleToken::Reference(alphabet.quantize(token))
    }
}

/// Resolves every token of `raw` against `alphabet`, interning new symbols
/// as needed and classifying each one as an operator, a literal, or a
/// reference to another rule's head.
pub fn quantize_rule(raw: &RawRule, alphabet: &mut Alphabet) -> QuantizedRule {
    let head = alphabet.quantize(&raw.head);
    let tokens = raw.tokens.iter().map(|t| classify(t, alphabet)).collect();
    QuantizedRule { head, tokens }
}
