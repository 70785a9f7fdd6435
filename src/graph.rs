use std::collections::HashMap;
use std::ops::Range;

use crate::alphabet::{Alphabet, SymbolId, LEFT_PAREN, PIPE, PLUS, QUESTION, RIGHT_PAREN, STAR};
use crate::error::LexError;
use crate::rules::{QuantizedRule, RuleToken};

pub type NodeId = usize;

/// A single outgoing transition: either free (ε) or gated on a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Epsilon,
    Symbol(SymbolId),
}

/// Tags an accepting node with the rule it accepts for and that rule's
/// insertion order, used by the simulator to break ties between
/// simultaneously-accepting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Association {
    pub head: SymbolId,
    pub priority: usize,
}

/// The start/end pair of a constructed sub-automaton.
type Term = (NodeId, NodeId);

/// Where a previously-registered rule's own construction lives: the node
/// range it occupies (`lo..hi`, including any sub-automata it spliced in
/// for its own references) and its start/end within that range.
#[derive(Debug, Clone, Copy)]
struct RuleSpan {
    lo: NodeId,
    hi: NodeId,
    start: NodeId,
    end: NodeId,
}

/// A cyclic NFA built by grafting one Thompson sub-automaton per rule onto a
/// single shared start node. Every rule's nodes form a disjoint range
/// reachable only through a one-way ε-edge out of `start`, so a single
/// shared traversal frontier (see `crate::simulator`) behaves exactly like
/// one independent frontier per rule.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    adjacency: Vec<Vec<(NodeId, Edge)>>,
    start: Option<NodeId>,
    associations: HashMap<NodeId, Association>,
    rule_spans: HashMap<SymbolId, RuleSpan>,
    next_priority: usize,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }

    pub fn add_node(&mut self) -> NodeId {
        let id = self.adjacency.len();
        self.adjacency.push(Vec::new());
        id
    }

    pub fn add_edge(&mut self, from: NodeId, edge: Edge, to: NodeId) {
        self.adjacency[from].push((to, edge));
    }

    pub fn edges_from(&self, node: NodeId) -> &[(NodeId, Edge)] {
        &self.adjacency[node]
    }

    pub fn out_degree(&self, node: NodeId) -> usize {
        self.adjacency[node].len()
    }

    pub fn association(&self, node: NodeId) -> Option<&Association> {
        self.associations.get(&node)
    }

    /// The single shared start node, if at least one rule has been added.
    pub fn start(&self) -> Option<NodeId> {
        self.start
    }

    fn ensure_start(&mut self) -> NodeId {
        if let Some(s) = self.start {
            return s;
        }
        let s = self.add_node();
        self.start = Some(s);
        s
    }

    /// Extends the graph with `rule`'s sub-automaton, wires it to the
    /// shared start node, and tags its accepting node with `rule.head` and
    /// the next available priority (insertion order). A bare token longer
    /// than one character is assumed to reference an earlier rule's head
    /// (see `crate::rules::RuleToken::Reference`) and is spliced in as a
    /// fresh copy of that rule's own sub-automaton; referencing a head that
    /// has not yet been registered is an error, not a forward reference.
    pub fn add_rule(&mut self, rule: &QuantizedRule, alphabet: &Alphabet) -> Result<(), LexError> {
        let mut wrapped = Vec::with_capacity(rule.tokens.len() + 2);
        wrapped.push(RuleToken::Operator(LEFT_PAREN));
        wrapped.extend(rule.tokens.iter().copied());
        wrapped.push(RuleToken::Operator(RIGHT_PAREN));

        let lo = self.num_nodes();
        let term = self
            .build_term(&wrapped)
            .map_err(|e| attach_head(e, rule.head, alphabet))?;
        let hi = self.num_nodes();

        self.rule_spans.insert(
            rule.head,
            RuleSpan {
                lo,
                hi,
                start: term.0,
                end: term.1,
            },
        );

        let start = self.ensure_start();
        self.add_edge(start, Edge::Epsilon, term.0);

        let priority = self.next_priority;
        self.next_priority += 1;
        self.associations.insert(
            term.1,
            Association {
                head: rule.head,
                priority,
            },
        );

        Ok(())
    }

    fn build_term(&mut self, slice: &[RuleToken]) -> Result<Term, LexError> {
        if slice.is_empty() {
            return Err(malformed("empty rule body"));
        }

        if !is_left_paren(slice[0]) {
            if slice.len() != 1 {
                return Err(malformed("a bare symbol cannot be followed by more tokens"));
            }
            return self.build_leaf(slice[0]);
        }

        let close_idx = find_matching_paren(slice, 0)?;
        let inner = &slice[1..close_idx];
        let trailing = &slice[close_idx + 1..];
        if trailing.len() > 1 {
            return Err(malformed("too many tokens after a closing parenthesis"));
        }

        let child_ranges = split_children(inner)?;
        let mut children = Vec::with_capacity(child_ranges.len());
        for r in &child_ranges {
            children.push(self.build_term(&inner[r.clone()])?);
        }

        match trailing.first().copied() {
            None => Ok(self.concat(children)),
            Some(t) if is_operator_id(t, STAR) => {
                let term = self.concat(children);
                Ok(self.star(term))
            }
            Some(t) if is_operator_id(t, QUESTION) => {
                let term = self.concat(children);
                Ok(self.question(term))
            }
            Some(t) if is_operator_id(t, PLUS) => {
                let term = self.concat(children);
                Ok(self.plus(term))
            }
            Some(t) if is_operator_id(t, PIPE) => Ok(self.alternate(children)),
            _ => Err(malformed("expected *, ?, +, or | after a group")),
        }
    }

    fn build_leaf(&mut self, token: RuleToken) -> Result<Term, LexError> {
        match token {
            RuleToken::Operator(_) => Err(malformed("unexpected operator outside of a group")),
            RuleToken::Literal(id) => {
                let s = self.add_node();
                let t = self.add_node();
                self.add_edge(s, Edge::Symbol(id), t);
                Ok((s, t))
            }
            RuleToken::Reference(head) => self.splice_reference(head),
        }
    }

    fn splice_reference(&mut self, head: SymbolId) -> Result<Term, LexError> {
        let span = *self
            .rule_spans
            .get(&head)
            .ok_or_else(|| LexError::UnknownHead { reference: String::new() })?;

        let offset = self.num_nodes() - span.lo;
        for old_id in span.lo..span.hi {
            let new_id = self.add_node();
            debug_assert_eq!(new_id, old_id + offset);
            let edges = self.adjacency[old_id].clone();
            for (target, edge) in edges {
                self.adjacency[new_id].push((target + offset, edge));
            }
        }
        Ok((span.start + offset, span.end + offset))
    }

    fn concat(&mut self, terms: Vec<Term>) -> Term {
        if terms.is_empty() {
            let s = self.add_node();
            let t = self.add_node();
            self.add_edge(s, Edge::Epsilon, t);
            return (s, t);
        }
        for pair in terms.windows(2) {
            let (_, a_end) = pair[0];
            let (b_start, _) = pair[1];
            self.add_edge(a_end, Edge::Epsilon, b_start);
        }
        (terms[0].0, terms[terms.len() - 1].1)
    }

    fn star(&mut self, t: Term) -> Term {
        self.add_edge(t.0, Edge::Epsilon, t.1);
        self.add_edge(t.1, Edge::Epsilon, t.0);
        t
    }

    fn question(&mut self, t: Term) -> Term {
        self.add_edge(t.0, Edge::Epsilon, t.1);
        t
    }

    fn plus(&mut self, t: Term) -> Term {
        self.add_edge(t.1, Edge::Epsilon, t.0);
        t
    }

    fn alternate(&mut self, terms: Vec<Term>) -> Term {
        let s = self.add_node();
        let e = self.add_node();
        for (ts, te) in terms {
            self.add_edge(s, Edge::Epsilon, ts);
            self.add_edge(te, Edge::Epsilon, e);
        }
        (s, e)
    }
}

fn is_left_paren(t: RuleToken) -> bool {
    matches!(t, RuleToken::Operator(id) if id == LEFT_PAREN)
}

fn is_right_paren(t: RuleToken) -> bool {
    matches!(t, RuleToken::Operator(id) if id == RIGHT_PAREN)
}

fn is_operator_id(t: RuleToken, want: SymbolId) -> bool {
    matches!(t, RuleToken::Operator(id) if id == want)
}

fn malformed(reason: &str) -> LexError {
    LexError::MalformedRule {
        head: String::new(),
        reason: reason.to_string(),
    }
}

fn attach_head(err: LexError, head: SymbolId, alphabet: &Alphabet) -> LexError {
    let name = || alphabet.dequantize(head).unwrap_or("?").to_string();
    match err {
        LexError::MalformedRule { reason, .. } => LexError::MalformedRule { head: name(), reason },
        LexError::UnknownHead { .. } => LexError::UnknownHead { reference: name() },
        other => other,
    }
}

fn find_matching_paren(tokens: &[RuleToken], open_idx: usize) -> Result<usize, LexError> {
    let mut depth = 0i32;
    for i in open_idx..tokens.len() {
        if is_left_paren(tokens[i]) {
            depth += 1;
        } else if is_right_paren(tokens[i]) {
            depth -= 1;
            if depth == 0 {
                return Ok(i);
            }
        }
    }
    Err(malformed("unbalanced parentheses"))
}

/// Splits the inner content of a group into depth-0 children, pulling a
/// trailing unary operator or `|` into the group it immediately follows so
/// the recursive constructor only ever sees a bare symbol, a parenthesized
/// group, or a parenthesized group plus one trailing operator.
fn split_children(inner: &[RuleToken]) -> Result<Vec<Range<usize>>, LexError> {
    let mut children = Vec::new();
    let mut i = 0;
    while i < inner.len() {
        if is_left_paren(inner[i]) {
            let close = find_matching_paren(inner, i)?;
            let mut end = close + 1;
            if end < inner.len()
                && (is_operator_id(inner[end], STAR)
                    || is_operator_id(inner[end], QUESTION)
                    || is_operator_id(inner[end], PLUS)
                    || is_operator_id(inner[end], PIPE))
            {
                end += 1;
            }
            children.push(i..end);
            i = end;
        } else if matches!(inner[i], RuleToken::Operator(_)) {
            return Err(malformed("unexpected operator token at depth 0"));
        } else {
            children.push(i..i + 1);
            i += 1;
        }
    }
    Ok(children)
}
