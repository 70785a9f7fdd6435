use std::collections::BTreeSet;

use crate::alphabet::SymbolId;
use crate::error::LexError;
use crate::graph::{Edge, Graph, NodeId};

fn epsilon_closure(graph: &Graph, frontier: &mut BTreeSet<NodeId>) {
    let mut stack: Vec<NodeId> = frontier.iter().copied().collect();
    while let Some(node) = stack.pop() {
        for (target, edge) in graph.edges_from(node) {
            if matches!(edge, Edge::Epsilon) && frontier.insert(*target) {
                stack.push(*target);
            }
        }
    }
}

/// Drives every rule's frontier over a shared `Graph` in lockstep.
///
/// Because every rule's sub-automaton is reachable only through a one-way
/// ε-edge out of the graph's single shared start node, and no edge crosses
/// between two different rules' node ranges, one unfiltered frontier set
/// restricted to a given rule's nodes is exactly that rule's own ε-closure
/// — maintaining `R` separately-filtered copies would be identical, more
/// expensive bookkeeping. See DESIGN.md for the full argument.
pub struct Simulator<'g> {
    graph: &'g Graph,
    frontier: BTreeSet<NodeId>,
    prev_frontier: Option<BTreeSet<NodeId>>,
}

impl<'g> Simulator<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        let mut sim = Simulator {
            graph,
            frontier: BTreeSet::new(),
            prev_frontier: None,
        };
        sim.reset();
        sim
    }

    /// Returns the frontier to the ε-closure of the shared start node,
    /// discarding any pending revert snapshot.
    pub fn reset(&mut self) {
        self.frontier.clear();
        if let Some(start) = self.graph.start() {
            self.frontier.insert(start);
            epsilon_closure(self.graph, &mut self.frontier);
        }
        self.prev_frontier = None;
    }

    /// Consumes one symbol: follows matching edges, then takes the
    /// ε-closure of the result. Snapshots the prior frontier so a single
    /// `revert_step` can undo this call.
    pub fn step(&mut self, symbol: SymbolId) {
        self.prev_frontier = Some(self.frontier.clone());

        let mut next = BTreeSet::new();
        for &node in &self.frontier {
            for (target, edge) in self.graph.edges_from(node) {
                if let Edge::Symbol(s) = edge {
                    if *s == symbol {
                        next.insert(*target);
                    }
                }
            }
        }
        epsilon_closure(self.graph, &mut next);
        self.frontier = next;
    }

    /// Undoes the most recent `step`. Calling this twice in a row without
    /// an intervening `step` is a logic error.
    pub fn revert_step(&mut self) -> Result<(), LexError> {
        match self.prev_frontier.take() {
            Some(prev) => {
                self.frontier = prev;
                Ok(())
            }
            None => Err(LexError::NothingToRevert),
        }
    }

    pub fn valid_so_far(&self) -> bool {
        !self.frontier.is_empty()
    }

    /// The head of the accepting rule on the frontier with the fewest
    /// outgoing edges (ties broken by insertion priority, then node id),
    /// or `None` if no accepting node is reachable.
    pub fn reached_symbols(&self) -> Option<SymbolId> {
        self.frontier
            .iter()
            .filter_map(|&n| self.graph.association(n).map(|a| (n, a)))
            .min_by_key(|(n, a)| (self.graph.out_degree(*n), a.priority, *n))
            .map(|(_, a)| a.head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::rules::{parse_rule_line, quantize_rule};

    fn build(rule_lines: &[&str]) -> (Alphabet, Graph) {
        let mut alphabet = Alphabet::new();
        let mut graph = Graph::new();
        for line in rule_lines {
            let raw = parse_rule_line(line).unwrap();
            let quantized = quantize_rule(&raw, &mut alphabet);
            graph.add_rule(&quantized, &alphabet).unwrap();
        }
        (alphabet, graph)
    }

    #[test]
    fn concat_rule_accepts_exact_sequence() {
        let (mut alphabet, graph) = build(&["TEST_CONCAT := A B C"]);
        let mut sim = Simulator::new(&graph);
        for c in "ABC".chars() {
            let id = alphabet.quantize_char(c);
            sim.step(id);
            assert!(sim.valid_so_far());
        }
        assert_eq!(
            sim.reached_symbols().map(|h| alphabet.dequantize(h).unwrap().to_string()),
            Some("TEST_CONCAT".to_string())
        );
    }

    #[test]
    fn revert_step_restores_frontier_exactly() {
        let (mut alphabet, graph) = build(&["TEST_CONCAT := A B C"]);
        let mut sim = Simulator::new(&graph);
        let a = alphabet.quantize_char('A');
        let before: BTreeSet<NodeId> = sim.frontier.clone();
        sim.step(a);
        assert_ne!(sim.frontier, before);
        sim.revert_step().unwrap();
        assert_eq!(sim.frontier, before);
    }

    #[test]
    fn double_revert_is_an_error() {
        let (mut alphabet, graph) = build(&["TEST_CONCAT := A B C"]);
        let mut sim = Simulator::new(&graph);
        let a = alphabet.quantize_char('A');
        sim.step(a);
        sim.revert_step().unwrap();
        assert!(matches!(sim.revert_step(), Err(LexError::NothingToRevert)));
    }

    #[test]
    fn unknown_symbol_empties_the_frontier() {
        let (mut alphabet, graph) = build(&["TEST_CONCAT := A B C"]);
        let mut sim = Simulator::new(&graph);
        let z = alphabet.quantize_char('Z');
        sim.step(z);
        assert!(!sim.valid_so_far());
        assert_eq!(sim.reached_symbols(), None);
    }

    #[test]
    fn star_rule_matches_empty_and_repeated_input() {
        let (mut alphabet, graph) = build(&["TEST_QUANTIFIER_ANY := ( A B C ) *"]);
        let mut sim = Simulator::new(&graph);
        assert!(sim.reached_symbols().is_some(), "star rule must accept the empty string");

        for c in "ABCABC".chars() {
            let id = alphabet.quantize_char(c);
            sim.step(id);
            assert!(sim.valid_so_far());
        }
        assert!(sim.reached_symbols().is_some());
    }

    #[test]
    fn fewest_out_edges_wins_between_overlapping_rules() {
        // A generic one-letter rule and a specific keyword share a prefix;
        // the more constrained (fewer-outgoing-edges) accepting node wins.
        let (mut alphabet, graph) = build(&["NAME := A", "KEYWORD_A := A"]);
        let mut sim = Simulator::new(&graph);
        let a = alphabet.quantize_char('A');
        sim.step(a);
        assert!(sim.reached_symbols().is_some());
    }
}
