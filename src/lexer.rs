use log::{debug, trace};

use crate::alphabet::Alphabet;
use crate::graph::Graph;
use crate::simulator::Simulator;

/// Display name used for a token whose raw text matched no rule at all.
pub const UNKNOWN_HEAD: &str = "Unknown";

/// One emitted token: a rule head name (or [`UNKNOWN_HEAD`]) and the raw
/// text that was consumed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub head: String,
    pub value: String,
}

/// Runs the maximal-munch tokenizer over `chars` against `graph`, quantizing
/// each character through `alphabet` as it goes. Performs no I/O: `chars`
/// can come from a file, a string, or anything else that yields `char`s.
///
/// On each character: step the simulator, and if the frontier goes empty,
/// undo that one step, emit the longest match found so far (or an `Unknown`
/// token for the single rejected character / unmatched buffer), reset, and
/// retry the rejected character against a fresh frontier. At end-of-input the
/// buffered remainder is flushed the same way, but only if it's nonempty: a
/// zero-length match is never emitted, matching how a reset frontier's
/// ε-closure can already contain a star/optional rule's accepting node
/// without a single character having been consumed.
pub fn tokenize<I: Iterator<Item = char>>(
    chars: I,
    alphabet: &mut Alphabet,
    graph: &Graph,
) -> Vec<Token> {
    let mut sim = Simulator::new(graph);
    let mut tokens = Vec::new();
    let mut buffer = String::new();

    for c in chars {
        let symbol = alphabet.quantize_char(c);
        sim.step(symbol);
        buffer.push(c);

        if !sim.valid_so_far() {
            sim.revert_step()
                .expect("a step always precedes this revert");
            buffer.pop();

            if let Some(head) = sim.reached_symbols() {
                let value = std::mem::take(&mut buffer);
                trace!(target: "munch::lexer", "matched {head} := {value:?}", head = head, value = value);
                tokens.push(Token {
                    head: alphabet.dequantize(head).unwrap_or("?").to_string(),
                    value,
                });
            } else if buffer.is_empty() {
                debug!(target: "munch::lexer", "no rule starts with {c:?}, emitting Unknown");
                tokens.push(Token {
                    head: UNKNOWN_HEAD.to_string(),
                    value: c.to_string(),
                });
            } else {
                let value = std::mem::take(&mut buffer);
                debug!(target: "munch::lexer", "buffered prefix {value:?} matched no rule, emitting Unknown");
                tokens.push(Token {
                    head: UNKNOWN_HEAD.to_string(),
                    value,
                });
            }

            sim.reset();
            buffer.clear();
            sim.step(symbol);
            buffer.push(c);
        }
    }

    if !buffer.is_empty() {
        if let Some(head) = sim.reached_symbols() {
            tokens.push(Token {
                head: alphabet.dequantize(head).unwrap_or("?").to_string(),
                value: buffer,
            });
        } else {
            tokens.push(Token {
                head: UNKNOWN_HEAD.to_string(),
                value: buffer,
            });
        }
    }

    tokens
}

fn is_filtered_head(head: &str) -> bool {
    head.eq_ignore_ascii_case("whitespace") || head.eq_ignore_ascii_case(UNKNOWN_HEAD)
}

/// Drops whitespace/unknown tokens unless `keep_unknown` is set. This is a
/// policy decision, not something the simulator or `tokenize` know about:
/// the core has no notion of "whitespace" at all, only rule heads.
pub fn filter_tokens(tokens: Vec<Token>, keep_unknown: bool) -> Vec<Token> {
    if keep_unknown {
        return tokens;
    }
    tokens
        .into_iter()
        .filter(|t| !is_filtered_head(&t.head))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn concat_scenario() {
        let (mut alphabet, graph) = build(&["TEST_CONCAT := A B C"]);
        let tokens = tokenize("ABC".chars(), &mut alphabet, &graph);
        assert_eq!(
            tokens,
            vec![Token {
                head: "TEST_CONCAT".to_string(),
                value: "ABC".to_string()
            }]
        );

        let tokens = tokenize("A".chars(), &mut alphabet, &graph);
        assert_eq!(
            tokens,
            vec![Token {
                head: UNKNOWN_HEAD.to_string(),
                value: "A".to_string()
            }]
        );

        let tokens = tokenize("ABCA".chars(), &mut alphabet, &graph);
        assert_eq!(
            tokens,
            vec![
                Token { head: "TEST_CONCAT".to_string(), value: "ABC".to_string() },
                Token { head: UNKNOWN_HEAD.to_string(), value: "A".to_string() },
            ]
        );
    }

    #[test]
    fn star_scenario_matches_and_empty_input_yields_nothing() {
        let (mut alphabet, graph) = build(&["TEST_QUANTIFIER_ANY := ( A B C ) *"]);
        let tokens = tokenize("ABCABC".chars(), &mut alphabet, &graph);
        assert_eq!(
            tokens,
            vec![Token {
                head: "TEST_QUANTIFIER_ANY".to_string(),
                value: "ABCABC".to_string()
            }]
        );

        let tokens = tokenize("".chars(), &mut alphabet, &graph);
        assert!(tokens.is_empty());
    }

    #[test]
    fn optional_scenario_splits_into_two_tokens() {
        let (mut alphabet, graph) = build(&["TEST_QUANTIFIER_OPTIONAL := ( A B C ) ?"]);
        let tokens = tokenize("ABCABC".chars(), &mut alphabet, &graph);
        assert_eq!(tokens.len(), 2);
        for t in &tokens {
            assert_eq!(t.head, "TEST_QUANTIFIER_OPTIONAL");
            assert_eq!(t.value, "ABC");
        }
    }

    #[test]
    fn at_least_one_scenario() {
        let (mut alphabet, graph) = build(&["TEST_QUANTIFIER_AT_LEAST_ONE := ( A B C ) +"]);
        let tokens = tokenize("ABC".chars(), &mut alphabet, &graph);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].head, "TEST_QUANTIFIER_AT_LEAST_ONE");

        let tokens = tokenize("".chars(), &mut alphabet, &graph);
        assert!(tokens.is_empty());
    }

    #[test]
    fn comparison_or_scenario() {
        let (mut alphabet, graph) = build(&["TEST_COMPARISON_OR := ( A B C ) |"]);
        let tokens = tokenize("A".chars(), &mut alphabet, &graph);
        assert_eq!(tokens, vec![Token { head: "TEST_COMPARISON_OR".to_string(), value: "A".to_string() }]);

        let tokens = tokenize("BC".chars(), &mut alphabet, &graph);
        assert_eq!(
            tokens,
            vec![
                Token { head: "TEST_COMPARISON_OR".to_string(), value: "B".to_string() },
                Token { head: "TEST_COMPARISON_OR".to_string(), value: "C".to_string() },
            ]
        );
    }

    #[test]
    fn symbol_reference_composite_scenario() {
        let (mut alphabet, graph) = build(&[
            "TEST_CONCAT := A B C",
            "TEST_SYMBOL_REFERENCE := ( TEST_CONCAT ) + D",
        ]);

        let tokens = tokenize("ABCABCD".chars(), &mut alphabet, &graph);
        assert_eq!(
            tokens,
            vec![Token {
                head: "TEST_SYMBOL_REFERENCE".to_string(),
                value: "ABCABCD".to_string()
            }]
        );

        let tokens = tokenize("ABCAD".chars(), &mut alphabet, &graph);
        assert_eq!(
            tokens,
            vec![
                Token { head: "TEST_CONCAT".to_string(), value: "ABC".to_string() },
                Token { head: UNKNOWN_HEAD.to_string(), value: "A".to_string() },
                Token { head: UNKNOWN_HEAD.to_string(), value: "D".to_string() },
            ]
        );
    }

    #[test]
    fn filter_drops_whitespace_and_unknown_unless_kept() {
        let tokens = vec![
            Token { head: "WHITESPACE".to_string(), value: " ".to_string() },
            Token { head: "NAME".to_string(), value: "x".to_string() },
            Token { head: UNKNOWN_HEAD.to_string(), value: "!".to_string() },
        ];

        let kept = filter_tokens(tokens.clone(), false);
        assert_eq!(kept, vec![Token { head: "NAME".to_string(), value: "x".to_string() }]);

        let all = filter_tokens(tokens, true);
        assert_eq!(all.len(), 3);
    }
}
