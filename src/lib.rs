pub mod alphabet;
pub mod error;
pub mod graph;
pub mod lexer;
pub mod rules;
pub mod simulator;

pub use error::LexError;

use alphabet::Alphabet;
use graph::Graph;
use rules::RawRule;

/// Compiles a full rule set into a quantized alphabet and a shared NFA
/// graph, in file order. Each rule is quantized and added to the graph
/// immediately so that later rules may reference earlier ones by head name.
pub fn compile(raw_rules: &[RawRule]) -> Result<(Alphabet, Graph), LexError> {
    let mut alphabet = Alphabet::new();
    let mut graph = Graph::new();
    for raw in raw_rules {
        let quantized = rules::quantize_rule(raw, &mut alphabet);
        graph.add_rule(&quantized, &alphabet)?;
    }
    Ok((alphabet, graph))
}
