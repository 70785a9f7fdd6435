use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use munch::lexer;
use munch::rules;

/// Tokenizes an input file against a rule file using a Thompson-constructed
/// NFA, writing one `HEAD: value` line per emitted token.
#[derive(Parser, Debug)]
#[command(name = "munch", version, about)]
struct Args {
    /// Path to the rule file (`HEAD := tok tok tok` per line).
    rules: PathBuf,

    /// Path to the input file to tokenize.
    input: PathBuf,

    /// Path to write the token stream to.
    output: PathBuf,

    /// Raise the log level; repeatable (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Keep Whitespace/Unknown tokens in the output instead of dropping them.
    #[arg(long)]
    keep_unknown: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let raw_rules = rules::load_rules(&args.rules)
        .with_context(|| format!("failed to read rule file {:?}", args.rules))?;
    info!("loaded {} rule(s) from {:?}", raw_rules.len(), args.rules);

    let (mut alphabet, graph) = munch::compile(&raw_rules)
        .with_context(|| format!("failed to compile rules from {:?}", args.rules))?;

    let input_text = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read input file {:?}", args.input))?;

    let tokens = lexer::tokenize(input_text.chars(), &mut alphabet, &graph);
    let tokens = lexer::filter_tokens(tokens, args.keep_unknown);
    info!("emitted {} token(s)", tokens.len());

    let mut output = String::new();
    for token in &tokens {
        output.push_str(&token.head);
        output.push_str(": ");
        output.push_str(&token.value);
        output.push('\n');
    }

    fs::write(&args.output, output)
        .with_context(|| format!("failed to write output file {:?}", args.output))?;

    Ok(())
}
