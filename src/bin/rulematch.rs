//! rulematch CLI tool - check candidate lines against a numbered rule table
//!
//! Usage: rulematch [OPTIONS] <INPUT>
//!
//! INPUT holds the rule table followed by the candidate lines, unless the
//! rules come from `--rules`. Verdicts go to standard output, diagnostics
//! and logs to standard error.

use clap::Parser;
use rulematch::{evaluate, CompileMode, Document, Error, GrammarAnalysis, MatchConfig};
use std::fs;
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rulematch", version, about = "Check lines against a numbered rule-table grammar")]
struct Cli {
    /// Input (file name, or literal text preceded by '!')
    input: String,

    /// Rule table (file name, or literal text preceded by '!'); INPUT then holds only candidates
    #[arg(long, short = 'r')]
    rules: Option<String>,

    /// Start rule id
    #[arg(long, short = 's')]
    start: Option<u32>,

    /// Extra rule line applied after the table, e.g. "8: 42 | 42 8" (repeatable)
    #[arg(long = "patch", short = 'p')]
    patches: Vec<String>,

    /// Skip malformed rules instead of failing
    #[arg(long)]
    lenient: bool,

    /// Evaluate candidate lines in parallel
    #[arg(long)]
    parallel: bool,

    /// JSON file with default settings; flags override it
    #[arg(long, short = 'c')]
    config: Option<String>,

    /// Print a grammar analysis report to standard error
    #[arg(long)]
    analyze: bool,

    /// Print the compiled rule table to standard error
    #[arg(long)]
    dump: bool,

    /// Print timing information
    #[arg(long)]
    timing: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "RULEMATCH_LOG", default_value = "warn")]
    log_level: String,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Err(e) = execute(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Ignored if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn execute(cli: &Cli) -> Result<(), Error> {
    let config = build_config(cli)?;

    let input_text = read_arg(&cli.input)?;
    let document = match &cli.rules {
        Some(rules) => Document::from_parts(&read_arg(rules)?, &input_text),
        None => Document::parse(&input_text),
    };

    let grammar = document.compile(&config)?;
    if cli.dump {
        eprint!("{}", grammar);
    }
    if cli.analyze {
        eprint!("{}", GrammarAnalysis::analyze(&grammar, config.start_rule).report());
    }

    let start = Instant::now();
    let report = evaluate(&grammar, &document, &config)?;

    print!("{}", report);

    if cli.timing {
        eprintln!(
            "Matched {} lines in {:?}",
            report.verdicts.len(),
            start.elapsed()
        );
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<MatchConfig, Error> {
    let mut config = match &cli.config {
        Some(path) => MatchConfig::from_file(path)?,
        None => MatchConfig::default(),
    };

    if let Some(start) = cli.start {
        config.start_rule = start;
    }
    if cli.lenient {
        config.mode = CompileMode::Lenient;
    }
    if cli.parallel {
        config.parallel = true;
    }
    config.patches.extend(cli.patches.iter().cloned());

    Ok(config)
}

fn read_arg(arg: &str) -> Result<String, Error> {
    match arg.strip_prefix('!') {
        // Literal; "\n" stands for a line break so tables fit on one command line
        Some(literal) => Ok(literal.replace("\\n", "\n")),
        None => fs::read_to_string(arg).map_err(|e| Error::from_io(arg, e)),
    }
}
