//! Input documents and verdict reports
//!
//! A document holds a rule table followed by candidate lines. Any line with
//! a `:` is a rule line; every other non-blank line is a candidate.

use crate::ast::Grammar;
use crate::config::MatchConfig;
use crate::error::Error;
use crate::grammar_parser::compile_with_mode;
use crate::matcher::Matcher;
use std::fmt;
use tracing::{debug, info};

/// Rule lines and candidate lines of one input
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub rules: Vec<String>,
    pub candidates: Vec<String>,
}

impl Document {
    /// Split a combined input into rule lines and candidate lines
    pub fn parse(text: &str) -> Self {
        let mut document = Document::default();
        for line in text.lines() {
            if line.contains(':') {
                document.rules.push(line.to_string());
            } else if !line.trim().is_empty() {
                document.candidates.push(line.to_string());
            }
        }
        document
    }

    /// Rules and candidates supplied as separate texts
    ///
    /// Every line of `rules` goes to the compiler; `candidates` is filtered
    /// the same way as a combined input.
    pub fn from_parts(rules: &str, candidates: &str) -> Self {
        Document {
            rules: rules.lines().map(str::to_string).collect(),
            candidates: Document::parse(candidates).candidates,
        }
    }

    /// Compile the rule lines and apply the configured patches
    ///
    /// Patches follow the same malformed-rule policy as the table.
    pub fn compile(&self, config: &MatchConfig) -> Result<Grammar, Error> {
        let mut grammar = compile_with_mode(&self.rules, config.mode)?;
        if !config.patches.is_empty() {
            debug!(patches = config.patches.len(), "applying rule patches");
            grammar = grammar.patch_with_mode(&config.patches, config.mode)?;
        }
        Ok(grammar)
    }
}

/// Outcome for one candidate line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub line: String,
    pub matched: bool,
}

/// Verdicts for a whole document, in input order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    pub verdicts: Vec<Verdict>,
}

impl Report {
    /// Number of candidate lines that matched
    pub fn count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.matched).count()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.matched { "ok" } else { "invalid" };
        write!(f, "{}: {}", label, self.line)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for verdict in &self.verdicts {
            writeln!(f, "{}", verdict)?;
        }
        writeln!(f, "result is {}", self.count())
    }
}

/// Compile the document's rules and match every candidate line
///
/// Compilation errors stop the run before any line is matched.
pub fn run(document: &Document, config: &MatchConfig) -> Result<Report, Error> {
    let grammar = document.compile(config)?;
    evaluate(&grammar, document, config)
}

/// Match every candidate line against an already compiled grammar
pub fn evaluate(
    grammar: &Grammar,
    document: &Document,
    config: &MatchConfig,
) -> Result<Report, Error> {
    let matcher = Matcher::new(grammar, config.start_rule)?;
    let outcomes = matcher.evaluate_all(&document.candidates, config.parallel)?;

    let verdicts: Vec<Verdict> = document
        .candidates
        .iter()
        .zip(outcomes)
        .map(|(line, matched)| Verdict {
            line: line.clone(),
            matched,
        })
        .collect();

    let report = Report { verdicts };
    info!(
        candidates = report.verdicts.len(),
        matched = report.count(),
        "document evaluated"
    );
    Ok(report)
}
