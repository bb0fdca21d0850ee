//! Handwritten recursive descent parser for rule tables
//!
//! Each non-blank line of the form `<id>: <body>` defines one rule. The body
//! is either a single quoted character or alternatives of rule ids separated
//! by `|`. Lines without a leading `<id>:` are skipped.

use crate::ast::{Grammar, Production, RuleId, Sequence};
use crate::error::CompileError;
use crate::lexer::{Lexer, Token};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How the compiler treats lines it cannot read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileMode {
    /// Fail on the first malformed rule
    #[default]
    Strict,
    /// Skip malformed rules and keep going
    Lenient,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<Token> {
        if self.pos < self.tokens.len() {
            let token = self.tokens[self.pos].clone();
            self.pos += 1;
            Some(token)
        } else {
            None
        }
    }

    fn matches(&self, expected: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    fn expect_eof(&mut self) -> Result<(), String> {
        match self.consume() {
            Some(Token::Eof) | None => Ok(()),
            Some(other) => Err(format!("Unexpected {} after rule body", describe(&other))),
        }
    }

    // Body: Terminal | Alternatives
    pub fn parse_body(&mut self) -> Result<Production, String> {
        let has_literal = self
            .tokens
            .iter()
            .any(|t| matches!(t, Token::Literal(_)));

        if has_literal {
            self.parse_terminal()
        } else {
            self.parse_alternatives()
        }
    }

    // Terminal: Literal Eof, where the literal holds exactly one character
    fn parse_terminal(&mut self) -> Result<Production, String> {
        let literal = match self.consume() {
            Some(Token::Literal(s)) => s,
            Some(other) => {
                return Err(format!(
                    "Terminal rule must be a single quoted character, found {}",
                    describe(&other)
                ))
            }
            None => return Err("Expected quoted character".to_string()),
        };

        let mut chars = literal.chars();
        let ch = match (chars.next(), chars.next()) {
            (Some(ch), None) => ch,
            (None, _) => return Err("Empty terminal literal".to_string()),
            (Some(_), Some(_)) => {
                return Err(format!(
                    "Terminal literal must be one character, got {:?}",
                    literal
                ))
            }
        };

        self.expect_eof()?;
        Ok(Production::terminal(ch))
    }

    // Alternatives: Sequence ("|" Sequence)* Eof
    fn parse_alternatives(&mut self) -> Result<Production, String> {
        let mut alts = vec![self.parse_sequence()?];

        while self.matches(&Token::Pipe) {
            self.consume();
            alts.push(self.parse_sequence()?);
        }

        self.expect_eof()?;
        Ok(Production::alternatives(alts))
    }

    // Sequence: Number+
    fn parse_sequence(&mut self) -> Result<Sequence, String> {
        let mut rules = Vec::new();

        loop {
            match self.peek() {
                Some(Token::Number(id)) => {
                    rules.push(*id);
                    self.consume();
                }
                Some(Token::Pipe) | Some(Token::Eof) | None => break,
                Some(other) => return Err(format!("Expected rule id, found {}", describe(other))),
            }
        }

        if rules.is_empty() {
            return Err("Alternative has no rule ids".to_string());
        }

        Ok(Sequence::new(rules))
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("rule id {}", n),
        Token::Literal(s) => format!("literal {:?}", s),
        Token::Word(w) => format!("'{}'", w),
        Token::Colon => "':'".to_string(),
        Token::Pipe => "'|'".to_string(),
        Token::Eof => "end of line".to_string(),
    }
}

/// Split `<id>: <body>` into its id and body, or `None` for a non-rule line
fn split_rule_head(line: &str) -> Option<(RuleId, &str)> {
    let (head, body) = line.split_once(':')?;
    let head = head.trim();
    if head.is_empty() || !head.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    head.parse::<RuleId>().ok().map(|id| (id, body))
}

/// Parse one rule line
///
/// Returns `Ok(None)` for blank lines and lines that are not rules.
pub fn parse_rule_line(line: &str) -> Result<Option<(RuleId, Production)>, String> {
    let Some((id, body)) = split_rule_head(line) else {
        return Ok(None);
    };

    let tokens = Lexer::new(body).tokenize()?;
    let production = Parser::new(tokens).parse_body()?;
    Ok(Some((id, production)))
}

/// Compile rule lines into a closed grammar, failing on malformed rules
pub fn compile<I, S>(lines: I) -> Result<Grammar, CompileError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    compile_with_mode(lines, CompileMode::Strict)
}

/// Compile rule lines with an explicit malformed-rule policy
pub fn compile_with_mode<I, S>(lines: I, mode: CompileMode) -> Result<Grammar, CompileError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut grammar = Grammar::new();
    define_rules(&mut grammar, lines, mode)?;
    check_closed(&grammar)?;
    debug!(rules = grammar.rule_count(), "compiled rule table");
    Ok(grammar)
}

/// Compile a whole rule table held in one string
pub fn compile_str(text: &str) -> Result<Grammar, CompileError> {
    compile(text.lines())
}

fn define_rules<I, S>(
    grammar: &mut Grammar,
    lines: I,
    mode: CompileMode,
) -> Result<(), CompileError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for (index, line) in lines.into_iter().enumerate() {
        let line_no = index + 1;
        match parse_rule_line(line.as_ref()) {
            Ok(Some((id, production))) => {
                if grammar.insert(id, production).is_some() {
                    debug!(
                        rule = id,
                        line = line_no,
                        "rule redefined, keeping the later definition"
                    );
                }
            }
            Ok(None) => {}
            Err(message) => match mode {
                CompileMode::Strict => return Err(CompileError::malformed(line_no, message)),
                CompileMode::Lenient => {
                    warn!(line = line_no, %message, "skipping malformed rule");
                }
            },
        }
    }
    Ok(())
}

fn check_closed(grammar: &Grammar) -> Result<(), CompileError> {
    match grammar.first_unresolved() {
        Some((referenced_by, rule)) => Err(CompileError::UnresolvedReference {
            rule,
            referenced_by,
        }),
        None => Ok(()),
    }
}

impl Grammar {
    /// Apply extra rule lines on top of this grammar
    ///
    /// Later definitions replace earlier ones, so `8: 42 | 42 8` turns a
    /// fixed rule into a looping one. The result must still be closed.
    pub fn patch<I, S>(&self, lines: I) -> Result<Grammar, CompileError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.patch_with_mode(lines, CompileMode::Strict)
    }

    /// Apply extra rule lines with an explicit malformed-rule policy
    pub fn patch_with_mode<I, S>(
        &self,
        lines: I,
        mode: CompileMode,
    ) -> Result<Grammar, CompileError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patched = self.clone();
        define_rules(&mut patched, lines, mode)?;
        check_closed(&patched)?;
        Ok(patched)
    }
}
