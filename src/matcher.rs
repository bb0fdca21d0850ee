//! Membership matcher
//!
//! Decides whether a whole line derives from a start rule. For each
//! `(rule, offset)` the matcher computes the set of prefix lengths the rule
//! can consume, memoized per line. Sequences combine the length sets of
//! their parts, alternatives take the union, so ambiguous grammars never
//! backtrack and the same sub-match is computed once.
//!
//! Left recursion re-enters a rule at the same offset without consuming
//! input. The re-entered call reads the rule's current lengths as a seed,
//! and the line is evaluated again until no length set grows. Because the
//! sets only grow, this ends at the smallest consistent table, which is
//! exactly what the grammar derives.

use crate::ast::{Grammar, Production, RuleId, Sequence};
use crate::error::MatchError;
use crate::input_stream::InputStream;
use crate::parse_context::{LengthSet, MatchContext};
use rayon::prelude::*;
use tracing::trace;

/// Matches lines against one start rule of a compiled grammar
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'g> {
    grammar: &'g Grammar,
    start: RuleId,
}

impl<'g> Matcher<'g> {
    /// Create a matcher rooted at `start`
    pub fn new(grammar: &'g Grammar, start: RuleId) -> Result<Self, MatchError> {
        if !grammar.contains(start) {
            return Err(MatchError::UnknownStartRule { rule: start });
        }
        Ok(Matcher { grammar, start })
    }

    pub fn start_rule(&self) -> RuleId {
        self.start
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// True if the start rule derives the entire line
    pub fn is_match(&self, line: &str) -> Result<bool, MatchError> {
        let input = InputStream::new(line);
        let lengths = self.solve(self.start, &input, 0)?;
        Ok(lengths.contains(&input.len()))
    }

    /// All prefix lengths of `line[offset..]` the start rule can consume
    pub fn match_lengths(&self, line: &str, offset: usize) -> Result<LengthSet, MatchError> {
        self.match_lengths_of(self.start, line, offset)
    }

    /// All prefix lengths of `line[offset..]` that `rule` can consume
    pub fn match_lengths_of(
        &self,
        rule: RuleId,
        line: &str,
        offset: usize,
    ) -> Result<LengthSet, MatchError> {
        let input = InputStream::new(line);
        if offset > input.len() {
            return Ok(LengthSet::new());
        }
        self.solve(rule, &input, offset)
    }

    /// Evaluate every line, keeping input order
    ///
    /// With `parallel` set the lines are spread over the rayon pool. The
    /// first integrity error aborts the whole evaluation.
    pub fn evaluate_all<S>(&self, lines: &[S], parallel: bool) -> Result<Vec<bool>, MatchError>
    where
        S: AsRef<str> + Sync,
    {
        if parallel {
            lines
                .par_iter()
                .map(|line| self.is_match(line.as_ref()))
                .collect()
        } else {
            lines.iter().map(|line| self.is_match(line.as_ref())).collect()
        }
    }

    /// Number of lines that match
    pub fn count_matches<S>(&self, lines: &[S], parallel: bool) -> Result<usize, MatchError>
    where
        S: AsRef<str> + Sync,
    {
        let verdicts = self.evaluate_all(lines, parallel)?;
        Ok(verdicts.into_iter().filter(|&matched| matched).count())
    }

    /// Run passes until no seed read during a pass has grown
    fn solve(
        &self,
        rule: RuleId,
        input: &InputStream,
        offset: usize,
    ) -> Result<LengthSet, MatchError> {
        let mut ctx = MatchContext::new();
        loop {
            ctx.begin_pass();
            let lengths = self.evaluate(rule, input, offset, &mut ctx)?;
            if !ctx.needs_another_pass() {
                trace!(
                    rule,
                    offset,
                    passes = ctx.passes,
                    entries = ctx.memo_cache.len(),
                    peak_depth = ctx.peak_depth,
                    "length sets settled"
                );
                return Ok(lengths);
            }
        }
    }

    /// One pass over `rule` at `offset`
    ///
    /// Open rules live on an explicit stack of frames, so line length never
    /// turns into call-stack depth.
    fn evaluate(
        &self,
        rule: RuleId,
        input: &InputStream,
        offset: usize,
        ctx: &mut MatchContext,
    ) -> Result<LengthSet, MatchError> {
        let mut stack: Vec<Frame<'g>> = Vec::new();
        let mut found = match self.call(rule, input, offset, ctx)? {
            Call::Ready(lengths) => return Ok(lengths),
            Call::Enter(frame) => {
                stack.push(frame);
                None
            }
        };

        while let Some(frame) = stack.last_mut() {
            match frame.resume(found.take()) {
                Demand::Call { rule, offset } => match self.call(rule, input, offset, ctx)? {
                    Call::Ready(lengths) => found = Some(lengths),
                    Call::Enter(child) => stack.push(child),
                },
                Demand::Finished {
                    rule,
                    offset,
                    lengths,
                } => {
                    stack.pop();
                    found = Some(ctx.exit_rule(rule, offset, lengths));
                }
            }
        }

        Ok(found.unwrap_or_default())
    }

    /// Resolve `rule` at `offset` directly, or open a frame for it
    fn call(
        &self,
        rule: RuleId,
        input: &InputStream,
        offset: usize,
        ctx: &mut MatchContext,
    ) -> Result<Call<'g>, MatchError> {
        if let Some(known) = ctx.lookup(rule, offset) {
            return Ok(Call::Ready(known));
        }

        let grammar: &'g Grammar = self.grammar;
        let production = grammar
            .get(rule)
            .ok_or(MatchError::GrammarIntegrity { rule })?;

        match production {
            Production::Terminal(expected) => {
                Ok(Call::Ready(terminal_lengths(*expected, input, offset)))
            }
            Production::Alternatives(alts) => {
                if ctx.enter_rule(rule, offset) {
                    Ok(Call::Enter(Frame::new(rule, offset, alts)))
                } else {
                    Ok(Call::Ready(ctx.seed(rule, offset)))
                }
            }
        }
    }
}

enum Call<'g> {
    Ready(LengthSet),
    Enter(Frame<'g>),
}

enum Demand {
    /// Lengths of `rule` at `offset` are needed to go on
    Call { rule: RuleId, offset: usize },
    /// Every alternative is done
    Finished {
        rule: RuleId,
        offset: usize,
        lengths: LengthSet,
    },
}

/// An open rule: which alternative and which item it is working on
///
/// Sequences combine the length sets of their parts, alternatives take the
/// union.
struct Frame<'g> {
    rule: RuleId,
    offset: usize,
    alts: &'g [Sequence],
    alt: usize,
    item: usize,
    // Lengths consumed by the items matched so far, ascending
    consumed: Vec<usize>,
    // Index into `consumed` of the pending call
    pending: usize,
    // Lengths consumed once the current item is matched too
    next: LengthSet,
    // Union over the finished alternatives
    lengths: LengthSet,
}

impl<'g> Frame<'g> {
    fn new(rule: RuleId, offset: usize, alts: &'g [Sequence]) -> Self {
        Frame {
            rule,
            offset,
            alts,
            alt: 0,
            item: 0,
            consumed: vec![0],
            pending: 0,
            next: LengthSet::new(),
            lengths: LengthSet::new(),
        }
    }

    /// Take the result of the pending call, if any, and say what comes next
    fn resume(&mut self, found: Option<LengthSet>) -> Demand {
        if let Some(found) = found {
            let done = self.consumed[self.pending];
            self.next.extend(found.into_iter().map(|len| done + len));
            self.pending += 1;
        }

        let alts = self.alts;
        loop {
            let Some(seq) = alts.get(self.alt) else {
                return Demand::Finished {
                    rule: self.rule,
                    offset: self.offset,
                    lengths: std::mem::take(&mut self.lengths),
                };
            };

            if self.item == seq.rules.len() {
                self.lengths.extend(self.consumed.drain(..));
                self.next_alternative();
                continue;
            }

            if let Some(&done) = self.consumed.get(self.pending) {
                return Demand::Call {
                    rule: seq.rules[self.item],
                    offset: self.offset + done,
                };
            }

            if self.next.is_empty() {
                // The sequence cannot get past this item
                self.next_alternative();
                continue;
            }

            self.consumed = std::mem::take(&mut self.next).into_iter().collect();
            self.pending = 0;
            self.item += 1;
        }
    }

    fn next_alternative(&mut self) {
        self.alt += 1;
        self.item = 0;
        self.consumed = vec![0];
        self.pending = 0;
        self.next.clear();
    }
}

fn terminal_lengths(expected: char, input: &InputStream, offset: usize) -> LengthSet {
    match input.char_at(offset) {
        Some(ch) if ch == expected => LengthSet::from([1]),
        _ => LengthSet::new(),
    }
}

/// True if `line` in its entirety derives from `start`
pub fn matches(grammar: &Grammar, start: RuleId, line: &str) -> Result<bool, MatchError> {
    Matcher::new(grammar, start)?.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Production, Sequence};
    use crate::grammar_parser::{compile, compile_str};
    use rstest::rstest;

    fn set(items: &[usize]) -> LengthSet {
        items.iter().copied().collect()
    }

    const SAMPLE: &str = r#"0: 4 1 5
1: 2 3 | 3 2
2: 4 4 | 5 5
3: 4 5 | 5 4
4: "a"
5: "b""#;

    #[test]
    fn test_single_terminal() {
        let grammar = compile(["7: 'a'"]).unwrap();
        assert!(matches(&grammar, 7, "a").unwrap());
        assert!(!matches(&grammar, 7, "").unwrap());
        assert!(!matches(&grammar, 7, "aa").unwrap());
        assert!(!matches(&grammar, 7, "b").unwrap());
    }

    #[test]
    fn test_sequence() {
        let grammar = compile(["0: 1 2", "1: 'a'", "2: 'b'"]).unwrap();
        assert!(matches(&grammar, 0, "ab").unwrap());
        assert!(!matches(&grammar, 0, "ba").unwrap());
        assert!(!matches(&grammar, 0, "a").unwrap());
        assert!(!matches(&grammar, 0, "abb").unwrap());
    }

    #[test]
    fn test_alternatives() {
        let grammar = compile(["0: 1 | 2", "1: 'a'", "2: 'b'"]).unwrap();
        assert!(matches(&grammar, 0, "a").unwrap());
        assert!(matches(&grammar, 0, "b").unwrap());
        assert!(!matches(&grammar, 0, "c").unwrap());
        assert!(!matches(&grammar, 0, "ab").unwrap());
    }

    #[rstest]
    #[case("a", true)]
    #[case("aaa", true)]
    #[case("aaaaaaaaaaaaaaaaaaaa", true)]
    #[case("", false)]
    #[case("ab", false)]
    #[case("ba", false)]
    fn test_right_recursion(#[case] line: &str, #[case] expected: bool) {
        let grammar = compile(["0: 1 0 | 1", "1: 'a'"]).unwrap();
        assert_eq!(matches(&grammar, 0, line).unwrap(), expected);
    }

    #[rstest]
    #[case("a", true)]
    #[case("aaaa", true)]
    #[case("", false)]
    #[case("aab", false)]
    fn test_left_recursion(#[case] line: &str, #[case] expected: bool) {
        let grammar = compile(["0: 0 1 | 1", "1: 'a'"]).unwrap();
        assert_eq!(matches(&grammar, 0, line).unwrap(), expected);
    }

    #[rstest]
    #[case("ab", true)]
    #[case("aabb", true)]
    #[case("aaabbb", true)]
    #[case("aabbb", false)]
    #[case("abab", false)]
    #[case("", false)]
    fn test_nested_recursion(#[case] line: &str, #[case] expected: bool) {
        // a^n b^n
        let grammar = compile(["0: 1 2 | 1 0 2", "1: 'a'", "2: 'b'"]).unwrap();
        assert_eq!(matches(&grammar, 0, line).unwrap(), expected);
    }

    #[rstest]
    #[case("x", true)]
    #[case("x+x", true)]
    #[case("x+x*x", true)]
    #[case("x*x*x+x", true)]
    #[case("x+", false)]
    #[case("+x", false)]
    #[case("xx", false)]
    fn test_mutual_left_recursion(#[case] line: &str, #[case] expected: bool) {
        // expr: expr '+' term | term ; term: term '*' atom | atom
        let grammar = compile([
            "0: 0 10 1 | 1",
            "1: 1 11 2 | 2",
            "2: 12",
            "10: '+'",
            "11: '*'",
            "12: 'x'",
        ])
        .unwrap();
        assert_eq!(matches(&grammar, 0, line).unwrap(), expected);
    }

    #[test]
    fn test_indirect_left_recursion() {
        // 0 -> 1 -> 0 without consuming input
        let grammar = compile(["0: 1 3 | 3", "1: 0 2", "2: 'b'", "3: 'a'"]).unwrap();
        assert!(matches(&grammar, 0, "a").unwrap());
        assert!(matches(&grammar, 0, "aba").unwrap());
        assert!(matches(&grammar, 0, "ababa").unwrap());
        assert!(!matches(&grammar, 0, "ab").unwrap());
    }

    #[test]
    fn test_sample_rule_table() {
        let grammar = compile_str(SAMPLE).unwrap();
        let matcher = Matcher::new(&grammar, 0).unwrap();
        let lines = ["ababbb", "bababa", "abbbab", "aaabbb", "aaaabbb"];
        let verdicts = matcher.evaluate_all(&lines, false).unwrap();
        assert_eq!(verdicts, vec![true, false, true, false, false]);
    }

    #[test]
    fn test_terminal_only_grammar_is_string_equality() {
        let grammar = compile(["0: 1 2 1 3", "1: 'c'", "2: 'a'", "3: 't'"]).unwrap();
        for line in ["cact", "cat", "cactt", "", "tcac"] {
            assert_eq!(matches(&grammar, 0, line).unwrap(), line == "cact");
        }
    }

    #[test]
    fn test_is_idempotent() {
        let grammar = compile(["0: 0 1 | 1", "1: 'a'"]).unwrap();
        let matcher = Matcher::new(&grammar, 0).unwrap();
        let first = matcher.is_match("aaa").unwrap();
        let second = matcher.is_match("aaa").unwrap();
        assert!(first);
        assert_eq!(first, second);
        assert_eq!(grammar, compile(["0: 0 1 | 1", "1: 'a'"]).unwrap());
    }

    #[test]
    fn test_match_lengths_reports_every_prefix() {
        let grammar = compile(["0: 1 0 | 1", "1: 'a'"]).unwrap();
        let matcher = Matcher::new(&grammar, 0).unwrap();
        assert_eq!(matcher.match_lengths("aaab", 0).unwrap(), set(&[1, 2, 3]));
        assert_eq!(matcher.match_lengths("aaab", 2).unwrap(), set(&[1]));
        assert_eq!(matcher.match_lengths("aaab", 3).unwrap(), set(&[]));
        assert_eq!(matcher.match_lengths("aaab", 9).unwrap(), set(&[]));
    }

    #[test]
    fn test_ambiguous_alternatives_share_lengths() {
        // 0 can split "aaaa" many ways; the set collapses duplicates
        let grammar = compile(["0: 1 1 | 1 | 0 0", "1: 'a'"]).unwrap();
        let matcher = Matcher::new(&grammar, 0).unwrap();
        assert_eq!(matcher.match_lengths("aaaa", 0).unwrap(), set(&[1, 2, 3, 4]));
        assert!(matcher.is_match("aaaa").unwrap());
    }

    #[test]
    fn test_unicode_characters_count_once() {
        let grammar = compile(["0: 1 2", "1: 'é'", "2: '世'"]).unwrap();
        assert!(matches(&grammar, 0, "é世").unwrap());
        assert!(!matches(&grammar, 0, "e世").unwrap());
    }

    #[test]
    fn test_empty_sequence_matches_nothing_consumed() {
        let grammar: Grammar = vec![
            (
                0,
                Production::alternatives(vec![Sequence::empty(), Sequence::new(vec![1, 0])]),
            ),
            (1, Production::terminal('a')),
        ]
        .into_iter()
        .collect();

        assert!(matches(&grammar, 0, "").unwrap());
        assert!(matches(&grammar, 0, "aaa").unwrap());
        assert!(!matches(&grammar, 0, "ab").unwrap());
    }

    #[test]
    fn test_unknown_start_rule() {
        let grammar = compile(["0: 'a'"]).unwrap();
        let err = matches(&grammar, 3, "a").unwrap_err();
        assert_eq!(err, MatchError::UnknownStartRule { rule: 3 });
    }

    #[test]
    fn test_missing_rule_is_integrity_error() {
        // Built by hand so it skips the compiler's closure check
        let grammar: Grammar = vec![
            (0, Production::single(Sequence::new(vec![1, 9]))),
            (1, Production::terminal('a')),
        ]
        .into_iter()
        .collect();

        let err = matches(&grammar, 0, "ab").unwrap_err();
        assert_eq!(err, MatchError::GrammarIntegrity { rule: 9 });
    }

    #[test]
    fn test_integrity_error_not_hidden_by_failed_prefix() {
        let grammar: Grammar = vec![(0, Production::single(Sequence::new(vec![9])))]
            .into_iter()
            .collect();
        assert!(matches(&grammar, 0, "").is_err());
    }

    #[test]
    fn test_long_line_does_not_grow_call_stack() {
        // One open frame per offset
        let grammar = compile(["0: 1 0 | 2", "1: 'a'", "2: 'b'"]).unwrap();
        let line = "a".repeat(20_000) + "b";
        assert!(matches(&grammar, 0, &line).unwrap());
        assert!(!matches(&grammar, 0, &"a".repeat(20_000)).unwrap());
    }

    #[test]
    fn test_right_recursion_on_small_stack() {
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| {
                let grammar = compile(["0: 1 0 | 1", "1: 'a'"]).unwrap();
                matches(&grammar, 0, &"a".repeat(3_000)).unwrap()
            })
            .unwrap();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let grammar = compile_str(SAMPLE).unwrap();
        let matcher = Matcher::new(&grammar, 0).unwrap();
        let lines: Vec<String> = ["ababbb", "bababa", "abbbab", "aaabbb", "aaaabbb", "aaaabb"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let sequential = matcher.evaluate_all(&lines, false).unwrap();
        let parallel = matcher.evaluate_all(&lines, true).unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(matcher.count_matches(&lines, true).unwrap(), 3);
    }
}
