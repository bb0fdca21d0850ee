//! Grammar data model
//!
//! A grammar is a table of numbered rules. Rules refer to each other by id
//! rather than by pointer, so recursive and mutually recursive rules need no
//! special ownership handling.

use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a rule in the table
pub type RuleId = u32;

/// Rule used as the start symbol when the caller does not pick one
pub const DEFAULT_START_RULE: RuleId = 0;

/// Ordered list of rule references, expanded left to right
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Sequence {
    pub rules: Vec<RuleId>,
}

/// Right-hand side of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Production {
    /// Matches exactly one input character
    Terminal(char),
    /// Any one of the sequences may be used
    Alternatives(Vec<Sequence>),
}

/// Compiled rule table, immutable once matching starts
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grammar {
    rules: BTreeMap<RuleId, Production>,
}

impl Sequence {
    pub fn new(rules: Vec<RuleId>) -> Self {
        Sequence { rules }
    }

    pub fn empty() -> Self {
        Sequence { rules: vec![] }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

impl From<Vec<RuleId>> for Sequence {
    fn from(rules: Vec<RuleId>) -> Self {
        Sequence::new(rules)
    }
}

impl Production {
    pub fn terminal(ch: char) -> Self {
        Production::Terminal(ch)
    }

    pub fn alternatives(alts: Vec<Sequence>) -> Self {
        Production::Alternatives(alts)
    }

    /// A production with one alternative
    pub fn single(seq: Sequence) -> Self {
        Production::Alternatives(vec![seq])
    }

    /// Every rule id this production references, in source order
    pub fn references(&self) -> impl Iterator<Item = RuleId> + '_ {
        let alts: &[Sequence] = match self {
            Production::Terminal(_) => &[],
            Production::Alternatives(alts) => alts,
        };
        alts.iter().flat_map(|seq| seq.rules.iter().copied())
    }
}

impl Grammar {
    pub fn new() -> Self {
        Grammar {
            rules: BTreeMap::new(),
        }
    }

    /// Insert or replace a rule, returning the previous production
    pub fn insert(&mut self, id: RuleId, production: Production) -> Option<Production> {
        self.rules.insert(id, production)
    }

    pub fn get(&self, id: RuleId) -> Option<&Production> {
        self.rules.get(&id)
    }

    pub fn contains(&self, id: RuleId) -> bool {
        self.rules.contains_key(&id)
    }

    /// Number of rules in the table
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Rules in ascending id order
    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Production)> + '_ {
        self.rules.iter().map(|(id, production)| (*id, production))
    }

    /// First reference (referencing rule, missing rule) that has no production
    ///
    /// Reports the lowest missing id so the error is stable across runs.
    pub fn first_unresolved(&self) -> Option<(RuleId, RuleId)> {
        let mut missing: Option<(RuleId, RuleId)> = None;
        for (id, production) in self.rules() {
            for reference in production.references() {
                if self.contains(reference) {
                    continue;
                }
                if missing.map_or(true, |(_, lowest)| reference < lowest) {
                    missing = Some((id, reference));
                }
            }
        }
        missing
    }
}

impl FromIterator<(RuleId, Production)> for Grammar {
    fn from_iter<I: IntoIterator<Item = (RuleId, Production)>>(iter: I) -> Self {
        Grammar {
            rules: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", rule)?;
        }
        Ok(())
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Production::Terminal('"') => write!(f, "\"\"\"\""),
            Production::Terminal(ch) => write!(f, "\"{}\"", ch),
            Production::Alternatives(alts) => {
                for (i, seq) in alts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", seq)?;
                }
                Ok(())
            }
        }
    }
}

/// Renders the table back in rule-file form, one rule per line
impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, production) in self.rules() {
            writeln!(f, "{}: {}", id, production)?;
        }
        Ok(())
    }
}
