//! Per-line matching state
//!
//! Holds the `(rule, offset) -> lengths` memo table for one candidate line,
//! the set of keys currently being evaluated (to detect left recursion) and
//! the bookkeeping that drives repeated passes until the table stops growing.
//! A context is created for each line and dropped afterwards.

use crate::ast::RuleId;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Prefix lengths (in characters) a rule can consume from an offset
pub type LengthSet = BTreeSet<usize>;

type Key = (RuleId, usize);

/// Context maintained while matching a single line
#[derive(Debug, Clone, Default)]
pub struct MatchContext {
    /// Rules currently open on the work stack
    pub depth: usize,

    /// Deepest `depth` reached since the context was created
    pub peak_depth: usize,

    /// (rule, offset) pairs currently on the call stack
    pub in_progress: HashSet<Key>,

    /// Best known lengths for each (rule, offset) evaluated so far
    pub memo_cache: HashMap<Key, LengthSet>,

    /// Entries whose value did not depend on an unfinished seed; final for the line
    settled: HashSet<Key>,

    /// Entries evaluated during the current pass
    finished: HashSet<Key>,

    /// One flag per open frame: did this frame read a provisional value?
    provisional: Vec<bool>,

    /// A left-recursive seed was read during the current pass
    pub recursion_hit: bool,

    /// Some memo entry grew during the current pass
    pub changed: bool,

    /// Number of passes started
    pub passes: usize,
}

impl MatchContext {
    /// Create a new match context
    pub fn new() -> Self {
        Self::default()
    }

    /// Start another evaluation pass over the unsettled entries
    pub fn begin_pass(&mut self) {
        self.finished.clear();
        self.recursion_hit = false;
        self.changed = false;
        self.passes += 1;
    }

    /// True when the last pass read a seed that has since grown
    pub fn needs_another_pass(&self) -> bool {
        self.recursion_hit && self.changed
    }

    /// Value already computed for this key in the current pass, if any
    pub fn lookup(&mut self, rule: RuleId, position: usize) -> Option<LengthSet> {
        let key = (rule, position);
        if self.is_settled(rule, position) {
            return self.memo_cache.get(&key).cloned();
        }
        if self.finished.contains(&key) {
            self.mark_provisional();
            return Some(self.memo_cache.get(&key).cloned().unwrap_or_default());
        }
        None
    }

    /// Enter a rule at a specific position
    ///
    /// Returns false if the same rule is already being evaluated at this
    /// position, i.e. the rule is left-recursive here.
    pub fn enter_rule(&mut self, rule: RuleId, position: usize) -> bool {
        if !self.in_progress.insert((rule, position)) {
            return false;
        }
        self.depth += 1;
        self.peak_depth = self.peak_depth.max(self.depth);
        self.provisional.push(false);
        true
    }

    /// Current seed for a key that is being evaluated further up the stack
    pub fn seed(&mut self, rule: RuleId, position: usize) -> LengthSet {
        self.recursion_hit = true;
        self.mark_provisional();
        self.memo_cache
            .get(&(rule, position))
            .cloned()
            .unwrap_or_default()
    }

    /// Leave a rule and store its lengths
    ///
    /// The stored value only ever grows; the merged value is returned.
    pub fn exit_rule(&mut self, rule: RuleId, position: usize, lengths: LengthSet) -> LengthSet {
        let key = (rule, position);
        self.in_progress.remove(&key);
        self.depth = self.depth.saturating_sub(1);

        let provisional = self.provisional.pop().unwrap_or(false);
        if provisional {
            self.mark_provisional();
        } else {
            self.settled.insert(key);
        }
        self.finished.insert(key);

        let entry = self.memo_cache.entry(key).or_default();
        let before = entry.len();
        entry.extend(lengths);
        if entry.len() != before {
            self.changed = true;
        }
        entry.clone()
    }

    /// Whether the value for this key is final for the line
    pub fn is_settled(&self, rule: RuleId, position: usize) -> bool {
        self.settled.contains(&(rule, position))
    }

    fn mark_provisional(&mut self) {
        if let Some(top) = self.provisional.last_mut() {
            *top = true;
        }
    }
}
