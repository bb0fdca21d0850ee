//! Grammar Analysis
//!
//! Inspects a compiled rule table without modifying it: which rules recurse,
//! which recurse without consuming input first, which can never be reached
//! from the start rule, and a rough per-rule complexity score. Used for the
//! CLI's `--analyze` report.

use crate::ast::{Grammar, Production, RuleId};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Analysis results for a rule table
#[derive(Debug, Clone)]
pub struct GrammarAnalysis {
    /// Start rule the reachability check was run from
    pub start_rule: RuleId,

    /// Rules that can reach themselves (directly or indirectly)
    pub recursive_rules: BTreeSet<RuleId>,

    /// Rules that can reach themselves before consuming any character
    pub left_recursive_rules: BTreeSet<RuleId>,

    /// Rules that can derive the empty string
    pub nullable_rules: BTreeSet<RuleId>,

    /// Rules the start rule never uses
    pub unreachable_rules: BTreeSet<RuleId>,

    /// Complexity score for each rule (alternatives + references)
    pub complexity_scores: BTreeMap<RuleId, usize>,
}

impl GrammarAnalysis {
    /// Analyze a rule table relative to a start rule
    pub fn analyze(grammar: &Grammar, start_rule: RuleId) -> Self {
        let nullable_rules = compute_nullable_set(grammar);

        let recursive_rules = grammar
            .rules()
            .map(|(id, _)| id)
            .filter(|&id| reaches_itself(grammar, id, |_, _| true))
            .collect();

        // Only follow references that can be reached before any input is consumed
        let left_recursive_rules = grammar
            .rules()
            .map(|(id, _)| id)
            .filter(|&id| {
                reaches_itself(grammar, id, |seq, index| {
                    seq[..index].iter().all(|r| nullable_rules.contains(r))
                })
            })
            .collect();

        let reachable = reachable_from(grammar, start_rule);
        let unreachable_rules = grammar
            .rules()
            .map(|(id, _)| id)
            .filter(|id| !reachable.contains(id))
            .collect();

        let complexity_scores = grammar
            .rules()
            .map(|(id, production)| (id, calculate_complexity(production)))
            .collect();

        GrammarAnalysis {
            start_rule,
            recursive_rules,
            left_recursive_rules,
            nullable_rules,
            unreachable_rules,
            complexity_scores,
        }
    }

    /// Check if a rule is recursive
    pub fn is_recursive(&self, rule: RuleId) -> bool {
        self.recursive_rules.contains(&rule)
    }

    /// Check if a rule is left-recursive
    pub fn is_left_recursive(&self, rule: RuleId) -> bool {
        self.left_recursive_rules.contains(&rule)
    }

    /// Get complexity score for a rule
    pub fn complexity(&self, rule: RuleId) -> usize {
        self.complexity_scores.get(&rule).copied().unwrap_or(0)
    }

    /// Get human-readable report of grammar structure
    pub fn report(&self) -> String {
        let mut report = String::new();

        if !self.left_recursive_rules.is_empty() {
            report.push_str("Left-recursive rules (matched by repeated passes):\n");
            report.push_str(&format!("   {}\n\n", join(&self.left_recursive_rules)));
        }

        let right_only: BTreeSet<RuleId> = self
            .recursive_rules
            .difference(&self.left_recursive_rules)
            .copied()
            .collect();
        if !right_only.is_empty() {
            report.push_str("Recursive rules:\n");
            report.push_str(&format!("   {}\n\n", join(&right_only)));
        }

        if !self.nullable_rules.is_empty() {
            report.push_str("Rules that can match the empty string:\n");
            report.push_str(&format!("   {}\n\n", join(&self.nullable_rules)));
        }

        if !self.unreachable_rules.is_empty() {
            report.push_str(&format!(
                "Rules unreachable from rule {}:\n",
                self.start_rule
            ));
            report.push_str(&format!("   {}\n\n", join(&self.unreachable_rules)));
        }

        let high_complexity: Vec<_> = self
            .complexity_scores
            .iter()
            .filter(|(_, &score)| score > 10)
            .collect();

        if !high_complexity.is_empty() {
            report.push_str("High complexity rules:\n");
            for (rule, score) in high_complexity {
                report.push_str(&format!("   - {} (complexity: {})\n", rule, score));
            }
            report.push('\n');
        }

        if report.is_empty() {
            report.push_str("No recursion or unreachable rules\n");
        }

        report
    }
}

fn join(rules: &BTreeSet<RuleId>) -> String {
    rules
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Does `target` reach itself through references accepted by `follow`?
///
/// `follow(seq, index)` decides whether the reference at `seq[index]` is an
/// edge worth walking.
fn reaches_itself<F>(grammar: &Grammar, target: RuleId, follow: F) -> bool
where
    F: Fn(&[RuleId], usize) -> bool,
{
    let mut visited = HashSet::new();
    let mut work_stack = vec![target];

    while let Some(current) = work_stack.pop() {
        let Some(Production::Alternatives(alts)) = grammar.get(current) else {
            continue;
        };

        for seq in alts {
            for (index, &next) in seq.rules.iter().enumerate() {
                if !follow(&seq.rules, index) {
                    break;
                }
                if next == target {
                    return true;
                }
                if visited.insert(next) {
                    work_stack.push(next);
                }
            }
        }
    }

    false
}

/// All rules the start rule can use, including itself
fn reachable_from(grammar: &Grammar, start: RuleId) -> HashSet<RuleId> {
    let mut reachable = HashSet::new();
    if !grammar.contains(start) {
        return reachable;
    }

    let mut work_stack = vec![start];
    reachable.insert(start);

    while let Some(current) = work_stack.pop() {
        let Some(production) = grammar.get(current) else {
            continue;
        };
        for next in production.references() {
            if reachable.insert(next) {
                work_stack.push(next);
            }
        }
    }

    reachable
}

fn compute_nullable_set(grammar: &Grammar) -> BTreeSet<RuleId> {
    let mut nullable_rules = BTreeSet::new();
    let mut changed = true;

    // Iterate until fixpoint (no more changes)
    while changed {
        changed = false;

        for (id, production) in grammar.rules() {
            if nullable_rules.contains(&id) {
                continue;
            }

            let Production::Alternatives(alts) = production else {
                continue;
            };

            let nullable = alts
                .iter()
                .any(|seq| seq.rules.iter().all(|r| nullable_rules.contains(r)));

            if nullable {
                nullable_rules.insert(id);
                changed = true;
            }
        }
    }

    nullable_rules
}

fn calculate_complexity(production: &Production) -> usize {
    match production {
        Production::Terminal(_) => 1,
        Production::Alternatives(alts) => {
            alts.len() + alts.iter().map(|seq| seq.len()).sum::<usize>()
        }
    }
}
