//! WebAssembly bindings for rulematch
//!
//! This module provides JavaScript-friendly bindings for the matcher.
//! It's only compiled when targeting wasm32.

#![cfg(target_arch = "wasm32")]

use crate::ast::{Grammar, RuleId, DEFAULT_START_RULE};
use crate::document::{run, Document};
use crate::grammar_parser::compile_str;
use crate::matcher::Matcher;
use crate::MatchConfig;
use wasm_bindgen::prelude::*;

// Set panic hook for better error messages in browser
#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Compiled rule table usable from JavaScript
#[wasm_bindgen]
pub struct RuleMatcher {
    grammar: Grammar,
    start: RuleId,
}

#[wasm_bindgen]
impl RuleMatcher {
    /// Compile a rule table; matching starts at rule 0
    #[wasm_bindgen(constructor)]
    pub fn new(rules: &str) -> Result<RuleMatcher, JsValue> {
        #[cfg(feature = "console_error_panic_hook")]
        set_panic_hook();

        let grammar = compile_str(rules).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Matcher::new(&grammar, DEFAULT_START_RULE).map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(RuleMatcher {
            grammar,
            start: DEFAULT_START_RULE,
        })
    }

    /// Pick a different start rule
    pub fn set_start(&mut self, start: RuleId) -> Result<(), JsValue> {
        Matcher::new(&self.grammar, start).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.start = start;
        Ok(())
    }

    /// Whether the whole line derives from the start rule
    pub fn is_match(&self, line: &str) -> Result<bool, JsValue> {
        Matcher::new(&self.grammar, self.start)
            .and_then(|matcher| matcher.is_match(line))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Count matching lines in newline-separated text
    pub fn count(&self, lines: &str) -> Result<usize, JsValue> {
        let candidates = Document::parse(lines).candidates;
        Matcher::new(&self.grammar, self.start)
            .and_then(|matcher| matcher.count_matches(&candidates, false))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Get the number of rules in the grammar (for debugging)
    pub fn rule_count(&self) -> usize {
        self.grammar.rule_count()
    }
}

/// Convenience function: evaluate a combined rules-and-lines document
#[wasm_bindgen]
pub fn evaluate_document(input: &str) -> Result<String, JsValue> {
    run(&Document::parse(input), &MatchConfig::default())
        .map(|report| report.to_string())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
