//! Run configuration
//!
//! Settings can come from a JSON file; command-line flags override them.

use crate::ast::{RuleId, DEFAULT_START_RULE};
use crate::error::Error;
use crate::grammar_parser::CompileMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How a document is compiled and matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Rule every candidate line must derive from
    pub start_rule: RuleId,
    /// Malformed-rule policy
    pub mode: CompileMode,
    /// Evaluate candidate lines on the rayon pool
    pub parallel: bool,
    /// Rule lines applied after the table, e.g. `8: 42 | 42 8`
    pub patches: Vec<String>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            start_rule: DEFAULT_START_RULE,
            mode: CompileMode::Strict,
            parallel: false,
            patches: Vec::new(),
        }
    }
}

impl MatchConfig {
    /// Load settings from a JSON file; missing fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).map_err(|e| Error::from_io(path.display().to_string(), e))?;
        Self::from_json(&text).map_err(|source| Error::Config {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
