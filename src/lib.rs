//! rulematch - Rule-table grammar matcher
//!
//! Compiles a numbered rule table into a context-free grammar and decides
//! whether candidate lines belong to the language of a start rule. Rules may
//! be recursive (left, right or mutual) and ambiguous.
//!
//! # Quick Start
//!
//! ```rust
//! use rulematch::{compile_str, matches};
//!
//! let rules = r#"
//!     0: 1 0 | 1
//!     1: "a"
//! "#;
//!
//! let grammar = compile_str(rules).expect("Invalid rule table");
//!
//! assert!(matches(&grammar, 0, "aaa").expect("Grammar is closed"));
//! assert!(!matches(&grammar, 0, "aab").expect("Grammar is closed"));
//! ```
//!
//! # Features
//!
//! - Memoized length sets per `(rule, offset)`, no backtracking
//! - Left recursion handled by growing seeds to a fixpoint
//! - Parallel evaluation of candidate lines with rayon
//! - WebAssembly support for browser use
//! - Pure safe Rust

pub mod ast;
pub mod config;
pub mod document;
pub mod error;
pub mod grammar_analysis;
pub mod grammar_parser;
pub mod input_stream;
pub mod lexer;
pub mod matcher;
pub mod parse_context;

// WASM bindings (only when compiling for wasm32)
#[cfg(target_arch = "wasm32")]
pub mod wasm;

// Re-export main API
pub use ast::{Grammar, Production, RuleId, Sequence, DEFAULT_START_RULE};
pub use config::MatchConfig;
pub use document::{evaluate, run, Document, Report, Verdict};
pub use error::{CompileError, Error, MatchError, Result};
pub use grammar_analysis::GrammarAnalysis;
pub use grammar_parser::{compile, compile_str, compile_with_mode, CompileMode};
pub use matcher::{matches, Matcher};
pub use parse_context::LengthSet;

// Re-export WASM API for convenience
#[cfg(target_arch = "wasm32")]
pub use wasm::*;
