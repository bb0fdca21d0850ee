//! Error types for rule compilation and matching

use crate::ast::RuleId;
use thiserror::Error;

/// Result type alias for operations that can fail with any crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while turning a rule table into a grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A rule line could not be read as a terminal or as alternatives
    #[error("malformed rule on line {line}: {message}")]
    MalformedRule { line: usize, message: String },

    /// A sequence names a rule that the table never defines
    #[error("rule {referenced_by} references undefined rule {rule}")]
    UnresolvedReference { rule: RuleId, referenced_by: RuleId },
}

/// Errors raised while matching a line
///
/// A line that does not match is not an error; it is `Ok(false)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// A reference resolved to nothing even though the grammar compiled
    #[error("grammar integrity violated: rule {rule} has no production")]
    GrammarIntegrity { rule: RuleId },

    /// The caller asked to start from a rule the grammar does not have
    #[error("start rule {rule} is not defined")]
    UnknownStartRule { rule: RuleId },
}

/// Top-level error for callers that load files and run whole documents
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub fn from_io(path: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl CompileError {
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        CompileError::MalformedRule {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = CompileError::malformed(3, "unterminated quote");
        assert_eq!(err.to_string(), "malformed rule on line 3: unterminated quote");

        let err = CompileError::UnresolvedReference {
            rule: 7,
            referenced_by: 0,
        };
        assert_eq!(err.to_string(), "rule 0 references undefined rule 7");

        let err = MatchError::GrammarIntegrity { rule: 4 };
        assert!(err.to_string().contains("rule 4"));
    }

    #[test]
    fn test_wraps_into_top_level() {
        let err: Error = MatchError::UnknownStartRule { rule: 5 }.into();
        assert_eq!(err.to_string(), "start rule 5 is not defined");
    }
}
