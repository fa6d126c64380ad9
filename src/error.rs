//! Error types.
//!
//! Uses `thiserror`. Rule problems are [`ConfigurationError`]s and surface while a
//! rule set is being built; tokenizing a line never fails.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Crate-level error for loading, reading and rendering.
#[derive(Debug, Error)]
pub enum Error {
    /// A rule definition could not be turned into a rule.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The rule file is not valid JSON or does not have the expected shape.
    #[error("invalid rule file: {0}")]
    RuleFile(#[source] serde_json::Error),

    /// A file could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading the next log line failed.
    #[error("failed to read log line: {0}")]
    Read(#[source] std::io::Error),

    /// Writing rendered output failed.
    #[error("failed to write output: {0}")]
    Write(#[source] std::io::Error),

    /// Serializing rendered output failed.
    #[error("render failed: {0}")]
    Render(#[source] serde_json::Error),

    #[error(transparent)]
    Plugin(#[from] PluginError),
}

/// A malformed rule. Fatal at rule-set construction time.
#[derive(Debug, Error)]
#[error("{kind}{}", .context.as_ref().map(|c| format!(" ({c})")).unwrap_or_default())]
pub struct ConfigurationError {
    pub kind: ConfigurationErrorKind,
    /// Which rule and pattern the error came from, once known.
    pub context: Option<RuleContext>,
}

impl ConfigurationError {
    #[must_use]
    pub fn new(kind: ConfigurationErrorKind) -> Self {
        Self { kind, context: None }
    }

    /// Attach the rule type. Keeps a pattern index that is already set.
    #[must_use]
    pub fn in_rule(mut self, rule_type: impl Into<String>) -> Self {
        let pattern_index = self.context.as_ref().and_then(|c| c.pattern_index);
        self.context = Some(RuleContext { rule_type: rule_type.into(), pattern_index });
        self
    }

    /// Attach the index of the offending pattern within its rule.
    #[must_use]
    pub fn at_pattern(mut self, index: usize) -> Self {
        match &mut self.context {
            Some(ctx) => ctx.pattern_index = Some(index),
            None => self.context = Some(RuleContext { rule_type: String::new(), pattern_index: Some(index) }),
        }
        self
    }

    #[must_use]
    pub fn empty_patterns() -> Self {
        Self::new(ConfigurationErrorKind::EmptyPatterns)
    }

    #[must_use]
    pub fn group_count_mismatch(expected: usize, actual: usize) -> Self {
        Self::new(ConfigurationErrorKind::GroupCountMismatch { expected, actual })
    }
}

#[derive(Debug, Error)]
pub enum ConfigurationErrorKind {
    /// The expression does not compile under the `regex` dialect.
    #[error("invalid pattern `{expression}`: {source}")]
    InvalidPattern {
        expression: String,
        #[source]
        source: regex::Error,
    },

    /// `groups` has a different length than the pattern's capturing groups.
    #[error("pattern has {expected} capture group(s) but {actual} group name(s) were given")]
    GroupCountMismatch { expected: usize, actual: usize },

    #[error("rule has no patterns")]
    EmptyPatterns,

    #[error("unknown regex flag `{0}`")]
    UnknownFlag(String),
}

/// Location of a configuration error inside a rule file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleContext {
    pub rule_type: String,
    pub pattern_index: Option<usize>,
}

impl fmt::Display for RuleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.rule_type.is_empty(), self.pattern_index) {
            (false, Some(idx)) => write!(f, "rule `{}`, pattern #{idx}", self.rule_type),
            (false, None) => write!(f, "rule `{}`", self.rule_type),
            (true, Some(idx)) => write!(f, "pattern #{idx}"),
            (true, None) => Ok(()),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PluginError {
    #[error("plugin `{0}` is already registered")]
    AlreadyRegistered(String),

    #[error("plugin `{0}` is not registered")]
    NotFound(String),
}
