//! Single-line tokenization.
//!
//! This module is the operational core of the engine:
//!
//! ```text
//! line ──▶ every rule, in rank order ──▶ candidates
//!                                          │ resolve_conflicts (resolve.rs)
//!                                          ▼
//!                          accepted, sorted by start ──▶ Tokens
//!                                          │
//!                                          └─▶ uncovered gaps ──▶ Residual
//! ```
//!
//! Text that no accepted span covers is reported as residual and never turned
//! into a token by the engine itself. Callers that want narration captured
//! configure a catch-all rule with the lowest precedence; it goes through the
//! exact same sweep as every other rule.

use std::time::Instant;

use serde::Serialize;

use super::metrics::LineMetrics;
use super::resolve::{resolve_conflicts, uncovered};
use super::rule::MatchCandidate;
use super::rule_set::RuleSet;
use crate::{Span, Token};

/// A stretch of the line that no token claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Residual {
    #[serde(flatten)]
    pub span: Span,
    pub text: String,
}

impl Residual {
    /// True when the residual is only whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub(crate) fn shift(self, offset: usize) -> Residual {
        Residual { span: self.span.shift(offset), text: self.text }
    }
}

/// Tokens of one line plus the text they left uncovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineTokens {
    pub tokens: Vec<Token>,
    pub residual: Vec<Residual>,
}

/// Applies a [`RuleSet`] to one line at a time.
///
/// Holds nothing but a shared reference, so one tokenizer can be used from
/// many threads at once.
#[derive(Debug, Clone, Copy)]
pub struct LineTokenizer<'a> {
    rules: &'a RuleSet,
}

impl<'a> LineTokenizer<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        LineTokenizer { rules }
    }

    /// Candidates of every rule, in rank order.
    fn candidates(&self, line: &str) -> Vec<MatchCandidate<'a>> {
        self.rules.rules().iter().enumerate().flat_map(|(rank, rule)| rule.try_match(line, rank)).collect()
    }

    /// Tokens for `line` in reading order. An empty line yields nothing.
    pub fn tokenize(&self, line: &str) -> Vec<Token> {
        self.tokenize_detailed(line).tokens
    }

    /// Tokens plus the residual text.
    pub fn tokenize_detailed(&self, line: &str) -> LineTokens {
        self.run(line).0
    }

    /// Like [`tokenize_detailed`](Self::tokenize_detailed), also returning counters.
    pub fn tokenize_with_metrics(&self, line: &str) -> (LineTokens, LineMetrics) {
        self.run(line)
    }

    fn run(&self, line: &str) -> (LineTokens, LineMetrics) {
        let start = Instant::now();
        if line.is_empty() {
            return (LineTokens::default(), LineMetrics { duration: start.elapsed(), ..LineMetrics::default() });
        }

        let candidates = self.candidates(line);
        let candidate_count = candidates.len();
        let resolution = resolve_conflicts(candidates);

        let residual = uncovered(line.len(), resolution.accepted.iter().map(|c| c.span))
            .into_iter()
            .map(|span| Residual { span, text: line[span.start..span.end].to_string() })
            .collect();
        let accepted = resolution.accepted.len();
        let tokens: Vec<Token> = resolution.accepted.into_iter().map(|c| c.into_token(line)).collect();

        let metrics =
            LineMetrics { candidates: candidate_count, accepted, rejected: resolution.rejected, duration: start.elapsed() };
        (LineTokens { tokens, residual }, metrics)
    }
}
