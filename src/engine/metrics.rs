//! Tokenizer run metrics.
//!
//! Metrics are opt-in: [`LineTokenizer::tokenize`] collects nothing, while the
//! `*_with_metrics` variants count candidates and time each line.
//!
//! [`LineTokenizer::tokenize`]: super::LineTokenizer::tokenize

use std::time::Duration;

use super::log::LineBatch;

/// Counters for a single line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LineMetrics {
    /// Candidates produced by all rules before resolution.
    pub candidates: usize,
    /// Candidates that became tokens.
    pub accepted: usize,
    /// Candidates dropped because a higher-precedence span overlapped them.
    pub rejected: usize,
    /// Time spent matching and resolving.
    pub duration: Duration,
}

/// Counters for a whole log.
#[derive(Debug, Default, Clone)]
pub struct LogMetrics {
    /// Total elapsed time.
    pub total: Duration,
    pub lines: usize,
    pub blank_lines: usize,
    /// Lines on which the metadata extractor matched.
    pub lines_with_metadata: usize,
    /// Non-blank lines that produced no token at all.
    pub unmatched_lines: usize,
    pub candidates: usize,
    pub rejected: usize,
    pub tokens: usize,
    /// Token count per type, in order of first appearance.
    pub by_type: Vec<(String, usize)>,
}

impl LogMetrics {
    pub(crate) fn record(&mut self, batch: &LineBatch, line: &LineMetrics, blank: bool) {
        self.lines += 1;
        if blank {
            self.blank_lines += 1;
        } else if batch.tokens.is_empty() {
            self.unmatched_lines += 1;
        }
        if !batch.metadata.is_empty() {
            self.lines_with_metadata += 1;
        }
        self.candidates += line.candidates;
        self.rejected += line.rejected;
        self.tokens += batch.tokens.len();

        for token in &batch.tokens {
            match self.by_type.iter_mut().find(|(kind, _)| kind == token.kind()) {
                Some(slot) => slot.1 += 1,
                None => self.by_type.push((token.kind().to_string(), 1)),
            }
        }
    }

    /// Number of tokens of type `kind`.
    pub fn count_of(&self, kind: &str) -> usize {
        self.by_type.iter().find(|(k, _)| k == kind).map(|(_, n)| *n).unwrap_or(0)
    }
}
