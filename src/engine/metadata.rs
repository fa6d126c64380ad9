//! Line metadata extraction.
//!
//! The extractor runs once per line, before content tokenization, and is not
//! part of the competitive matching: whatever it consumes is gone before the
//! rule set sees the line.
//!
//! ```text
//! Name(123456) 2025-01-27 19:58:15 #draws a sword
//! └──────────── metadata ─────────┘└── remainder ─┘
//!                                  ^ offset = 33
//! ```

use tracing::debug;

use super::pattern::Pattern;
use super::rule::{MatchStrategy, Rule};
use crate::{ConfigurationError, Metadata, Span};

/// Outcome of [`MetadataExtractor::extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction<'l> {
    /// Named groups of the metadata match; empty when nothing matched.
    pub metadata: Metadata,
    /// Part of the line left for content tokenization.
    pub remainder: &'l str,
    /// Byte offset of `remainder` within the line.
    pub offset: usize,
    matched: bool,
}

impl<'l> Extraction<'l> {
    /// The whole line as remainder, no metadata.
    pub(crate) fn unmatched(line: &'l str) -> Self {
        Extraction { metadata: Metadata::new(), remainder: line, offset: 0, matched: false }
    }

    /// Whether a metadata pattern matched, even one that captured no fields.
    pub fn matched(&self) -> bool {
        self.matched
    }
}

/// A single-shot prefix rule that pulls speaker/timestamp fields off a line.
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    rule: Rule,
}

impl MetadataExtractor {
    /// Patterns are tried in order; each keeps its own group names.
    ///
    /// A group named `content` marks the remainder explicitly and is not
    /// reported as a field.
    pub fn new(patterns: Vec<Pattern>) -> Result<Self, ConfigurationError> {
        let rule = Rule::new("metadata", MatchStrategy::Prefix, 0, patterns)?;
        debug!(patterns = rule.patterns().len(), "metadata extractor built");
        Ok(MetadataExtractor { rule })
    }

    pub fn patterns(&self) -> &[Pattern] {
        self.rule.patterns()
    }

    /// Split `line` into metadata and remainder. A line without metadata is
    /// returned whole with empty metadata.
    pub fn extract<'l>(&self, line: &'l str) -> Extraction<'l> {
        let Some(candidate) = self.rule.try_match(line, 0).into_iter().next() else {
            return Extraction::unmatched(line);
        };

        let rest = match candidate.content_spans().and_then(|spans| spans.first().copied()) {
            Some(span) => span,
            None => Span::new(candidate.span.end, line.len()),
        };
        Extraction {
            metadata: candidate.fields(line),
            remainder: &line[rest.start..rest.end],
            offset: rest.start,
            matched: true,
        }
    }
}
