//! Rule-based tokenizer for tabletop role-playing session logs.
//!
//! A log line such as
//!
//! ```text
//! Name(123456) 2025-01-27 19:58:15 #draws a sword
//! ```
//!
//! is split into line metadata (`user_name`, `user_id`, `time`) and a list of
//! typed [`Token`]s (`action: "draws a sword"`). What counts as speech, action,
//! OOC chatter or a dice command is decided entirely by a rule set, either the
//! built-in one ([`rules::default_tokenizer`]) or one loaded from a JSON rule
//! file ([`config::RuleFile`]).
//!
//! ```
//! let tokens = rollscribe::tokenize_line("\"Stop right there!\" (brb)");
//! let kinds: Vec<&str> = tokens.iter().map(|t| t.kind()).collect();
//! assert_eq!(kinds, ["speech", "ooc"]);
//! ```
//!
//! All offsets are UTF-8 byte offsets into the original line.

extern crate self as rollscribe;

#[macro_use]
mod macros;
mod api;
pub mod config;
mod engine;
mod error;
pub mod plugin;
pub mod render;
pub mod rules;

pub use api::{Options, TokenizeReport, tokenize_line, tokenize_log, tokenize_log_verbose_with, tokenize_log_with};
pub use engine::{
    Anchor, Batches, Extraction, LineBatch, LineMetrics, LineTokenizer, LineTokens, LogMetrics, LogTokenizer,
    MatchCandidate, MatchStrategy, MetadataExtractor, Pattern, PatternFlags, PriorityOrder, Residual, Rule, RuleSet,
};
pub use error::{ConfigurationError, ConfigurationErrorKind, Error, PluginError, RuleContext};

use serde::Serialize;
use serde::ser::SerializeMap;

// --- Core value types ---------------------------------------------------------

/// Half-open `[start, end)` byte interval over a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Span {
    /// Start byte index (inclusive).
    pub start: usize,
    /// End byte index (exclusive).
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True when both spans share at least one byte.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Move the span right by `offset` bytes.
    pub fn shift(self, offset: usize) -> Span {
        Span { start: self.start + offset, end: self.end + offset }
    }
}

/// Insertion-ordered string map used for line and token metadata.
///
/// Field order follows capture-group order, which keeps rendered output and
/// serialized JSON stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `key`. An existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `self` first, then the keys of `overlay`; overlay values win on conflict.
    pub fn merged_with(&self, overlay: &Metadata) -> Metadata {
        let mut out = self.clone();
        for (k, v) in overlay.iter() {
            out.insert(k, v);
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut md = Metadata::new();
        for (k, v) in iter {
            md.insert(k, v);
        }
        md
    }
}

impl Serialize for Metadata {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// A typed, positioned unit of content extracted from one log line.
///
/// Tokens are only created by the engine. Later stages may attach extra
/// metadata through [`Token::with_metadata`], which returns a copy; the type,
/// content and span never change after emission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    #[serde(rename = "type")]
    kind: String,
    content: String,
    #[serde(flatten)]
    span: Span,
    metadata: Metadata,
}

impl Token {
    pub(crate) fn new(kind: impl Into<String>, content: impl Into<String>, span: Span, metadata: Metadata) -> Self {
        Token { kind: kind.into(), content: content.into(), span, metadata }
    }

    /// Token type tag, e.g. `"speech"` or `"dice_order"`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Copy of this token with one more metadata field.
    #[must_use]
    pub fn with_metadata(&self, key: impl Into<String>, value: impl Into<String>) -> Token {
        let mut token = self.clone();
        token.metadata.insert(key, value);
        token
    }

    /// The span in `char` offsets, given the line the token was produced from.
    ///
    /// Returns `None` if `line` is not the token's source line (span out of
    /// bounds or not on a char boundary).
    pub fn char_span(&self, line: &str) -> Option<(usize, usize)> {
        let prefix = line.get(..self.span.start)?;
        let body = line.get(self.span.start..self.span.end)?;
        let start = prefix.chars().count();
        Some((start, start + body.chars().count()))
    }

    pub(crate) fn with_line_context(self, offset: usize, line_metadata: &Metadata) -> Token {
        Token {
            kind: self.kind,
            content: self.content,
            span: self.span.shift(offset),
            metadata: line_metadata.merged_with(&self.metadata),
        }
    }
}
