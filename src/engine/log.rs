//! Whole-log tokenization.
//!
//! [`LogTokenizer`] bundles the optional [`MetadataExtractor`] and the
//! [`RuleSet`], and turns a sequence of lines into a lazy sequence of
//! [`LineBatch`]es:
//!
//! ```text
//! line ─▶ MetadataExtractor ─▶ (metadata, remainder @ offset)
//!                                         │
//!                           LineTokenizer ▼
//!                     tokens (spans + offset, metadata attached) ─▶ LineBatch
//! ```
//!
//! Lines are independent: nothing carries over from one line to the next, so
//! the iterator can be dropped at any point and restarted only from the top.

use std::io::BufRead;
use std::time::Instant;

use serde::Serialize;

use super::line::{LineTokenizer, Residual};
use super::metadata::{Extraction, MetadataExtractor};
use super::metrics::{LineMetrics, LogMetrics};
use super::rule_set::RuleSet;
use crate::{Error, Metadata, Token};

/// Output for one log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineBatch {
    /// 1-based line number within the log.
    pub line_number: usize,
    /// Fields pulled off the line by the metadata extractor.
    pub metadata: Metadata,
    /// Tokens in reading order, each carrying the line metadata.
    pub tokens: Vec<Token>,
    /// Text left uncovered, in full-line offsets.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub residual: Vec<Residual>,
}

impl LineBatch {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Speaker name, if the metadata carries one.
    pub fn speaker(&self) -> Option<&str> {
        self.metadata.get("user_name").or_else(|| self.metadata.get("speaker"))
    }

    /// Timestamp, if the metadata carries one.
    pub fn time(&self) -> Option<&str> {
        self.metadata.get("time").or_else(|| self.metadata.get("timestamp"))
    }
}

/// Metadata extraction followed by rule-based tokenization, line by line.
#[derive(Debug, Clone)]
pub struct LogTokenizer {
    metadata: Option<MetadataExtractor>,
    rules: RuleSet,
}

impl LogTokenizer {
    pub fn new(metadata: Option<MetadataExtractor>, rules: RuleSet) -> Self {
        LogTokenizer { metadata, rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn metadata_extractor(&self) -> Option<&MetadataExtractor> {
        self.metadata.as_ref()
    }

    pub fn line_tokenizer(&self) -> LineTokenizer<'_> {
        LineTokenizer::new(&self.rules)
    }

    /// Tokenize one line as line `line_number` of a log.
    pub fn tokenize_line(&self, line_number: usize, line: &str) -> LineBatch {
        self.batch(line_number, line).0
    }

    fn batch(&self, line_number: usize, line: &str) -> (LineBatch, LineMetrics) {
        let extraction = match &self.metadata {
            Some(extractor) => extractor.extract(line),
            None => Extraction::unmatched(line),
        };

        let (out, metrics) = self.line_tokenizer().tokenize_with_metrics(extraction.remainder);
        let offset = extraction.offset;
        let tokens = out.tokens.into_iter().map(|t| t.with_line_context(offset, &extraction.metadata)).collect();
        let residual = out.residual.into_iter().map(|r| r.shift(offset)).collect();

        (LineBatch { line_number, metadata: extraction.metadata, tokens, residual }, metrics)
    }

    /// Lazily tokenize `lines`, one batch per line (blank lines included).
    pub fn tokenize_log<I>(&self, lines: I) -> Batches<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Batches { tokenizer: self, lines: lines.into_iter(), line_number: 0 }
    }

    /// Split `text` on line breaks (`\n` or `\r\n`) and tokenize each line.
    pub fn tokenize_text<'s, 't>(&'s self, text: &'t str) -> Batches<'s, std::str::Lines<'t>> {
        self.tokenize_log(text.lines())
    }

    /// Pull lines from `reader` on demand.
    pub fn tokenize_reader<R: BufRead>(&self, reader: R) -> impl Iterator<Item = Result<LineBatch, Error>> {
        reader.lines().enumerate().map(|(idx, line)| line.map(|l| self.tokenize_line(idx + 1, &l)).map_err(Error::Read))
    }

    /// Tokenize every line eagerly and collect counters along the way.
    pub fn tokenize_log_with_metrics<I>(&self, lines: I) -> (Vec<LineBatch>, LogMetrics)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.tokenize_numbered_with_metrics(lines.into_iter().enumerate().map(|(idx, line)| (idx + 1, line)))
    }

    /// Like [`tokenize_log_with_metrics`](Self::tokenize_log_with_metrics), for lines that already
    /// carry their 1-based log line number (e.g. after filtering some out).
    pub fn tokenize_numbered_with_metrics<I, S>(&self, lines: I) -> (Vec<LineBatch>, LogMetrics)
    where
        I: IntoIterator<Item = (usize, S)>,
        S: AsRef<str>,
    {
        let start = Instant::now();
        let mut metrics = LogMetrics::default();
        let mut batches = Vec::new();

        for (line_number, line) in lines {
            let line = line.as_ref();
            let (batch, line_metrics) = self.batch(line_number, line);
            metrics.record(&batch, &line_metrics, line.trim().is_empty());
            batches.push(batch);
        }

        metrics.total = start.elapsed();
        (batches, metrics)
    }
}

/// Lazy per-line iterator returned by [`LogTokenizer::tokenize_log`].
#[derive(Debug)]
pub struct Batches<'s, I> {
    tokenizer: &'s LogTokenizer,
    lines: I,
    line_number: usize,
}

impl<I> Iterator for Batches<'_, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = LineBatch;

    fn next(&mut self) -> Option<LineBatch> {
        let line = self.lines.next()?;
        self.line_number += 1;
        Some(self.tokenizer.tokenize_line(self.line_number, line.as_ref()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.lines.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MatchStrategy, Pattern, PatternFlags, PriorityOrder, Rule, Span};
    use pretty_assertions::assert_eq;

    fn tokenizer() -> LogTokenizer {
        let meta = Pattern::compile(
            r"(\S+?)\((\d+)\)\s+(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\s*",
            ["user_name", "user_id", "time"],
            PatternFlags::empty(),
        )
        .unwrap();
        let action = Pattern::compile(r"#(.+)", ["content"], PatternFlags::empty()).unwrap();
        let speech = Pattern::compile(r#""([^"]*)""#, ["content"], PatternFlags::empty()).unwrap();
        let target = Pattern::compile(r"@(\S+)", ["user_name"], PatternFlags::empty()).unwrap();
        let rules = RuleSet::new(
            vec![
                Rule::new("action", MatchStrategy::Prefix, 1, vec![action]).unwrap(),
                Rule::new("speech", MatchStrategy::Enclosed, 2, vec![speech]).unwrap(),
                Rule::new("mention", MatchStrategy::Enclosed, 3, vec![target]).unwrap(),
            ],
            PriorityOrder::LowerFirst,
        );
        LogTokenizer::new(Some(MetadataExtractor::new(vec![meta]).unwrap()), rules)
    }

    #[test]
    fn metadata_is_attached_to_every_token() {
        let tok = tokenizer();
        let line = r#"Aria(42) 2025-01-27 19:58:15 "Hold!" "Now!""#;
        let batch = tok.tokenize_line(1, line);

        assert_eq!(batch.speaker(), Some("Aria"));
        assert_eq!(batch.tokens.len(), 2);
        for token in &batch.tokens {
            assert_eq!(token.metadata().get("user_name"), Some("Aria"));
            assert_eq!(token.metadata().get("time"), Some("2025-01-27 19:58:15"));
            assert_eq!(&line[token.start() + 1..token.end() - 1], token.content());
        }
    }

    #[test]
    fn spans_are_full_line_offsets() {
        let tok = tokenizer();
        let line = "Name(123456) 2025-01-27 19:58:15 #draws a sword";
        let batch = tok.tokenize_line(7, line);

        assert_eq!(batch.line_number, 7);
        assert_eq!(batch.tokens.len(), 1);
        let action = &batch.tokens[0];
        assert_eq!(action.kind(), "action");
        assert_eq!(action.content(), "draws a sword");
        assert_eq!(action.span(), Span::new(33, 47));
        assert!(batch.residual.is_empty());
    }

    #[test]
    fn token_fields_win_over_line_fields() {
        let tok = tokenizer();
        let batch = tok.tokenize_line(1, "Aria(42) 2025-01-27 19:58:15 @Bran");
        let mention = &batch.tokens[0];
        let fields: Vec<_> = mention.metadata().iter().collect();
        assert_eq!(fields, vec![("user_name", "Bran"), ("user_id", "42"), ("time", "2025-01-27 19:58:15")]);
        assert_eq!(batch.speaker(), Some("Aria"));
    }

    #[test]
    fn log_yields_one_batch_per_line_without_carry_over() {
        let tok = tokenizer();
        let text = "Aria(42) 2025-01-27 19:58:15 #waves\r\n\nplain words\n";
        let batches: Vec<LineBatch> = tok.tokenize_text(text).collect();

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].tokens[0].content(), "waves");
        assert!(batches[1].is_empty());
        assert!(batches[2].metadata.is_empty());
        assert!(batches[2].is_empty());
        assert_eq!(batches[2].residual[0].text, "plain words");
        assert_eq!(batches.iter().map(|b| b.line_number).collect::<Vec<_>>(), [1, 2, 3]);
    }

    #[test]
    fn iteration_is_lazy_and_restartable() {
        let tok = tokenizer();
        let lines = ["#a", "#b", "#c"];
        let first: Vec<String> = tok.tokenize_log(lines).take(2).map(|b| b.tokens[0].content().to_string()).collect();
        assert_eq!(first, ["a", "b"]);
        let again: Vec<LineBatch> = tok.tokenize_log(lines).collect();
        assert_eq!(again.len(), 3);
        assert_eq!(again[0].tokens[0].content(), "a");
    }

    #[test]
    fn reader_source_matches_text_source() {
        let tok = tokenizer();
        let text = "Aria(42) 2025-01-27 19:58:15 \"hi\"\n#nods\n";
        let from_reader: Vec<LineBatch> = tok.tokenize_reader(text.as_bytes()).collect::<Result<_, _>>().unwrap();
        let from_text: Vec<LineBatch> = tok.tokenize_text(text).collect();
        assert_eq!(from_reader, from_text);
    }

    #[test]
    fn metrics_summarize_the_log() {
        let tok = tokenizer();
        let lines = ["Aria(42) 2025-01-27 19:58:15 \"a\" \"b\"", "", "#nods", "nothing here"];
        let (batches, metrics) = tok.tokenize_log_with_metrics(lines);

        assert_eq!(batches.len(), 4);
        assert_eq!(metrics.lines, 4);
        assert_eq!(metrics.blank_lines, 1);
        assert_eq!(metrics.unmatched_lines, 1);
        assert_eq!(metrics.lines_with_metadata, 1);
        assert_eq!(metrics.tokens, 3);
        assert_eq!(metrics.count_of("speech"), 2);
        assert_eq!(metrics.count_of("action"), 1);
        assert_eq!(metrics.count_of("ooc"), 0);
    }

    #[test]
    fn tokenizer_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LogTokenizer>();

        let tok = tokenizer();
        let lines: Vec<String> = (0..8).map(|i| format!("Aria(42) 2025-01-27 19:58:15 \"line {i}\"")).collect();
        let expected: Vec<LineBatch> = tok.tokenize_log(&lines).collect();

        let (tok, lines) = (&tok, &lines);
        let results: Vec<Vec<LineBatch>> = std::thread::scope(|s| {
            let handles: Vec<_> =
                (0..4).map(|_| s.spawn(move || tok.tokenize_log(lines).collect::<Vec<_>>())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for r in results {
            assert_eq!(r, expected);
        }
    }
}
