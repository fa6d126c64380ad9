use crate::rules::default_tokenizer;
use crate::{LineBatch, LogMetrics, LogTokenizer, Token};
use std::time::Duration;

/// Options that affect how a whole log is tokenized.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Drop batches for lines that are empty or whitespace-only.
    pub skip_blank_lines: bool,
}

/// Result from [`tokenize_log_verbose_with`].
///
/// Meant for rule debugging and profiling: the plain [`tokenize_log_with`]
/// path does not collect any of this.
#[derive(Debug, Clone)]
pub struct TokenizeReport {
    pub batches: Vec<LineBatch>,
    pub metrics: LogMetrics,
    /// Token types that produced at least one token, in precedence order.
    pub active_rules: Vec<String>,
}

impl TokenizeReport {
    pub fn elapsed(&self) -> Duration {
        self.metrics.total
    }
}

/// Tokenize a single line with the built-in rules.
///
/// # Example
/// ```
/// let tokens = rollscribe::tokenize_line("#draws a sword");
/// assert_eq!(tokens[0].kind(), "action");
/// assert_eq!(tokens[0].content(), "draws a sword");
/// ```
pub fn tokenize_line(line: &str) -> Vec<Token> {
    default_tokenizer().tokenize_line(1, line).tokens
}

/// Tokenize a whole log with the built-in rules and default [`Options`].
pub fn tokenize_log(text: &str) -> Vec<LineBatch> {
    tokenize_log_with(default_tokenizer(), text, &Options::default())
}

/// Tokenize `text` with a caller-supplied tokenizer, e.g. one built from a rule file.
pub fn tokenize_log_with(tokenizer: &LogTokenizer, text: &str, options: &Options) -> Vec<LineBatch> {
    kept_lines(text, options).map(|(line_number, line)| tokenizer.tokenize_line(line_number, line)).collect()
}

/// Like [`tokenize_log_with`], with metrics and the list of rules that fired.
pub fn tokenize_log_verbose_with(tokenizer: &LogTokenizer, text: &str, options: &Options) -> TokenizeReport {
    let (batches, metrics) = tokenizer.tokenize_numbered_with_metrics(kept_lines(text, options));

    let active_rules = tokenizer
        .rules()
        .type_names()
        .into_iter()
        .filter(|kind| metrics.count_of(kind) > 0)
        .map(str::to_string)
        .collect();

    TokenizeReport { batches, metrics, active_rules }
}

/// Lines paired with their 1-based number in `text`, numbered before blank lines are dropped.
fn kept_lines<'t>(text: &'t str, options: &Options) -> impl Iterator<Item = (usize, &'t str)> {
    let skip_blank = options.skip_blank_lines;
    text.lines().enumerate().map(|(idx, l)| (idx + 1, l)).filter(move |(_, l)| !(skip_blank && l.trim().is_empty()))
}
