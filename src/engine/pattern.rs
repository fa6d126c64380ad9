//! Compiled patterns.
//!
//! A [`Pattern`] is the leaf of the engine: one regular expression plus the
//! semantic names of its capturing groups, in the order the expression defines
//! them. Names are validated against the compiled regex, so a rule file whose
//! `groups` list does not line up with its expression is rejected before any
//! line is tokenized.
//!
//! Matching is pure and works in byte offsets (the `regex` crate's native unit).

use regex::{CaptureMatches, Captures, Regex, RegexBuilder};

use crate::{ConfigurationError, ConfigurationErrorKind, Span};

bitflags::bitflags! {
    /// Regex builder options a rule may request through its `flags` list.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PatternFlags: u8 {
        const CASE_INSENSITIVE    = 1 << 0;
        const MULTI_LINE          = 1 << 1;
        const DOT_MATCHES_NEWLINE = 1 << 2;
        const IGNORE_WHITESPACE   = 1 << 3;
        const SWAP_GREED          = 1 << 4;
    }
}

impl PatternFlags {
    /// Parse one flag name. Accepts the inline-flag letter or a long name.
    pub fn parse_one(name: &str) -> Result<PatternFlags, ConfigurationError> {
        let flag = match name {
            "i" | "case_insensitive" | "ignore_case" => PatternFlags::CASE_INSENSITIVE,
            "m" | "multi_line" => PatternFlags::MULTI_LINE,
            "s" | "dot_matches_newline" | "dotall" => PatternFlags::DOT_MATCHES_NEWLINE,
            "x" | "ignore_whitespace" | "verbose" => PatternFlags::IGNORE_WHITESPACE,
            "U" | "swap_greed" => PatternFlags::SWAP_GREED,
            other => return Err(ConfigurationError::new(ConfigurationErrorKind::UnknownFlag(other.to_string()))),
        };
        Ok(flag)
    }

    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> Result<PatternFlags, ConfigurationError> {
        names.iter().try_fold(PatternFlags::empty(), |acc, n| Ok(acc | PatternFlags::parse_one(n.as_ref())?))
    }
}

/// Where a pattern is pinned inside the text it is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    None,
    Start,
    End,
}

/// A compiled expression and the names of its capture groups.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
    group_names: Vec<String>,
    flags: PatternFlags,
    anchor: Anchor,
}

impl Pattern {
    /// Compile `expression`. `group_names` must have one entry per capturing
    /// group (group 0, the whole match, is not counted).
    pub fn compile<S: Into<String>>(
        expression: &str,
        group_names: impl IntoIterator<Item = S>,
        flags: PatternFlags,
    ) -> Result<Pattern, ConfigurationError> {
        let group_names: Vec<String> = group_names.into_iter().map(Into::into).collect();
        let regex = build_regex(expression, Anchor::None, flags)?;
        let expected = regex.captures_len() - 1;
        if expected != group_names.len() {
            return Err(ConfigurationError::group_count_mismatch(expected, group_names.len()));
        }
        Ok(Pattern { source: expression.to_string(), regex, group_names, flags, anchor: Anchor::None })
    }

    /// Recompile this pattern pinned to the start or end of the text.
    ///
    /// The original expression is wrapped in a non-capturing group, so group
    /// numbering and names are unchanged.
    pub fn anchored(&self, anchor: Anchor) -> Result<Pattern, ConfigurationError> {
        if anchor == self.anchor {
            return Ok(self.clone());
        }
        let regex = build_regex(&self.source, anchor, self.flags)?;
        Ok(Pattern { source: self.source.clone(), regex, group_names: self.group_names.clone(), flags: self.flags, anchor })
    }

    /// The expression as written in the rule definition.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn group_names(&self) -> &[String] {
        &self.group_names
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Leftmost match in `text`, if any.
    pub fn try_match<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.regex.captures(text)
    }

    /// All non-overlapping matches in `text`, left to right.
    pub fn find_all<'r, 't>(&'r self, text: &'t str) -> CaptureMatches<'r, 't> {
        self.regex.captures_iter(text)
    }

    /// Span of each named group for one match, aligned with [`group_names`].
    ///
    /// [`group_names`]: Pattern::group_names
    pub(crate) fn group_spans(&self, caps: &Captures<'_>) -> Vec<Option<Span>> {
        (1..=self.group_names.len()).map(|i| caps.get(i).map(|m| Span::new(m.start(), m.end()))).collect()
    }
}

fn build_regex(expression: &str, anchor: Anchor, flags: PatternFlags) -> Result<Regex, ConfigurationError> {
    let wrapped;
    let expr = match anchor {
        Anchor::None => expression,
        Anchor::Start => {
            wrapped = format!(r"\A(?:{expression})");
            &wrapped
        }
        Anchor::End => {
            wrapped = format!(r"(?:{expression})\z");
            &wrapped
        }
    };

    RegexBuilder::new(expr)
        .case_insensitive(flags.contains(PatternFlags::CASE_INSENSITIVE))
        .multi_line(flags.contains(PatternFlags::MULTI_LINE))
        .dot_matches_new_line(flags.contains(PatternFlags::DOT_MATCHES_NEWLINE))
        .ignore_whitespace(flags.contains(PatternFlags::IGNORE_WHITESPACE))
        .swap_greed(flags.contains(PatternFlags::SWAP_GREED))
        .build()
        .map_err(|source| {
            ConfigurationError::new(ConfigurationErrorKind::InvalidPattern { expression: expression.to_string(), source })
        })
}
