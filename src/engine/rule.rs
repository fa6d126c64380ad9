//! Rules and match strategies.
//!
//! A [`Rule`] names a token type and owns one or more alternative [`Pattern`]s.
//! How those patterns are pinned to the line is decided by its
//! [`MatchStrategy`]:
//!
//! ```text
//! Prefix    "#draws a sword"          \A(?:pattern)   at most one candidate
//!            ^^^^^^^^^^^^^^
//! Suffix    "look around (afk)"       (?:pattern)\z   at most one candidate
//!                        ^^^^^
//! Enclosed  "\"hi\" she said \"bye\"" pattern         every occurrence
//!            ^^^^          ^^^^^
//! ```
//!
//! Patterns are alternatives for the same rule (e.g. ASCII vs. full-width
//! markers). They are tried in declaration order and the first one that matches
//! supplies the rule's candidates.

use serde::{Deserialize, Serialize};

use super::pattern::{Anchor, Pattern};
use crate::{ConfigurationError, Metadata, Span, Token};

/// Group name whose captures become the token's content.
pub(crate) const CONTENT_GROUP: &str = "content";

/// How a rule's patterns are anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    Prefix,
    Suffix,
    Enclosed,
}

impl MatchStrategy {
    fn anchor(self) -> Anchor {
        match self {
            MatchStrategy::Prefix => Anchor::Start,
            MatchStrategy::Suffix => Anchor::End,
            MatchStrategy::Enclosed => Anchor::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchStrategy::Prefix => "prefix",
            MatchStrategy::Suffix => "suffix",
            MatchStrategy::Enclosed => "enclosed",
        }
    }
}

/// One token type with its patterns and precedence.
#[derive(Debug, Clone)]
pub struct Rule {
    type_name: String,
    strategy: MatchStrategy,
    priority: i64,
    patterns: Vec<Pattern>,
}

impl Rule {
    /// Build a rule. Patterns are re-anchored for `strategy`.
    ///
    /// Errors carry the rule type and the index of the offending pattern.
    pub fn new(
        type_name: impl Into<String>,
        strategy: MatchStrategy,
        priority: i64,
        patterns: Vec<Pattern>,
    ) -> Result<Rule, ConfigurationError> {
        let type_name = type_name.into();
        if patterns.is_empty() {
            return Err(ConfigurationError::empty_patterns().in_rule(type_name));
        }

        let patterns = patterns
            .iter()
            .enumerate()
            .map(|(idx, p)| p.anchored(strategy.anchor()).map_err(|e| e.at_pattern(idx).in_rule(type_name.as_str())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Rule { type_name, strategy, priority, patterns })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// All candidates this rule produces on `line`.
    ///
    /// `rank` is the rule's position in its rule set and is copied onto every
    /// candidate. Zero-width matches are dropped.
    pub fn try_match<'r>(&'r self, line: &str, rank: usize) -> Vec<MatchCandidate<'r>> {
        for (pattern_index, pattern) in self.patterns.iter().enumerate() {
            let found = match self.strategy {
                MatchStrategy::Prefix | MatchStrategy::Suffix => match_single(pattern, line),
                MatchStrategy::Enclosed => match_enclosed(pattern, line),
            };
            if found.is_empty() {
                continue;
            }
            return found
                .into_iter()
                .map(|(span, groups)| MatchCandidate { span, groups, rule: self, rank, pattern_index })
                .collect();
        }
        Vec::new()
    }
}

type RawMatch = (Span, Vec<Option<Span>>);

/// Prefix and suffix patterns are already anchored, so the leftmost match is
/// the only one that can qualify.
fn match_single(pattern: &Pattern, line: &str) -> Vec<RawMatch> {
    pattern
        .try_match(line)
        .and_then(|caps| {
            let m = caps.get(0)?;
            (m.start() != m.end()).then(|| (Span::new(m.start(), m.end()), pattern.group_spans(&caps)))
        })
        .into_iter()
        .collect()
}

fn match_enclosed(pattern: &Pattern, line: &str) -> Vec<RawMatch> {
    pattern
        .find_all(line)
        .filter_map(|caps| {
            let m = caps.get(0)?;
            (m.start() != m.end()).then(|| (Span::new(m.start(), m.end()), pattern.group_spans(&caps)))
        })
        .collect()
}

/// One rule's match on one line. Lives only while that line is resolved.
#[derive(Debug, Clone)]
pub struct MatchCandidate<'r> {
    pub span: Span,
    /// Group spans aligned with the matching pattern's group names.
    pub groups: Vec<Option<Span>>,
    pub rule: &'r Rule,
    /// Position of `rule` in the rule set's priority order.
    pub rank: usize,
    pub pattern_index: usize,
}

impl MatchCandidate<'_> {
    fn group_names(&self) -> &[String] {
        self.rule.patterns[self.pattern_index].group_names()
    }

    /// Named group values that participated in the match, minus `content`.
    pub(crate) fn fields(&self, line: &str) -> Metadata {
        let mut md = Metadata::new();
        for (name, span) in self.group_names().iter().zip(&self.groups) {
            if name == CONTENT_GROUP {
                continue;
            }
            if let Some(span) = span {
                md.insert(name.as_str(), &line[span.start..span.end]);
            }
        }
        md
    }

    /// Spans of the `content` groups that participated. `None` when the
    /// pattern declares no `content` group at all.
    pub(crate) fn content_spans(&self) -> Option<Vec<Span>> {
        let names = self.group_names();
        if !names.iter().any(|n| n == CONTENT_GROUP) {
            return None;
        }
        Some(names.iter().zip(&self.groups).filter(|(n, _)| *n == CONTENT_GROUP).filter_map(|(_, s)| *s).collect())
    }

    /// Convert into a token: content groups joined in order (or the whole
    /// match when there are none), every other group as metadata.
    pub(crate) fn into_token(self, line: &str) -> Token {
        let content = match self.content_spans() {
            Some(spans) => spans.iter().map(|s| &line[s.start..s.end]).collect::<String>(),
            None => line[self.span.start..self.span.end].to_string(),
        };
        let metadata = self.fields(line);
        Token::new(self.rule.type_name.as_str(), content, self.span, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfigurationErrorKind, PatternFlags};

    fn rule(kind: &str, strategy: MatchStrategy, exprs: Vec<(&str, Vec<&str>)>) -> Rule {
        let patterns =
            exprs.into_iter().map(|(e, g)| Pattern::compile(e, g, PatternFlags::empty()).unwrap()).collect();
        Rule::new(kind, strategy, 0, patterns).unwrap()
    }

    #[test]
    fn rule_without_patterns_is_rejected() {
        let err = Rule::new("speech", MatchStrategy::Enclosed, 1, Vec::new()).unwrap_err();
        assert!(matches!(err.kind, ConfigurationErrorKind::EmptyPatterns));
        assert_eq!(err.context.unwrap().rule_type, "speech");
    }

    #[test]
    fn prefix_only_matches_at_line_start() {
        let r = rule("action", MatchStrategy::Prefix, vec![(r"#(.+)", vec!["content"])]);
        assert!(r.try_match("look #here", 0).is_empty());

        let found = r.try_match("#draws a sword", 0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].span, Span::new(0, 14));
        assert_eq!(found[0].clone().into_token("#draws a sword").content(), "draws a sword");
    }

    #[test]
    fn suffix_only_matches_at_line_end() {
        let r = rule("ooc", MatchStrategy::Suffix, vec![(r"\(([^()]*)\)", vec!["content"])]);
        assert!(r.try_match("(afk) be right back", 0).is_empty());

        let line = "(a) look around (afk)";
        let found = r.try_match(line, 0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].span, Span::new(16, 21));
    }

    #[test]
    fn enclosed_finds_every_occurrence() {
        let r = rule("speech", MatchStrategy::Enclosed, vec![(r#""([^"]*)""#, vec!["content"])]);
        let line = r#""hi" she said "bye""#;
        let spans: Vec<Span> = r.try_match(line, 0).iter().map(|c| c.span).collect();
        assert_eq!(spans, [Span::new(0, 4), Span::new(14, 19)]);
    }

    #[test]
    fn first_matching_pattern_wins() {
        let r = rule(
            "speech",
            MatchStrategy::Enclosed,
            vec![(r#""([^"]*)""#, vec!["content"]), (r"「([^」]*)」", vec!["content"])],
        );
        let found = r.try_match("「你好」 \"hi\"", 0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern_index, 0);

        let found = r.try_match("「你好」", 0);
        assert_eq!(found[0].pattern_index, 1);
        assert_eq!(found[0].clone().into_token("「你好」").content(), "你好");
    }

    #[test]
    fn alternation_joins_participating_content_groups() {
        let r = rule("speech", MatchStrategy::Enclosed, vec![(r#""([^"]*)"|「([^」]*)」"#, vec!["content", "content"])]);
        let line = "「你好」 \"hi\"";
        let contents: Vec<String> =
            r.try_match(line, 0).into_iter().map(|c| c.into_token(line).content().to_string()).collect();
        assert_eq!(contents, ["你好", "hi"]);
    }

    #[test]
    fn non_content_groups_become_metadata() {
        let r =
            rule("dice_roll", MatchStrategy::Enclosed, vec![(r"\[d(\d+)\s*=\s*(\d+)\]", vec!["dice_type", "result"])]);
        let line = "检定结果: [d20 = 18]";
        let token = r.try_match(line, 0).remove(0).into_token(line);
        assert_eq!(token.content(), "[d20 = 18]");
        assert_eq!(token.metadata().get("dice_type"), Some("20"));
        assert_eq!(token.metadata().get("result"), Some("18"));
    }

    #[test]
    fn zero_width_matches_are_skipped() {
        let r = rule("noise", MatchStrategy::Enclosed, vec![(r"x*", vec![])]);
        let found = r.try_match("abxxc", 0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].span, Span::new(2, 4));
    }

    #[test]
    fn empty_content_group_yields_empty_content() {
        let r = rule("speech", MatchStrategy::Enclosed, vec![(r#""([^"]*)""#, vec!["content"])]);
        let token = r.try_match(r#"she said """#, 0).remove(0).into_token(r#"she said """#);
        assert_eq!(token.content(), "");
        assert_eq!(token.span(), Span::new(9, 11));
    }
}
