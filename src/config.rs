//! Rule files.
//!
//! A rule file is a JSON document describing the metadata extractor and the
//! content rules:
//!
//! ```json
//! {
//!   "priority_order": "lower_first",
//!   "metadata": { "patterns": ["(\\S+?)\\((\\d+)\\)\\s+(.+?)\\s+"], "groups": ["user_name", "user_id", "time"] },
//!   "rules": [
//!     { "type": "action", "match_type": "prefix", "priority": 2, "patterns": ["^#(.+)"], "groups": ["content"] }
//!   ]
//! }
//! ```
//!
//! `metadata` may also be a list of definitions, and `rules` may be spelled
//! `content`. Unknown keys (such as a `type` or `priority` on a metadata
//! definition) are ignored.
//!
//! Loading is two-step: [`RuleFile`] is the plain deserialized document and
//! [`RuleFile::build`] compiles it. Every compilation error names the rule and
//! pattern it came from.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    ConfigurationError, Error, LogTokenizer, MatchStrategy, MetadataExtractor, Pattern, PatternFlags, PriorityOrder, Rule,
    RuleSet,
};

/// One content rule as written in a rule file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDef {
    #[serde(rename = "type")]
    pub kind: String,
    pub match_type: MatchStrategy,
    #[serde(default)]
    pub priority: i64,
    pub patterns: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
}

impl RuleDef {
    pub fn build(&self) -> Result<Rule, ConfigurationError> {
        let flags = PatternFlags::parse_all(&self.flags).map_err(|e| e.in_rule(self.kind.as_str()))?;
        let patterns = compile_all(&self.patterns, &self.groups, flags, 0).map_err(|e| e.in_rule(self.kind.as_str()))?;
        Rule::new(self.kind.as_str(), self.match_type, self.priority, patterns)
    }
}

/// One metadata form. All of its patterns share `groups`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDef {
    pub patterns: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
}

/// A deserialized rule file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFile {
    #[serde(default)]
    pub priority_order: PriorityOrder,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataDef>,
    #[serde(default, alias = "content")]
    pub rules: Vec<RuleDef>,
}

impl RuleFile {
    pub fn from_json_str(text: &str) -> Result<RuleFile, Error> {
        serde_json::from_str(text).map_err(Error::RuleFile)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<RuleFile, Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        RuleFile::from_json_str(&text)
    }

    /// Read, parse and compile a rule file in one go.
    pub fn load(path: impl AsRef<Path>) -> Result<LogTokenizer, Error> {
        Ok(RuleFile::from_path(path)?.build()?)
    }

    /// Compile using the file's own priority order.
    pub fn build(&self) -> Result<LogTokenizer, ConfigurationError> {
        self.build_with_order(self.priority_order)
    }

    /// Compile with an explicit priority order, ignoring the file's.
    pub fn build_with_order(&self, order: PriorityOrder) -> Result<LogTokenizer, ConfigurationError> {
        let extractor = self.build_metadata()?;
        let rules = self.rules.iter().map(RuleDef::build).collect::<Result<Vec<_>, _>>()?;
        Ok(LogTokenizer::new(extractor, RuleSet::new(rules, order)))
    }

    /// `None` when the file declares no metadata forms.
    fn build_metadata(&self) -> Result<Option<MetadataExtractor>, ConfigurationError> {
        if self.metadata.is_empty() {
            return Ok(None);
        }

        let mut patterns = Vec::new();
        for def in &self.metadata {
            let flags = PatternFlags::parse_all(&def.flags).map_err(|e| e.in_rule("metadata"))?;
            let compiled = compile_all(&def.patterns, &def.groups, flags, patterns.len()).map_err(|e| e.in_rule("metadata"))?;
            patterns.extend(compiled);
        }
        MetadataExtractor::new(patterns).map(Some).map_err(|e| e.in_rule("metadata"))
    }
}

/// Compile `exprs` with shared group names; error indices start at `first_index`.
fn compile_all(
    exprs: &[String],
    groups: &[String],
    flags: PatternFlags,
    first_index: usize,
) -> Result<Vec<Pattern>, ConfigurationError> {
    exprs
        .iter()
        .enumerate()
        .map(|(i, expr)| Pattern::compile(expr, groups.iter().cloned(), flags).map_err(|e| e.at_pattern(first_index + i)))
        .collect()
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(def)) => vec![def],
        Some(OneOrMany::Many(defs)) => defs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigurationErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn group_count_mismatch_fails_at_load_time() {
        let file = RuleFile::from_json_str(
            r#"{
                "rules": [
                    { "type": "speech", "match_type": "enclosed", "priority": 1, "patterns": ["\"([^\"]*)\""], "groups": ["content"] },
                    { "type": "dice_roll", "match_type": "enclosed", "priority": 2,
                      "patterns": ["\\[d(\\d+)\\s*=\\s*(\\d+)\\]"], "groups": ["dice_type"] }
                ]
            }"#,
        )
        .unwrap();

        let err = file.build().unwrap_err();
        assert!(matches!(err.kind, ConfigurationErrorKind::GroupCountMismatch { expected: 2, actual: 1 }));
        let ctx = err.context.unwrap();
        assert_eq!(ctx.rule_type, "dice_roll");
        assert_eq!(ctx.pattern_index, Some(0));
    }

    #[test]
    fn bad_regex_names_rule_and_pattern() {
        let file = RuleFile::from_json_str(
            r#"{ "rules": [ { "type": "ooc", "match_type": "enclosed", "patterns": ["\\((.*)\\)", "((("], "groups": ["content"] } ] }"#,
        )
        .unwrap();
        let err = file.build().unwrap_err();
        assert!(matches!(err.kind, ConfigurationErrorKind::InvalidPattern { .. }));
        assert!(err.to_string().ends_with("(rule `ooc`, pattern #1)"), "{err}");
    }

    #[test]
    fn unknown_flag_is_a_configuration_error() {
        let file = RuleFile::from_json_str(
            r#"{ "rules": [ { "type": "ooc", "match_type": "enclosed", "patterns": ["(x)"], "groups": ["content"], "flags": ["z"] } ] }"#,
        )
        .unwrap();
        let err = file.build().unwrap_err();
        assert!(matches!(err.kind, ConfigurationErrorKind::UnknownFlag(ref f) if f == "z"));
        assert_eq!(err.context.unwrap().rule_type, "ooc");
    }

    #[test]
    fn malformed_json_is_a_rule_file_error() {
        let err = RuleFile::from_json_str("{ rules: [] }").unwrap_err();
        assert!(matches!(err, Error::RuleFile(_)));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = RuleFile::from_path("no/such/rules.json").unwrap_err();
        match err {
            Error::Io { path, .. } => assert_eq!(path, Path::new("no/such/rules.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn accepts_legacy_shape() {
        let file = RuleFile::from_json_str(
            r#"{
                "priority_order": "descending",
                "metadata": [{
                    "type": "metadata",
                    "patterns": ["^\\[(.+?)\\]\\s*<(.+?)>\\s*(.*)$"],
                    "groups": ["timestamp", "speaker", "content"],
                    "priority": 100
                }],
                "content": [
                    { "type": "dice_roll", "match_type": "enclosed", "priority": 90,
                      "patterns": ["\\[d(\\d+)\\s*=\\s*(\\d+)\\]"], "groups": ["dice_type", "result"] },
                    { "type": "dialogue", "match_type": "enclosed", "priority": 60,
                      "patterns": ["「(.+?)」"], "groups": ["content"] },
                    { "type": "text", "match_type": "prefix", "priority": 1,
                      "patterns": ["^(.+)$"], "groups": ["text_content"] }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(file.priority_order, PriorityOrder::HigherFirst);
        assert_eq!(file.metadata.len(), 1);

        let tokenizer = file.build().unwrap();
        assert_eq!(tokenizer.rules().type_names(), ["dice_roll", "dialogue", "text"]);

        let log = "[2025-10-24 14:30:01] <艾莉娅> 「我要检查这扇门」\n\
                   [2025-10-24 14:30:05] <DiceBot> 检定结果: [d20 = 18]\n\
                   [2025-10-24 14:30:10] <DM> 你发现了陷阱";
        let batches: Vec<_> = tokenizer.tokenize_text(log).collect();
        assert_eq!(batches.len(), 3);

        assert_eq!(batches[0].metadata.get("speaker"), Some("艾莉娅"));
        let kinds: Vec<&str> = batches[0].tokens.iter().map(|t| t.kind()).collect();
        assert_eq!(kinds, ["dialogue"]);
        assert_eq!(batches[0].tokens[0].content(), "我要检查这扇门");

        let dice = &batches[1].tokens[0];
        assert_eq!(dice.kind(), "dice_roll");
        assert_eq!(dice.metadata().get("result"), Some("18"));
        assert_eq!(dice.metadata().get("speaker"), Some("DiceBot"));

        let text = &batches[2].tokens[0];
        assert_eq!((text.kind(), text.content()), ("text", "你发现了陷阱"));
    }

    #[test]
    fn explicit_order_overrides_the_file() {
        let file = RuleFile::from_json_str(
            r#"{ "priority_order": "higher_first", "rules": [
                { "type": "a", "match_type": "enclosed", "priority": 1, "patterns": ["(x)"], "groups": ["content"] },
                { "type": "b", "match_type": "enclosed", "priority": 2, "patterns": ["(x)"], "groups": ["content"] }
            ] }"#,
        )
        .unwrap();
        assert_eq!(file.build().unwrap().line_tokenizer().tokenize("x")[0].kind(), "b");
        assert_eq!(file.build_with_order(PriorityOrder::LowerFirst).unwrap().line_tokenizer().tokenize("x")[0].kind(), "a");
    }

    #[test]
    fn single_metadata_definition_is_accepted() {
        let file = RuleFile::from_json_str(
            r#"{ "metadata": { "patterns": ["<(.+?)>\\s*"], "groups": ["user_name"] }, "rules": [] }"#,
        )
        .unwrap();
        let tokenizer = file.build().unwrap();
        let batch = tokenizer.tokenize_line(1, "<DM> hello");
        assert_eq!(batch.speaker(), Some("DM"));
        assert!(batch.tokens.is_empty());
        assert_eq!(batch.residual[0].text, "hello");
    }

    #[test]
    fn bundled_rule_file_builds() {
        let file = RuleFile::from_json_str(include_str!("../rules/qq_log.json")).unwrap();
        let tokenizer = file.build().unwrap();
        let batch = tokenizer.tokenize_line(1, "Name(123456) 2025-01-27 19:58:15 #draws a sword");
        assert_eq!(batch.metadata.get("user_id"), Some("123456"));
        assert_eq!(batch.tokens[0].kind(), "action");
        assert_eq!(batch.tokens[0].content(), "draws a sword");

        let ooc = tokenizer.line_tokenizer().tokenize("OOC: brb");
        assert_eq!((ooc[0].kind(), ooc[0].content()), ("ooc", "brb"));

        let mixed = tokenizer.line_tokenizer().tokenize(r#"she nods "fine" and leaves"#);
        let kinds: Vec<(&str, &str)> = mixed.iter().map(|t| (t.kind(), t.content())).collect();
        assert_eq!(kinds, [("narration", "she nods"), ("speech", "fine"), ("narration", "and leaves")]);
    }

    #[test]
    fn bundled_bracket_rule_file_builds() {
        let file = RuleFile::from_json_str(include_str!("../rules/bracket_log.json")).unwrap();
        assert_eq!(file.priority_order, PriorityOrder::HigherFirst);
        let batch = file.build().unwrap().tokenize_line(1, "[2025-10-24 14:30:10] <DM> 你发现了陷阱");
        assert_eq!(batch.speaker(), Some("DM"));
        assert_eq!(batch.time(), Some("2025-10-24 14:30:10"));
        assert_eq!(batch.tokens[0].kind(), "text");
        assert_eq!(batch.tokens[0].content(), "你发现了陷阱");
    }
}
