//! Built-in rule set.
//!
//! Covers the two log layouts most session logs come in (QQ-style
//! `Name(id) date time` headers and `[time] <name>` headers) and the usual
//! in-line conventions:
//!
//! | type         | strategy | priority | surface form                      |
//! |--------------|----------|----------|-----------------------------------|
//! | `dice_order` | prefix   | 1        | `.ra 侦查`, `。r 1d100`           |
//! | `dice_roll`  | enclosed | 2        | `[d20 = 18]`                      |
//! | `action`     | prefix   | 3        | `#draws a sword`, `＃拔剑`        |
//! | `ooc`        | enclosed | 4        | `(brb)`, `（笑）`                 |
//! | `speech`     | enclosed | 5        | `"..."`, `“...”`, `「...」`       |
//! | `thought`    | enclosed | 6        | `【...】`                         |
//! | `narration`  | enclosed | 100      | text between the forms above      |
//!
//! Lower numbers win. `narration` matches every run of text free of the
//! delimiters above, trimmed of surrounding whitespace, so on mixed
//! lines it fills the gaps around the other tokens. Whitespace and unpaired
//! delimiters are left as residual.

use once_cell::sync::Lazy;

use crate::config::RuleFile;
use crate::{LogTokenizer, PriorityOrder};

static DEFAULT_TOKENIZER: Lazy<LogTokenizer> =
    Lazy::new(|| default_rule_file().build().expect("built-in rules are valid"));

/// The built-in rules as a [`RuleFile`], e.g. to dump as a starting point.
pub fn default_rule_file() -> RuleFile {
    RuleFile {
        priority_order: PriorityOrder::LowerFirst,
        metadata: vec![
            metadata_def! {
                patterns: [r"(\S+?)\((\d+)\)\s+(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\s*"],
                groups: ["user_name", "user_id", "time"],
            },
            metadata_def! {
                patterns: [r"\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\]\s*<([^>]+)>\s*"],
                groups: ["time", "user_name"],
            },
        ],
        rules: vec![
            // A doubled marker ("...", "。。") is punctuation, not a command.
            rule_def! {
                kind: "dice_order",
                match_type: Prefix,
                priority: 1,
                patterns: [r"^[.。]([^.。].*)"],
                groups: ["content"],
            },
            rule_def! {
                kind: "dice_roll",
                match_type: Enclosed,
                priority: 2,
                patterns: [r"\[d(\d+)\s*=\s*(\d+)\]"],
                groups: ["dice_type", "result"],
            },
            rule_def! {
                kind: "action",
                match_type: Prefix,
                priority: 3,
                patterns: [r"^[#＃](.+)"],
                groups: ["content"],
            },
            rule_def! {
                kind: "ooc",
                match_type: Enclosed,
                priority: 4,
                patterns: [r"\(([^()]*)\)|（([^（）]*)）"],
                groups: ["content", "content"],
            },
            rule_def! {
                kind: "speech",
                match_type: Enclosed,
                priority: 5,
                patterns: [r#""([^"]*)"|“([^”]*)”|「([^」]*)」"#],
                groups: ["content", "content", "content"],
            },
            rule_def! {
                kind: "thought",
                match_type: Enclosed,
                priority: 6,
                patterns: [r"【([^】]*)】"],
                groups: ["content"],
            },
            rule_def! {
                kind: "narration",
                match_type: Enclosed,
                priority: 100,
                patterns: [r#"([^\s"“”「」()（）【】\[\]](?:[^"“”「」()（）【】\[\]]*[^\s"“”「」()（）【】\[\]])?)"#],
                groups: ["content"],
            },
        ],
    }
}

/// The compiled built-in rules, shared by the whole process.
pub fn default_tokenizer() -> &'static LogTokenizer {
    &DEFAULT_TOKENIZER
}
