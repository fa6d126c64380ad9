//! Plugins shipped with the crate.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde_json::{Value, json};

use super::{Analyzer, Plugin, TokenProcessor};
use crate::Token;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn speaker(token: &Token) -> &str {
    let md = token.metadata();
    md.get("user_name").or_else(|| md.get("speaker")).unwrap_or("unknown")
}

/// Adds a `chars` field with the content length in characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCount;

impl Plugin for CharCount {
    fn id(&self) -> &str {
        "char_count"
    }
}

impl TokenProcessor for CharCount {
    fn process(&self, token: Token) -> Token {
        token.with_metadata("chars", token.content().chars().count().to_string())
    }
}

/// Counts dice commands per speaker and the die sizes they mention.
///
/// Only counts; rolls are never resolved.
#[derive(Debug, Clone)]
pub struct DiceStats {
    /// Token type of dice commands (`.r 1d20`).
    pub command_type: String,
    /// Token type of reported results (`[d20 = 18]`).
    pub result_type: String,
}

impl Default for DiceStats {
    fn default() -> Self {
        DiceStats { command_type: "dice_order".to_string(), result_type: "dice_roll".to_string() }
    }
}

impl Plugin for DiceStats {
    fn id(&self) -> &str {
        "dice_stats"
    }
}

impl Analyzer for DiceStats {
    fn analyze(&self, tokens: &[Token]) -> Value {
        let mut commands = 0usize;
        let mut results = 0usize;
        let mut by_speaker: BTreeMap<&str, usize> = BTreeMap::new();
        let mut sizes: BTreeMap<String, usize> = BTreeMap::new();

        for token in tokens {
            if token.kind() == self.command_type {
                commands += 1;
                *by_speaker.entry(speaker(token)).or_default() += 1;
                for caps in regex!(r"(\d*)[dD](\d+)").captures_iter(token.content()) {
                    *sizes.entry(format!("d{}", &caps[2])).or_default() += 1;
                }
            } else if token.kind() == self.result_type {
                results += 1;
                if let Some(size) = token.metadata().get("dice_type") {
                    *sizes.entry(format!("d{size}")).or_default() += 1;
                }
            }
        }

        json!({
            "commands": commands,
            "results": results,
            "by_speaker": by_speaker,
            "dice_sizes": sizes,
        })
    }
}

/// First and last timestamp of a session and the time between them.
///
/// Reads the `time` (or `timestamp`) field in `YYYY-MM-DD HH:MM:SS` form;
/// tokens without a parsable time are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionClock;

impl Plugin for SessionClock {
    fn id(&self) -> &str {
        "session_clock"
    }
}

impl Analyzer for SessionClock {
    fn analyze(&self, tokens: &[Token]) -> Value {
        let times: Vec<NaiveDateTime> = tokens
            .iter()
            .filter_map(|t| t.metadata().get("time").or_else(|| t.metadata().get("timestamp")))
            .filter_map(|raw| NaiveDateTime::parse_from_str(raw, TIME_FORMAT).ok())
            .collect();

        let (Some(first), Some(last)) = (times.iter().min(), times.iter().max()) else {
            return json!({ "first": null, "last": null, "duration_seconds": 0, "timed_tokens": 0 });
        };

        json!({
            "first": first.format(TIME_FORMAT).to_string(),
            "last": last.format(TIME_FORMAT).to_string(),
            "duration_seconds": (*last - *first).num_seconds(),
            "timed_tokens": times.len(),
        })
    }
}
