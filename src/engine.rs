//! Tokenization engine.
//!
//! The engine is split into focused submodules under `src/engine/`, all
//! re-exported from here so public paths stay flat (`rollscribe::Rule`,
//! `rollscribe::LogTokenizer`, ...).
//!
//! ## How the parts work together
//!
//! ```text
//! rule defs ──▶ Pattern::compile          (pattern.rs)
//!                 │ group count checked against declared names
//!                 ▼
//!               Rule::new                 (rule.rs)
//!                 │ patterns anchored per match strategy
//!                 ▼
//!               RuleSet::new              (rule_set.rs)
//!                   stable sort by priority
//!
//! log line ──▶ MetadataExtractor::extract (metadata.rs)
//!                 │ metadata + remainder @ offset
//!                 ▼
//!               LineTokenizer             (line.rs)
//!                 - every rule proposes candidates
//!                 - resolve_conflicts      (resolve.rs)
//!                 - winners ─▶ Tokens, gaps ─▶ Residual
//!                 │
//!                 ▼
//!               LogTokenizer              (log.rs)
//!                   offsets shifted, metadata attached ─▶ LineBatch
//! ```
//!
//! Everything compiled is immutable after construction. A [`LogTokenizer`] is
//! `Send + Sync` and can be shared across threads; swapping in a new rule set
//! means building a new tokenizer.
//!
//! ## Responsibilities by module
//!
//! - `pattern.rs`: regex compilation, flags and anchoring.
//! - `rule.rs`: match strategies and per-rule candidate generation.
//! - `rule_set.rs`: precedence order over rules.
//! - `resolve.rs`: the greedy overlap sweep and residual gaps.
//! - `line.rs` / `log.rs`: single-line and whole-log drivers.
//! - `metadata.rs`: the line-prefix metadata extractor.
//! - `metrics.rs`: optional counters and timings.
//!
//! ## Debugging
//!
//! Set `ROLLSCRIBE_LOG=rollscribe=trace` when running the CLI to see every
//! rejected candidate.

#[path = "engine/line.rs"]
mod line;
#[path = "engine/log.rs"]
mod log;
#[path = "engine/metadata.rs"]
mod metadata;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/pattern.rs"]
mod pattern;
#[path = "engine/resolve.rs"]
mod resolve;
#[path = "engine/rule.rs"]
mod rule;
#[path = "engine/rule_set.rs"]
mod rule_set;

pub use line::{LineTokenizer, LineTokens, Residual};
pub use log::{Batches, LineBatch, LogTokenizer};
pub use metadata::{Extraction, MetadataExtractor};
pub use metrics::{LineMetrics, LogMetrics};
pub use pattern::{Anchor, Pattern, PatternFlags};
pub use rule::{MatchCandidate, MatchStrategy, Rule};
pub use rule_set::{PriorityOrder, RuleSet};
