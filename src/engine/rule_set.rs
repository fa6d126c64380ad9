//! Rule ordering.
//!
//! A [`RuleSet`] is the static side of the engine: it is built once from
//! configuration, sorted into a single total order and never edited again.
//! Every line tokenized against it sees the same order, which is what makes
//! conflict resolution deterministic.
//!
//! ## Priority direction
//!
//! Rule files in the wild disagree on whether a small priority number means
//! "more important" or "less important". The engine takes no side: the
//! direction is a [`PriorityOrder`] chosen by whoever builds the set.
//!
//! ```text
//! LowerFirst:   [dice 1] [action 2] [speech 4] [narration 100]
//! HigherFirst:  [dice 90] [speech 60] [narration 1]
//! ```
//!
//! Ties are broken by declaration order (the sort is stable).
//!
//! ## Invariants
//!
//! - `rules[i]` has rank `i`; ranks are what candidates carry around.
//! - The set owns its rules; two sets never share one.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rule::Rule;

/// Which end of the priority scale wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityOrder {
    /// Smaller numbers take precedence.
    #[default]
    #[serde(alias = "ascending")]
    LowerFirst,
    /// Larger numbers take precedence.
    #[serde(alias = "descending")]
    HigherFirst,
}

impl PriorityOrder {
    /// `Less` means `a` takes precedence over `b`.
    pub fn compare(self, a: i64, b: i64) -> Ordering {
        match self {
            PriorityOrder::LowerFirst => a.cmp(&b),
            PriorityOrder::HigherFirst => b.cmp(&a),
        }
    }
}

/// Immutable, priority-sorted rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    order: PriorityOrder,
}

impl RuleSet {
    /// Sort `rules` by `order`, keeping declaration order among equal priorities.
    pub fn new(mut rules: Vec<Rule>, order: PriorityOrder) -> Self {
        rules.sort_by(|a, b| order.compare(a.priority(), b.priority()));

        debug!(
            rules = rules.len(),
            order = ?order,
            ranking = ?rules.iter().map(|r| r.type_name()).collect::<Vec<_>>(),
            "rule set built"
        );

        RuleSet { rules, order }
    }

    pub fn empty() -> Self {
        RuleSet { rules: Vec::new(), order: PriorityOrder::default() }
    }

    /// Rules in precedence order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn order(&self) -> PriorityOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Distinct token types, in precedence order.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for rule in &self.rules {
            if !names.contains(&rule.type_name()) {
                names.push(rule.type_name());
            }
        }
        names
    }
}
