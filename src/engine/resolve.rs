//! Conflict resolution.
//!
//! Every rule reports its candidates independently, so the same bytes of a line
//! can be claimed more than once. Resolution is a greedy sweep in priority
//! order:
//!
//! ```text
//! line:      ."roll" #attack
//! dice  (1)  [===============)   accepted
//! speech(4)   [=====)            rejected, overlaps dice
//! ```
//!
//! A candidate is accepted iff it does not overlap any span accepted before it.
//! Candidates are visited by rule rank first (the rule set's total order, ties
//! already broken by declaration order) and by start offset within one rule.
//! Text position never decides which rule wins a span; it only decides the
//! order in which the winners are emitted.

use tracing::trace;

use super::rule::MatchCandidate;
use crate::Span;

/// Winners of one line, sorted by start offset.
#[derive(Debug)]
pub(crate) struct Resolution<'r> {
    pub accepted: Vec<MatchCandidate<'r>>,
    pub rejected: usize,
}

pub(crate) fn resolve_conflicts(mut candidates: Vec<MatchCandidate<'_>>) -> Resolution<'_> {
    candidates.sort_by_key(|c| (c.rank, c.span.start));

    // Kept sorted by start; accepted spans are pairwise disjoint.
    let mut taken: Vec<Span> = Vec::new();
    let mut accepted: Vec<MatchCandidate<'_>> = Vec::new();
    let mut rejected = 0;

    for candidate in candidates {
        let at = taken.partition_point(|s| s.start < candidate.span.start);
        let hits_prev = at > 0 && taken[at - 1].overlaps(&candidate.span);
        let hits_next = at < taken.len() && taken[at].overlaps(&candidate.span);

        if hits_prev || hits_next {
            trace!(
                rule = candidate.rule.type_name(),
                start = candidate.span.start,
                end = candidate.span.end,
                "candidate rejected: span already claimed"
            );
            rejected += 1;
            continue;
        }

        taken.insert(at, candidate.span);
        accepted.push(candidate);
    }

    accepted.sort_by_key(|c| c.span.start);
    Resolution { accepted, rejected }
}

/// Gaps of `[0, len)` not covered by `covered` (sorted, disjoint).
pub(crate) fn uncovered(len: usize, covered: impl IntoIterator<Item = Span>) -> Vec<Span> {
    let mut gaps = Vec::new();
    let mut cursor = 0;
    for span in covered {
        if span.start > cursor {
            gaps.push(Span::new(cursor, span.start));
        }
        cursor = cursor.max(span.end);
    }
    if cursor < len {
        gaps.push(Span::new(cursor, len));
    }
    gaps
}
