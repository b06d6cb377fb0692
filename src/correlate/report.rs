//! Classification produced by a correlation run.
//!
//! Every item ends up in exactly one of: close match, far match, unmatched.
//! Every indexed element ends up in exactly one of: claimed, standalone,
//! unmatched. Distances are carried along so formatters never recompute them.

use crate::config::MatchOptions;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// An element chosen for an item.
#[derive(Debug)]
pub struct MatchedPair<'a, E, I> {
    pub element_id: usize,
    pub element: &'a E,
    /// Position of the item in the input slice.
    pub item_index: usize,
    pub item: &'a I,
    pub distance: f64,
    /// Set when `distance` exceeds the match distance.
    pub far: bool,
}

impl<E, I> Clone for MatchedPair<'_, E, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, I> Copy for MatchedPair<'_, E, I> {}

/// Why an item was left without an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchReason {
    /// Nothing was indexed within the unmatch distance.
    NoCandidates,
    /// Candidates existed but the match predicate accepted none of them.
    Rejected,
    /// Every accepted candidate had already been claimed by an earlier item.
    Claimed,
}

#[derive(Debug)]
pub struct UnmatchedItem<'a, I> {
    pub item_index: usize,
    pub item: &'a I,
    pub reason: UnmatchReason,
    /// Distance to the closest candidate, when there was one.
    pub nearest_distance: Option<f64>,
}

impl<I> Clone for UnmatchedItem<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I> Copy for UnmatchedItem<'_, I> {}

/// An indexed element that no item claimed.
#[derive(Debug)]
pub struct UnclaimedElement<'a, E> {
    pub element_id: usize,
    pub element: &'a E,
}

impl<E> Clone for UnclaimedElement<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for UnclaimedElement<'_, E> {}

/// Bucket sizes of a run, for logging and report headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationStats {
    pub items: usize,
    pub elements: usize,
    pub close_matches: usize,
    pub far_matches: usize,
    pub unmatched_items: usize,
    pub no_candidates: usize,
    pub rejected: usize,
    pub claimed: usize,
    pub unmatched_elements: usize,
    pub standalone_elements: usize,
}

/// Result of [`Correlator::correlate`](crate::Correlator::correlate).
#[derive(Debug)]
pub struct Correlation<'a, E, I> {
    pub(crate) options: MatchOptions,
    pub(crate) item_count: usize,
    pub(crate) element_count: usize,
    pub(crate) matches: Vec<MatchedPair<'a, E, I>>,
    pub(crate) claims: FxHashMap<usize, usize>,
    pub(crate) unmatched_items: Vec<UnmatchedItem<'a, I>>,
    pub(crate) unmatched_elements: Vec<UnclaimedElement<'a, E>>,
    pub(crate) standalone_elements: Vec<UnclaimedElement<'a, E>>,
}

impl<'a, E, I> Correlation<'a, E, I> {
    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// All matched pairs, close and far, in item order.
    pub fn matches(&self) -> &[MatchedPair<'a, E, I>] {
        &self.matches
    }

    pub fn close_matches(&self) -> impl Iterator<Item = &MatchedPair<'a, E, I>> {
        self.matches.iter().filter(|m| !m.far)
    }

    pub fn far_matches(&self) -> impl Iterator<Item = &MatchedPair<'a, E, I>> {
        self.matches.iter().filter(|m| m.far)
    }

    /// Items left without an element, in item order.
    pub fn unmatched_items(&self) -> &[UnmatchedItem<'a, I>] {
        &self.unmatched_items
    }

    /// Unclaimed elements the standalone predicate did not exempt, in id order.
    pub fn unmatched_elements(&self) -> &[UnclaimedElement<'a, E>] {
        &self.unmatched_elements
    }

    /// Unclaimed elements exempted by the standalone predicate, in id order.
    pub fn standalone_elements(&self) -> &[UnclaimedElement<'a, E>] {
        &self.standalone_elements
    }

    /// The pair that claimed `element_id`, if any.
    pub fn claimed_by(&self, element_id: usize) -> Option<&MatchedPair<'a, E, I>> {
        self.claims
            .get(&element_id)
            .map(|&position| &self.matches[position])
    }

    pub fn is_claimed(&self, element_id: usize) -> bool {
        self.claims.contains_key(&element_id)
    }

    pub fn stats(&self) -> CorrelationStats {
        let far_matches = self.matches.iter().filter(|m| m.far).count();
        let count = |reason| {
            self.unmatched_items
                .iter()
                .filter(|u| u.reason == reason)
                .count()
        };

        CorrelationStats {
            items: self.item_count,
            elements: self.element_count,
            close_matches: self.matches.len() - far_matches,
            far_matches,
            unmatched_items: self.unmatched_items.len(),
            no_candidates: count(UnmatchReason::NoCandidates),
            rejected: count(UnmatchReason::Rejected),
            claimed: count(UnmatchReason::Claimed),
            unmatched_elements: self.unmatched_elements.len(),
            standalone_elements: self.standalone_elements.len(),
        }
    }
}
