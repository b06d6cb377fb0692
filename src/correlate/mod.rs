//! Proximity correlation between an indexed element set and a list of items.
//!
//! Each item, in input order, takes the first candidate (nearest first,
//! within the unmatch distance) that its match predicate accepts and that no
//! earlier item has claimed. Claims are never revisited: this is a greedy
//! first-fit policy, not an optimal assignment. A second pass collects the
//! elements nobody claimed and splits them into unmatched and standalone.
//!
//! ```rust
//! use spatio_correlate::{ChunkIndex, Correlator, MatchOptions};
//!
//! let mut shops = ChunkIndex::new(vec![(0.0, 3.0), (50.0, 50.0)]);
//! let listing = vec![(0.0, 0.0)];
//!
//! let correlator = Correlator::new(MatchOptions::new(1.0, 5.0))?;
//! let result = correlator.correlate(&mut shops, &listing, |_, _| true, |_| false);
//!
//! assert_eq!(result.far_matches().count(), 1);
//! assert_eq!(result.unmatched_elements().len(), 1);
//! # Ok::<(), spatio_correlate::CorrelateError>(())
//! ```

pub mod report;

pub use report::{
    Correlation, CorrelationStats, MatchedPair, UnclaimedElement, UnmatchReason, UnmatchedItem,
};

use crate::compute::spatial::{ChunkIndex, Located, Lookup};
use crate::config::MatchOptions;
use crate::error::Result;
use rustc_hash::FxHashMap;
use std::convert::Infallible;

/// Runs correlations with fixed distance thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Correlator {
    options: MatchOptions,
}

impl Correlator {
    /// Validates `options` up front so runs cannot fail on configuration.
    pub fn new(options: MatchOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Correlate `items` against `index`, materializing its grid when the
    /// index is large enough to benefit.
    ///
    /// `is_match` decides whether an item may take a candidate element.
    /// `is_standalone` exempts unclaimed elements from being reported as
    /// unmatched; pass `|_| false` to report all of them.
    pub fn correlate<'a, E, I, M, S>(
        &self,
        index: &'a mut ChunkIndex<E>,
        items: &'a [I],
        mut is_match: M,
        mut is_standalone: S,
    ) -> Correlation<'a, E, I>
    where
        I: Located,
        M: FnMut(&I, &E) -> bool,
        S: FnMut(&E) -> bool,
    {
        let result = self.try_correlate_lookup(
            index.prepare(),
            items,
            |item, element| Ok::<_, Infallible>(is_match(item, element)),
            |element| Ok(is_standalone(element)),
        );
        match result {
            Ok(correlation) => correlation,
            Err(never) => match never {},
        }
    }

    /// Like [`correlate`](Self::correlate) with fallible predicates.
    ///
    /// The first predicate error aborts the run and is returned unchanged.
    pub fn try_correlate<'a, E, I, M, S, Err>(
        &self,
        index: &'a mut ChunkIndex<E>,
        items: &'a [I],
        is_match: M,
        is_standalone: S,
    ) -> std::result::Result<Correlation<'a, E, I>, Err>
    where
        I: Located,
        M: FnMut(&I, &E) -> std::result::Result<bool, Err>,
        S: FnMut(&E) -> std::result::Result<bool, Err>,
    {
        self.try_correlate_lookup(index.prepare(), items, is_match, is_standalone)
    }

    /// Correlate against an already prepared view.
    ///
    /// Useful when one index serves several runs, possibly from several
    /// threads.
    pub fn try_correlate_lookup<'a, E, I, M, S, Err>(
        &self,
        lookup: Lookup<'a, E>,
        items: &'a [I],
        mut is_match: M,
        mut is_standalone: S,
    ) -> std::result::Result<Correlation<'a, E, I>, Err>
    where
        I: Located,
        M: FnMut(&I, &E) -> std::result::Result<bool, Err>,
        S: FnMut(&E) -> std::result::Result<bool, Err>,
    {
        let MatchOptions {
            match_distance,
            unmatch_distance,
        } = self.options;

        let mut matches = Vec::new();
        let mut claims: FxHashMap<usize, usize> = FxHashMap::default();
        let mut unmatched_items = Vec::new();

        for (item_index, item) in items.iter().enumerate() {
            let candidates = lookup.all_within_entries(item.coordinate(), unmatch_distance);

            let Some(closest) = candidates.first() else {
                unmatched_items.push(UnmatchedItem {
                    item_index,
                    item,
                    reason: UnmatchReason::NoCandidates,
                    nearest_distance: None,
                });
                continue;
            };
            let nearest_distance = Some(closest.distance);

            let mut taken_accepted = false;
            let mut chosen = None;
            for candidate in &candidates {
                if !is_match(item, candidate.item)? {
                    continue;
                }
                if claims.contains_key(&candidate.id) {
                    taken_accepted = true;
                    continue;
                }
                chosen = Some(*candidate);
                break;
            }

            match chosen {
                Some(candidate) => {
                    claims.insert(candidate.id, matches.len());
                    matches.push(MatchedPair {
                        element_id: candidate.id,
                        element: candidate.item,
                        item_index,
                        item,
                        distance: candidate.distance,
                        far: candidate.distance > match_distance,
                    });
                }
                None => unmatched_items.push(UnmatchedItem {
                    item_index,
                    item,
                    reason: if taken_accepted {
                        UnmatchReason::Claimed
                    } else {
                        UnmatchReason::Rejected
                    },
                    nearest_distance,
                }),
            }
        }

        let mut unmatched_elements = Vec::new();
        let mut standalone_elements = Vec::new();
        for (element_id, element) in lookup.iter() {
            if claims.contains_key(&element_id) {
                continue;
            }
            let unclaimed = UnclaimedElement {
                element_id,
                element,
            };
            if is_standalone(element)? {
                standalone_elements.push(unclaimed);
            } else {
                unmatched_elements.push(unclaimed);
            }
        }

        let correlation = Correlation {
            options: self.options,
            item_count: items.len(),
            element_count: lookup.len(),
            matches,
            claims,
            unmatched_items,
            unmatched_elements,
            standalone_elements,
        };

        let stats = correlation.stats();
        log::debug!(
            "Correlated {} items against {} elements: {} close, {} far, {} unmatched items, \
            {} unmatched elements, {} standalone",
            stats.items,
            stats.elements,
            stats.close_matches,
            stats.far_matches,
            stats.unmatched_items,
            stats.unmatched_elements,
            stats.standalone_elements
        );

        Ok(correlation)
    }
}
