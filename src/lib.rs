//! Proximity correlation of two point collections over a chunked spatial index.
//!
//! One side (elements, e.g. features extracted from a map database) is
//! wrapped in a [`ChunkIndex`]. The other side (items, e.g. entries from an
//! external listing) is classified against it by a [`Correlator`]: each item
//! is matched, matched but far, or unmatched; each element is claimed,
//! standalone, or unmatched.
//!
//! ```rust
//! use spatio_correlate::{ChunkIndex, Correlator, MatchOptions, UnmatchReason};
//!
//! let mut elements = ChunkIndex::new(vec![(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
//! let items = vec![(0.5, 0.0), (9.0, 0.0), (40.0, 40.0)];
//!
//! let correlator = Correlator::new(MatchOptions::new(0.75, 2.0))?;
//! let result = correlator.correlate(&mut elements, &items, |_, _| true, |_| false);
//!
//! assert_eq!(result.close_matches().count(), 1);
//! assert_eq!(result.far_matches().count(), 1);
//! assert_eq!(result.unmatched_items()[0].reason, UnmatchReason::NoCandidates);
//! assert_eq!(result.unmatched_elements()[0].element, &(0.0, 10.0));
//! # Ok::<(), spatio_correlate::CorrelateError>(())
//! ```

pub mod compute;
pub mod config;
pub mod correlate;
pub mod error;

pub use error::{CorrelateError, Result};

pub use config::{Config, DEFAULT_GRID_SPAN, IndexOptions, MAX_GRID_SPAN, MatchOptions};

pub use compute::spatial::{
    ChunkIndex, EquirectangularProjection, LINEAR_SCAN_LIMIT, Located, Lookup, Neighbor,
    Projected, distance, distance_squared,
};
pub use compute::validation;

pub use correlate::{
    Correlation, CorrelationStats, Correlator, MatchedPair, UnclaimedElement, UnmatchReason,
    UnmatchedItem,
};

pub use geo::{Coord, Point, Rect};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{CorrelateError, Result};

    pub use crate::{ChunkIndex, Located, Lookup, Neighbor};

    pub use crate::{Correlation, Correlator, UnmatchReason};

    pub use crate::{Config, IndexOptions, MatchOptions};

    pub use crate::{EquirectangularProjection, Projected};

    pub use geo::{Coord, Point};
}
