pub mod chunk_index;
mod grid;
pub mod located;
pub mod projection;

pub use chunk_index::{ChunkIndex, LINEAR_SCAN_LIMIT, Lookup, Neighbor};
pub use grid::DEGENERATE_PADDING;
pub use located::{Located, distance, distance_squared};
pub use projection::{EquirectangularProjection, METERS_PER_DEGREE, Projected};
