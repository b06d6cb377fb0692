//! Compute layer: the coordinate capability, planar helpers, input
//! validation and the chunked spatial index.
//!
//! Everything here works on data that is already in memory.

pub mod spatial;
pub mod validation;
