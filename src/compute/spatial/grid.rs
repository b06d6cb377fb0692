//! Fixed N×N chunk grid over the bounding box of an index.
//!
//! The layout (bounds, span, per-axis chunk extent) is computed once from
//! the item coordinates. The grid itself only stores entry ids per chunk;
//! coordinates stay in the owning index.

use super::located::is_finite;
use geo::{Coord, Rect, coord};

/// Minimum padding applied to each side of an axis whose coordinates are all
/// equal. Large coordinates get a padding of a few ulps instead.
pub const DEGENERATE_PADDING: f64 = 1.0e-4;

/// Widen a zero-extent axis so that it survives rounding at `value`'s magnitude.
fn pad_axis(min: &mut f64, max: &mut f64) {
    let pad = DEGENERATE_PADDING.max(min.abs() * f64::EPSILON * 4.0);
    *min -= pad;
    *max += pad;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GridLayout {
    min: Coord<f64>,
    max: Coord<f64>,
    span: usize,
    chunk_w: f64,
    chunk_h: f64,
}

impl GridLayout {
    /// Layout covering every finite coordinate, or `None` when there is none.
    pub(crate) fn covering<I>(coords: I, span: usize) -> Option<Self>
    where
        I: IntoIterator<Item = Coord<f64>>,
    {
        assert!(span > 0, "Grid span must be greater than zero");

        let mut finite = coords.into_iter().filter(|c| is_finite(*c));
        let first = finite.next()?;
        let (mut min, mut max) = (first, first);
        for c in finite {
            min.x = min.x.min(c.x);
            min.y = min.y.min(c.y);
            max.x = max.x.max(c.x);
            max.y = max.y.max(c.y);
        }

        if max.x - min.x <= 0.0 {
            pad_axis(&mut min.x, &mut max.x);
        }
        if max.y - min.y <= 0.0 {
            pad_axis(&mut min.y, &mut max.y);
        }

        Some(Self {
            min,
            max,
            span,
            chunk_w: (max.x - min.x) / span as f64,
            chunk_h: (max.y - min.y) / span as f64,
        })
    }

    pub(crate) fn bounds(&self) -> Rect<f64> {
        Rect::new(self.min, self.max)
    }

    /// Smallest chunk extent; the distance a ring of chunks is guaranteed to cover.
    pub(crate) fn chunk_size(&self) -> f64 {
        self.chunk_w.min(self.chunk_h)
    }

    #[inline]
    fn axis_cell(&self, value: f64, min: f64, max: f64) -> usize {
        let t = ((value - min) / (max - min) * self.span as f64).floor();
        // `as usize` saturates, so negative and NaN land on 0.
        (t.max(0.0) as usize).min(self.span - 1)
    }

    /// Chunk cell holding `c`, clamped into the grid.
    #[inline]
    pub(crate) fn cell_of(&self, c: Coord<f64>) -> (usize, usize) {
        (
            self.axis_cell(c.x, self.min.x, self.max.x),
            self.axis_cell(c.y, self.min.y, self.max.y),
        )
    }

    #[inline]
    pub(crate) fn slot(&self, cell: (usize, usize)) -> usize {
        cell.1 * self.span + cell.0
    }

    /// Inclusive cell rectangle covering the square of half-width `radius`
    /// around `center`, or `None` when that square misses the bounds.
    pub(crate) fn cells_around(
        &self,
        center: Coord<f64>,
        radius: f64,
    ) -> Option<((usize, usize), (usize, usize))> {
        let lo = coord! { x: center.x - radius, y: center.y - radius };
        let hi = coord! { x: center.x + radius, y: center.y + radius };
        if hi.x < self.min.x || hi.y < self.min.y || lo.x > self.max.x || lo.y > self.max.y {
            return None;
        }
        Some((self.cell_of(lo), self.cell_of(hi)))
    }

    /// Radius around a query in `cell` that ring `r` is known to cover.
    ///
    /// An axis whose ring extent already spans the whole grid imposes no
    /// limit. Once both axes are spanned the result is infinite.
    pub(crate) fn covered_radius(&self, cell: (usize, usize), ring: usize) -> f64 {
        let last = self.span - 1;
        let axis = |c: usize, extent: f64| {
            if c <= ring && c + ring >= last {
                f64::INFINITY
            } else {
                ring as f64 * extent
            }
        };
        axis(cell.0, self.chunk_w).min(axis(cell.1, self.chunk_h))
    }

    /// Visit every in-grid cell at Chebyshev distance exactly `ring` from `cell`.
    pub(crate) fn for_each_ring_cell(
        &self,
        cell: (usize, usize),
        ring: usize,
        mut f: impl FnMut((usize, usize)),
    ) {
        let (cx, cy) = cell;
        if ring == 0 {
            f(cell);
            return;
        }

        let last = self.span - 1;
        let x0 = cx.saturating_sub(ring);
        let x1 = (cx + ring).min(last);
        let y0 = cy.saturating_sub(ring);
        let y1 = (cy + ring).min(last);

        let top = cy.checked_sub(ring);
        let bottom = (cy + ring <= last).then_some(cy + ring);
        let left = cx.checked_sub(ring);
        let right = (cx + ring <= last).then_some(cx + ring);

        if let Some(y) = top {
            for x in x0..=x1 {
                f((x, y));
            }
        }
        for y in y0..=y1 {
            if Some(y) == top || Some(y) == bottom {
                continue;
            }
            if let Some(x) = left {
                f((x, y));
            }
            if let Some(x) = right {
                f((x, y));
            }
        }
        if let Some(y) = bottom {
            for x in x0..=x1 {
                f((x, y));
            }
        }
    }
}

/// Materialized chunks: one optional id list per grid slot.
#[derive(Debug, Clone)]
pub(crate) struct ChunkGrid {
    chunks: Vec<Option<Vec<usize>>>,
    populated: usize,
}

impl ChunkGrid {
    /// Assign every finite coordinate to its chunk. Ids are positions in `coords`.
    pub(crate) fn build<I>(layout: &GridLayout, coords: I) -> Self
    where
        I: IntoIterator<Item = Coord<f64>>,
    {
        let mut chunks: Vec<Option<Vec<usize>>> = vec![None; layout.span * layout.span];
        let mut populated = 0;

        for (id, c) in coords.into_iter().enumerate() {
            if !is_finite(c) {
                continue;
            }
            let chunk = chunks[layout.slot(layout.cell_of(c))].get_or_insert_with(|| {
                populated += 1;
                Vec::new()
            });
            chunk.push(id);
        }

        Self { chunks, populated }
    }

    /// An empty grid for an index without locatable items.
    pub(crate) fn empty() -> Self {
        Self {
            chunks: Vec::new(),
            populated: 0,
        }
    }

    pub(crate) fn populated(&self) -> usize {
        self.populated
    }

    #[inline]
    pub(crate) fn chunk(&self, layout: &GridLayout, cell: (usize, usize)) -> &[usize] {
        self.chunks
            .get(layout.slot(cell))
            .and_then(|chunk| chunk.as_deref())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(coords: &[(f64, f64)], span: usize) -> GridLayout {
        GridLayout::covering(coords.iter().map(|&(x, y)| coord! { x: x, y: y }), span).unwrap()
    }

    #[test]
    fn test_empty_has_no_layout() {
        assert!(GridLayout::covering(std::iter::empty(), 10).is_none());
        let nan = coord! { x: f64::NAN, y: 0.0 };
        assert!(GridLayout::covering([nan], 10).is_none());
    }

    #[test]
    fn test_degenerate_axis_is_padded() {
        let layout = layout(&[(5.0, 1.0), (5.0, 3.0)], 4);
        let bounds = layout.bounds();
        assert_eq!(bounds.min().x, 5.0 - DEGENERATE_PADDING);
        assert_eq!(bounds.max().x, 5.0 + DEGENERATE_PADDING);
        assert_eq!(bounds.min().y, 1.0);
        assert!(layout.chunk_size() > 0.0);
    }

    #[test]
    fn test_padding_survives_large_coordinates() {
        for v in [1.0e13, 5.0e15, -3.0e18] {
            let layout = layout(&[(v, 2.0), (v, 8.0)], 50);
            let bounds = layout.bounds();
            assert!(bounds.min().x < v && v < bounds.max().x, "v = {}", v);
            assert!(layout.chunk_size() > 0.0, "v = {}", v);
        }
    }

    #[test]
    fn test_cell_of_clamps() {
        let layout = layout(&[(0.0, 0.0), (10.0, 10.0)], 5);
        assert_eq!(layout.cell_of(coord! { x: 0.0, y: 0.0 }), (0, 0));
        assert_eq!(layout.cell_of(coord! { x: 10.0, y: 10.0 }), (4, 4));
        assert_eq!(layout.cell_of(coord! { x: 4.1, y: 6.0 }), (2, 3));
        assert_eq!(layout.cell_of(coord! { x: -50.0, y: 99.0 }), (0, 4));
    }

    #[test]
    fn test_every_point_lands_in_one_chunk() {
        let coords: Vec<Coord<f64>> = (0..200)
            .map(|i| coord! { x: (i % 17) as f64, y: (i / 17) as f64 })
            .collect();
        let layout = GridLayout::covering(coords.iter().copied(), 6).unwrap();
        let grid = ChunkGrid::build(&layout, coords.iter().copied());

        let mut seen = vec![0usize; coords.len()];
        for y in 0..6 {
            for x in 0..6 {
                for &id in grid.chunk(&layout, (x, y)) {
                    seen[id] += 1;
                }
            }
        }
        assert!(seen.iter().all(|&count| count == 1));
        assert!(grid.populated() <= 36);
    }

    #[test]
    fn test_ring_cells_are_exact_perimeter() {
        let layout = layout(&[(0.0, 0.0), (10.0, 10.0)], 10);
        for ring in 0..12 {
            let mut cells = Vec::new();
            layout.for_each_ring_cell((2, 7), ring, |cell| cells.push(cell));

            let mut expected = Vec::new();
            for y in 0..10usize {
                for x in 0..10usize {
                    if x.abs_diff(2).max(y.abs_diff(7)) == ring {
                        expected.push((x, y));
                    }
                }
            }
            cells.sort();
            expected.sort();
            assert_eq!(cells, expected, "ring {}", ring);
        }
    }

    #[test]
    fn test_covered_radius_grows_then_saturates() {
        let layout = layout(&[(0.0, 0.0), (10.0, 10.0)], 10);
        assert_eq!(layout.covered_radius((5, 5), 0), 0.0);
        assert_eq!(layout.covered_radius((5, 5), 2), 2.0);
        assert_eq!(layout.covered_radius((5, 5), 9), f64::INFINITY);
        assert_eq!(layout.covered_radius((0, 0), 9), f64::INFINITY);
    }

    #[test]
    fn test_cells_around_misses_far_query() {
        let layout = layout(&[(0.0, 0.0), (10.0, 10.0)], 10);
        assert!(layout.cells_around(coord! { x: 30.0, y: 5.0 }, 5.0).is_none());
        assert_eq!(
            layout.cells_around(coord! { x: 5.0, y: 5.0 }, 1.0),
            Some(((4, 4), (6, 6)))
        );
    }
}
