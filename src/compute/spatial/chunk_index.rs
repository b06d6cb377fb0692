//! Static chunked spatial index.
//!
//! A [`ChunkIndex`] is built once over a collection of [`Located`] items and
//! answers nearest / nearest-within / all-within queries. Small collections
//! are scanned linearly; larger ones are partitioned into a fixed N×N grid
//! of chunks the first time a lookup is prepared.
//!
//! Materialization needs `&mut self`, queries only need a [`Lookup`] view,
//! so a prepared index can be shared freely between threads.
//!
//! # Example
//!
//! ```rust
//! use spatio_correlate::ChunkIndex;
//!
//! let mut index = ChunkIndex::new(vec![(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
//! let lookup = index.prepare();
//!
//! let nearest = lookup.nearest_entry((1.0, 1.0)).unwrap();
//! assert_eq!(*nearest.item, (0.0, 0.0));
//! assert!((nearest.distance - 2f64.sqrt()).abs() < 1e-12);
//!
//! assert_eq!(lookup.all_within((1.0, 1.0), 1.5), vec![&(0.0, 0.0)]);
//! ```

use super::grid::{ChunkGrid, GridLayout};
use super::located::{Located, distance_squared, is_finite};
use crate::config::{IndexOptions, MAX_GRID_SPAN};
use crate::error::Result;
use geo::{Coord, Rect};
use std::cmp::Ordering;

/// Collections up to this size are scanned linearly until a grid is forced.
pub const LINEAR_SCAN_LIMIT: usize = 100;

#[derive(Debug, Clone)]
struct Entry<T> {
    item: T,
    coord: Coord<f64>,
}

/// A query hit: the item, its id (position in construction order) and its
/// distance from the query point.
#[derive(Debug)]
pub struct Neighbor<'a, T> {
    pub id: usize,
    pub item: &'a T,
    pub distance: f64,
}

impl<T> Clone for Neighbor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Neighbor<'_, T> {}

/// Build-once spatial index over a static collection.
#[derive(Debug, Clone)]
pub struct ChunkIndex<T> {
    entries: Vec<Entry<T>>,
    layout: Option<GridLayout>,
    grid_span: usize,
    grid: Option<ChunkGrid>,
}

impl<T: Located> ChunkIndex<T> {
    /// Index `items` with default options (grid span 50, lazy grid).
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self::with_options(items, IndexOptions::default())
    }

    /// # Panics
    ///
    /// If `options.grid_span` is outside `1..=MAX_GRID_SPAN`. Use
    /// [`try_with_options`](Self::try_with_options) for options that come
    /// from outside the program.
    pub fn with_options<I>(items: I, options: IndexOptions) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        assert!(
            (1..=MAX_GRID_SPAN).contains(&options.grid_span),
            "Grid span must be between 1 and {}, got: {}",
            MAX_GRID_SPAN,
            options.grid_span
        );

        let entries: Vec<Entry<T>> = items
            .into_iter()
            .map(|item| {
                let coord = item.coordinate();
                Entry { item, coord }
            })
            .collect();

        let skipped = entries.iter().filter(|e| !is_finite(e.coord)).count();
        if skipped > 0 {
            log::warn!(
                "{} of {} indexed items have non-finite coordinates and will never be found",
                skipped,
                entries.len()
            );
        }

        let layout = GridLayout::covering(entries.iter().map(|e| e.coord), options.grid_span);

        let mut index = Self {
            entries,
            layout,
            grid_span: options.grid_span,
            grid: None,
        };
        if options.eager {
            index.chunk_up();
        }
        index
    }

    /// Like [`with_options`](Self::with_options), returning an error for
    /// invalid options instead of panicking.
    pub fn try_with_options<I>(items: I, options: IndexOptions) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
    {
        options.validate()?;
        Ok(Self::with_options(items, options))
    }
}

impl<T> ChunkIndex<T> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bounding box of all finite coordinates, padded on degenerate axes.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.layout.as_ref().map(GridLayout::bounds)
    }

    pub fn grid_span(&self) -> usize {
        self.grid_span
    }

    /// Smallest per-axis chunk extent, in index units.
    pub fn chunk_size(&self) -> Option<f64> {
        self.layout.as_ref().map(GridLayout::chunk_size)
    }

    pub fn is_materialized(&self) -> bool {
        self.grid.is_some()
    }

    /// Number of non-empty chunks; zero until materialized.
    pub fn populated_chunks(&self) -> usize {
        self.grid.as_ref().map_or(0, ChunkGrid::populated)
    }

    pub fn get(&self, id: usize) -> Option<&T> {
        self.entries.get(id).map(|e| &e.item)
    }

    /// Items in construction order; the position is the item's id.
    pub fn items(&self) -> impl ExactSizeIterator<Item = &T> {
        self.entries.iter().map(|e| &e.item)
    }

    pub fn into_items(self) -> Vec<T> {
        self.entries.into_iter().map(|e| e.item).collect()
    }

    /// Read-only view of the index in its current state.
    ///
    /// Before materialization this scans linearly regardless of size.
    pub fn lookup(&self) -> Lookup<'_, T> {
        Lookup {
            entries: &self.entries,
            layout: self.layout.as_ref(),
            grid: self.grid.as_ref(),
        }
    }

    /// Apply the size policy and return a view.
    ///
    /// Collections larger than [`LINEAR_SCAN_LIMIT`] get their grid
    /// materialized here; smaller ones keep scanning linearly unless a grid
    /// already exists.
    pub fn prepare(&mut self) -> Lookup<'_, T> {
        if self.grid.is_none() && self.entries.len() > LINEAR_SCAN_LIMIT {
            self.chunk_up();
        }
        self.lookup()
    }

    /// Materialize the grid if needed and return a chunked view.
    ///
    /// Calling this on a materialized index reuses the existing grid.
    pub fn materialize(&mut self) -> Lookup<'_, T> {
        if self.grid.is_none() {
            self.chunk_up();
        }
        self.lookup()
    }

    fn chunk_up(&mut self) {
        assert!(self.grid.is_none(), "Chunk grid is already materialized");

        let grid = match &self.layout {
            Some(layout) => ChunkGrid::build(layout, self.entries.iter().map(|e| e.coord)),
            None => ChunkGrid::empty(),
        };

        log::debug!(
            "Materialized {}x{} chunk grid: {} items in {} populated chunks",
            self.grid_span,
            self.grid_span,
            self.entries.len(),
            grid.populated()
        );

        self.grid = Some(grid);
    }
}

/// Read-only query view over a [`ChunkIndex`].
pub struct Lookup<'a, T> {
    entries: &'a [Entry<T>],
    layout: Option<&'a GridLayout>,
    grid: Option<&'a ChunkGrid>,
}

impl<T> Clone for Lookup<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Lookup<'_, T> {}

/// Candidate ordering: squared distance, then id. Keeps both lookup paths
/// returning identical answers for equidistant items.
#[inline]
fn closer(a: (f64, usize), b: (f64, usize)) -> bool {
    a.0 < b.0 || (a.0 == b.0 && a.1 < b.1)
}

#[inline]
fn assert_radius(max_distance: f64) {
    assert!(
        max_distance >= 0.0,
        "Query distance must be a non-negative number, got: {}",
        max_distance
    );
}

impl<'a, T> Lookup<'a, T> {
    /// View that always scans linearly, whatever the index state.
    pub fn scan(index: &'a ChunkIndex<T>) -> Self {
        Lookup {
            entries: &index.entries,
            layout: index.layout.as_ref(),
            grid: None,
        }
    }

    pub fn is_chunked(&self) -> bool {
        self.grid.is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&'a T> {
        self.entries.get(id).map(|e| &e.item)
    }

    /// `(id, item)` pairs in construction order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (usize, &'a T)> {
        self.entries.iter().map(|e| &e.item).enumerate()
    }

    fn neighbor(&self, id: usize, d2: f64) -> Neighbor<'a, T> {
        Neighbor {
            id,
            item: &self.entries[id].item,
            distance: d2.sqrt(),
        }
    }

    /// Closest item, with no distance bound.
    pub fn nearest(&self, point: impl Located) -> Option<&'a T> {
        self.nearest_entry(point).map(|n| n.item)
    }

    pub fn nearest_entry(&self, point: impl Located) -> Option<Neighbor<'a, T>> {
        let p = point.coordinate();
        if !is_finite(p) {
            return None;
        }

        let best = match (self.layout, self.grid) {
            (Some(layout), Some(grid)) => self.ring_nearest(layout, grid, p),
            (Some(_), None) => self.scan_nearest(p, f64::INFINITY),
            (None, _) => None,
        };
        best.map(|(d2, id)| self.neighbor(id, d2))
    }

    /// Closest item within `max_distance`, inclusive.
    ///
    /// # Panics
    ///
    /// If `max_distance` is negative or NaN.
    pub fn nearest_within(&self, point: impl Located, max_distance: f64) -> Option<&'a T> {
        self.nearest_within_entry(point, max_distance)
            .map(|n| n.item)
    }

    pub fn nearest_within_entry(
        &self,
        point: impl Located,
        max_distance: f64,
    ) -> Option<Neighbor<'a, T>> {
        assert_radius(max_distance);
        let p = point.coordinate();
        if !is_finite(p) {
            return None;
        }

        let limit = max_distance * max_distance;
        let best = match (self.layout, self.grid) {
            (Some(layout), Some(grid)) => {
                let mut best: Option<(f64, usize)> = None;
                self.visit_range(layout, grid, p, max_distance, |d2, id| {
                    if d2 <= limit && best.is_none_or(|b| closer((d2, id), b)) {
                        best = Some((d2, id));
                    }
                });
                best
            }
            (Some(_), None) => self.scan_nearest(p, limit),
            (None, _) => None,
        };
        best.map(|(d2, id)| self.neighbor(id, d2))
    }

    /// Every item within `max_distance` (inclusive), nearest first.
    ///
    /// # Panics
    ///
    /// If `max_distance` is negative or NaN.
    pub fn all_within(&self, point: impl Located, max_distance: f64) -> Vec<&'a T> {
        self.all_within_entries(point, max_distance)
            .into_iter()
            .map(|n| n.item)
            .collect()
    }

    pub fn all_within_entries(
        &self,
        point: impl Located,
        max_distance: f64,
    ) -> Vec<Neighbor<'a, T>> {
        assert_radius(max_distance);
        let p = point.coordinate();
        if !is_finite(p) {
            return Vec::new();
        }

        let limit = max_distance * max_distance;
        let mut hits: Vec<(f64, usize)> = Vec::new();
        match (self.layout, self.grid) {
            (Some(layout), Some(grid)) => {
                self.visit_range(layout, grid, p, max_distance, |d2, id| {
                    if d2 <= limit {
                        hits.push((d2, id));
                    }
                });
            }
            (Some(_), None) => {
                hits.extend(
                    self.entries
                        .iter()
                        .enumerate()
                        .filter(|(_, e)| is_finite(e.coord))
                        .map(|(id, e)| (distance_squared(p, e.coord), id))
                        .filter(|&(d2, _)| d2 <= limit),
                );
            }
            (None, _) => {}
        }

        self.sorted_neighbors(hits)
    }

    /// Every locatable item, nearest first.
    ///
    /// This is a plain sort of the whole collection: an unbounded answer can
    /// span the entire grid, so chunks do not help. Meant for small or rare
    /// queries only.
    pub fn all_by_distance(&self, point: impl Located) -> Vec<Neighbor<'a, T>> {
        let p = point.coordinate();
        if !is_finite(p) {
            return Vec::new();
        }

        let hits = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| is_finite(e.coord))
            .map(|(id, e)| (distance_squared(p, e.coord), id))
            .collect();
        self.sorted_neighbors(hits)
    }

    fn sorted_neighbors(&self, mut hits: Vec<(f64, usize)>) -> Vec<Neighbor<'a, T>> {
        hits.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal).then(a.1.cmp(&b.1)));
        hits.into_iter()
            .map(|(d2, id)| self.neighbor(id, d2))
            .collect()
    }

    /// Linear scan for the closest item with squared distance <= `limit`.
    fn scan_nearest(&self, p: Coord<f64>, limit: f64) -> Option<(f64, usize)> {
        let mut best: Option<(f64, usize)> = None;
        for (id, e) in self.entries.iter().enumerate() {
            // The grid never holds these either; an infinite limit would
            // otherwise accept them.
            if !is_finite(e.coord) {
                continue;
            }
            let d2 = distance_squared(p, e.coord);
            if d2 <= limit && best.is_none_or(|b| closer((d2, id), b)) {
                best = Some((d2, id));
            }
        }
        best
    }

    /// Visit every item in the chunks overlapping the square around `p`.
    fn visit_range(
        &self,
        layout: &GridLayout,
        grid: &ChunkGrid,
        p: Coord<f64>,
        radius: f64,
        mut f: impl FnMut(f64, usize),
    ) {
        let Some(((x0, y0), (x1, y1))) = layout.cells_around(p, radius) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                for &id in grid.chunk(layout, (x, y)) {
                    f(distance_squared(p, self.entries[id].coord), id);
                }
            }
        }
    }

    /// Unbounded nearest: grow rings of chunks around the query's cell until
    /// the best candidate lies strictly inside the radius the rings cover.
    fn ring_nearest(
        &self,
        layout: &GridLayout,
        grid: &ChunkGrid,
        p: Coord<f64>,
    ) -> Option<(f64, usize)> {
        let cell = layout.cell_of(p);
        let mut best: Option<(f64, usize)> = None;

        for ring in 0.. {
            layout.for_each_ring_cell(cell, ring, |c| {
                for &id in grid.chunk(layout, c) {
                    let d2 = distance_squared(p, self.entries[id].coord);
                    if best.is_none_or(|b| closer((d2, id), b)) {
                        best = Some((d2, id));
                    }
                }
            });

            let covered = layout.covered_radius(cell, ring);
            if covered.is_infinite() {
                break;
            }
            if let Some((d2, _)) = best
                && d2 < covered * covered
            {
                break;
            }
        }

        best
    }
}
