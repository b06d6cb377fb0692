//! The coordinate capability shared by everything the index stores.

use geo::Coord;

/// A value with a fixed planar coordinate.
///
/// All values stored in one index must use the same unit and projection.
/// The coordinate must not change while the value is indexed.
pub trait Located {
    fn coordinate(&self) -> Coord<f64>;
}

impl Located for Coord<f64> {
    #[inline]
    fn coordinate(&self) -> Coord<f64> {
        *self
    }
}

impl Located for geo::Point<f64> {
    #[inline]
    fn coordinate(&self) -> Coord<f64> {
        self.0
    }
}

impl Located for (f64, f64) {
    #[inline]
    fn coordinate(&self) -> Coord<f64> {
        Coord {
            x: self.0,
            y: self.1,
        }
    }
}

impl Located for [f64; 2] {
    #[inline]
    fn coordinate(&self) -> Coord<f64> {
        Coord {
            x: self[0],
            y: self[1],
        }
    }
}

impl<T: Located + ?Sized> Located for &T {
    #[inline]
    fn coordinate(&self) -> Coord<f64> {
        (**self).coordinate()
    }
}

impl<T: Located + ?Sized> Located for Box<T> {
    #[inline]
    fn coordinate(&self) -> Coord<f64> {
        (**self).coordinate()
    }
}

/// Squared planar distance. Used for every comparison inside the index.
#[inline]
pub fn distance_squared(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Planar (Euclidean) distance.
#[inline]
pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    distance_squared(a, b).sqrt()
}

#[inline]
pub(crate) fn is_finite(coord: Coord<f64>) -> bool {
    coord.x.is_finite() && coord.y.is_finite()
}
