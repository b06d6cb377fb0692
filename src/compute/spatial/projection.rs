//! Local planar projection for geographic inputs.
//!
//! The index works on planar coordinates. Longitude/latitude pairs are
//! projected with an equirectangular approximation around a reference
//! latitude so that index distances come out in metres. Accuracy degrades
//! with distance from the reference latitude, which is acceptable for
//! country-sized data sets matched within a few kilometres.

use super::located::Located;
use crate::compute::validation::validate_geographic_point;
use crate::error::Result;
use geo::{Coord, Point};
use serde::{Deserialize, Serialize};

/// Approximate length of one degree of latitude in metres.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquirectangularProjection {
    reference_lat: f64,
    lon_scale: f64,
}

impl EquirectangularProjection {
    /// Projection centred on `reference_lat` (degrees).
    ///
    /// The latitude is clamped to ±89.9° so the longitude scale never
    /// collapses to zero.
    pub fn new(reference_lat: f64) -> Self {
        let lat = reference_lat.clamp(-89.9, 89.9);
        Self {
            reference_lat: lat,
            lon_scale: METERS_PER_DEGREE * lat.to_radians().cos(),
        }
    }

    /// Projection centred on the mean latitude of `points`.
    ///
    /// Non-finite latitudes are ignored. An empty input centres on the equator.
    pub fn for_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point<f64>>,
    {
        let (sum, count) = points
            .into_iter()
            .map(|p| p.y())
            .filter(|lat| lat.is_finite())
            .fold((0.0, 0usize), |(sum, count), lat| (sum + lat, count + 1));

        if count == 0 {
            Self::new(0.0)
        } else {
            Self::new(sum / count as f64)
        }
    }

    pub fn reference_lat(&self) -> f64 {
        self.reference_lat
    }

    /// Project a lon/lat point (degrees) into metres.
    #[inline]
    pub fn project(&self, point: Point<f64>) -> Coord<f64> {
        Coord {
            x: point.x() * self.lon_scale,
            y: point.y() * METERS_PER_DEGREE,
        }
    }

    /// Inverse of [`project`](Self::project).
    #[inline]
    pub fn unproject(&self, coord: Coord<f64>) -> Point<f64> {
        Point::new(coord.x / self.lon_scale, coord.y / METERS_PER_DEGREE)
    }

    /// Wrap a payload with its projected coordinate.
    pub fn wrap<T>(&self, point: Point<f64>, value: T) -> Projected<T> {
        Projected {
            coord: self.project(point),
            value,
        }
    }

    /// Like [`wrap`](Self::wrap), rejecting points outside lon/lat range.
    pub fn try_wrap<T>(&self, point: Point<f64>, value: T) -> Result<Projected<T>> {
        validate_geographic_point(&point)?;
        Ok(self.wrap(point, value))
    }
}

/// A payload paired with its projected planar coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Projected<T> {
    pub coord: Coord<f64>,
    pub value: T,
}

impl<T> Projected<T> {
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Located for Projected<T> {
    #[inline]
    fn coordinate(&self) -> Coord<f64> {
        self.coord
    }
}
