//! Validation for coordinates handed to the index.
//!
//! Indexing never fails: items with non-finite coordinates are kept but can
//! never be found. Producers that would rather reject such input up front
//! can run these checks first.

use super::spatial::located::Located;
use crate::error::{CorrelateError, Result};
use geo::Point;

/// Validates that a planar coordinate is finite.
///
/// # Examples
///
/// ```
/// use spatio_correlate::validation::validate_located;
///
/// assert!(validate_located(&(12.5, -3.0)).is_ok());
/// assert!(validate_located(&(f64::NAN, 0.0)).is_err());
/// ```
pub fn validate_located<T: Located + ?Sized>(value: &T) -> Result<()> {
    let c = value.coordinate();

    if !c.x.is_finite() {
        return Err(CorrelateError::InvalidInput(format!(
            "X coordinate must be finite, got: {}",
            c.x
        )));
    }

    if !c.y.is_finite() {
        return Err(CorrelateError::InvalidInput(format!(
            "Y coordinate must be finite, got: {}",
            c.y
        )));
    }

    Ok(())
}

/// Validates a longitude/latitude point before projection.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use spatio_correlate::validation::validate_geographic_point;
/// use spatio_correlate::Point;
///
/// assert!(validate_geographic_point(&Point::new(21.0122, 52.2297)).is_ok());
/// assert!(validate_geographic_point(&Point::new(200.0, 40.0)).is_err());
/// assert!(validate_geographic_point(&Point::new(-74.0, 95.0)).is_err());
/// ```
pub fn validate_geographic_point(point: &Point<f64>) -> Result<()> {
    validate_located(point)?;

    let (x, y) = (point.x(), point.y());

    if !(-180.0..=180.0).contains(&x) {
        return Err(CorrelateError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            x
        )));
    }

    if !(-90.0..=90.0).contains(&y) {
        return Err(CorrelateError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            y
        )));
    }

    Ok(())
}

/// Validates every value of a collection, reporting the first bad position.
pub fn validate_all<'a, T, I>(values: I) -> Result<()>
where
    T: Located + 'a,
    I: IntoIterator<Item = &'a T>,
{
    for (idx, value) in values.into_iter().enumerate() {
        validate_located(value)
            .map_err(|e| CorrelateError::InvalidInput(format!("Value at index {}: {}", idx, e)))?;
    }
    Ok(())
}

/// Validates multiple longitude/latitude points.
pub fn validate_geographic_points(points: &[Point<f64>]) -> Result<()> {
    for (idx, point) in points.iter().enumerate() {
        validate_geographic_point(point)
            .map_err(|e| CorrelateError::InvalidInput(format!("Point at index {}: {}", idx, e)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_geographic_point() {
        let warsaw = Point::new(21.0122, 52.2297);
        assert!(validate_geographic_point(&warsaw).is_ok());

        // Edge cases
        assert!(validate_geographic_point(&Point::new(180.0, 0.0)).is_ok());
        assert!(validate_geographic_point(&Point::new(-180.0, 0.0)).is_ok());
        assert!(validate_geographic_point(&Point::new(0.0, 90.0)).is_ok());
        assert!(validate_geographic_point(&Point::new(0.0, -90.0)).is_ok());
    }

    #[test]
    fn test_invalid_geographic_point() {
        assert!(validate_geographic_point(&Point::new(180.1, 40.0)).is_err());
        assert!(validate_geographic_point(&Point::new(0.0, -90.5)).is_err());
        assert!(validate_geographic_point(&Point::new(f64::INFINITY, 0.0)).is_err());
    }

    #[test]
    fn test_validate_all_reports_index() {
        let values = vec![(0.0, 0.0), (1.0, 1.0), (f64::NAN, 2.0)];
        let err = validate_all(&values).unwrap_err();
        assert!(err.to_string().contains("index 2"));

        assert!(validate_all(&values[..2]).is_ok());
    }

    #[test]
    fn test_validate_geographic_points() {
        let points = vec![Point::new(-74.0, 40.7), Point::new(999.0, 40.0)];
        let err = validate_geographic_points(&points).unwrap_err();
        assert!(matches!(err, CorrelateError::InvalidInput(_)));
        assert!(err.to_string().contains("index 1"));
    }
}
