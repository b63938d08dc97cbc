//! Latitude and longitude grid lines
//!
//! Lines are polylines sampled every [`SAMPLE_STEP_DEG`] degrees and placed
//! with the same projection as region patches, so a grid drawn at the shell
//! radius lines up with the carved regions.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthesisError};
use crate::geo::{project, GeoCoordinate};

/// Spacing of the points along each line
pub const SAMPLE_STEP_DEG: f64 = 2.0;

/// Latitude lines stop short of the poles
pub const MAX_GRID_LATITUDE: f64 = 80.0;

/// Finest spacing accepted between grid lines
pub const MIN_LINE_STEP_DEG: f64 = SAMPLE_STEP_DEG / 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineKind {
    /// Circle of constant latitude
    Latitude,
    /// Meridian from pole to pole
    Longitude,
}

/// One grid polyline
#[derive(Debug, Clone, PartialEq)]
pub struct GraticuleLine {
    pub kind: LineKind,
    /// Latitude or longitude of the line, in degrees
    pub degrees: f64,
    pub points: Vec<DVec3>,
}

impl GraticuleLine {
    /// Points narrowed for a line renderer
    pub fn to_f32(&self) -> Vec<[f32; 3]> {
        self.points.iter().map(|p| p.as_vec3().to_array()).collect()
    }
}

/// Build a latitude/longitude grid
///
/// Latitude lines run from -80° to 80° every `lat_step` degrees, each a
/// closed circle. Longitude lines run from -180° to 180° every `lon_step`
/// degrees, each from the north pole to the south pole.
///
/// # Errors
///
/// Returns `Configuration` if the radius is not positive or a step is finer
/// than [`MIN_LINE_STEP_DEG`].
pub fn graticule(radius: f64, lat_step: f64, lon_step: f64) -> Result<Vec<GraticuleLine>> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(SynthesisError::config(format!(
            "graticule radius must be positive, got {}",
            radius
        )));
    }
    let usable = |step: f64| step.is_finite() && step >= MIN_LINE_STEP_DEG;
    if !(usable(lat_step) && usable(lon_step)) {
        return Err(SynthesisError::config(format!(
            "graticule steps must be at least {}°, got {} and {}",
            MIN_LINE_STEP_DEG, lat_step, lon_step
        )));
    }

    let mut lines = Vec::new();
    for lat in stepped(-MAX_GRID_LATITUDE, MAX_GRID_LATITUDE, lat_step) {
        let points = stepped(-180.0, 180.0, SAMPLE_STEP_DEG)
            .map(|lon| project(GeoCoordinate::new(lon, lat)) * radius)
            .collect();
        lines.push(GraticuleLine {
            kind: LineKind::Latitude,
            degrees: lat,
            points,
        });
    }
    for lon in stepped(-180.0, 180.0, lon_step) {
        let points = stepped(-90.0, 90.0, SAMPLE_STEP_DEG)
            .map(|lat| project(GeoCoordinate::new(lon, -lat)) * radius)
            .collect();
        lines.push(GraticuleLine {
            kind: LineKind::Longitude,
            degrees: lon,
            points,
        });
    }
    Ok(lines)
}

/// `start, start + step, ...` up to and including `end`
fn stepped(start: f64, end: f64, step: f64) -> impl Iterator<Item = f64> {
    let count = ((end - start) / step + 1e-9).floor() as usize;
    (0..=count).map(move |k| start + k as f64 * step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_counts() {
        let lines = graticule(100.0, 10.0, 30.0).unwrap();
        let lat = lines.iter().filter(|l| l.kind == LineKind::Latitude).count();
        let lon = lines.iter().filter(|l| l.kind == LineKind::Longitude).count();
        assert_eq!(lat, 17);
        assert_eq!(lon, 13);
    }

    #[test]
    fn test_points_on_sphere() {
        for line in graticule(50.0, 20.0, 45.0).unwrap() {
            for p in &line.points {
                assert!((p.length() - 50.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_latitude_line_is_closed_circle() {
        let lines = graticule(1.0, 40.0, 90.0).unwrap();
        let line = lines.iter().find(|l| l.kind == LineKind::Latitude).unwrap();
        assert_eq!(line.degrees, -80.0);
        assert_eq!(line.points.len(), 181);
        let first = line.points[0];
        let last = line.points[line.points.len() - 1];
        assert!(first.distance(last) < 1e-9);
        for p in &line.points {
            assert!((p.y - (-80f64).to_radians().sin()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_longitude_line_runs_pole_to_pole() {
        let lines = graticule(1.0, 40.0, 90.0).unwrap();
        let line = lines.iter().find(|l| l.kind == LineKind::Longitude).unwrap();
        assert_eq!(line.points.len(), 91);
        assert!(line.points[0].distance(DVec3::Y) < 1e-9);
        assert!(line.points[90].distance(-DVec3::Y) < 1e-9);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(graticule(0.0, 10.0, 10.0).is_err());
        assert!(graticule(1.0, 0.0, 10.0).is_err());
        assert!(graticule(1.0, 10.0, -5.0).is_err());
        assert!(graticule(1.0, f64::NAN, 10.0).is_err());
    }

    #[test]
    fn test_too_fine_steps_are_rejected() {
        assert!(graticule(1.0, 1e-9, 10.0).is_err());
        assert!(graticule(1.0, 10.0, MIN_LINE_STEP_DEG / 2.0).is_err());

        let finest = graticule(1.0, MIN_LINE_STEP_DEG, 90.0).unwrap();
        let lat = finest.iter().filter(|l| l.kind == LineKind::Latitude).count();
        assert_eq!(lat, 1601);
    }
}
