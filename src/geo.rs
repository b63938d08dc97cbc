//! Spherical projection of geographic coordinates
//!
//! Maps (longitude, latitude) pairs in degrees onto unit direction vectors
//! using the renderer's right-handed convention: +Y is north, and longitude is
//! negated so that east runs towards -Z from the prime meridian at +X.
//!
//! Altitude is never applied here. Callers scale the unit vector by whatever
//! radius they need.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A unit vector from the globe centre through a point on the sphere
///
/// Invariant: `|v| == 1` within floating epsilon.
pub type DirectionVector = DVec3;

/// Geographic coordinate in degrees
///
/// Out-of-range values are not validated; longitude is expected in
/// [-180, 180] and latitude in [-90, 90].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    /// Longitude in degrees
    pub lon: f64,
    /// Latitude in degrees
    pub lat: f64,
}

impl GeoCoordinate {
    /// Create a coordinate from longitude and latitude in degrees
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<[f64; 2]> for GeoCoordinate {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

/// Project a geographic coordinate onto the unit sphere
///
/// ```
/// use globe_regions::geo::{project, GeoCoordinate};
///
/// let v = project(GeoCoordinate::new(0.0, 90.0));
/// assert!((v.y - 1.0).abs() < 1e-12);
/// assert!((v.length() - 1.0).abs() < 1e-12);
/// ```
pub fn project(coord: GeoCoordinate) -> DirectionVector {
    let lat = coord.lat.to_radians();
    let lon = (-coord.lon).to_radians();

    DVec3::new(lat.cos() * lon.cos(), lat.sin(), lat.cos() * lon.sin())
}

/// Inverse of [`project`]: recover longitude and latitude from a direction
///
/// The input does not need to be normalised. The zero vector maps to (0, 0).
pub fn unproject(direction: DVec3) -> GeoCoordinate {
    let len = direction.length();
    if len == 0.0 {
        return GeoCoordinate::new(0.0, 0.0);
    }

    let lat = (direction.y / len).clamp(-1.0, 1.0).asin();
    let lon = -direction.z.atan2(direction.x);

    GeoCoordinate::new(lon.to_degrees(), lat.to_degrees())
}

/// Strip the closing coordinate of a GeoJSON ring
///
/// GeoJSON rings repeat their first coordinate at the end. Trailing
/// coordinates equal to the first one are dropped, and so are consecutive
/// duplicates, so the result lists each corner once.
pub fn open_ring(ring: &[GeoCoordinate]) -> Vec<GeoCoordinate> {
    let mut open: Vec<GeoCoordinate> = Vec::with_capacity(ring.len());
    for &coord in ring {
        if open.last() != Some(&coord) {
            open.push(coord);
        }
    }
    while open.len() > 1 && open.last() == open.first() {
        open.pop();
    }
    open
}

/// Direction of a ring's centroid on the sphere
///
/// The normalised mean of the ring's unit vectors. Returns `None` when the
/// mean vanishes (a ring balanced around the whole globe).
pub fn centroid_direction(directions: &[DirectionVector]) -> Option<DirectionVector> {
    if directions.is_empty() {
        return None;
    }
    let sum: DVec3 = directions.iter().copied().sum();
    let len = sum.length();
    if len < 1e-9 * directions.len() as f64 {
        return None;
    }
    Some(sum / len)
}

/// Gnomonic (central) projection about a tangent point
///
/// Great circles map to straight lines, so a spherical polygon with
/// great-circle edges becomes an exact planar polygon. Only the open
/// hemisphere centred on the tangent point can be projected.
#[derive(Debug, Clone, Copy)]
pub struct GnomonicFrame {
    center: DirectionVector,
    east: DVec3,
    north: DVec3,
}

impl GnomonicFrame {
    /// Build the frame tangent to the sphere at `center` (a unit vector)
    pub fn new(center: DirectionVector) -> Self {
        let east = center.any_orthonormal_vector();
        let north = center.cross(east);
        Self {
            center,
            east,
            north,
        }
    }

    /// Project a direction into the tangent plane
    ///
    /// Returns `None` for directions at or behind the horizon.
    pub fn project(&self, direction: DirectionVector) -> Option<[f64; 2]> {
        let depth = direction.dot(self.center);
        if depth <= 1e-9 {
            return None;
        }
        Some([
            direction.dot(self.east) / depth,
            direction.dot(self.north) / depth,
        ])
    }
}
