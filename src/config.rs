//! Synthesis Configuration and Builder
//!
//! This module provides the immutable configuration threaded through every
//! synthesis call, a validating builder, and loading from the settings
//! document used by the globe front end.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::FillColor;
use crate::error::{Result, SynthesisError};
use crate::finish::{FinishOptions, DEFAULT_WELD_TOLERANCE};
use crate::mesh::Shading;
use crate::tessellation::SubdivisionBudget;

/// Default bounding-shell segments around the equator
pub const DEFAULT_WIDTH_SEGMENTS: u32 = 64;
/// Default bounding-shell segments from pole to pole
pub const DEFAULT_HEIGHT_SEGMENTS: u32 = 32;

/// Configuration for region mesh synthesis
///
/// Serializable so it can be shared between the settings service and the
/// renderer. The same configuration and input always produce the same
/// meshes.
///
/// # Example
///
/// ```rust
/// use globe_regions::*;
///
/// let config = SynthesisConfigBuilder::new()
///     .globe_radius(100.0)
///     .unwrap()
///     .altitude(1.0)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(config.shell_radius(), 101.0);
///
/// let json = serde_json::to_string(&config).unwrap();
/// let restored: SynthesisConfig = serde_json::from_str(&json).unwrap();
/// assert_eq!(config, restored);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Radius of the globe the regions are draped over
    pub globe_radius: f64,

    /// Height of the region patches above the globe surface
    pub altitude: f64,

    /// Globe centre in world space; finished meshes are translated here
    pub center: DVec3,

    /// Bounding-shell segments around the equator
    pub width_segments: u32,

    /// Bounding-shell segments from pole to pole
    pub height_segments: u32,

    /// Patch fill colour handed to the renderer
    pub fill_color: FillColor,

    /// Render hint: draw patches as wireframes only
    pub wireframe_only: bool,

    /// Footprint subdivision limits
    ///
    /// - depth 0: the bare triangle fan (coarse, chords cut under the shell)
    /// - depth 2-4: typical
    /// - min edge length: the main control on triangle count for large regions
    pub subdivision: SubdivisionBudget,

    /// Apex proximity and vertex weld distance, in world units
    pub weld_tolerance: f64,

    /// Vertex normal strategy for finished meshes
    pub shading: Shading,
}

impl SynthesisConfig {
    /// Radius of the bounding shell the patches are carved from
    #[inline]
    pub fn shell_radius(&self) -> f64 {
        self.globe_radius + self.altitude
    }

    /// Options for the mesh finisher
    #[inline]
    pub fn finish_options(&self) -> FinishOptions {
        FinishOptions {
            tolerance: self.weld_tolerance,
            shading: self.shading,
        }
    }

    /// Check every field against the builder's limits
    ///
    /// Useful for configurations that were deserialized rather than built.
    pub fn validate(&self) -> Result<()> {
        SynthesisConfigBuilder::from_config(self).build().map(|_| ())
    }

    /// Load from a settings document
    ///
    /// The document has the shape
    ///
    /// ```json
    /// {
    ///   "SPHERE": { "RADIUS": 100, "WIDTH_SEGMENTS": 64, "HEIGHT_SEGMENTS": 32, "CENTER": [0, 0, 0] },
    ///   "POLYGONS": { "RISE": 1, "COLOR": "0x2194ce", "WIREFRAME_ONLY": false,
    ///                 "SUBDIVISION_DEPTH": 3, "MIN_EDGE_LENGTH": 0.05 }
    /// }
    /// ```
    ///
    /// `SPHERE.RADIUS` and `POLYGONS.RISE` are required; everything else
    /// falls back to the builder defaults. An unparseable colour falls back
    /// to white with a warning.
    ///
    /// # Errors
    ///
    /// Returns `Json` for malformed JSON and `Configuration` for missing or
    /// out-of-range values.
    pub fn from_settings_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_settings(&value)
    }

    /// Load from an already parsed settings document
    ///
    /// See [`from_settings_json`](Self::from_settings_json).
    pub fn from_settings(settings: &Value) -> Result<Self> {
        let sphere = settings
            .get("SPHERE")
            .ok_or_else(|| SynthesisError::config("settings have no SPHERE section"))?;
        let polygons = settings
            .get("POLYGONS")
            .ok_or_else(|| SynthesisError::config("settings have no POLYGONS section"))?;

        let radius = number(sphere, "SPHERE", "RADIUS")?
            .ok_or_else(|| SynthesisError::config("SPHERE.RADIUS is required"))?;
        let rise = number(polygons, "POLYGONS", "RISE")?
            .ok_or_else(|| SynthesisError::config("POLYGONS.RISE is required"))?;

        let mut builder = SynthesisConfigBuilder::new()
            .globe_radius(radius)?
            .altitude(rise)?;

        let width = integer(sphere, "SPHERE", "WIDTH_SEGMENTS")?;
        let height = integer(sphere, "SPHERE", "HEIGHT_SEGMENTS")?;
        if width.is_some() || height.is_some() {
            builder = builder.segments(
                width.unwrap_or(DEFAULT_WIDTH_SEGMENTS),
                height.unwrap_or(DEFAULT_HEIGHT_SEGMENTS),
            )?;
        }

        if let Some(center) = sphere.get("CENTER") {
            builder = builder.center(vector(center)?);
        }

        if let Some(color) = polygons.get("COLOR") {
            match FillColor::from_json(color) {
                Some(color) => builder = builder.fill_color(color),
                None => log::warn!("invalid POLYGONS.COLOR {}, using white", color),
            }
        }

        if let Some(wireframe) = polygons.get("WIREFRAME_ONLY") {
            let wireframe = wireframe.as_bool().ok_or_else(|| {
                SynthesisError::config("POLYGONS.WIREFRAME_ONLY must be a boolean")
            })?;
            builder = builder.wireframe_only(wireframe);
        }

        let defaults = SubdivisionBudget::default();
        let depth = integer(polygons, "POLYGONS", "SUBDIVISION_DEPTH")?;
        let min_edge = number(polygons, "POLYGONS", "MIN_EDGE_LENGTH")?;
        if depth.is_some() || min_edge.is_some() {
            builder = builder.subdivision(
                depth.unwrap_or(defaults.max_depth),
                min_edge.unwrap_or(defaults.min_edge_length),
            )?;
        }

        if let Some(tolerance) = number(polygons, "POLYGONS", "WELD_TOLERANCE")? {
            builder = builder.weld_tolerance(tolerance)?;
        }

        if let Some(shading) = polygons.get("SHADING") {
            let shading = match shading.as_str() {
                Some("smooth") => Shading::Smooth,
                Some("flat") => Shading::Flat,
                _ => {
                    return Err(SynthesisError::config(
                        "POLYGONS.SHADING must be \"smooth\" or \"flat\"",
                    ))
                }
            };
            builder = builder.shading(shading);
        }

        builder.build()
    }
}

fn number(section: &Value, name: &str, key: &str) -> Result<Option<f64>> {
    match section.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| SynthesisError::config(format!("{}.{} must be a number", name, key))),
    }
}

fn integer(section: &Value, name: &str, key: &str) -> Result<Option<u32>> {
    match section.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                SynthesisError::config(format!("{}.{} must be a non-negative integer", name, key))
            }),
    }
}

fn vector(value: &Value) -> Result<DVec3> {
    let invalid = || SynthesisError::config("SPHERE.CENTER must be [x, y, z]");
    let items = value.as_array().ok_or_else(invalid)?;
    if items.len() != 3 {
        return Err(invalid());
    }
    let mut xyz = [0.0; 3];
    for (slot, item) in xyz.iter_mut().zip(items) {
        *slot = item.as_f64().ok_or_else(invalid)?;
    }
    Ok(DVec3::from_array(xyz))
}

/// Builder for creating SynthesisConfig with validation
///
/// Radius and altitude have no defaults: [`build`](Self::build) fails until
/// both are set, since no region can be synthesized without them.
///
/// # Example
///
/// ```rust
/// use globe_regions::*;
///
/// let config = SynthesisConfigBuilder::new()
///     .globe_radius(100.0)
///     .unwrap()
///     .altitude(1.0)
///     .unwrap()
///     .subdivision(2, 5.0)
///     .unwrap()
///     .segments(64, 32)
///     .unwrap()
///     .shading(Shading::Flat)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.subdivision.max_depth, 2);
/// ```
#[derive(Debug, Clone)]
pub struct SynthesisConfigBuilder {
    globe_radius: Option<f64>,
    altitude: Option<f64>,
    center: DVec3,
    width_segments: u32,
    height_segments: u32,
    fill_color: FillColor,
    wireframe_only: bool,
    subdivision: SubdivisionBudget,
    weld_tolerance: f64,
    shading: Shading,
}

impl SynthesisConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - globe_radius, altitude: unset (required)
    /// - center: origin
    /// - segments: 64 x 32
    /// - fill_color: white
    /// - wireframe_only: false
    /// - subdivision: depth 3, min edge 0.05
    /// - weld_tolerance: 0.001
    /// - shading: smooth
    pub fn new() -> Self {
        Self {
            globe_radius: None,
            altitude: None,
            center: DVec3::ZERO,
            width_segments: DEFAULT_WIDTH_SEGMENTS,
            height_segments: DEFAULT_HEIGHT_SEGMENTS,
            fill_color: FillColor::WHITE,
            wireframe_only: false,
            subdivision: SubdivisionBudget::default(),
            weld_tolerance: DEFAULT_WELD_TOLERANCE,
            shading: Shading::Smooth,
        }
    }

    fn from_config(config: &SynthesisConfig) -> Self {
        Self {
            globe_radius: Some(config.globe_radius),
            altitude: Some(config.altitude),
            center: config.center,
            width_segments: config.width_segments,
            height_segments: config.height_segments,
            fill_color: config.fill_color,
            wireframe_only: config.wireframe_only,
            subdivision: config.subdivision,
            weld_tolerance: config.weld_tolerance,
            shading: config.shading,
        }
    }

    /// Set the globe radius
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if radius is not a positive finite number
    pub fn globe_radius(mut self, radius: f64) -> Result<Self> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(SynthesisError::config(format!(
                "globe radius must be positive (got {})",
                radius
            )));
        }
        self.globe_radius = Some(radius);
        Ok(self)
    }

    /// Set the patch altitude above the globe surface
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if altitude is negative or not finite
    pub fn altitude(mut self, altitude: f64) -> Result<Self> {
        if !(altitude >= 0.0 && altitude.is_finite()) {
            return Err(SynthesisError::config(format!(
                "altitude must be >= 0 (got {})",
                altitude
            )));
        }
        self.altitude = Some(altitude);
        Ok(self)
    }

    /// Set the globe centre in world space
    pub fn center(mut self, center: DVec3) -> Self {
        self.center = center;
        self
    }

    /// Set the bounding-shell tessellation
    ///
    /// More segments give a smoother patch surface but make carving slower.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if width < 3 or height < 2
    pub fn segments(mut self, width: u32, height: u32) -> Result<Self> {
        if width < 3 || height < 2 {
            return Err(SynthesisError::config(format!(
                "shell segments must be at least 3x2 (got {}x{})",
                width, height
            )));
        }
        self.width_segments = width;
        self.height_segments = height;
        Ok(self)
    }

    /// Set the patch fill colour
    pub fn fill_color(mut self, color: FillColor) -> Self {
        self.fill_color = color;
        self
    }

    /// Mark patches as wireframe-only for the renderer
    pub fn wireframe_only(mut self, wireframe: bool) -> Self {
        self.wireframe_only = wireframe;
        self
    }

    /// Set the subdivision budget
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if depth > 12 or min edge length <= 0
    pub fn subdivision(mut self, max_depth: u32, min_edge_length: f64) -> Result<Self> {
        self.subdivision = SubdivisionBudget::new(max_depth, min_edge_length)?;
        Ok(self)
    }

    /// Set the apex proximity and weld tolerance
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if tolerance is not a positive finite number
    pub fn weld_tolerance(mut self, tolerance: f64) -> Result<Self> {
        if !(tolerance > 0.0 && tolerance.is_finite()) {
            return Err(SynthesisError::config(format!(
                "weld tolerance must be positive (got {})",
                tolerance
            )));
        }
        self.weld_tolerance = tolerance;
        Ok(self)
    }

    /// Set the vertex normal strategy
    pub fn shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if radius or altitude was never set, or any
    /// field is out of range.
    pub fn build(self) -> Result<SynthesisConfig> {
        let globe_radius = self
            .globe_radius
            .ok_or_else(|| SynthesisError::config("globe radius is required"))?;
        let altitude = self
            .altitude
            .ok_or_else(|| SynthesisError::config("altitude is required"))?;

        // Re-run the setters' checks for values copied in by `from_config`
        let checked = Self::new()
            .globe_radius(globe_radius)?
            .altitude(altitude)?
            .segments(self.width_segments, self.height_segments)?
            .subdivision(self.subdivision.max_depth, self.subdivision.min_edge_length)?
            .weld_tolerance(self.weld_tolerance)?;

        if !self.center.is_finite() {
            return Err(SynthesisError::config("globe centre must be finite"));
        }

        Ok(SynthesisConfig {
            globe_radius,
            altitude,
            center: self.center,
            width_segments: checked.width_segments,
            height_segments: checked.height_segments,
            fill_color: self.fill_color,
            wireframe_only: self.wireframe_only,
            subdivision: checked.subdivision,
            weld_tolerance: checked.weld_tolerance,
            shading: self.shading,
        })
    }
}

impl Default for SynthesisConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
