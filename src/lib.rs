//! GeoJSON region patches on a sphere
//!
//! A standalone library that turns GeoJSON polygons into shaded surface
//! patches on a 3D globe, suitable for use with any renderer (three.js via
//! WASM, Bevy, Godot, etc.)
//!
//! Each region goes through the same pipeline: its rings are projected onto
//! the unit sphere, fanned and adaptively subdivided, closed into a cone from
//! the globe centre, carved out of a slightly larger bounding shell, and
//! finished into a welded, indexed mesh.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use globe_regions::*;
//!
//! let config = SynthesisConfigBuilder::new()
//!     .globe_radius(100.0).unwrap()
//!     .altitude(1.0).unwrap()
//!     .subdivision(2, 5.0).unwrap()
//!     .build().unwrap();
//!
//! let synthesizer = GlobeSynthesizer::new(config).unwrap();
//! let geojson = std::fs::read_to_string("regions.geojson").unwrap();
//! let report = synthesizer.synthesize_collection(&geojson).unwrap();
//!
//! for mesh in &report.meshes {
//!     let render = mesh.to_render_data();
//!     println!("{}: {} triangles", mesh.region.name, render.triangle_count());
//! }
//! for failure in &report.failures {
//!     eprintln!("feature #{} skipped: {}", failure.index, failure.error);
//! }
//! ```
//!
//! # Features
//!
//! - `spatial-index` (default): KD-tree vertex lookups for welding
//! - `parallel` (default): builds the regions of a batch on the rayon thread pool

// Modules
pub mod error;
pub mod config;
pub mod color;
pub mod geo;
pub mod region;
pub mod ingest;
pub mod mesh;
pub mod tessellation;
pub mod csg;
pub mod finish;
pub mod cache;
pub mod synthesizer;
pub mod hierarchy;
pub mod graticule;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use error::{FeatureFailure, Result, SynthesisError};
pub use config::{SynthesisConfig, SynthesisConfigBuilder};
pub use color::{FillColor, Rgba};
pub use geo::{project, unproject, DirectionVector, GeoCoordinate};
pub use region::{Region, RegionId};
pub use ingest::{parse_collection, parse_collection_value, ParsedCollection, PolygonRings, RegionFeature};
pub use mesh::{MeshBounds, MeshBuffer, RenderData, Shading, Triangle};
pub use tessellation::{build_fan, slerp, subdivide, SubdivisionBudget};
pub use csg::{bounding_shell, carve, CsgBoolean, MeshBoolean};
pub use finish::{finish, FinishOptions};
pub use cache::{CacheStats, MeshCache};
pub use synthesizer::{BatchReport, GlobeSynthesizer, RegionMesh};
pub use hierarchy::RegionTree;
pub use graticule::{graticule, GraticuleLine, LineKind};

#[cfg(feature = "spatial-index")]
pub use spatial::SpatialIndex;

// Re-export glam::DVec3 for convenience
pub use glam::DVec3;
