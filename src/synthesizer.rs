//! Region mesh synthesis
//!
//! [`GlobeSynthesizer`] runs the whole pipeline for each region: project and
//! triangulate every polygon footprint, subdivide it, close it into a cone,
//! carve the bounding shell with that cone and finish the result. Finished
//! meshes are cached per region and configuration.
//!
//! Regions share nothing mutable, so batches fan out across threads when the
//! `parallel` feature is enabled and are collected back in input order.

use std::sync::Arc;

use glam::DVec3;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::cache::{CacheKey, MeshCache};
use crate::color::FillColor;
use crate::config::SynthesisConfig;
use crate::csg::{bounding_shell, carve, CsgBoolean, MeshBoolean};
use crate::error::{FeatureFailure, Result, SynthesisError};
use crate::finish::finish;
use crate::ingest::{parse_collection, PolygonRings, RegionFeature};
use crate::mesh::{MeshBounds, MeshBuffer, RenderData};
use crate::region::{Region, RegionId};
use crate::tessellation::{build_cap, build_cone, Cap};

/// A finished region patch ready for the rendering layer
#[derive(Debug, Clone)]
pub struct RegionMesh {
    /// The region the patch belongs to
    pub region: Region,

    /// Indexed, welded patch in world coordinates
    pub mesh: MeshBuffer,

    /// Bounds of `mesh`
    pub bounds: MeshBounds,

    /// Fill colour from the configuration
    pub color: FillColor,

    /// Draw as wireframe only
    pub wireframe: bool,
}

impl RegionMesh {
    /// Wrap a finished mesh with its region and display settings
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` if `mesh` has no triangles.
    pub fn new(region: Region, mesh: MeshBuffer, config: &SynthesisConfig) -> Result<Self> {
        let bounds = MeshBounds::from_mesh(&mesh)
            .filter(|_| !mesh.is_empty())
            .ok_or_else(|| {
                SynthesisError::degenerate(format!("region {} produced no surface", region.id))
            })?;
        Ok(Self {
            region,
            mesh,
            bounds,
            color: config.fill_color,
            wireframe: config.wireframe_only,
        })
    }

    #[inline]
    pub fn id(&self) -> &RegionId {
        &self.region.id
    }

    /// Convert to `f32` buffers with the fill colour on every vertex
    pub fn to_render_data(&self) -> RenderData {
        self.mesh.to_render_data(self.color.to_rgba())
    }
}

/// Outcome of a batch: meshes in input order plus the skipped features
#[derive(Debug, Default)]
pub struct BatchReport {
    pub meshes: Vec<Arc<RegionMesh>>,
    pub failures: Vec<FeatureFailure>,
}

impl BatchReport {
    /// Whether every feature produced a mesh
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Combined bounds of all meshes
    pub fn bounds(&self) -> Option<MeshBounds> {
        self.meshes
            .iter()
            .map(|m| m.bounds)
            .reduce(|a, b| a.merged(&b))
    }
}

/// Builds region patches on a globe
///
/// Generic over the CSG solver; [`CsgBoolean`] is used unless another
/// [`MeshBoolean`] is supplied.
///
/// # Example
///
/// ```
/// use globe_regions::*;
///
/// let config = SynthesisConfigBuilder::new()
///     .globe_radius(100.0).unwrap()
///     .altitude(1.0).unwrap()
///     .segments(32, 16).unwrap()
///     .subdivision(1, 5.0).unwrap()
///     .build().unwrap();
/// let synthesizer = GlobeSynthesizer::new(config).unwrap();
///
/// let report = synthesizer.synthesize_collection(r#"{
///     "type": "FeatureCollection",
///     "features": [{
///         "type": "Feature",
///         "properties": { "regionId": 1, "name": "Square" },
///         "geometry": { "type": "Polygon",
///                       "coordinates": [[[0, 0], [0, 10], [10, 10], [10, 0], [0, 0]]] }
///     }]
/// }"#).unwrap();
///
/// assert_eq!(report.meshes.len(), 1);
/// assert!(report.meshes[0].mesh.triangle_count() > 0);
/// ```
pub struct GlobeSynthesizer<B: MeshBoolean = CsgBoolean> {
    config: SynthesisConfig,
    boolean: B,
    shell: MeshBuffer,
    cache: MeshCache,
}

impl GlobeSynthesizer<CsgBoolean> {
    /// Create a synthesizer using the `csgrs` solver
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the configuration is out of range.
    pub fn new(config: SynthesisConfig) -> Result<Self> {
        Self::with_boolean(config, CsgBoolean)
    }
}

impl<B: MeshBoolean> GlobeSynthesizer<B> {
    /// Create a synthesizer with a custom CSG solver
    pub fn with_boolean(config: SynthesisConfig, boolean: B) -> Result<Self> {
        config.validate()?;
        let shell = bounding_shell(
            config.shell_radius(),
            config.width_segments,
            config.height_segments,
        )?;
        log::debug!(
            "bounding shell: radius {}, {} triangles",
            config.shell_radius(),
            shell.triangle_count()
        );

        Ok(Self {
            config,
            boolean,
            shell,
            cache: MeshCache::new(),
        })
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// The finished-mesh cache
    pub fn cache(&self) -> &MeshCache {
        &self.cache
    }

    /// The closed sphere patches are carved from
    pub fn shell(&self) -> &MeshBuffer {
        &self.shell
    }

    /// Build (or fetch from the cache) the patch of one ingested feature
    pub fn synthesize_feature(&self, feature: &RegionFeature) -> Result<Arc<RegionMesh>> {
        self.synthesize_region(&feature.region, &feature.polygons)
    }

    /// Build (or fetch from the cache) the patch of a region
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` when a footprint cannot be triangulated
    /// or carved, or the carve leaves nothing.
    pub fn synthesize_region(
        &self,
        region: &Region,
        polygons: &[PolygonRings],
    ) -> Result<Arc<RegionMesh>> {
        let key = CacheKey::new(&region.id, &self.config);
        if let Some(mesh) = self.cache.get(&key) {
            return Ok(mesh);
        }

        let mesh = self.build_mesh(region, polygons)?;
        let mesh = RegionMesh::new(region.clone(), mesh, &self.config)?;
        Ok(self.cache.insert(key, mesh))
    }

    fn build_mesh(&self, region: &Region, polygons: &[PolygonRings]) -> Result<MeshBuffer> {
        if polygons.is_empty() {
            return Err(SynthesisError::degenerate(format!(
                "region {} has no polygons",
                region.id
            )));
        }

        let holes: usize = polygons.iter().map(|p| p.holes.len()).sum();
        if holes > 0 {
            log::debug!("region {}: ignoring {} inner rings", region.id, holes);
        }

        let caps = polygons
            .iter()
            .map(|p| {
                build_cap(
                    &p.exterior,
                    &self.config.subdivision,
                    self.config.globe_radius,
                )
            })
            .collect::<Result<Vec<Cap>>>()?;

        let cone = build_cone(&caps, self.config.shell_radius())?;
        let carved = carve(&self.boolean, &self.shell, &cone)?;
        let mut mesh = finish(carved, DVec3::ZERO, &self.config.finish_options())?;
        mesh.translate(self.config.center);

        log::debug!(
            "region {} ({}): {} polygons -> {} triangles",
            region.id,
            region.name,
            polygons.len(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    /// Build patches for many features
    ///
    /// Features that fail are skipped and reported; the others still build.
    /// Meshes keep the input order.
    pub fn synthesize_features(&self, features: &[RegionFeature]) -> BatchReport {
        #[cfg(feature = "parallel")]
        let results: Vec<Result<Arc<RegionMesh>>> = features
            .par_iter()
            .map(|feature| self.synthesize_feature(feature))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let results: Vec<Result<Arc<RegionMesh>>> = features
            .iter()
            .map(|feature| self.synthesize_feature(feature))
            .collect();

        let mut report = BatchReport::default();
        for (feature, result) in features.iter().zip(results) {
            match result {
                Ok(mesh) => report.meshes.push(mesh),
                Err(error) => {
                    log::warn!(
                        "skipping region {} (feature #{}): {}",
                        feature.region.id,
                        feature.index,
                        error
                    );
                    report.failures.push(FeatureFailure {
                        index: feature.index,
                        region_id: Some(feature.region.id.clone()),
                        error,
                    });
                }
            }
        }

        log::info!(
            "synthesized {} of {} regions ({} skipped)",
            report.meshes.len(),
            features.len(),
            report.failures.len()
        );
        report
    }

    /// Parse a GeoJSON document and build every region in it
    ///
    /// Ingest failures and synthesis failures are both reported, ordered by
    /// feature index.
    ///
    /// # Errors
    ///
    /// Returns an error only when the document as a whole is unusable
    /// (malformed JSON or no `features` array).
    pub fn synthesize_collection(&self, json: &str) -> Result<BatchReport> {
        let parsed = parse_collection(json)?;
        let mut report = self.synthesize_features(&parsed.features);
        report.failures.extend(parsed.failures);
        report.failures.sort_by_key(|f| f.index);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SynthesisConfigBuilder;
    use crate::geo::GeoCoordinate;

    fn config() -> SynthesisConfig {
        SynthesisConfigBuilder::new()
            .globe_radius(100.0)
            .unwrap()
            .altitude(1.0)
            .unwrap()
            .segments(32, 16)
            .unwrap()
            .subdivision(1, 5.0)
            .unwrap()
            .build()
            .unwrap()
    }

    fn square(index: usize, id: &str, lon: f64, lat: f64, size: f64) -> RegionFeature {
        let ring = [
            (lon, lat),
            (lon, lat + size),
            (lon + size, lat + size),
            (lon + size, lat),
            (lon, lat),
        ]
        .into_iter()
        .map(|(x, y)| GeoCoordinate::new(x, y))
        .collect();
        RegionFeature {
            index,
            region: Region::new(id, id),
            polygons: vec![PolygonRings {
                exterior: ring,
                holes: Vec::new(),
            }],
        }
    }

    #[test]
    fn test_patch_sits_between_globe_and_shell() {
        let synthesizer = GlobeSynthesizer::new(config()).unwrap();
        let mesh = synthesizer
            .synthesize_feature(&square(0, "sq", 0.0, 0.0, 10.0))
            .unwrap();

        assert!(mesh.mesh.triangle_count() > 0);
        for p in &mesh.mesh.positions {
            let r = p.length();
            assert!((100.0 - 1e-6..=101.0 + 1e-6).contains(&r), "radius {}", r);
        }
        assert!(mesh.mesh.normals.is_some());
        assert_eq!(mesh.to_render_data().vertex_count(), mesh.mesh.vertex_count());
    }

    #[test]
    fn test_second_request_hits_cache() {
        let synthesizer = GlobeSynthesizer::new(config()).unwrap();
        let feature = square(0, "sq", 20.0, 20.0, 8.0);
        let first = synthesizer.synthesize_feature(&feature).unwrap();
        let second = synthesizer.synthesize_feature(&feature).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(synthesizer.cache().stats().hits, 1);
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_failures() {
        let synthesizer = GlobeSynthesizer::new(config()).unwrap();
        let mut broken = square(1, "broken", 0.0, 0.0, 10.0);
        broken.polygons[0].exterior.truncate(2);

        let features = vec![
            square(0, "a", 0.0, 0.0, 10.0),
            broken,
            square(2, "c", 40.0, -30.0, 10.0),
        ];
        let report = synthesizer.synthesize_features(&features);

        let ids: Vec<&str> = report.meshes.iter().map(|m| m.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert!(matches!(
            report.failures[0].error,
            SynthesisError::DegenerateGeometry(_)
        ));
        assert!(!report.is_complete());
        assert!(report.bounds().is_some());
    }

    #[test]
    fn test_center_translates_patch() {
        let mut shifted = config();
        shifted.center = DVec3::new(500.0, 0.0, 0.0);
        let synthesizer = GlobeSynthesizer::new(shifted).unwrap();
        let mesh = synthesizer
            .synthesize_feature(&square(0, "sq", 0.0, 0.0, 10.0))
            .unwrap();
        for p in &mesh.mesh.positions {
            let r = (*p - shifted.center).length();
            assert!((100.0 - 1e-6..=101.0 + 1e-6).contains(&r));
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut bad = config();
        bad.globe_radius = -1.0;
        assert!(matches!(
            GlobeSynthesizer::new(bad),
            Err(SynthesisError::Configuration(_))
        ));
    }
}
