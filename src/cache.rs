//! Finished-mesh cache
//!
//! Carving is the expensive stage, so every finished region mesh is kept
//! under a key made of the region id and every configuration value that
//! changes the geometry. Toggling visibility or moving the camera never
//! re-runs the pipeline for a region already built with the same settings.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::config::SynthesisConfig;
use crate::region::RegionId;
use crate::synthesizer::RegionMesh;

/// Identity of a finished mesh
///
/// Floating point settings are compared by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub region: RegionId,
    radius: u64,
    altitude: u64,
    center: [u64; 3],
    segments: (u32, u32),
    max_depth: u32,
    min_edge_length: u64,
    weld_tolerance: u64,
}

impl CacheKey {
    pub fn new(region: &RegionId, config: &SynthesisConfig) -> Self {
        Self {
            region: region.clone(),
            radius: config.globe_radius.to_bits(),
            altitude: config.altitude.to_bits(),
            center: config.center.to_array().map(f64::to_bits),
            segments: (config.width_segments, config.height_segments),
            max_depth: config.subdivision.max_depth,
            min_edge_length: config.subdivision.min_edge_length.to_bits(),
            weld_tolerance: config.weld_tolerance.to_bits(),
        }
    }
}

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Concurrent map of finished region meshes
///
/// Safe to share between worker threads; the synthesizer reads and fills it
/// from its batch fan-out.
#[derive(Debug, Default)]
pub struct MeshCache {
    entries: DashMap<CacheKey, Arc<RegionMesh>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a mesh, counting the hit or miss
    pub fn get(&self, key: &CacheKey) -> Option<Arc<RegionMesh>> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(entry.value()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a mesh and return the shared handle
    ///
    /// When another worker stored the same key first, its mesh is kept and
    /// returned instead.
    pub fn insert(&self, key: CacheKey, mesh: RegionMesh) -> Arc<RegionMesh> {
        Arc::clone(self.entries.entry(key).or_insert_with(|| Arc::new(mesh)).value())
    }

    /// Drop every entry for one region
    pub fn invalidate(&self, region: &RegionId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| &key.region != region);
        before - self.entries.len()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}
