//! Demonstration of region patch synthesis

use globe_regions::*;

const SETTINGS: &str = r#"{
    "SPHERE": { "RADIUS": 100, "WIDTH_SEGMENTS": 64, "HEIGHT_SEGMENTS": 32 },
    "POLYGONS": { "RISE": 1, "COLOR": "0x2194ce", "SUBDIVISION_DEPTH": 2, "MIN_EDGE_LENGTH": 5 }
}"#;

const REGIONS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        { "type": "Feature",
          "properties": { "regionId": 1, "name": "Square", "childMeshIds": [2] },
          "geometry": { "type": "Polygon",
                        "coordinates": [[[0, 0], [0, 10], [10, 10], [10, 0], [0, 0]]] } },
        { "type": "Feature",
          "properties": { "regionId": 2, "name": "Wedge", "parentId": 1, "visible": false },
          "geometry": { "type": "Polygon",
                        "coordinates": [[[2, 2], [5, 8], [8, 2], [5, 3.5], [2, 2]]] } },
        { "type": "Feature",
          "properties": { "name": "No id" },
          "geometry": { "type": "Polygon",
                        "coordinates": [[[30, 0], [30, 5], [35, 5], [30, 0]]] } }
    ]
}"#;

fn main() -> Result<()> {
    println!("Loading settings...");
    let config = SynthesisConfig::from_settings_json(SETTINGS)?;
    println!(
        "  globe radius {}, shell radius {}, fill {}",
        config.globe_radius,
        config.shell_radius(),
        config.fill_color
    );

    let synthesizer = GlobeSynthesizer::new(config)?;
    let report = synthesizer.synthesize_collection(REGIONS)?;

    println!("\nRegion meshes:");
    for mesh in &report.meshes {
        let render = mesh.to_render_data();
        let mem = render.positions.len() * 12
            + render.normals.len() * 12
            + render.colors.len() * 16
            + render.indices.len() * 4;
        println!(
            "  {} ({}): {} vertices, {} triangles, {:.1} KB, bounding radius {:.2}",
            mesh.region.name,
            mesh.id(),
            render.vertex_count(),
            render.triangle_count(),
            mem as f32 / 1024.0,
            mesh.bounds.sphere.radius
        );
    }

    println!("\nSkipped features:");
    for failure in &report.failures {
        println!("  #{}: {}", failure.index, failure.error);
    }

    // Cached meshes come back without carving again
    synthesizer.synthesize_collection(REGIONS)?;
    let stats = synthesizer.cache().stats();
    println!("\nCache: {} entries, {} hits, {} misses", stats.entries, stats.hits, stats.misses);

    // Drill into the square
    let mut tree = RegionTree::new();
    for mesh in &report.meshes {
        tree.insert(mesh.region.clone());
    }
    tree.drill_down(&RegionId::from(1u64))?;
    let open: Vec<String> = tree.open_ids().map(ToString::to_string).collect();
    println!("\nAfter drilling into region 1, open: {:?}", open);

    Ok(())
}
