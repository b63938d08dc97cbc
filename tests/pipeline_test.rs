//! End-to-end synthesis from GeoJSON to finished region meshes

use globe_regions::*;
use serde_json::{json, Value};

fn config() -> SynthesisConfig {
    SynthesisConfigBuilder::new()
        .globe_radius(100.0)
        .unwrap()
        .altitude(1.0)
        .unwrap()
        .segments(64, 32)
        .unwrap()
        .subdivision(2, 5.0)
        .unwrap()
        .build()
        .unwrap()
}

fn square_feature(id: Value, name: &str, lon: f64, lat: f64) -> Value {
    json!({
        "type": "Feature",
        "properties": { "regionId": id, "name": name },
        "geometry": {
            "type": "Polygon",
            "coordinates": [[
                [lon, lat], [lon, lat + 10.0], [lon + 10.0, lat + 10.0], [lon + 10.0, lat], [lon, lat]
            ]]
        }
    })
}

fn collection(features: Vec<Value>) -> String {
    json!({ "type": "FeatureCollection", "features": features }).to_string()
}

#[test]
fn test_square_region_end_to_end() {
    let synthesizer = GlobeSynthesizer::new(config()).unwrap();
    let report = synthesizer
        .synthesize_collection(&collection(vec![square_feature(json!(1), "Square", 0.0, 0.0)]))
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.meshes.len(), 1);
    let patch = &report.meshes[0];

    assert_eq!(patch.region.id, RegionId::from("1"));
    assert_eq!(patch.region.name, "Square");
    assert!(patch.mesh.triangle_count() > 0);

    let tolerance = synthesizer.config().weld_tolerance;
    for p in &patch.mesh.positions {
        let r = p.length();
        assert!(r >= 100.0 - 1e-6 && r <= 101.0 + 1e-6, "vertex radius {}", r);
        assert!(r >= tolerance, "apex vertex survived finishing");

        let geo = unproject(*p);
        assert!((-0.5..=10.5).contains(&geo.lon), "lon {}", geo.lon);
        assert!((-0.5..=10.5).contains(&geo.lat), "lat {}", geo.lat);
    }

    // every triangle with real area faces away from the globe centre
    for t in patch.mesh.triangles().filter(|t| t.area() > 1e-6) {
        assert!(t.normal().dot(t.centroid()) > 0.0);
    }
}

#[test]
fn test_render_data_carries_fill_color() {
    let mut config = config();
    config.fill_color = FillColor::parse("0x2194ce").unwrap();
    let synthesizer = GlobeSynthesizer::new(config).unwrap();
    let report = synthesizer
        .synthesize_collection(&collection(vec![square_feature(json!("a"), "A", 30.0, 30.0)]))
        .unwrap();

    let render = report.meshes[0].to_render_data();
    assert_eq!(render.positions.len(), render.colors.len());
    assert_eq!(render.normals.len(), render.positions.len());
    assert_eq!(render.indices.len() % 3, 0);
    assert!(render
        .colors
        .iter()
        .all(|c| *c == [0x21 as f32 / 255.0, 0x94 as f32 / 255.0, 0xce as f32 / 255.0, 1.0]));
}

#[test]
fn test_feature_without_region_id_is_reported() {
    let mut broken = square_feature(json!(2), "Broken", 20.0, 0.0);
    broken["properties"].as_object_mut().unwrap().remove("regionId");

    let synthesizer = GlobeSynthesizer::new(config()).unwrap();
    let report = synthesizer
        .synthesize_collection(&collection(vec![
            square_feature(json!(1), "One", 0.0, 0.0),
            broken,
            square_feature(json!(3), "Three", -40.0, 20.0),
        ]))
        .unwrap();

    let names: Vec<&str> = report.meshes.iter().map(|m| m.region.name.as_str()).collect();
    assert_eq!(names, vec!["One", "Three"]);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert!(matches!(
        report.failures[0].error,
        SynthesisError::InvalidInputFeature { index: 1, .. }
    ));
}

#[test]
fn test_missing_features_array_fails_the_document() {
    let synthesizer = GlobeSynthesizer::new(config()).unwrap();
    let err = synthesizer
        .synthesize_collection(r#"{ "type": "FeatureCollection" }"#)
        .unwrap_err();
    assert!(matches!(err, SynthesisError::InvalidInputFeature { index: 0, .. }));
}

#[test]
fn test_missing_altitude_is_fatal() {
    let err = SynthesisConfigBuilder::new()
        .globe_radius(100.0)
        .unwrap()
        .build()
        .unwrap_err();
    assert!(matches!(err, SynthesisError::Configuration(_)));
}

#[test]
fn test_finishing_twice_changes_nothing() {
    let synthesizer = GlobeSynthesizer::new(config()).unwrap();
    let report = synthesizer
        .synthesize_collection(&collection(vec![square_feature(json!(1), "Square", 0.0, 0.0)]))
        .unwrap();

    let once = report.meshes[0].mesh.clone();
    let twice = finish(once.clone(), DVec3::ZERO, &synthesizer.config().finish_options())
        .unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_repeat_request_is_served_from_cache() {
    let synthesizer = GlobeSynthesizer::new(config()).unwrap();
    let doc = collection(vec![square_feature(json!(1), "Square", 0.0, 0.0)]);

    let first = synthesizer.synthesize_collection(&doc).unwrap();
    let second = synthesizer.synthesize_collection(&doc).unwrap();

    assert!(std::sync::Arc::ptr_eq(&first.meshes[0], &second.meshes[0]));
    let stats = synthesizer.cache().stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

#[test]
fn test_multipolygon_region_builds_one_mesh() {
    let feature = json!({
        "type": "Feature",
        "properties": { "regionId": "islands", "name": "Islands" },
        "geometry": {
            "type": "MultiPolygon",
            "coordinates": [
                [[[0, 0], [0, 8], [8, 8], [8, 0], [0, 0]]],
                [[[40, 0], [40, 8], [48, 8], [48, 0], [40, 0]]]
            ]
        }
    });
    let synthesizer = GlobeSynthesizer::new(config()).unwrap();
    let report = synthesizer.synthesize_collection(&collection(vec![feature])).unwrap();

    assert_eq!(report.meshes.len(), 1);
    let patch = &report.meshes[0];
    let west = patch.mesh.positions.iter().filter(|p| unproject(**p).lon < 20.0).count();
    let east = patch.mesh.positions.len() - west;
    assert!(west > 0 && east > 0);
}
