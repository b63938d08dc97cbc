//! GeoJSON ingestion
//!
//! Parses `FeatureCollection` documents into regions with their polygon
//! rings. Problems with a single feature are collected as
//! [`FeatureFailure`]s so the rest of the collection still goes through.
//!
//! Two document shapes are understood:
//! - a plain collection, where every feature is a region carrying its own
//!   `properties.regionId` and `properties.name`;
//! - a region document, where the collection itself carries
//!   `properties.regionId` and `properties.name` and all of its polygonal
//!   features together make up that one region.

use serde_json::{Map, Value};

use crate::error::{FeatureFailure, Result, SynthesisError};
use crate::geo::GeoCoordinate;
use crate::region::{Region, RegionId};

/// A ring of coordinates as it appears in GeoJSON
pub type Ring = Vec<GeoCoordinate>;

/// One polygon: an exterior ring and any holes
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonRings {
    pub exterior: Ring,
    /// Inner rings; parsed but not carved
    pub holes: Vec<Ring>,
}

/// A region and its footprint, ready for synthesis
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFeature {
    /// Position of the feature in its collection
    pub index: usize,
    pub region: Region,
    pub polygons: Vec<PolygonRings>,
}

/// Result of parsing a collection: usable features plus skipped ones
#[derive(Debug, Default)]
pub struct ParsedCollection {
    pub features: Vec<RegionFeature>,
    pub failures: Vec<FeatureFailure>,
}

/// Parse a GeoJSON document
///
/// # Errors
///
/// Returns `Json` if the text is not JSON, and `InvalidInputFeature` (index
/// 0) if the document has no `features` array. Everything else is reported
/// per feature in [`ParsedCollection::failures`].
pub fn parse_collection(json: &str) -> Result<ParsedCollection> {
    let value: Value = serde_json::from_str(json)?;
    parse_collection_value(&value)
}

/// Parse an already decoded GeoJSON document
///
/// A lone `Feature` is accepted as a collection of one.
pub fn parse_collection_value(value: &Value) -> Result<ParsedCollection> {
    if value.get("type").and_then(Value::as_str) == Some("Feature") {
        let mut parsed = ParsedCollection::default();
        match parse_feature(0, value) {
            Ok(feature) => parsed.features.push(feature),
            Err(error) => parsed.failures.push(failure(0, value, error)),
        }
        return Ok(parsed);
    }

    let features = value
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| SynthesisError::invalid_feature(0, "missing features array"))?;

    if let Some(properties) = value.get("properties").and_then(Value::as_object) {
        if properties.contains_key("regionId") {
            return parse_region_document(properties, features);
        }
    }

    let mut parsed = ParsedCollection::default();
    for (index, feature) in features.iter().enumerate() {
        match parse_feature(index, feature) {
            Ok(feature) => parsed.features.push(feature),
            Err(error) => {
                log::warn!("skipping feature #{}: {}", index, error);
                parsed.failures.push(failure(index, feature, error));
            }
        }
    }
    Ok(parsed)
}

/// Parse one feature into a region and its polygons
///
/// # Errors
///
/// Returns `InvalidInputFeature` when the region id or name is missing, or
/// the geometry is absent, malformed or not (Multi)Polygon.
pub fn parse_feature(index: usize, feature: &Value) -> Result<RegionFeature> {
    let object = feature
        .as_object()
        .ok_or_else(|| SynthesisError::invalid_feature(index, "feature must be an object"))?;
    let properties = object
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| SynthesisError::invalid_feature(index, "missing properties"))?;

    let region = parse_region(index, properties)?;
    let geometry = object
        .get("geometry")
        .ok_or_else(|| SynthesisError::invalid_feature(index, "missing geometry"))?;
    let polygons =
        parse_geometry(geometry).map_err(|reason| SynthesisError::invalid_feature(index, reason))?;

    Ok(RegionFeature {
        index,
        region,
        polygons,
    })
}

fn parse_region_document(properties: &Map<String, Value>, features: &[Value]) -> Result<ParsedCollection> {
    let mut parsed = ParsedCollection::default();
    let region = match parse_region(0, properties) {
        Ok(region) => region,
        Err(error) => {
            parsed.failures.push(FeatureFailure {
                index: 0,
                region_id: properties.get("regionId").and_then(RegionId::from_json),
                error,
            });
            return Ok(parsed);
        }
    };

    let mut polygons = Vec::new();
    for (index, feature) in features.iter().enumerate() {
        let geometry = feature
            .get("geometry")
            .ok_or_else(|| "missing geometry".to_string())
            .and_then(parse_geometry);
        match geometry {
            Ok(mut rings) => polygons.append(&mut rings),
            Err(reason) => {
                log::warn!("region {}: skipping feature #{}: {}", region.id, index, reason);
                parsed.failures.push(FeatureFailure {
                    index,
                    region_id: Some(region.id.clone()),
                    error: SynthesisError::invalid_feature(index, reason),
                });
            }
        }
    }

    if polygons.is_empty() {
        parsed.failures.push(FeatureFailure {
            index: 0,
            region_id: Some(region.id.clone()),
            error: SynthesisError::invalid_feature(0, "region document has no polygons"),
        });
    } else {
        parsed.features.push(RegionFeature {
            index: 0,
            region,
            polygons,
        });
    }
    Ok(parsed)
}

fn parse_region(index: usize, properties: &Map<String, Value>) -> Result<Region> {
    let id = properties
        .get("regionId")
        .and_then(RegionId::from_json)
        .ok_or_else(|| SynthesisError::invalid_feature(index, "missing properties.regionId"))?;
    let name = properties
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| SynthesisError::invalid_feature(index, "missing properties.name"))?;

    let mut region = Region::new(id, name);
    region.parent_id = properties.get("parentId").and_then(RegionId::from_json);
    region.parent_ids = id_list(properties.get("parentIds"));
    region.child_ids = id_list(
        properties
            .get("childMeshIds")
            .or_else(|| properties.get("childIds")),
    );
    region.open_family = id_list(properties.get("openFamily"));
    region.visible = properties
        .get("visible")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    region.properties = properties.clone();
    Ok(region)
}

fn id_list(value: Option<&Value>) -> Vec<RegionId> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(RegionId::from_json).collect())
        .unwrap_or_default()
}

fn parse_geometry(geometry: &Value) -> std::result::Result<Vec<PolygonRings>, String> {
    let kind = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or("geometry missing type")?;
    let coordinates = geometry
        .get("coordinates")
        .ok_or("geometry missing coordinates")?;

    match kind {
        "Polygon" => Ok(vec![parse_polygon(coordinates)?]),
        "MultiPolygon" => coordinates
            .as_array()
            .ok_or("MultiPolygon coordinates must be an array")?
            .iter()
            .map(parse_polygon)
            .collect(),
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_polygon(value: &Value) -> std::result::Result<PolygonRings, String> {
    let rings = value.as_array().ok_or("polygon must be an array of rings")?;
    let mut rings = rings.iter().map(parse_ring);
    let exterior = rings.next().ok_or("polygon has no rings")??;
    let holes = rings.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(PolygonRings { exterior, holes })
}

fn parse_ring(value: &Value) -> std::result::Result<Ring, String> {
    value
        .as_array()
        .ok_or("ring must be an array of positions")?
        .iter()
        .map(|position| {
            let lon = position.get(0).and_then(Value::as_f64);
            let lat = position.get(1).and_then(Value::as_f64);
            match (lon, lat) {
                (Some(lon), Some(lat)) => Ok(GeoCoordinate::new(lon, lat)),
                _ => Err(format!("invalid position: {position}")),
            }
        })
        .collect()
}

fn failure(index: usize, feature: &Value, error: SynthesisError) -> FeatureFailure {
    FeatureFailure {
        index,
        region_id: feature
            .get("properties")
            .and_then(|p| p.get("regionId"))
            .and_then(RegionId::from_json),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(id: Value, name: &str) -> Value {
        json!({
            "type": "Feature",
            "properties": { "regionId": id, "name": name },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0, 0], [0, 10], [10, 10], [10, 0], [0, 0]]]
            }
        })
    }

    #[test]
    fn test_parse_plain_collection() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [square(json!(1), "One"), square(json!("two"), "Two")]
        });
        let parsed = parse_collection(&doc.to_string()).unwrap();
        assert!(parsed.failures.is_empty());
        assert_eq!(parsed.features.len(), 2);
        assert_eq!(parsed.features[0].region.id, RegionId::from("1"));
        assert_eq!(parsed.features[1].region.name, "Two");
        assert_eq!(parsed.features[1].index, 1);
        assert_eq!(parsed.features[0].polygons[0].exterior.len(), 5);
    }

    #[test]
    fn test_missing_region_id_is_isolated() {
        let mut broken = square(json!(1), "Broken");
        broken["properties"].as_object_mut().unwrap().remove("regionId");
        let doc = json!({
            "type": "FeatureCollection",
            "features": [square(json!(1), "One"), broken, square(json!(3), "Three")]
        });

        let parsed = parse_collection_value(&doc).unwrap();
        assert_eq!(parsed.features.len(), 2);
        assert_eq!(parsed.failures.len(), 1);
        let failure = &parsed.failures[0];
        assert_eq!(failure.index, 1);
        assert!(matches!(
            &failure.error,
            SynthesisError::InvalidInputFeature { index: 1, reason } if reason.contains("regionId")
        ));
    }

    #[test]
    fn test_missing_name_and_bad_geometry() {
        let mut no_name = square(json!(1), "x");
        no_name["properties"].as_object_mut().unwrap().remove("name");
        let mut line = square(json!(2), "Line");
        line["geometry"] = json!({ "type": "LineString", "coordinates": [[0, 0], [1, 1]] });

        let doc = json!({ "type": "FeatureCollection", "features": [no_name, line] });
        let parsed = parse_collection_value(&doc).unwrap();
        assert!(parsed.features.is_empty());
        assert_eq!(parsed.failures.len(), 2);
        assert!(parsed.failures[0].error.to_string().contains("properties.name"));
        assert!(parsed.failures[1].error.to_string().contains("LineString"));
        assert_eq!(parsed.failures[1].region_id, Some(RegionId::from("2")));
    }

    #[test]
    fn test_missing_features_is_an_error() {
        let err = parse_collection(r#"{ "type": "FeatureCollection" }"#).unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidInputFeature { index: 0, .. }));
        assert!(matches!(parse_collection("not json"), Err(SynthesisError::Json(_))));
    }

    #[test]
    fn test_region_metadata() {
        let doc = json!({
            "type": "Feature",
            "properties": {
                "regionId": 7,
                "name": "Iberia",
                "parentId": 1,
                "parentIds": [1, 0],
                "childMeshIds": [70, 71],
                "openFamily": [7, 8],
                "visible": false,
                "population": 52
            },
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [
                    [[[0, 0], [0, 1], [1, 1], [0, 0]]],
                    [[[5, 5], [5, 6], [6, 6], [5, 5]], [[5.1, 5.1], [5.2, 5.1], [5.1, 5.2], [5.1, 5.1]]]
                ]
            }
        });
        let parsed = parse_collection_value(&doc).unwrap();
        let feature = &parsed.features[0];
        let region = &feature.region;

        assert_eq!(region.parent_id, Some(RegionId::from("1")));
        assert_eq!(region.parent_ids, vec![RegionId::from("1"), RegionId::from("0")]);
        assert_eq!(region.child_ids.len(), 2);
        assert_eq!(region.open_family, vec![RegionId::from("7"), RegionId::from("8")]);
        assert!(!region.visible);
        assert_eq!(region.properties["population"], json!(52));

        assert_eq!(feature.polygons.len(), 2);
        assert_eq!(feature.polygons[1].holes.len(), 1);
    }

    #[test]
    fn test_region_document() {
        let doc = json!({
            "type": "FeatureCollection",
            "properties": { "regionId": "eu", "name": "Europe", "childMeshIds": ["fr", "de"] },
            "features": [
                { "type": "Feature", "properties": {}, "geometry": {
                    "type": "Polygon", "coordinates": [[[0, 40], [0, 50], [10, 50], [0, 40]]] } },
                { "type": "Feature", "properties": {}, "geometry": {
                    "type": "Point", "coordinates": [3, 45] } },
                { "type": "Feature", "properties": {}, "geometry": {
                    "type": "Polygon", "coordinates": [[[20, 40], [20, 50], [30, 50], [20, 40]]] } }
            ]
        });

        let parsed = parse_collection_value(&doc).unwrap();
        assert_eq!(parsed.features.len(), 1);
        let feature = &parsed.features[0];
        assert_eq!(feature.region.id, RegionId::from("eu"));
        assert_eq!(feature.region.child_ids.len(), 2);
        assert_eq!(feature.polygons.len(), 2);

        assert_eq!(parsed.failures.len(), 1);
        assert_eq!(parsed.failures[0].index, 1);
    }

    #[test]
    fn test_invalid_position() {
        let mut bad = square(json!(1), "Bad");
        bad["geometry"]["coordinates"] = json!([[[0, 0], ["x", 1], [1, 1]]]);
        let err = parse_feature(4, &bad).unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidInputFeature { index: 4, .. }));
    }
}
