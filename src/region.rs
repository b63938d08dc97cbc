//! Region metadata
//!
//! A region is one named, uniquely identified GeoJSON feature (or region
//! document) together with its place in the administrative hierarchy and the
//! interaction flags the orchestration layer flips. The geometry core never
//! mutates a region; it only carries it through to the finished mesh.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stable identifier of a region
///
/// GeoJSON sources carry ids as strings or numbers; both normalise to the
/// same textual form so `42` and `"42"` name the same region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    /// Create an id from its textual form
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read an id from a JSON string or number
    ///
    /// Returns `None` for any other JSON type and for empty strings.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for RegionId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// A named administrative or geographic region
///
/// Created when GeoJSON is ingested. Only the orchestration layer
/// ([`RegionTree`](crate::hierarchy::RegionTree)) flips `visible` and
/// `selected`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Unique identifier
    pub id: RegionId,

    /// Human-readable name
    pub name: String,

    /// Immediate parent, if any
    pub parent_id: Option<RegionId>,

    /// Full ancestor chain as supplied by the data source, nearest first
    ///
    /// Empty when the source only provides `parentId`.
    pub parent_ids: Vec<RegionId>,

    /// Immediate children
    pub child_ids: Vec<RegionId>,

    /// Regions that must be visible together when this region is drilled to
    pub open_family: Vec<RegionId>,

    /// Whether the region's patch is currently shown
    pub visible: bool,

    /// Whether the region is the current selection
    pub selected: bool,

    /// The feature's `properties` object, unchanged
    pub properties: Map<String, Value>,
}

impl Region {
    /// Create a visible, unselected region with no hierarchy links
    pub fn new(id: impl Into<RegionId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            parent_ids: Vec::new(),
            child_ids: Vec::new(),
            open_family: Vec::new(),
            visible: true,
            selected: false,
            properties: Map::new(),
        }
    }

    /// Set the parent link
    pub fn with_parent(mut self, parent: impl Into<RegionId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Set the child links
    pub fn with_children<I, R>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RegionId>,
    {
        self.child_ids = children.into_iter().map(Into::into).collect();
        self
    }

    /// Set the open family
    pub fn with_open_family<I, R>(mut self, family: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RegionId>,
    {
        self.open_family = family.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this region has any children
    #[inline]
    pub fn has_children(&self) -> bool {
        !self.child_ids.is_empty()
    }

    /// Whether `other` is an immediate child of this region
    #[inline]
    pub fn is_parent_of(&self, other: &RegionId) -> bool {
        self.child_ids.contains(other)
    }
}

impl From<String> for RegionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&RegionId> for RegionId {
    fn from(id: &RegionId) -> Self {
        id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_region_id_from_json() {
        assert_eq!(RegionId::from_json(&json!(42)), Some(RegionId::from("42")));
        assert_eq!(RegionId::from_json(&json!("fr")), Some(RegionId::from("fr")));
        assert_eq!(RegionId::from_json(&json!("")), None);
        assert_eq!(RegionId::from_json(&json!(null)), None);
        assert_eq!(RegionId::from_json(&json!([1])), None);
    }

    #[test]
    fn test_numeric_and_string_ids_match() {
        assert_eq!(RegionId::from(7u64), RegionId::from("7"));
    }

    #[test]
    fn test_region_builder() {
        let region = Region::new("1", "Europe")
            .with_parent("0")
            .with_children(["10", "11"])
            .with_open_family(["1", "2"]);

        assert!(region.visible);
        assert!(!region.selected);
        assert_eq!(region.parent_id, Some(RegionId::from("0")));
        assert!(region.has_children());
        assert!(region.is_parent_of(&RegionId::from("11")));
        assert!(!region.is_parent_of(&RegionId::from("2")));
        assert_eq!(region.open_family.len(), 2);
    }

    #[test]
    fn test_region_serialization() {
        let region = Region::new("5", "Iberia");
        let json = serde_json::to_string(&region).unwrap();
        let restored: Region = serde_json::from_str(&json).unwrap();
        assert_eq!(region, restored);
    }
}
