//! Error types for region mesh synthesis

use thiserror::Error;

use crate::region::RegionId;

/// Errors that can occur while ingesting regions or synthesizing their meshes
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// A GeoJSON feature (or document) is unusable: missing `features`,
    /// missing region id or name, or an unsupported geometry type.
    ///
    /// Non-fatal to a batch: the feature is skipped and reported.
    #[error("invalid input feature #{index}: {reason}")]
    InvalidInputFeature {
        /// Position of the feature in its collection
        index: usize,
        /// Human-readable cause
        reason: String,
    },

    /// Geometry that cannot be turned into a valid patch: a ring with fewer
    /// than three points, a footprint too large for a cone, or a CSG operand
    /// that is open or inverted.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Required configuration is missing or out of range. Fatal to the batch.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A region id was not present in the region registry
    #[error("region not found: {0}")]
    RegionNotFound(RegionId),

    /// The input document is not valid JSON
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl SynthesisError {
    pub(crate) fn invalid_feature(index: usize, reason: impl Into<String>) -> Self {
        SynthesisError::InvalidInputFeature {
            index,
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        SynthesisError::DegenerateGeometry(reason.into())
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        SynthesisError::Configuration(reason.into())
    }
}

/// A feature that was skipped during a batch, with the reason
#[derive(Debug)]
pub struct FeatureFailure {
    /// Position of the feature in the batch input
    pub index: usize,
    /// Region id, when the feature got far enough to have one
    pub region_id: Option<RegionId>,
    /// Why the feature was skipped
    pub error: SynthesisError,
}

/// Result type alias for synthesis operations
pub type Result<T> = std::result::Result<T, SynthesisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SynthesisError::invalid_feature(3, "missing properties.regionId");
        assert_eq!(
            err.to_string(),
            "invalid input feature #3: missing properties.regionId"
        );

        let err = SynthesisError::degenerate("ring has 2 distinct points");
        assert!(err.to_string().starts_with("degenerate geometry"));

        let err = SynthesisError::RegionNotFound(RegionId::from("42"));
        assert_eq!(err.to_string(), "region not found: 42");
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: SynthesisError = parse.unwrap_err().into();
        assert!(matches!(err, SynthesisError::Json(_)));
    }
}
