use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Class assigned when the upstream body matches no recognized shape.
pub const DEFAULT_CLASS: &str = "recyclable";
/// Confidence assigned when the upstream body carries none.
pub const DEFAULT_CONFIDENCE: f64 = 0.9;

/// The canonical result every caller of the prediction endpoint depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub class: String,
    pub confidence: f64,
    #[serde(
        rename = "processingTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub processing_time: Option<u64>,
}

impl ClassificationResult {
    pub fn fallback(processing_time: Option<u64>) -> Self {
        Self {
            class: DEFAULT_CLASS.to_string(),
            confidence: DEFAULT_CONFIDENCE,
            processing_time,
        }
    }
}

/// Envelope returned when the upstream classifier fails or answers non-2xx.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamErrorEnvelope {
    pub error: String,
    pub details: Value,
}

impl UpstreamErrorEnvelope {
    pub fn new(details: Value) -> Self {
        Self {
            error: "upstream_error".to_string(),
            details,
        }
    }
}
