//! Request/response types for the vision boundaries.

use serde::{Deserialize, Serialize};

use vigil_models::{AttributeSchema, BBox, Detection};

/// One captured camera frame, JPEG-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameImage {
    /// Base64-encoded JPEG bytes
    pub data: String,
    pub width: u32,
    pub height: u32,
}

/// Identity handed to the attribute engine for one batched call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRef {
    pub id: String,
    /// Latest tracked box, normalized [0, 1]
    pub bbox: BBox,
}

/// One batched attribute-inference request.
///
/// All currently eligible identities share a single visual frame, so the
/// fixed cost of the call is amortized across everyone visible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub identities: Vec<IdentityRef>,
    /// Base64-encoded JPEG of the shared frame
    pub image: String,
    pub prompt: String,
    /// Structured-output schema for engines that support constrained decoding
    pub schema: AttributeSchema,
}

/// Per-identity attributes parsed from the engine's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectAttributes {
    pub id: String,
    /// Remaining keys of the returned object, one per schema attribute
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl SubjectAttributes {
    /// The attribute map as a plain JSON object, for the event log.
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::Value::Object(self.attributes.clone())
    }
}

/// Raw sidecar response wrapping the generative text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub raw: String,
}

/// Detector endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    pub detections: Vec<Detection>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}
