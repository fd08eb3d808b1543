use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Relay request exactly as it arrives on the wire. Every field is kept
/// loose so validation can report *which* field is wrong instead of a
/// generic deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGenerationRequest {
    #[serde(default)]
    pub product_description: Option<Value>,
    #[serde(default)]
    pub reference_url: Option<Value>,
    #[serde(default)]
    pub images: Option<Value>,
}

/// A validated request. `images` order defines section order.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub product_description: String,
    pub reference_url: Option<String>,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    pub headline: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationResult {
    pub sections: Vec<Section>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
