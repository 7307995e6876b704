//! API request and response models.

use phishguard_core::classifier::ModelInfo;
use phishguard_core::{FeatureRecord, Label, Verdict};
use serde::{Deserialize, Serialize};

/// Request body for POST /predict.
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// The URL to classify. Absent means a client error.
    pub url: Option<String>,
}

/// Features in the response; an empty object for rule decisions.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FeaturesResponse {
    /// Model decision: the features it saw.
    Model(FeatureRecord),
    /// Rule decision: `{}`.
    Empty {},
}

/// Response body for POST /predict.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// The trimmed URL, case preserved.
    pub url: String,
    /// `safe` or `malicious`.
    pub prediction: Label,
    /// Confidence percentage.
    pub confidence: f64,
    /// Features the model used.
    pub features: FeaturesResponse,
}

impl From<Verdict> for PredictResponse {
    fn from(verdict: Verdict) -> Self {
        Self {
            url: verdict.url,
            prediction: verdict.label,
            confidence: verdict.confidence,
            features: match verdict.features {
                Some(features) => FeaturesResponse::Model(features),
                None => FeaturesResponse::Empty {},
            },
        }
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub classifier: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelInfo>,
}
