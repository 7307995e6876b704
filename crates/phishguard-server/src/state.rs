//! Application state for the API server.

use std::sync::Arc;

use phishguard_core::classifier::ModelInfo;
use phishguard_core::UrlPipeline;

/// Shared application state.
///
/// The pipeline is immutable, so handlers share it without locking.
#[derive(Clone)]
pub struct AppState {
    /// Classification pipeline.
    pub pipeline: Arc<UrlPipeline>,
    /// Metadata about the loaded model, reported by `/health`.
    pub model_info: Option<Arc<ModelInfo>>,
}

impl AppState {
    /// Creates application state around a pipeline.
    pub fn new(pipeline: Arc<UrlPipeline>) -> Self {
        Self {
            pipeline,
            model_info: None,
        }
    }

    /// Attaches model metadata for the health endpoint.
    pub fn with_model_info(mut self, info: ModelInfo) -> Self {
        self.model_info = Some(Arc::new(info));
        self
    }
}
