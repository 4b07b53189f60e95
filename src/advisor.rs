//! advisor.rs
//! Entry point of the recommendation pipeline: validate, predict, compose.

use crate::config_loader::AdvisorConfig;
use crate::crop_catalog::CropCatalog;
use crate::errors::AdvisorResult;
use crate::features::FeatureVector;
use crate::inference_engine::InferenceEngine;
use crate::input_validator::{validate, RawInput};
use crate::recommendation::{compose, RecommendationResult};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    Loaded,
    NotLoaded,
}

/// Immutable after construction; share it behind an `Arc` across requests.
#[derive(Debug, Clone)]
pub struct CropAdvisor {
    engine: InferenceEngine,
    catalog: CropCatalog,
}

impl CropAdvisor {
    pub fn new(engine: InferenceEngine, catalog: CropCatalog) -> Self {
        Self { engine, catalog }
    }

    /// Load model artifacts and the crop catalog named in `config`.
    ///
    /// Missing model artifacts do not fail construction; the advisor then
    /// answers every recommendation with `ModelUnavailable`. A broken catalog
    /// does fail, since it is shipped with the binary.
    pub fn from_config(config: &AdvisorConfig) -> AdvisorResult<Self> {
        let engine = InferenceEngine::from_config(&config.model);
        let catalog = CropCatalog::load(config.catalog.profiles_path.as_deref())?;
        if engine.is_loaded() {
            info!(crops = catalog.len(), "crop advisor ready");
        } else {
            warn!(crops = catalog.len(), "crop advisor started without a model");
        }
        Ok(Self::new(engine, catalog))
    }

    pub fn model_status(&self) -> ModelStatus {
        if self.engine.is_loaded() {
            ModelStatus::Loaded
        } else {
            ModelStatus::NotLoaded
        }
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    pub fn catalog(&self) -> &CropCatalog {
        &self.catalog
    }

    /// Run the full pipeline on an untyped payload.
    pub fn recommend(&self, raw: &RawInput) -> AdvisorResult<RecommendationResult> {
        let span = info_span!("recommend", request_id = %Uuid::new_v4());
        let _guard = span.enter();

        // model availability is a precondition, checked before touching input
        self.engine.bundle()?;

        let features = validate(raw).inspect_err(|e| debug!("rejected input: {e}"))?;
        self.recommend_features(&features)
    }

    /// Run prediction and composition on already-validated features.
    pub fn recommend_features(
        &self,
        features: &FeatureVector,
    ) -> AdvisorResult<RecommendationResult> {
        let probabilities = self.engine.predict(features)?;
        let result = compose(features, &probabilities, &self.catalog)?;
        info!(
            recommendation = %result.recommendation,
            confidence = result.confidence,
            "recommendation composed"
        );
        Ok(result)
    }
}
