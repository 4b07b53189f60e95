//! Scale → classify → decode, over a shared read-only `ModelBundle`.

use crate::config_loader::ModelConfig;
use crate::errors::{AdvisorError, AdvisorResult};
use crate::features::FeatureVector;
use crate::model_bundle::ModelBundle;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Tolerance on the sum of a class distribution.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassProbability {
    pub label: String,
    pub probability: f64,
}

/// Full distribution over the model's classes, in class-index order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassProbabilityVector {
    entries: Vec<ClassProbability>,
}

impl ClassProbabilityVector {
    /// Build a distribution, rejecting non-finite, negative or unnormalised
    /// probabilities.
    pub fn new(entries: Vec<ClassProbability>) -> AdvisorResult<Self> {
        if entries.is_empty() {
            return Err(AdvisorError::inference("empty class distribution"));
        }
        if let Some(bad) = entries
            .iter()
            .find(|e| !e.probability.is_finite() || e.probability < 0.0)
        {
            return Err(AdvisorError::inference(format!(
                "invalid probability {} for class '{}'",
                bad.probability, bad.label
            )));
        }
        let sum: f64 = entries.iter().map(|e| e.probability).sum();
        if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(AdvisorError::inference(format!(
                "class probabilities sum to {sum}"
            )));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ClassProbability] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|e| e.probability).sum()
    }

    /// Highest-probability entry; the lowest index wins a tie.
    pub fn arg_max(&self) -> Option<&ClassProbability> {
        self.entries
            .iter()
            .reduce(|best, e| if e.probability > best.probability { e } else { best })
    }
}

#[derive(Debug, Clone)]
enum ModelState {
    Ready(Arc<ModelBundle>),
    Unavailable { reason: String },
}

/// Wraps the model bundle, or the reason it could not be loaded.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    state: ModelState,
}

impl InferenceEngine {
    pub fn new(bundle: ModelBundle) -> Self {
        Self {
            state: ModelState::Ready(Arc::new(bundle)),
        }
    }

    /// An engine whose artifacts failed to load. Every prediction fails with
    /// `ModelUnavailable`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: ModelState::Unavailable {
                reason: reason.into(),
            },
        }
    }

    /// Load artifacts from disk. A failure is logged and leaves the engine
    /// unavailable rather than aborting startup.
    pub fn from_config(config: &ModelConfig) -> Self {
        match ModelBundle::load(config) {
            Ok(bundle) => Self::new(bundle),
            Err(e) => {
                warn!("Model artifacts not loaded: {e}");
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ModelState::Ready(_))
    }

    /// The loaded bundle, or `ModelUnavailable`.
    pub fn bundle(&self) -> AdvisorResult<&ModelBundle> {
        match &self.state {
            ModelState::Ready(bundle) => Ok(bundle.as_ref()),
            ModelState::Unavailable { reason } => {
                Err(AdvisorError::model_unavailable(reason.clone()))
            }
        }
    }

    pub fn predict(&self, features: &FeatureVector) -> AdvisorResult<ClassProbabilityVector> {
        let bundle = self.bundle()?;

        let scaled = bundle.scaler().transform(features)?;
        let probabilities = bundle.classifier().predict_proba(&scaled)?;
        if probabilities.len() != bundle.decoder().n_classes() {
            return Err(AdvisorError::inference(format!(
                "classifier returned {} probabilities for {} labels",
                probabilities.len(),
                bundle.decoder().n_classes()
            )));
        }

        let entries = probabilities
            .into_iter()
            .enumerate()
            .map(|(index, probability)| {
                Ok(ClassProbability {
                    label: bundle.decoder().decode(index)?.to_string(),
                    probability,
                })
            })
            .collect::<AdvisorResult<Vec<_>>>()?;
        let distribution = ClassProbabilityVector::new(entries)?;

        if let Some(top) = distribution.arg_max() {
            debug!(label = %top.label, probability = top.probability, "prediction");
        }
        Ok(distribution)
    }

    /// Arg-max label for `features`.
    pub fn predicted_label(&self, features: &FeatureVector) -> AdvisorResult<String> {
        let distribution = self.predict(features)?;
        distribution
            .arg_max()
            .map(|e| e.label.clone())
            .ok_or_else(|| AdvisorError::inference("empty class distribution"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(label: &str, probability: f64) -> ClassProbability {
        ClassProbability {
            label: label.to_string(),
            probability,
        }
    }

    #[test]
    fn distribution_must_sum_to_one() {
        assert!(ClassProbabilityVector::new(vec![entry("a", 0.5), entry("b", 0.4)]).is_err());
        let ok = ClassProbabilityVector::new(vec![entry("a", 0.5), entry("b", 0.5)]).unwrap();
        assert!((ok.sum() - 1.0).abs() < PROBABILITY_TOLERANCE);
    }

    #[test]
    fn distribution_rejects_nan_and_negative() {
        assert!(ClassProbabilityVector::new(vec![entry("a", f64::NAN), entry("b", 1.0)]).is_err());
        assert!(ClassProbabilityVector::new(vec![entry("a", -0.1), entry("b", 1.1)]).is_err());
        assert!(ClassProbabilityVector::new(Vec::new()).is_err());
    }

    #[test]
    fn arg_max_prefers_lowest_index_on_tie() {
        let d = ClassProbabilityVector::new(vec![
            entry("a", 0.2),
            entry("b", 0.4),
            entry("c", 0.4),
        ])
        .unwrap();
        assert_eq!(d.arg_max().unwrap().label, "b");
    }

    #[test]
    fn unavailable_engine_refuses_to_predict() {
        let engine = InferenceEngine::unavailable("scaler missing");
        assert!(!engine.is_loaded());
        let fv = FeatureVector::from_array([90.0, 40.0, 40.0, 21.5, 82.0, 6.5, 202.0]);
        assert!(matches!(
            engine.predict(&fv),
            Err(AdvisorError::ModelUnavailable { .. })
        ));
    }
}
