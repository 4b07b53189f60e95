//! Probabilistic crop classifier.
//!
//! The shipped model is a multinomial linear classifier: one weight row and
//! bias per class, softmax over the logits. It is evaluated with
//! `candle_nn::Linear` so the same code path serves any linear head exported
//! from training.

use crate::errors::{AdvisorError, AdvisorResult};
use crate::features::{ScaledFeatures, FEATURE_COUNT};
use candle_core::{Device, Module, Tensor, D};
use candle_nn::{ops, Linear};
use serde::{Deserialize, Serialize};

/// Pre-fitted classifier returning a full distribution over its classes.
pub trait ProbabilisticClassifier: Send + Sync {
    /// Probabilities in class-index order.
    fn predict_proba(&self, features: &ScaledFeatures) -> AdvisorResult<Vec<f64>>;

    fn n_classes(&self) -> usize;

    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }

    /// Short model family name reported by the stats endpoint.
    fn model_type(&self) -> &str;
}

pub const LINEAR_SOFTMAX: &str = "linear_softmax";

/// On-disk form of a linear softmax classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifierArtifact {
    pub model_type: String,
    pub n_features: usize,
    /// One row per class, `n_features` columns each.
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

#[derive(Debug)]
pub struct LinearSoftmaxClassifier {
    head: Linear,
    n_classes: usize,
    device: Device,
}

impl LinearSoftmaxClassifier {
    pub fn from_artifact(artifact: LinearClassifierArtifact) -> AdvisorResult<Self> {
        if artifact.model_type != LINEAR_SOFTMAX {
            return Err(AdvisorError::model_load(
                "classifier",
                format!("unsupported model_type '{}'", artifact.model_type),
            ));
        }
        if artifact.n_features != FEATURE_COUNT {
            return Err(AdvisorError::model_load(
                "classifier",
                format!(
                    "model expects {} features, pipeline provides {FEATURE_COUNT}",
                    artifact.n_features
                ),
            ));
        }
        let n_classes = artifact.weights.len();
        if n_classes == 0 {
            return Err(AdvisorError::model_load("classifier", "model has no classes"));
        }
        if artifact.bias.len() != n_classes {
            return Err(AdvisorError::model_load(
                "classifier",
                format!(
                    "{} weight rows but {} bias terms",
                    n_classes,
                    artifact.bias.len()
                ),
            ));
        }
        if let Some(row) = artifact.weights.iter().position(|r| r.len() != FEATURE_COUNT) {
            return Err(AdvisorError::model_load(
                "classifier",
                format!("weight row {row} does not have {FEATURE_COUNT} columns"),
            ));
        }
        let all_finite = artifact
            .weights
            .iter()
            .flatten()
            .chain(artifact.bias.iter())
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(AdvisorError::model_load(
                "classifier",
                "weights contain non-finite values",
            ));
        }

        let device = Device::Cpu;
        let flat: Vec<f64> = artifact.weights.into_iter().flatten().collect();
        let weight = Tensor::from_vec(flat, (n_classes, FEATURE_COUNT), &device)?;
        let bias = Tensor::from_vec(artifact.bias, n_classes, &device)?;
        Ok(Self {
            head: Linear::new(weight, Some(bias)),
            n_classes,
            device,
        })
    }

    pub fn from_json(json: &str) -> AdvisorResult<Self> {
        let artifact: LinearClassifierArtifact = serde_json::from_str(json)
            .map_err(|e| AdvisorError::model_load("classifier", format!("invalid JSON: {e}")))?;
        Self::from_artifact(artifact)
    }
}

impl ProbabilisticClassifier for LinearSoftmaxClassifier {
    fn predict_proba(&self, features: &ScaledFeatures) -> AdvisorResult<Vec<f64>> {
        let x = Tensor::from_vec(features.0.to_vec(), (1, FEATURE_COUNT), &self.device)?;
        let logits = self.head.forward(&x)?;
        let probs = ops::softmax(&logits, D::Minus1)?;
        Ok(probs.squeeze(0)?.to_vec1::<f64>()?)
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn model_type(&self) -> &str {
        LINEAR_SOFTMAX
    }
}
