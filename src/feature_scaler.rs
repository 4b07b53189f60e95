//! Standardization of raw features before classification.

use crate::errors::{AdvisorError, AdvisorResult};
use crate::features::{FeatureField, FeatureVector, ScaledFeatures, FEATURE_COUNT};
use candle_core::{Device, Tensor};
use serde::{Deserialize, Serialize};

/// Pre-fitted transform from raw measurements to model inputs.
pub trait FeatureScaler: Send + Sync {
    fn transform(&self, features: &FeatureVector) -> AdvisorResult<ScaledFeatures>;

    /// Number of input columns the scaler was fitted on.
    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }
}

/// On-disk form of a fitted standard scaler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScalerArtifact {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// `(x - mean) / scale`, column-wise.
#[derive(Debug)]
pub struct StandardScaler {
    mean: Tensor,
    scale: Tensor,
    device: Device,
}

impl StandardScaler {
    pub fn from_artifact(artifact: StandardScalerArtifact) -> AdvisorResult<Self> {
        let expected: Vec<&str> = FeatureField::ALL.iter().map(|f| f.key()).collect();
        if artifact.feature_names != expected {
            return Err(AdvisorError::model_load(
                "scaler",
                format!(
                    "feature_names {:?} do not match expected order {:?}",
                    artifact.feature_names, expected
                ),
            ));
        }
        if artifact.mean.len() != FEATURE_COUNT || artifact.scale.len() != FEATURE_COUNT {
            return Err(AdvisorError::model_load(
                "scaler",
                format!(
                    "expected {FEATURE_COUNT} mean and scale values, got {} and {}",
                    artifact.mean.len(),
                    artifact.scale.len()
                ),
            ));
        }
        if artifact.mean.iter().any(|m| !m.is_finite()) {
            return Err(AdvisorError::model_load("scaler", "mean contains non-finite values"));
        }
        if artifact.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(AdvisorError::model_load(
                "scaler",
                "scale values must be finite and non-zero",
            ));
        }

        let device = Device::Cpu;
        let mean = Tensor::from_vec(artifact.mean, (1, FEATURE_COUNT), &device)?;
        let scale = Tensor::from_vec(artifact.scale, (1, FEATURE_COUNT), &device)?;
        Ok(Self {
            mean,
            scale,
            device,
        })
    }

    pub fn from_json(json: &str) -> AdvisorResult<Self> {
        let artifact: StandardScalerArtifact = serde_json::from_str(json)
            .map_err(|e| AdvisorError::model_load("scaler", format!("invalid JSON: {e}")))?;
        Self::from_artifact(artifact)
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, features: &FeatureVector) -> AdvisorResult<ScaledFeatures> {
        let x = Tensor::from_vec(features.to_array().to_vec(), (1, FEATURE_COUNT), &self.device)?;
        let z = x.broadcast_sub(&self.mean)?.broadcast_div(&self.scale)?;
        let row = z.squeeze(0)?.to_vec1::<f64>()?;

        let out: [f64; FEATURE_COUNT] = row.try_into().map_err(|row: Vec<f64>| {
            AdvisorError::inference(format!("scaler produced {} columns", row.len()))
        })?;
        Ok(ScaledFeatures(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> StandardScalerArtifact {
        StandardScalerArtifact {
            feature_names: FeatureField::ALL.iter().map(|f| f.key().to_string()).collect(),
            mean: vec![50.0, 50.0, 50.0, 25.0, 70.0, 6.5, 100.0],
            scale: vec![10.0, 10.0, 10.0, 5.0, 20.0, 0.5, 50.0],
        }
    }

    #[test]
    fn standardizes_each_column() {
        let scaler = StandardScaler::from_artifact(artifact()).unwrap();
        let fv = FeatureVector::from_array([60.0, 40.0, 50.0, 30.0, 90.0, 6.0, 200.0]);
        let z = scaler.transform(&fv).unwrap();
        let expected = [1.0, -1.0, 0.0, 1.0, 1.0, -1.0, 2.0];
        for (got, want) in z.as_slice().iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{got} != {want}");
        }
    }

    #[test]
    fn rejects_zero_scale() {
        let mut a = artifact();
        a.scale[3] = 0.0;
        assert!(matches!(
            StandardScaler::from_artifact(a),
            Err(AdvisorError::ModelLoad { .. })
        ));
    }

    #[test]
    fn rejects_reordered_feature_names() {
        let mut a = artifact();
        a.feature_names.swap(0, 1);
        assert!(StandardScaler::from_artifact(a).is_err());
    }

    #[test]
    fn rejects_wrong_width() {
        let mut a = artifact();
        a.mean.pop();
        assert!(StandardScaler::from_artifact(a).is_err());
    }
}
