//! The three pre-fitted artifacts the inference engine needs, loaded once at
//! startup and read-only afterwards.

use crate::config_loader::ModelConfig;
use crate::crop_classifier::{LinearSoftmaxClassifier, ProbabilisticClassifier};
use crate::errors::{AdvisorError, AdvisorResult};
use crate::feature_scaler::{FeatureScaler, StandardScaler};
use crate::features::FEATURE_COUNT;
use crate::label_encoder::{LabelDecoder, LabelEncoder};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// SHA-256 of one artifact file as it was read at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDigest {
    pub artifact: String,
    pub path: String,
    pub sha256: String,
}

pub struct ModelBundle {
    scaler: Box<dyn FeatureScaler>,
    classifier: Box<dyn ProbabilisticClassifier>,
    decoder: Box<dyn LabelDecoder>,
    digests: Vec<ArtifactDigest>,
}

impl std::fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBundle")
            .field("model_type", &self.classifier.model_type())
            .field("n_classes", &self.classifier.n_classes())
            .field("digests", &self.digests)
            .finish()
    }
}

impl ModelBundle {
    /// Assemble a bundle from already-constructed components, checking that
    /// they agree on input width and label space.
    pub fn new(
        scaler: Box<dyn FeatureScaler>,
        classifier: Box<dyn ProbabilisticClassifier>,
        decoder: Box<dyn LabelDecoder>,
    ) -> AdvisorResult<Self> {
        if scaler.n_features() != FEATURE_COUNT || classifier.n_features() != FEATURE_COUNT {
            return Err(AdvisorError::model_load(
                "bundle",
                format!(
                    "scaler takes {} features and classifier takes {}, expected {FEATURE_COUNT}",
                    scaler.n_features(),
                    classifier.n_features()
                ),
            ));
        }
        if classifier.n_classes() != decoder.n_classes() {
            return Err(AdvisorError::model_load(
                "bundle",
                format!(
                    "classifier has {} classes but label encoder has {}",
                    classifier.n_classes(),
                    decoder.n_classes()
                ),
            ));
        }
        Ok(Self {
            scaler,
            classifier,
            decoder,
            digests: Vec::new(),
        })
    }

    /// Read and verify the three artifacts named in the model config.
    pub fn load(config: &ModelConfig) -> AdvisorResult<Self> {
        let (scaler_json, scaler_digest) = read_artifact("scaler", &config.scaler_path, config)?;
        let (classifier_json, classifier_digest) =
            read_artifact("classifier", &config.classifier_path, config)?;
        let (encoder_json, encoder_digest) =
            read_artifact("label_encoder", &config.encoder_path, config)?;

        let scaler = StandardScaler::from_json(&scaler_json)?;
        let classifier = LinearSoftmaxClassifier::from_json(&classifier_json)?;
        let encoder = LabelEncoder::from_json(&encoder_json)?;
        debug!(classes = ?encoder.classes(), "label encoder loaded");

        let mut bundle = Self::new(Box::new(scaler), Box::new(classifier), Box::new(encoder))?;
        bundle.digests = vec![scaler_digest, classifier_digest, encoder_digest];
        info!(
            model_type = bundle.model_type(),
            classes = bundle.n_classes(),
            "model artifacts loaded"
        );
        Ok(bundle)
    }

    pub fn scaler(&self) -> &dyn FeatureScaler {
        self.scaler.as_ref()
    }

    pub fn classifier(&self) -> &dyn ProbabilisticClassifier {
        self.classifier.as_ref()
    }

    pub fn decoder(&self) -> &dyn LabelDecoder {
        self.decoder.as_ref()
    }

    pub fn digests(&self) -> &[ArtifactDigest] {
        &self.digests
    }

    pub fn model_type(&self) -> &str {
        self.classifier.model_type()
    }

    pub fn n_classes(&self) -> usize {
        self.classifier.n_classes()
    }

    /// Labels in class-index order.
    pub fn labels(&self) -> AdvisorResult<Vec<String>> {
        (0..self.decoder.n_classes())
            .map(|i| self.decoder.decode(i).map(str::to_string))
            .collect()
    }
}

fn read_artifact(
    artifact: &str,
    path: &str,
    config: &ModelConfig,
) -> AdvisorResult<(String, ArtifactDigest)> {
    let bytes = fs::read(Path::new(path))
        .map_err(|e| AdvisorError::model_load(artifact, format!("{path}: {e}")))?;
    let sha256 = hex_digest(&bytes);

    if let Some(expected) = config.checksums.get(artifact) {
        if !expected.eq_ignore_ascii_case(&sha256) {
            return Err(AdvisorError::model_load(
                artifact,
                format!("checksum mismatch for {path}: expected {expected}, found {sha256}"),
            ));
        }
    }
    info!(artifact, path, sha256 = %sha256, "read model artifact");

    let text = String::from_utf8(bytes)
        .map_err(|e| AdvisorError::model_load(artifact, format!("{path} is not UTF-8: {e}")))?;
    Ok((
        text,
        ArtifactDigest {
            artifact: artifact.to_string(),
            path: path.to_string(),
            sha256,
        },
    ))
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io::Write;
    use tempfile::TempDir;

    const SCALER: &str = r#"{"feature_names":["N","P","K","temperature","humidity","ph","rainfall"],
        "mean":[0,0,0,0,0,0,0],"scale":[1,1,1,1,1,1,1]}"#;
    const CLASSIFIER: &str = r#"{"model_type":"linear_softmax","n_features":7,
        "weights":[[1,0,0,0,0,0,0],[0,1,0,0,0,0,0]],"bias":[0,0]}"#;
    const ENCODER: &str = r#"{"classes":["Barley","Rice"]}"#;

    fn write(dir: &TempDir, name: &str, body: &str) -> String {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path.to_string_lossy().to_string()
    }

    fn config(dir: &TempDir, encoder: &str) -> ModelConfig {
        ModelConfig {
            scaler_path: write(dir, "scaler.json", SCALER),
            classifier_path: write(dir, "classifier.json", CLASSIFIER),
            encoder_path: write(dir, "encoder.json", encoder),
            checksums: BTreeMap::new(),
        }
    }

    #[test]
    fn loads_consistent_artifacts() {
        let dir = TempDir::new().unwrap();
        let bundle = ModelBundle::load(&config(&dir, ENCODER)).unwrap();
        assert_eq!(bundle.n_classes(), 2);
        assert_eq!(bundle.labels().unwrap(), vec!["Barley", "Rice"]);
        assert_eq!(bundle.digests().len(), 3);
        assert_eq!(bundle.digests()[0].sha256, hex_digest(SCALER.as_bytes()));
    }

    #[test]
    fn class_count_mismatch_is_a_load_error() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, r#"{"classes":["Barley","Rice","Wheat"]}"#);
        assert!(matches!(
            ModelBundle::load(&cfg),
            Err(AdvisorError::ModelLoad { .. })
        ));
    }

    #[test]
    fn missing_file_names_the_artifact() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, ENCODER);
        cfg.classifier_path = dir.path().join("nope.json").to_string_lossy().to_string();
        match ModelBundle::load(&cfg) {
            Err(AdvisorError::ModelLoad { artifact, .. }) => assert_eq!(artifact, "classifier"),
            other => panic!("expected load error, got {other:?}"),
        }
    }

    #[test]
    fn checksum_mismatch_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, ENCODER);
        cfg.checksums.insert("scaler".into(), "00".repeat(32));
        assert!(ModelBundle::load(&cfg).is_err());

        cfg.checksums
            .insert("scaler".into(), hex_digest(SCALER.as_bytes()).to_uppercase());
        assert!(ModelBundle::load(&cfg).is_ok());
    }
}
