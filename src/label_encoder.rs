use crate::errors::{AdvisorError, AdvisorResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maps class indices back to crop names.
pub trait LabelDecoder: Send + Sync {
    fn decode(&self, index: usize) -> AdvisorResult<&str>;

    fn n_classes(&self) -> usize;
}

/// Fitted label encoder; `classes[i]` is the label of class `i`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> AdvisorResult<Self> {
        if classes.is_empty() {
            return Err(AdvisorError::model_load("label_encoder", "no classes"));
        }
        let mut seen = HashSet::new();
        for label in &classes {
            if label.trim().is_empty() {
                return Err(AdvisorError::model_load("label_encoder", "empty class label"));
            }
            if !seen.insert(label.as_str()) {
                return Err(AdvisorError::model_load(
                    "label_encoder",
                    format!("duplicate class label '{label}'"),
                ));
            }
        }
        Ok(Self { classes })
    }

    pub fn from_json(json: &str) -> AdvisorResult<Self> {
        #[derive(Deserialize)]
        struct Artifact {
            classes: Vec<String>,
        }
        let artifact: Artifact = serde_json::from_str(json).map_err(|e| {
            AdvisorError::model_load("label_encoder", format!("invalid JSON: {e}"))
        })?;
        Self::new(artifact.classes)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

impl LabelDecoder for LabelEncoder {
    fn decode(&self, index: usize) -> AdvisorResult<&str> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| AdvisorError::inference(format!("class index {index} out of range")))
    }

    fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_by_index() {
        let enc = LabelEncoder::from_json(r#"{"classes": ["Barley", "Rice"]}"#).unwrap();
        assert_eq!(enc.decode(1).unwrap(), "Rice");
        assert_eq!(enc.n_classes(), 2);
        assert!(enc.decode(2).is_err());
    }

    #[test]
    fn rejects_duplicates_and_empty() {
        assert!(LabelEncoder::new(vec!["Rice".into(), "Rice".into()]).is_err());
        assert!(LabelEncoder::new(Vec::new()).is_err());
        assert!(LabelEncoder::new(vec![" ".into()]).is_err());
    }

    #[test]
    fn json_goes_through_the_same_checks() {
        let duplicate = LabelEncoder::from_json(r#"{"classes": ["Rice", "Rice"]}"#);
        assert!(matches!(duplicate, Err(AdvisorError::ModelLoad { .. })));
        assert!(LabelEncoder::from_json(r#"{"classes": []}"#).is_err());
        assert!(LabelEncoder::from_json(r#"{"classes": ["Rice", ""]}"#).is_err());
    }
}
