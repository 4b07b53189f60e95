//! Ranking and enrichment of a class distribution into the response payload.

use crate::crop_catalog::{CropCatalog, CropProfile};
use crate::errors::{AdvisorError, AdvisorResult};
use crate::features::FeatureVector;
use crate::inference_engine::{ClassProbability, ClassProbabilityVector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How many ranked alternatives a recommendation carries.
pub const TOP_K: usize = 3;

pub const PROFILE_UNAVAILABLE: &str = "Crop information not available";

/// Profile of the recommended crop, or the marker used when the catalog has
/// no entry for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CropInfo {
    Profile(CropProfile),
    Unavailable { error: String },
}

impl CropInfo {
    fn for_label(label: &str, catalog: &CropCatalog) -> Self {
        match catalog.lookup(label) {
            Some(profile) => CropInfo::Profile(profile.clone()),
            None => CropInfo::Unavailable {
                error: PROFILE_UNAVAILABLE.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub input: FeatureVector,
    pub recommendation: String,
    pub confidence: f64,
    /// `(label, probability)` pairs, highest first.
    pub top_recommendations: Vec<(String, f64)>,
    /// Single entry keyed by the recommended label.
    pub crop_info: BTreeMap<String, CropInfo>,
}

/// Rank `probabilities` and attach catalog metadata for the winner.
///
/// Ordering is by probability, descending; equal probabilities keep the
/// class enumeration order, so the ranking never depends on hashing.
pub fn compose(
    features: &FeatureVector,
    probabilities: &ClassProbabilityVector,
    catalog: &CropCatalog,
) -> AdvisorResult<RecommendationResult> {
    let ranked = rank(probabilities.entries());
    let top = ranked
        .first()
        .ok_or_else(|| AdvisorError::inference("cannot rank an empty distribution"))?;

    let recommendation = top.label.clone();
    let confidence = top.probability;
    let top_recommendations = ranked
        .iter()
        .take(TOP_K)
        .map(|e| (e.label.clone(), e.probability))
        .collect();

    let mut crop_info = BTreeMap::new();
    crop_info.insert(
        recommendation.clone(),
        CropInfo::for_label(&recommendation, catalog),
    );

    Ok(RecommendationResult {
        input: *features,
        recommendation,
        confidence,
        top_recommendations,
        crop_info,
    })
}

fn rank(entries: &[ClassProbability]) -> Vec<&ClassProbability> {
    let mut ranked: Vec<&ClassProbability> = entries.iter().collect();
    // stable sort keeps enumeration order among ties
    ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> FeatureVector {
        FeatureVector::from_array([90.0, 40.0, 40.0, 21.5, 82.0, 6.5, 202.0])
    }

    fn distribution(pairs: &[(&str, f64)]) -> ClassProbabilityVector {
        ClassProbabilityVector::new(
            pairs
                .iter()
                .map(|(label, p)| ClassProbability {
                    label: label.to_string(),
                    probability: *p,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn top_three_descending_with_winner_profile() {
        let catalog = CropCatalog::builtin().unwrap();
        let probs = distribution(&[
            ("Barley", 0.05),
            ("Corn", 0.15),
            ("Rice", 0.6),
            ("Wheat", 0.2),
        ]);
        let result = compose(&features(), &probs, &catalog).unwrap();

        assert_eq!(result.recommendation, "Rice");
        assert_eq!(result.confidence, 0.6);
        let labels: Vec<&str> = result
            .top_recommendations
            .iter()
            .map(|(l, _)| l.as_str())
            .collect();
        assert_eq!(labels, vec!["Rice", "Wheat", "Corn"]);
        match &result.crop_info["Rice"] {
            CropInfo::Profile(p) => assert_eq!(p.season, "Monsoon"),
            other => panic!("expected profile, got {other:?}"),
        }
        assert_eq!(result.input, features());
    }

    #[test]
    fn ties_follow_enumeration_order() {
        let catalog = CropCatalog::builtin().unwrap();
        let probs = distribution(&[
            ("Maize", 0.25),
            ("Barley", 0.25),
            ("Corn", 0.25),
            ("Wheat", 0.25),
        ]);
        let result = compose(&features(), &probs, &catalog).unwrap();
        assert_eq!(result.recommendation, "Maize");
        let labels: Vec<&str> = result
            .top_recommendations
            .iter()
            .map(|(l, _)| l.as_str())
            .collect();
        assert_eq!(labels, vec!["Maize", "Barley", "Corn"]);
    }

    #[test]
    fn fewer_than_three_classes() {
        let catalog = CropCatalog::builtin().unwrap();
        let probs = distribution(&[("Rice", 0.7), ("Wheat", 0.3)]);
        let result = compose(&features(), &probs, &catalog).unwrap();
        assert_eq!(result.top_recommendations.len(), 2);
    }

    #[test]
    fn unknown_crop_gets_placeholder() {
        let catalog = CropCatalog::builtin().unwrap();
        let probs = distribution(&[("Quinoa", 0.9), ("Rice", 0.1)]);
        let result = compose(&features(), &probs, &catalog).unwrap();
        assert_eq!(
            result.crop_info["Quinoa"],
            CropInfo::Unavailable {
                error: PROFILE_UNAVAILABLE.to_string()
            }
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json["crop_info"]["Quinoa"]["error"],
            "Crop information not available"
        );
    }

    #[test]
    fn serializes_top_recommendations_as_pairs() {
        let catalog = CropCatalog::builtin().unwrap();
        let probs = distribution(&[("Rice", 0.75), ("Wheat", 0.25)]);
        let json = serde_json::to_value(compose(&features(), &probs, &catalog).unwrap()).unwrap();
        assert_eq!(json["top_recommendations"][0][0], "Rice");
        assert_eq!(json["top_recommendations"][0][1], 0.75);
        assert_eq!(json["input"]["rainfall"], 202.0);
        assert_eq!(json["crop_info"]["Rice"]["soil_type"], "Clayey soil, well-drained");
    }
}
