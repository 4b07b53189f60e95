//! Library root for the `crop_advisor` crate

// Core error handling
pub mod errors;

// Feature schema and input validation
pub mod features;
pub mod input_validator;

// Model artifacts and inference
pub mod crop_classifier;
pub mod feature_scaler;
pub mod inference_engine;
pub mod label_encoder;
pub mod model_bundle;

// Crop knowledge and result composition
pub mod advisor;
pub mod crop_catalog;
pub mod recommendation;

// Configuration, logging & CLI
pub mod cli;
pub mod config_loader;
pub mod log_sink;

// Web server interface
pub mod api_errors;
pub mod app_state;
pub mod web;

pub use advisor::{CropAdvisor, ModelStatus};
pub use errors::{AdvisorError, AdvisorResult, ValidationError};
pub use features::{FeatureField, FeatureVector};
pub use inference_engine::{ClassProbabilityVector, InferenceEngine};
pub use recommendation::RecommendationResult;
