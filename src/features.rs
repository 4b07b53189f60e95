//! Typed agronomic inputs.
//!
//! `FeatureField` fixes the canonical column order used by the scaler, the
//! classifier and every error report. `FEATURE_BOUNDS` is the only place the
//! accepted ranges are written down.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of features the model consumes.
pub const FEATURE_COUNT: usize = 7;

/// One of the seven soil/climate measurements, in model column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureField {
    #[serde(rename = "N")]
    Nitrogen,
    #[serde(rename = "P")]
    Phosphorus,
    #[serde(rename = "K")]
    Potassium,
    #[serde(rename = "temperature")]
    Temperature,
    #[serde(rename = "humidity")]
    Humidity,
    #[serde(rename = "ph")]
    Ph,
    #[serde(rename = "rainfall")]
    Rainfall,
}

impl FeatureField {
    pub const ALL: [FeatureField; FEATURE_COUNT] = [
        FeatureField::Nitrogen,
        FeatureField::Phosphorus,
        FeatureField::Potassium,
        FeatureField::Temperature,
        FeatureField::Humidity,
        FeatureField::Ph,
        FeatureField::Rainfall,
    ];

    /// Request key for this field.
    pub fn key(self) -> &'static str {
        match self {
            FeatureField::Nitrogen => "N",
            FeatureField::Phosphorus => "P",
            FeatureField::Potassium => "K",
            FeatureField::Temperature => "temperature",
            FeatureField::Humidity => "humidity",
            FeatureField::Ph => "ph",
            FeatureField::Rainfall => "rainfall",
        }
    }

    /// Column position in the model input.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn bounds(self) -> &'static FeatureBounds {
        &FEATURE_BOUNDS[self.index()]
    }
}

impl fmt::Display for FeatureField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Inclusive agronomic range for one field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureBounds {
    pub field: FeatureField,
    pub min: f64,
    pub max: f64,
    pub label: &'static str,
    /// Suffix appended to the range, including any leading space.
    pub unit: &'static str,
}

impl FeatureBounds {
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Human-readable rule, e.g. `Nitrogen must be between 0-140 ppm`.
    pub fn rule(&self) -> String {
        format!(
            "{} must be between {}-{}{}",
            self.label, self.min, self.max, self.unit
        )
    }
}

pub const FEATURE_BOUNDS: [FeatureBounds; FEATURE_COUNT] = [
    FeatureBounds {
        field: FeatureField::Nitrogen,
        min: 0.0,
        max: 140.0,
        label: "Nitrogen",
        unit: " ppm",
    },
    FeatureBounds {
        field: FeatureField::Phosphorus,
        min: 5.0,
        max: 145.0,
        label: "Phosphorus",
        unit: " ppm",
    },
    FeatureBounds {
        field: FeatureField::Potassium,
        min: 5.0,
        max: 205.0,
        label: "Potassium",
        unit: " ppm",
    },
    FeatureBounds {
        field: FeatureField::Temperature,
        min: 8.0,
        max: 43.0,
        label: "Temperature",
        unit: "°C",
    },
    FeatureBounds {
        field: FeatureField::Humidity,
        min: 14.0,
        max: 100.0,
        label: "Humidity",
        unit: "%",
    },
    FeatureBounds {
        field: FeatureField::Ph,
        min: 3.5,
        max: 9.5,
        label: "pH",
        unit: "",
    },
    FeatureBounds {
        field: FeatureField::Rainfall,
        min: 20.0,
        max: 300.0,
        label: "Rainfall",
        unit: "mm",
    },
];

/// A validated set of measurements. Only `input_validator::validate` and
/// tests build these from untrusted data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "P")]
    pub phosphorus: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

impl FeatureVector {
    /// Build from values in canonical order.
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        let [nitrogen, phosphorus, potassium, temperature, humidity, ph, rainfall] = values;
        Self {
            nitrogen,
            phosphorus,
            potassium,
            temperature,
            humidity,
            ph,
            rainfall,
        }
    }

    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }

    pub fn get(&self, field: FeatureField) -> f64 {
        self.to_array()[field.index()]
    }
}

/// Scaler output in canonical column order. No range invariant applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledFeatures(pub [f64; FEATURE_COUNT]);

impl ScaledFeatures {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}
