use serde::Serialize;
use std::collections::HashMap;

/// One model input column: its wire name and the value substituted when a
/// request omits it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feature {
    pub name: &'static str,
    pub default: f64,
}

pub const N_FEATURES: usize = 7;

/// Authoritative input order. Scaler bounds are indexed positionally against
/// this table, so it must match the order the scalers were fit in.
pub const FEATURES: [Feature; N_FEATURES] = [
    Feature { name: "rfh_avg", default: 0.0 },
    Feature { name: "r1h_avg", default: 0.0 },
    Feature { name: "r3h_avg", default: 0.0 },
    Feature { name: "month", default: 1.0 },
    Feature { name: "dekad", default: 1.0 },
    Feature { name: "rfh_lag1", default: 0.0 },
    Feature { name: "rfh_lag3", default: 0.0 },
];

pub fn feature_names() -> Vec<String> {
    FEATURES.iter().map(|f| f.name.to_string()).collect()
}

/// Flat request body: feature name -> JSON value (number, numeric string or null).
pub type RawInput = HashMap<String, serde_json::Value>;

/// Assembled inputs in canonical order, still in physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; N_FEATURES]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// `name=value` pairs for log lines.
    pub fn describe(&self) -> String {
        FEATURES
            .iter()
            .zip(self.0.iter())
            .map(|(f, v)| format!("{}={:.3}", f.name, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        let mut values = [0.0; N_FEATURES];
        for (slot, f) in values.iter_mut().zip(FEATURES.iter()) {
            *slot = f.default;
        }
        FeatureVector(values)
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PredictionOut {
    pub success: bool,
    pub prediction: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ErrorOut {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct HealthOut {
    pub status: &'static str,
    pub model_loaded: bool,
}
