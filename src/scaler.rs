//! Per-feature min/max rescaling and its portable on-disk form.
//!
//! A fitted [`MinMaxScaler`] is immutable. The bounds are indexed by position,
//! so callers must feed rows in the same column order used at fit time.

use crate::error::{PredictError, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

pub const ARTIFACT_FORMAT: &str = "minmax-scaler";
pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    bounds: Vec<(f64, f64)>,
    feature_names: Option<Vec<String>>,
}

impl MinMaxScaler {
    /// Builds a scaler from known bounds. Every pair must be finite with `max >= min`.
    pub fn from_bounds(bounds: Vec<(f64, f64)>) -> Result<Self> {
        if bounds.is_empty() {
            return Err(PredictError::Artifact("scaler has no features".into()));
        }
        for (i, &(min, max)) in bounds.iter().enumerate() {
            if !min.is_finite() || !max.is_finite() {
                return Err(PredictError::Artifact(format!(
                    "feature {} has non-finite bounds ({}, {})",
                    i, min, max
                )));
            }
            if max < min {
                return Err(PredictError::Artifact(format!(
                    "feature {} has max {} below min {}",
                    i, max, min
                )));
            }
        }
        Ok(Self {
            bounds,
            feature_names: None,
        })
    }

    /// Column-wise min and max over `samples`.
    pub fn fit<R: AsRef<[f64]>>(samples: &[R]) -> Result<Self> {
        let first = samples
            .first()
            .ok_or_else(|| PredictError::InvalidFitData("no samples".into()))?
            .as_ref();
        if first.is_empty() {
            return Err(PredictError::InvalidFitData("rows have no columns".into()));
        }

        let width = first.len();
        let mut bounds: Vec<(f64, f64)> = first.iter().map(|&v| (v, v)).collect();
        for (row_idx, row) in samples.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(PredictError::InvalidFitData(format!(
                    "row {} has {} values, expected {}",
                    row_idx,
                    row.len(),
                    width
                )));
            }
            for (col, (&v, b)) in row.iter().zip(bounds.iter_mut()).enumerate() {
                if !v.is_finite() {
                    return Err(PredictError::InvalidFitData(format!(
                        "row {} column {} is not finite",
                        row_idx, col
                    )));
                }
                b.0 = b.0.min(v);
                b.1 = b.1.max(v);
            }
        }

        Ok(Self {
            bounds,
            feature_names: None,
        })
    }

    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.bounds.len() {
            return Err(PredictError::Artifact(format!(
                "{} feature names for {} features",
                names.len(),
                self.bounds.len()
            )));
        }
        self.feature_names = Some(names);
        Ok(self)
    }

    pub fn feature_count(&self) -> usize {
        self.bounds.len()
    }

    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// `(x - min) / (max - min)` per feature. Out-of-range values extrapolate;
    /// a constant feature maps to 0.0.
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_width(row)?;
        Ok(row
            .iter()
            .zip(self.bounds.iter())
            .map(|(&x, &(min, max))| {
                let range = max - min;
                if range == 0.0 {
                    0.0
                } else {
                    (x - min) / range
                }
            })
            .collect())
    }

    /// `x * (max - min) + min` per feature. A constant feature always yields its min.
    pub fn inverse_transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_width(row)?;
        Ok(row
            .iter()
            .zip(self.bounds.iter())
            .map(|(&x, &(min, max))| {
                let range = max - min;
                if range == 0.0 {
                    min
                } else {
                    x * range + min
                }
            })
            .collect())
    }

    fn check_width(&self, row: &[f64]) -> Result<()> {
        if row.len() != self.bounds.len() {
            return Err(PredictError::ShapeMismatch {
                expected: self.bounds.len(),
                actual: row.len(),
            });
        }
        Ok(())
    }

    pub fn to_artifact(&self) -> ScalerArtifact {
        ScalerArtifact {
            format: ARTIFACT_FORMAT.to_string(),
            version: ARTIFACT_VERSION,
            feature_count: self.bounds.len(),
            bounds: self.bounds.iter().map(|&(min, max)| [min, max]).collect(),
            feature_names: self.feature_names.clone(),
        }
    }

    pub fn from_artifact(artifact: ScalerArtifact) -> Result<Self> {
        if artifact.format != ARTIFACT_FORMAT {
            return Err(PredictError::Artifact(format!(
                "unknown format '{}'",
                artifact.format
            )));
        }
        if artifact.version != ARTIFACT_VERSION {
            return Err(PredictError::Artifact(format!(
                "unsupported version {} (expected {})",
                artifact.version, ARTIFACT_VERSION
            )));
        }
        if artifact.bounds.len() != artifact.feature_count {
            return Err(PredictError::Artifact(format!(
                "feature_count is {} but {} bounds are present",
                artifact.feature_count,
                artifact.bounds.len()
            )));
        }

        let scaler =
            Self::from_bounds(artifact.bounds.iter().map(|b| (b[0], b[1])).collect())?;
        match artifact.feature_names {
            Some(names) => scaler.with_feature_names(names),
            None => Ok(scaler),
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(&self.to_artifact())
            .map_err(|e| PredictError::Artifact(e.to_string()))
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let artifact: ScalerArtifact =
            serde_json::from_slice(bytes).map_err(|e| PredictError::Artifact(e.to_string()))?;
        Self::from_artifact(artifact)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            PredictError::Artifact(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::deserialize(&bytes).map_err(|e| match e {
            PredictError::Artifact(msg) => {
                PredictError::Artifact(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.serialize()?;
        fs::write(path, bytes).map_err(|e| {
            PredictError::Artifact(format!("failed to write {}: {}", path.display(), e))
        })
    }
}

/// Versioned on-disk record: `feature_count` `(min, max)` pairs in column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub format: String,
    pub version: u32,
    pub feature_count: usize,
    pub bounds: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}
