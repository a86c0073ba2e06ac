//! Request path: assemble -> scale -> reshape -> infer -> inverse-scale.
//!
//! [`RainfallService`] owns the startup outcome. Once `Ready`, the scalers are
//! read-only and shared freely; only the model call is serialised.

use anyhow::Context;
use parking_lot::Mutex;
use serde_json::Value;

use crate::config::Config;
use crate::error::{PredictError, Result};
use crate::model::{SequenceModel, TensorData, TorchModel};
use crate::scaler::MinMaxScaler;
use crate::types::{feature_names, FeatureVector, RawInput, FEATURES, N_FEATURES};

/// Reads the seven known features from a flat request, applying per-feature
/// defaults for absent or null entries.
pub fn assemble(raw: &RawInput) -> Result<FeatureVector> {
    let mut fv = FeatureVector::default();
    for (slot, f) in fv.0.iter_mut().zip(FEATURES.iter()) {
        if let Some(v) = raw.get(f.name) {
            if let Some(x) = coerce(f.name, v)? {
                *slot = x;
            }
        }
    }
    Ok(fv)
}

fn coerce(name: &str, v: &Value) -> Result<Option<f64>> {
    let x = match v {
        Value::Null => return Ok(None),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| PredictError::invalid_feature(name, "number out of range"))?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            PredictError::invalid_feature(name, format!("'{}' is not a number", s))
        })?,
        other => {
            return Err(PredictError::invalid_feature(
                name,
                format!("expected a number, got {}", other),
            ))
        }
    };
    if !x.is_finite() {
        return Err(PredictError::invalid_feature(name, "value is not finite"));
    }
    Ok(Some(x))
}

pub struct InferencePipeline {
    scaler_x: MinMaxScaler,
    scaler_y: MinMaxScaler,
    model: Mutex<Box<dyn SequenceModel>>,
    log_predictions: bool,
}

impl InferencePipeline {
    /// Checks that the scalers agree with the canonical feature layout.
    pub fn new(
        scaler_x: MinMaxScaler,
        scaler_y: MinMaxScaler,
        model: Box<dyn SequenceModel>,
    ) -> Result<Self> {
        if scaler_x.feature_count() != N_FEATURES {
            return Err(PredictError::ShapeMismatch {
                expected: N_FEATURES,
                actual: scaler_x.feature_count(),
            });
        }
        if scaler_y.feature_count() != 1 {
            return Err(PredictError::ShapeMismatch {
                expected: 1,
                actual: scaler_y.feature_count(),
            });
        }
        if let Some(names) = scaler_x.feature_names() {
            if names != feature_names().as_slice() {
                return Err(PredictError::Artifact(format!(
                    "scaler_X feature order {:?} does not match {:?}",
                    names,
                    feature_names()
                )));
            }
        }
        Ok(Self {
            scaler_x,
            scaler_y,
            model: Mutex::new(model),
            log_predictions: false,
        })
    }

    pub fn with_prediction_logging(mut self, on: bool) -> Self {
        self.log_predictions = on;
        self
    }

    pub fn predict(&self, raw: &RawInput) -> Result<f64> {
        let features = assemble(raw)?;
        self.predict_features(&features)
    }

    pub fn predict_features(&self, features: &FeatureVector) -> Result<f64> {
        let scaled = self.scaler_x.transform(features.as_slice())?;
        let input = TensorData::single_step(&scaled);

        let output = {
            let model = self.model.lock();
            model
                .predict(&input)
                .map_err(|e| PredictError::ModelInference(format!("{:#}", e)))?
        };
        if output.shape() != [1usize, 1] {
            return Err(PredictError::ModelInference(format!(
                "unexpected model output size: {:?}",
                output.shape()
            )));
        }

        let y_scaled = output.data()[0] as f64;
        if !y_scaled.is_finite() {
            return Err(PredictError::ModelInference(
                "model produced a non-finite value".into(),
            ));
        }
        let y = self.scaler_y.inverse_transform(&[y_scaled])?[0];

        if self.log_predictions {
            let nz = features.as_slice().iter().filter(|x| **x != 0.0).count();
            tracing::info!(
                "features=[{}] nonzero={} scaled_out={:.5} prediction={:.3}",
                features.describe(),
                nz,
                y_scaled,
                y
            );
        } else {
            tracing::debug!(prediction = y, "prediction ok");
        }
        Ok(y)
    }
}

/// Startup outcome.
pub enum ServiceState {
    Ready(InferencePipeline),
    Degraded { reason: String },
}

pub struct RainfallService {
    state: ServiceState,
}

impl RainfallService {
    pub fn ready(pipeline: InferencePipeline) -> Self {
        Self {
            state: ServiceState::Ready(pipeline),
        }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            state: ServiceState::Degraded {
                reason: reason.into(),
            },
        }
    }

    /// Loads both scalers and the TorchScript model. Never fails: any load
    /// error yields a degraded service.
    pub fn load(cfg: &Config) -> Self {
        Self::load_with(cfg, |path| {
            let m = TorchModel::load(path)?;
            Ok(Box::new(m) as Box<dyn SequenceModel>)
        })
    }

    /// Same as [`RainfallService::load`] with a caller-supplied model loader.
    pub fn load_with<F>(cfg: &Config, load_model: F) -> Self
    where
        F: FnOnce(&std::path::Path) -> anyhow::Result<Box<dyn SequenceModel>>,
    {
        let attempt = || -> anyhow::Result<InferencePipeline> {
            tracing::info!(path = %cfg.model_path.display(), "loading model");
            let model = load_model(cfg.model_path.as_path())
                .with_context(|| format!("model {}", cfg.model_path.display()))?;

            tracing::info!(
                x = %cfg.scaler_x_path.display(),
                y = %cfg.scaler_y_path.display(),
                "loading scalers"
            );
            let scaler_x = MinMaxScaler::load(&cfg.scaler_x_path).context("scaler_X")?;
            let scaler_y = MinMaxScaler::load(&cfg.scaler_y_path).context("scaler_y")?;

            let pipeline = InferencePipeline::new(scaler_x, scaler_y, model)
                .context("artifacts are incompatible")?;
            Ok(pipeline.with_prediction_logging(cfg.log_predictions))
        };

        match attempt() {
            Ok(p) => {
                tracing::info!("model and scalers loaded; service ready");
                Self::ready(p)
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                tracing::error!(%reason, "startup failed; service degraded");
                Self::degraded(reason)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ServiceState::Ready(_))
    }

    pub fn state(&self) -> &ServiceState {
        &self.state
    }

    pub fn predict(&self, raw: &RawInput) -> Result<f64> {
        match &self.state {
            ServiceState::Ready(p) => p.predict(raw),
            ServiceState::Degraded { reason } => {
                Err(PredictError::ServiceUnavailable(format!(
                    "model or scalers not loaded: {}",
                    reason
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: Value) -> RawInput {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn empty_input_uses_defaults() {
        let fv = assemble(&RawInput::new()).unwrap();
        assert_eq!(fv.0, [0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn null_counts_as_missing() {
        let fv = assemble(&raw(json!({"month": null, "dekad": 3}))).unwrap();
        assert_eq!(fv.0[3], 1.0);
        assert_eq!(fv.0[4], 3.0);
    }

    #[test]
    fn numeric_strings_are_parsed() {
        let fv = assemble(&raw(json!({"rfh_avg": " 12.5 ", "month": "7"}))).unwrap();
        assert_eq!(fv.0[0], 12.5);
        assert_eq!(fv.0[3], 7.0);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let fv = assemble(&raw(json!({"station": "x", "rfh_lag3": 4}))).unwrap();
        assert_eq!(fv.0[6], 4.0);
    }

    #[test]
    fn malformed_values_are_invalid_feature() {
        for v in [
            json!({"month": "not-a-number"}),
            json!({"rfh_avg": true}),
            json!({"dekad": [1]}),
            json!({"r1h_avg": {"v": 1}}),
            json!({"rfh_lag1": "NaN"}),
            json!({"rfh_lag1": "inf"}),
        ] {
            match assemble(&raw(v.clone())) {
                Err(PredictError::InvalidFeature { .. }) => {}
                other => panic!("{} gave {:?}", v, other),
            }
        }
    }

    #[test]
    fn invalid_feature_names_the_field() {
        let err = assemble(&raw(json!({"month": "june"}))).unwrap_err();
        assert_eq!(
            err,
            PredictError::InvalidFeature {
                name: "month".into(),
                reason: "'june' is not a number".into()
            }
        );
    }
}
