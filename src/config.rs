use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::PathBuf};

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub model_path: PathBuf,
    pub scaler_x_path: PathBuf,
    pub scaler_y_path: PathBuf,
    pub port: u16,
    /// Log every assembled feature vector and its prediction at info level.
    pub log_predictions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model/rainfall_model.pt"),
            scaler_x_path: PathBuf::from("model/scaler_X.json"),
            scaler_y_path: PathBuf::from("model/scaler_y.json"),
            port: 5000,
            log_predictions: false,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path))?;
        serde_json::from_str(&data).with_context(|| format!("invalid config JSON in {}", path))
    }

    /// Defaults, then the file named by `RAINFALL_CONFIG`, then env overrides.
    pub fn from_env() -> Result<Self> {
        let base = match std::env::var("RAINFALL_CONFIG") {
            Ok(path) => Self::load(&path)?,
            Err(_) => Self::default(),
        };
        Ok(base.with_overrides(|k| std::env::var(k).ok()))
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(p) = var("MODEL_PATH") {
            self.model_path = p.into();
        }
        if let Some(p) = var("SCALER_X_PATH") {
            self.scaler_x_path = p.into();
        }
        if let Some(p) = var("SCALER_Y_PATH") {
            self.scaler_y_path = p.into();
        }
        if let Some(p) = var("PORT") {
            match p.parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("PORT={:?} is not a valid port; using {}", p, self.port),
            }
        }
        if let Some(flag) = var("LOG_PRED") {
            self.log_predictions = flag == "1";
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let m: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| m.get(k).cloned()
    }

    #[test]
    fn env_overrides_win() {
        let cfg = Config::default().with_overrides(vars(&[
            ("MODEL_PATH", "/srv/m.pt"),
            ("PORT", "8080"),
            ("LOG_PRED", "1"),
        ]));
        assert_eq!(cfg.model_path, PathBuf::from("/srv/m.pt"));
        assert_eq!(cfg.scaler_x_path, PathBuf::from("model/scaler_X.json"));
        assert_eq!(cfg.port, 8080);
        assert!(cfg.log_predictions);
    }

    #[test]
    fn bad_port_keeps_previous() {
        let cfg = Config::default().with_overrides(vars(&[("PORT", "http")]));
        assert_eq!(cfg.port, 5000);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"port": 9000}"#).unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.model_path, PathBuf::from("model/rainfall_model.pt"));
    }

    #[test]
    fn missing_file_is_error() {
        assert!(Config::load("/nonexistent/rainfall.json").is_err());
    }
}
