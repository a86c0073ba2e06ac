//! Offline helpers for producing `scaler_X` / `scaler_y` artifacts.

use crate::error::{PredictError, Result};
use crate::scaler::MinMaxScaler;
use crate::types::{feature_names, FEATURES, N_FEATURES};
use std::io::Read;

/// Reference rows: inputs in canonical feature order and the matching target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    pub features: Vec<[f64; N_FEATURES]>,
    pub targets: Vec<[f64; 1]>,
}

/// Bounds the deployed network was trained against.
pub fn reference_bounds() -> ReferenceData {
    ReferenceData {
        features: vec![
            [0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0],
            [200.0, 200.0, 600.0, 12.0, 3.0, 200.0, 200.0],
        ],
        targets: vec![[0.0], [300.0]],
    }
}

/// Parses a headered CSV holding every feature column plus `target`.
/// Column order in the file does not matter; extra columns are ignored.
pub fn read_reference_csv<R: Read>(reader: R, target: &str) -> Result<ReferenceData> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| PredictError::InvalidFitData(format!("cannot read header: {}", e)))?
        .clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PredictError::InvalidFitData(format!("missing column '{}'", name)))
    };
    let mut feature_cols = [0usize; N_FEATURES];
    for (slot, f) in feature_cols.iter_mut().zip(FEATURES.iter()) {
        *slot = column(f.name)?;
    }
    let target_col = column(target)?;

    let mut data = ReferenceData::default();
    for (line, record) in rdr.records().enumerate() {
        let record = record
            .map_err(|e| PredictError::InvalidFitData(format!("row {}: {}", line + 1, e)))?;
        let cell = |col: usize| -> Result<f64> {
            let raw = record.get(col).unwrap_or("");
            raw.parse::<f64>().map_err(|_| {
                PredictError::InvalidFitData(format!(
                    "row {} column '{}': '{}' is not a number",
                    line + 1,
                    &headers[col],
                    raw
                ))
            })
        };

        let mut row = [0.0; N_FEATURES];
        for (v, &col) in row.iter_mut().zip(feature_cols.iter()) {
            *v = cell(col)?;
        }
        data.features.push(row);
        data.targets.push([cell(target_col)?]);
    }

    if data.features.is_empty() {
        return Err(PredictError::InvalidFitData("dataset has no rows".into()));
    }
    Ok(data)
}

/// Fits `(scaler_X, scaler_y)`; `scaler_X` records the feature order it was fit in.
pub fn fit_scalers(data: &ReferenceData, target: &str) -> Result<(MinMaxScaler, MinMaxScaler)> {
    let scaler_x = MinMaxScaler::fit(&data.features)?.with_feature_names(feature_names())?;
    let scaler_y = MinMaxScaler::fit(&data.targets)?.with_feature_names(vec![target.to_string()])?;
    Ok((scaler_x, scaler_y))
}
