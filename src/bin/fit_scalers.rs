//! Regenerates `scaler_X.json` / `scaler_y.json` from reference data.

use anyhow::{bail, Context, Result};
use clap::Parser;
use rainfall_predictor::fitting::{fit_scalers, read_reference_csv, reference_bounds};
use std::{fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fit_scalers")]
#[command(about = "Fit min/max scalers and write portable scaler artifacts", long_about = None)]
struct Cli {
    /// Reference dataset (CSV with a header row)
    #[arg(short, long, conflicts_with = "reference_bounds")]
    data: Option<PathBuf>,

    /// Target column in the dataset
    #[arg(short, long, default_value = "rfh")]
    target: String,

    /// Reproduce the training-time bounds instead of reading a dataset
    #[arg(long)]
    reference_bounds: bool,

    /// Directory the artifacts are written to
    #[arg(short, long, default_value = "model")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let data = match (&cli.data, cli.reference_bounds) {
        (Some(path), false) => {
            let file = fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            read_reference_csv(file, &cli.target)
                .with_context(|| format!("failed to read {}", path.display()))?
        }
        (None, true) => reference_bounds(),
        _ => bail!("pass either --data <csv> or --reference-bounds"),
    };
    tracing::info!(rows = data.features.len(), "reference data loaded");

    let (scaler_x, scaler_y) = fit_scalers(&data, &cli.target)?;

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("failed to create {}", cli.out_dir.display()))?;
    let x_path = cli.out_dir.join("scaler_X.json");
    let y_path = cli.out_dir.join("scaler_y.json");
    scaler_x.save(&x_path)?;
    scaler_y.save(&y_path)?;

    tracing::info!(path = %x_path.display(), bounds = ?scaler_x.bounds(), "wrote scaler_X");
    tracing::info!(path = %y_path.display(), bounds = ?scaler_y.bounds(), "wrote scaler_y");
    Ok(())
}
