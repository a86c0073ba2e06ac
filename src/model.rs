use anyhow::{bail, Context, Result};
use std::path::Path;
use tch::{kind::Kind, CModule, Device, Tensor};

use crate::types::N_FEATURES;

/// Dense row-major f32 buffer with an explicit shape; the only thing that
/// crosses the pipeline/model boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorData {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl TensorData {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            bail!(
                "shape {:?} needs {} values, got {}",
                shape,
                expected,
                data.len()
            );
        }
        Ok(Self { shape, data })
    }

    /// One sample, one time step: `(batch=1, time_steps=1, features=len)`.
    pub fn single_step(features: &[f64]) -> Self {
        Self {
            shape: vec![1, 1, features.len()],
            data: features.iter().map(|&v| v as f32).collect(),
        }
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        let n = shape.iter().product();
        Self {
            shape,
            data: vec![0.0; n],
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// A trained sequence regressor. Input is `(1, 1, F)`, output `(1, 1)`.
///
/// Implementations need only be `Send`: the pipeline serialises calls.
pub trait SequenceModel: Send {
    fn predict(&self, input: &TensorData) -> Result<TensorData>;
}

/// TorchScript module exported from the trained network.
pub struct TorchModel {
    model: CModule,
    device: Device,
}

impl TorchModel {
    pub fn load(model_path: impl AsRef<Path>) -> Result<Self> {
        let model_path = model_path.as_ref();
        let device = Device::Cpu;

        let model = CModule::load_on_device(model_path, device)
            .with_context(|| format!("failed to load TorchScript {}", model_path.display()))?;
        let mdl = Self { model, device };

        // Probe output shape with a dummy forward — expect [1, 1]
        let probe = mdl
            .predict(&TensorData::zeros(vec![1, 1, N_FEATURES]))
            .context("warmup forward failed")?;
        if probe.shape() != [1usize, 1] {
            bail!("unexpected model output size: {:?}", probe.shape());
        }
        tracing::info!(path = %model_path.display(), "warmup forward ok");

        Ok(mdl)
    }
}

impl SequenceModel for TorchModel {
    fn predict(&self, input: &TensorData) -> Result<TensorData> {
        let dims: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
        let x = Tensor::from_slice(input.data())
            .reshape(dims.as_slice())
            .to_device(self.device);

        let y = self
            .model
            .forward_ts(&[x])?
            .to_kind(Kind::Float)
            .to_device(Device::Cpu)
            .contiguous();

        let shape: Vec<usize> = y.size().iter().map(|&d| d as usize).collect();
        let flat = y.view([-1]);
        let data = Vec::<f32>::try_from(&flat).context("failed to read model output")?;
        TensorData::new(shape, data)
    }
}
