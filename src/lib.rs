//! Single-sample rainfall prediction: feature scaling around a TorchScript
//! sequence regressor, plus the HTTP adapter that serves it.

pub mod config;
pub mod error;
pub mod fitting;
pub mod model;
pub mod pipeline;
pub mod scaler;
pub mod server;
pub mod types;

pub use error::{ErrorKind, PredictError};
pub use model::{SequenceModel, TensorData};
pub use pipeline::{InferencePipeline, RainfallService};
pub use scaler::MinMaxScaler;
