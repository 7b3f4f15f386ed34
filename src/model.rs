use ndarray::Array1;
use serde::Deserialize;
use std::path::Path;

use crate::error::{PipelineError, Result, Stage};
use crate::transform::read_json;
use crate::types::ExpandedVector;

/// Final stage of the pipeline: expanded row -> native-unit yield.
pub trait Regressor: Send + Sync {
    /// Expected input width, if the backend knows it up front.
    fn n_features(&self) -> Option<usize>;

    fn predict(&self, x: &ExpandedVector) -> Result<f64>;
}

#[derive(Deserialize)]
struct LinearJson {
    coef: Vec<f64>,
    #[serde(default)]
    intercept: f64,
}

/// Ordinary least squares weights: `intercept + coef · x`.
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    coef: Array1<f64>,
    intercept: f64,
}

impl LinearRegressor {
    pub fn new(coef: Vec<f64>, intercept: f64) -> Result<Self> {
        if coef.is_empty() {
            return Err(PipelineError::schema_load("<model>", "empty coefficient vector"));
        }
        if !intercept.is_finite() || coef.iter().any(|c| !c.is_finite()) {
            return Err(PipelineError::schema_load("<model>", "non-finite coefficient"));
        }
        Ok(Self {
            coef: Array1::from_vec(coef),
            intercept,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw: LinearJson = read_json(path)?;
        Self::new(raw.coef, raw.intercept).map_err(|e| crate::transform::relabel(e, path))
    }
}

impl Regressor for LinearRegressor {
    fn n_features(&self) -> Option<usize> {
        Some(self.coef.len())
    }

    fn predict(&self, x: &ExpandedVector) -> Result<f64> {
        if x.len() != self.coef.len() {
            return Err(PipelineError::PipelineShape {
                stage: Stage::Model,
                expected: self.coef.len(),
                actual: x.len(),
            });
        }
        Ok(self.intercept + self.coef.dot(x.values()))
    }
}

#[cfg(feature = "torchscript")]
pub use torchscript::TorchScriptRegressor;

#[cfg(feature = "torchscript")]
mod torchscript {
    use super::*;
    use tch::{kind::Kind, CModule, Device, Tensor};

    /// A TorchScript module taking `[1, n]` and returning a single value.
    pub struct TorchScriptRegressor {
        model: CModule,
        device: Device,
        in_dim: usize,
    }

    impl TorchScriptRegressor {
        pub fn load<P: AsRef<Path>>(path: P, in_dim: usize) -> Result<Self> {
            let path = path.as_ref();
            let device = Device::Cpu;
            let model = CModule::load_on_device(path, device).map_err(|e| {
                PipelineError::schema_load(path.display(), format!("failed to load TorchScript: {e}"))
            })?;

            // Probe output shape with a dummy forward; expect a single value
            let dummy = Tensor::zeros([1, in_dim as i64], (Kind::Float, device));
            let t = model
                .forward_ts(&[dummy])
                .map_err(|e| PipelineError::schema_load(path.display(), e))?;
            if t.numel() != 1 {
                return Err(PipelineError::schema_load(
                    path.display(),
                    format!("unexpected model output size: {:?}", t.size()),
                ));
            }

            Ok(Self {
                model,
                device,
                in_dim,
            })
        }
    }

    impl Regressor for TorchScriptRegressor {
        fn n_features(&self) -> Option<usize> {
            Some(self.in_dim)
        }

        fn predict(&self, x: &ExpandedVector) -> Result<f64> {
            if x.len() != self.in_dim {
                return Err(PipelineError::PipelineShape {
                    stage: Stage::Model,
                    expected: self.in_dim,
                    actual: x.len(),
                });
            }
            let row: Vec<f32> = x.values().iter().map(|&v| v as f32).collect();
            let input = Tensor::from_slice(&row)
                .reshape([1, self.in_dim as i64])
                .to_device(self.device);
            let out = self
                .model
                .forward_ts(&[input])
                .map_err(|e| PipelineError::Inference(e.to_string()))?;
            Ok(out.reshape([-1]).double_value(&[0]))
        }
    }
}

/// Pick a backend from the artifact's extension.
pub fn load_regressor<P: AsRef<Path>>(path: P, in_dim: usize) -> Result<Box<dyn Regressor>> {
    let path = path.as_ref();
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    match ext {
        "pt" | "pts" => load_torchscript(path, in_dim),
        _ => Ok(Box::new(LinearRegressor::load(path)?)),
    }
}

#[cfg(feature = "torchscript")]
fn load_torchscript(path: &Path, in_dim: usize) -> Result<Box<dyn Regressor>> {
    Ok(Box::new(TorchScriptRegressor::load(path, in_dim)?))
}

#[cfg(not(feature = "torchscript"))]
fn load_torchscript(path: &Path, _in_dim: usize) -> Result<Box<dyn Regressor>> {
    Err(PipelineError::schema_load(
        path.display(),
        "TorchScript models need the `torchscript` feature",
    ))
}
