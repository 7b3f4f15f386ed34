//! Crop yield estimation from a pre-fitted regression pipeline.
//!
//! Raw agronomic inputs are encoded against the training-time schema, then
//! standardized, polynomially expanded and fed to a regression model. The
//! native-unit output is converted to quintal/acre for display.

pub mod config;
pub mod encoder;
pub mod error;
pub mod format;
pub mod http;
pub mod model;
pub mod pipeline;
pub mod reference;
pub mod schema;
pub mod transform;
pub mod types;

pub use error::{PipelineError, Result};
pub use pipeline::PipelineContext;
pub use types::{PredictionResult, RawInput, RequestState};

/// Loads every startup artifact named by `cfg` and checks they agree.
pub fn load_context(cfg: &config::Config) -> Result<PipelineContext> {
    let schema = schema::SchemaRegistry::load(&cfg.schema_path)?;
    let scaler = transform::StandardScaler::load(&cfg.scaler_path)?;
    let expander = transform::PolynomialExpander::load(&cfg.expander_path)?;
    let model = model::load_regressor(&cfg.model_path, expander.n_output())?;
    PipelineContext::new(schema, scaler, expander, model)
}
