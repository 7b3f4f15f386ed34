//! Immutable, process-wide prediction context.
//!
//! Built once at startup and shared read-only between requests; every call
//! runs encode -> scale -> expand -> predict -> format with no other step in
//! between.

use crate::encoder::FeatureEncoder;
use crate::error::{PipelineError, Result, Stage};
use crate::format;
use crate::model::Regressor;
use crate::schema::SchemaRegistry;
use crate::transform::{PolynomialExpander, StandardScaler};
use crate::types::{FeatureVector, PredictionResult, RawInput, RequestState};

pub struct PipelineContext {
    schema: SchemaRegistry,
    scaler: StandardScaler,
    expander: PolynomialExpander,
    model: Box<dyn Regressor>,
}

impl PipelineContext {
    /// Checks that every stage agrees on the width of its input.
    pub fn new(
        schema: SchemaRegistry,
        scaler: StandardScaler,
        expander: PolynomialExpander,
        model: Box<dyn Regressor>,
    ) -> Result<Self> {
        let checks = [
            (Stage::Scaler, scaler.n_features(), schema.len()),
            (Stage::Expander, expander.n_features_in(), scaler.n_features()),
            (
                Stage::Model,
                model.n_features().unwrap_or(expander.n_output()),
                expander.n_output(),
            ),
        ];
        for (stage, expected, actual) in checks {
            if expected != actual {
                return Err(PipelineError::PipelineShape {
                    stage,
                    expected,
                    actual,
                });
            }
        }

        Ok(Self {
            schema,
            scaler,
            expander,
            model,
        })
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    pub fn expanded_width(&self) -> usize {
        self.expander.n_output()
    }

    pub fn encode(&self, input: &RawInput) -> Result<FeatureVector> {
        FeatureEncoder::new(&self.schema).encode(input)
    }

    pub fn predict(&self, input: &RawInput) -> Result<PredictionResult> {
        let features = self.encode(input)?;
        let native = self.infer(features)?;
        Ok(format::format(native))
    }

    /// Native-unit prediction for an already encoded row.
    pub fn infer(&self, features: FeatureVector) -> Result<f64> {
        let scaled = self.scaler.scale(features)?;
        let expanded = self.expander.expand(scaled)?;
        let native = self.model.predict(&expanded)?;
        if !native.is_finite() {
            return Err(PipelineError::Inference(format!(
                "model produced non-finite value {native}"
            )));
        }
        Ok(native)
    }

    /// Drives a request from `Pending` to its terminal state.
    pub fn resolve(&self, state: RequestState) -> RequestState {
        match state {
            RequestState::Pending(input) => match self.predict(&input) {
                Ok(result) => RequestState::Completed(result),
                Err(err) => RequestState::Rejected(err),
            },
            done => done,
        }
    }

    /// One forward pass with the first known country and crop, so a bad
    /// deployment fails before serving traffic.
    pub fn warmup(&self) -> Result<PredictionResult> {
        let (country, crop) = match (
            self.schema.known_countries().first(),
            self.schema.known_crops().first(),
        ) {
            (Some(country), Some(crop)) => (country.clone(), crop.clone()),
            _ => return Err(PipelineError::schema_load("<schema>", "empty vocabulary")),
        };
        self.predict(&RawInput::new(country, crop, 0.0, 0.0, 0.0))
    }
}
