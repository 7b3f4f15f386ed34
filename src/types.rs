use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// One prediction request as supplied by a presentation adapter.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawInput {
    pub country: String,
    pub crop: String,
    pub average_rainfall: f64, // mm/year
    pub pesticides_tonnes: f64,
    pub avg_temp: f64, // °C
}

impl RawInput {
    pub fn new(
        country: impl Into<String>,
        crop: impl Into<String>,
        average_rainfall: f64,
        pesticides_tonnes: f64,
        avg_temp: f64,
    ) -> Self {
        Self {
            country: country.into(),
            crop: crop.into(),
            average_rainfall,
            pesticides_tonnes,
            avg_temp,
        }
    }
}

macro_rules! row_vector {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(Array1<f64>);

        impl $name {
            pub fn from_vec(values: Vec<f64>) -> Self {
                Self(Array1::from_vec(values))
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn values(&self) -> &Array1<f64> {
                &self.0
            }

            pub fn as_slice(&self) -> &[f64] {
                self.0.as_slice().unwrap_or(&[])
            }
        }

        impl From<Array1<f64>> for $name {
            fn from(values: Array1<f64>) -> Self {
                Self(values)
            }
        }
    };
}

row_vector!(
    /// Encoded row aligned 1:1 with the schema columns (raw numeric values).
    FeatureVector
);
row_vector!(
    /// Feature row after standardization.
    ScaledVector
);
row_vector!(
    /// Standardized row after polynomial expansion.
    ExpandedVector
);

/// Model output converted to the user-facing unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub native_value: f64,
    pub converted_value: f64,
    pub unit: &'static str,
    pub message: String,
}

/// Externally observable lifecycle of a single request.
#[derive(Debug)]
pub enum RequestState {
    Pending(RawInput),
    Completed(PredictionResult),
    Rejected(PipelineError),
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestState::Pending(_))
    }
}
