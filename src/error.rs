use std::fmt;
use thiserror::Error;

/// Which categorical input a lookup failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryField {
    Country,
    Crop,
}

impl fmt::Display for CategoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryField::Country => write!(f, "country"),
            CategoryField::Crop => write!(f, "crop"),
        }
    }
}

/// Pipeline stage that detected a width mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Scaler,
    Expander,
    Model,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Scaler => write!(f, "scaler"),
            Stage::Expander => write!(f, "polynomial expander"),
            Stage::Model => write!(f, "regression model"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load {path}: {reason}")]
    SchemaLoad { path: String, reason: String },

    #[error("unknown {field}: {value:?}")]
    UnknownCategory { field: CategoryField, value: String },

    #[error("{field} out of range: {value}")]
    InputRange { field: &'static str, value: f64 },

    #[error("{stage} expects {expected} features, got {actual}")]
    PipelineShape {
        stage: Stage,
        expected: usize,
        actual: usize,
    },

    #[error("inference failed: {0}")]
    Inference(String),
}

impl PipelineError {
    pub(crate) fn schema_load(path: impl fmt::Display, reason: impl fmt::Display) -> Self {
        PipelineError::SchemaLoad {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Stable tag used in adapter responses.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::SchemaLoad { .. } => "schema_load",
            PipelineError::UnknownCategory { .. } => "unknown_category",
            PipelineError::InputRange { .. } => "input_range",
            PipelineError::PipelineShape { .. } => "pipeline_shape",
            PipelineError::Inference(_) => "inference",
        }
    }

    /// True for errors the caller can fix by resubmitting different inputs.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::UnknownCategory { .. } | PipelineError::InputRange { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
