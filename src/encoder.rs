use ndarray::Array1;

use crate::error::{CategoryField, PipelineError, Result};
use crate::schema::SchemaRegistry;
use crate::types::{FeatureVector, RawInput};

pub const MIN_TEMP_C: f64 = -10.0;
pub const MAX_TEMP_C: f64 = 50.0;
/// Above the wettest place on record.
pub const MAX_RAINFALL_MM: f64 = 30_000.0;
/// Well above any single country's annual use.
pub const MAX_PESTICIDES_TONNES: f64 = 10_000_000.0;

/// Builds closed-world feature rows against a schema registry.
pub struct FeatureEncoder<'a> {
    schema: &'a SchemaRegistry,
}

impl<'a> FeatureEncoder<'a> {
    pub fn new(schema: &'a SchemaRegistry) -> Self {
        Self { schema }
    }

    /// Range and vocabulary checks, in that order. Nothing is computed if
    /// this fails.
    pub fn validate(&self, input: &RawInput) -> Result<(usize, usize)> {
        check_range("average_rainfall", input.average_rainfall, 0.0, MAX_RAINFALL_MM)?;
        check_range("pesticides_tonnes", input.pesticides_tonnes, 0.0, MAX_PESTICIDES_TONNES)?;
        check_range("avg_temp", input.avg_temp, MIN_TEMP_C, MAX_TEMP_C)?;

        let country = self.schema.country_slot(&input.country).ok_or_else(|| {
            PipelineError::UnknownCategory {
                field: CategoryField::Country,
                value: input.country.clone(),
            }
        })?;
        let crop = self
            .schema
            .crop_slot(&input.crop)
            .ok_or_else(|| PipelineError::UnknownCategory {
                field: CategoryField::Crop,
                value: input.crop.clone(),
            })?;
        Ok((country, crop))
    }

    pub fn encode(&self, input: &RawInput) -> Result<FeatureVector> {
        let (country, crop) = self.validate(input)?;

        // numeric slots first, then an all-zero one-hot block
        let mut row = Array1::<f64>::zeros(self.schema.len());
        row[0] = input.average_rainfall;
        row[1] = input.pesticides_tonnes;
        row[2] = input.avg_temp;
        row[country] = 1.0;
        row[crop] = 1.0;

        Ok(FeatureVector::from(row))
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    // NaN fails both comparisons
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(PipelineError::InputRange { field, value })
    }
}
