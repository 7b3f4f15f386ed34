use crate::types::PredictionResult;

/// Hectare-to-acre factor folded into the model's native unit.
pub const ACRE_FACTOR: f64 = 2.47105;
pub const UNIT: &str = "quintal/acre";

/// Converts a native-unit prediction and renders the result message.
pub fn format(native_value: f64) -> PredictionResult {
    let converted_value = truncate_2dp(native_value / 100.0 * ACRE_FACTOR);
    PredictionResult {
        native_value,
        converted_value,
        unit: UNIT,
        message: render(converted_value),
    }
}

/// Drops everything past the second decimal (toward zero).
pub fn truncate_2dp(value: f64) -> f64 {
    let v = (value * 100.0).trunc() / 100.0;
    // small negatives truncate to -0.0
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

fn render(value: f64) -> String {
    format!(
        "Predicted Crop Yield: {value:.2} {UNIT}.\n\n\
         1 acre of land is expected to produce {value:.2} quintals of crop yield."
    )
}
