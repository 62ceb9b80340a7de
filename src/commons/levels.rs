//! Flood level labels.
//!
//! Source and output filenames use an underscore as the decimal separator
//! (e.g. "0_1m" -> 0.1 m). Helpers here create and interpret those labels so
//! the rest of the pipeline can treat the underscore as a decimal point when
//! reporting the depth value.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LabelError {
    #[error("flood level label is missing the 'm' unit suffix: {0:?}")]
    MissingUnit(String),
    #[error("flood level label does not contain a valid depth: {0:?}")]
    InvalidDepth(String),
}

/// Return the flood level label for a given depth in meters.
///
/// Examples: 0.0 -> "0_0m", 0.1 -> "0_1m", 2.3 -> "2_3m".
pub fn level_label(meters: f64) -> String {
    let whole = meters.trunc() as u64;
    let tenths = ((meters - whole as f64) * 10.0).round() as u64;
    format!("{}_{}m", whole, tenths)
}

/// Convert a label like "0_1m" back to a depth in meters (0.1).
/// The underscore is treated as the decimal point.
pub fn parse_label(label: &str) -> Result<f64, LabelError> {
    let depth = label
        .strip_suffix('m')
        .ok_or_else(|| LabelError::MissingUnit(label.to_string()))?;
    depth
        .replace('_', ".")
        .parse::<f64>()
        .map_err(|_| LabelError::InvalidDepth(label.to_string()))
}

/// Build the ordered list of labels for every multiple of `step` from 0 up to
/// `max_level` inclusive. The count is derived from a rounded ratio so that
/// the maximum level is never lost to floating point division.
pub fn level_labels(max_level: f64, step: f64) -> Vec<String> {
    let steps = (max_level / step).round() as usize;
    (0..=steps).map(|i| level_label(i as f64 * step)).collect()
}
