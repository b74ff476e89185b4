/// Default marker cutoff in CFU/ml.
pub const DEFAULT_THRESHOLD: f64 = 2000.0;

/// Whether a bar of `height` gets a threshold marker.
pub fn annotate(height: f64, threshold: f64) -> bool {
    height <= threshold
}

/// Scientific notation with two decimals and a signed, two-digit exponent,
/// e.g. `1.41e+03`.
pub fn format_exponential(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let raw = format!("{value:.2e}");
    let Some((mantissa, exponent)) = raw.split_once('e') else {
        return raw;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.abs())
}
