//! Cell-level coercion helpers shared by the detectors.
//!
//! Numeric cells become `Option<f64>`: `None` is the explicit "unknown" state
//! for blank, non-numeric or non-finite content. Identity cells used as join
//! keys are normalized to a canonical string so that `7`, `7.0` and ` 7 `
//! from two differently typed sources compare equal.

/// Coerces a raw cell to a number, returning `None` when the value is unknown.
pub fn coerce_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Coerces a raw cell to a number, treating unknown content as zero.
pub fn coerce_numeric_or_zero(raw: &str) -> f64 {
    coerce_numeric(raw).unwrap_or(0.0)
}

/// Canonical join key for an identity cell. Blank identities yield `None` and
/// never match anything.
pub fn canonical_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 => {
            Some(format!("{}", value as i64))
        }
        _ => Some(trimmed.to_string()),
    }
}

/// Renders a numeric value for display, dropping a zero fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        let rendered = format!("{value:.4}");
        let trimmed = rendered.trim_end_matches('0');
        trimmed.trim_end_matches('.').to_string()
    }
}
