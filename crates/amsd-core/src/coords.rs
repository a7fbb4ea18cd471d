//! Degree/minute/second coordinate conversion

use thiserror::Error;

/// A coordinate string that is not in `D°M'S"H` form
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("expected 4 components (degrees, minutes, seconds, hemisphere), found {0}")]
    ComponentCount(usize),

    #[error("{component} '{value}' is not a number")]
    NotNumeric {
        component: &'static str,
        value: String,
    },
}

/// Convert e.g. `33°52'4"S` into signed decimal degrees, rounded to 6 places.
///
/// West and south are negative; any other hemisphere letter is positive.
pub fn dms_to_decimal(input: &str) -> Result<f64, CoordinateError> {
    // Latin-1 exports sometimes carry a stray 'Â' before the degree sign
    let cleaned = input.replace('Â', "");
    let parts: Vec<&str> = cleaned
        .split(['°', '\'', '"'])
        .map(str::trim)
        .collect();

    if parts.len() != 4 {
        return Err(CoordinateError::ComponentCount(parts.len()));
    }

    let degrees = parse_component("degrees", parts[0])?;
    let minutes = parse_component("minutes", parts[1])?;
    let seconds = parse_component("seconds", parts[2])?;
    let sign = match parts[3].to_lowercase().as_str() {
        "w" | "s" => -1.0,
        _ => 1.0,
    };

    let value = (degrees + minutes / 60.0 + seconds / 3600.0) * sign;
    Ok(round6(value))
}

fn parse_component(component: &'static str, value: &str) -> Result<f64, CoordinateError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CoordinateError::NotNumeric {
            component,
            value: value.to_string(),
        })
}

fn round6(value: f64) -> f64 {
    let rounded = (value * 1_000_000.0).round() / 1_000_000.0;
    // avoid writing "-0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
