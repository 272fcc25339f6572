//! Numeric unit conversions for GDTF physical values.
//!
//! GDTF channel functions carry physical from/to values whose meaning
//! depends on the attribute's physical unit. Each conversion is a pure
//! function `(value, paired_value) -> EntityValue`; `paired_value` is the
//! other end of the from/to pair, for conversions whose output form
//! depends on both ends (e.g. second vs. millisecond display).
//!
//! The resulting entity values display with the exact suffixes foreign
//! formats use (`50%`, `120deg`, `3.5Hz`).

use crate::model::{EntityValue, Unit};

/// A pure numeric unit conversion.
pub type UnitConversion = fn(f64, f64) -> EntityValue;

/// GDTF percent (already 0..100).
pub fn percent(value: f64, _paired: f64) -> EntityValue {
    EntityValue::percent(value)
}

/// Time in seconds; sub-second pairs are shown in milliseconds.
pub fn time(value: f64, paired: f64) -> EntityValue {
    if value.abs() < 1.0 && paired.abs() < 1.0 {
        EntityValue::number(value * 1000.0, Unit::Milliseconds)
    } else {
        EntityValue::seconds(value)
    }
}

/// Angle in degrees.
pub fn angle(value: f64, _paired: f64) -> EntityValue {
    EntityValue::degrees(value)
}

/// Angular speed, given in degrees per second, converted to Hz.
///
/// The sign convention (positive clockwise, negative counter-clockwise)
/// is decided by the caller from free-text name tokens, see
/// [`direction_sign`].
pub fn angular_speed(value: f64, _paired: f64) -> EntityValue {
    EntityValue::hertz(value / 360.0)
}

/// Frequency passed through unchanged.
pub fn frequency(value: f64, _paired: f64) -> EntityValue {
    EntityValue::hertz(value)
}

/// Color temperature in Kelvin.
pub fn color_temperature(value: f64, _paired: f64) -> EntityValue {
    EntityValue::kelvin(value)
}

/// Dimensionless value.
pub fn plain(value: f64, _paired: f64) -> EntityValue {
    EntityValue::number(value, Unit::None)
}

/// The conversion for a physical unit.
pub fn conversion_for(unit: Unit) -> UnitConversion {
    match unit {
        Unit::Percent => percent,
        Unit::Seconds | Unit::Milliseconds => time,
        Unit::Degrees => angle,
        Unit::Hertz => frequency,
        Unit::Kelvin => color_temperature,
        _ => plain,
    }
}

/// Rotation sign derived from free-text name tokens: `-1.0` when the
/// name contains a counter-clockwise token, `1.0` otherwise.
pub fn direction_sign(name: &str) -> f64 {
    let lowered = name.to_lowercase();
    if lowered.contains("ccw") || lowered.contains("counter-clockwise") || lowered.contains("counter clockwise") {
        -1.0
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_display() {
        assert_eq!(percent(50.0, 100.0).to_string(), "50%");
    }

    #[test]
    fn test_angle_display() {
        assert_eq!(angle(120.0, 540.0).to_string(), "120deg");
    }

    #[test]
    fn test_angular_speed_converts_to_hertz() {
        assert_eq!(angular_speed(1260.0, 0.0).to_string(), "3.5Hz");
    }

    #[test]
    fn test_time_uses_milliseconds_for_subsecond_pairs() {
        assert_eq!(time(0.5, 0.8).to_string(), "500ms");
        assert_eq!(time(0.5, 3.0).to_string(), "0.5s");
        assert_eq!(time(2.0, 3.0).to_string(), "2s");
    }

    #[test]
    fn test_direction_sign_tokens() {
        assert_eq!(direction_sign("Gobo rotation CW fast"), 1.0);
        assert_eq!(direction_sign("Gobo rotation CCW fast"), -1.0);
        assert_eq!(direction_sign("counter-clockwise spin"), -1.0);
        assert_eq!(direction_sign("plain name"), 1.0);
    }
}
