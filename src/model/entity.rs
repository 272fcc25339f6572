//! Physical entity values backing capability fields.
//!
//! A capability describes its physical effect with start/end entity
//! values: numbers with a unit (`50%`, `120deg`, `3.5Hz`) or keywords
//! (`fast`, `slow`, `stop`). Signed rotation values encode direction:
//! positive is clockwise, negative counter-clockwise.
//!
//! Display output is bit-exact for the unit suffixes foreign parsers
//! expect, so these strings can be embedded in exported files directly.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Physical unit of an entity value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Unit {
    Percent,
    Hertz,
    Rpm,
    Seconds,
    Milliseconds,
    Degrees,
    Kelvin,
    Lumens,
    Meters,
    /// Dimensionless (slot numbers, parameters).
    None,
}

impl Unit {
    /// The suffix foreign formats append to a number of this unit.
    pub fn suffix(&self) -> &'static str {
        match self {
            Unit::Percent => "%",
            Unit::Hertz => "Hz",
            Unit::Rpm => "rpm",
            Unit::Seconds => "s",
            Unit::Milliseconds => "ms",
            Unit::Degrees => "deg",
            Unit::Kelvin => "K",
            Unit::Lumens => "lm",
            Unit::Meters => "m",
            Unit::None => "",
        }
    }
}

/// One entity value: a number with a unit, or a keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityValue {
    Number { value: f64, unit: Unit },
    Keyword(SmolStr),
}

impl EntityValue {
    pub fn number(value: f64, unit: Unit) -> Self {
        Self::Number { value, unit }
    }

    pub fn percent(value: f64) -> Self {
        Self::number(value, Unit::Percent)
    }

    pub fn hertz(value: f64) -> Self {
        Self::number(value, Unit::Hertz)
    }

    pub fn degrees(value: f64) -> Self {
        Self::number(value, Unit::Degrees)
    }

    pub fn seconds(value: f64) -> Self {
        Self::number(value, Unit::Seconds)
    }

    pub fn kelvin(value: f64) -> Self {
        Self::number(value, Unit::Kelvin)
    }

    pub fn keyword(word: impl Into<SmolStr>) -> Self {
        Self::Keyword(word.into())
    }

    /// The numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number { value, .. } => Some(*value),
            Self::Keyword(_) => None,
        }
    }

    /// The keyword, if this is a keyword.
    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Self::Number { .. } => None,
            Self::Keyword(word) => Some(word.as_str()),
        }
    }

    /// True for negative numbers (counter-clockwise rotation) and
    /// keywords carrying a `CCW` token (`slow CCW`).
    pub fn is_counter_clockwise(&self) -> bool {
        match self {
            Self::Number { value, .. } => *value < 0.0,
            Self::Keyword(word) => word.contains("CCW"),
        }
    }
}

/// Format a number without a trailing `.0` so `50` stays `50`, not `50.0`.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

impl std::fmt::Display for EntityValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number { value, unit } => {
                write!(f, "{}{}", format_number(*value), unit.suffix())
            }
            Self::Keyword(word) => write!(f, "{word}"),
        }
    }
}

/// A start/end pair of entity values.
pub type EntityRange = (EntityValue, EntityValue);

/// A start/end pair with the same value on both ends.
pub fn steady(value: EntityValue) -> EntityRange {
    (value.clone(), value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_suffixes_are_exact() {
        assert_eq!(EntityValue::percent(50.0).to_string(), "50%");
        assert_eq!(EntityValue::degrees(120.0).to_string(), "120deg");
        assert_eq!(EntityValue::hertz(3.5).to_string(), "3.5Hz");
        assert_eq!(EntityValue::seconds(0.5).to_string(), "0.5s");
        assert_eq!(EntityValue::kelvin(3200.0).to_string(), "3200K");
    }

    #[test]
    fn test_display_keyword() {
        assert_eq!(EntityValue::keyword("fast").to_string(), "fast");
    }

    #[test]
    fn test_counter_clockwise() {
        assert!(EntityValue::hertz(-1.0).is_counter_clockwise());
        assert!(!EntityValue::hertz(1.0).is_counter_clockwise());
        assert!(EntityValue::keyword("fast CCW").is_counter_clockwise());
        assert!(!EntityValue::keyword("fast CW").is_counter_clockwise());
    }

    #[test]
    fn test_format_number_trims_integer() {
        assert_eq!(format_number(50.0), "50");
        assert_eq!(format_number(3.5), "3.5");
        assert_eq!(format_number(-30.0), "-30");
    }
}
