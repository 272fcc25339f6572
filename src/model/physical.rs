//! Physical fixture data.

use serde::{Deserialize, Serialize};

/// Physical data of a fixture or a mode override.
///
/// All fields are optional; a mode override replaces only the fields it
/// sets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Physical {
    /// Width, height, depth in millimeters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<[f64; 3]>,

    /// Weight in kilograms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    /// Power draw in watts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,

    /// DMX connector type, e.g. "3-pin", "5-pin".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dmx_connector: Option<String>,

    /// Light source, e.g. "LED".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bulb_type: Option<String>,

    /// Beam angle range in degrees (min, max).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lens_degrees: Option<(f64, f64)>,
}

impl Physical {
    /// Merge a mode override over fixture-wide physical data.
    pub fn overridden_by(&self, other: &Physical) -> Physical {
        Physical {
            dimensions: other.dimensions.or(self.dimensions),
            weight: other.weight.or(self.weight),
            power: other.power.or(self.power),
            dmx_connector: other.dmx_connector.clone().or_else(|| self.dmx_connector.clone()),
            bulb_type: other.bulb_type.clone().or_else(|| self.bulb_type.clone()),
            lens_degrees: other.lens_degrees.or(self.lens_degrees),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_merges_per_field() {
        let fixture_wide = Physical {
            weight: Some(3.5),
            power: Some(60.0),
            ..Physical::default()
        };
        let mode = Physical {
            power: Some(80.0),
            ..Physical::default()
        };

        let merged = fixture_wide.overridden_by(&mode);
        assert_eq!(merged.weight, Some(3.5));
        assert_eq!(merged.power, Some(80.0));
    }
}
