//! Capabilities: the effect of one DMX sub-range of a channel.
//!
//! A channel either holds exactly one capability covering its whole DMX
//! space (range omitted), or an ordered list of capabilities whose ranges
//! exactly tile the space with no gaps or overlaps. The inline-or-list
//! duality is explicit in [`Capabilities`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::base::{DmxRange, Resolution};

use super::entity::EntityRange;
use super::error::ModelError;

// ============================================================================
// CAPABILITY KINDS
// ============================================================================

/// Shutter effect of a strobe capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ShutterEffect {
    Open,
    Closed,
    Strobe,
    Pulse,
    RampUp,
    RampDown,
    RampUpDown,
    Lightning,
    Spikes,
}

/// Single-color LED / filter color of a color-intensity channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Color {
    Red,
    Green,
    Blue,
    White,
    Amber,
    #[serde(rename = "UV")]
    Uv,
    Lime,
    Cyan,
    Magenta,
    Yellow,
    Indigo,
    WarmWhite,
    ColdWhite,
}

impl Color {
    pub fn name(&self) -> &'static str {
        match self {
            Color::Red => "Red",
            Color::Green => "Green",
            Color::Blue => "Blue",
            Color::White => "White",
            Color::Amber => "Amber",
            Color::Uv => "UV",
            Color::Lime => "Lime",
            Color::Cyan => "Cyan",
            Color::Magenta => "Magenta",
            Color::Yellow => "Yellow",
            Color::Indigo => "Indigo",
            Color::WarmWhite => "Warm White",
            Color::ColdWhite => "Cold White",
        }
    }
}

/// Fog fluid type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FogKind {
    Fog,
    Haze,
}

/// What a DMX sub-range does, as a closed tagged union.
///
/// Every consumer matches exhaustively; adding a variant is a deliberate
/// API change that must update all adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum CapabilityKind {
    NoFunction,
    Intensity {
        brightness: Option<EntityRange>,
    },
    ShutterStrobe {
        effect: ShutterEffect,
        speed: Option<EntityRange>,
        sound_controlled: bool,
        random_timing: bool,
    },
    StrobeSpeed {
        speed: EntityRange,
    },
    ColorIntensity {
        color: Color,
        brightness: Option<EntityRange>,
    },
    ColorPreset {
        colors: Vec<String>,
        color_temperature: Option<EntityRange>,
    },
    ColorTemperature {
        color_temperature: EntityRange,
    },
    Pan {
        angle: EntityRange,
    },
    Tilt {
        angle: EntityRange,
    },
    PanContinuous {
        speed: EntityRange,
    },
    TiltContinuous {
        speed: EntityRange,
    },
    PanTiltSpeed {
        speed: EntityRange,
    },
    WheelSlot {
        wheel: Option<SmolStr>,
        slot_number: u32,
    },
    WheelShake {
        wheel: Option<SmolStr>,
        shake_speed: Option<EntityRange>,
    },
    WheelRotation {
        wheel: Option<SmolStr>,
        speed: Option<EntityRange>,
        angle: Option<EntityRange>,
    },
    Effect {
        effect_name: String,
        speed: Option<EntityRange>,
        sound_controlled: bool,
    },
    EffectSpeed {
        speed: EntityRange,
    },
    Focus {
        distance: EntityRange,
    },
    Zoom {
        angle: EntityRange,
    },
    Iris {
        open_percent: EntityRange,
    },
    Frost {
        frost_intensity: EntityRange,
    },
    Prism {
        speed: Option<EntityRange>,
    },
    PrismRotation {
        speed: EntityRange,
    },
    Fog {
        fog_type: Option<FogKind>,
        output: Option<EntityRange>,
    },
    FogOutput {
        output: EntityRange,
    },
    FogType {
        fog_type: FogKind,
    },
    Speed {
        speed: EntityRange,
    },
    Rotation {
        speed: Option<EntityRange>,
        angle: Option<EntityRange>,
    },
    Maintenance {
        parameter: Option<EntityRange>,
    },
    /// Placeholder for effects no adapter mapping exists for.
    Generic,
}

impl CapabilityKind {
    /// Short human-readable tag, used in warnings and generated comments.
    pub fn tag(&self) -> &'static str {
        match self {
            CapabilityKind::NoFunction => "NoFunction",
            CapabilityKind::Intensity { .. } => "Intensity",
            CapabilityKind::ShutterStrobe { .. } => "ShutterStrobe",
            CapabilityKind::StrobeSpeed { .. } => "StrobeSpeed",
            CapabilityKind::ColorIntensity { .. } => "ColorIntensity",
            CapabilityKind::ColorPreset { .. } => "ColorPreset",
            CapabilityKind::ColorTemperature { .. } => "ColorTemperature",
            CapabilityKind::Pan { .. } => "Pan",
            CapabilityKind::Tilt { .. } => "Tilt",
            CapabilityKind::PanContinuous { .. } => "PanContinuous",
            CapabilityKind::TiltContinuous { .. } => "TiltContinuous",
            CapabilityKind::PanTiltSpeed { .. } => "PanTiltSpeed",
            CapabilityKind::WheelSlot { .. } => "WheelSlot",
            CapabilityKind::WheelShake { .. } => "WheelShake",
            CapabilityKind::WheelRotation { .. } => "WheelRotation",
            CapabilityKind::Effect { .. } => "Effect",
            CapabilityKind::EffectSpeed { .. } => "EffectSpeed",
            CapabilityKind::Focus { .. } => "Focus",
            CapabilityKind::Zoom { .. } => "Zoom",
            CapabilityKind::Iris { .. } => "Iris",
            CapabilityKind::Frost { .. } => "Frost",
            CapabilityKind::Prism { .. } => "Prism",
            CapabilityKind::PrismRotation { .. } => "PrismRotation",
            CapabilityKind::Fog { .. } => "Fog",
            CapabilityKind::FogOutput { .. } => "FogOutput",
            CapabilityKind::FogType { .. } => "FogType",
            CapabilityKind::Speed { .. } => "Speed",
            CapabilityKind::Rotation { .. } => "Rotation",
            CapabilityKind::Maintenance { .. } => "Maintenance",
            CapabilityKind::Generic => "Generic",
        }
    }
}

// ============================================================================
// CAPABILITY
// ============================================================================

/// One capability: a DMX sub-range and its effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    /// DMX range at the channel's native resolution. `None` only for a
    /// channel's single inline capability, where the full range is
    /// implicit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dmx_range: Option<DmxRange>,

    #[serde(flatten)]
    pub kind: CapabilityKind,

    /// Free-text comment shown to the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Switching-channel alias → target channel key, active while the
    /// trigger channel's value is inside this capability's range.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub switch_channels: IndexMap<SmolStr, SmolStr>,
}

impl Capability {
    pub fn new(dmx_range: DmxRange, kind: CapabilityKind) -> Self {
        Self {
            dmx_range: Some(dmx_range),
            kind,
            comment: None,
            switch_channels: IndexMap::new(),
        }
    }

    /// An inline capability covering the channel's whole DMX space.
    pub fn inline(kind: CapabilityKind) -> Self {
        Self {
            dmx_range: None,
            kind,
            comment: None,
            switch_channels: IndexMap::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// The explicit range, or the implicit full range at `resolution`.
    pub fn range_at(&self, resolution: Resolution) -> DmxRange {
        self.dmx_range
            .unwrap_or(DmxRange { start: 0, end: max_value(resolution) })
    }
}

/// The highest DMX value representable at `resolution` bytes.
pub fn max_value(resolution: Resolution) -> u64 {
    (1u64 << (8 * u64::from(resolution))) - 1
}

// ============================================================================
// CAPABILITIES (inline-or-list)
// ============================================================================

/// A channel's capabilities: one inline capability with an implicit full
/// range, or an ordered list exactly tiling the channel's DMX space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Capabilities {
    One(Capability),
    Many(Vec<Capability>),
}

impl Capabilities {
    /// All capabilities in declared order.
    pub fn all(&self) -> &[Capability] {
        match self {
            Capabilities::One(capability) => std::slice::from_ref(capability),
            Capabilities::Many(list) => list,
        }
    }

    pub fn len(&self) -> usize {
        self.all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.all().is_empty()
    }

    /// The capability whose range contains `value` at the channel's
    /// native resolution. `None` means the definition leaves a gap there.
    pub fn by_value(&self, value: u64, resolution: Resolution) -> Option<&Capability> {
        self.all()
            .iter()
            .find(|capability| capability.range_at(resolution).contains(value))
    }

    /// Check the tiling invariant against a channel's DMX space.
    ///
    /// A `Many` list must carry explicit ranges that start at 0, follow
    /// each other without gap or overlap, and end at the space's last
    /// value. A `One` capability is valid with or without a range as long
    /// as an explicit range covers the full space.
    pub fn validate(&self, channel: &SmolStr, resolution: Resolution) -> Result<(), ModelError> {
        let full_end = max_value(resolution);

        let list = match self {
            Capabilities::One(capability) => {
                if let Some(range) = capability.dmx_range {
                    if range.start != 0 || range.end != full_end {
                        return Err(ModelError::CapabilityGap {
                            channel: channel.clone(),
                            expected_start: 0,
                            found: range,
                        });
                    }
                }
                return Ok(());
            }
            Capabilities::Many(list) => list,
        };

        let mut expected_start = 0u64;
        for (index, capability) in list.iter().enumerate() {
            let range = capability
                .dmx_range
                .ok_or_else(|| ModelError::MissingCapabilityRange {
                    channel: channel.clone(),
                    index,
                })?;

            if range.start > expected_start {
                return Err(ModelError::CapabilityGap {
                    channel: channel.clone(),
                    expected_start,
                    found: range,
                });
            }
            if range.start < expected_start {
                return Err(ModelError::CapabilityOverlap {
                    channel: channel.clone(),
                    expected_start,
                    found: range,
                });
            }
            expected_start = range.end + 1;
        }

        if expected_start != full_end + 1 {
            return Err(ModelError::CapabilityShort {
                channel: channel.clone(),
                found: expected_start.saturating_sub(1),
                expected_end: full_end,
            });
        }

        Ok(())
    }
}
