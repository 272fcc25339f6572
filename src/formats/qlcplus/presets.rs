//! QLC+ capability preset table.
//!
//! QLC+ tags capabilities with preset names (`ShutterOpen`,
//! `StrobeSlowToFast`, `RotationClockwise`, ...). The table below pairs
//! each supported preset with two pure functions: `is_applicable` decides
//! on export whether a canonical capability matches the preset, and
//! `import` builds the canonical capability kind on import. Export scans
//! the table in order and takes the first applicable entry, so more
//! specific presets must come first.

use once_cell::sync::Lazy;

use crate::model::{
    Capability, CapabilityKind, EntityRange, EntityValue, ShutterEffect, steady,
};

use super::heuristics::{RotationDirection, apply_direction, mine_speed};

/// Context for importing one preset-tagged capability.
pub struct ImportedCapability<'a> {
    /// The capability's label text.
    pub label: &'a str,
    /// 1-based count of wheel-slot capabilities seen so far in the
    /// channel, including this one.
    pub slot_number: u32,
}

pub struct PresetEntry {
    pub name: &'static str,
    pub is_applicable: fn(&Capability) -> bool,
    pub import: fn(&ImportedCapability<'_>) -> CapabilityKind,
}

/// How a speed range runs from start to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpeedProfile {
    Increasing,
    Decreasing,
    Steady,
}

fn speed_profile(range: &EntityRange) -> Option<SpeedProfile> {
    let (start, end) = range;
    if let (Some(a), Some(b)) = (start.as_number(), end.as_number()) {
        return Some(if a < b {
            SpeedProfile::Increasing
        } else if a > b {
            SpeedProfile::Decreasing
        } else {
            SpeedProfile::Steady
        });
    }
    match (start.as_keyword(), end.as_keyword()) {
        (Some(a), Some(b)) if a == b => Some(SpeedProfile::Steady),
        (Some(a), Some(b)) if a.starts_with("slow") && b.starts_with("fast") => {
            Some(SpeedProfile::Increasing)
        }
        (Some(a), Some(b)) if a.starts_with("fast") && b.starts_with("slow") => {
            Some(SpeedProfile::Decreasing)
        }
        _ => None,
    }
}

fn strobe_speed(capability: &Capability, effect: ShutterEffect) -> Option<&EntityRange> {
    match &capability.kind {
        CapabilityKind::ShutterStrobe {
            effect: found,
            speed,
            random_timing: false,
            ..
        } if *found == effect => speed.as_ref(),
        _ => None,
    }
}

fn rotation_speed(capability: &Capability) -> Option<&EntityRange> {
    match &capability.kind {
        CapabilityKind::WheelRotation { speed: Some(speed), .. }
        | CapabilityKind::PrismRotation { speed }
        | CapabilityKind::Rotation { speed: Some(speed), .. } => Some(speed),
        _ => None,
    }
}

fn rotation_kind(speed: EntityRange) -> CapabilityKind {
    CapabilityKind::WheelRotation {
        wheel: None,
        speed: Some(speed),
        angle: None,
    }
}

fn directed(start: &str, end: &str, direction: RotationDirection) -> EntityRange {
    (
        apply_direction(EntityValue::keyword(start), direction),
        apply_direction(EntityValue::keyword(end), direction),
    )
}

fn mined_or(label: &str, fallback: EntityRange) -> EntityRange {
    mine_speed(label).map(|mined| mined.speed).unwrap_or(fallback)
}

/// The preset table, in export matching order.
pub static PRESETS: Lazy<Vec<PresetEntry>> = Lazy::new(|| {
    vec![
        PresetEntry {
            name: "ShutterOpen",
            is_applicable: |c| {
                matches!(
                    c.kind,
                    CapabilityKind::ShutterStrobe { effect: ShutterEffect::Open, .. }
                )
            },
            import: |_| CapabilityKind::ShutterStrobe {
                effect: ShutterEffect::Open,
                speed: None,
                sound_controlled: false,
                random_timing: false,
            },
        },
        PresetEntry {
            name: "ShutterClose",
            is_applicable: |c| {
                matches!(
                    c.kind,
                    CapabilityKind::ShutterStrobe { effect: ShutterEffect::Closed, .. }
                )
            },
            import: |_| CapabilityKind::ShutterStrobe {
                effect: ShutterEffect::Closed,
                speed: None,
                sound_controlled: false,
                random_timing: false,
            },
        },
        PresetEntry {
            name: "StrobeRandom",
            is_applicable: |c| {
                matches!(
                    c.kind,
                    CapabilityKind::ShutterStrobe { random_timing: true, .. }
                )
            },
            import: |_| CapabilityKind::ShutterStrobe {
                effect: ShutterEffect::Strobe,
                speed: None,
                sound_controlled: false,
                random_timing: true,
            },
        },
        PresetEntry {
            name: "StrobeFrequency",
            is_applicable: |c| {
                strobe_speed(c, ShutterEffect::Strobe)
                    .and_then(speed_profile)
                    .is_some_and(|profile| profile == SpeedProfile::Steady)
            },
            import: |ctx| CapabilityKind::ShutterStrobe {
                effect: ShutterEffect::Strobe,
                speed: Some(mined_or(ctx.label, steady(EntityValue::keyword("fast")))),
                sound_controlled: false,
                random_timing: false,
            },
        },
        PresetEntry {
            name: "StrobeSlowToFast",
            is_applicable: |c| {
                strobe_speed(c, ShutterEffect::Strobe)
                    .and_then(speed_profile)
                    .is_some_and(|profile| profile == SpeedProfile::Increasing)
            },
            import: |ctx| CapabilityKind::ShutterStrobe {
                effect: ShutterEffect::Strobe,
                speed: Some(mined_or(
                    ctx.label,
                    (EntityValue::keyword("slow"), EntityValue::keyword("fast")),
                )),
                sound_controlled: false,
                random_timing: false,
            },
        },
        PresetEntry {
            name: "StrobeFastToSlow",
            is_applicable: |c| {
                strobe_speed(c, ShutterEffect::Strobe)
                    .and_then(speed_profile)
                    .is_some_and(|profile| profile == SpeedProfile::Decreasing)
            },
            import: |ctx| CapabilityKind::ShutterStrobe {
                effect: ShutterEffect::Strobe,
                speed: Some(mined_or(
                    ctx.label,
                    (EntityValue::keyword("fast"), EntityValue::keyword("slow")),
                )),
                sound_controlled: false,
                random_timing: false,
            },
        },
        PresetEntry {
            name: "PulseSlowToFast",
            is_applicable: |c| {
                matches!(
                    c.kind,
                    CapabilityKind::ShutterStrobe { effect: ShutterEffect::Pulse, .. }
                )
            },
            import: |ctx| CapabilityKind::ShutterStrobe {
                effect: ShutterEffect::Pulse,
                speed: Some(mined_or(
                    ctx.label,
                    (EntityValue::keyword("slow"), EntityValue::keyword("fast")),
                )),
                sound_controlled: false,
                random_timing: false,
            },
        },
        PresetEntry {
            name: "RampUpSlowToFast",
            is_applicable: |c| {
                matches!(
                    c.kind,
                    CapabilityKind::ShutterStrobe { effect: ShutterEffect::RampUp, .. }
                )
            },
            import: |ctx| CapabilityKind::ShutterStrobe {
                effect: ShutterEffect::RampUp,
                speed: Some(mined_or(
                    ctx.label,
                    (EntityValue::keyword("slow"), EntityValue::keyword("fast")),
                )),
                sound_controlled: false,
                random_timing: false,
            },
        },
        PresetEntry {
            name: "RampDownSlowToFast",
            is_applicable: |c| {
                matches!(
                    c.kind,
                    CapabilityKind::ShutterStrobe { effect: ShutterEffect::RampDown, .. }
                )
            },
            import: |ctx| CapabilityKind::ShutterStrobe {
                effect: ShutterEffect::RampDown,
                speed: Some(mined_or(
                    ctx.label,
                    (EntityValue::keyword("slow"), EntityValue::keyword("fast")),
                )),
                sound_controlled: false,
                random_timing: false,
            },
        },
        PresetEntry {
            name: "ColorMacro",
            is_applicable: |c| matches!(c.kind, CapabilityKind::ColorPreset { .. }),
            import: |_| CapabilityKind::ColorPreset {
                colors: Vec::new(),
                color_temperature: None,
            },
        },
        PresetEntry {
            name: "GoboShakeMacro",
            is_applicable: |c| matches!(c.kind, CapabilityKind::WheelShake { .. }),
            import: |ctx| CapabilityKind::WheelShake {
                wheel: None,
                shake_speed: mine_speed(ctx.label).map(|mined| mined.speed),
            },
        },
        PresetEntry {
            name: "GoboMacro",
            is_applicable: |c| matches!(c.kind, CapabilityKind::WheelSlot { .. }),
            import: |ctx| CapabilityKind::WheelSlot {
                wheel: None,
                slot_number: ctx.slot_number,
            },
        },
        PresetEntry {
            name: "RotationStop",
            is_applicable: |c| {
                rotation_speed(c).is_some_and(|speed| {
                    speed.0.as_keyword() == Some("stop") && speed.1.as_keyword() == Some("stop")
                })
            },
            import: |_| rotation_kind(steady(EntityValue::keyword("stop"))),
        },
        PresetEntry {
            name: "RotationClockwiseSlowToFast",
            is_applicable: |c| {
                rotation_speed(c).is_some_and(|speed| {
                    !speed.0.is_counter_clockwise()
                        && speed_profile(speed) == Some(SpeedProfile::Increasing)
                })
            },
            import: |_| {
                rotation_kind(directed("slow", "fast", RotationDirection::Clockwise))
            },
        },
        PresetEntry {
            name: "RotationClockwiseFastToSlow",
            is_applicable: |c| {
                rotation_speed(c).is_some_and(|speed| {
                    !speed.0.is_counter_clockwise()
                        && speed_profile(speed) == Some(SpeedProfile::Decreasing)
                })
            },
            import: |_| {
                rotation_kind(directed("fast", "slow", RotationDirection::Clockwise))
            },
        },
        PresetEntry {
            name: "RotationCounterClockwiseSlowToFast",
            is_applicable: |c| {
                rotation_speed(c).is_some_and(|speed| {
                    speed.0.is_counter_clockwise()
                        && speed_profile(speed) == Some(SpeedProfile::Increasing)
                })
            },
            import: |_| {
                rotation_kind(directed("slow", "fast", RotationDirection::CounterClockwise))
            },
        },
        PresetEntry {
            name: "RotationCounterClockwiseFastToSlow",
            is_applicable: |c| {
                rotation_speed(c).is_some_and(|speed| {
                    speed.0.is_counter_clockwise()
                        && speed_profile(speed) == Some(SpeedProfile::Decreasing)
                })
            },
            import: |_| {
                rotation_kind(directed("fast", "slow", RotationDirection::CounterClockwise))
            },
        },
        PresetEntry {
            name: "RotationCounterClockwise",
            is_applicable: |c| rotation_speed(c).is_some_and(|s| s.0.is_counter_clockwise()),
            import: |ctx| {
                rotation_kind(mined_or(
                    ctx.label,
                    steady(apply_direction(
                        EntityValue::keyword("fast"),
                        RotationDirection::CounterClockwise,
                    )),
                ))
            },
        },
        PresetEntry {
            name: "RotationClockwise",
            is_applicable: |c| rotation_speed(c).is_some(),
            import: |ctx| {
                rotation_kind(mined_or(
                    ctx.label,
                    steady(apply_direction(
                        EntityValue::keyword("fast"),
                        RotationDirection::Clockwise,
                    )),
                ))
            },
        },
        PresetEntry {
            name: "PrismEffectOn",
            is_applicable: |c| matches!(c.kind, CapabilityKind::Prism { .. }),
            import: |_| CapabilityKind::Prism { speed: None },
        },
        PresetEntry {
            name: "NoFunction",
            is_applicable: |c| matches!(c.kind, CapabilityKind::NoFunction),
            import: |_| CapabilityKind::NoFunction,
        },
    ]
});

/// The preset a canonical capability exports as, if any.
pub fn export_preset(capability: &Capability) -> Option<&'static str> {
    PRESETS
        .iter()
        .find(|entry| (entry.is_applicable)(capability))
        .map(|entry| entry.name)
}

/// Build a capability kind for a preset name. `None` for unknown presets.
pub fn import_preset(name: &str, context: &ImportedCapability<'_>) -> Option<CapabilityKind> {
    PRESETS
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| (entry.import)(context))
}
