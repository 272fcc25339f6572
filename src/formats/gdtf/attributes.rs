//! GDTF attribute mapping table.
//!
//! GDTF names a channel function's meaning by attribute (`Pan`,
//! `Gobo1Pos`, `Shutter1Strobe`, ...). The table below maps each known
//! attribute to a capability descriptor, either directly or by
//! inheriting another entry and overriding some of its fields. An
//! attribute mapped to [`AttributeEntry::Unsupported`] produces a
//! placeholder capability and a warning instead of failing the import.
//!
//! The raw table is resolved in an explicit second phase into a fresh
//! immutable map: parents first, shallow-merging the child's own fields
//! over the parent's, each name resolved at most once. `inherit_from`
//! cycles are detected and reported, not looped over.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::formats::FormatError;
use crate::model::{Color, ShutterEffect, Unit};

use super::units::direction_sign;

/// Which capability kind an attribute produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityTarget {
    Intensity,
    ColorIntensity(Color),
    Pan,
    Tilt,
    PanContinuous,
    TiltContinuous,
    PanTiltSpeed,
    ShutterStrobe(ShutterEffect),
    ColorTemperature,
    WheelSlot,
    WheelShake,
    WheelRotation,
    Effect,
    EffectSpeed,
    Focus,
    Zoom,
    Iris,
    Frost,
    Prism,
    PrismRotation,
    Fog,
    Speed,
    Maintenance,
    NoFunction,
}

/// Which field of the capability the physical from/to values land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Brightness,
    Speed,
    Angle,
    Distance,
    OpenPercent,
    FrostIntensity,
    ColorTemperature,
    Output,
    Parameter,
    /// No physical values are carried over.
    None,
}

/// Context of one GDTF channel function, for per-capability derivations
/// and hooks.
#[derive(Debug, Clone, Copy)]
pub struct FunctionContext<'a> {
    pub attribute_name: &'a str,
    pub function_name: &'a str,
    pub channel_name: &'a str,
    pub physical_from: f64,
    pub physical_to: f64,
}

/// Adjusts the raw physical pair immediately before unit conversion.
pub type BeforeHook = fn(&FunctionContext<'_>, f64, f64) -> (f64, f64);

/// Post-processing flags applied immediately after unit conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AfterHook {
    /// Mark strobe capabilities as randomly timed.
    pub random_timing: bool,
    /// Mark strobe capabilities as sound-controlled.
    pub sound_controlled: bool,
    /// Re-tag fog capabilities as haze.
    pub haze: bool,
}

/// Literal property, or one derived from the function context.
#[derive(Clone, Copy)]
pub enum PropertyTarget {
    Literal(Property),
    Derive(fn(&FunctionContext<'_>) -> Property),
}

impl PropertyTarget {
    pub fn resolve(&self, context: &FunctionContext<'_>) -> Property {
        match self {
            PropertyTarget::Literal(property) => *property,
            PropertyTarget::Derive(derive) => derive(context),
        }
    }
}

impl std::fmt::Debug for PropertyTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyTarget::Literal(property) => write!(f, "Literal({property:?})"),
            PropertyTarget::Derive(_) => write!(f, "Derive(..)"),
        }
    }
}

/// A fully resolved attribute descriptor.
#[derive(Debug, Clone, Copy)]
pub struct AttributeMapping {
    pub target: CapabilityTarget,
    pub property: PropertyTarget,
    pub default_unit: Unit,
    pub before_hook: Option<BeforeHook>,
    pub after_hook: AfterHook,
}

/// Partial descriptor shallow-merged over an inherited parent.
#[derive(Debug, Clone, Copy, Default)]
pub struct MappingOverrides {
    pub target: Option<CapabilityTarget>,
    pub property: Option<PropertyTarget>,
    pub default_unit: Option<Unit>,
    pub before_hook: Option<BeforeHook>,
    pub after_hook: Option<AfterHook>,
}

/// One raw entry of the attribute table.
#[derive(Debug, Clone, Copy)]
pub enum AttributeEntry {
    /// Known but unsupported: placeholder capability plus a warning.
    Unsupported,
    Direct(AttributeMapping),
    Inherit {
        from: &'static str,
        overrides: MappingOverrides,
    },
}

// ============================================================================
// RAW TABLE
// ============================================================================

fn direct(
    target: CapabilityTarget,
    property: Property,
    default_unit: Unit,
) -> AttributeEntry {
    AttributeEntry::Direct(AttributeMapping {
        target,
        property: PropertyTarget::Literal(property),
        default_unit,
        before_hook: None,
        after_hook: AfterHook::default(),
    })
}

fn inherit(from: &'static str) -> AttributeEntry {
    AttributeEntry::Inherit {
        from,
        overrides: MappingOverrides::default(),
    }
}

fn inherit_target(from: &'static str, target: CapabilityTarget) -> AttributeEntry {
    AttributeEntry::Inherit {
        from,
        overrides: MappingOverrides {
            target: Some(target),
            ..MappingOverrides::default()
        },
    }
}

/// Degrees per second with a CW/CCW sign taken from the function name.
fn signed_rotation(context: &FunctionContext<'_>, from: f64, to: f64) -> (f64, f64) {
    let sign = direction_sign(context.function_name);
    (from * sign, to * sign)
}

/// Wheel position functions control speed when named like a rotation,
/// angle otherwise.
fn wheel_position_property(context: &FunctionContext<'_>) -> Property {
    let lowered = context.function_name.to_lowercase();
    if lowered.contains("rotat") || lowered.contains("spin") {
        Property::Speed
    } else {
        Property::Angle
    }
}

static RAW_TABLE: Lazy<IndexMap<&'static str, AttributeEntry>> = Lazy::new(|| {
    use CapabilityTarget as T;

    let mut table = IndexMap::new();

    // Intensity
    table.insert("Dimmer", direct(T::Intensity, Property::Brightness, Unit::Percent));

    // Position
    table.insert("Pan", direct(T::Pan, Property::Angle, Unit::Degrees));
    table.insert("Tilt", inherit_target("Pan", T::Tilt));
    table.insert(
        "PanRotate",
        AttributeEntry::Direct(AttributeMapping {
            target: T::PanContinuous,
            property: PropertyTarget::Literal(Property::Speed),
            default_unit: Unit::Hertz,
            before_hook: Some(signed_rotation),
            after_hook: AfterHook::default(),
        }),
    );
    table.insert("TiltRotate", inherit_target("PanRotate", T::TiltContinuous));
    table.insert("PositionMSpeed", direct(T::PanTiltSpeed, Property::Speed, Unit::Percent));

    // Color wheels and mixing
    table.insert("Color1", direct(T::WheelSlot, Property::None, Unit::None));
    table.insert("Color2", inherit("Color1"));
    table.insert("Color3", inherit("Color1"));
    table.insert(
        "Color1WheelSpin",
        AttributeEntry::Direct(AttributeMapping {
            target: T::WheelRotation,
            property: PropertyTarget::Literal(Property::Speed),
            default_unit: Unit::Hertz,
            before_hook: Some(signed_rotation),
            after_hook: AfterHook::default(),
        }),
    );
    table.insert("Color2WheelSpin", inherit("Color1WheelSpin"));
    table.insert("ColorAdd_R", direct(T::ColorIntensity(Color::Red), Property::Brightness, Unit::Percent));
    table.insert("ColorAdd_G", direct(T::ColorIntensity(Color::Green), Property::Brightness, Unit::Percent));
    table.insert("ColorAdd_B", direct(T::ColorIntensity(Color::Blue), Property::Brightness, Unit::Percent));
    table.insert("ColorAdd_W", direct(T::ColorIntensity(Color::White), Property::Brightness, Unit::Percent));
    table.insert("ColorAdd_C", direct(T::ColorIntensity(Color::Cyan), Property::Brightness, Unit::Percent));
    table.insert("ColorAdd_M", direct(T::ColorIntensity(Color::Magenta), Property::Brightness, Unit::Percent));
    table.insert("ColorAdd_Y", direct(T::ColorIntensity(Color::Yellow), Property::Brightness, Unit::Percent));
    table.insert("ColorAdd_UV", direct(T::ColorIntensity(Color::Uv), Property::Brightness, Unit::Percent));
    table.insert("ColorSub_C", inherit("ColorAdd_C"));
    table.insert("ColorSub_M", inherit("ColorAdd_M"));
    table.insert("ColorSub_Y", inherit("ColorAdd_Y"));
    table.insert("CTO", direct(T::ColorTemperature, Property::ColorTemperature, Unit::Kelvin));
    table.insert("CTC", inherit("CTO"));
    table.insert("CTB", inherit("CTO"));

    // Gobo wheels
    table.insert("Gobo1", direct(T::WheelSlot, Property::None, Unit::None));
    table.insert("Gobo2", inherit("Gobo1"));
    table.insert("Gobo3", inherit("Gobo1"));
    table.insert(
        "Gobo1Pos",
        AttributeEntry::Direct(AttributeMapping {
            target: T::WheelRotation,
            property: PropertyTarget::Derive(wheel_position_property),
            default_unit: Unit::Degrees,
            before_hook: Some(signed_rotation),
            after_hook: AfterHook::default(),
        }),
    );
    table.insert("Gobo2Pos", inherit("Gobo1Pos"));
    table.insert("Gobo1WheelSpin", inherit("Color1WheelSpin"));
    table.insert("Gobo2WheelSpin", inherit("Color1WheelSpin"));
    table.insert("Gobo1WheelShake", direct(T::WheelShake, Property::Speed, Unit::Hertz));
    table.insert("Gobo2WheelShake", inherit("Gobo1WheelShake"));

    // Shutter and strobe
    table.insert("Shutter1", direct(T::ShutterStrobe(ShutterEffect::Open), Property::None, Unit::None));
    table.insert("Shutter2", inherit("Shutter1"));
    table.insert(
        "Shutter1Strobe",
        AttributeEntry::Inherit {
            from: "Shutter1",
            overrides: MappingOverrides {
                target: Some(T::ShutterStrobe(ShutterEffect::Strobe)),
                property: Some(PropertyTarget::Literal(Property::Speed)),
                default_unit: Some(Unit::Hertz),
                ..MappingOverrides::default()
            },
        },
    );
    table.insert(
        "Shutter1StrobePulse",
        inherit_target("Shutter1Strobe", T::ShutterStrobe(ShutterEffect::Pulse)),
    );
    table.insert(
        "Shutter1StrobeRampUp",
        inherit_target("Shutter1Strobe", T::ShutterStrobe(ShutterEffect::RampUp)),
    );
    table.insert(
        "Shutter1StrobeRampDown",
        inherit_target("Shutter1Strobe", T::ShutterStrobe(ShutterEffect::RampDown)),
    );
    table.insert(
        "Shutter1StrobeRandom",
        AttributeEntry::Inherit {
            from: "Shutter1Strobe",
            overrides: MappingOverrides {
                after_hook: Some(AfterHook {
                    random_timing: true,
                    ..AfterHook::default()
                }),
                ..MappingOverrides::default()
            },
        },
    );
    table.insert("Shutter2Strobe", inherit("Shutter1Strobe"));
    table.insert("StrobeModeShutter", inherit("Shutter1"));
    table.insert("StrobeFrequency", direct(T::ShutterStrobe(ShutterEffect::Strobe), Property::Speed, Unit::Hertz));

    // Beam
    table.insert("Iris", direct(T::Iris, Property::OpenPercent, Unit::Percent));
    table.insert("Zoom", direct(T::Zoom, Property::Angle, Unit::Degrees));
    table.insert("Focus1", direct(T::Focus, Property::Distance, Unit::Percent));
    table.insert("Focus2", inherit("Focus1"));
    table.insert("Frost1", direct(T::Frost, Property::FrostIntensity, Unit::Percent));
    table.insert("Frost2", inherit("Frost1"));
    table.insert("Prism1", direct(T::Prism, Property::None, Unit::None));
    table.insert("Prism2", inherit("Prism1"));
    table.insert(
        "Prism1Pos",
        AttributeEntry::Direct(AttributeMapping {
            target: T::PrismRotation,
            property: PropertyTarget::Literal(Property::Speed),
            default_unit: Unit::Hertz,
            before_hook: Some(signed_rotation),
            after_hook: AfterHook::default(),
        }),
    );
    table.insert("Prism2Pos", inherit("Prism1Pos"));

    // Effects
    table.insert("Effects", direct(T::Effect, Property::Speed, Unit::Percent));
    table.insert("EffectsRate", direct(T::EffectSpeed, Property::Speed, Unit::Hertz));
    table.insert("EffectsFade", inherit("EffectsRate"));

    // Fog
    table.insert("Fog", direct(T::Fog, Property::Output, Unit::Percent));
    table.insert(
        "Haze",
        AttributeEntry::Inherit {
            from: "Fog",
            overrides: MappingOverrides {
                after_hook: Some(AfterHook {
                    haze: true,
                    ..AfterHook::default()
                }),
                ..MappingOverrides::default()
            },
        },
    );

    // Control
    table.insert("Function", direct(T::Maintenance, Property::Parameter, Unit::None));
    table.insert("Reset", inherit("Function"));
    table.insert("LampControl", inherit("Function"));
    table.insert("NoFeature", direct(T::NoFunction, Property::None, Unit::None));
    table.insert("Speed", direct(T::Speed, Property::Speed, Unit::Percent));
    table.insert("GlobalMSpeed", inherit_target("Speed", T::Speed));

    // Known, deliberately unsupported (framing blades, media control).
    table.insert("Blade1A", AttributeEntry::Unsupported);
    table.insert("Blade1B", AttributeEntry::Unsupported);
    table.insert("Blade1Rot", AttributeEntry::Unsupported);
    table.insert("MediaFolder1", AttributeEntry::Unsupported);
    table.insert("MediaContent1", AttributeEntry::Unsupported);

    table
});

// ============================================================================
// TWO-PHASE RESOLUTION
// ============================================================================

/// Resolve a raw table into a fresh immutable map of `name -> mapping`
/// (`None` = known but unsupported).
///
/// Each entry is resolved at most once; `inherit_from` chains are
/// followed parent-first with the child's own fields shallow-merged over
/// the parent's. A cycle is a hard [`FormatError::AttributeCycle`].
pub fn resolve_table(
    raw: &IndexMap<&'static str, AttributeEntry>,
) -> Result<IndexMap<&'static str, Option<AttributeMapping>>, FormatError> {
    fn resolve_entry(
        raw: &IndexMap<&'static str, AttributeEntry>,
        resolved: &mut IndexMap<&'static str, Option<AttributeMapping>>,
        in_progress: &mut Vec<&'static str>,
        name: &'static str,
    ) -> Result<Option<AttributeMapping>, FormatError> {
        if let Some(existing) = resolved.get(name) {
            return Ok(*existing);
        }
        if in_progress.contains(&name) {
            return Err(FormatError::AttributeCycle(name.to_string()));
        }

        let entry = match raw.get(name) {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let mapping = match entry {
            AttributeEntry::Unsupported => None,
            AttributeEntry::Direct(mapping) => Some(*mapping),
            AttributeEntry::Inherit { from, overrides } => {
                in_progress.push(name);
                let parent = resolve_entry(raw, resolved, in_progress, from)?;
                in_progress.pop();

                parent.map(|parent| AttributeMapping {
                    target: overrides.target.unwrap_or(parent.target),
                    property: overrides.property.unwrap_or(parent.property),
                    default_unit: overrides.default_unit.unwrap_or(parent.default_unit),
                    before_hook: overrides.before_hook.or(parent.before_hook),
                    after_hook: overrides.after_hook.unwrap_or(parent.after_hook),
                })
            }
        };

        resolved.insert(name, mapping);
        Ok(mapping)
    }

    let mut resolved = IndexMap::with_capacity(raw.len());
    let mut in_progress = Vec::new();
    for name in raw.keys() {
        resolve_entry(raw, &mut resolved, &mut in_progress, name)?;
    }
    Ok(resolved)
}

static RESOLVED_TABLE: Lazy<Result<IndexMap<&'static str, Option<AttributeMapping>>, String>> =
    Lazy::new(|| resolve_table(&RAW_TABLE).map_err(|e| e.to_string()));

/// Look up the resolved mapping for an attribute name.
///
/// `Ok(None)` covers both unknown attributes and known-unsupported ones;
/// callers synthesize a placeholder capability and record a warning.
pub fn lookup(attribute: &str) -> Result<Option<AttributeMapping>, FormatError> {
    match &*RESOLVED_TABLE {
        Ok(table) => Ok(table.get(attribute).copied().flatten()),
        Err(message) => Err(FormatError::AttributeCycle(message.clone())),
    }
}
