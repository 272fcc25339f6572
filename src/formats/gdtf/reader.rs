//! GDTF `description.xml` reader.
//!
//! Walks the parsed document read-only and builds canonical fixtures.
//! Derived state (channel registries, wheel slot counters, warnings)
//! lives in the reader, never on the parsed nodes.

use std::collections::BTreeMap;

use smol_str::SmolStr;
use tracing::debug;

use crate::base::{DmxRange, Resolution, scale_value};
use crate::formats::xml::XmlNode;
use crate::formats::{FormatError, ImportResult};
use crate::model::{
    Capabilities, Capability, CapabilityKind, CoarseChannel, EntityRange, EntityValue, Fixture,
    FogKind, ImportPlugin, Manufacturer, Meta, Mode, ModeChannelEntry, max_value, slugify, steady,
};

use super::attributes::{
    AfterHook, AttributeMapping, CapabilityTarget, FunctionContext, Property, lookup,
};
use super::units::conversion_for;

pub(super) struct GdtfReader<'a> {
    source_name: &'a str,
    author_name: &'a str,
    warnings: Vec<String>,
}

impl<'a> GdtfReader<'a> {
    pub fn new(source_name: &'a str, author_name: &'a str) -> Self {
        Self {
            source_name,
            author_name,
            warnings: Vec::new(),
        }
    }

    /// Build fixtures from the bytes of a `description.xml`.
    pub fn read_description(mut self, xml: &[u8]) -> Result<ImportResult, FormatError> {
        let root = XmlNode::parse(xml)?;
        let fixture_type = if root.name == "FixtureType" {
            &root
        } else {
            root.require_child("FixtureType")?
        };

        let name = fixture_type.require_attr("Name")?.to_string();
        debug!(fixture = %name, source = %self.source_name, "importing GDTF fixture");

        let manufacturer_name = fixture_type
            .attr("Manufacturer")
            .filter(|value| !value.is_empty())
            .unwrap_or("Unknown")
            .to_string();
        let manufacturer = Manufacturer::new(slugify(&manufacturer_name), manufacturer_name);

        let mut fixture = Fixture::new(name);
        fixture.short_name = fixture_type
            .attr("ShortName")
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        fixture.meta = Meta {
            authors: vec![self.author_name.to_string()],
            create_date: String::new(),
            last_modify_date: String::new(),
            import_plugin: Some(ImportPlugin {
                plugin: "gdtf".to_string(),
                date: String::new(),
                comment: Some(format!("imported from {}", self.source_name)),
            }),
        };

        if let Some(modes_node) = fixture_type.child("DMXModes") {
            for mode_node in modes_node.children_named("DMXMode") {
                self.read_mode(&mut fixture, mode_node)?;
            }
        }

        fixture.validate()?;

        let mut result = ImportResult::default();
        result
            .manufacturers
            .insert(manufacturer.key.clone(), manufacturer);
        result.fixtures.push(fixture);
        result.warnings = self.warnings;
        Ok(result)
    }

    fn read_mode(&mut self, fixture: &mut Fixture, node: &XmlNode) -> Result<(), FormatError> {
        let mode_name = node.require_attr("Name")?.to_string();

        // DMX slot index (0-based) -> channel key occupying it.
        let mut slots: BTreeMap<u32, SmolStr> = BTreeMap::new();

        let channels_node = node.require_child("DMXChannels")?;
        for channel_node in channels_node.children_named("DMXChannel") {
            self.read_channel(fixture, &mode_name, channel_node, &mut slots)?;
        }

        let slot_count = slots.keys().max().map_or(0, |&max| max + 1);
        let channels = (0..slot_count)
            .map(|slot| match slots.remove(&slot) {
                Some(key) => ModeChannelEntry::Key(key),
                None => ModeChannelEntry::Null,
            })
            .collect();

        fixture.modes.push(Mode::new(mode_name, channels));
        Ok(())
    }

    fn read_channel(
        &mut self,
        fixture: &mut Fixture,
        mode_name: &str,
        node: &XmlNode,
        slots: &mut BTreeMap<u32, SmolStr>,
    ) -> Result<(), FormatError> {
        let offset_attr = node.attr("Offset").unwrap_or("None");
        if offset_attr.eq_ignore_ascii_case("none") {
            // Virtual channel without a DMX footprint.
            self.warnings.push(format!(
                "mode `{mode_name}`: skipping virtual channel without DMX offset"
            ));
            return Ok(());
        }

        // Offsets are 1-based; zero is malformed, not a valid slot.
        let offsets: Vec<u32> = offset_attr
            .split(',')
            .map(|part| {
                part.trim()
                    .parse()
                    .ok()
                    .filter(|&offset| offset >= 1)
                    .ok_or_else(|| {
                        FormatError::parse(format!("invalid DMX offset `{offset_attr}`"))
                    })
            })
            .collect::<Result<_, _>>()?;
        if offsets.is_empty() {
            return Err(FormatError::parse(format!(
                "empty DMX offset in mode `{mode_name}`"
            )));
        }
        let resolution = offsets.len() as Resolution;

        let logical_channels: Vec<&XmlNode> = node.children_named("LogicalChannel").collect();
        let primary_attribute = logical_channels
            .first()
            .and_then(|logical| logical.attr("Attribute"))
            .ok_or_else(|| FormatError::missing_attribute("LogicalChannel@Attribute"))?;

        let geometry = node.attr("Geometry").unwrap_or("");
        let key: SmolStr = if geometry.is_empty() {
            SmolStr::new(primary_attribute)
        } else {
            SmolStr::new(format!("{geometry} {primary_attribute}"))
        };

        // Channels are shared between modes. A key is defined once and
        // rebuilt at the wider resolution when a later mode lists more
        // offsets for it; narrower uses keep the wide definition and
        // simply reference fewer bytes.
        let known_resolution = fixture
            .available_channels
            .get(&key)
            .map_or(0, |existing| existing.max_resolution());
        if resolution > known_resolution {
            let channel = self.build_channel(&key, resolution, node, &logical_channels)?;
            fixture.add_available_channel(channel);
        }

        let coarse = &fixture.available_channels[&key];
        for (index, offset) in offsets.iter().enumerate() {
            let slot_key = if index == 0 {
                key.clone()
            } else {
                coarse.fine_channel_aliases[index - 1].clone()
            };
            slots.insert(offset - 1, slot_key);
        }

        Ok(())
    }

    fn build_channel(
        &mut self,
        key: &SmolStr,
        resolution: Resolution,
        node: &XmlNode,
        logical_channels: &[&XmlNode],
    ) -> Result<CoarseChannel, FormatError> {
        // Gather every channel function with its scaled start value.
        let mut starts: Vec<u64> = Vec::new();
        let mut kinds: Vec<(CapabilityKind, Option<String>)> = Vec::new();
        let mut wheel_slot_counter = 0u32;

        for logical in logical_channels {
            let logical_attribute = logical.attr("Attribute").unwrap_or("");
            for function in logical.children_named("ChannelFunction") {
                let attribute = function.attr("Attribute").unwrap_or(logical_attribute);
                let (from_value, from_resolution) =
                    parse_dmx_value(function.attr("DMXFrom").unwrap_or("0/1"))?;
                let start = scale_value(from_value, from_resolution, resolution)?;

                let context = FunctionContext {
                    attribute_name: attribute,
                    function_name: function.attr("Name").unwrap_or(attribute),
                    channel_name: key.as_str(),
                    physical_from: parse_float(function.attr("PhysicalFrom"), 0.0),
                    physical_to: parse_float(function.attr("PhysicalTo"), 1.0),
                };

                let kind = self.build_capability(attribute, &context, &mut wheel_slot_counter)?;
                let comment = function
                    .attr("Name")
                    .filter(|value| !value.is_empty())
                    .map(str::to_string);

                starts.push(start);
                kinds.push((kind, comment));
            }
        }

        let capabilities = if kinds.is_empty() {
            Capabilities::One(Capability::inline(CapabilityKind::Generic))
        } else if kinds.len() == 1 {
            let (kind, comment) = kinds.swap_remove(0);
            let mut capability = Capability::inline(kind);
            capability.comment = comment;
            Capabilities::One(capability)
        } else {
            let full_end = max_value(resolution);
            let mut list = Vec::with_capacity(kinds.len());
            for (index, (kind, comment)) in kinds.into_iter().enumerate() {
                // Tile the channel: each capability ends where the next
                // one starts. The first capability always starts at 0.
                let start = if index == 0 { 0 } else { starts[index] };
                let end = starts
                    .get(index + 1)
                    .map(|&next| next.saturating_sub(1))
                    .unwrap_or(full_end);
                let range = DmxRange::new(start, end).ok_or_else(|| {
                    FormatError::parse(format!(
                        "channel `{key}`: function ranges out of order at DMX value {start}"
                    ))
                })?;
                let mut capability = Capability::new(range, kind);
                capability.comment = comment;
                list.push(capability);
            }
            Capabilities::Many(list)
        };

        let mut channel = CoarseChannel::new(key.clone(), capabilities);
        channel.dmx_value_resolution = resolution;
        channel.fine_channel_aliases = fine_aliases(key, resolution);

        if let Some(highlight) = node.attr("Highlight").filter(|v| !v.eq_ignore_ascii_case("none")) {
            let (value, value_resolution) = parse_dmx_value(highlight)?;
            channel.highlight_value = Some(scale_value(value, value_resolution, resolution)?);
        }

        Ok(channel)
    }

    /// Map one channel function to a capability kind, warning and
    /// falling back to a placeholder when no mapping exists.
    fn build_capability(
        &mut self,
        attribute: &str,
        context: &FunctionContext<'_>,
        wheel_slot_counter: &mut u32,
    ) -> Result<CapabilityKind, FormatError> {
        let Some(mapping) = lookup(attribute)? else {
            self.warnings.push(format!(
                "channel `{}`: unsupported attribute `{attribute}`, using generic capability",
                context.channel_name
            ));
            return Ok(CapabilityKind::Generic);
        };

        Ok(build_kind(&mapping, context, wheel_slot_counter))
    }
}

/// Construct the capability kind from a resolved mapping: run the before
/// hook on the raw physical pair, convert both ends with the unit's
/// conversion, place the result in the property the mapping names, then
/// apply the after hook's flags.
fn build_kind(
    mapping: &AttributeMapping,
    context: &FunctionContext<'_>,
    wheel_slot_counter: &mut u32,
) -> CapabilityKind {
    let (mut from, mut to) = (context.physical_from, context.physical_to);
    if let Some(before) = mapping.before_hook {
        (from, to) = before(context, from, to);
    }

    let convert = conversion_for(mapping.default_unit);
    let range: EntityRange = (convert(from, to), convert(to, from));
    let property = mapping.property.resolve(context);
    let carried = (property != Property::None).then_some(range.clone());
    let after: AfterHook = mapping.after_hook;

    match mapping.target {
        CapabilityTarget::Intensity => CapabilityKind::Intensity { brightness: carried },
        CapabilityTarget::ColorIntensity(color) => CapabilityKind::ColorIntensity {
            color,
            brightness: carried,
        },
        CapabilityTarget::Pan => CapabilityKind::Pan {
            angle: carried.unwrap_or_else(|| steady(EntityValue::degrees(0.0))),
        },
        CapabilityTarget::Tilt => CapabilityKind::Tilt {
            angle: carried.unwrap_or_else(|| steady(EntityValue::degrees(0.0))),
        },
        CapabilityTarget::PanContinuous => CapabilityKind::PanContinuous {
            speed: carried.unwrap_or_else(stopped),
        },
        CapabilityTarget::TiltContinuous => CapabilityKind::TiltContinuous {
            speed: carried.unwrap_or_else(stopped),
        },
        CapabilityTarget::PanTiltSpeed => CapabilityKind::PanTiltSpeed {
            speed: carried.unwrap_or_else(stopped),
        },
        CapabilityTarget::ShutterStrobe(effect) => CapabilityKind::ShutterStrobe {
            effect,
            speed: (property == Property::Speed).then_some(range),
            sound_controlled: after.sound_controlled,
            random_timing: after.random_timing,
        },
        CapabilityTarget::ColorTemperature => CapabilityKind::ColorTemperature {
            color_temperature: carried.unwrap_or_else(|| steady(EntityValue::kelvin(6600.0))),
        },
        CapabilityTarget::WheelSlot => {
            *wheel_slot_counter += 1;
            CapabilityKind::WheelSlot {
                wheel: None,
                slot_number: *wheel_slot_counter,
            }
        }
        CapabilityTarget::WheelShake => CapabilityKind::WheelShake {
            wheel: None,
            shake_speed: carried,
        },
        CapabilityTarget::WheelRotation => match property {
            Property::Speed => CapabilityKind::WheelRotation {
                wheel: None,
                speed: Some(range),
                angle: None,
            },
            _ => CapabilityKind::WheelRotation {
                wheel: None,
                speed: None,
                angle: Some(range),
            },
        },
        CapabilityTarget::Effect => CapabilityKind::Effect {
            effect_name: context.function_name.to_string(),
            speed: (property == Property::Speed).then_some(range),
            sound_controlled: false,
        },
        CapabilityTarget::EffectSpeed => CapabilityKind::EffectSpeed {
            speed: carried.unwrap_or_else(stopped),
        },
        CapabilityTarget::Focus => CapabilityKind::Focus {
            distance: carried.unwrap_or_else(|| {
                (EntityValue::keyword("near"), EntityValue::keyword("far"))
            }),
        },
        CapabilityTarget::Zoom => CapabilityKind::Zoom {
            angle: carried.unwrap_or_else(|| steady(EntityValue::degrees(0.0))),
        },
        CapabilityTarget::Iris => CapabilityKind::Iris {
            open_percent: carried.unwrap_or_else(|| {
                (EntityValue::percent(0.0), EntityValue::percent(100.0))
            }),
        },
        CapabilityTarget::Frost => CapabilityKind::Frost {
            frost_intensity: carried.unwrap_or_else(|| {
                (EntityValue::percent(0.0), EntityValue::percent(100.0))
            }),
        },
        CapabilityTarget::Prism => CapabilityKind::Prism {
            speed: (property == Property::Speed).then_some(range),
        },
        CapabilityTarget::PrismRotation => CapabilityKind::PrismRotation {
            speed: carried.unwrap_or_else(stopped),
        },
        CapabilityTarget::Fog => CapabilityKind::Fog {
            fog_type: after.haze.then_some(FogKind::Haze),
            output: carried,
        },
        CapabilityTarget::Speed => CapabilityKind::Speed {
            speed: carried.unwrap_or_else(stopped),
        },
        CapabilityTarget::Maintenance => CapabilityKind::Maintenance { parameter: carried },
        CapabilityTarget::NoFunction => CapabilityKind::NoFunction,
    }
}

fn stopped() -> EntityRange {
    steady(EntityValue::keyword("stop"))
}

/// Fine channel aliases for a multi-byte channel: `<key> fine`, then
/// `<key> fine^2`, ...
fn fine_aliases(key: &SmolStr, resolution: Resolution) -> Vec<SmolStr> {
    (1..resolution)
        .map(|fineness| {
            if fineness == 1 {
                SmolStr::new(format!("{key} fine"))
            } else {
                SmolStr::new(format!("{key} fine^{fineness}"))
            }
        })
        .collect()
}

/// Parse a GDTF DMX value of the form `value/byteCount`, e.g. `255/1`.
pub(super) fn parse_dmx_value(input: &str) -> Result<(u64, Resolution), FormatError> {
    let (value, resolution) = input
        .split_once('/')
        .ok_or_else(|| FormatError::parse(format!("invalid DMX value `{input}`")))?;
    let value = value
        .trim()
        .parse()
        .map_err(|_| FormatError::parse(format!("invalid DMX value `{input}`")))?;
    let resolution = resolution
        .trim()
        .parse()
        .map_err(|_| FormatError::parse(format!("invalid DMX value `{input}`")))?;
    Ok((value, resolution))
}

fn parse_float(input: Option<&str>, default: f64) -> f64 {
    input.and_then(|value| value.trim().parse().ok()).unwrap_or(default)
}
