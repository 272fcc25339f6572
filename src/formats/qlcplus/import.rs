//! QLC+ `.qxf` reader.
//!
//! Builds canonical fixtures from a QLC+ fixture definition. Preset
//! names are mapped through the table in [`super::presets`]; untagged
//! capabilities fall back to label mining and the channel's group.

use std::collections::BTreeMap;

use smol_str::SmolStr;
use tracing::debug;

use crate::base::DmxRange;
use crate::formats::xml::XmlNode;
use crate::formats::{FormatError, ImportResult};
use crate::model::{
    Capabilities, Capability, CapabilityKind, CoarseChannel, Color, EntityValue, Fixture,
    ImportPlugin, Manufacturer, Meta, Mode, ModeChannelEntry, Physical, ShutterEffect, slugify,
};

use super::heuristics::mine_speed;
use super::presets::{ImportedCapability, import_preset};

pub(super) struct QlcPlusImporter<'a> {
    source_name: &'a str,
    author_name: &'a str,
    warnings: Vec<String>,
}

impl<'a> QlcPlusImporter<'a> {
    pub fn new(source_name: &'a str, author_name: &'a str) -> Self {
        Self {
            source_name,
            author_name,
            warnings: Vec::new(),
        }
    }

    pub fn read_definition(mut self, xml: &[u8]) -> Result<ImportResult, FormatError> {
        let root = XmlNode::parse(xml)?;
        if root.name != "FixtureDefinition" {
            return Err(FormatError::parse(format!(
                "expected FixtureDefinition root, found {}",
                root.name
            )));
        }

        let manufacturer_name = root.require_child("Manufacturer")?.text.clone();
        let model = root.require_child("Model")?.text.clone();
        debug!(fixture = %model, source = %self.source_name, "importing QLC+ fixture");

        let mut fixture = Fixture::new(model);
        if let Some(kind) = root.child("Type") {
            if !kind.text.is_empty() {
                fixture.categories.push(kind.text.clone());
            }
        }

        let mut authors = vec![self.author_name.to_string()];
        if let Some(author) = root.descendant(&["Creator", "Author"]) {
            if !author.text.is_empty() && author.text != self.author_name {
                authors.push(author.text.clone());
            }
        }
        fixture.meta = Meta {
            authors,
            create_date: String::new(),
            last_modify_date: String::new(),
            import_plugin: Some(ImportPlugin {
                plugin: "qlcplus".to_string(),
                date: String::new(),
                comment: Some(format!("imported from {}", self.source_name)),
            }),
        };

        self.read_channels(&mut fixture, &root)?;

        for mode_node in root.children_named("Mode") {
            self.read_mode(&mut fixture, mode_node)?;
        }

        if let Some(physical) = root.child("Physical") {
            fixture.physical = Some(read_physical(physical));
        }

        fixture.validate()?;

        let mut result = ImportResult::default();
        let manufacturer = Manufacturer::new(slugify(&manufacturer_name), manufacturer_name);
        result
            .manufacturers
            .insert(manufacturer.key.clone(), manufacturer);
        result.fixtures.push(fixture);
        result.warnings = self.warnings;
        Ok(result)
    }

    /// Read all channel definitions, reattaching fine channels to their
    /// coarse channel by name.
    fn read_channels(&mut self, fixture: &mut Fixture, root: &XmlNode) -> Result<(), FormatError> {
        // Coarse channels first, so a fine channel can find its base
        // regardless of declaration order.
        let (fine, coarse): (Vec<&XmlNode>, Vec<&XmlNode>) = root
            .children_named("Channel")
            .partition(|node| is_fine_channel(node));

        for node in coarse {
            let channel = self.read_channel(node)?;
            fixture.add_available_channel(channel);
        }

        for node in fine {
            let name = node.require_attr("Name")?;
            let base = fine_base_name(name);
            let found = fixture
                .available_channels
                .values()
                .find(|channel| channel.name() == base)
                .map(|channel| channel.key.clone());

            match found {
                Some(key) => {
                    // Channels are immutable once inserted; rebuild the
                    // coarse channel with the extra alias.
                    let mut rebuilt = (*fixture.available_channels[&key]).clone();
                    rebuilt.fine_channel_aliases.push(SmolStr::new(name));
                    rebuilt.dmx_value_resolution = 1;
                    fixture.add_available_channel(rebuilt);
                }
                None => {
                    self.warnings.push(format!(
                        "fine channel `{name}` has no matching coarse channel"
                    ));
                    let channel = self.read_channel(node)?;
                    fixture.add_available_channel(channel);
                }
            }
        }

        Ok(())
    }

    fn read_channel(&mut self, node: &XmlNode) -> Result<CoarseChannel, FormatError> {
        let name = node.require_attr("Name")?;
        let group = node.child("Group").map(|g| g.text.clone()).unwrap_or_default();

        let capability_nodes: Vec<&XmlNode> = node.children_named("Capability").collect();
        let capabilities = if capability_nodes.is_empty() {
            let kind = match node.attr("Preset") {
                Some(preset) => channel_preset_kind(preset).unwrap_or_else(|| {
                    self.warnings
                        .push(format!("channel `{name}`: unknown channel preset `{preset}`"));
                    CapabilityKind::Generic
                }),
                None => CapabilityKind::Generic,
            };
            Capabilities::One(Capability::inline(kind))
        } else {
            self.read_capabilities(name, &group, &capability_nodes)?
        };

        let mut channel = CoarseChannel::new(SmolStr::new(name), capabilities);
        if let Some(default) = node.attr("Default") {
            channel.default_value = default
                .parse()
                .map_err(|_| FormatError::parse(format!("invalid default value `{default}`")))?;
        }
        Ok(channel)
    }

    fn read_capabilities(
        &mut self,
        channel_name: &str,
        group: &str,
        nodes: &[&XmlNode],
    ) -> Result<Capabilities, FormatError> {
        let mut list: Vec<Capability> = Vec::new();
        let mut expected_start = 0u64;
        let mut slot_counter = 0u32;

        for node in nodes {
            let min: u64 = parse_attr(node, "Min")?;
            let max: u64 = parse_attr(node, "Max")?;
            let range = DmxRange::new(min, max).ok_or_else(|| {
                FormatError::parse(format!(
                    "channel `{channel_name}`: inverted capability range {min}..{max}"
                ))
            })?;

            // QLC+ tolerates gaps between capabilities; the canonical
            // model does not. Fill them with placeholders.
            if min > expected_start {
                self.warnings.push(format!(
                    "channel `{channel_name}`: filling capability gap {expected_start}..{}",
                    min - 1
                ));
                list.push(Capability::new(
                    DmxRange { start: expected_start, end: min - 1 },
                    CapabilityKind::Generic,
                ));
            }
            expected_start = max + 1;

            let label = node.text.trim();
            let context = ImportedCapability {
                label,
                slot_number: slot_counter + 1,
            };

            let (kind, comment) = match node.attr("Preset") {
                Some(preset) => match import_preset(preset, &context) {
                    Some(kind) => (kind, label_comment(label)),
                    None => {
                        self.warnings.push(format!(
                            "channel `{channel_name}`: unknown capability preset `{preset}`"
                        ));
                        self.fallback_kind(group, label)
                    }
                },
                None => self.fallback_kind(group, label),
            };

            if matches!(kind, CapabilityKind::WheelSlot { .. }) {
                slot_counter += 1;
            }

            let mut capability = Capability::new(range, kind);
            capability.comment = comment;
            list.push(capability);
        }

        if expected_start <= 255 {
            self.warnings.push(format!(
                "channel `{channel_name}`: filling capability gap {expected_start}..255"
            ));
            list.push(Capability::new(
                DmxRange { start: expected_start, end: 255 },
                CapabilityKind::Generic,
            ));
        }

        Ok(Capabilities::Many(list))
    }

    /// Capability kind for an untagged capability: label mining first,
    /// then the channel group, then a placeholder.
    fn fallback_kind(&mut self, group: &str, label: &str) -> (CapabilityKind, Option<String>) {
        if let Some(mined) = mine_speed(label) {
            let kind = match group {
                "Shutter" => CapabilityKind::ShutterStrobe {
                    effect: ShutterEffect::Strobe,
                    speed: Some(mined.speed),
                    sound_controlled: false,
                    random_timing: false,
                },
                "Speed" => CapabilityKind::Speed { speed: mined.speed },
                _ => {
                    let speed = match mined.direction {
                        Some(direction) => (
                            super::heuristics::apply_direction(mined.speed.0, direction),
                            super::heuristics::apply_direction(mined.speed.1, direction),
                        ),
                        None => mined.speed,
                    };
                    CapabilityKind::Rotation { speed: Some(speed), angle: None }
                }
            };
            return (kind, mined.remaining);
        }

        (CapabilityKind::Generic, label_comment(label))
    }

    fn read_mode(&mut self, fixture: &mut Fixture, node: &XmlNode) -> Result<(), FormatError> {
        let name = node.require_attr("Name")?.to_string();

        let mut slots: BTreeMap<u32, SmolStr> = BTreeMap::new();
        for entry in node.children_named("Channel") {
            let number: u32 = parse_attr(entry, "Number")?;
            slots.insert(number, SmolStr::new(entry.text.trim()));
        }

        let slot_count = slots.keys().max().map_or(0, |&max| max + 1);
        let channels = (0..slot_count)
            .map(|slot| match slots.remove(&slot) {
                Some(key) => ModeChannelEntry::Key(key),
                None => ModeChannelEntry::Null,
            })
            .collect();

        let mut mode = Mode::new(name, channels);
        if let Some(physical) = node.child("Physical") {
            mode.physical = Some(read_physical(physical));
        }
        fixture.modes.push(mode);
        Ok(())
    }
}

fn label_comment(label: &str) -> Option<String> {
    (!label.is_empty()).then(|| label.to_string())
}

fn is_fine_channel(node: &XmlNode) -> bool {
    if let Some(group) = node.child("Group") {
        if group.attr("Byte") == Some("1") {
            return true;
        }
    }
    if let Some(preset) = node.attr("Preset") {
        if preset.ends_with("Fine") {
            return true;
        }
    }
    node.attr("Name")
        .is_some_and(|name| fine_base_name(name) != name)
}

/// Base channel name of a fine channel: the name without its fine
/// suffix. Handles both `"Pan Fine"` and the numbered `"Pan Fine 2"`
/// form deeper bytes are exported with.
fn fine_base_name(name: &str) -> &str {
    if let Some(base) = strip_fine_suffix(name) {
        return base;
    }
    if let Some((head, digits)) = name.rsplit_once(' ') {
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            if let Some(base) = strip_fine_suffix(head) {
                return base;
            }
        }
    }
    name
}

fn strip_fine_suffix(name: &str) -> Option<&str> {
    name.strip_suffix(" Fine")
        .or_else(|| name.strip_suffix(" fine"))
}

/// Kinds for channel-level presets (channels without capability lists).
fn channel_preset_kind(preset: &str) -> Option<CapabilityKind> {
    let color = |color| {
        Some(CapabilityKind::ColorIntensity {
            color,
            brightness: None,
        })
    };

    match preset {
        "IntensityDimmer" | "IntensityMasterDimmer" => Some(CapabilityKind::Intensity {
            brightness: Some((EntityValue::percent(0.0), EntityValue::percent(100.0))),
        }),
        "IntensityRed" => color(Color::Red),
        "IntensityGreen" => color(Color::Green),
        "IntensityBlue" => color(Color::Blue),
        "IntensityWhite" => color(Color::White),
        "IntensityAmber" => color(Color::Amber),
        "IntensityUV" => color(Color::Uv),
        "IntensityLime" => color(Color::Lime),
        "IntensityIndigo" => color(Color::Indigo),
        "IntensityCyan" => color(Color::Cyan),
        "IntensityMagenta" => color(Color::Magenta),
        "IntensityYellow" => color(Color::Yellow),
        "PositionPan" => Some(CapabilityKind::Pan {
            angle: (EntityValue::degrees(0.0), EntityValue::degrees(540.0)),
        }),
        "PositionTilt" => Some(CapabilityKind::Tilt {
            angle: (EntityValue::degrees(0.0), EntityValue::degrees(270.0)),
        }),
        "ShutterStrobeSlowFast" => Some(CapabilityKind::ShutterStrobe {
            effect: ShutterEffect::Strobe,
            speed: Some((EntityValue::keyword("slow"), EntityValue::keyword("fast"))),
            sound_controlled: false,
            random_timing: false,
        }),
        "BeamZoomSmallBig" => Some(CapabilityKind::Zoom {
            angle: (EntityValue::keyword("narrow"), EntityValue::keyword("wide")),
        }),
        "BeamZoomBigSmall" => Some(CapabilityKind::Zoom {
            angle: (EntityValue::keyword("wide"), EntityValue::keyword("narrow")),
        }),
        "BeamIris" => Some(CapabilityKind::Iris {
            open_percent: (EntityValue::percent(0.0), EntityValue::percent(100.0)),
        }),
        "BeamFocusNearFar" => Some(CapabilityKind::Focus {
            distance: (EntityValue::keyword("near"), EntityValue::keyword("far")),
        }),
        "BeamFocusFarNear" => Some(CapabilityKind::Focus {
            distance: (EntityValue::keyword("far"), EntityValue::keyword("near")),
        }),
        "ColorMacro" => Some(CapabilityKind::ColorPreset {
            colors: Vec::new(),
            color_temperature: None,
        }),
        "NoFunction" => Some(CapabilityKind::NoFunction),
        _ => None,
    }
}

fn read_physical(node: &XmlNode) -> Physical {
    let mut physical = Physical::default();

    if let Some(bulb) = node.child("Bulb") {
        physical.bulb_type = bulb.attr("Type").filter(|t| !t.is_empty()).map(str::to_string);
    }
    if let Some(dimensions) = node.child("Dimensions") {
        physical.weight = float_attr(dimensions, "Weight").filter(|&w| w > 0.0);
        let width = float_attr(dimensions, "Width").unwrap_or(0.0);
        let height = float_attr(dimensions, "Height").unwrap_or(0.0);
        let depth = float_attr(dimensions, "Depth").unwrap_or(0.0);
        if width > 0.0 || height > 0.0 || depth > 0.0 {
            physical.dimensions = Some([width, height, depth]);
        }
    }
    if let Some(lens) = node.child("Lens") {
        let min = float_attr(lens, "DegreesMin").unwrap_or(0.0);
        let max = float_attr(lens, "DegreesMax").unwrap_or(0.0);
        if min > 0.0 || max > 0.0 {
            physical.lens_degrees = Some((min, max));
        }
    }
    if let Some(technical) = node.child("Technical") {
        physical.power = float_attr(technical, "PowerConsumption").filter(|&p| p > 0.0);
        physical.dmx_connector = technical
            .attr("DmxConnector")
            .filter(|c| !c.is_empty())
            .map(str::to_string);
    }

    physical
}

fn float_attr(node: &XmlNode, name: &str) -> Option<f64> {
    node.attr(name).and_then(|value| value.trim().parse().ok())
}

fn parse_attr<T: std::str::FromStr>(node: &XmlNode, name: &str) -> Result<T, FormatError> {
    let value = node.require_attr(name)?;
    value
        .trim()
        .parse()
        .map_err(|_| FormatError::parse(format!("invalid {}@{name} value `{value}`", node.name)))
}
