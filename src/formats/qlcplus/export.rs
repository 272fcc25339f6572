//! QLC+ `.qxf` writer.
//!
//! One file per fixture. Modes are resolved first so matrix inserts and
//! switching channels flatten into concrete channel lists; every channel
//! a mode references is then emitted once, rescaled to 8 bit, with its
//! fine bytes as separate `Byte="1"` channels.

use std::io::Cursor;

use indexmap::IndexMap;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::sync::Arc;

use crate::base::{Resolution, scale_range_individually};
use crate::formats::format::{ExportFailure, ExportOptions, ExportedFile};
use crate::formats::FormatError;
use crate::model::{
    Capability, CapabilityKind, Channel, CoarseChannel, Fixture, Manufacturer, Mode, Physical,
};
use crate::resolve::resolve_mode;

use super::presets::export_preset;

pub(super) const MIME_TYPE: &str = "application/x-qlc-fixture";

/// A coarse channel scheduled for emission, with the fine bytes modes
/// actually use.
struct ExportChannel {
    coarse: Arc<CoarseChannel>,
    fine_in_use: Vec<Resolution>,
}

/// Channel definitions in first-reference order, keyed by display name.
#[derive(Default)]
struct ChannelTable {
    channels: IndexMap<String, ExportChannel>,
    null_count: u32,
}

impl ChannelTable {
    fn add_coarse(&mut self, coarse: &Arc<CoarseChannel>) -> String {
        let name = coarse.name().to_string();
        self.channels.entry(name.clone()).or_insert(ExportChannel {
            coarse: Arc::clone(coarse),
            fine_in_use: Vec::new(),
        });
        name
    }

    fn add_fine(&mut self, coarse: &Arc<CoarseChannel>, fineness: Resolution) -> String {
        self.add_coarse(coarse);
        let entry = &mut self.channels[coarse.name()];
        if !entry.fine_in_use.contains(&fineness) {
            entry.fine_in_use.push(fineness);
            entry.fine_in_use.sort_unstable();
        }
        fine_name(coarse, fineness)
    }

    fn next_null_name(&mut self) -> String {
        self.null_count += 1;
        format!("No function {}", self.null_count)
    }
}

fn fine_name(coarse: &CoarseChannel, fineness: Resolution) -> String {
    if fineness == 1 {
        format!("{} Fine", coarse.name())
    } else {
        format!("{} Fine {fineness}", coarse.name())
    }
}

/// Export one fixture as a `.qxf` file.
pub(super) fn export_fixture(
    manufacturer: &Manufacturer,
    fixture: &Fixture,
    options: &ExportOptions,
) -> Result<ExportedFile, ExportFailure> {
    let failure = |mode: Option<String>, source: FormatError| ExportFailure {
        fixture: fixture.name.clone(),
        mode,
        source,
    };

    // Resolve every mode up front; null slots and switching channels get
    // concrete names here.
    let mut table = ChannelTable::default();
    let mut mode_lists: Vec<(&Mode, Vec<String>)> = Vec::new();

    for mode in &fixture.modes {
        let resolved = resolve_mode(fixture, mode)
            .map_err(|e| failure(Some(mode.name.clone()), e.into()))?;

        let mut names = Vec::with_capacity(resolved.len());
        for channel in &resolved {
            let name = channel_slot_name(fixture, channel, &mut table)
                .map_err(|e| failure(Some(mode.name.clone()), e))?;
            names.push(name);
        }
        mode_lists.push((mode, names));
    }

    let content = write_definition(manufacturer, fixture, options, &table, &mode_lists)
        .map_err(|e| failure(None, e))?;

    let file_name = format!("{}-{}.qxf", manufacturer.key, fixture.key());
    let name = match &options.base_directory {
        Some(directory) => format!("{directory}/{file_name}"),
        None => file_name,
    };

    Ok(ExportedFile {
        name,
        content,
        mime_type: MIME_TYPE,
        related_fixtures: vec![fixture.key()],
    })
}

/// The name occupying one resolved mode slot, registering the channel
/// for emission as a side effect.
fn channel_slot_name(
    fixture: &Fixture,
    channel: &Channel,
    table: &mut ChannelTable,
) -> Result<String, FormatError> {
    match channel {
        Channel::Coarse(coarse) => Ok(table.add_coarse(coarse)),
        Channel::Fine { coarse, fineness, .. } => Ok(table.add_fine(coarse, *fineness)),
        Channel::Switching(switching) => {
            // QLC+ has no switching channels; emit the default target.
            let target = switching.default_channel_key()?;
            let coarse = fixture
                .available_channels
                .get(&target)
                .ok_or_else(|| FormatError::missing_element(format!("channel {target}")))?;
            Ok(table.add_coarse(coarse))
        }
        Channel::Null => Ok(table.next_null_name()),
        Channel::Matrix(matrix) => channel_slot_name(fixture, &matrix.inner, table),
    }
}

// ==== XML writing ====

type XmlWriter<'a> = Writer<&'a mut Cursor<Vec<u8>>>;

fn xml_err<E: std::fmt::Display>(e: E) -> FormatError {
    FormatError::xml(format!("write error: {e}"))
}

fn write_definition(
    manufacturer: &Manufacturer,
    fixture: &Fixture,
    options: &ExportOptions,
    table: &ChannelTable,
    mode_lists: &[(&Mode, Vec<String>)],
) -> Result<Vec<u8>, FormatError> {
    let mut buffer = Cursor::new(Vec::new());
    let mut writer = Writer::new_with_indent(&mut buffer, b' ', 1);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::DocType(BytesText::new("FixtureDefinition")))
        .map_err(xml_err)?;

    let mut root = BytesStart::new("FixtureDefinition");
    root.push_attribute(("xmlns", "http://www.qlcplus.org/FixtureDefinition"));
    writer.write_event(Event::Start(root)).map_err(xml_err)?;

    write_creator(&mut writer, fixture, options)?;
    write_text_element(&mut writer, "Manufacturer", &manufacturer.name)?;
    write_text_element(&mut writer, "Model", &fixture.name)?;
    write_text_element(
        &mut writer,
        "Type",
        fixture.categories.first().map_or("Other", String::as_str),
    )?;

    for entry in table.channels.values() {
        write_channel(&mut writer, entry)?;
        for &fineness in &entry.fine_in_use {
            write_fine_channel(&mut writer, &entry.coarse, fineness)?;
        }
    }

    for (mode, names) in mode_lists {
        write_mode(&mut writer, mode, names)?;
    }

    write_physical(&mut writer, fixture.physical.as_ref())?;

    writer
        .write_event(Event::End(BytesEnd::new("FixtureDefinition")))
        .map_err(xml_err)?;

    Ok(buffer.into_inner())
}

fn write_creator(
    writer: &mut XmlWriter<'_>,
    fixture: &Fixture,
    options: &ExportOptions,
) -> Result<(), FormatError> {
    writer
        .write_event(Event::Start(BytesStart::new("Creator")))
        .map_err(xml_err)?;
    write_text_element(writer, "Name", "Q Light Controller Plus")?;
    write_text_element(writer, "Version", &options.displayed_version)?;
    write_text_element(writer, "Author", &fixture.meta.authors.join(", "))?;
    writer
        .write_event(Event::End(BytesEnd::new("Creator")))
        .map_err(xml_err)
}

fn write_channel(writer: &mut XmlWriter<'_>, entry: &ExportChannel) -> Result<(), FormatError> {
    let coarse = &entry.coarse;
    let resolution = coarse.dmx_value_resolution;

    let mut start = BytesStart::new("Channel");
    start.push_attribute(("Name", coarse.name()));
    let default = coarse.default_value_at(1).map_err(FormatError::from)?;
    if default != 0 {
        start.push_attribute(("Default", default.to_string().as_str()));
    }
    writer.write_event(Event::Start(start)).map_err(xml_err)?;

    let mut group = BytesStart::new("Group");
    group.push_attribute(("Byte", "0"));
    writer.write_event(Event::Start(group)).map_err(xml_err)?;
    writer
        .write_event(Event::Text(BytesText::new(channel_group(coarse))))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("Group")))
        .map_err(xml_err)?;

    for capability in coarse.capabilities.all() {
        write_capability(writer, capability, resolution)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("Channel")))
        .map_err(xml_err)
}

fn write_capability(
    writer: &mut XmlWriter<'_>,
    capability: &Capability,
    resolution: Resolution,
) -> Result<(), FormatError> {
    let range = capability.range_at(resolution);
    let (min, max) = scale_range_individually(range.start, resolution, range.end, resolution, 1)?;

    let label = capability
        .comment
        .clone()
        .unwrap_or_else(|| default_label(&capability.kind));

    let mut start = BytesStart::new("Capability");
    start.push_attribute(("Min", min.to_string().as_str()));
    start.push_attribute(("Max", max.to_string().as_str()));
    if let Some(preset) = export_preset(capability) {
        start.push_attribute(("Preset", preset));
    }

    writer.write_event(Event::Start(start)).map_err(xml_err)?;
    writer
        .write_event(Event::Text(BytesText::new(&label)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("Capability")))
        .map_err(xml_err)
}

fn write_fine_channel(
    writer: &mut XmlWriter<'_>,
    coarse: &CoarseChannel,
    fineness: Resolution,
) -> Result<(), FormatError> {
    let name = fine_name(coarse, fineness);

    let mut start = BytesStart::new("Channel");
    start.push_attribute(("Name", name.as_str()));
    writer.write_event(Event::Start(start)).map_err(xml_err)?;

    let mut group = BytesStart::new("Group");
    group.push_attribute(("Byte", "1"));
    writer.write_event(Event::Start(group)).map_err(xml_err)?;
    writer
        .write_event(Event::Text(BytesText::new(channel_group(coarse))))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("Group")))
        .map_err(xml_err)?;

    let mut capability = BytesStart::new("Capability");
    capability.push_attribute(("Min", "0"));
    capability.push_attribute(("Max", "255"));
    writer
        .write_event(Event::Start(capability))
        .map_err(xml_err)?;
    let label = format!("Fine adjustment for {}", coarse.name());
    writer
        .write_event(Event::Text(BytesText::new(&label)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("Capability")))
        .map_err(xml_err)?;

    writer
        .write_event(Event::End(BytesEnd::new("Channel")))
        .map_err(xml_err)
}

fn write_mode(
    writer: &mut XmlWriter<'_>,
    mode: &Mode,
    names: &[String],
) -> Result<(), FormatError> {
    let mut start = BytesStart::new("Mode");
    start.push_attribute(("Name", mode.name.as_str()));
    writer.write_event(Event::Start(start)).map_err(xml_err)?;

    for (number, name) in names.iter().enumerate() {
        let mut entry = BytesStart::new("Channel");
        entry.push_attribute(("Number", number.to_string().as_str()));
        writer.write_event(Event::Start(entry)).map_err(xml_err)?;
        writer
            .write_event(Event::Text(BytesText::new(name)))
            .map_err(xml_err)?;
        writer
            .write_event(Event::End(BytesEnd::new("Channel")))
            .map_err(xml_err)?;
    }

    if let Some(physical) = &mode.physical {
        write_physical(writer, Some(physical))?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("Mode")))
        .map_err(xml_err)
}

fn write_physical(
    writer: &mut XmlWriter<'_>,
    physical: Option<&Physical>,
) -> Result<(), FormatError> {
    let default = Physical::default();
    let physical = physical.unwrap_or(&default);

    writer
        .write_event(Event::Start(BytesStart::new("Physical")))
        .map_err(xml_err)?;

    let mut bulb = BytesStart::new("Bulb");
    bulb.push_attribute(("Type", physical.bulb_type.as_deref().unwrap_or("")));
    bulb.push_attribute(("Lumens", "0"));
    bulb.push_attribute(("ColourTemperature", "0"));
    writer.write_event(Event::Empty(bulb)).map_err(xml_err)?;

    let [width, height, depth] = physical.dimensions.unwrap_or([0.0, 0.0, 0.0]);
    let mut dimensions = BytesStart::new("Dimensions");
    dimensions.push_attribute(("Weight", format_physical(physical.weight.unwrap_or(0.0)).as_str()));
    dimensions.push_attribute(("Width", format_physical(width).as_str()));
    dimensions.push_attribute(("Height", format_physical(height).as_str()));
    dimensions.push_attribute(("Depth", format_physical(depth).as_str()));
    writer
        .write_event(Event::Empty(dimensions))
        .map_err(xml_err)?;

    let (degrees_min, degrees_max) = physical.lens_degrees.unwrap_or((0.0, 0.0));
    let mut lens = BytesStart::new("Lens");
    lens.push_attribute(("Name", "Other"));
    lens.push_attribute(("DegreesMin", format_physical(degrees_min).as_str()));
    lens.push_attribute(("DegreesMax", format_physical(degrees_max).as_str()));
    writer.write_event(Event::Empty(lens)).map_err(xml_err)?;

    let mut focus = BytesStart::new("Focus");
    focus.push_attribute(("Type", "Fixed"));
    focus.push_attribute(("PanMax", "0"));
    focus.push_attribute(("TiltMax", "0"));
    writer.write_event(Event::Empty(focus)).map_err(xml_err)?;

    let mut technical = BytesStart::new("Technical");
    technical.push_attribute((
        "PowerConsumption",
        format_physical(physical.power.unwrap_or(0.0)).as_str(),
    ));
    technical.push_attribute((
        "DmxConnector",
        physical.dmx_connector.as_deref().unwrap_or("3-pin"),
    ));
    writer
        .write_event(Event::Empty(technical))
        .map_err(xml_err)?;

    writer
        .write_event(Event::End(BytesEnd::new("Physical")))
        .map_err(xml_err)
}

fn format_physical(value: f64) -> String {
    crate::model::format_number(value)
}

fn write_text_element(
    writer: &mut XmlWriter<'_>,
    name: &str,
    text: &str,
) -> Result<(), FormatError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_err)
}

/// QLC+ channel group, derived from the first meaningful capability.
fn channel_group(coarse: &CoarseChannel) -> &'static str {
    let kind = coarse
        .capabilities
        .all()
        .iter()
        .map(|capability| &capability.kind)
        .find(|kind| !matches!(kind, CapabilityKind::NoFunction))
        .unwrap_or(&CapabilityKind::NoFunction);

    match kind {
        CapabilityKind::Intensity { .. } | CapabilityKind::ColorIntensity { .. } => "Intensity",
        CapabilityKind::ColorPreset { .. } | CapabilityKind::ColorTemperature { .. } => "Colour",
        CapabilityKind::Pan { .. } | CapabilityKind::PanContinuous { .. } => "Pan",
        CapabilityKind::Tilt { .. } | CapabilityKind::TiltContinuous { .. } => "Tilt",
        CapabilityKind::PanTiltSpeed { .. }
        | CapabilityKind::Speed { .. }
        | CapabilityKind::EffectSpeed { .. } => "Speed",
        CapabilityKind::WheelSlot { .. }
        | CapabilityKind::WheelShake { .. }
        | CapabilityKind::WheelRotation { .. }
        | CapabilityKind::Rotation { .. } => "Gobo",
        CapabilityKind::ShutterStrobe { .. } | CapabilityKind::StrobeSpeed { .. } => "Shutter",
        CapabilityKind::Focus { .. }
        | CapabilityKind::Zoom { .. }
        | CapabilityKind::Iris { .. }
        | CapabilityKind::Frost { .. } => "Beam",
        CapabilityKind::Prism { .. } | CapabilityKind::PrismRotation { .. } => "Prism",
        CapabilityKind::Effect { .. }
        | CapabilityKind::Fog { .. }
        | CapabilityKind::FogOutput { .. }
        | CapabilityKind::FogType { .. } => "Effect",
        CapabilityKind::Maintenance { .. } => "Maintenance",
        CapabilityKind::NoFunction | CapabilityKind::Generic => "Nothing",
    }
}

/// Fallback capability label for capabilities without a comment.
fn default_label(kind: &CapabilityKind) -> String {
    fn range(label: &str, range: &crate::model::EntityRange) -> String {
        let (start, end) = range;
        if start == end {
            format!("{label} {start}")
        } else {
            format!("{label} {start} to {end}")
        }
    }

    match kind {
        CapabilityKind::NoFunction => "No function".to_string(),
        CapabilityKind::Intensity { brightness: Some(b) } => range("Intensity", b),
        CapabilityKind::ColorIntensity { color, .. } => color.name().to_string(),
        CapabilityKind::ShutterStrobe { effect, speed, random_timing, .. } => {
            let base = match effect {
                crate::model::ShutterEffect::Open => "Shutter open",
                crate::model::ShutterEffect::Closed => "Shutter closed",
                _ if *random_timing => "Random strobe",
                _ => "Strobe",
            };
            match speed {
                Some(speed) => range(base, speed),
                None => base.to_string(),
            }
        }
        CapabilityKind::WheelSlot { slot_number, .. } => format!("Slot {slot_number}"),
        CapabilityKind::WheelShake { .. } => "Shake".to_string(),
        CapabilityKind::WheelRotation { speed: Some(speed), .. }
        | CapabilityKind::Rotation { speed: Some(speed), .. } => range("Rotation", speed),
        CapabilityKind::Pan { angle } => range("Pan", angle),
        CapabilityKind::Tilt { angle } => range("Tilt", angle),
        CapabilityKind::Zoom { angle } => range("Zoom", angle),
        CapabilityKind::Iris { open_percent } => range("Iris", open_percent),
        CapabilityKind::Focus { distance } => range("Focus", distance),
        CapabilityKind::Frost { frost_intensity } => range("Frost", frost_intensity),
        CapabilityKind::ColorTemperature { color_temperature } => {
            range("Color temperature", color_temperature)
        }
        CapabilityKind::Prism { .. } => "Prism".to_string(),
        CapabilityKind::Fog { .. } => "Fog".to_string(),
        other => other.tag().to_string(),
    }
}
