//! GDTF (General Device Type Format) import.
//!
//! A `.gdtf` file is a ZIP container holding a `description.xml` with the
//! fixture type, its DMX modes and channel functions. Import maps each
//! channel function to a canonical capability through the attribute table
//! in [`attributes`]; physical values pass through the unit conversions
//! in [`units`].
//!
//! GDTF is import-only here. Exporting would require geometry trees and
//! wheel media this library does not model.

mod attributes;
mod reader;
mod units;

use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::model::{Fixture, Manufacturer};

use super::format::{
    ExportOptions, ExportResult, FixtureFormat, FormatCapability, ImportResult,
};
use super::FormatError;

use reader::GdtfReader;

/// The GDTF format handler.
pub struct Gdtf;

impl FixtureFormat for Gdtf {
    fn name(&self) -> &'static str {
        "GDTF"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["gdtf"]
    }

    fn mime_type(&self) -> &'static str {
        "application/gdtf"
    }

    fn capabilities(&self) -> FormatCapability {
        FormatCapability::READ_ONLY
    }

    fn import(
        &self,
        input: &[u8],
        source_name: &str,
        author_name: &str,
    ) -> Result<ImportResult, FormatError> {
        let description = extract_description(input)?;
        GdtfReader::new(source_name, author_name).read_description(&description)
    }

    fn export(
        &self,
        _fixtures: &[(Manufacturer, Fixture)],
        _options: &ExportOptions,
    ) -> Result<ExportResult, FormatError> {
        Err(FormatError::ExportUnsupported("GDTF"))
    }

    fn validate(&self, input: &[u8]) -> Result<(), FormatError> {
        if input.len() < 4 {
            return Err(FormatError::archive("file too small"));
        }

        // ZIP containers start with PK\x03\x04; a bare description.xml
        // starts with the XML prolog or the root element.
        if &input[0..4] != b"PK\x03\x04" && input[0] != b'<' {
            return Err(FormatError::archive("not a GDTF container"));
        }

        Ok(())
    }
}

/// Pull the `description.xml` bytes out of a GDTF container. Bare XML
/// input (an unpacked description) is passed through unchanged.
fn extract_description(input: &[u8]) -> Result<Vec<u8>, FormatError> {
    if input.first() == Some(&b'<') {
        return Ok(input.to_vec());
    }

    let cursor = Cursor::new(input);
    let mut archive = ZipArchive::new(cursor)
        .map_err(|e| FormatError::archive(format!("failed to open container: {e}")))?;

    // Entry names are matched case-insensitively; some builders emit
    // Description.xml.
    let entry_name = (0..archive.len())
        .filter_map(|index| {
            let file = archive.by_index(index).ok()?;
            let name = file.name().to_string();
            name.eq_ignore_ascii_case("description.xml").then_some(name)
        })
        .next()
        .ok_or_else(|| FormatError::missing_element("description.xml"))?;

    let mut file = archive
        .by_name(&entry_name)
        .map_err(|e| FormatError::archive(format!("failed to read {entry_name}: {e}")))?;

    let mut content = Vec::new();
    file.read_to_end(&mut content)
        .map_err(|e| FormatError::archive(format!("failed to read {entry_name}: {e}")))?;

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Capabilities, CapabilityKind, ModeChannelEntry, ShutterEffect};

    const MOVING_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<GDTF DataVersion="1.2">
  <FixtureType Name="Test Spot 575" ShortName="TS575" Manufacturer="Acme">
    <DMXModes>
      <DMXMode Name="Standard">
        <DMXChannels>
          <DMXChannel Offset="1" Highlight="255/1">
            <LogicalChannel Attribute="Dimmer">
              <ChannelFunction Attribute="Dimmer" Name="Dimmer" DMXFrom="0/1" PhysicalFrom="0" PhysicalTo="100"/>
            </LogicalChannel>
          </DMXChannel>
          <DMXChannel Offset="2,3">
            <LogicalChannel Attribute="Pan">
              <ChannelFunction Attribute="Pan" Name="Pan" DMXFrom="0/1" PhysicalFrom="-270" PhysicalTo="270"/>
            </LogicalChannel>
          </DMXChannel>
          <DMXChannel Offset="5">
            <LogicalChannel Attribute="Shutter1">
              <ChannelFunction Attribute="Shutter1" Name="Open" DMXFrom="0/1"/>
              <ChannelFunction Attribute="Shutter1Strobe" Name="Strobe" DMXFrom="64/1" PhysicalFrom="1" PhysicalTo="10"/>
              <ChannelFunction Attribute="Shutter1StrobeRandom" Name="Random strobe" DMXFrom="192/1"/>
            </LogicalChannel>
          </DMXChannel>
        </DMXChannels>
      </DMXMode>
    </DMXModes>
  </FixtureType>
</GDTF>"#;

    #[test]
    fn test_validate_zip_magic_and_bare_xml() {
        assert!(Gdtf.validate(b"PK\x03\x04rest of zip...").is_ok());
        assert!(Gdtf.validate(MOVING_HEAD.as_bytes()).is_ok());
        assert!(Gdtf.validate(b"not a container").is_err());
        assert!(Gdtf.validate(b"PK").is_err());
    }

    #[test]
    fn test_export_is_unsupported() {
        let result = Gdtf.export(&[], &ExportOptions::default());
        assert!(matches!(result, Err(FormatError::ExportUnsupported("GDTF"))));
    }

    #[test]
    fn test_import_builds_fixture_and_manufacturer() {
        let result = Gdtf
            .import(MOVING_HEAD.as_bytes(), "test-spot.gdtf", "Test Author")
            .unwrap();

        assert_eq!(result.fixtures.len(), 1);
        let fixture = &result.fixtures[0];
        assert_eq!(fixture.name, "Test Spot 575");
        assert_eq!(fixture.short_name.as_deref(), Some("TS575"));
        assert_eq!(fixture.meta.authors, vec!["Test Author".to_string()]);

        let manufacturer = result.manufacturers.get("acme").unwrap();
        assert_eq!(manufacturer.name, "Acme");
    }

    #[test]
    fn test_import_sixteen_bit_channel_gets_fine_alias() {
        let result = Gdtf
            .import(MOVING_HEAD.as_bytes(), "test-spot.gdtf", "Test Author")
            .unwrap();
        let fixture = &result.fixtures[0];

        let pan = fixture.available_channels.get("Pan").unwrap();
        assert_eq!(pan.dmx_value_resolution, 2);
        assert_eq!(pan.fine_channel_aliases, vec!["Pan fine"]);
    }

    #[test]
    fn test_import_mode_slots_follow_offsets() {
        let result = Gdtf
            .import(MOVING_HEAD.as_bytes(), "test-spot.gdtf", "Test Author")
            .unwrap();
        let fixture = &result.fixtures[0];

        let mode = &fixture.modes[0];
        assert_eq!(mode.name, "Standard");
        assert_eq!(
            mode.channels,
            vec![
                ModeChannelEntry::Key("Dimmer".into()),
                ModeChannelEntry::Key("Pan".into()),
                ModeChannelEntry::Key("Pan fine".into()),
                // Offset 4 is unused in the source file.
                ModeChannelEntry::Null,
                ModeChannelEntry::Key("Shutter1".into()),
            ]
        );
    }

    #[test]
    fn test_import_channel_functions_tile_the_channel() {
        let result = Gdtf
            .import(MOVING_HEAD.as_bytes(), "test-spot.gdtf", "Test Author")
            .unwrap();
        let fixture = &result.fixtures[0];

        let shutter = fixture.available_channels.get("Shutter1").unwrap();
        let Capabilities::Many(list) = &shutter.capabilities else {
            panic!("expected a capability list");
        };
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].dmx_range.unwrap().start, 0);
        assert_eq!(list[0].dmx_range.unwrap().end, 63);
        assert_eq!(list[1].dmx_range.unwrap().start, 64);
        assert_eq!(list[1].dmx_range.unwrap().end, 191);
        assert_eq!(list[2].dmx_range.unwrap().start, 192);
        assert_eq!(list[2].dmx_range.unwrap().end, 255);

        assert!(matches!(
            list[0].kind,
            CapabilityKind::ShutterStrobe { effect: ShutterEffect::Open, .. }
        ));
        assert!(matches!(
            list[1].kind,
            CapabilityKind::ShutterStrobe {
                effect: ShutterEffect::Strobe,
                speed: Some(_),
                random_timing: false,
                ..
            }
        ));
        assert!(matches!(
            list[2].kind,
            CapabilityKind::ShutterStrobe { random_timing: true, .. }
        ));
    }

    #[test]
    fn test_import_unmapped_attribute_warns_and_falls_back() {
        let xml = r#"<GDTF DataVersion="1.2">
  <FixtureType Name="Oddball" Manufacturer="Acme">
    <DMXModes>
      <DMXMode Name="Default">
        <DMXChannels>
          <DMXChannel Offset="1">
            <LogicalChannel Attribute="FrobnicatorDepth">
              <ChannelFunction Attribute="FrobnicatorDepth" Name="Frobnicate" DMXFrom="0/1"/>
            </LogicalChannel>
          </DMXChannel>
        </DMXChannels>
      </DMXMode>
    </DMXModes>
  </FixtureType>
</GDTF>"#;

        let result = Gdtf.import(xml.as_bytes(), "oddball.gdtf", "Test Author").unwrap();
        let fixture = &result.fixtures[0];
        let channel = fixture.available_channels.get("FrobnicatorDepth").unwrap();
        assert!(matches!(
            channel.capabilities.all()[0].kind,
            CapabilityKind::Generic
        ));
        assert!(
            result
                .warnings
                .iter()
                .any(|warning| warning.contains("FrobnicatorDepth"))
        );
    }

    #[test]
    fn test_import_from_zip_container() {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buffer);
            let options = SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);
            zip.start_file("description.xml", options).unwrap();
            zip.write_all(MOVING_HEAD.as_bytes()).unwrap();
            zip.finish().unwrap();
        }

        let bytes = buffer.into_inner();
        assert!(Gdtf.validate(&bytes).is_ok());

        let result = Gdtf.import(&bytes, "test-spot.gdtf", "Test Author").unwrap();
        assert_eq!(result.fixtures[0].name, "Test Spot 575");
    }

    #[test]
    fn test_import_missing_description_fails() {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buffer);
            zip.start_file("something-else.txt", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"hello").unwrap();
            zip.finish().unwrap();
        }

        let result = Gdtf.import(&buffer.into_inner(), "broken.gdtf", "Test Author");
        assert!(matches!(result, Err(FormatError::Missing { .. })));
    }
}
