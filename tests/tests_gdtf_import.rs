//! GDTF import through the format-adapter trait object.

use std::path::Path;

use fixlib::formats::{FixtureFormat, detect_format};
use fixlib::model::{Capabilities, CapabilityKind, ShutterEffect};
use fixlib::{Channel, resolve_mode};

fn description(body: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<GDTF DataVersion="1.2">
  <FixtureType Name="Test Spot" ShortName="TSpot" Manufacturer="Acme">
    <DMXModes>
      <DMXMode Name="Standard">
        <DMXChannels>
          {body}
        </DMXChannels>
      </DMXMode>
    </DMXModes>
  </FixtureType>
</GDTF>"#
    )
    .into_bytes()
}

fn strobe_channel(attribute: &str) -> String {
    format!(
        r#"<DMXChannel Offset="1">
  <LogicalChannel Attribute="{attribute}">
    <ChannelFunction Attribute="{attribute}" Name="Strobe" DMXFrom="0/1"
                     PhysicalFrom="1" PhysicalTo="10"/>
  </LogicalChannel>
</DMXChannel>"#
    )
}

#[test]
fn test_import_through_detected_format() {
    let format = detect_format(Path::new("test-spot.gdtf")).unwrap();
    assert!(format.capabilities().read);
    assert!(!format.capabilities().write);

    let input = description(
        r#"<DMXChannel Offset="1" Highlight="255/1">
  <LogicalChannel Attribute="Dimmer">
    <ChannelFunction Attribute="Dimmer" DMXFrom="0/1"/>
  </LogicalChannel>
</DMXChannel>"#,
    );
    let result = format.import(&input, "test-spot.gdtf", "importer").unwrap();

    assert_eq!(result.fixtures.len(), 1);
    let fixture = &result.fixtures[0];
    assert_eq!(fixture.name, "Test Spot");
    assert_eq!(fixture.short_name.as_deref(), Some("TSpot"));
    assert!(result.manufacturers.contains_key("acme"));

    let meta = &fixture.meta;
    assert_eq!(meta.authors, vec!["importer".to_string()]);
    assert_eq!(
        meta.import_plugin.as_ref().map(|p| p.plugin.as_str()),
        Some("gdtf")
    );

    let dimmer = &fixture.available_channels["Dimmer"];
    assert_eq!(dimmer.highlight_value, Some(255));
}

#[test]
fn test_imported_modes_resolve() {
    // A 16-bit pan plus an 8-bit dimmer, with slot 2 left empty. The
    // imported mode must resolve without touching the fixture again.
    let input = description(
        r#"<DMXChannel Offset="1">
  <LogicalChannel Attribute="Dimmer">
    <ChannelFunction Attribute="Dimmer" DMXFrom="0/1"/>
  </LogicalChannel>
</DMXChannel>
<DMXChannel Offset="3,4">
  <LogicalChannel Attribute="Pan">
    <ChannelFunction Attribute="Pan" DMXFrom="0/1" PhysicalFrom="-270" PhysicalTo="270"/>
  </LogicalChannel>
</DMXChannel>"#,
    );
    let result = fixlib::formats::Gdtf
        .import(&input, "test-spot.gdtf", "importer")
        .unwrap();
    let fixture = &result.fixtures[0];

    let resolved = resolve_mode(fixture, &fixture.modes[0]).unwrap();
    assert_eq!(resolved.len(), 4);
    assert_eq!(resolved[0].key().unwrap(), "Dimmer");
    assert!(matches!(resolved[1], Channel::Null));
    assert_eq!(resolved[2].key().unwrap(), "Pan");
    match &resolved[3] {
        Channel::Fine { fineness, coarse, .. } => {
            assert_eq!(*fineness, 1);
            assert_eq!(coarse.key, "Pan");
        }
        other => panic!("expected fine channel, got {other:?}"),
    }
}

#[test]
fn test_numbered_attributes_behave_like_their_base() {
    // Shutter2Strobe inherits the Shutter1Strobe mapping, so two imports
    // differing only in the wheel number produce the same capability.
    let first = fixlib::formats::Gdtf
        .import(
            &description(&strobe_channel("Shutter1Strobe")),
            "a.gdtf",
            "importer",
        )
        .unwrap();
    let second = fixlib::formats::Gdtf
        .import(
            &description(&strobe_channel("Shutter2Strobe")),
            "b.gdtf",
            "importer",
        )
        .unwrap();

    let capabilities_of = |result: &fixlib::formats::ImportResult| {
        let fixture = &result.fixtures[0];
        let (_, channel) = fixture.available_channels.first().unwrap();
        channel.capabilities.clone()
    };

    let caps = capabilities_of(&first);
    assert_eq!(caps, capabilities_of(&second));

    let Capabilities::One(capability) = caps else {
        panic!("expected a single inline capability");
    };
    match capability.kind {
        CapabilityKind::ShutterStrobe {
            effect,
            speed,
            random_timing,
            ..
        } => {
            assert_eq!(effect, ShutterEffect::Strobe);
            assert!(speed.is_some());
            assert!(!random_timing);
        }
        other => panic!("expected a strobe capability, got {other:?}"),
    }
}

#[test]
fn test_channel_widens_when_modes_disagree_on_resolution() {
    // The same attribute may occupy one byte in one mode and two in
    // another. The shared channel definition takes the widest use.
    let input = r#"<?xml version="1.0" encoding="UTF-8"?>
<GDTF DataVersion="1.2">
  <FixtureType Name="Test Spot" Manufacturer="Acme">
    <DMXModes>
      <DMXMode Name="Basic">
        <DMXChannels>
          <DMXChannel Offset="1">
            <LogicalChannel Attribute="Dimmer">
              <ChannelFunction Attribute="Dimmer" DMXFrom="0/1"/>
            </LogicalChannel>
          </DMXChannel>
        </DMXChannels>
      </DMXMode>
      <DMXMode Name="Extended">
        <DMXChannels>
          <DMXChannel Offset="1,2">
            <LogicalChannel Attribute="Dimmer">
              <ChannelFunction Attribute="Dimmer" DMXFrom="0/1"/>
            </LogicalChannel>
          </DMXChannel>
        </DMXChannels>
      </DMXMode>
    </DMXModes>
  </FixtureType>
</GDTF>"#;

    let result = fixlib::formats::Gdtf
        .import(input.as_bytes(), "test-spot.gdtf", "importer")
        .unwrap();
    let fixture = &result.fixtures[0];

    let dimmer = &fixture.available_channels["Dimmer"];
    assert_eq!(dimmer.max_resolution(), 2);
    assert_eq!(dimmer.fine_channel_aliases.as_slice(), ["Dimmer fine"]);

    // Both modes resolve: the basic one uses the coarse byte alone.
    let basic = resolve_mode(fixture, &fixture.modes[0]).unwrap();
    assert_eq!(basic.len(), 1);
    assert_eq!(basic[0].key().unwrap(), "Dimmer");

    let extended = resolve_mode(fixture, &fixture.modes[1]).unwrap();
    assert_eq!(extended.len(), 2);
    assert_eq!(extended[1].key().unwrap(), "Dimmer fine");
}

#[test]
fn test_zero_offset_is_rejected() {
    // DMX offsets are 1-based; zero must fail cleanly instead of
    // corrupting the slot map.
    let input = description(
        r#"<DMXChannel Offset="0">
  <LogicalChannel Attribute="Dimmer">
    <ChannelFunction Attribute="Dimmer" DMXFrom="0/1"/>
  </LogicalChannel>
</DMXChannel>"#,
    );
    let error = fixlib::formats::Gdtf
        .import(&input, "test-spot.gdtf", "importer")
        .unwrap_err();
    assert!(error.to_string().contains("offset"));
}

#[test]
fn test_virtual_channel_is_skipped_with_warning() {
    let input = description(
        r#"<DMXChannel Offset="1">
  <LogicalChannel Attribute="Dimmer">
    <ChannelFunction Attribute="Dimmer" DMXFrom="0/1"/>
  </LogicalChannel>
</DMXChannel>
<DMXChannel Offset="None">
  <LogicalChannel Attribute="Dimmer">
    <ChannelFunction Attribute="Dimmer" DMXFrom="0/1"/>
  </LogicalChannel>
</DMXChannel>"#,
    );
    let result = fixlib::formats::Gdtf
        .import(&input, "test-spot.gdtf", "importer")
        .unwrap();

    assert_eq!(result.fixtures[0].available_channels.len(), 1);
    assert!(
        result
            .warnings
            .iter()
            .any(|warning| warning.contains("virtual channel"))
    );
}

#[test]
fn test_out_of_order_functions_fail_with_channel_name() {
    let input = description(
        r#"<DMXChannel Offset="1">
  <LogicalChannel Attribute="Shutter1">
    <ChannelFunction Attribute="Shutter1" Name="Open" DMXFrom="0/1"/>
    <ChannelFunction Attribute="Shutter1Strobe" Name="Strobe" DMXFrom="200/1"/>
    <ChannelFunction Attribute="Shutter1StrobeRandom" Name="Random" DMXFrom="100/1"/>
  </LogicalChannel>
</DMXChannel>"#,
    );
    let error = fixlib::formats::Gdtf
        .import(&input, "test-spot.gdtf", "importer")
        .unwrap_err();
    assert!(error.to_string().contains("Shutter1"));
}
