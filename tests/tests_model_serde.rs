//! JSON shape of the serialized model.
//!
//! Downstream tooling consumes these structures as JSON; field naming
//! and optional-field omission are part of the contract.

use fixlib::base::DmxRange;
use fixlib::model::{
    Capabilities, Capability, CapabilityKind, ChannelOrder, CoarseChannel, EntityValue,
    MatrixInsert, Mode, ModeChannelEntry, RepeatFor, ShutterEffect,
};
use serde_json::json;
use smol_str::SmolStr;

#[test]
fn test_capability_serializes_with_type_tag() {
    let capability = Capability::new(
        DmxRange::new(64, 191).unwrap(),
        CapabilityKind::ShutterStrobe {
            effect: ShutterEffect::Strobe,
            speed: Some((EntityValue::hertz(1.0), EntityValue::hertz(10.0))),
            sound_controlled: false,
            random_timing: false,
        },
    );

    assert_eq!(
        serde_json::to_value(&capability).unwrap(),
        json!({
            "dmxRange": { "start": 64, "end": 191 },
            "type": "ShutterStrobe",
            "effect": "Strobe",
            "speed": [
                { "value": 1.0, "unit": "hertz" },
                { "value": 10.0, "unit": "hertz" },
            ],
            "soundControlled": false,
            "randomTiming": false,
        })
    );
}

#[test]
fn test_inline_capability_omits_optional_fields() {
    let capability = Capability::inline(CapabilityKind::Intensity { brightness: None });
    let value = serde_json::to_value(&capability).unwrap();

    // No dmxRange, comment or switchChannels keys when they are unset.
    assert_eq!(
        value,
        json!({ "type": "Intensity", "brightness": null })
    );
}

#[test]
fn test_keyword_values_serialize_as_strings() {
    let value = serde_json::to_value(EntityValue::keyword("fast")).unwrap();
    assert_eq!(value, json!("fast"));

    let back: EntityValue = serde_json::from_value(json!("fast")).unwrap();
    assert_eq!(back, EntityValue::keyword("fast"));
}

#[test]
fn test_coarse_channel_field_naming() {
    let mut channel = CoarseChannel::new(
        "Pan",
        Capabilities::One(Capability::inline(CapabilityKind::Pan {
            angle: (EntityValue::degrees(0.0), EntityValue::degrees(540.0)),
        })),
    );
    channel.fine_channel_aliases = vec![SmolStr::new("Pan fine")];
    channel.dmx_value_resolution = 2;
    channel.default_value = 0x8000;

    let value = serde_json::to_value(&channel).unwrap();
    assert_eq!(value["fineChannelAliases"], json!(["Pan fine"]));
    assert_eq!(value["dmxValueResolution"], json!(2));
    assert_eq!(value["defaultValue"], json!(32768));
    assert!(value.get("name").is_none());
    assert!(value.get("highlightValue").is_none());
}

#[test]
fn test_mode_entries_roundtrip() {
    let mode = Mode::new(
        "Full",
        vec![
            ModeChannelEntry::key("Dimmer"),
            ModeChannelEntry::Null,
            ModeChannelEntry::Insert(MatrixInsert {
                repeat_for: RepeatFor::EachPixel,
                channel_order: ChannelOrder::PerPixel,
                template_channels: vec![Some(SmolStr::new("Red $pixelKey")), None],
            }),
        ],
    );

    let value = serde_json::to_value(&mode).unwrap();
    assert!(value.get("shortName").is_none());
    assert!(value.get("physical").is_none());

    let back: Mode = serde_json::from_value(value).unwrap();
    assert_eq!(back, mode);
}

#[test]
fn test_capabilities_list_roundtrips() {
    let capabilities = Capabilities::Many(vec![
        Capability::new(
            DmxRange::new(0, 127).unwrap(),
            CapabilityKind::NoFunction,
        ),
        Capability::new(
            DmxRange::new(128, 255).unwrap(),
            CapabilityKind::Intensity {
                brightness: Some((EntityValue::percent(0.0), EntityValue::percent(100.0))),
            },
        ),
    ]);

    let value = serde_json::to_value(&capabilities).unwrap();
    let back: Capabilities = serde_json::from_value(value).unwrap();
    assert_eq!(back, capabilities);
}
