//! End-to-end mode resolution over a matrix fixture.

use fixlib::model::{
    Axis, Capabilities, Capability, CapabilityKind, ChannelOrder, CoarseChannel, Color, Matrix,
    MatrixInsert, Mode, ModeChannelEntry, PixelGroupSpec, RepeatFor,
};
use fixlib::{Channel, Fixture, resolve_mode};
use smol_str::SmolStr;

fn color_template(color: Color, name: &str) -> CoarseChannel {
    CoarseChannel::new(
        format!("{name} $pixelKey"),
        Capabilities::One(Capability::inline(CapabilityKind::ColorIntensity {
            color,
            brightness: None,
        })),
    )
}

/// A 4x2 pixel bar with per-pixel RGB template channels, a master dimmer
/// and an "odd columns" pixel group.
fn pixel_bar() -> Fixture {
    let mut fixture = Fixture::new("Pixel Bar 4x2");

    let mut matrix = Matrix::from_pixel_count(4, 2, 1);
    matrix
        .add_pixel_group(
            "odd-columns",
            PixelGroupSpec::Constraints {
                x: vec![fixlib::model::AxisConstraint::parse("odd").unwrap()],
                y: vec![],
                z: vec![],
                name: vec![],
            },
        )
        .unwrap();
    fixture.matrix = Some(matrix);

    fixture.add_template_channel(color_template(Color::Red, "Red"));
    fixture.add_template_channel(color_template(Color::Green, "Green"));
    fixture.add_template_channel(color_template(Color::Blue, "Blue"));

    fixture.add_available_channel(CoarseChannel::new(
        "Dimmer",
        Capabilities::One(Capability::inline(CapabilityKind::Intensity {
            brightness: None,
        })),
    ));

    fixture
}

fn rgb_insert(repeat_for: RepeatFor, channel_order: ChannelOrder) -> ModeChannelEntry {
    ModeChannelEntry::Insert(MatrixInsert {
        repeat_for,
        channel_order,
        template_channels: vec![
            Some(SmolStr::new("Red $pixelKey")),
            Some(SmolStr::new("Green $pixelKey")),
            Some(SmolStr::new("Blue $pixelKey")),
        ],
    })
}

fn keys(channels: &[Channel]) -> Vec<String> {
    channels
        .iter()
        .map(|c| c.key().map(|k| k.to_string()).unwrap_or_default())
        .collect()
}

#[test]
fn test_full_mode_expands_all_pixels() {
    let fixture = pixel_bar();
    let mode = Mode::new(
        "Full",
        vec![
            ModeChannelEntry::key("Dimmer"),
            rgb_insert(RepeatFor::EachPixel, ChannelOrder::PerPixel),
        ],
    );

    let resolved = resolve_mode(&fixture, &mode).unwrap();
    // 1 dimmer + 8 pixels x 3 colors
    assert_eq!(resolved.len(), 1 + 8 * 3);
    assert_eq!(resolved[0].key().unwrap(), "Dimmer");

    let resolved_keys = keys(&resolved);
    assert_eq!(resolved_keys[1], "Red (1, 1, 1)");
    assert_eq!(resolved_keys[2], "Green (1, 1, 1)");
    assert_eq!(resolved_keys[3], "Blue (1, 1, 1)");
    assert_eq!(resolved_keys[4], "Red (2, 1, 1)");
}

#[test]
fn test_per_channel_groups_colors_together() {
    let fixture = pixel_bar();
    let mode = Mode::new(
        "Grouped",
        vec![rgb_insert(RepeatFor::EachPixel, ChannelOrder::PerChannel)],
    );

    let resolved = resolve_mode(&fixture, &mode).unwrap();
    let resolved_keys = keys(&resolved);
    // All reds first, then all greens, then all blues.
    assert!(resolved_keys[..8].iter().all(|k| k.starts_with("Red ")));
    assert!(resolved_keys[8..16].iter().all(|k| k.starts_with("Green ")));
    assert!(resolved_keys[16..].iter().all(|k| k.starts_with("Blue ")));
}

#[test]
fn test_axis_order_repeat() {
    let fixture = pixel_bar();
    let mode = Mode::new(
        "Column major",
        vec![ModeChannelEntry::Insert(MatrixInsert {
            repeat_for: RepeatFor::PixelsAxisOrder(Axis::Y, Axis::X, Axis::Z),
            channel_order: ChannelOrder::PerPixel,
            template_channels: vec![Some(SmolStr::new("Red $pixelKey"))],
        })],
    );

    let resolved = resolve_mode(&fixture, &mode).unwrap();
    let resolved_keys = keys(&resolved);
    // Y varies fastest: both rows of column 1, then column 2, ...
    assert_eq!(resolved_keys[0], "Red (1, 1, 1)");
    assert_eq!(resolved_keys[1], "Red (1, 2, 1)");
    assert_eq!(resolved_keys[2], "Red (2, 1, 1)");
}

#[test]
fn test_pixel_group_repeat() {
    let fixture = pixel_bar();
    let mode = Mode::new(
        "Groups",
        vec![ModeChannelEntry::Insert(MatrixInsert {
            repeat_for: RepeatFor::EachPixelGroup,
            channel_order: ChannelOrder::PerPixel,
            template_channels: vec![Some(SmolStr::new("Red $pixelKey"))],
        })],
    );

    let resolved = resolve_mode(&fixture, &mode).unwrap();
    // One group defined, so one instantiated channel bound to its key.
    assert_eq!(keys(&resolved), vec!["Red odd-columns"]);
}

#[test]
fn test_matrix_channels_know_their_pixel() {
    let fixture = pixel_bar();
    let mode = Mode::new(
        "Positions",
        vec![rgb_insert(RepeatFor::EachPixel, ChannelOrder::PerPixel)],
    );

    let resolved = resolve_mode(&fixture, &mode).unwrap();
    let matrix = fixture.matrix.as_ref().unwrap();

    let Channel::Matrix(first) = &resolved[0] else {
        panic!("expected a matrix-bound channel");
    };
    assert_eq!(first.pixel_key, "(1, 1, 1)");
    assert_eq!(first.position(matrix), Some((1, 1, 1)));
}

#[test]
fn test_none_template_slot_leaves_null() {
    let fixture = pixel_bar();
    let mode = Mode::new(
        "Sparse",
        vec![ModeChannelEntry::Insert(MatrixInsert {
            repeat_for: RepeatFor::Keys(vec![SmolStr::new("(1, 1, 1)")]),
            channel_order: ChannelOrder::PerPixel,
            template_channels: vec![Some(SmolStr::new("Red $pixelKey")), None],
        })],
    );

    let resolved = resolve_mode(&fixture, &mode).unwrap();
    assert_eq!(resolved.len(), 2);
    assert!(matches!(resolved[1], Channel::Null));
}

#[test]
fn test_resolution_does_not_mutate_fixture() {
    let fixture = pixel_bar();
    let before = fixture.clone();

    let mode = Mode::new(
        "Full",
        vec![rgb_insert(RepeatFor::EachPixel, ChannelOrder::PerPixel)],
    );
    resolve_mode(&fixture, &mode).unwrap();
    resolve_mode(&fixture, &mode).unwrap();

    assert_eq!(fixture, before);
}
