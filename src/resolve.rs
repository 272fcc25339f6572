//! Mode resolution: flattening a mode's declared channel list.
//!
//! A declared channel list mixes plain channel keys, nulls and matrix
//! insert blocks. Resolution expands every entry to a concrete
//! [`Channel`] in declared order:
//!
//! - plain keys look up coarse channels, fine aliases, switching aliases
//!   and matrix template instances;
//! - matrix inserts repeat template channels over pixels per their
//!   `channelOrder`;
//! - unknown keys fail with a [`ResolutionError`] naming the mode and
//!   key, never silently dropped.
//!
//! Lookups go through a [`ChannelRegistry`] built per call; the fixture
//! itself stays immutable.

use std::sync::Arc;

use smol_str::SmolStr;
use thiserror::Error;

use crate::model::{
    Channel, ChannelOrder, CoarseChannel, Fixture, MatrixChannel, Mode, ModeChannelEntry,
    ModelError, RepeatFor, SwitchingChannel, substitute_pixel_key,
};

/// Errors from resolving a mode's channel list.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    /// A mode references a channel key that exists nowhere.
    #[error("mode `{mode}` references unknown channel `{key}`")]
    UnknownChannel { mode: String, key: SmolStr },

    /// A matrix insert names a pixel key the matrix does not have.
    #[error("mode `{mode}` repeats over unknown pixel key `{key}`")]
    UnknownPixelKey { mode: String, key: SmolStr },

    /// A matrix insert names a template channel that is not defined.
    #[error("mode `{mode}` references unknown template channel `{key}`")]
    UnknownTemplateChannel { mode: String, key: SmolStr },

    /// A matrix insert is used but the fixture has no matrix.
    #[error("mode `{mode}` contains a matrix insert but the fixture has no matrix")]
    MissingMatrix { mode: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

// ============================================================================
// CHANNEL REGISTRY
// ============================================================================

/// Lookup table over every channel key a mode may reference.
///
/// Built once per resolution from the fixture's channel definitions:
/// coarse keys, fine aliases, switching aliases, and template instances
/// for every pixel and pixel-group key. The registry is a side table;
/// the parsed fixture is never mutated to cache lookups.
pub struct ChannelRegistry {
    channels: indexmap::IndexMap<SmolStr, Channel>,
}

impl ChannelRegistry {
    pub fn new(fixture: &Fixture) -> Self {
        let mut channels = indexmap::IndexMap::new();

        for coarse in fixture.available_channels.values() {
            register_coarse(&mut channels, coarse, None);
        }

        // Template instances for each pixel and pixel-group key.
        if let Some(matrix) = &fixture.matrix {
            let mut all_keys = matrix.pixel_keys();
            all_keys.extend(matrix.pixel_group_keys());

            for template in fixture.template_channels.values() {
                for pixel_key in &all_keys {
                    if let Some(instance) =
                        fixture.instantiate_template(&template.key, pixel_key)
                    {
                        let instance = Arc::new(instance);
                        register_coarse(
                            &mut channels,
                            &instance,
                            Some((pixel_key.clone(), template.key.clone())),
                        );
                    }
                }
            }
        }

        Self { channels }
    }

    /// The channel a concrete key stands for, if any.
    pub fn get(&self, key: &str) -> Option<&Channel> {
        self.channels.get(key)
    }
}

/// Register a coarse channel with its fine and switching aliases. When
/// `matrix_binding` is set, every registered channel is wrapped in a
/// [`MatrixChannel`] bound to that pixel key.
fn register_coarse(
    channels: &mut indexmap::IndexMap<SmolStr, Channel>,
    coarse: &Arc<CoarseChannel>,
    matrix_binding: Option<(SmolStr, SmolStr)>,
) {
    let wrap = |key: &SmolStr, channel: Channel| -> Channel {
        match &matrix_binding {
            Some((pixel_key, template_key)) => Channel::Matrix(MatrixChannel {
                key: key.clone(),
                pixel_key: pixel_key.clone(),
                template_key: template_key.clone(),
                inner: Box::new(channel),
            }),
            None => channel,
        }
    };

    channels.insert(
        coarse.key.clone(),
        wrap(&coarse.key, Channel::Coarse(Arc::clone(coarse))),
    );

    for (index, alias) in coarse.fine_channel_aliases.iter().enumerate() {
        channels.insert(
            alias.clone(),
            wrap(
                alias,
                Channel::Fine {
                    key: alias.clone(),
                    coarse: Arc::clone(coarse),
                    fineness: index as u8 + 1,
                },
            ),
        );
    }

    for switching in SwitchingChannel::from_trigger(coarse) {
        let key = switching.key.clone();
        channels.insert(key.clone(), wrap(&key, Channel::Switching(switching)));
    }
}

// ============================================================================
// MODE RESOLUTION
// ============================================================================

/// Flatten a mode's declared channel list into concrete channels.
///
/// The result preserves declared order exactly; matrix inserts expand in
/// place. An insert repeating over N keys with M template slots
/// contributes exactly N x M channels.
pub fn resolve_mode(fixture: &Fixture, mode: &Mode) -> Result<Vec<Channel>, ResolutionError> {
    let registry = ChannelRegistry::new(fixture);
    let mut resolved = Vec::with_capacity(mode.channels.len());

    for entry in &mode.channels {
        match entry {
            ModeChannelEntry::Null => resolved.push(Channel::Null),
            ModeChannelEntry::Key(key) => {
                let channel =
                    registry
                        .get(key)
                        .cloned()
                        .ok_or_else(|| ResolutionError::UnknownChannel {
                            mode: mode.name.clone(),
                            key: key.clone(),
                        })?;
                resolved.push(channel);
            }
            ModeChannelEntry::Insert(insert) => {
                expand_insert(fixture, mode, &registry, insert, &mut resolved)?;
            }
        }
    }

    Ok(resolved)
}

fn expand_insert(
    fixture: &Fixture,
    mode: &Mode,
    registry: &ChannelRegistry,
    insert: &crate::model::MatrixInsert,
    resolved: &mut Vec<Channel>,
) -> Result<(), ResolutionError> {
    let matrix = fixture
        .matrix
        .as_ref()
        .ok_or_else(|| ResolutionError::MissingMatrix {
            mode: mode.name.clone(),
        })?;

    let repeat_keys: Vec<SmolStr> = match &insert.repeat_for {
        RepeatFor::EachPixel => matrix.pixel_keys(),
        RepeatFor::EachPixelGroup => matrix.pixel_group_keys(),
        RepeatFor::PixelsAxisOrder(first, second, third) => {
            matrix.pixel_keys_by_order(*first, *second, *third)
        }
        RepeatFor::Keys(keys) => {
            for key in keys {
                if !matrix.has_key(key) {
                    return Err(ResolutionError::UnknownPixelKey {
                        mode: mode.name.clone(),
                        key: key.clone(),
                    });
                }
            }
            keys.clone()
        }
    };

    let mut emit = |pixel_key: &SmolStr,
                    template_key: &Option<SmolStr>|
     -> Result<(), ResolutionError> {
        let Some(template_key) = template_key else {
            resolved.push(Channel::Null);
            return Ok(());
        };

        let concrete_key = substitute_pixel_key(template_key, pixel_key);
        let channel = registry.get(&concrete_key).cloned().ok_or_else(|| {
            ResolutionError::UnknownTemplateChannel {
                mode: mode.name.clone(),
                key: template_key.clone(),
            }
        })?;
        resolved.push(channel);
        Ok(())
    };

    match insert.channel_order {
        ChannelOrder::PerPixel => {
            for pixel_key in &repeat_keys {
                for template_key in &insert.template_channels {
                    emit(pixel_key, template_key)?;
                }
            }
        }
        ChannelOrder::PerChannel => {
            for template_key in &insert.template_channels {
                for pixel_key in &repeat_keys {
                    emit(pixel_key, template_key)?;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Capabilities, Capability, CapabilityKind, Color, Matrix, MatrixInsert, Mode,
        ModeChannelEntry,
    };

    fn color_template(color: Color, name: &str) -> CoarseChannel {
        CoarseChannel::new(
            format!("{name} $pixelKey"),
            Capabilities::One(Capability::inline(CapabilityKind::ColorIntensity {
                color,
                brightness: None,
            })),
        )
    }

    fn matrix_fixture() -> Fixture {
        let mut fixture = Fixture::new("Pixel Bar");
        fixture.matrix = Some(Matrix::from_pixel_count(2, 1, 1));
        fixture.add_template_channel(color_template(Color::Red, "Red"));
        fixture.add_template_channel(color_template(Color::Green, "Green"));
        fixture
    }

    fn insert(order: ChannelOrder) -> ModeChannelEntry {
        ModeChannelEntry::Insert(MatrixInsert {
            repeat_for: RepeatFor::EachPixel,
            channel_order: order,
            template_channels: vec![
                Some(SmolStr::new("Red $pixelKey")),
                Some(SmolStr::new("Green $pixelKey")),
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
    fn test_per_pixel_order() {
        let fixture = matrix_fixture();
        let mode = Mode::new("Matrix", vec![insert(ChannelOrder::PerPixel)]);
        let resolved = resolve_mode(&fixture, &mode).unwrap();
        assert_eq!(keys(&resolved), vec!["Red 1", "Green 1", "Red 2", "Green 2"]);
    }

    #[test]
    fn test_per_channel_order() {
        let fixture = matrix_fixture();
        let mode = Mode::new("Matrix", vec![insert(ChannelOrder::PerChannel)]);
        let resolved = resolve_mode(&fixture, &mode).unwrap();
        assert_eq!(keys(&resolved), vec!["Red 1", "Red 2", "Green 1", "Green 2"]);
    }

    #[test]
    fn test_insert_contributes_n_times_m() {
        let fixture = matrix_fixture();
        let mode = Mode::new("Matrix", vec![insert(ChannelOrder::PerPixel)]);
        let resolved = resolve_mode(&fixture, &mode).unwrap();
        // 2 pixels x 2 template channels
        assert_eq!(resolved.len(), 4);
    }

    #[test]
    fn test_plain_keys_pass_through_in_order() {
        let mut fixture = matrix_fixture();
        fixture.add_available_channel(CoarseChannel::new(
            "Dimmer",
            Capabilities::One(Capability::inline(CapabilityKind::Intensity {
                brightness: None,
            })),
        ));

        let mode = Mode::new(
            "Full",
            vec![
                ModeChannelEntry::key("Dimmer"),
                ModeChannelEntry::Null,
                insert(ChannelOrder::PerPixel),
            ],
        );
        let resolved = resolve_mode(&fixture, &mode).unwrap();
        assert_eq!(resolved.len(), 6);
        assert_eq!(resolved[0].key().unwrap(), "Dimmer");
        assert!(matches!(resolved[1], Channel::Null));
    }

    #[test]
    fn test_unknown_channel_names_mode_and_key() {
        let fixture = matrix_fixture();
        let mode = Mode::new("Broken", vec![ModeChannelEntry::key("Nonexistent")]);
        let error = resolve_mode(&fixture, &mode).unwrap_err();
        assert_eq!(
            error,
            ResolutionError::UnknownChannel {
                mode: "Broken".into(),
                key: SmolStr::new("Nonexistent"),
            }
        );
    }

    #[test]
    fn test_unknown_pixel_key_fails() {
        let fixture = matrix_fixture();
        let mode = Mode::new(
            "Broken",
            vec![ModeChannelEntry::Insert(MatrixInsert {
                repeat_for: RepeatFor::Keys(vec![SmolStr::new("99")]),
                channel_order: ChannelOrder::PerPixel,
                template_channels: vec![Some(SmolStr::new("Red $pixelKey"))],
            })],
        );
        assert!(matches!(
            resolve_mode(&fixture, &mode),
            Err(ResolutionError::UnknownPixelKey { .. })
        ));
    }

    #[test]
    fn test_fine_alias_resolves() {
        let mut fixture = Fixture::new("Fine");
        let mut dimmer = CoarseChannel::new(
            "Dimmer",
            Capabilities::One(Capability::inline(CapabilityKind::Intensity {
                brightness: None,
            })),
        );
        dimmer.fine_channel_aliases = vec![SmolStr::new("Dimmer fine")];
        fixture.add_available_channel(dimmer);

        let mode = Mode::new(
            "16bit",
            vec![
                ModeChannelEntry::key("Dimmer"),
                ModeChannelEntry::key("Dimmer fine"),
            ],
        );
        let resolved = resolve_mode(&fixture, &mode).unwrap();
        match &resolved[1] {
            Channel::Fine { fineness, coarse, .. } => {
                assert_eq!(*fineness, 1);
                assert_eq!(coarse.key, "Dimmer");
            }
            other => panic!("expected fine channel, got {other:?}"),
        }
    }

    #[test]
    fn test_switching_alias_resolves() {
        let mut fixture = Fixture::new("Switching");
        let mut trigger_cap_a = Capability::new(
            crate::base::DmxRange::new(0, 127).unwrap(),
            CapabilityKind::NoFunction,
        );
        trigger_cap_a
            .switch_channels
            .insert(SmolStr::new("Speed"), SmolStr::new("Speed slow"));
        let mut trigger_cap_b = Capability::new(
            crate::base::DmxRange::new(128, 255).unwrap(),
            CapabilityKind::Generic,
        );
        trigger_cap_b
            .switch_channels
            .insert(SmolStr::new("Speed"), SmolStr::new("Speed fast"));

        fixture.add_available_channel(CoarseChannel::new(
            "Program",
            Capabilities::Many(vec![trigger_cap_a, trigger_cap_b]),
        ));

        let mode = Mode::new(
            "Default",
            vec![
                ModeChannelEntry::key("Program"),
                ModeChannelEntry::key("Speed"),
            ],
        );
        let resolved = resolve_mode(&fixture, &mode).unwrap();
        match &resolved[1] {
            Channel::Switching(switching) => assert_eq!(switching.key, "Speed"),
            other => panic!("expected switching channel, got {other:?}"),
        }
    }
}
