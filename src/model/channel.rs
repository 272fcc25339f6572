//! Channel variants built on capabilities.
//!
//! The canonical model knows five channel kinds, as a closed enum:
//!
//! - `Coarse` - a regular channel owning its capabilities
//! - `Fine` - an extra byte of an existing coarse channel
//! - `Switching` - a virtual channel routed by a trigger channel's value
//! - `Null` - an unused DMX slot
//! - `Matrix` - any of the above bound to a concrete pixel or pixel group
//!
//! Channels are created once per fixture definition and are immutable
//! afterwards; resolution scaling produces new values, never mutates.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::base::{Resolution, scale_value};

use super::capability::Capabilities;
use super::error::ModelError;
use super::switching::SwitchingChannel;

// ============================================================================
// COARSE CHANNEL
// ============================================================================

/// A regular DMX channel with capabilities and optional fine aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoarseChannel {
    pub key: SmolStr,

    /// Display name; defaults to the key when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Keys of this channel's fine channels, least fine first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fine_channel_aliases: Vec<SmolStr>,

    /// Resolution the capability ranges and default value are given at.
    /// Usually equals [`Self::max_resolution`].
    pub dmx_value_resolution: Resolution,

    /// Default DMX value at `dmx_value_resolution`.
    pub default_value: u64,

    /// Value to output while the channel is highlighted in an editor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_value: Option<u64>,

    /// Whether the channel must stay at its default value in every mode.
    #[serde(default)]
    pub constant: bool,

    pub capabilities: Capabilities,
}

impl CoarseChannel {
    pub fn new(key: impl Into<SmolStr>, capabilities: Capabilities) -> Self {
        Self {
            key: key.into(),
            name: None,
            fine_channel_aliases: Vec::new(),
            dmx_value_resolution: 1,
            default_value: 0,
            highlight_value: None,
            constant: false,
            capabilities,
        }
    }

    /// Display name: explicit name, or the key.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }

    /// Highest resolution this channel can be used at: one byte plus one
    /// per fine alias.
    pub fn max_resolution(&self) -> Resolution {
        1 + self.fine_channel_aliases.len() as Resolution
    }

    /// Resolution the channel is actually used at in a mode: one byte for
    /// the coarse channel plus one per fine alias present in the mode's
    /// channel list. Returns 1 if no fine channels are in use.
    pub fn fineness_in_mode<'a>(
        &self,
        mode_channel_keys: impl IntoIterator<Item = &'a SmolStr>,
    ) -> Resolution {
        let mut present = 0usize;
        let keys: Vec<&SmolStr> = mode_channel_keys.into_iter().collect();
        for alias in &self.fine_channel_aliases {
            if keys.contains(&alias) {
                present += 1;
            } else {
                // Fine aliases only count up to the first missing one;
                // a 24-bit channel used without its second byte is 8 bit.
                break;
            }
        }
        1 + present as Resolution
    }

    /// The default value rescaled to `resolution`.
    pub fn default_value_at(&self, resolution: Resolution) -> Result<u64, ModelError> {
        Ok(scale_value(
            self.default_value,
            self.dmx_value_resolution,
            resolution,
        )?)
    }

    /// Validate the capability tiling against this channel's resolution.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.capabilities
            .validate(&self.key, self.dmx_value_resolution)
    }
}

// ============================================================================
// CHANNEL
// ============================================================================

/// A channel bound to a concrete pixel or pixel-group key.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixChannel {
    /// Concrete key, template key with `$pixelKey` substituted.
    pub key: SmolStr,
    /// Pixel key or pixel-group key this instance is bound to.
    pub pixel_key: SmolStr,
    /// The template channel key this instance was expanded from.
    pub template_key: SmolStr,
    /// The instantiated channel.
    pub inner: Box<Channel>,
}

impl MatrixChannel {
    /// XYZ position of the bound pixel. `None` for pixel-group keys.
    pub fn position(&self, matrix: &super::matrix::Matrix) -> Option<super::matrix::PixelPosition> {
        matrix.pixel_key_positions().get(&self.pixel_key).copied()
    }
}

/// Any channel a resolved mode channel list can contain.
#[derive(Debug, Clone, PartialEq)]
pub enum Channel {
    Coarse(Arc<CoarseChannel>),
    Fine {
        key: SmolStr,
        /// Back-reference to the coarse channel, shared, not owned.
        coarse: Arc<CoarseChannel>,
        /// 1 for the first fine byte, 2 for the second, ...
        fineness: Resolution,
    },
    Switching(SwitchingChannel),
    /// An unused DMX slot.
    Null,
    Matrix(MatrixChannel),
}

impl Channel {
    /// The key this channel is addressed by in a mode's channel list.
    /// `None` for null channels.
    pub fn key(&self) -> Option<&SmolStr> {
        match self {
            Channel::Coarse(coarse) => Some(&coarse.key),
            Channel::Fine { key, .. } => Some(key),
            Channel::Switching(switching) => Some(&switching.key),
            Channel::Null => None,
            Channel::Matrix(matrix) => Some(&matrix.key),
        }
    }

    /// The coarse channel backing this channel, if any.
    pub fn coarse(&self) -> Option<&Arc<CoarseChannel>> {
        match self {
            Channel::Coarse(coarse) => Some(coarse),
            Channel::Fine { coarse, .. } => Some(coarse),
            Channel::Switching(_) | Channel::Null => None,
            Channel::Matrix(matrix) => matrix.inner.coarse(),
        }
    }
}
