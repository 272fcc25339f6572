//! Modes: ordered channel lists with optional physical overrides.
//!
//! A mode's declared channel list may contain plain channel keys, nulls
//! (unused slots) and matrix insert blocks that expand template channels
//! over pixels. Resolution (see [`crate::resolve`]) flattens the list in
//! declared order; nothing is ever reordered or deduplicated.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::matrix::Axis;
use super::physical::Physical;

/// Which pixels or pixel groups a matrix insert repeats over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RepeatFor {
    /// Every pixel key in the matrix's default order.
    EachPixel,
    /// Every pixel-group key in declaration order.
    EachPixelGroup,
    /// Every pixel key, ordered so the first axis varies fastest.
    PixelsAxisOrder(Axis, Axis, Axis),
    /// An explicit key list, used verbatim.
    Keys(Vec<SmolStr>),
}

/// Interleaving of template channels within a matrix insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChannelOrder {
    /// Pixel 1's template channels, then pixel 2's, ...
    PerPixel,
    /// Template channel 1 for every pixel, then template channel 2, ...
    PerChannel,
}

/// A matrix insert block in a mode's channel list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixInsert {
    pub repeat_for: RepeatFor,
    pub channel_order: ChannelOrder,
    /// Template channel keys; `None` leaves an unused slot per pixel.
    pub template_channels: Vec<Option<SmolStr>>,
}

/// One entry of a mode's declared channel list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModeChannelEntry {
    Insert(MatrixInsert),
    Key(SmolStr),
    Null,
}

impl ModeChannelEntry {
    pub fn key(key: impl Into<SmolStr>) -> Self {
        Self::Key(key.into())
    }
}

/// An operating mode of a fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mode {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,

    /// Override of the fixture-wide physical data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical: Option<Physical>,

    pub channels: Vec<ModeChannelEntry>,
}

impl Mode {
    pub fn new(name: impl Into<String>, channels: Vec<ModeChannelEntry>) -> Self {
        Self {
            name: name.into(),
            short_name: None,
            physical: None,
            channels,
        }
    }

    /// Display short name: explicit, or the full name.
    pub fn short_name(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }
}
