//! Canonical fixture model.
//!
//! The resolution-independent representation every format adapter reads
//! and writes:
//!
//! ```text
//! Fixture
//! ├── available_channels: IndexMap<key, Arc<CoarseChannel>>
//! │     └── Capabilities (One inline | Many tiling the DMX space)
//! ├── template_channels: per-pixel channel blueprints ($pixelKey)
//! ├── matrix: pixel keys, pixel groups, layout
//! └── modes: declared channel lists (keys, nulls, matrix inserts)
//! ```
//!
//! Everything here is created once during import/build and immutable
//! afterwards; derived values (fineness, trigger ranges, default
//! targets) are computed, never cached by mutation.

mod capability;
mod channel;
mod entity;
mod error;
mod fixture;
mod matrix;
mod mode;
mod physical;
mod switching;

pub use capability::{
    Capabilities, Capability, CapabilityKind, Color, FogKind, ShutterEffect, max_value,
};
pub use channel::{Channel, CoarseChannel, MatrixChannel};
pub use entity::{EntityRange, EntityValue, Unit, steady};
pub(crate) use entity::format_number;
pub use error::ModelError;
pub use fixture::{
    Fixture, ImportPlugin, Manufacturer, Meta, PIXEL_KEY_PLACEHOLDER, slugify,
    substitute_pixel_key,
};
pub use matrix::{Axis, AxisConstraint, Matrix, MatrixLayout, PixelGroupSpec, PixelPosition};
pub use mode::{ChannelOrder, MatrixInsert, Mode, ModeChannelEntry, RepeatFor};
pub use physical::Physical;
pub use switching::SwitchingChannel;
