//! Error types for the canonical fixture model.

use smol_str::SmolStr;
use thiserror::Error;

use crate::base::DmxRange;

/// Errors raised while building or deriving from the canonical model.
///
/// These all indicate an inconsistent fixture definition, fatal for the
/// fixture being processed but never for a whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A capability in a multi-capability channel has no DMX range.
    #[error("channel `{channel}`: capability #{index} has no DMX range")]
    MissingCapabilityRange { channel: SmolStr, index: usize },

    /// Capability ranges leave a gap in the channel's DMX space.
    #[error("channel `{channel}`: gap before DMX value {expected_start}, found {found}")]
    CapabilityGap {
        channel: SmolStr,
        expected_start: u64,
        found: DmxRange,
    },

    /// Capability ranges overlap or are out of order.
    #[error("channel `{channel}`: capability range {found} overlaps or precedes value {expected_start}")]
    CapabilityOverlap {
        channel: SmolStr,
        expected_start: u64,
        found: DmxRange,
    },

    /// Capability ranges stop short of the channel's last DMX value.
    #[error("channel `{channel}`: capabilities end at {found}, expected {expected_end}")]
    CapabilityShort {
        channel: SmolStr,
        found: u64,
        expected_end: u64,
    },

    /// No capability of the trigger channel contains the given value.
    #[error("channel `{channel}`: no capability contains DMX value {value}")]
    NoCapabilityForValue { channel: SmolStr, value: u64 },

    /// A switching channel's trigger capability maps to no target for it.
    #[error("switching channel `{channel}`: trigger `{trigger}` defines no target at its default value")]
    SwitchTargetUndefined { channel: SmolStr, trigger: SmolStr },

    /// A matrix channel references a pixel key the matrix does not have.
    #[error("pixel key `{pixel_key}` does not exist in the fixture's matrix")]
    UnknownPixelKey { pixel_key: SmolStr },

    /// An invalid pixel-group constraint string.
    #[error("invalid pixel group constraint `{constraint}`: {message}")]
    InvalidConstraint { constraint: String, message: String },

    /// Scaling failure while deriving channel values.
    #[error(transparent)]
    Scale(#[from] crate::base::ScaleError),
}
