//! Multi-resolution DMX value scaling.
//!
//! A logical channel value is stored as `resolution` DMX bytes, coarsest
//! (most significant) first. Changing resolution is a byte-level operation:
//!
//! - increasing resolution appends copies of the finest byte, so the value
//!   keeps its relative position in the larger space (`0xAB` at 8 bit
//!   becomes `0xABAB` at 16 bit);
//! - decreasing resolution drops trailing bytes.
//!
//! Ranges are scaled asymmetrically (start floored, end ceiled) so that
//! adjacent ranges stay adjacent after any resolution change. See
//! [`scale_range_individually`].

use thiserror::Error;

use super::DmxRange;

/// Number of DMX bytes used to represent one logical channel value.
pub type Resolution = u8;

/// 8 bit, one DMX slot.
pub const RESOLUTION_8BIT: Resolution = 1;
/// 16 bit, coarse + fine.
pub const RESOLUTION_16BIT: Resolution = 2;
/// 24 bit, coarse + fine + ultra fine.
pub const RESOLUTION_24BIT: Resolution = 3;
/// 32 bit.
pub const RESOLUTION_32BIT: Resolution = 4;

/// Errors from resolution scaling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScaleError {
    /// The value does not fit into the stated number of DMX bytes.
    #[error("value {value} does not fit into {resolution} DMX byte(s)")]
    ResolutionOverflow { value: u64, resolution: Resolution },

    /// A resolution of zero bytes is meaningless.
    #[error("resolution must be at least 1 byte")]
    ZeroResolution,
}

/// Decompose `value` into `resolution` big-endian bytes, coarsest first.
///
/// Fails with [`ScaleError::ResolutionOverflow`] if a non-zero remainder
/// is left after `resolution` bytes have been extracted.
fn to_bytes(value: u64, resolution: Resolution) -> Result<Vec<u8>, ScaleError> {
    if resolution == 0 {
        return Err(ScaleError::ZeroResolution);
    }

    let mut bytes = vec![0u8; resolution as usize];
    let mut remainder = value;
    for byte in bytes.iter_mut().rev() {
        *byte = (remainder & 0xFF) as u8;
        remainder >>= 8;
    }

    if remainder != 0 {
        return Err(ScaleError::ResolutionOverflow { value, resolution });
    }

    Ok(bytes)
}

fn from_bytes(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// Scale a single DMX value from one resolution to another.
///
/// Upscaling duplicates the finest byte, downscaling drops trailing bytes,
/// so `scale_value(v, r, r) == v` and an up-then-down round trip recovers
/// the original value.
///
/// # Examples
///
/// ```
/// use fixlib::base::scale_value;
/// assert_eq!(scale_value(0xAB, 1, 2).unwrap(), 0xABAB);
/// assert_eq!(scale_value(0xABCD, 2, 1).unwrap(), 0xAB);
/// ```
pub fn scale_value(value: u64, from: Resolution, to: Resolution) -> Result<u64, ScaleError> {
    if to == 0 {
        return Err(ScaleError::ZeroResolution);
    }

    let mut bytes = to_bytes(value, from)?;

    if to > from {
        // Repeat the finest byte to fill the added resolution.
        let finest = *bytes.last().unwrap_or(&0);
        bytes.resize(to as usize, finest);
    } else {
        bytes.truncate(to as usize);
    }

    Ok(from_bytes(&bytes))
}

/// Scale a range's start and end values, possibly given at different
/// resolutions, to a common target resolution.
///
/// Start and end are treated asymmetrically so that ranges never drift
/// into their neighbors:
///
/// - when extending resolution, the start's new low bytes are padded with
///   `0x00` (floor) and the end's with `0xFF` (ceiling);
/// - when truncating resolution, the end is floored (low bytes dropped)
///   while the start is raised by one unit if any dropped byte was
///   non-zero, unless that would produce `start > end`.
///
/// The result never has `start > end` for valid inputs, and two ranges
/// that tile a channel keep tiling it at every resolution.
pub fn scale_range_individually(
    start: u64,
    start_res: Resolution,
    end: u64,
    end_res: Resolution,
    to: Resolution,
) -> Result<(u64, u64), ScaleError> {
    if to == 0 {
        return Err(ScaleError::ZeroResolution);
    }

    // End value: pad with 0xFF when extending, plain floor when truncating.
    let end_bytes = to_bytes(end, end_res)?;
    let scaled_end = if to > end_res {
        let mut bytes = end_bytes;
        bytes.resize(to as usize, 0xFF);
        from_bytes(&bytes)
    } else {
        from_bytes(&end_bytes[..to as usize])
    };

    // Start value: pad with 0x00 when extending; when truncating, round up
    // by one unit if the dropped bytes were non-zero.
    let start_bytes = to_bytes(start, start_res)?;
    let scaled_start = if to > start_res {
        let mut bytes = start_bytes;
        bytes.resize(to as usize, 0x00);
        from_bytes(&bytes)
    } else {
        let floored = from_bytes(&start_bytes[..to as usize]);
        let dropped_nonzero = start_bytes[to as usize..].iter().any(|&b| b != 0);
        if dropped_nonzero && floored + 1 <= scaled_end {
            floored + 1
        } else {
            floored
        }
    };

    Ok((scaled_start, scaled_end))
}

/// Scale a whole [`DmxRange`] from one resolution to another.
pub fn scale_range(
    range: DmxRange,
    from: Resolution,
    to: Resolution,
) -> Result<DmxRange, ScaleError> {
    let (start, end) = scale_range_individually(range.start, from, range.end, from, to)?;
    Ok(DmxRange { start, end })
}
