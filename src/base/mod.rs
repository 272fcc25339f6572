//! Foundation types for fixture modeling.
//!
//! This module provides the primitives every other module builds on:
//! - [`DmxRange`] - inclusive DMX value intervals with merge/adjacency algebra
//! - [`scale_value`], [`scale_range_individually`] - multi-resolution scaling
//! - [`Resolution`] - byte count of a logical channel value
//!
//! This module has NO dependencies on other fixlib modules.

mod range;
mod scale;

pub use range::{DmxRange, merge_adjacent};
pub use scale::{
    RESOLUTION_8BIT, RESOLUTION_16BIT, RESOLUTION_24BIT, RESOLUTION_32BIT, Resolution, ScaleError,
    scale_range, scale_range_individually, scale_value,
};
