//! # fixlib-base
//!
//! Core library for canonical DMX fixture modeling and lighting-format
//! conversion.
//!
//! A fixture definition is modeled once, in a resolution-independent
//! canonical form, and converted to/from third-party lighting-control
//! file formats through format adapters.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! formats   → format adapters (GDTF import, QLC+ import/export)
//!   ↓
//! resolve   → mode channel-list resolution (matrix/template expansion)
//!   ↓
//! model     → canonical fixture model (capability, channel, matrix, mode)
//!   ↓
//! base      → primitives (DmxRange, multi-resolution value scaling)
//! ```
//!
//! Adapters depend only on `model`, `resolve` and `base`, never on each
//! other.

// ============================================================================
// MODULES (dependency order: base → model → resolve → formats)
// ============================================================================

/// Primitives: DMX ranges, multi-resolution value/range scaling
pub mod base;

/// Canonical fixture model: capabilities, channels, matrix, modes
pub mod model;

/// Mode resolution: flattening declared channel lists
pub mod resolve;

/// Format adapters: GDTF, QLC+
pub mod formats;

// Re-export foundation types
pub use base::{DmxRange, Resolution, ScaleError, scale_range_individually, scale_value};
pub use model::{Capability, CapabilityKind, Channel, Fixture, Manufacturer, Matrix, Mode};
pub use resolve::{ResolutionError, resolve_mode};
