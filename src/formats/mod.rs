//! Format adapters for third-party fixture-library formats.
//!
//! Every adapter implements the same [`FixtureFormat`] contract against
//! the canonical model:
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐
//! │  GDTF file   │     │  QLC+ file   │
//! └──────┬───────┘     └──────┬───────┘
//!        │                    │
//!        ▼                    ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                   FixtureFormat trait                    │
//! │  - import(&[u8], source, author) -> ImportResult         │
//! │  - export(&[(Manufacturer, Fixture)], opts) -> files     │
//! └──────────────────────────┬───────────────────────────────┘
//!                            ▼
//!            canonical Fixture / Channel / Matrix / Mode
//! ```
//!
//! Adapters never talk to each other; shared behavior lives in the
//! canonical model and the scaling utilities.

mod error;
mod export;
mod format;
pub mod gdtf;
pub mod qlcplus;
mod xml;

pub use error::FormatError;
pub use export::export_each;
pub use format::{
    ExportFailure, ExportOptions, ExportResult, ExportedFile, FixtureFormat, FormatCapability,
    ImportResult,
};
pub use gdtf::Gdtf;
pub use qlcplus::QlcPlus;

/// All built-in format adapters.
pub fn formats() -> Vec<Box<dyn FixtureFormat>> {
    vec![Box::new(Gdtf), Box::new(QlcPlus)]
}

/// Detect a format from a file extension.
pub fn detect_format(path: &std::path::Path) -> Option<Box<dyn FixtureFormat>> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    formats()
        .into_iter()
        .find(|format| format.extensions().contains(&ext.as_str()))
}
