//! QLC+ (Q Light Controller Plus) fixture definitions.
//!
//! `.qxf` files are plain XML with channel definitions, capability lists
//! tagged by preset names, and modes referencing channels by display
//! name. The adapter is bidirectional; capability semantics travel
//! through the preset table in [`presets`] and, for untagged
//! capabilities, the label miners in [`heuristics`].

mod export;
mod heuristics;
mod import;
mod presets;

use crate::model::{Fixture, Manufacturer};

use super::format::{
    ExportOptions, ExportResult, FixtureFormat, FormatCapability, ImportResult,
};
use super::{FormatError, export_each};

use import::QlcPlusImporter;

/// The QLC+ format handler.
pub struct QlcPlus;

impl FixtureFormat for QlcPlus {
    fn name(&self) -> &'static str {
        "QLC+"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["qxf"]
    }

    fn mime_type(&self) -> &'static str {
        export::MIME_TYPE
    }

    fn capabilities(&self) -> FormatCapability {
        FormatCapability::FULL
    }

    fn import(
        &self,
        input: &[u8],
        source_name: &str,
        author_name: &str,
    ) -> Result<ImportResult, FormatError> {
        QlcPlusImporter::new(source_name, author_name).read_definition(input)
    }

    fn export(
        &self,
        fixtures: &[(Manufacturer, Fixture)],
        options: &ExportOptions,
    ) -> Result<ExportResult, FormatError> {
        Ok(export_each(fixtures, |manufacturer, fixture| {
            export::export_fixture(manufacturer, fixture, options).map(|file| vec![file])
        }))
    }

    fn validate(&self, input: &[u8]) -> Result<(), FormatError> {
        let first = input.iter().find(|byte| !byte.is_ascii_whitespace());
        if first != Some(&b'<') {
            return Err(FormatError::parse("not an XML document"));
        }
        Ok(())
    }
}
