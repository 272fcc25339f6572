//! Common trait for fixture format adapters.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::model::{Fixture, Manufacturer};

use super::FormatError;

/// Capabilities supported by a format adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatCapability {
    /// Can read/import fixture definitions.
    pub read: bool,
    /// Can write/export fixture definitions.
    pub write: bool,
}

impl FormatCapability {
    /// Full capability (import and export).
    pub const FULL: Self = Self {
        read: true,
        write: true,
    };

    /// Import-only capability.
    pub const READ_ONLY: Self = Self {
        read: true,
        write: false,
    };

    /// Export-only capability.
    pub const WRITE_ONLY: Self = Self {
        read: false,
        write: true,
    };
}

/// Result of importing one foreign file.
#[derive(Debug, Default)]
pub struct ImportResult {
    pub fixtures: Vec<Fixture>,
    /// Manufacturer key → manufacturer, for fixtures that carry one.
    pub manufacturers: IndexMap<SmolStr, Manufacturer>,
    /// Non-fatal findings, as plain strings for the caller to display.
    pub warnings: Vec<String>,
}

/// Options applied to a whole export batch.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Directory prefix for generated file names, when the format nests
    /// its files.
    pub base_directory: Option<String>,
    /// ISO date embedded in exported files.
    pub date: String,
    /// Version string shown inside exported files.
    pub displayed_version: String,
}

/// One file produced by an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub name: String,
    pub content: Vec<u8>,
    pub mime_type: &'static str,
    /// Keys of the fixtures this file was generated from.
    pub related_fixtures: Vec<String>,
}

/// A per-fixture export failure. Always names the fixture, and the mode
/// when the failure happened while processing one.
#[derive(Debug)]
pub struct ExportFailure {
    pub fixture: String,
    pub mode: Option<String>,
    pub source: FormatError,
}

impl std::fmt::Display for ExportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.mode {
            Some(mode) => write!(
                f,
                "fixture `{}`, mode `{mode}`: {}",
                self.fixture, self.source
            ),
            None => write!(f, "fixture `{}`: {}", self.fixture, self.source),
        }
    }
}

/// Result of exporting a fixture batch: the files that succeeded plus the
/// failures of the fixtures that did not. A single fixture's failure
/// never aborts the batch.
#[derive(Debug, Default)]
pub struct ExportResult {
    pub files: Vec<ExportedFile>,
    pub failures: Vec<ExportFailure>,
}

/// Trait for fixture format adapters.
///
/// Implementations translate between the canonical fixture model and one
/// foreign fixture-library format. Adapters depend only on the canonical
/// model and the scaling utilities, never on each other.
pub trait FixtureFormat: Send + Sync {
    /// Human-readable name of the format.
    fn name(&self) -> &'static str;

    /// File extension(s) for this format.
    fn extensions(&self) -> &'static [&'static str];

    /// MIME type of exported files.
    fn mime_type(&self) -> &'static str;

    /// Capabilities of this format implementation.
    fn capabilities(&self) -> FormatCapability;

    /// Import fixtures from raw file bytes.
    ///
    /// # Arguments
    /// * `input` - raw bytes of the foreign file
    /// * `source_name` - file name of the source, for provenance
    /// * `author_name` - author to record in the fixtures' metadata
    fn import(
        &self,
        input: &[u8],
        source_name: &str,
        author_name: &str,
    ) -> Result<ImportResult, FormatError>;

    /// Export a batch of fixtures.
    ///
    /// Returns `Err` only when the format cannot export at all;
    /// per-fixture problems land in [`ExportResult::failures`].
    fn export(
        &self,
        fixtures: &[(Manufacturer, Fixture)],
        options: &ExportOptions,
    ) -> Result<ExportResult, FormatError>;

    /// Validate that the input is plausibly well-formed for this format.
    ///
    /// This is a quick check that doesn't fully parse the content.
    fn validate(&self, input: &[u8]) -> Result<(), FormatError> {
        let _ = input;
        Ok(())
    }
}
