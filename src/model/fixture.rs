//! Fixtures and manufacturers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::sync::Arc;

use super::channel::CoarseChannel;
use super::error::ModelError;
use super::matrix::Matrix;
use super::mode::Mode;
use super::physical::Physical;

/// Placeholder replaced by the concrete pixel/group key when a template
/// channel is instantiated.
pub const PIXEL_KEY_PLACEHOLDER: &str = "$pixelKey";

/// A fixture manufacturer, from the caller-supplied lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manufacturer {
    pub key: SmolStr,
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl Manufacturer {
    pub fn new(key: impl Into<SmolStr>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            comment: None,
            website: None,
        }
    }
}

/// Provenance of an imported fixture definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPlugin {
    pub plugin: String,
    pub date: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Authorship and dates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub authors: Vec<String>,
    pub create_date: String,
    pub last_modify_date: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_plugin: Option<ImportPlugin>,
}

/// A complete canonical fixture definition.
///
/// Built once during import (or by hand), immutable afterwards. Channel
/// structures are shared via `Arc` so fine and switching channels can
/// reference their coarse channel without ownership cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub name: String,
    pub short_name: Option<String>,
    pub categories: Vec<String>,
    pub meta: Meta,
    pub physical: Option<Physical>,
    pub matrix: Option<Matrix>,

    /// Channel key → definition, in declaration order.
    pub available_channels: IndexMap<SmolStr, Arc<CoarseChannel>>,

    /// Template channel key (containing `$pixelKey`) → definition.
    pub template_channels: IndexMap<SmolStr, Arc<CoarseChannel>>,

    pub modes: Vec<Mode>,
}

impl Fixture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short_name: None,
            categories: Vec::new(),
            meta: Meta::default(),
            physical: None,
            matrix: None,
            available_channels: IndexMap::new(),
            template_channels: IndexMap::new(),
            modes: Vec::new(),
        }
    }

    /// Display short name: explicit, or the full name.
    pub fn short_name(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }

    /// URL-safe key derived from the name, used in exported file names.
    pub fn key(&self) -> String {
        slugify(&self.name)
    }

    pub fn add_available_channel(&mut self, channel: CoarseChannel) {
        self.available_channels
            .insert(channel.key.clone(), Arc::new(channel));
    }

    pub fn add_template_channel(&mut self, channel: CoarseChannel) {
        self.template_channels
            .insert(channel.key.clone(), Arc::new(channel));
    }

    /// Instantiate a template channel for a concrete pixel/group key.
    pub fn instantiate_template(
        &self,
        template_key: &str,
        pixel_key: &str,
    ) -> Option<CoarseChannel> {
        let template = self.template_channels.get(template_key)?;
        let mut channel = (**template).clone();
        channel.key = substitute_pixel_key(&template.key, pixel_key);
        if let Some(name) = &template.name {
            channel.name = Some(name.replace(PIXEL_KEY_PLACEHOLDER, pixel_key));
        }
        channel.fine_channel_aliases = template
            .fine_channel_aliases
            .iter()
            .map(|alias| substitute_pixel_key(alias, pixel_key))
            .collect();
        Some(channel)
    }

    /// Validate every channel's capability tiling.
    pub fn validate(&self) -> Result<(), ModelError> {
        for channel in self.available_channels.values() {
            channel.validate()?;
        }
        for channel in self.template_channels.values() {
            channel.validate()?;
        }
        Ok(())
    }
}

/// Substitute the pixel-key placeholder in a template channel key.
pub fn substitute_pixel_key(template_key: &str, pixel_key: &str) -> SmolStr {
    SmolStr::new(template_key.replace(PIXEL_KEY_PLACEHOLDER, pixel_key))
}

/// Lowercase, hyphen-separated key from a display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
