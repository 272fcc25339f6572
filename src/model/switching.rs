//! Switching channels: virtual channels routed by a trigger channel.
//!
//! A trigger channel's capabilities may carry `switch_channels` entries
//! mapping a switching-channel alias to a target channel key. While the
//! trigger's DMX value is inside a capability's range, the alias stands
//! for that capability's target.

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::{DmxRange, merge_adjacent};

use super::channel::CoarseChannel;
use super::error::ModelError;

/// A switching channel derived from a trigger channel's capabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchingChannel {
    /// The alias this channel is addressed by.
    pub key: SmolStr,
    /// The trigger channel whose value selects the target.
    pub trigger: Arc<CoarseChannel>,
}

impl SwitchingChannel {
    /// Derive the switching channels a trigger channel defines, in the
    /// order their aliases first appear in its capabilities.
    pub fn from_trigger(trigger: &Arc<CoarseChannel>) -> Vec<SwitchingChannel> {
        let mut keys: Vec<SmolStr> = Vec::new();
        for capability in trigger.capabilities.all() {
            for alias in capability.switch_channels.keys() {
                if !keys.contains(alias) {
                    keys.push(alias.clone());
                }
            }
        }
        keys.into_iter()
            .map(|key| SwitchingChannel {
                key,
                trigger: Arc::clone(trigger),
            })
            .collect()
    }

    /// All target channel keys this alias can switch to, in capability
    /// order, deduplicated.
    pub fn target_keys(&self) -> Vec<SmolStr> {
        let mut targets: Vec<SmolStr> = Vec::new();
        for capability in self.trigger.capabilities.all() {
            if let Some(target) = capability.switch_channels.get(&self.key) {
                if !targets.contains(target) {
                    targets.push(target.clone());
                }
            }
        }
        targets
    }

    /// Target key → merged trigger ranges selecting it.
    ///
    /// The ranges per target are disjoint and their union is exactly the
    /// ranges of the trigger capabilities mapping this alias to that
    /// target. Adjacent ranges are merged.
    pub fn trigger_ranges(&self) -> IndexMap<SmolStr, Vec<DmxRange>> {
        let resolution = self.trigger.dmx_value_resolution;
        let mut raw: IndexMap<SmolStr, Vec<DmxRange>> = IndexMap::new();

        for capability in self.trigger.capabilities.all() {
            if let Some(target) = capability.switch_channels.get(&self.key) {
                raw.entry(target.clone())
                    .or_default()
                    .push(capability.range_at(resolution));
            }
        }

        raw.into_iter()
            .map(|(target, ranges)| (target, merge_adjacent(&ranges)))
            .collect()
    }

    /// The target selected by the trigger's default value.
    ///
    /// A trigger capability that contains the default value but defines
    /// no target for this alias is an inconsistent fixture definition and
    /// a hard error, never silently skipped.
    pub fn default_channel_key(&self) -> Result<SmolStr, ModelError> {
        self.target_for_value(self.trigger.default_value)
    }

    /// The target selected by a concrete trigger value.
    pub fn target_for_value(&self, value: u64) -> Result<SmolStr, ModelError> {
        let capability = self
            .trigger
            .capabilities
            .by_value(value, self.trigger.dmx_value_resolution)
            .ok_or_else(|| ModelError::NoCapabilityForValue {
                channel: self.trigger.key.clone(),
                value,
            })?;

        capability
            .switch_channels
            .get(&self.key)
            .cloned()
            .ok_or_else(|| ModelError::SwitchTargetUndefined {
                channel: self.key.clone(),
                trigger: self.trigger.key.clone(),
            })
    }
}
