// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Run-scoped state shared across devices.

use crate::config::GeneratorConfig;
use crate::lang::TargetLanguage;
use crate::model::{Device, DocLanguage, Version};
use std::collections::{BTreeMap, BTreeSet};

/// State threaded through one generation run.
///
/// Holds the only cross-device data: which emitted files belong to released
/// devices, and which devices keep legacy callback names.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub doc_language: DocLanguage,
    pub namespace: String,
    pub bindings_version: Version,
    legacy_callback_devices: BTreeSet<String>,
    released: BTreeMap<TargetLanguage, Vec<String>>,
}

impl RunContext {
    pub fn new(doc_language: DocLanguage, namespace: impl Into<String>, bindings_version: Version) -> Self {
        Self {
            doc_language,
            namespace: namespace.into(),
            bindings_version,
            legacy_callback_devices: BTreeSet::new(),
            released: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> crate::Result<Self> {
        let mut context = Self::new(
            config.generator.doc_language,
            config.generator.namespace.clone(),
            config.bindings_version()?,
        );
        context.legacy_callback_devices = config.generator.legacy_callback_devices.clone();
        Ok(context)
    }

    #[must_use]
    pub fn with_legacy_callbacks<I, S>(mut self, devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.legacy_callback_devices
            .extend(devices.into_iter().map(Into::into));
        self
    }

    /// Whether `device` also gets callback events without the `Callback` suffix.
    pub fn has_legacy_callbacks(&self, device: &Device) -> bool {
        self.legacy_callback_devices.contains(&device.class_name())
    }

    /// Record an emitted file of a released device.
    pub fn record_released(&mut self, language: TargetLanguage, file_name: impl Into<String>) {
        let files = self.released.entry(language).or_default();
        let file_name = file_name.into();
        if !files.contains(&file_name) {
            files.push(file_name);
        }
    }

    pub fn released_files(&self, language: TargetLanguage) -> &[String] {
        self.released
            .get(&language)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(DocLanguage::En, "Tinkerforge", Version::new(2, 1, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_released_files_are_per_language() {
        let mut context = RunContext::default();
        context.record_released(TargetLanguage::CSharp, "BrickletEVSE.cs");
        context.record_released(TargetLanguage::CSharp, "BrickletEVSE.cs");
        assert_eq!(context.released_files(TargetLanguage::CSharp), ["BrickletEVSE.cs"]);
        assert!(context.released_files(TargetLanguage::Java).is_empty());
    }

    #[test]
    fn test_from_config_copies_legacy_list() {
        let config = GeneratorConfig::from_toml(
            "[generator]\nlegacy_callback_devices = [\"BrickletEVSE\"]\n",
            ".",
        )
        .unwrap();
        let context = RunContext::from_config(&config).unwrap();
        assert!(context.legacy_callback_devices.contains("BrickletEVSE"));
    }
}
