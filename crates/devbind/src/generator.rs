// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binding generation run.
//!
//! Stages:
//! 1. load every description of the config directory
//! 2. render every (device, language) unit in memory
//! 3. write binding files
//! 4. write one `manifest.json` per language
//!
//! A name collision in stage 2 aborts the run before stage 3 touches the
//! disk. An unsupported type only drops its own (device, language) pair.

use crate::config::GeneratorConfig;
use crate::context::RunContext;
use crate::emit::{EmitError, SourceEmitter, SourceUnit};
use crate::error::{Error, Result};
use crate::lang::{binding_for, TargetLanguage};
use crate::model::{Device, ModelError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A (device, language) pair left out of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPair {
    pub device: String,
    pub reason: String,
}

/// Outcome of one language.
#[derive(Debug, Clone)]
pub struct LanguageReport {
    pub language: TargetLanguage,
    /// `<output_dir>/<language>`
    pub output_dir: PathBuf,
    /// Written binding files, relative to `bindings_dir()`.
    pub generated: Vec<String>,
    /// Subset of `generated` that belongs to released devices.
    pub released: Vec<String>,
    pub skipped: Vec<SkippedPair>,
}

impl LanguageReport {
    fn new(language: TargetLanguage, output_dir: PathBuf) -> Self {
        Self {
            language,
            output_dir,
            generated: Vec::new(),
            released: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn bindings_dir(&self) -> PathBuf {
        self.output_dir.join("bindings")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join("manifest.json")
    }
}

/// Generation report
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub devices: Vec<String>,
    pub languages: Vec<LanguageReport>,
}

impl GenerationReport {
    pub fn language(&self, language: TargetLanguage) -> Option<&LanguageReport> {
        self.languages.iter().find(|r| r.language == language)
    }

    pub fn summary(&self) {
        println!("\n{}", "=".repeat(60));
        println!("  Binding Generation Report");
        println!("{}", "=".repeat(60));
        println!();
        println!("  [OK] Devices:         {}", self.devices.len());
        for report in &self.languages {
            println!(
                "  [OK] {:<16} {} files ({} released, {} skipped)",
                format!("{}:", report.language),
                report.generated.len(),
                report.released.len(),
                report.skipped.len()
            );
            for skipped in &report.skipped {
                println!("       - skipped {}: {}", skipped.device, skipped.reason);
            }
        }
        println!();
        println!("  Generated in:");
        for report in &self.languages {
            println!("    - {}/", report.bindings_dir().display());
        }
        println!();
        println!("{}", "=".repeat(60));
    }
}

/// Generator state
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Load configuration and initialize generator
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Loading config from: {:?}", path);
        Ok(Self::new(GeneratorConfig::from_file(path)?))
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Load the descriptions of the config directory, in file name order.
    pub fn load_devices(&self) -> Result<Vec<Device>> {
        load_devices(&self.config.config_dir(), self.config.generator.include_unreleased)
    }

    /// Generate every configured language.
    pub fn generate(&self) -> Result<GenerationReport> {
        self.generate_languages(&self.config.generator.languages)
    }

    /// Generate the given languages.
    pub fn generate_languages(&self, languages: &[TargetLanguage]) -> Result<GenerationReport> {
        tracing::info!("Starting binding generation");

        // Stage 1: Load descriptions
        tracing::info!("Stage 1: Loading device descriptions");
        let devices = self.load_devices()?;
        tracing::info!("[OK] Loaded {} devices", devices.len());

        // Stage 2: Render in memory
        tracing::info!("Stage 2: Rendering source units");
        let mut run = RunContext::from_config(&self.config)?;
        let (units, mut reports) = self.render(&devices, languages, &mut run)?;

        // Stage 3: Write bindings
        tracing::info!("Stage 3: Writing bindings");
        for report in &mut reports {
            let dir = report.bindings_dir();
            fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
            for unit in units.iter().filter(|u| u.language == report.language) {
                let path = dir.join(&unit.file_name);
                fs::write(&path, &unit.contents).map_err(|e| Error::io(&path, e))?;
                tracing::debug!("wrote {:?}", path);
                report.generated.push(unit.file_name.clone());
            }
            report.released = run.released_files(report.language).to_vec();
            tracing::info!(
                "[OK] {}: wrote {} files",
                report.language,
                report.generated.len()
            );
        }

        // Stage 4: Manifests
        tracing::info!("Stage 4: Generating manifests");
        for report in &reports {
            self.write_manifest(report)?;
        }

        tracing::info!("[OK] Generation complete");
        Ok(GenerationReport {
            devices: devices.iter().map(Device::class_name).collect(),
            languages: reports,
        })
    }

    /// Render every (device, language) pair without touching the disk.
    ///
    /// Released files are recorded in `run`; unsupported pairs are reported
    /// as skipped. A name collision fails the whole call.
    pub fn render(
        &self,
        devices: &[Device],
        languages: &[TargetLanguage],
        run: &mut RunContext,
    ) -> Result<(Vec<SourceUnit>, Vec<LanguageReport>)> {
        let mut units = Vec::new();
        let mut reports = Vec::new();

        for &language in languages {
            let binding = binding_for(language);
            let emitter = SourceEmitter::with_config(binding.as_ref(), self.config.type_table(language));
            let mut report = LanguageReport::new(language, self.config.language_dir(language));

            for device in devices {
                match emitter.emit(device, run) {
                    Ok(unit) => {
                        if unit.released {
                            run.record_released(language, unit.file_name.clone());
                        }
                        units.push(unit);
                    }
                    Err(e @ EmitError::Unsupported { .. }) => {
                        let reason = e.to_string();
                        tracing::warn!("skipping {} for {}: {}", device.class_name(), language, reason);
                        report.skipped.push(SkippedPair {
                            device: device.class_name(),
                            reason,
                        });
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            reports.push(report);
        }

        Ok((units, reports))
    }

    fn write_manifest(&self, report: &LanguageReport) -> Result<()> {
        fs::create_dir_all(&report.output_dir).map_err(|e| Error::io(&report.output_dir, e))?;

        let manifest = serde_json::json!({
            "generator": "devbind",
            "generated_date": chrono::Local::now().to_rfc3339(),
            "language": report.language,
            "bindings_version": self.config.generator.bindings_version,
            "files": report.generated,
            "released": report.released,
            "skipped": report.skipped,
        });

        let path = report.manifest_path();
        fs::write(&path, serde_json::to_string_pretty(&manifest)?)
            .map_err(|e| Error::io(&path, e))?;

        tracing::info!("[OK] Generated {:?}", path);
        Ok(())
    }
}

/// Load every `*.yaml` / `*.yml` description of `dir`, sorted by file name.
///
/// Devices not marked released are dropped unless `include_unreleased`.
/// Two descriptions may not share a class name or a device identifier.
pub fn load_devices(dir: &Path, include_unreleased: bool) -> Result<Vec<Device>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml")
                )
        })
        .collect();
    paths.sort();

    let mut devices = Vec::new();
    let mut classes: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut identifiers: BTreeMap<u32, String> = BTreeMap::new();

    for path in paths {
        let device = Device::from_file(&path)?;
        let class = device.class_name();

        if let Some(previous) = classes.insert(class.clone(), path.clone()) {
            return Err(ModelError::Invalid {
                device: class,
                message: format!(
                    "described by both {} and {}",
                    previous.display(),
                    path.display()
                ),
            }
            .into());
        }
        if let Some(previous) = identifiers.insert(device.identifier, class.clone()) {
            return Err(ModelError::Invalid {
                device: class,
                message: format!(
                    "device identifier {} is already used by {}",
                    device.identifier, previous
                ),
            }
            .into());
        }

        if !device.released && !include_unreleased {
            tracing::debug!("skipping unreleased device {}", class);
            continue;
        }
        tracing::debug!("loaded {} from {:?}", class, path);
        devices.push(device);
    }
    Ok(devices)
}
