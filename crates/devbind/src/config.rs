// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Run configuration.
//!
//! Loaded from a TOML file; relative paths resolve against the directory of
//! that file. Every section is optional.

use crate::lang::TargetLanguage;
use crate::model::{DocLanguage, PrimitiveType, Version};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete run configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub generator: GeneratorSection,

    /// Type table adjustments per language.
    #[serde(default)]
    pub types: BTreeMap<TargetLanguage, TypeTableConfig>,

    /// Packaging settings per language.
    #[serde(default)]
    pub package: BTreeMap<TargetLanguage, PackageConfig>,

    /// Directory relative paths resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSection {
    /// Directory holding `*.yaml` device descriptions.
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Root of the generated tree.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_languages")]
    pub languages: Vec<TargetLanguage>,

    #[serde(default)]
    pub doc_language: DocLanguage,

    /// Generate devices whose description is not marked released.
    #[serde(default)]
    pub include_unreleased: bool,

    /// Device class names that keep the pre-suffix callback event names (C#).
    #[serde(default)]
    pub legacy_callback_devices: BTreeSet<String>,

    /// Version stamped into generated headers and build files.
    #[serde(default = "default_bindings_version")]
    pub bindings_version: String,

    /// Root namespace of generated code (`Tinkerforge`, `com.tinkerforge`).
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("configs")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

fn default_languages() -> Vec<TargetLanguage> {
    vec![TargetLanguage::CSharp, TargetLanguage::Java]
}

fn default_bindings_version() -> String {
    "2.1.0".to_string()
}

fn default_namespace() -> String {
    "Tinkerforge".to_string()
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            output_dir: default_output_dir(),
            languages: default_languages(),
            doc_language: DocLanguage::default(),
            include_unreleased: false,
            legacy_callback_devices: BTreeSet::new(),
            bindings_version: default_bindings_version(),
            namespace: default_namespace(),
        }
    }
}

/// Adjustments applied on top of a language's built-in type table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeTableConfig {
    /// Replace the rule of a primitive type.
    #[serde(default)]
    pub overrides: BTreeMap<PrimitiveType, TypeRuleConfig>,

    /// Primitive types this language cannot represent.
    #[serde(default)]
    pub unsupported: BTreeSet<PrimitiveType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeRuleConfig {
    /// Type exposed in the public API.
    pub api: String,
    /// Type used to read and write the wire representation.
    pub wire: String,
}

/// Packaging settings for one language.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageConfig {
    /// Staging directory, recreated on every run.
    /// Defaults to `<output_dir>/<language>/staging`.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// Directory the skeleton `files` are read from.
    #[serde(default)]
    pub skeleton_dir: Option<PathBuf>,

    /// Skeleton file (relative to `skeleton_dir`) -> destination (relative
    /// to the staging directory).
    #[serde(default)]
    pub files: BTreeMap<String, String>,

    /// Destination of released bindings inside the staging directory.
    #[serde(default = "default_bindings_dest")]
    pub bindings_dest: String,

    /// Custom tera template for the build file; built-in one otherwise.
    #[serde(default)]
    pub build_template: Option<PathBuf>,

    /// Name of the rendered build file inside the staging directory.
    #[serde(default)]
    pub build_file: Option<String>,

    /// Build tool invocation, run inside the staging directory. Empty skips.
    #[serde(default)]
    pub build_command: Vec<String>,

    /// Directory of example programs compiled after the build tool ran.
    /// Every file with the language's extension is compiled, sorted by path.
    #[serde(default)]
    pub examples_dir: Option<PathBuf>,

    /// Compiler invocation for one example, run inside the staging directory.
    /// `{example}` is replaced by the absolute example path. Empty skips.
    #[serde(default)]
    pub example_command: Vec<String>,

    /// Archive tool invocation, run inside the staging directory. Empty skips.
    /// `{archive}` is replaced by the absolute archive path.
    #[serde(default)]
    pub archive_command: Vec<String>,

    /// Archive file name, placed next to the staging directory.
    #[serde(default)]
    pub archive_name: Option<String>,
}

fn default_bindings_dest() -> String {
    "src".to_string()
}

impl GeneratorConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration text; relative paths resolve against `base_dir`.
    pub fn from_toml(text: &str, base_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text)?;
        config.base_dir = base_dir.into();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let generator = &self.generator;
        if generator.languages.is_empty() {
            return Err(ConfigError::Invalid("No target languages configured".into()));
        }
        let mut seen = BTreeSet::new();
        for language in &generator.languages {
            if !seen.insert(*language) {
                return Err(ConfigError::Invalid(format!(
                    "Language '{}' is listed twice",
                    language
                )));
            }
        }
        self.bindings_version()?;

        if generator.namespace.is_empty()
            || !generator
                .namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.')
        {
            return Err(ConfigError::Invalid(format!(
                "Namespace '{}' is not a valid identifier",
                generator.namespace
            )));
        }

        for (language, table) in &self.types {
            for (ty, rule) in &table.overrides {
                if rule.api.trim().is_empty() || rule.wire.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "[types.{}] override for '{}' has an empty type",
                        language, ty
                    )));
                }
                if table.unsupported.contains(ty) {
                    return Err(ConfigError::Invalid(format!(
                        "[types.{}] '{}' is both overridden and unsupported",
                        language, ty
                    )));
                }
            }
        }

        for (language, package) in &self.package {
            if !package.files.is_empty() && package.skeleton_dir.is_none() {
                return Err(ConfigError::Invalid(format!(
                    "[package.{}] lists skeleton files but no skeleton_dir",
                    language
                )));
            }
            if !package.example_command.is_empty() && package.examples_dir.is_none() {
                return Err(ConfigError::Invalid(format!(
                    "[package.{}] sets example_command but no examples_dir",
                    language
                )));
            }
            self.check_staging_dir(*language)?;
            for dest in package.files.values().chain([&package.bindings_dest]) {
                if Path::new(dest).is_absolute() || dest.split('/').any(|c| c == "..") {
                    return Err(ConfigError::Invalid(format!(
                        "[package.{}] destination '{}' leaves the staging directory",
                        language, dest
                    )));
                }
            }
        }

        Ok(())
    }

    /// Reject staging directories that equal or contain a directory packaging
    /// reads from.
    fn check_staging_dir(&self, language: TargetLanguage) -> Result<(), ConfigError> {
        let staging = normalize(&self.staging_dir(language));

        let mut protected = vec![
            ("configuration directory", self.base_dir.clone()),
            ("description directory", self.config_dir()),
            ("output directory", self.output_dir()),
        ];
        for other in TargetLanguage::ALL {
            protected.push(("bindings directory", self.language_dir(other).join("bindings")));
        }
        for package in self.package.values() {
            if let Some(skeleton) = &package.skeleton_dir {
                protected.push(("skeleton directory", self.resolve(skeleton)));
            }
            if let Some(examples) = &package.examples_dir {
                protected.push(("examples directory", self.resolve(examples)));
            }
        }

        for (what, path) in protected {
            if normalize(&path).starts_with(&staging) {
                return Err(ConfigError::Invalid(format!(
                    "[package.{}] staging_dir '{}' would remove the {} '{}'",
                    language,
                    staging.display(),
                    what,
                    path.display()
                )));
            }
        }
        Ok(())
    }

    /// `bindings_version` as a three-part version.
    pub fn bindings_version(&self) -> Result<Version, ConfigError> {
        let raw = &self.generator.bindings_version;
        let parts: Vec<u8> = raw
            .split('.')
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|_| ConfigError::Invalid(format!("Bad bindings_version '{}'", raw)))?;
        match parts.as_slice() {
            [a, b, c] => Ok(Version::new(*a, *b, *c)),
            _ => Err(ConfigError::Invalid(format!(
                "Bad bindings_version '{}': expected major.minor.patch",
                raw
            ))),
        }
    }

    /// Resolve a configured path against the configuration directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.resolve(&self.generator.config_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.generator.output_dir)
    }

    /// `<output_dir>/<language>`
    pub fn language_dir(&self, language: TargetLanguage) -> PathBuf {
        self.output_dir().join(language.name())
    }

    /// Staging directory of `language`, `<output_dir>/<language>/staging`
    /// unless configured.
    pub fn staging_dir(&self, language: TargetLanguage) -> PathBuf {
        match self.package(language).and_then(|p| p.staging_dir.as_ref()) {
            Some(dir) => self.resolve(dir),
            None => self.language_dir(language).join("staging"),
        }
    }

    pub fn type_table(&self, language: TargetLanguage) -> Option<&TypeTableConfig> {
        self.types.get(&language)
    }

    pub fn package(&self, language: TargetLanguage) -> Option<&PackageConfig> {
        self.package.get(&language)
    }
}

/// Lexical normalization: `.` dropped, `..` folded into its parent.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir
                if matches!(out.components().next_back(), Some(Component::Normal(_))) =>
            {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::from_toml("", "/work").unwrap();
        assert_eq!(config.generator.languages.len(), 2);
        assert_eq!(config.config_dir(), PathBuf::from("/work/configs"));
        assert_eq!(
            config.language_dir(TargetLanguage::Java),
            PathBuf::from("/work/generated/java")
        );
        assert_eq!(config.bindings_version().unwrap(), Version::new(2, 1, 0));
    }

    #[test]
    fn test_full_config() {
        let text = r#"
[generator]
config_dir = "descriptions"
output_dir = "/tmp/out"
languages = ["java"]
doc_language = "de"
include_unreleased = true
legacy_callback_devices = ["BrickletEVSE"]

[types.java]
unsupported = ["uint64"]

[types.csharp.overrides]
uint64 = { api = "ulong", wire = "ulong" }

[package.java]
build_command = ["mvn", "-q", "package"]
archive_command = ["zip", "-q", "-r", "{archive}", "."]
"#;
        let config = GeneratorConfig::from_toml(text, "/work").unwrap();
        assert_eq!(config.generator.languages, vec![TargetLanguage::Java]);
        assert_eq!(config.generator.doc_language, DocLanguage::De);
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/out"));
        assert!(config
            .type_table(TargetLanguage::Java)
            .unwrap()
            .unsupported
            .contains(&PrimitiveType::Uint64));
        let csharp = config.type_table(TargetLanguage::CSharp).unwrap();
        assert_eq!(csharp.overrides[&PrimitiveType::Uint64].api, "ulong");
        let package = config.package(TargetLanguage::Java).unwrap();
        assert_eq!(package.bindings_dest, "src");
        assert_eq!(package.build_command[0], "mvn");
    }

    #[test]
    fn test_duplicate_language() {
        let err = GeneratorConfig::from_toml("[generator]\nlanguages = [\"java\", \"java\"]", ".")
            .unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn test_unknown_language() {
        let err = GeneratorConfig::from_toml("[generator]\nlanguages = [\"cobol\"]", ".");
        assert!(matches!(err, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_bad_version() {
        let err = GeneratorConfig::from_toml("[generator]\nbindings_version = \"2.x\"", ".")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_override_and_unsupported_conflict() {
        let text = r#"
[types.java]
unsupported = ["uint64"]
overrides = { uint64 = { api = "long", wire = "long" } }
"#;
        let err = GeneratorConfig::from_toml(text, ".").unwrap_err();
        assert!(err.to_string().contains("both overridden and unsupported"));
    }

    #[test]
    fn test_destination_escape_rejected() {
        let text = "[package.csharp]\nbindings_dest = \"../outside\"\n";
        let err = GeneratorConfig::from_toml(text, ".").unwrap_err();
        assert!(err.to_string().contains("leaves the staging directory"));
    }

    #[test]
    fn test_staging_dir_default_and_override() {
        let config = GeneratorConfig::from_toml("", "/work").unwrap();
        assert_eq!(
            config.staging_dir(TargetLanguage::CSharp),
            PathBuf::from("/work/generated/csharp/staging")
        );

        let text = "[package.java]\nstaging_dir = \"stage/java\"\n";
        let config = GeneratorConfig::from_toml(text, "/work").unwrap();
        assert_eq!(
            config.staging_dir(TargetLanguage::Java),
            PathBuf::from("/work/stage/java")
        );
    }

    #[test]
    fn test_staging_dir_must_not_cover_inputs() {
        for (staging, what) in [
            (".", "configuration directory"),
            ("generated/../configs", "description directory"),
            ("generated", "output directory"),
            ("generated/csharp", "bindings directory"),
            ("./generated/java/bindings", "bindings directory"),
            ("/work", "configuration directory"),
        ] {
            let text = format!("[package.csharp]\nstaging_dir = \"{staging}\"\n");
            let err = GeneratorConfig::from_toml(&text, "/work").unwrap_err().to_string();
            assert!(err.contains("would remove"), "{staging}: {err}");
            assert!(err.contains(what), "{staging}: {err}");
        }

        let text = "[package.java]\nskeleton_dir = \"skel/java\"\nstaging_dir = \"skel\"\n";
        let err = GeneratorConfig::from_toml(text, "/work").unwrap_err().to_string();
        assert!(err.contains("skeleton directory"), "{err}");
    }

    #[test]
    fn test_example_command_needs_directory() {
        let text = "[package.java]\nexample_command = [\"javac\", \"{example}\"]\n";
        let err = GeneratorConfig::from_toml(text, ".").unwrap_err().to_string();
        assert!(err.contains("no examples_dir"), "{err}");

        let text = "[package.java]\nexamples_dir = \"demos/java\"\nexample_command = [\"javac\", \"{example}\"]\n";
        let config = GeneratorConfig::from_toml(text, "/work").unwrap();
        let package = config.package(TargetLanguage::Java).unwrap();
        assert_eq!(package.examples_dir, Some(PathBuf::from("demos/java")));
    }

    #[test]
    fn test_from_file_sets_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devbind.toml");
        std::fs::write(&path, "[generator]\noutput_dir = \"gen\"\n").unwrap();
        let config = GeneratorConfig::from_file(&path).unwrap();
        assert_eq!(config.output_dir(), dir.path().join("gen"));
    }
}
