// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Packaging Driver.
//!
//! Builds a distributable project from the bindings of one language:
//!
//! 1. recreate the staging directory
//! 2. copy released bindings and skeleton files into it
//! 3. render the build file (`.csproj`, `pom.xml`) with tera
//! 4. run the build tool inside the staging directory
//! 5. compile each configured example against the build
//! 6. run the archive tool
//!
//! External tools run synchronously and are never retried; a non-zero exit
//! stops packaging with [`PackageError::ExternalTool`].

use crate::config::{GeneratorConfig, PackageConfig};
use crate::generator::LanguageReport;
use crate::lang::TargetLanguage;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tera::Tera;
use thiserror::Error;

const CSPROJ_TEMPLATE: &str = include_str!("../templates/csproj.tera");
const POM_TEMPLATE: &str = include_str!("../templates/pom.xml.tera");

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("No [package.{0}] section configured")]
    NotConfigured(TargetLanguage),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {}", exit_text(.status))]
    ExternalTool { tool: String, status: Option<i32> },
}

fn exit_text(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PackageError + '_ {
    move |source| PackageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// What a packaging run produced.
#[derive(Debug, Clone)]
pub struct PackageReport {
    pub language: TargetLanguage,
    pub staging_dir: PathBuf,
    /// Staged files, relative to the staging directory, sorted.
    pub files: Vec<String>,
    pub build_file: PathBuf,
    /// Examples compiled after the build, in compile order.
    pub examples: Vec<PathBuf>,
    pub archive: Option<PathBuf>,
}

pub struct Packager<'a> {
    config: &'a GeneratorConfig,
    package: &'a PackageConfig,
    language: TargetLanguage,
}

impl<'a> Packager<'a> {
    pub fn new(config: &'a GeneratorConfig, language: TargetLanguage) -> Result<Self, PackageError> {
        let package = config
            .package(language)
            .ok_or(PackageError::NotConfigured(language))?;
        Ok(Self {
            config,
            package,
            language,
        })
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.config.staging_dir(self.language)
    }

    fn namespace(&self) -> &str {
        &self.config.generator.namespace
    }

    fn build_file_name(&self) -> String {
        match (&self.package.build_file, self.language) {
            (Some(name), _) => name.clone(),
            (None, TargetLanguage::CSharp) => format!("{}.csproj", self.namespace()),
            (None, TargetLanguage::Java) => "pom.xml".to_string(),
        }
    }

    /// Archive location, next to the staging directory.
    pub fn archive_path(&self) -> PathBuf {
        let name = match &self.package.archive_name {
            Some(name) => name.clone(),
            None => format!(
                "{}_{}_bindings_{}.zip",
                self.namespace().to_ascii_lowercase(),
                self.language,
                self.config.generator.bindings_version.replace('.', "_")
            ),
        };
        self.staging_dir().with_file_name(name)
    }

    /// Package the bindings listed in `report`.
    pub fn package(&self, report: &LanguageReport) -> Result<PackageReport, PackageError> {
        let staging = absolute(&self.staging_dir())?;

        // Stage 1: Fresh staging directory
        tracing::info!("Stage 1: Preparing {:?}", staging);
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(io_error(&staging))?;
        }
        fs::create_dir_all(&staging).map_err(io_error(&staging))?;

        // Stage 2: Copy bindings and skeleton
        tracing::info!("Stage 2: Copying files");
        let mut files = Vec::new();
        let bindings_dir = report.bindings_dir();
        for file in &report.released {
            let dest = format!("{}/{}", self.package.bindings_dest.trim_end_matches('/'), file);
            copy_file(&bindings_dir.join(file), &staging.join(&dest))?;
            files.push(dest);
        }
        if let Some(skeleton) = &self.package.skeleton_dir {
            let skeleton = self.config.resolve(skeleton);
            for (source, dest) in &self.package.files {
                copy_file(&skeleton.join(source), &staging.join(dest))?;
                files.push(dest.clone());
            }
        }
        files.sort();
        tracing::info!("[OK] Staged {} files", files.len());

        // Stage 3: Build file
        tracing::info!("Stage 3: Rendering build file");
        let build_file = staging.join(self.build_file_name());
        let rendered = self.render_build_file(report, &files)?;
        fs::write(&build_file, rendered).map_err(io_error(&build_file))?;

        // Stage 4: Build
        tracing::info!("Stage 4: Running build tool");
        let archive = absolute(&self.archive_path())?;
        let vars = [("{archive}", archive.as_path())];
        run_tool(&self.package.build_command, &staging, &vars)?;

        // Stage 5: Examples
        let examples = self.compile_examples(&staging)?;

        // Stage 6: Archive
        tracing::info!("Stage 6: Running archive tool");
        let archive = if self.package.archive_command.is_empty() {
            None
        } else {
            if archive.exists() {
                fs::remove_file(&archive).map_err(io_error(&archive))?;
            }
            let vars = [("{archive}", archive.as_path())];
            run_tool(&self.package.archive_command, &staging, &vars)?;
            Some(archive)
        };

        tracing::info!("[OK] Packaging complete");
        Ok(PackageReport {
            language: self.language,
            staging_dir: staging,
            files,
            build_file,
            examples,
            archive,
        })
    }

    /// Compile every example once, stopping at the first failure.
    fn compile_examples(&self, staging: &Path) -> Result<Vec<PathBuf>, PackageError> {
        let Some(dir) = &self.package.examples_dir else {
            return Ok(Vec::new());
        };
        if self.package.example_command.is_empty() {
            return Ok(Vec::new());
        }

        let dir = absolute(&self.config.resolve(dir))?;
        tracing::info!("Stage 5: Compiling examples from {:?}", dir);
        let mut examples = Vec::new();
        collect_files(&dir, self.language.extension(), &mut examples)?;
        examples.sort();

        for example in &examples {
            let vars = [("{example}", example.as_path())];
            run_tool(&self.package.example_command, staging, &vars)?;
        }
        tracing::info!("[OK] Compiled {} examples", examples.len());
        Ok(examples)
    }

    fn render_build_file(&self, report: &LanguageReport, files: &[String]) -> Result<String, PackageError> {
        let template = match &self.package.build_template {
            Some(path) => {
                let path = self.config.resolve(path);
                fs::read_to_string(&path).map_err(io_error(&path))?
            }
            None => match self.language {
                TargetLanguage::CSharp => CSPROJ_TEMPLATE.to_string(),
                TargetLanguage::Java => POM_TEMPLATE.to_string(),
            },
        };

        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        tera.add_raw_template("build", &template)?;

        let sources: Vec<&String> = files
            .iter()
            .filter(|f| f.ends_with(&format!(".{}", self.language.extension())))
            .collect();
        let devices: Vec<String> = report
            .released
            .iter()
            .filter_map(|f| f.rsplit_once('.').map(|(stem, _)| stem.to_string()))
            .collect();

        let mut ctx = tera::Context::new();
        ctx.insert("namespace", self.namespace());
        ctx.insert("package", &format!("com.{}", self.namespace().to_ascii_lowercase()));
        ctx.insert("artifact", &self.namespace().to_ascii_lowercase());
        ctx.insert("version", &self.config.generator.bindings_version);
        ctx.insert("language", &self.language);
        ctx.insert("files", &sources);
        ctx.insert("devices", &devices);

        Ok(tera.render("build", &ctx)?)
    }
}

fn copy_file(source: &Path, dest: &Path) -> Result<(), PackageError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    fs::copy(source, dest).map_err(io_error(source))?;
    Ok(())
}

/// Files below `dir` with extension `extension`, recursively.
fn collect_files(dir: &Path, extension: &str, out: &mut Vec<PathBuf>) -> Result<(), PackageError> {
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();
        if path.is_dir() {
            collect_files(&path, extension, out)?;
        } else if path.extension().is_some_and(|e| e == extension) {
            out.push(path);
        }
    }
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf, PackageError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(io_error(Path::new(".")))?;
    Ok(cwd.join(path))
}

/// Run `command` in `cwd` with `{placeholder}` arguments substituted.
/// An empty command is a no-op.
fn run_tool(command: &[String], cwd: &Path, vars: &[(&str, &Path)]) -> Result<(), PackageError> {
    let Some((program, args)) = command.split_first() else {
        return Ok(());
    };
    let args: Vec<String> = args
        .iter()
        .map(|arg| {
            vars.iter().fold(arg.clone(), |arg, (key, value)| {
                arg.replace(key, &value.display().to_string())
            })
        })
        .collect();

    tracing::info!("Running: {} {}", program, args.join(" "));
    let status = Command::new(program)
        .args(&args)
        .current_dir(cwd)
        .status()
        .map_err(|source| PackageError::Spawn {
            tool: program.clone(),
            source,
        })?;

    if !status.success() {
        return Err(PackageError::ExternalTool {
            tool: program.clone(),
            status: status.code(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured() {
        let config = GeneratorConfig::from_toml("", ".").unwrap();
        assert!(matches!(
            Packager::new(&config, TargetLanguage::Java),
            Err(PackageError::NotConfigured(TargetLanguage::Java))
        ));
    }

    #[test]
    fn test_default_paths() {
        let config = GeneratorConfig::from_toml("[package.csharp]\n", "/work").unwrap();
        let packager = Packager::new(&config, TargetLanguage::CSharp).unwrap();
        assert_eq!(
            packager.staging_dir(),
            PathBuf::from("/work/generated/csharp/staging")
        );
        assert_eq!(
            packager.archive_path(),
            PathBuf::from("/work/generated/csharp/tinkerforge_csharp_bindings_2_1_0.zip")
        );
        assert_eq!(packager.build_file_name(), "Tinkerforge.csproj");
    }

    #[test]
    fn test_exit_status_message() {
        let err = PackageError::ExternalTool {
            tool: "mvn".into(),
            status: Some(1),
        };
        assert_eq!(err.to_string(), "mvn exited with status 1");
    }
}
