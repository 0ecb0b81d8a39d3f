// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Device Binding Generator CLI
//!
//! # Usage
//!
//! ```bash
//! # Generate every configured language
//! devbind-gen generate --config configs/devbind.toml
//!
//! # Only Java
//! devbind-gen generate --config configs/devbind.toml --language java
//!
//! # Check descriptions without generating anything
//! devbind-gen validate configs/
//!
//! # Show the wire layout of every packet
//! devbind-gen layout configs/bricklet_evse.yaml
//!
//! # Generate, then build and archive the C# project
//! devbind-gen package --config configs/devbind.toml --language csharp
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use devbind::generator::load_devices;
use devbind::model::Direction;
use devbind::{Device, GeneratorConfig, Generator, Packager, TargetLanguage};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "devbind-gen")]
#[command(about = "Device binding generator - C# and Java bindings from YAML descriptions")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate bindings for the configured languages
    Generate {
        /// Run configuration file
        #[arg(short, long, default_value = "devbind.toml")]
        config: PathBuf,

        /// Restrict to these languages (csharp, java; can repeat)
        #[arg(short, long, value_delimiter = ',')]
        language: Vec<TargetLanguage>,
    },

    /// Validate device descriptions or a run configuration
    Validate {
        /// Description files, description directories or `.toml` configs
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },

    /// Print the wire layout of a device description
    Layout {
        /// Description file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only this packet (display name, e.g. "Get State")
        #[arg(short, long)]
        packet: Option<String>,
    },

    /// Generate one language, then stage, build and archive it
    Package {
        /// Run configuration file
        #[arg(short, long, default_value = "devbind.toml")]
        config: PathBuf,

        /// Language to package
        #[arg(short, long)]
        language: TargetLanguage,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Generate { config, language } => cmd_generate(&config, &language),
        Commands::Validate { paths } => cmd_validate(&paths),
        Commands::Layout { file, packet } => cmd_layout(&file, packet.as_deref()),
        Commands::Package { config, language } => cmd_package(&config, language),
    }
}

fn load_generator(config: &Path) -> anyhow::Result<Generator> {
    Generator::from_config_file(config)
        .with_context(|| format!("Failed to load config {}", config.display()))
}

fn cmd_generate(config: &Path, languages: &[TargetLanguage]) -> anyhow::Result<()> {
    let generator = load_generator(config)?;
    let report = if languages.is_empty() {
        generator.generate()
    } else {
        generator.generate_languages(languages)
    }
    .context("Generation failed")?;

    report.summary();
    Ok(())
}

fn cmd_validate(paths: &[PathBuf]) -> anyhow::Result<()> {
    let mut failures = 0usize;

    for path in paths {
        let result = if path.is_dir() {
            load_devices(path, true).map_err(anyhow::Error::from)
        } else if path.extension().is_some_and(|e| e == "toml") {
            match GeneratorConfig::from_file(path) {
                Ok(config) => {
                    println!(
                        "[OK] Config {}: {} languages, output in {}",
                        path.display(),
                        config.generator.languages.len(),
                        config.output_dir().display()
                    );
                    continue;
                }
                Err(e) => Err(e.into()),
            }
        } else {
            Device::from_file(path)
                .map(|d| vec![d])
                .map_err(anyhow::Error::from)
        };

        match result {
            Ok(devices) => {
                for device in &devices {
                    println!(
                        "[OK] {} ({}): {} functions, {} callbacks, {} constant groups{}",
                        device.class_name(),
                        device.identifier,
                        device.functions().count(),
                        device.callbacks().count(),
                        device.constant_groups.len(),
                        if device.released { "" } else { " [unreleased]" }
                    );
                }
            }
            Err(e) => {
                eprintln!("[ERROR] {}: {e:#}", path.display());
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("Validation failed for {failures} path(s)");
    }
    Ok(())
}

fn cmd_layout(file: &Path, only: Option<&str>) -> anyhow::Result<()> {
    let device = Device::from_file(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    let packets: Vec<_> = match only {
        Some(name) => vec![device
            .packet(name, None)
            .with_context(|| format!("{} has no packet '{name}'", device.class_name()))?],
        None => device.packets.iter().collect(),
    };

    println!("{} ({})", device.long_display_name(), device.identifier);
    println!("{}", "=".repeat(60));
    for packet in packets {
        println!();
        println!(
            "[{:>3}] {} {:?} (response expected: {:?})",
            packet.function_id,
            packet.name,
            packet.kind,
            packet.response_expected()
        );
        for (label, direction) in [("request", Direction::In), ("response", Direction::Out)] {
            let layout = packet.layout(direction);
            if layout.is_empty() {
                continue;
            }
            println!(
                "  {label}: {} bytes payload, {} bytes frame",
                layout.payload_size,
                layout.frame_size()
            );
            for slot in &layout.fields {
                let ty = if slot.element.cardinality > 1 {
                    format!("{}[{}]", slot.element.ty, slot.element.cardinality)
                } else {
                    slot.element.ty.to_string()
                };
                println!(
                    "    {:>3}  {:>3}  {:<14} {}",
                    slot.offset, slot.size, ty, slot.element.name
                );
            }
        }
    }
    Ok(())
}

fn cmd_package(config: &Path, language: TargetLanguage) -> anyhow::Result<()> {
    let generator = load_generator(config)?;
    let generation = generator
        .generate_languages(&[language])
        .context("Generation failed")?;
    let report = generation
        .language(language)
        .with_context(|| format!("No {language} output was generated"))?;

    let packager = Packager::new(generator.config(), language)?;
    let package = packager
        .package(report)
        .with_context(|| format!("Packaging {language} failed"))?;

    println!("[OK] Staged {} files in {}", package.files.len(), package.staging_dir.display());
    println!("[OK] Build file: {}", package.build_file.display());
    if !package.examples.is_empty() {
        println!("[OK] Compiled {} examples", package.examples.len());
    }
    match &package.archive {
        Some(archive) => println!("[OK] Archive: {}", archive.display()),
        None => println!("[OK] No archive command configured"),
    }
    Ok(())
}
