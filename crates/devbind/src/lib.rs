// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Device binding generator
//!
//! Turns declarative device descriptions into client bindings for several
//! target languages and packages them for distribution.
//!
//! # Pipeline
//!
//! - **Model**: YAML descriptions are loaded into an immutable [`Device`] graph
//!   and validated (function ids, payload sizes, constant groups)
//! - **Mapper**: per-language [`TypeTable`]s, naming flavors and doc rendering
//! - **Emitter**: one source unit per (device, language), fragments in a fixed
//!   order, name collisions rejected before anything is written
//! - **Packager**: copies released bindings into a project skeleton, renders
//!   the build file and drives external build/archive tools
//!
//! # Quick Start
//!
//! ```bash
//! devbind-gen generate --config devbind.toml
//! devbind-gen layout configs/bricklet_evse.yaml
//! devbind-gen package --config devbind.toml --language csharp
//! ```
//!
//! # Configuration File
//!
//! ```toml
//! [generator]
//! config_dir = "configs"
//! output_dir = "generated"
//! languages = ["csharp", "java"]
//!
//! [types.java]
//! unsupported = ["uint64"]
//!
//! [package.csharp]
//! staging_dir = "generated/csharp/staging"
//! build_command = ["dotnet", "build"]
//! archive_command = ["zip", "-q", "-r", "{archive}", "."]
//! ```

pub mod config;
pub mod context;
pub mod doc;
pub mod emit;
mod error;
pub mod generator;
pub mod lang;
pub mod mapper;
pub mod model;
pub mod naming;
pub mod package;

pub use config::{ConfigError, GeneratorConfig, PackageConfig, TypeTableConfig};
pub use context::RunContext;
pub use emit::{EmitError, SourceEmitter, SourceUnit};
pub use error::{Error, Result};
pub use generator::{GenerationReport, Generator, LanguageReport};
pub use lang::{binding_for, Binding, TargetLanguage};
pub use mapper::{TypeRule, TypeTable};
pub use model::{Device, ModelError};
pub use naming::Name;
pub use package::{PackageError, PackageReport, Packager};
