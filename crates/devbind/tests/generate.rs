// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test readability
#![allow(clippy::missing_panics_doc)] // Tests panic on failure

//! Generation run integration tests
//!
//! Full runs against temporary description and output directories.

use devbind::{EmitError, Error, Generator, GeneratorConfig, TargetLanguage};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const EVSE: &str = include_str!("../../../configs/bricklet_evse.yaml");

const RELEASED: &str = r#"
category: Bricklet
device_identifier: 42
name: Test
api_version: [2, 0, 0]
released: true
packets:
  - type: function
    name: Get Value
    elements:
      - [Value, int32, 1, out]
    doc: [bf, {en: "Returns the value."}]
"#;

const WIDE: &str = r#"
category: Brick
device_identifier: 44
name: Wide
api_version: [2, 0, 0]
released: true
packets:
  - type: function
    name: Get Counter
    elements:
      - [Counter, uint64, 1, out]
    doc: [bf, {en: "Returns the counter."}]
"#;

const CLASH: &str = r#"
category: Bricklet
device_identifier: 43
name: Clash
api_version: [2, 0, 0]
released: true
packets:
  - type: function
    name: Get State Callback
    elements:
      - [Enabled, bool, 1, out]
    doc: [ccf, {en: "Returns the callback configuration."}]
  - type: callback
    name: Get State
    elements:
      - [State, uint8, 1, out]
    doc: [c, {en: "Triggered periodically."}]
"#;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

/// Temporary project with a `configs/` directory and `devbind.toml`.
fn project(descriptions: &[(&str, &str)], extra_toml: &str) -> (TempDir, Generator) {
    let root = TempDir::new().unwrap();
    let configs = root.path().join("configs");
    fs::create_dir_all(&configs).unwrap();
    for (name, yaml) in descriptions {
        write(&configs, name, yaml);
    }

    let toml = format!(
        "[generator]\nconfig_dir = \"configs\"\noutput_dir = \"out\"\n{}",
        extra_toml
    );
    write(root.path(), "devbind.toml", &toml);

    let config = GeneratorConfig::from_file(root.path().join("devbind.toml")).unwrap();
    (root, Generator::new(config))
}

fn read_tree(dir: &Path) -> Vec<(String, String)> {
    let mut files: Vec<(String, String)> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            (name, fs::read_to_string(&path).unwrap())
        })
        .collect();
    files.sort();
    files
}

#[test]
fn test_generates_every_language() {
    let (root, generator) = project(&[("test.yaml", RELEASED)], "");
    let report = generator.generate().unwrap();

    assert_eq!(report.devices, vec!["BrickletTest".to_string()]);
    let out = root.path().join("out");
    assert!(out.join("csharp/bindings/BrickletTest.cs").is_file());
    assert!(out.join("java/bindings/BrickletTest.java").is_file());

    let csharp = report.language(TargetLanguage::CSharp).unwrap();
    assert_eq!(csharp.generated, vec!["BrickletTest.cs".to_string()]);
    assert_eq!(csharp.released, vec!["BrickletTest.cs".to_string()]);
    assert!(csharp.skipped.is_empty());

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("java/manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest["language"], "java");
    assert_eq!(manifest["files"][0], "BrickletTest.java");
    assert_eq!(manifest["released"][0], "BrickletTest.java");
    assert!(manifest["generated_date"].is_string());
}

#[test]
fn test_rerun_is_byte_identical() {
    let (root, generator) = project(
        &[("evse.yaml", EVSE), ("test.yaml", RELEASED)],
        "include_unreleased = true\n",
    );
    let bindings = root.path().join("out/csharp/bindings");

    generator.generate().unwrap();
    let first = read_tree(&bindings);
    generator.generate().unwrap();
    let second = read_tree(&bindings);

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[test]
fn test_unreleased_devices() {
    // Left out entirely by default
    let (root, generator) = project(&[("evse.yaml", EVSE), ("test.yaml", RELEASED)], "");
    let report = generator.generate().unwrap();
    assert_eq!(report.devices, vec!["BrickletTest".to_string()]);
    assert!(!root.path().join("out/csharp/bindings/BrickletEVSE.cs").exists());

    // Generated on request, but never listed as released
    let (root, generator) = project(
        &[("evse.yaml", EVSE), ("test.yaml", RELEASED)],
        "include_unreleased = true\n",
    );
    let report = generator.generate().unwrap();
    let java = report.language(TargetLanguage::Java).unwrap();
    assert_eq!(java.generated.len(), 2);
    assert_eq!(java.released, vec!["BrickletTest.java".to_string()]);
    assert!(root.path().join("out/java/bindings/BrickletEVSE.java").is_file());
}

#[test]
fn test_unsupported_pair_is_skipped() {
    let (root, generator) = project(
        &[("test.yaml", RELEASED), ("wide.yaml", WIDE)],
        "\n[types.java]\nunsupported = [\"uint64\"]\n",
    );
    let report = generator.generate().unwrap();

    let java = report.language(TargetLanguage::Java).unwrap();
    assert_eq!(java.generated, vec!["BrickletTest.java".to_string()]);
    assert_eq!(java.skipped.len(), 1);
    assert_eq!(java.skipped[0].device, "BrickWide");
    assert!(java.skipped[0].reason.contains("uint64"), "{}", java.skipped[0].reason);

    // The other language still gets the device
    let csharp = report.language(TargetLanguage::CSharp).unwrap();
    assert_eq!(csharp.generated.len(), 2);
    assert!(root.path().join("out/csharp/bindings/BrickWide.cs").is_file());
    assert!(!root.path().join("out/java/bindings/BrickWide.java").exists());

    let manifest = fs::read_to_string(root.path().join("out/java/manifest.json")).unwrap();
    assert!(manifest.contains("BrickWide"));
}

#[test]
fn test_collision_aborts_before_writing() {
    let (root, generator) = project(
        &[("clash.yaml", CLASH), ("test.yaml", RELEASED)],
        "languages = [\"java\", \"csharp\"]\n",
    );

    let err = generator.generate().unwrap_err();
    assert!(
        matches!(err, Error::Emit(EmitError::NameCollision { .. })),
        "{err}"
    );
    assert!(!root.path().join("out").exists());
}

#[test]
fn test_language_filter() {
    let (root, generator) = project(&[("test.yaml", RELEASED)], "");
    let report = generator
        .generate_languages(&[TargetLanguage::Java])
        .unwrap();

    assert_eq!(report.languages.len(), 1);
    assert!(root.path().join("out/java/bindings/BrickletTest.java").is_file());
    assert!(!root.path().join("out/csharp").exists());
}

#[test]
fn test_duplicate_identifier_across_files() {
    let copy = RELEASED.replace("name: Test", "name: Other");
    let (_root, generator) = project(&[("a.yaml", RELEASED), ("b.yaml", &copy)], "");

    let err = generator.generate().unwrap_err().to_string();
    assert!(err.contains("device identifier 42"), "{err}");
}
