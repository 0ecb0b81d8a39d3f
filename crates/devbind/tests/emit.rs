// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test readability
#![allow(clippy::missing_panics_doc)] // Tests panic on failure

//! Source emitter integration tests
//!
//! Renders small descriptions through both backends and checks the
//! generated members.

use devbind::model::DocLanguage;
use devbind::{
    binding_for, Device, EmitError, RunContext, SourceEmitter, SourceUnit, TargetLanguage,
};

const EVSE: &str = include_str!("../../../configs/bricklet_evse.yaml");

const MODES: &str = r#"
category: Bricklet
device_identifier: 42
name: Test
api_version: [2, 0, 1]
released: true
constant_groups:
  - name: Mode
    type: uint8
    constants: [[Off, 0], [On, 1], [Auto, 2]]
packets:
  - type: function
    name: Set Mode
    elements:
      - [Mode, uint8, 1, in, {constant_group: Mode}]
    doc: [bf, {en: "Sets the mode, see :func:`Get Mode`."}]
  - type: function
    name: Get Mode
    elements:
      - [Mode, uint8, 1, out, {constant_group: Mode}]
    doc: [bf, {en: "Returns the mode."}]
  - type: callback
    name: Mode Changed
    elements:
      - [Mode, uint8, 1, out, {constant_group: Mode}]
      - [Counter, uint32, 1, out]
    doc: [c, {en: "Triggered when the mode changes."}]
"#;

const COLLIDING: &str = r#"
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

const TICK: &str = r#"
category: Bricklet
device_identifier: 44
name: Ticker
api_version: [2, 0, 0]
released: true
packets:
  - type: function
    name: Tick
    elements:
      - [Count, uint8, 1, out]
    doc: [bf, {en: "Returns the tick count."}]
  - type: callback
    name: Tick
    elements:
      - [Count, uint8, 1, out]
    doc: [c, {en: "Triggered on every tick."}]
"#;

fn emit(language: TargetLanguage, device: &Device, run: &RunContext) -> Result<SourceUnit, EmitError> {
    let binding = binding_for(language);
    let emitter = SourceEmitter::new(binding.as_ref(), binding.default_types());
    emitter.emit(device, run)
}

fn render(language: TargetLanguage, yaml: &str) -> String {
    let device = Device::from_yaml("test", yaml).expect("valid description");
    emit(language, &device, &RunContext::default())
        .expect("emits")
        .contents
}

#[test]
fn test_csharp_constant_group() {
    let source = render(TargetLanguage::CSharp, MODES);

    assert!(source.contains("public const byte MODE_OFF = 0;"), "{source}");
    assert!(source.contains("public const byte MODE_ON = 1;"), "{source}");
    assert!(source.contains("public const byte MODE_AUTO = 2;"), "{source}");
    assert_eq!(source.matches("public const byte MODE_").count(), 3);
}

#[test]
fn test_java_constant_group() {
    let source = render(TargetLanguage::Java, MODES);

    assert!(source.contains("public final static short MODE_OFF = (short)0;"), "{source}");
    assert!(source.contains("public final static short MODE_ON = (short)1;"), "{source}");
    assert!(source.contains("public final static short MODE_AUTO = (short)2;"), "{source}");
}

#[test]
fn test_csharp_members() {
    let source = render(TargetLanguage::CSharp, MODES);

    assert!(source.contains("namespace Tinkerforge"));
    assert!(source.contains("public class BrickletTest : Device"));
    assert!(source.contains("public static int DEVICE_IDENTIFIER = 42;"));
    assert!(source.contains("public const byte FUNCTION_SET_MODE = 1;"));
    assert!(source.contains("public const byte CALLBACK_MODE_CHANGED = 3;"));
    assert!(source.contains("public void SetMode(byte mode)"));
    assert!(source.contains("public byte GetMode()"));
    assert!(source.contains("CreateRequestPacket(9, FUNCTION_SET_MODE)"));
    assert!(source.contains("byte[] response = SendRequest(request, 9);"));
    assert!(source.contains("apiVersion[2] = 1;"));
    assert!(source.contains(
        "responseExpected[FUNCTION_GET_MODE] = ResponseExpectedFlag.ALWAYS_TRUE;"
    ));
    assert!(source.contains(
        "callbackWrappers[CALLBACK_MODE_CHANGED] = new CallbackWrapper(OnModeChangedCallback);"
    ));
    assert!(source.contains("protected void OnModeChangedCallback(byte[] response)"));
    assert!(source.contains("<see cref=\"BrickletTest.GetMode\"/>"), "{source}");
    assert!(source.ends_with("\t}\n}\n"));
}

#[test]
fn test_java_members() {
    let source = render(TargetLanguage::Java, MODES);

    assert!(source.contains("package com.tinkerforge;"));
    assert!(source.contains("import java.util.concurrent.CopyOnWriteArrayList;"));
    assert!(source.contains("public void setMode(short mode)"));
    assert!(source.contains("public short getMode()"));
    assert!(source.contains("ipcon.createRequestPacket((byte)9, FUNCTION_SET_MODE, this);"));
    assert!(source.contains("callbacks[CALLBACK_MODE_CHANGED & 0xFF] = this::handleModeChanged;"));
    assert!(source.contains("public void addModeChangedListener(ModeChangedListener listener)"));
    assert!(source.contains("public void removeModeChangedListener(ModeChangedListener listener)"));
    assert!(source.contains("{@link BrickletTest#getMode"), "{source}");
}

#[test]
fn test_evse_renders_in_both_languages() {
    let device = Device::from_yaml("evse", EVSE).unwrap();
    let run = RunContext::default();

    let csharp = emit(TargetLanguage::CSharp, &device, &run).unwrap();
    assert_eq!(csharp.file_name, "BrickletEVSE.cs");
    assert!(!csharp.released);
    assert!(csharp.contents.contains("public const byte JUMPER_CONFIGURATION_6A = 0;"));
    assert!(csharp
        .contents
        .contains("byte[] gpioBits = LEConverter.ByteArrayFrom(30, response, 1);"));
    assert!(csharp.contents.contains("out int allowedChargingCurrent"));

    let java = emit(TargetLanguage::Java, &device, &run).unwrap();
    assert_eq!(java.file_name, "BrickletEVSE.java");
    assert!(java.contents.contains("public class GetStateReturn {"), "{}", java.contents);
    assert!(java.contents.contains("public GetStateReturn getState()"));
}

#[test]
fn test_collision_rejected_for_csharp() {
    let device = Device::from_yaml("clash", COLLIDING).unwrap();

    match emit(TargetLanguage::CSharp, &device, &RunContext::default()) {
        Err(EmitError::NameCollision {
            member,
            first,
            second,
            ..
        }) => {
            assert_eq!(member, "GetStateCallback");
            assert_eq!(first, "function 'Get State Callback'");
            assert_eq!(second, "callback 'Get State'");
        }
        other => panic!("expected a name collision, got {other:?}"),
    }

    // Java renders the callback as add/remove listener methods
    assert!(emit(TargetLanguage::Java, &device, &RunContext::default()).is_ok());
}

#[test]
fn test_legacy_callback_alias() {
    let device = Device::from_yaml("test", MODES).unwrap();

    let plain = emit(TargetLanguage::CSharp, &device, &RunContext::default()).unwrap();
    assert!(plain.contents.contains("public event ModeChangedEventHandler ModeChangedCallback;"));
    assert!(!plain.contents.contains("public event ModeChangedEventHandler ModeChanged\n"));

    let run = RunContext::default().with_legacy_callbacks(["BrickletTest"]);
    let legacy = emit(TargetLanguage::CSharp, &device, &run).unwrap();
    assert!(legacy.contents.contains("public event ModeChangedEventHandler ModeChanged\n"));
    assert!(legacy.contents.contains("add { ModeChangedCallback += value; }"));
}

#[test]
fn test_output_is_deterministic() {
    let device = Device::from_yaml("evse", EVSE).unwrap();
    let run = RunContext::default();

    for language in TargetLanguage::ALL {
        let first = emit(language, &device, &run).unwrap();
        let second = emit(language, &device, &run).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_german_documentation() {
    let device = Device::from_yaml("evse", EVSE).unwrap();
    let mut run = RunContext::default();
    run.doc_language = DocLanguage::De;

    let source = emit(TargetLanguage::CSharp, &device, &run).unwrap().contents;
    assert!(source.contains("Setzt den konfigurierten maximalen Ladestrom."));
    assert!(!source.contains("Sets the configured maximum charging current."));
}

fn collision(language: TargetLanguage, yaml: &str, run: &RunContext) -> (String, String, String) {
    let device = Device::from_yaml("clash", yaml).expect("valid description");
    match emit(language, &device, run) {
        Err(EmitError::NameCollision {
            member,
            first,
            second,
            ..
        }) => (member, first, second),
        other => panic!("expected a name collision, got {other:?}"),
    }
}

#[test]
fn test_functions_rendering_to_one_identifier() {
    let yaml = MODES.replace("name: Set Mode", "name: get mode");
    let run = RunContext::default();

    let (member, first, second) = collision(TargetLanguage::CSharp, &yaml, &run);
    assert_eq!(member, "GetMode");
    assert_eq!(first, "function 'get mode'");
    assert_eq!(second, "function 'Get Mode'");

    let (member, ..) = collision(TargetLanguage::Java, &yaml, &run);
    assert_eq!(member, "getMode");
}

#[test]
fn test_constant_names_colliding() {
    let yaml = MODES.replace(
        "    constants: [[Off, 0], [On, 1], [Auto, 2]]\n",
        "    constants: [[Off, 0], [On, 1], [Auto, 2], [A B, 3]]\n  - name: Mode A\n    type: uint8\n    constants: [[B, 0]]\n",
    );
    assert_ne!(yaml, MODES);

    for language in TargetLanguage::ALL {
        let (member, first, second) = collision(language, &yaml, &RunContext::default());
        assert_eq!(member, "MODE_A_B");
        assert_eq!(first, "constant 'A B' of group 'Mode'");
        assert_eq!(second, "constant 'B' of group 'Mode A'");
    }
}

#[test]
fn test_constant_shadowing_device_constant() {
    let yaml = MODES.replace(
        "constant_groups:\n",
        "constant_groups:\n  - name: Device\n    type: uint8\n    constants: [[Identifier, 1]]\n",
    );

    let (member, first, _) = collision(TargetLanguage::CSharp, &yaml, &RunContext::default());
    assert_eq!(member, "DEVICE_IDENTIFIER");
    assert_eq!(first, "the device class");
}

#[test]
fn test_legacy_alias_collides_with_function() {
    let device = Device::from_yaml("ticker", TICK).unwrap();

    // Without the alias the callback only adds TickCallback
    assert!(emit(TargetLanguage::CSharp, &device, &RunContext::default()).is_ok());

    let run = RunContext::default().with_legacy_callbacks(["BrickletTicker"]);
    let (member, first, second) = collision(TargetLanguage::CSharp, TICK, &run);
    assert_eq!(member, "Tick");
    assert_eq!(first, "function 'Tick'");
    assert_eq!(second, "callback 'Tick'");

    // Java keeps listener names apart from the method
    assert!(emit(TargetLanguage::Java, &device, &run).is_ok());
}
