// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! YAML description loading and validation.
//!
//! A description file looks like:
//!
//! ```yaml
//! category: Bricklet
//! device_identifier: 2159
//! name: EVSE
//! api_version: [2, 0, 2]
//! constant_groups:
//!   - name: LED State
//!     type: uint8
//!     constants: [[Off, 0], [On, 1]]
//! packets:
//!   - type: function
//!     name: Get State
//!     elements:
//!       - [LED State, uint8, 1, out, {constant_group: LED State}]
//!     doc: [bf, {en: "...", de: "..."}]
//! ```

use super::features;
use super::layout::{Layout, MAX_PAYLOAD_SIZE};
use super::{
    Category, Constant, ConstantGroup, Device, Direction, DocStyle, Element, ModelError, Packet,
    PacketDoc, PacketKind, PrimitiveType, Scale, Text, Version,
};
use crate::naming::Name;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDevice {
    category: Category,
    device_identifier: u32,
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    author: String,
    #[serde(default)]
    manufacturer: String,
    #[serde(default)]
    description: Text,
    api_version: [u8; 3],
    #[serde(default)]
    firmware_floor: Option<[u8; 3]>,
    #[serde(default)]
    released: bool,
    #[serde(default)]
    documented: bool,
    #[serde(default)]
    discontinued: bool,
    #[serde(default)]
    features: Vec<String>,
    #[serde(default)]
    constant_groups: Vec<RawConstantGroup>,
    #[serde(default)]
    packets: Vec<RawPacket>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConstantGroup {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    constants: Vec<(String, Value)>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPacket {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    #[serde(default)]
    function_id: Option<u8>,
    #[serde(default)]
    elements: Vec<Value>,
    #[serde(default)]
    since_firmware: Option<[u8; 3]>,
    doc: (String, Text),
}

impl Device {
    /// Read and validate a description file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|error| ModelError::Io {
            origin: origin.clone(),
            error,
        })?;
        Self::from_yaml(&origin, &text)
    }

    /// Parse and validate a description. `origin` names the source in errors.
    pub fn from_yaml(origin: &str, yaml: &str) -> Result<Self, ModelError> {
        let raw: RawDevice = serde_yaml::from_str(yaml).map_err(|error| ModelError::Parse {
            origin: origin.to_string(),
            error,
        })?;
        Builder::new(&raw).build(raw)
    }
}

/// Carries the device label through validation for error messages.
struct Builder {
    device: String,
}

impl Builder {
    fn new(raw: &RawDevice) -> Self {
        Self {
            device: format!("{} {}", raw.category.name(), raw.name),
        }
    }

    fn invalid(&self, message: impl Into<String>) -> ModelError {
        ModelError::Invalid {
            device: self.device.clone(),
            message: message.into(),
        }
    }

    fn build(&self, raw: RawDevice) -> Result<Device, ModelError> {
        let name = Name::new(raw.name.as_str());
        if !name.is_identifier_safe() {
            return Err(self.invalid(format!("device name '{}' is not a valid identifier", name)));
        }
        if raw.discontinued {
            tracing::debug!(device = %self.device, "description marks device as discontinued");
        }
        if !raw.documented {
            tracing::debug!(device = %self.device, "description marks device as undocumented");
        }

        let mut constant_groups = raw
            .constant_groups
            .iter()
            .map(|g| self.constant_group(g))
            .collect::<Result<Vec<_>, _>>()?;

        let mut packets = raw
            .packets
            .iter()
            .enumerate()
            .map(|(index, p)| self.packet(index, p))
            .collect::<Result<Vec<_>, _>>()?;

        for feature in &raw.features {
            let extra = features::expand(feature)
                .ok_or_else(|| self.invalid(format!("unknown feature '{feature}'")))?;
            packets.extend(extra.packets);
            for group in extra.constant_groups {
                if constant_groups.iter().all(|g| g.name != group.name) {
                    constant_groups.push(group);
                }
            }
        }

        let device = Device {
            identifier: raw.device_identifier,
            display_name: raw.display_name.unwrap_or_else(|| raw.name.clone()),
            name,
            category: raw.category,
            author: raw.author,
            manufacturer: raw.manufacturer,
            description: raw.description,
            api_version: version(raw.api_version),
            firmware_floor: raw.firmware_floor.map(version).unwrap_or_default(),
            released: raw.released,
            features: raw.features,
            packets,
            constant_groups,
        };

        self.check_unique_names(&device)?;
        self.check_function_ids(&device)?;
        self.check_payloads(&device)?;
        self.check_constant_references(&device)?;
        Ok(device)
    }

    fn constant_group(&self, raw: &RawConstantGroup) -> Result<ConstantGroup, ModelError> {
        let name = Name::new(raw.name.as_str());
        let ty = PrimitiveType::from_name(&raw.ty).ok_or_else(|| {
            self.invalid(format!(
                "constant group '{}': unknown type '{}'",
                raw.name, raw.ty
            ))
        })?;
        if !(ty.is_integer() || ty == PrimitiveType::Char) {
            return Err(self.invalid(format!(
                "constant group '{}': type '{}' cannot carry constants",
                raw.name, raw.ty
            )));
        }

        let mut seen: BTreeMap<i64, String> = BTreeMap::new();
        let mut constants = Vec::with_capacity(raw.constants.len());
        for (constant_name, raw_value) in &raw.constants {
            let value = self.constant_value(&raw.name, constant_name, ty, raw_value)?;
            if let Some(previous) = seen.insert(value, constant_name.clone()) {
                return Err(self.invalid(format!(
                    "constant group '{}': value {} is used by both '{}' and '{}'",
                    raw.name, value, previous, constant_name
                )));
            }
            let constant_name = Name::new(constant_name.as_str());
            if constant_name.is_empty()
                || !constant_name
                    .space()
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == ' ')
            {
                return Err(self.invalid(format!(
                    "constant group '{}': constant name '{}' is not usable in identifiers",
                    raw.name, constant_name
                )));
            }
            constants.push(Constant {
                name: constant_name,
                value,
            });
        }

        Ok(ConstantGroup {
            name,
            ty,
            constants,
        })
    }

    fn constant_value(
        &self,
        group: &str,
        constant: &str,
        ty: PrimitiveType,
        raw: &Value,
    ) -> Result<i64, ModelError> {
        let value = match (ty, raw) {
            (PrimitiveType::Char, Value::String(s)) if s.chars().count() == 1 => {
                s.chars().next().map(|c| i64::from(u32::from(c)))
            }
            (_, Value::Number(n)) if ty.is_integer() => n.as_i64(),
            _ => None,
        };
        let value = value.ok_or_else(|| {
            self.invalid(format!(
                "constant group '{group}': constant '{constant}' has a value not of type '{ty}'"
            ))
        })?;
        if let Some((min, max)) = ty.integer_bounds() {
            if i128::from(value) < min || i128::from(value) > max {
                return Err(self.invalid(format!(
                    "constant group '{group}': constant '{constant}' value {value} is out of range for '{ty}'"
                )));
            }
        }
        Ok(value)
    }

    fn packet(&self, index: usize, raw: &RawPacket) -> Result<Packet, ModelError> {
        let name = Name::new(raw.name.as_str());
        if !name.is_identifier_safe() {
            return Err(self.invalid(format!("packet name '{}' is not a valid identifier", name)));
        }
        let kind = match raw.kind.as_str() {
            "function" => PacketKind::Function,
            "callback" => PacketKind::Callback,
            other => {
                return Err(self.invalid(format!(
                    "packet '{}': unknown packet type '{}'",
                    raw.name, other
                )))
            }
        };
        let style = DocStyle::from_tag(&raw.doc.0).ok_or_else(|| {
            self.invalid(format!(
                "packet '{}': unknown doc style '{}'",
                raw.name, raw.doc.0
            ))
        })?;

        let function_id = match raw.function_id {
            Some(id) => id,
            None => u8::try_from(index + 1).map_err(|_| {
                self.invalid(format!(
                    "packet '{}': too many packets to assign a function id",
                    raw.name
                ))
            })?,
        };
        if function_id == 0 {
            return Err(self.invalid(format!("packet '{}': function id 0 is reserved", raw.name)));
        }

        let elements = raw
            .elements
            .iter()
            .enumerate()
            .map(|(i, e)| self.element(&raw.name, i, e))
            .collect::<Result<Vec<_>, _>>()?;

        if kind == PacketKind::Callback {
            if let Some(e) = elements.iter().find(|e| e.direction == Direction::In) {
                return Err(self.invalid(format!(
                    "packet '{}', element '{}': callbacks only carry 'out' elements",
                    raw.name, e.name
                )));
            }
        }

        let mut seen = HashSet::new();
        for e in &elements {
            if !seen.insert((e.direction, e.name.clone())) {
                return Err(self.invalid(format!(
                    "packet '{}': element '{}' is declared twice",
                    raw.name, e.name
                )));
            }
        }

        Ok(Packet {
            name,
            kind,
            function_id,
            elements,
            since_firmware: raw.since_firmware.map(version).unwrap_or(Version::new(1, 0, 0)),
            doc: PacketDoc {
                style,
                text: raw.doc.1.clone(),
            },
        })
    }

    /// Parse `[name, type, cardinality, direction, {annotations}?]`.
    fn element(&self, packet: &str, index: usize, raw: &Value) -> Result<Element, ModelError> {
        let malformed = |what: &str| {
            self.invalid(format!(
                "packet '{packet}', element #{index}: malformed element tuple ({what})"
            ))
        };

        let items = raw.as_sequence().ok_or_else(|| malformed("not a sequence"))?;
        if !(4..=5).contains(&items.len()) {
            return Err(malformed("expected 4 or 5 entries"));
        }

        let name = items[0]
            .as_str()
            .map(Name::new)
            .ok_or_else(|| malformed("name is not a string"))?;
        let at = |message: String| {
            self.invalid(format!("packet '{packet}', element '{name}': {message}"))
        };
        if !name.is_identifier_safe() {
            return Err(at("name is not a valid identifier".into()));
        }

        let type_name = items[1]
            .as_str()
            .ok_or_else(|| malformed("type is not a string"))?;
        let ty = PrimitiveType::from_name(type_name)
            .ok_or_else(|| at(format!("unknown type '{type_name}'")))?;

        let cardinality = items[2]
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n >= 1)
            .ok_or_else(|| at("cardinality must be a positive integer".into()))?;

        let direction = items[3]
            .as_str()
            .and_then(Direction::from_name)
            .ok_or_else(|| at("direction must be 'in' or 'out'".into()))?;

        let mut element = Element {
            name: name.clone(),
            ty,
            cardinality,
            direction,
            constant_group: None,
            scale: None,
            unit: None,
            range: None,
        };
        if element.wire_size() > MAX_PAYLOAD_SIZE {
            return Err(ModelError::PayloadTooLarge {
                device: self.device.clone(),
                packet: packet.to_string(),
                direction,
                size: element.wire_size(),
                limit: MAX_PAYLOAD_SIZE,
            });
        }

        if let Some(extra) = items.get(4) {
            let map = extra
                .as_mapping()
                .ok_or_else(|| malformed("annotations are not a mapping"))?;
            for (key, value) in map {
                let key = key.as_str().unwrap_or_default();
                match key {
                    "constant_group" => {
                        let group = value
                            .as_str()
                            .ok_or_else(|| at("constant_group must be a string".into()))?;
                        element.constant_group = Some(Name::new(group));
                    }
                    "scale" => {
                        let pair = number_pair(value)
                            .ok_or_else(|| at("scale must be [numerator, denominator]".into()))?;
                        let (num, den) = pair;
                        if num <= 0.0 || den <= 0.0 || num.fract() != 0.0 || den.fract() != 0.0 {
                            return Err(at("scale terms must be positive integers".into()));
                        }
                        if !ty.is_numeric() {
                            return Err(at(format!("type '{ty}' cannot be scaled")));
                        }
                        element.scale = Some(Scale {
                            num: num as u64,
                            den: den as u64,
                        });
                    }
                    "unit" => {
                        let unit = value
                            .as_str()
                            .ok_or_else(|| at("unit must be a string".into()))?;
                        element.unit = Some(unit.to_string());
                    }
                    "range" => {
                        let (min, max) = number_pair(value)
                            .ok_or_else(|| at("range must be [min, max]".into()))?;
                        if min > max {
                            return Err(at(format!("range [{min}, {max}] is inverted")));
                        }
                        element.range = Some((min, max));
                    }
                    other => return Err(at(format!("unknown annotation '{other}'"))),
                }
            }
        }

        Ok(element)
    }

    fn check_unique_names(&self, device: &Device) -> Result<(), ModelError> {
        let mut seen = HashSet::new();
        for packet in &device.packets {
            if !seen.insert((packet.kind, packet.name.clone())) {
                return Err(self.invalid(format!("packet '{}' is declared twice", packet.name)));
            }
        }
        let mut seen = HashSet::new();
        for group in &device.constant_groups {
            if !seen.insert(group.name.clone()) {
                return Err(self.invalid(format!(
                    "constant group '{}' is declared twice",
                    group.name
                )));
            }
        }
        Ok(())
    }

    fn check_function_ids(&self, device: &Device) -> Result<(), ModelError> {
        let mut owners: BTreeMap<u8, &Packet> = BTreeMap::new();
        for packet in &device.packets {
            if let Some(first) = owners.insert(packet.function_id, packet) {
                return Err(ModelError::DuplicateFunctionId {
                    device: self.device.clone(),
                    function_id: packet.function_id,
                    first: first.name.to_string(),
                    second: packet.name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_payloads(&self, device: &Device) -> Result<(), ModelError> {
        for packet in &device.packets {
            for direction in [Direction::In, Direction::Out] {
                let layout = Layout::of(packet, direction);
                if !layout.fits() {
                    return Err(ModelError::PayloadTooLarge {
                        device: self.device.clone(),
                        packet: packet.name.to_string(),
                        direction,
                        size: layout.payload_size,
                        limit: MAX_PAYLOAD_SIZE,
                    });
                }
            }
        }
        Ok(())
    }

    fn check_constant_references(&self, device: &Device) -> Result<(), ModelError> {
        for packet in &device.packets {
            for element in &packet.elements {
                let Some(group_name) = &element.constant_group else {
                    continue;
                };
                let group = device.constant_group(group_name).ok_or_else(|| {
                    self.invalid(format!(
                        "packet '{}', element '{}': unknown constant group '{}'",
                        packet.name, element.name, group_name
                    ))
                })?;
                if group.ty != element.ty {
                    return Err(self.invalid(format!(
                        "packet '{}', element '{}': type '{}' does not match constant group '{}' of type '{}'",
                        packet.name, element.name, element.ty, group.name, group.ty
                    )));
                }
            }
        }
        Ok(())
    }
}

fn version(parts: [u8; 3]) -> Version {
    Version::new(parts[0], parts[1], parts[2])
}

fn number_pair(value: &Value) -> Option<(f64, f64)> {
    let seq = value.as_sequence()?;
    match seq.as_slice() {
        [a, b] => Some((a.as_f64()?, b.as_f64()?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
category: Bricklet
device_identifier: 42
name: Test
api_version: [2, 0, 0]
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
    doc: [bf, {en: "Sets the mode."}]
  - type: function
    name: Get Mode
    elements:
      - [Mode, uint8, 1, out, {constant_group: Mode}]
    doc: [bf, {en: "Returns the mode."}]
"#;

    #[test]
    fn test_minimal_device() {
        let device = Device::from_yaml("minimal", MINIMAL).expect("valid");
        assert_eq!(device.class_name(), "BrickletTest");
        assert_eq!(device.packets.len(), 2);
        assert_eq!(device.packets[0].function_id, 1);
        assert_eq!(device.packets[1].function_id, 2);
        assert_eq!(device.constant_groups[0].constants.len(), 3);
        assert_eq!(device.firmware_floor, Version::new(2, 0, 0));
    }

    #[test]
    fn test_unknown_type_names_element() {
        let yaml = MINIMAL.replace("[Mode, uint8, 1, out", "[Mode, uint24, 1, out");
        let err = Device::from_yaml("bad", &yaml).unwrap_err().to_string();
        assert!(err.contains("Get Mode"), "{err}");
        assert!(err.contains("uint24"), "{err}");
    }

    #[test]
    fn test_short_tuple_is_malformed() {
        let yaml = MINIMAL.replace("[Mode, uint8, 1, in, {constant_group: Mode}]", "[Mode, uint8]");
        let err = Device::from_yaml("bad", &yaml).unwrap_err().to_string();
        assert!(err.contains("malformed element tuple"), "{err}");
        assert!(err.contains("Set Mode"), "{err}");
    }

    #[test]
    fn test_duplicate_constant_value() {
        let yaml = MINIMAL.replace("[Auto, 2]", "[Auto, 1]");
        let err = Device::from_yaml("bad", &yaml).unwrap_err().to_string();
        assert!(err.contains("value 1"), "{err}");
    }

    #[test]
    fn test_unknown_constant_group() {
        let yaml = MINIMAL.replace(
            "[Mode, uint8, 1, out, {constant_group: Mode}]",
            "[Mode, uint8, 1, out, {constant_group: Moda}]",
        );
        let err = Device::from_yaml("bad", &yaml).unwrap_err().to_string();
        assert!(err.contains("unknown constant group 'Moda'"), "{err}");
    }

    #[test]
    fn test_unknown_feature() {
        let yaml = format!("{MINIMAL}features: [teleport]\n");
        let err = Device::from_yaml("bad", &yaml).unwrap_err().to_string();
        assert!(err.contains("unknown feature 'teleport'"), "{err}");
    }
}
