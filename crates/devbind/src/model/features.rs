// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Standard packets contributed by description `features`.
//!
//! Devices built on the same firmware base share a fixed set of functions
//! with reserved ids at the top of the id space. Descriptions list the
//! feature instead of repeating the packets.

use super::{
    Constant, ConstantGroup, Direction, DocStyle, Element, Packet, PacketDoc, PacketKind,
    PrimitiveType, Text, Version,
};
use crate::naming::Name;

pub(super) struct FeatureSet {
    pub packets: Vec<Packet>,
    pub constant_groups: Vec<ConstantGroup>,
}

/// Packets and groups added by `feature`, or `None` if unknown.
pub(super) fn expand(feature: &str) -> Option<FeatureSet> {
    match feature {
        "device" => Some(FeatureSet {
            packets: Vec::new(),
            constant_groups: Vec::new(),
        }),
        "bricklet_get_identity" => Some(FeatureSet {
            packets: vec![get_identity()],
            constant_groups: Vec::new(),
        }),
        "comcu_bricklet" => Some(comcu()),
        _ => None,
    }
}

fn el(name: &str, ty: PrimitiveType, cardinality: usize, direction: Direction) -> Element {
    Element {
        name: Name::new(name),
        ty,
        cardinality,
        direction,
        constant_group: None,
        scale: None,
        unit: None,
        range: None,
    }
}

fn grouped(mut element: Element, group: &str) -> Element {
    element.constant_group = Some(Name::new(group));
    element
}

fn function(id: u8, name: &str, style: DocStyle, elements: Vec<Element>, en: &str) -> Packet {
    Packet {
        name: Name::new(name),
        kind: PacketKind::Function,
        function_id: id,
        elements,
        since_firmware: Version::new(1, 0, 0),
        doc: PacketDoc {
            style,
            text: Text {
                en: en.to_string(),
                de: String::new(),
            },
        },
    }
}

fn group(name: &str, constants: &[(&str, i64)]) -> ConstantGroup {
    ConstantGroup {
        name: Name::new(name),
        ty: PrimitiveType::Uint8,
        constants: constants
            .iter()
            .map(|(n, v)| Constant {
                name: Name::new(*n),
                value: *v,
            })
            .collect(),
    }
}

fn get_identity() -> Packet {
    use Direction::Out;
    use PrimitiveType::*;

    function(
        255,
        "Get Identity",
        DocStyle::Advanced,
        vec![
            el("Uid", String, 8, Out),
            el("Connected Uid", String, 8, Out),
            el("Position", Char, 1, Out),
            el("Hardware Version", Uint8, 3, Out),
            el("Firmware Version", Uint8, 3, Out),
            el("Device Identifier", Uint16, 1, Out),
        ],
        "Returns the UID, the UID where the Bricklet is connected to,\n\
         the position, the hardware and firmware version as well as the\n\
         device identifier.\n\
         \n\
         The position can be 'a', 'b', 'c', 'd', 'e', 'f', 'g' or 'h' (Bricklet Port).\n\
         A Bricklet connected to an :ref:`Isolator Bricklet <isolator_bricklet>` is always at\n\
         position 'z'.",
    )
}

fn comcu() -> FeatureSet {
    use Direction::{In, Out};
    use PrimitiveType::*;

    let packets = vec![
        function(
            234,
            "Get SPITFP Error Count",
            DocStyle::Advanced,
            vec![
                el("Error Count Ack Checksum", Uint32, 1, Out),
                el("Error Count Message Checksum", Uint32, 1, Out),
                el("Error Count Frame", Uint32, 1, Out),
                el("Error Count Overflow", Uint32, 1, Out),
            ],
            "Returns the error count for the communication between Brick and Bricklet.\n\
             \n\
             The errors are divided into\n\
             \n\
             * ACK checksum errors,\n\
             * message checksum errors,\n\
             * framing errors and\n\
             * overflow errors.",
        ),
        function(
            235,
            "Set Bootloader Mode",
            DocStyle::Advanced,
            vec![
                grouped(el("Mode", Uint8, 1, In), "Bootloader Mode"),
                grouped(el("Status", Uint8, 1, Out), "Bootloader Status"),
            ],
            "Sets the bootloader mode and returns the status after the requested\n\
             mode change was instigated.",
        ),
        function(
            236,
            "Get Bootloader Mode",
            DocStyle::Advanced,
            vec![grouped(el("Mode", Uint8, 1, Out), "Bootloader Mode")],
            "Returns the current bootloader mode, see :func:`Set Bootloader Mode`.",
        ),
        function(
            237,
            "Set Write Firmware Pointer",
            DocStyle::Advanced,
            vec![el("Pointer", Uint32, 1, In)],
            "Sets the firmware pointer for :func:`Write Firmware`. The pointer has\n\
             to be increased by chunks of size 64.",
        ),
        function(
            238,
            "Write Firmware",
            DocStyle::Advanced,
            vec![el("Data", Uint8, 64, In), el("Status", Uint8, 1, Out)],
            "Writes 64 Bytes of firmware at the position as written by\n\
             :func:`Set Write Firmware Pointer` before.",
        ),
        function(
            239,
            "Set Status LED Config",
            DocStyle::Advanced,
            vec![grouped(el("Config", Uint8, 1, In), "Status LED Config")],
            "Sets the status LED configuration.",
        ),
        function(
            240,
            "Get Status LED Config",
            DocStyle::Advanced,
            vec![grouped(el("Config", Uint8, 1, Out), "Status LED Config")],
            "Returns the configuration as set by :func:`Set Status LED Config`",
        ),
        function(
            242,
            "Get Chip Temperature",
            DocStyle::Advanced,
            vec![el("Temperature", Int16, 1, Out)],
            "Returns the temperature as measured inside the microcontroller.\n\
             \n\
             .. note::\n \
             This temperature is only proportional to the real temperature.",
        ),
        function(
            243,
            "Reset",
            DocStyle::Advanced,
            Vec::new(),
            "Calling this function will reset the Bricklet. All configurations\n\
             will be lost.",
        ),
        function(
            248,
            "Write UID",
            DocStyle::Advanced,
            vec![el("Uid", Uint32, 1, In)],
            "Writes a new UID into flash.",
        ),
        function(
            249,
            "Read UID",
            DocStyle::Advanced,
            vec![el("Uid", Uint32, 1, Out)],
            "Returns the current UID as an integer.",
        ),
    ];

    let constant_groups = vec![
        group(
            "Bootloader Mode",
            &[
                ("Bootloader", 0),
                ("Firmware", 1),
                ("Bootloader Wait For Reboot", 2),
                ("Firmware Wait For Reboot", 3),
                ("Firmware Wait For Erase And Reboot", 4),
            ],
        ),
        group(
            "Bootloader Status",
            &[
                ("OK", 0),
                ("Invalid Mode", 1),
                ("No Change", 2),
                ("Entry Function Not Present", 3),
                ("Device Identifier Incorrect", 4),
                ("CRC Mismatch", 5),
            ],
        ),
        group(
            "Status LED Config",
            &[("Off", 0), ("On", 1), ("Show Heartbeat", 2), ("Show Status", 3)],
        ),
    ];

    FeatureSet {
        packets,
        constant_groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Layout;

    #[test]
    fn test_comcu_packets_fit() {
        let set = expand("comcu_bricklet").expect("known feature");
        assert_eq!(set.packets.len(), 11);
        for packet in &set.packets {
            assert!(Layout::of(packet, Direction::In).fits(), "{}", packet.name);
            assert!(Layout::of(packet, Direction::Out).fits(), "{}", packet.name);
        }
        let write = set
            .packets
            .iter()
            .find(|p| p.name.space() == "Write Firmware")
            .expect("write firmware");
        assert_eq!(Layout::of(write, Direction::In).payload_size, 64);
    }

    #[test]
    fn test_identity_layout() {
        let identity = get_identity();
        let layout = Layout::of(&identity, Direction::Out);
        assert_eq!(layout.payload_size, 8 + 8 + 1 + 3 + 3 + 2);
    }

    #[test]
    fn test_unknown_feature() {
        assert!(expand("warp_drive").is_none());
    }
}
