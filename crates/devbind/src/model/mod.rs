// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Device Description Model.
//!
//! A [`Device`] owns its [`Packet`]s and [`ConstantGroup`]s; a packet owns its
//! [`Element`]s. The graph is built once by [`Device::from_yaml`], validated on
//! the way in, and never mutated afterwards.
//!
//! ```text
//! Device ──┬── ConstantGroup[] ── Constant[]
//!          └── Packet[] ── Element[] ──(constant_group)──> ConstantGroup
//! ```

mod features;
pub mod layout;
mod load;
mod types;

use crate::naming::Name;
use thiserror::Error;

pub use layout::{pack_bools, unpack_bools, FieldSlot, Layout, FRAME_HEADER_SIZE, MAX_PAYLOAD_SIZE};
pub use types::{
    Category, Direction, DocLanguage, DocStyle, PacketKind, PrimitiveType, Text, Version,
};

/// Validation failures while building a [`Device`].
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{origin}: YAML parse error: {error}")]
    Parse {
        origin: String,
        #[source]
        error: serde_yaml::Error,
    },

    #[error("I/O error reading {origin}: {error}")]
    Io {
        origin: String,
        #[source]
        error: std::io::Error,
    },

    #[error("{device}: function id {function_id} is used by both '{first}' and '{second}'")]
    DuplicateFunctionId {
        device: String,
        function_id: u8,
        first: String,
        second: String,
    },

    #[error(
        "{device}: packet '{packet}': {direction:?} payload is {size} bytes, limit is {limit}"
    )]
    PayloadTooLarge {
        device: String,
        packet: String,
        direction: Direction,
        size: usize,
        limit: usize,
    },

    #[error("{device}: {message}")]
    Invalid { device: String, message: String },
}

/// Rational factor: `raw * num / den` is the physical quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    pub num: u64,
    pub den: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: Name,
    pub ty: PrimitiveType,
    /// 1 for scalars, item count for arrays, fixed length for strings.
    pub cardinality: usize,
    pub direction: Direction,
    pub constant_group: Option<Name>,
    pub scale: Option<Scale>,
    pub unit: Option<String>,
    pub range: Option<(f64, f64)>,
}

impl Element {
    /// True for fixed-length arrays. Strings are scalar text of fixed length.
    pub fn is_array(&self) -> bool {
        self.cardinality > 1 && self.ty != PrimitiveType::String
    }

    pub fn is_bool_array(&self) -> bool {
        self.is_array() && self.ty == PrimitiveType::Bool
    }

    /// Encoded size in bytes.
    pub fn wire_size(&self) -> usize {
        if self.is_bool_array() {
            self.cardinality.div_ceil(8)
        } else {
            self.cardinality.saturating_mul(self.ty.item_size())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PacketDoc {
    pub style: DocStyle,
    pub text: Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub name: Name,
    pub kind: PacketKind,
    pub function_id: u8,
    pub elements: Vec<Element>,
    pub since_firmware: Version,
    pub doc: PacketDoc,
}

impl Packet {
    pub fn elements(&self, direction: Direction) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(move |e| e.direction == direction)
    }

    pub fn has_elements(&self, direction: Direction) -> bool {
        self.elements(direction).next().is_some()
    }

    /// Wire layout of one side of this packet.
    pub fn layout(&self, direction: Direction) -> Layout<'_> {
        Layout::of(self, direction)
    }

    /// Whether the generated binding waits for a response by default.
    pub fn response_expected(&self) -> ResponseExpected {
        match self.kind {
            PacketKind::Callback => ResponseExpected::AlwaysFalse,
            PacketKind::Function if self.has_elements(Direction::Out) => {
                ResponseExpected::AlwaysTrue
            }
            PacketKind::Function if self.doc.style.expects_response() => ResponseExpected::True,
            PacketKind::Function => ResponseExpected::False,
        }
    }
}

/// Default response-expected flag of a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseExpected {
    AlwaysTrue,
    AlwaysFalse,
    True,
    False,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant {
    pub name: Name,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantGroup {
    pub name: Name,
    pub ty: PrimitiveType,
    pub constants: Vec<Constant>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub identifier: u32,
    pub name: Name,
    pub display_name: String,
    pub category: Category,
    pub author: String,
    pub manufacturer: String,
    pub description: Text,
    pub api_version: Version,
    pub firmware_floor: Version,
    pub released: bool,
    pub features: Vec<String>,
    pub packets: Vec<Packet>,
    pub constant_groups: Vec<ConstantGroup>,
}

impl Device {
    /// `BrickletEVSE`
    pub fn class_name(&self) -> String {
        format!("{}{}", self.category.name(), self.name.camel())
    }

    /// "EVSE Bricklet"
    pub fn long_display_name(&self) -> String {
        format!("{} {}", self.display_name, self.category.name())
    }

    pub fn packets(&self, kind: PacketKind) -> impl Iterator<Item = &Packet> {
        self.packets.iter().filter(move |p| p.kind == kind)
    }

    pub fn functions(&self) -> impl Iterator<Item = &Packet> {
        self.packets(PacketKind::Function)
    }

    pub fn callbacks(&self) -> impl Iterator<Item = &Packet> {
        self.packets(PacketKind::Callback)
    }

    /// Look up a packet by display name, optionally restricted to one kind.
    pub fn packet(&self, name: &str, kind: Option<PacketKind>) -> Option<&Packet> {
        self.packets
            .iter()
            .find(|p| p.name.space() == name && kind.map_or(true, |k| p.kind == k))
    }

    pub fn constant_group(&self, name: &Name) -> Option<&ConstantGroup> {
        self.constant_groups.iter().find(|g| &g.name == name)
    }
}
