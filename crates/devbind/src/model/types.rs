// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Enumerated vocabulary of device descriptions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive element types understood by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float,
    Bool,
    Char,
    String,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 12] = [
        PrimitiveType::Int8,
        PrimitiveType::Uint8,
        PrimitiveType::Int16,
        PrimitiveType::Uint16,
        PrimitiveType::Int32,
        PrimitiveType::Uint32,
        PrimitiveType::Int64,
        PrimitiveType::Uint64,
        PrimitiveType::Float,
        PrimitiveType::Bool,
        PrimitiveType::Char,
        PrimitiveType::String,
    ];

    /// Parse a type name as written in description files.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Int8 => "int8",
            PrimitiveType::Uint8 => "uint8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::Uint16 => "uint16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::Uint32 => "uint32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::Uint64 => "uint64",
            PrimitiveType::Float => "float",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Char => "char",
            PrimitiveType::String => "string",
        }
    }

    /// Encoded size of one item in bytes.
    ///
    /// Bool arrays are bit-packed; see [`crate::model::layout`].
    pub fn item_size(self) -> usize {
        match self {
            PrimitiveType::Int8
            | PrimitiveType::Uint8
            | PrimitiveType::Bool
            | PrimitiveType::Char
            | PrimitiveType::String => 1,
            PrimitiveType::Int16 | PrimitiveType::Uint16 => 2,
            PrimitiveType::Int32 | PrimitiveType::Uint32 | PrimitiveType::Float => 4,
            PrimitiveType::Int64 | PrimitiveType::Uint64 => 8,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveType::Int8
                | PrimitiveType::Uint8
                | PrimitiveType::Int16
                | PrimitiveType::Uint16
                | PrimitiveType::Int32
                | PrimitiveType::Uint32
                | PrimitiveType::Int64
                | PrimitiveType::Uint64
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self == PrimitiveType::Float
    }

    /// Inclusive value range of an integer type.
    pub fn integer_bounds(self) -> Option<(i128, i128)> {
        let bounds = match self {
            PrimitiveType::Int8 => (i8::MIN.into(), i8::MAX.into()),
            PrimitiveType::Uint8 => (0, u8::MAX.into()),
            PrimitiveType::Int16 => (i16::MIN.into(), i16::MAX.into()),
            PrimitiveType::Uint16 => (0, u16::MAX.into()),
            PrimitiveType::Int32 => (i32::MIN.into(), i32::MAX.into()),
            PrimitiveType::Uint32 => (0, u32::MAX.into()),
            PrimitiveType::Int64 => (i64::MIN.into(), i64::MAX.into()),
            PrimitiveType::Uint64 => (0, u64::MAX.into()),
            _ => return None,
        };
        Some(bounds)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload side an element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Request payload.
    In,
    /// Response or callback payload.
    Out,
}

impl Direction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "in" => Some(Direction::In),
            "out" => Some(Direction::Out),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketKind {
    /// Request/response exchange initiated by the client.
    Function,
    /// Unsolicited event sent by the device.
    Callback,
}

impl PacketKind {
    pub fn name(self) -> &'static str {
        match self {
            PacketKind::Function => "function",
            PacketKind::Callback => "callback",
        }
    }

    pub fn upper(self) -> &'static str {
        match self {
            PacketKind::Function => "FUNCTION",
            PacketKind::Callback => "CALLBACK",
        }
    }
}

/// Documentation style tag of a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocStyle {
    #[serde(rename = "bf")]
    Basic,
    #[serde(rename = "af")]
    Advanced,
    #[serde(rename = "ccf")]
    CallbackConfig,
    #[serde(rename = "c")]
    Callback,
    #[serde(rename = "llf")]
    LowLevel,
}

impl DocStyle {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "bf" => Some(DocStyle::Basic),
            "af" => Some(DocStyle::Advanced),
            "ccf" => Some(DocStyle::CallbackConfig),
            "c" => Some(DocStyle::Callback),
            "llf" => Some(DocStyle::LowLevel),
            _ => None,
        }
    }

    /// Functions of these styles expect a response unless told otherwise.
    pub fn expects_response(self) -> bool {
        matches!(self, DocStyle::CallbackConfig | DocStyle::LowLevel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Top-level controller.
    Brick,
    /// Peripheral attached to a controller.
    Bricklet,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::Brick => "Brick",
            Category::Bricklet => "Bricklet",
        }
    }
}

/// Three-part version number (`major.minor.patch`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(pub u8, pub u8, pub u8);

impl Version {
    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self(major, minor, patch)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self(2, 0, 0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0, self.1, self.2)
    }
}

/// Documentation language selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocLanguage {
    #[default]
    En,
    De,
}

/// Bilingual text. German falls back to English when missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub de: String,
}

impl Text {
    pub fn select(&self, lang: DocLanguage) -> &str {
        match lang {
            DocLanguage::De if !self.de.trim().is_empty() => &self.de,
            _ => &self.en,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_round_trip() {
        for ty in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::from_name(ty.name()), Some(ty));
        }
        assert_eq!(PrimitiveType::from_name("uint128"), None);
    }

    #[test]
    fn test_item_sizes() {
        assert_eq!(PrimitiveType::Uint16.item_size(), 2);
        assert_eq!(PrimitiveType::Float.item_size(), 4);
        assert_eq!(PrimitiveType::Int64.item_size(), 8);
        assert_eq!(PrimitiveType::String.item_size(), 1);
    }

    #[test]
    fn test_version_ordering() {
        assert!(Version::new(2, 0, 5) > Version::new(2, 0, 0));
        assert!(Version::new(1, 9, 9) < Version::default());
        assert_eq!(Version::new(2, 0, 6).to_string(), "2.0.6");
    }

    #[test]
    fn test_text_fallback() {
        let text = Text {
            en: "Hello".into(),
            de: "  ".into(),
        };
        assert_eq!(text.select(DocLanguage::De), "Hello");
    }
}
