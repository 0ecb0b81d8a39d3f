// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Target language backends.
//!
//! Each backend implements [`Binding`], the capability set the
//! [`SourceEmitter`](crate::emit::SourceEmitter) drives: type rendering,
//! naming, documentation and one hook per source fragment.

mod csharp;
mod java;

pub use csharp::CSharp;
pub use java::Java;

use crate::doc::{self, DocSyntax};
use crate::context::RunContext;
use crate::emit::Unit;
use crate::mapper::{MappedPacket, TypeRule, TypeTable};
use crate::model::{Device, Element, Packet, ResponseExpected, Version};
use crate::naming::Name;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TargetLanguage {
    #[serde(rename = "csharp")]
    CSharp,
    #[serde(rename = "java")]
    Java,
}

impl TargetLanguage {
    pub const ALL: [TargetLanguage; 2] = [TargetLanguage::CSharp, TargetLanguage::Java];

    pub fn name(self) -> &'static str {
        match self {
            TargetLanguage::CSharp => "csharp",
            TargetLanguage::Java => "java",
        }
    }

    /// Source file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            TargetLanguage::CSharp => "cs",
            TargetLanguage::Java => "java",
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csharp" | "c#" | "cs" => Ok(TargetLanguage::CSharp),
            "java" => Ok(TargetLanguage::Java),
            other => Err(format!("unknown language '{other}' (expected csharp or java)")),
        }
    }
}

/// Backend for `language`.
pub fn binding_for(language: TargetLanguage) -> Box<dyn Binding> {
    match language {
        TargetLanguage::CSharp => Box::new(CSharp),
        TargetLanguage::Java => Box::new(Java),
    }
}

/// Everything the emitter needs from a target language.
pub trait Binding {
    fn language(&self) -> TargetLanguage;

    /// Built-in type table, before run configuration is applied.
    fn default_types(&self) -> TypeTable;

    /// Whether the generated code knows how to read and write `wire`.
    fn supports_wire(&self, wire: &str) -> bool;

    /// Reserved words of the language.
    fn keywords(&self) -> &'static [&'static str];

    /// Make a reserved word usable as an identifier.
    fn escape_keyword(&self, ident: &str) -> String;

    /// Identifier of a parameter or field.
    fn param_name(&self, name: &Name) -> String {
        let ident = name.headless();
        if self.keywords().contains(&ident.as_str()) {
            self.escape_keyword(&ident)
        } else {
            ident
        }
    }

    /// API type of an element, including array brackets.
    fn render_type(&self, rule: &TypeRule, element: &Element) -> String {
        if element.is_array() {
            format!("{}[]", rule.api)
        } else {
            rule.api.clone()
        }
    }

    /// Member name of the method generated for a function.
    fn function_member(&self, packet: &Packet) -> String;

    /// Member names generated for a callback, legacy aliases included.
    fn callback_members(
        &self,
        device: &Device,
        packet: &Packet,
        run: &RunContext,
    ) -> Vec<String>;

    fn doc_syntax(&self) -> &dyn DocSyntax;

    /// Wrap rendered doc lines into a comment block at `indent`.
    fn doc_comment(&self, lines: &[String], indent: &str) -> String;

    /// Complete doc comment of a packet.
    fn render_doc(&self, unit: &Unit<'_>, packet: &Packet, indent: &str) -> String {
        let lines = doc::render(self.doc_syntax(), unit.device, packet, unit.run.doc_language);
        self.doc_comment(&lines, indent)
    }

    /// `BrickletEVSE.cs`
    fn file_name(&self, device: &Device) -> String {
        format!("{}.{}", device.class_name(), self.language().extension())
    }

    fn header(&self, unit: &Unit<'_>) -> String;

    /// Class declaration with the identifying constants.
    fn class_open(&self, unit: &Unit<'_>) -> String;

    fn function_ids(&self, unit: &Unit<'_>) -> String;

    fn constants(&self, unit: &Unit<'_>) -> String;

    fn callback_decls(&self, unit: &Unit<'_>) -> String;

    fn constructor(&self, unit: &Unit<'_>) -> String;

    /// Request building and response parsing of one function.
    fn render_method(&self, unit: &Unit<'_>, packet: &MappedPacket<'_>) -> String;

    /// Parsing and dispatch of one callback.
    fn render_callback(&self, unit: &Unit<'_>, packet: &MappedPacket<'_>) -> String;

    fn footer(&self, unit: &Unit<'_>) -> String;
}

/// Offset expression of item `index_var` of an array starting at `offset`.
pub(crate) fn item_offset(offset: usize, item_size: usize, index_var: &str) -> String {
    match item_size {
        1 => format!("{offset} + {index_var}"),
        n => format!("{offset} + {index_var} * {n}"),
    }
}

/// Generated-file banner. Carries no timestamp so reruns are byte-identical.
pub(crate) fn banner(language_label: &str, version: Version) -> String {
    let lines = [
        "This file was automatically generated by devbind.".to_string(),
        String::new(),
        format!("{language_label} Bindings Version {version}"),
        String::new(),
        "If you have a bugfix for this file and want to commit it,".to_string(),
        "please fix the bug in the generator instead.".to_string(),
    ];
    let mut out = format!("/* {}\n", "*".repeat(59));
    for line in &lines {
        out.push_str(&format!(" * {line:<57} *\n"));
    }
    out.push_str(&format!(" {}/\n", "*".repeat(60)));
    out
}

/// Prefix every non-empty line with `indent`; each line ends with a newline.
pub(crate) fn indented<S: AsRef<str>>(lines: &[S], indent: &str) -> String {
    let mut out = String::new();
    for line in lines {
        let line = line.as_ref();
        if !line.is_empty() {
            out.push_str(indent);
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

pub(crate) fn response_flag(expected: ResponseExpected) -> &'static str {
    match expected {
        ResponseExpected::AlwaysTrue => "ALWAYS_TRUE",
        ResponseExpected::AlwaysFalse => "ALWAYS_FALSE",
        ResponseExpected::True => "TRUE",
        ResponseExpected::False => "FALSE",
    }
}

/// Quoted string literal valid in both C# and Java.
pub(crate) fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Character literal of a char constant value.
pub(crate) fn char_literal(value: i64) -> String {
    let c = u32::try_from(value)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or('\0');
    match c {
        '\'' => "'\\''".to_string(),
        '\\' => "'\\\\'".to_string(),
        '\0' => "'\\0'".to_string(),
        c => format!("'{c}'"),
    }
}

/// Name of the constant generated for `constant` of `group`.
pub(crate) fn constant_name(group: &Name, constant: &Name) -> String {
    format!("{}_{}", group.upper(), constant.upper())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_str() {
        assert_eq!("CSharp".parse::<TargetLanguage>(), Ok(TargetLanguage::CSharp));
        assert_eq!("java".parse::<TargetLanguage>(), Ok(TargetLanguage::Java));
        assert!("rust".parse::<TargetLanguage>().is_err());
    }

    #[test]
    fn test_keyword_escaping() {
        let name = Name::new("Default");
        assert_eq!(CSharp.param_name(&name), "@default");
        assert_eq!(Java.param_name(&name), "default_");
        assert_eq!(Java.param_name(&Name::new("Mode")), "mode");
    }
}
