// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Language Binding Mapper.
//!
//! Maps model elements onto target-language types through a data-driven
//! [`TypeTable`]. A rule pairs the type exposed in the API with the type used
//! on the wire; when the two differ the backend emits an explicit
//! reinterpretation (cast or unsigned widening). Unsigned types without a
//! native counterpart widen to the next larger signed type.

use crate::config::TypeTableConfig;
use crate::emit::EmitError;
use crate::lang::Binding;
use crate::model::{Device, Direction, Element, Layout, Packet, PrimitiveType};
use std::collections::BTreeMap;

/// API and wire representation of one primitive type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRule {
    pub api: String,
    pub wire: String,
}

impl TypeRule {
    pub fn new(api: impl Into<String>, wire: impl Into<String>) -> Self {
        Self {
            api: api.into(),
            wire: wire.into(),
        }
    }

    /// The API type differs from the wire type and needs a conversion.
    pub fn needs_cast(&self) -> bool {
        self.api != self.wire
    }
}

/// Primitive type -> rule. A missing entry means the language cannot
/// represent the type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeTable {
    rules: BTreeMap<PrimitiveType, TypeRule>,
}

impl TypeTable {
    pub fn from_rules<'a>(rules: impl IntoIterator<Item = (PrimitiveType, &'a str, &'a str)>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|(ty, api, wire)| (ty, TypeRule::new(api, wire)))
                .collect(),
        }
    }

    /// Apply run configuration on top of the built-in rules.
    #[must_use]
    pub fn with_config(mut self, config: &TypeTableConfig) -> Self {
        for (ty, rule) in &config.overrides {
            self.rules
                .insert(*ty, TypeRule::new(rule.api.trim(), rule.wire.trim()));
        }
        for ty in &config.unsupported {
            self.rules.remove(ty);
        }
        self
    }

    pub fn rule(&self, ty: PrimitiveType) -> Option<&TypeRule> {
        self.rules.get(&ty)
    }

    pub fn supports(&self, ty: PrimitiveType) -> bool {
        self.rules.contains_key(&ty)
    }
}

/// An element resolved for one language, placed in its layout.
#[derive(Debug, Clone)]
pub struct MappedParam<'a> {
    pub element: &'a Element,
    /// Escaped parameter identifier.
    pub ident: String,
    /// Full API type, including array brackets.
    pub api_type: String,
    pub rule: TypeRule,
    /// Offset from the start of the frame.
    pub offset: usize,
    pub size: usize,
}

impl MappedParam<'_> {
    pub fn ty(&self) -> PrimitiveType {
        self.element.ty
    }

    pub fn count(&self) -> usize {
        self.element.cardinality
    }
}

/// A packet with both sides mapped.
#[derive(Debug, Clone)]
pub struct MappedPacket<'a> {
    pub packet: &'a Packet,
    pub inputs: Vec<MappedParam<'a>>,
    pub outputs: Vec<MappedParam<'a>>,
    /// Request frame length, header included.
    pub request_size: usize,
    /// Response frame length, header included. 0 when nothing is returned.
    pub response_size: usize,
}

/// Resolve every packet of `device` for `binding`.
///
/// Fails with [`EmitError::Unsupported`] on the first element whose type has
/// no rule, or whose wire type the backend cannot read.
pub fn map_device<'a>(
    binding: &dyn Binding,
    table: &TypeTable,
    device: &'a Device,
) -> Result<Vec<MappedPacket<'a>>, EmitError> {
    device
        .packets
        .iter()
        .map(|packet| map_packet(binding, table, device, packet))
        .collect()
}

pub fn map_packet<'a>(
    binding: &dyn Binding,
    table: &TypeTable,
    device: &Device,
    packet: &'a Packet,
) -> Result<MappedPacket<'a>, EmitError> {
    let side = |direction: Direction| -> Result<(Vec<MappedParam<'a>>, usize), EmitError> {
        let layout = Layout::of(packet, direction);
        let params = layout
            .fields
            .iter()
            .map(|slot| -> Result<MappedParam<'a>, EmitError> {
                let element = slot.element;
                let rule = table
                    .rule(element.ty)
                    .filter(|rule| binding.supports_wire(&rule.wire))
                    .ok_or_else(|| EmitError::Unsupported {
                        device: device.class_name(),
                        language: binding.language(),
                        location: format!("packet '{}', element '{}'", packet.name, element.name),
                        ty: element.ty,
                    })?;
                Ok(MappedParam {
                    element,
                    ident: binding.param_name(&element.name),
                    api_type: binding.render_type(rule, element),
                    rule: rule.clone(),
                    offset: slot.offset,
                    size: slot.size,
                })
            })
            .collect::<Result<Vec<_>, EmitError>>()?;
        Ok((params, layout.frame_size()))
    };

    let (inputs, request_size) = side(Direction::In)?;
    let (outputs, response_size) = side(Direction::Out)?;
    let response_size = if outputs.is_empty() { 0 } else { response_size };

    Ok(MappedPacket {
        packet,
        inputs,
        outputs,
        request_size,
        response_size,
    })
}
