// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Source Emitter.
//!
//! Produces one [`SourceUnit`] per (device, language). Fragments are emitted
//! in a fixed order:
//!
//! 1. header and imports
//! 2. class declaration with identifying constants
//! 3. function id constants
//! 4. constant group declarations
//! 5. callback declarations
//! 6. constructor (API version, response-expected table, callback registration)
//! 7. one request/response method per function
//! 8. parsing and dispatch per callback
//! 9. footer
//!
//! Nothing is written to disk here; the generator writes units only once all
//! of them rendered cleanly.

use crate::config::TypeTableConfig;
use crate::context::RunContext;
use crate::lang::{constant_name, Binding, TargetLanguage};
use crate::mapper::{map_device, MappedPacket, TypeTable};
use crate::model::{Device, PacketKind, PrimitiveType};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("{device} ({language}): member '{member}' of {second} collides with {first}")]
    NameCollision {
        device: String,
        language: TargetLanguage,
        member: String,
        /// Owner that claimed the name first, e.g. `function 'Get State'`.
        first: String,
        second: String,
    },

    #[error("{device} ({language}): {location}: type '{ty}' is not supported")]
    Unsupported {
        device: String,
        language: TargetLanguage,
        location: String,
        ty: PrimitiveType,
    },
}

/// Rendered source of one device in one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub language: TargetLanguage,
    pub device_class: String,
    pub file_name: String,
    pub contents: String,
    /// The device is released; the file goes into packages.
    pub released: bool,
}

/// Input of the per-fragment hooks of a [`Binding`].
pub struct Unit<'a> {
    pub device: &'a Device,
    pub packets: Vec<MappedPacket<'a>>,
    pub types: &'a TypeTable,
    pub run: &'a RunContext,
}

impl<'a> Unit<'a> {
    pub fn functions(&self) -> impl Iterator<Item = &MappedPacket<'a>> {
        self.packets
            .iter()
            .filter(|p| p.packet.kind == PacketKind::Function)
    }

    pub fn callbacks(&self) -> impl Iterator<Item = &MappedPacket<'a>> {
        self.packets
            .iter()
            .filter(|p| p.packet.kind == PacketKind::Callback)
    }
}

/// Generated member names of one unit and the packet or constant owning each.
struct Members<'d> {
    device: &'d Device,
    language: TargetLanguage,
    owners: BTreeMap<String, String>,
}

impl<'d> Members<'d> {
    fn new(device: &'d Device, language: TargetLanguage) -> Self {
        Self {
            device,
            language,
            owners: BTreeMap::new(),
        }
    }

    fn claim(&mut self, member: String, owner: String) -> Result<(), EmitError> {
        match self.owners.entry(member) {
            Entry::Vacant(slot) => {
                slot.insert(owner);
                Ok(())
            }
            Entry::Occupied(slot) => Err(EmitError::NameCollision {
                device: self.device.class_name(),
                language: self.language,
                member: slot.key().clone(),
                first: slot.get().clone(),
                second: owner,
            }),
        }
    }
}

pub struct SourceEmitter<'a> {
    binding: &'a dyn Binding,
    types: TypeTable,
}

impl<'a> SourceEmitter<'a> {
    pub fn new(binding: &'a dyn Binding, types: TypeTable) -> Self {
        Self { binding, types }
    }

    /// Emitter using the backend's built-in types adjusted by `config`.
    pub fn with_config(binding: &'a dyn Binding, config: Option<&TypeTableConfig>) -> Self {
        let types = match config {
            Some(config) => binding.default_types().with_config(config),
            None => binding.default_types(),
        };
        Self::new(binding, types)
    }

    pub fn language(&self) -> TargetLanguage {
        self.binding.language()
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    /// Reject devices where two generated members share one identifier.
    ///
    /// Covers function methods, callback members (legacy aliases
    /// included), `FUNCTION_*`/`CALLBACK_*` ids, constant names and the
    /// identifying class constants.
    pub fn check_collisions(&self, device: &Device, run: &RunContext) -> Result<(), EmitError> {
        let mut members = Members::new(device, self.language());

        for reserved in ["DEVICE_IDENTIFIER", "DEVICE_DISPLAY_NAME"] {
            members.claim(reserved.to_string(), "the device class".to_string())?;
        }
        for function in device.functions() {
            let owner = format!("function '{}'", function.name);
            members.claim(self.binding.function_member(function), owner)?;
        }
        for callback in device.callbacks() {
            let owner = format!("callback '{}'", callback.name);
            for member in self.binding.callback_members(device, callback, run) {
                members.claim(member, owner.clone())?;
            }
        }
        for packet in device.functions().chain(device.callbacks()) {
            members.claim(
                format!("{}_{}", packet.kind.upper(), packet.name.upper()),
                format!("{} '{}'", packet.kind.name(), packet.name),
            )?;
        }
        for group in &device.constant_groups {
            for constant in &group.constants {
                members.claim(
                    constant_name(&group.name, &constant.name),
                    format!("constant '{}' of group '{}'", constant.name, group.name),
                )?;
            }
        }
        Ok(())
    }

    /// Render `device`.
    pub fn emit(&self, device: &Device, run: &RunContext) -> Result<SourceUnit, EmitError> {
        self.check_collisions(device, run)?;

        for group in &device.constant_groups {
            if !self.types.supports(group.ty) {
                return Err(EmitError::Unsupported {
                    device: device.class_name(),
                    language: self.language(),
                    location: format!("constant group '{}'", group.name),
                    ty: group.ty,
                });
            }
        }

        let unit = Unit {
            device,
            packets: map_device(self.binding, &self.types, device)?,
            types: &self.types,
            run,
        };

        let binding = self.binding;
        let mut fragments = vec![
            binding.header(&unit),
            binding.class_open(&unit),
            binding.function_ids(&unit),
            binding.constants(&unit),
            binding.callback_decls(&unit),
            binding.constructor(&unit),
        ];
        fragments.extend(unit.functions().map(|p| binding.render_method(&unit, p)));
        fragments.extend(unit.callbacks().map(|p| binding.render_callback(&unit, p)));

        let mut contents = fragments
            .into_iter()
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        contents.push_str(&binding.footer(&unit));

        tracing::debug!(
            device = %device.class_name(),
            language = %self.language(),
            bytes = contents.len(),
            "rendered source unit"
        );

        Ok(SourceUnit {
            language: self.language(),
            device_class: device.class_name(),
            file_name: binding.file_name(device),
            contents,
            released: device.released,
        })
    }
}
