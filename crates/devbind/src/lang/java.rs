// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Java backend.
//!
//! Payloads are encoded with absolute-index `ByteBuffer` accessors in
//! little-endian order. Java has no unsigned integers, so unsigned wire values
//! are masked and widened into the next larger signed type on read and
//! narrowed back on write.

use super::{
    banner, char_literal, constant_name, indented, item_offset, response_flag, string_literal,
    Binding, TargetLanguage,
};
use crate::doc::DocSyntax;
use crate::context::RunContext;
use crate::emit::Unit;
use crate::mapper::{MappedPacket, MappedParam, TypeTable};
use crate::model::{Device, Packet, PacketKind, PrimitiveType};
use crate::naming::Name;

pub struct Java;

const KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class",
    "const", "continue", "default", "do", "double", "else", "enum", "extends", "false", "final",
    "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
    "interface", "long", "native", "new", "null", "package", "private", "protected", "public",
    "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this", "throw",
    "throws", "transient", "true", "try", "void", "volatile", "while",
];

/// Wire type -> `ByteBuffer` accessor suffix (`get`/`getShort`/...).
fn accessor(wire: &str) -> Option<&'static str> {
    Some(match wire {
        "byte" => "",
        "short" => "Short",
        "int" => "Int",
        "long" => "Long",
        "float" => "Float",
        "String" => "",
        _ => return None,
    })
}

/// Mask keeping the unsigned value of a `wire` reinterpretation.
fn unsigned_mask(wire: &str) -> Option<&'static str> {
    match wire {
        "byte" => Some("0xFF"),
        "short" => Some("0xFFFF"),
        "int" => Some("0xFFFFFFFFL"),
        _ => None,
    }
}

const MEMBER: &str = "\t";
const BODY: &str = "\t\t";

impl Java {
    fn class(&self, device: &Device) -> String {
        device.class_name()
    }

    fn package(&self, namespace: &str) -> String {
        format!("com.{}", namespace.to_ascii_lowercase())
    }

    /// Expression reading one item of `p` at `offset`.
    fn read_item(&self, p: &MappedParam<'_>, offset: &str) -> String {
        let wire = &p.rule.wire;
        let api = &p.rule.api;
        let raw = format!("bb.get{}({offset})", accessor(wire).unwrap_or(""));
        match p.ty() {
            PrimitiveType::Bool => format!("{raw} != 0"),
            PrimitiveType::Char if p.rule.needs_cast() => format!("({api})({raw} & 0xFF)"),
            ty if p.rule.needs_cast() && is_unsigned(ty) => match unsigned_mask(wire) {
                Some(mask) => format!("({api})({raw} & {mask})"),
                None => format!("({api}){raw}"),
            },
            _ if p.rule.needs_cast() => format!("({api}){raw}"),
            _ => raw,
        }
    }

    /// Statement writing `value` as one item of `p` at `offset`.
    fn write_item(&self, p: &MappedParam<'_>, offset: &str, value: &str) -> String {
        let wire = &p.rule.wire;
        let value = match p.ty() {
            PrimitiveType::Bool => format!("(byte)({value} ? 1 : 0)"),
            _ if p.rule.needs_cast() => format!("({wire}){value}"),
            _ => value.to_string(),
        };
        format!("bb.put{}({offset}, {value});", accessor(wire).unwrap_or(""))
    }

    fn write_param(&self, p: &MappedParam<'_>) -> Vec<String> {
        let ident = &p.ident;
        if p.ty() == PrimitiveType::String {
            return vec![format!(
                "Device.putString(bb, {}, {}, {ident});",
                p.offset,
                p.count()
            )];
        }
        if p.element.is_bool_array() {
            return vec![
                format!("byte[] {ident}Bits = new byte[{}];", p.size),
                format!("for (int i = 0; i < {}; i++) {{", p.count()),
                format!("\tif ({ident}[i]) {{"),
                format!("\t\t{ident}Bits[i / 8] |= (byte)(1 << (i % 8));"),
                "\t}".into(),
                "}".into(),
                format!("for (int i = 0; i < {}; i++) {{", p.size),
                format!("\tbb.put({} + i, {ident}Bits[i]);", p.offset),
                "}".into(),
            ];
        }
        if p.element.is_array() {
            let offset = item_offset(p.offset, p.ty().item_size(), "i");
            return vec![
                format!("for (int i = 0; i < {}; i++) {{", p.count()),
                format!("\t{}", self.write_item(p, &offset, &format!("{ident}[i]"))),
                "}".into(),
            ];
        }
        vec![self.write_item(p, &p.offset.to_string(), ident)]
    }

    fn read_param(&self, p: &MappedParam<'_>, target: &str, declare: bool) -> Vec<String> {
        let lhs = if declare {
            format!("{} {target}", p.api_type)
        } else {
            target.to_string()
        };
        if p.ty() == PrimitiveType::String {
            return vec![format!(
                "{lhs} = Device.getString(bb, {}, {});",
                p.offset,
                p.count()
            )];
        }
        if p.element.is_bool_array() {
            return vec![
                format!("{lhs} = new boolean[{}];", p.count()),
                format!("for (int i = 0; i < {}; i++) {{", p.count()),
                format!(
                    "\t{target}[i] = (bb.get({} + i / 8) & (1 << (i % 8))) != 0;",
                    p.offset
                ),
                "}".into(),
            ];
        }
        if p.element.is_array() {
            let offset = item_offset(p.offset, p.ty().item_size(), "i");
            return vec![
                format!("{lhs} = new {}[{}];", p.rule.api, p.count()),
                format!("for (int i = 0; i < {}; i++) {{", p.count()),
                format!("\t{target}[i] = {};", self.read_item(p, &offset)),
                "}".into(),
            ];
        }
        vec![format!(
            "{lhs} = {};",
            self.read_item(p, &p.offset.to_string())
        )]
    }

    fn return_class(&self, packet: &MappedPacket<'_>) -> String {
        format!("{}Return", packet.packet.name.camel())
    }

    fn simple_doc(&self, lines: &[&str], indent: &str) -> String {
        let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        self.doc_comment(&lines, indent)
    }
}

fn is_unsigned(ty: PrimitiveType) -> bool {
    matches!(
        ty,
        PrimitiveType::Uint8 | PrimitiveType::Uint16 | PrimitiveType::Uint32 | PrimitiveType::Uint64
    )
}

impl DocSyntax for Java {
    fn escape(&self, text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace("*/", "*&#47;")
            .replace('@', "&#64;")
    }

    fn link(&self, device: &Device, packet: &Packet) -> String {
        match packet.kind {
            PacketKind::Function => format!(
                "{{@link {}#{}}}",
                device.class_name(),
                self.function_member(packet)
            ),
            PacketKind::Callback => format!(
                "{{@link {}.{}Listener}}",
                device.class_name(),
                packet.name.camel()
            ),
        }
    }

    fn param(&self, name: &Name) -> String {
        format!("{{@code {}}}", self.param_name(name))
    }

    fn constant(&self, device: &Device, group: &Name, constant: &Name) -> String {
        format!(
            "{{@link {}#{}}}",
            device.class_name(),
            constant_name(group, constant)
        )
    }

    fn note(&self, body: &[String], warning: bool) -> Vec<String> {
        let label = if warning { "Warning" } else { "Note" };
        let mut out = vec![format!("<p><b>{label}:</b>")];
        out.extend(body.iter().cloned());
        out.push("</p>".into());
        out
    }

    fn table(&self, header: &[String], rows: &[Vec<String>]) -> Vec<String> {
        let row = |tag: &str, cells: &[String]| -> String {
            let cells: String = cells
                .iter()
                .map(|c| format!("<{tag}>{c}</{tag}>"))
                .collect();
            format!(" <tr>{cells}</tr>")
        };
        let mut out = vec!["<table>".to_string()];
        if !header.is_empty() {
            out.push(row("th", header));
        }
        out.extend(rows.iter().map(|r| row("td", r)));
        out.push("</table>".into());
        out
    }

    fn list(&self, items: &[String]) -> Vec<String> {
        let mut out = vec!["<ul>".to_string()];
        out.extend(items.iter().map(|item| format!(" <li>{item}</li>")));
        out.push("</ul>".into());
        out
    }

    fn paragraph(&self, lines: &[String]) -> Vec<String> {
        let mut out = lines.to_vec();
        if let Some(first) = out.first_mut() {
            first.insert_str(0, "<p>");
        }
        out
    }
}

impl Binding for Java {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::Java
    }

    fn default_types(&self) -> TypeTable {
        use PrimitiveType as T;
        TypeTable::from_rules([
            (T::Int8, "byte", "byte"),
            (T::Uint8, "short", "byte"),
            (T::Int16, "short", "short"),
            (T::Uint16, "int", "short"),
            (T::Int32, "int", "int"),
            (T::Uint32, "long", "int"),
            (T::Int64, "long", "long"),
            (T::Uint64, "long", "long"),
            (T::Float, "float", "float"),
            (T::Bool, "boolean", "byte"),
            (T::Char, "char", "byte"),
            (T::String, "String", "String"),
        ])
    }

    fn supports_wire(&self, wire: &str) -> bool {
        accessor(wire).is_some()
    }

    fn keywords(&self) -> &'static [&'static str] {
        KEYWORDS
    }

    fn escape_keyword(&self, ident: &str) -> String {
        format!("{ident}_")
    }

    fn function_member(&self, packet: &Packet) -> String {
        packet.name.headless()
    }

    fn callback_members(
        &self,
        _device: &Device,
        packet: &Packet,
        _run: &RunContext,
    ) -> Vec<String> {
        let camel = packet.name.camel();
        vec![
            format!("add{camel}Listener"),
            format!("remove{camel}Listener"),
            format!("{camel}Listener"),
            format!("listener{camel}"),
            format!("handle{camel}"),
        ]
    }

    fn doc_syntax(&self) -> &dyn DocSyntax {
        self
    }

    fn doc_comment(&self, lines: &[String], indent: &str) -> String {
        let mut out = format!("{indent}/**\n");
        for line in lines {
            if line.is_empty() {
                out.push_str(&format!("{indent} *\n"));
            } else {
                out.push_str(&format!("{indent} * {line}\n"));
            }
        }
        out.push_str(&format!("{indent} */\n"));
        out
    }

    fn header(&self, unit: &Unit<'_>) -> String {
        let mut out = banner("Java", unit.run.bindings_version);
        out.push_str(&format!("\npackage {};\n\n", self.package(&unit.run.namespace)));
        out.push_str("import java.nio.ByteBuffer;\nimport java.nio.ByteOrder;\n");
        if unit.callbacks().next().is_some() {
            out.push_str("import java.util.List;\nimport java.util.concurrent.CopyOnWriteArrayList;\n");
        }
        out
    }

    fn class_open(&self, unit: &Unit<'_>) -> String {
        let device = unit.device;
        let description: Vec<String> = device
            .description
            .select(unit.run.doc_language)
            .lines()
            .map(|l| self.escape(l.trim()))
            .collect();

        let mut out = self.doc_comment(&description, "");
        out.push_str(&format!("public class {} extends Device {{\n", self.class(device)));
        out.push_str(&indented(
            &[
                format!("public final static int DEVICE_IDENTIFIER = {};", device.identifier),
                format!(
                    "public final static String DEVICE_DISPLAY_NAME = {};",
                    string_literal(&device.long_display_name())
                ),
            ],
            MEMBER,
        ));
        out
    }

    fn function_ids(&self, unit: &Unit<'_>) -> String {
        let lines: Vec<String> = unit
            .functions()
            .chain(unit.callbacks())
            .map(|p| {
                format!(
                    "public final static byte {}_{} = (byte){};",
                    p.packet.kind.upper(),
                    p.packet.name.upper(),
                    p.packet.function_id
                )
            })
            .collect();
        indented(&lines, MEMBER)
    }

    fn constants(&self, unit: &Unit<'_>) -> String {
        let mut lines = Vec::new();
        for group in &unit.device.constant_groups {
            let Some(rule) = unit.types.rule(group.ty) else {
                continue;
            };
            for constant in &group.constants {
                let value = match group.ty {
                    PrimitiveType::Char => char_literal(constant.value),
                    _ if rule.api == "long" => format!("{}L", constant.value),
                    _ if rule.api == "int" => constant.value.to_string(),
                    _ => format!("({}){}", rule.api, constant.value),
                };
                lines.push(format!(
                    "public final static {} {} = {};",
                    rule.api,
                    constant_name(&group.name, &constant.name),
                    value
                ));
            }
        }
        indented(&lines, MEMBER)
    }

    fn callback_decls(&self, unit: &Unit<'_>) -> String {
        let mut blocks = Vec::new();
        for callback in unit.callbacks() {
            let camel = callback.packet.name.camel();
            let params: Vec<String> = callback
                .outputs
                .iter()
                .map(|p| format!("{} {}", p.api_type, p.ident))
                .collect();

            let mut block = format!(
                "{MEMBER}private List<{camel}Listener> listener{camel} = new CopyOnWriteArrayList<{camel}Listener>();\n\n"
            );
            block.push_str(&self.render_doc(unit, callback.packet, MEMBER));
            block.push_str(&indented(
                &[
                    format!("public interface {camel}Listener extends DeviceListener {{"),
                    format!(
                        "\tpublic void {}({});",
                        callback.packet.name.headless(),
                        params.join(", ")
                    ),
                    "}".into(),
                ],
                MEMBER,
            ));
            blocks.push(block);
        }
        blocks.join("\n")
    }

    fn constructor(&self, unit: &Unit<'_>) -> String {
        let device = unit.device;
        let version = device.api_version;

        let mut body = vec![
            "super(uid, ipcon, DEVICE_IDENTIFIER, DEVICE_DISPLAY_NAME);".to_string(),
            String::new(),
            format!("apiVersion[0] = {};", version.0),
            format!("apiVersion[1] = {};", version.1),
            format!("apiVersion[2] = {};", version.2),
            String::new(),
        ];
        for p in unit.functions().chain(unit.callbacks()) {
            body.push(format!(
                "responseExpected[{}_{} & 0xFF] = RESPONSE_EXPECTED_FLAG_{};",
                p.packet.kind.upper(),
                p.packet.name.upper(),
                response_flag(p.packet.response_expected())
            ));
        }
        if unit.callbacks().next().is_some() {
            body.push(String::new());
        }
        for p in unit.callbacks() {
            body.push(format!(
                "callbacks[CALLBACK_{} & 0xFF] = this::handle{};",
                p.packet.name.upper(),
                p.packet.name.camel()
            ));
        }
        body.push(String::new());
        body.push("ipcon.addDevice(this);".into());

        let mut out = self.simple_doc(
            &[
                "Creates an object with the unique device ID {@code uid} and adds it to",
                "the IP Connection {@code ipcon}.",
            ],
            MEMBER,
        );
        out.push_str(&format!(
            "{MEMBER}public {}(String uid, IPConnection ipcon) {{\n",
            self.class(device)
        ));
        out.push_str(&indented(&body, BODY));
        out.push_str(&format!("{MEMBER}}}\n"));
        out
    }

    fn render_method(&self, unit: &Unit<'_>, packet: &MappedPacket<'_>) -> String {
        let name = &packet.packet.name;
        let outputs = &packet.outputs;
        let return_type = match outputs.len() {
            0 => "void".to_string(),
            1 => outputs[0].api_type.clone(),
            _ => self.return_class(packet),
        };

        let mut out = String::new();
        if outputs.len() > 1 {
            let mut fields: Vec<String> = vec![format!("public class {} {{", return_type)];
            fields.extend(
                outputs
                    .iter()
                    .map(|p| format!("\tpublic {} {};", p.api_type, p.ident)),
            );
            fields.push("}".into());
            out.push_str(&indented(&fields, MEMBER));
            out.push('\n');
        }

        let params: Vec<String> = packet
            .inputs
            .iter()
            .map(|p| format!("{} {}", p.api_type, p.ident))
            .collect();

        let mut body = vec![format!(
            "ByteBuffer bb = ipcon.createRequestPacket((byte){}, FUNCTION_{}, this);",
            packet.request_size,
            name.upper()
        )];
        if !packet.inputs.is_empty() {
            body.push(String::new());
            for p in &packet.inputs {
                body.extend(self.write_param(p));
            }
        }
        body.push(String::new());
        if outputs.is_empty() {
            body.push("sendRequest(bb.array(), 0);".into());
        } else {
            body.push(format!(
                "byte[] response = sendRequest(bb.array(), {});",
                packet.response_size
            ));
            body.push("bb = ByteBuffer.wrap(response);".into());
            body.push("bb.order(ByteOrder.LITTLE_ENDIAN);".into());
            body.push(String::new());
            if outputs.len() == 1 {
                body.extend(self.read_param(&outputs[0], &outputs[0].ident, true));
                body.push(String::new());
                body.push(format!("return {};", outputs[0].ident));
            } else {
                body.push(format!("{return_type} obj = new {return_type}();"));
                for p in outputs {
                    body.extend(self.read_param(p, &format!("obj.{}", p.ident), false));
                }
                body.push(String::new());
                body.push("return obj;".into());
            }
        }

        out.push_str(&self.render_doc(unit, packet.packet, MEMBER));
        out.push_str(&format!(
            "{MEMBER}public {return_type} {}({}) throws TinkerforgeException {{\n",
            self.function_member(packet.packet),
            params.join(", ")
        ));
        out.push_str(&indented(&body, BODY));
        out.push_str(&format!("{MEMBER}}}\n"));
        out
    }

    fn render_callback(&self, _unit: &Unit<'_>, packet: &MappedPacket<'_>) -> String {
        let camel = packet.packet.name.camel();
        let mut body = vec![
            "ByteBuffer bb = ByteBuffer.wrap(packet);".to_string(),
            "bb.order(ByteOrder.LITTLE_ENDIAN);".to_string(),
            String::new(),
        ];
        for p in &packet.outputs {
            body.extend(self.read_param(p, &p.ident, true));
        }
        if !packet.outputs.is_empty() {
            body.push(String::new());
        }
        let args: Vec<&str> = packet.outputs.iter().map(|p| p.ident.as_str()).collect();
        body.extend([
            format!("for ({camel}Listener listener: listener{camel}) {{"),
            format!(
                "\tlistener.{}({});",
                packet.packet.name.headless(),
                args.join(", ")
            ),
            "}".into(),
        ]);

        let mut out = format!("{MEMBER}private void handle{camel}(byte[] packet) {{\n");
        out.push_str(&indented(&body, BODY));
        out.push_str(&format!("{MEMBER}}}\n\n"));

        out.push_str(&self.simple_doc(
            &[format!("Adds a {camel} listener.").as_str()],
            MEMBER,
        ));
        out.push_str(&format!(
            "{MEMBER}public void add{camel}Listener({camel}Listener listener) {{\n{BODY}listener{camel}.add(listener);\n{MEMBER}}}\n\n"
        ));
        out.push_str(&self.simple_doc(
            &[format!("Removes a {camel} listener.").as_str()],
            MEMBER,
        ));
        out.push_str(&format!(
            "{MEMBER}public void remove{camel}Listener({camel}Listener listener) {{\n{BODY}listener{camel}.remove(listener);\n{MEMBER}}}\n"
        ));
        out
    }

    fn footer(&self, _unit: &Unit<'_>) -> String {
        "}\n".to_string()
    }
}
