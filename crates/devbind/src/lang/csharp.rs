// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! C# backend.
//!
//! Generated classes derive from the runtime's `Device` and encode payloads
//! with `LEConverter`, which reads and writes little-endian values at frame
//! offsets. Unsigned types the API does not expose natively widen to the next
//! larger signed type and are cast at the wire boundary.

use super::{
    banner, char_literal, constant_name, indented, response_flag, string_literal, Binding,
    TargetLanguage,
};
use crate::doc::DocSyntax;
use crate::context::RunContext;
use crate::emit::Unit;
use crate::mapper::{MappedPacket, MappedParam, TypeTable};
use crate::model::{Device, Packet, PacketKind, PrimitiveType};
use crate::naming::Name;

pub struct CSharp;

const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Wire type -> `LEConverter` method stem.
fn converter(wire: &str) -> Option<&'static str> {
    Some(match wire {
        "sbyte" => "SByte",
        "byte" => "Byte",
        "short" => "Short",
        "ushort" => "UShort",
        "int" => "Int",
        "uint" => "UInt",
        "long" => "Long",
        "ulong" => "ULong",
        "float" => "Float",
        "bool" => "Bool",
        "char" => "Char",
        "string" => "String",
        _ => return None,
    })
}

const MEMBER: &str = "\t\t";
const BODY: &str = "\t\t\t";

impl CSharp {
    fn class(&self, device: &Device) -> String {
        device.class_name()
    }

    fn write_param(&self, p: &MappedParam<'_>) -> Vec<String> {
        let ident = &p.ident;
        let wire = &p.rule.wire;
        if p.ty() == PrimitiveType::String {
            return vec![format!(
                "LEConverter.To({ident}, {}, {}, request);",
                p.offset,
                p.count()
            )];
        }
        if p.element.is_bool_array() {
            return vec![
                format!("byte[] {ident}Bits = new byte[{}];", p.size),
                format!("for (int i = 0; i < {}; i++)", p.count()),
                "{".into(),
                format!("\tif ({ident}[i])"),
                "\t{".into(),
                format!("\t\t{ident}Bits[i / 8] |= (byte)(1 << (i % 8));"),
                "\t}".into(),
                "}".into(),
                format!("LEConverter.To({ident}Bits, {}, {}, request);", p.offset, p.size),
            ];
        }
        if p.element.is_array() {
            let value = if p.rule.needs_cast() {
                format!("Array.ConvertAll({ident}, i => ({wire})i)")
            } else {
                ident.clone()
            };
            return vec![format!(
                "LEConverter.To({value}, {}, {}, request);",
                p.offset,
                p.count()
            )];
        }
        let value = if p.rule.needs_cast() {
            format!("({wire}){ident}")
        } else {
            ident.clone()
        };
        vec![format!("LEConverter.To({value}, {}, request);", p.offset)]
    }

    /// Statements reading `p` from `source` into `target`. With `declare` the
    /// target is declared as a local.
    fn read_param(&self, p: &MappedParam<'_>, source: &str, target: &str, declare: bool) -> Vec<String> {
        let lhs = if declare {
            format!("{} {target}", p.api_type)
        } else {
            target.to_string()
        };
        let conv = converter(&p.rule.wire).unwrap_or("Byte");
        let api = &p.rule.api;

        if p.ty() == PrimitiveType::String {
            return vec![format!(
                "{lhs} = LEConverter.StringFrom({}, {source}, {});",
                p.offset,
                p.count()
            )];
        }
        if p.element.is_bool_array() {
            return vec![
                format!(
                    "byte[] {}Bits = LEConverter.ByteArrayFrom({}, {source}, {});",
                    p.ident, p.offset, p.size
                ),
                format!("{lhs} = new bool[{}];", p.count()),
                format!("for (int i = 0; i < {}; i++)", p.count()),
                "{".into(),
                format!(
                    "\t{target}[i] = ({}Bits[i / 8] & (1 << (i % 8))) != 0;",
                    p.ident
                ),
                "}".into(),
            ];
        }
        if p.element.is_array() {
            let read = format!(
                "LEConverter.{conv}ArrayFrom({}, {source}, {})",
                p.offset,
                p.count()
            );
            let read = if p.rule.needs_cast() {
                format!("Array.ConvertAll({read}, i => ({api})i)")
            } else {
                read
            };
            return vec![format!("{lhs} = {read};")];
        }
        let read = format!("LEConverter.{conv}From({}, {source})", p.offset);
        let read = if p.rule.needs_cast() {
            format!("({api}){read}")
        } else {
            read
        };
        vec![format!("{lhs} = {read};")]
    }

    fn simple_doc(&self, lines: &[&str], indent: &str) -> String {
        let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        self.doc_comment(&lines, indent)
    }
}

impl DocSyntax for CSharp {
    fn escape(&self, text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }

    fn link(&self, device: &Device, packet: &Packet) -> String {
        let member = match packet.kind {
            PacketKind::Function => self.function_member(packet),
            PacketKind::Callback => format!("{}Callback", packet.name.camel()),
        };
        format!("<see cref=\"{}.{}\"/>", device.class_name(), member)
    }

    fn param(&self, name: &Name) -> String {
        format!("<c>{}</c>", self.param_name(name))
    }

    fn constant(&self, device: &Device, group: &Name, constant: &Name) -> String {
        format!("{}.{}", device.class_name(), constant_name(group, constant))
    }

    fn note(&self, body: &[String], warning: bool) -> Vec<String> {
        let mut out = vec![if warning {
            "<note type=\"warning\">".to_string()
        } else {
            "<note>".to_string()
        }];
        out.extend(body.iter().map(|l| format!(" {l}")));
        out.push("</note>".into());
        out
    }

    fn table(&self, header: &[String], rows: &[Vec<String>]) -> Vec<String> {
        let pair = |cells: &[String]| -> (String, String) {
            let term = cells.first().cloned().unwrap_or_default();
            let description = cells.get(1..).map(|rest| rest.join(", ")).unwrap_or_default();
            (term, description)
        };
        let mut out = vec!["<list type=\"table\">".to_string()];
        if !header.is_empty() {
            let (term, description) = pair(header);
            out.push(format!(
                " <listheader><term>{term}</term><description>{description}</description></listheader>"
            ));
        }
        for row in rows {
            let (term, description) = pair(row);
            out.push(format!(
                " <item><term>{term}</term><description>{description}</description></item>"
            ));
        }
        out.push("</list>".into());
        out
    }

    fn list(&self, items: &[String]) -> Vec<String> {
        let mut out = vec!["<list type=\"bullet\">".to_string()];
        out.extend(
            items
                .iter()
                .map(|item| format!(" <item><description>{item}</description></item>")),
        );
        out.push("</list>".into());
        out
    }
}

impl Binding for CSharp {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::CSharp
    }

    fn default_types(&self) -> TypeTable {
        use PrimitiveType as T;
        TypeTable::from_rules([
            (T::Int8, "short", "sbyte"),
            (T::Uint8, "byte", "byte"),
            (T::Int16, "short", "short"),
            (T::Uint16, "int", "ushort"),
            (T::Int32, "int", "int"),
            (T::Uint32, "long", "uint"),
            (T::Int64, "long", "long"),
            (T::Uint64, "long", "ulong"),
            (T::Float, "float", "float"),
            (T::Bool, "bool", "bool"),
            (T::Char, "char", "char"),
            (T::String, "string", "string"),
        ])
    }

    fn supports_wire(&self, wire: &str) -> bool {
        converter(wire).is_some()
    }

    fn keywords(&self) -> &'static [&'static str] {
        KEYWORDS
    }

    fn escape_keyword(&self, ident: &str) -> String {
        format!("@{ident}")
    }

    fn function_member(&self, packet: &Packet) -> String {
        packet.name.camel()
    }

    fn callback_members(
        &self,
        device: &Device,
        packet: &Packet,
        run: &RunContext,
    ) -> Vec<String> {
        let camel = packet.name.camel();
        let mut members = vec![
            format!("{camel}Callback"),
            format!("{camel}EventHandler"),
            format!("On{camel}Callback"),
        ];
        if run.has_legacy_callbacks(device) {
            members.push(camel);
        }
        members
    }

    fn doc_syntax(&self) -> &dyn DocSyntax {
        self
    }

    fn doc_comment(&self, lines: &[String], indent: &str) -> String {
        let mut out = format!("{indent}/// <summary>\n");
        for line in lines {
            if line.is_empty() {
                out.push_str(&format!("{indent}///\n"));
            } else {
                out.push_str(&format!("{indent}///  {line}\n"));
            }
        }
        out.push_str(&format!("{indent}/// </summary>\n"));
        out
    }

    fn header(&self, unit: &Unit<'_>) -> String {
        format!(
            "{}\nusing System;\n\nnamespace {}\n{{\n",
            banner("C#", unit.run.bindings_version),
            unit.run.namespace
        )
    }

    fn class_open(&self, unit: &Unit<'_>) -> String {
        let device = unit.device;
        let description: Vec<String> = device
            .description
            .select(unit.run.doc_language)
            .lines()
            .map(|l| self.escape(l.trim()))
            .collect();

        let mut out = self.doc_comment(&description, "\t");
        out.push_str(&format!("\tpublic class {} : Device\n\t{{\n", self.class(device)));
        out.push_str(&self.simple_doc(
            &[
                "Used to identify this device type in",
                "<see cref=\"Tinkerforge.IPConnection.EnumerateCallback\"/>",
            ],
            MEMBER,
        ));
        out.push_str(&format!(
            "{MEMBER}public static int DEVICE_IDENTIFIER = {};\n\n",
            device.identifier
        ));
        out.push_str(&self.simple_doc(
            &["Name of this device type, used in logs and error messages."],
            MEMBER,
        ));
        out.push_str(&format!(
            "{MEMBER}public static string DEVICE_DISPLAY_NAME = {};\n",
            string_literal(&device.long_display_name())
        ));
        out
    }

    fn function_ids(&self, unit: &Unit<'_>) -> String {
        let lines: Vec<String> = unit
            .functions()
            .chain(unit.callbacks())
            .map(|p| {
                format!(
                    "public const byte {}_{} = {};",
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
                let value = if group.ty == PrimitiveType::Char {
                    char_literal(constant.value)
                } else {
                    constant.value.to_string()
                };
                lines.push(format!(
                    "public const {} {} = {};",
                    rule.api,
                    constant_name(&group.name, &constant.name),
                    value
                ));
            }
        }
        indented(&lines, MEMBER)
    }

    fn callback_decls(&self, unit: &Unit<'_>) -> String {
        let class = self.class(unit.device);
        let legacy = unit.run.has_legacy_callbacks(unit.device);
        let mut blocks = Vec::new();

        for callback in unit.callbacks() {
            let camel = callback.packet.name.camel();
            let params: String = callback
                .outputs
                .iter()
                .map(|p| format!(", {} {}", p.api_type, p.ident))
                .collect();

            let mut block = self.simple_doc(&[], MEMBER);
            block.push_str(&format!(
                "{MEMBER}public delegate void {camel}EventHandler({class} sender{params});\n\n"
            ));
            block.push_str(&self.render_doc(unit, callback.packet, MEMBER));
            block.push_str(&format!(
                "{MEMBER}public event {camel}EventHandler {camel}Callback;\n"
            ));

            if legacy {
                block.push('\n');
                let see = format!("Legacy name of <see cref=\"{class}.{camel}Callback\"/>.");
                block.push_str(&self.simple_doc(&[see.as_str()], MEMBER));
                block.push_str(&indented(
                    &[
                        format!("public event {camel}EventHandler {camel}"),
                        "{".into(),
                        format!("\tadd {{ {camel}Callback += value; }}"),
                        format!("\tremove {{ {camel}Callback -= value; }}"),
                        "}".into(),
                    ],
                    MEMBER,
                ));
            }
            blocks.push(block);
        }
        blocks.join("\n")
    }

    fn constructor(&self, unit: &Unit<'_>) -> String {
        let device = unit.device;
        let version = device.api_version;

        let mut body = vec![
            format!("apiVersion[0] = {};", version.0),
            format!("apiVersion[1] = {};", version.1),
            format!("apiVersion[2] = {};", version.2),
            String::new(),
        ];
        for p in unit.functions().chain(unit.callbacks()) {
            body.push(format!(
                "responseExpected[{}_{}] = ResponseExpectedFlag.{};",
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
                "callbackWrappers[CALLBACK_{}] = new CallbackWrapper(On{}Callback);",
                p.packet.name.upper(),
                p.packet.name.camel()
            ));
        }
        body.push(String::new());
        body.push("ipcon.AddDevice(this);".into());

        let mut out = self.simple_doc(
            &[
                "Creates an object with the unique device ID <c>uid</c> and adds it to",
                "the IP Connection <c>ipcon</c>.",
            ],
            MEMBER,
        );
        out.push_str(&format!(
            "{MEMBER}public {}(string uid, IPConnection ipcon) : base(uid, ipcon, DEVICE_IDENTIFIER, DEVICE_DISPLAY_NAME)\n{MEMBER}{{\n",
            self.class(device)
        ));
        out.push_str(&indented(&body, BODY));
        out.push_str(&format!("{MEMBER}}}\n"));
        out
    }

    fn render_method(&self, unit: &Unit<'_>, packet: &MappedPacket<'_>) -> String {
        let name = &packet.packet.name;
        let single = packet.outputs.len() == 1;
        let return_type = if single {
            packet.outputs[0].api_type.clone()
        } else {
            "void".to_string()
        };

        let mut params: Vec<String> = packet
            .inputs
            .iter()
            .map(|p| format!("{} {}", p.api_type, p.ident))
            .collect();
        if packet.outputs.len() > 1 {
            params.extend(
                packet
                    .outputs
                    .iter()
                    .map(|p| format!("out {} {}", p.api_type, p.ident)),
            );
        }

        let mut body = vec![format!(
            "byte[] request = CreateRequestPacket({}, FUNCTION_{});",
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
        if packet.outputs.is_empty() {
            body.push("SendRequest(request, 0);".into());
        } else {
            body.push(format!(
                "byte[] response = SendRequest(request, {});",
                packet.response_size
            ));
            body.push(String::new());
            for p in &packet.outputs {
                body.extend(self.read_param(p, "response", &p.ident, single));
            }
            if single {
                body.push(String::new());
                body.push(format!("return {};", packet.outputs[0].ident));
            }
        }

        let mut out = self.render_doc(unit, packet.packet, MEMBER);
        out.push_str(&format!(
            "{MEMBER}public {return_type} {}({})\n{MEMBER}{{\n",
            self.function_member(packet.packet),
            params.join(", ")
        ));
        out.push_str(&indented(&body, BODY));
        out.push_str(&format!("{MEMBER}}}\n"));
        out
    }

    fn render_callback(&self, _unit: &Unit<'_>, packet: &MappedPacket<'_>) -> String {
        let camel = packet.packet.name.camel();
        let mut body = Vec::new();
        for p in &packet.outputs {
            body.extend(self.read_param(p, "response", &p.ident, true));
        }
        if !body.is_empty() {
            body.push(String::new());
        }
        let args: String = packet
            .outputs
            .iter()
            .map(|p| format!(", {}", p.ident))
            .collect();
        body.extend([
            format!("var handler = {camel}Callback;"),
            "if (handler != null)".into(),
            "{".into(),
            format!("\thandler(this{args});"),
            "}".into(),
        ]);

        let mut out = self.simple_doc(&[], MEMBER);
        out.push_str(&format!(
            "{MEMBER}protected void On{camel}Callback(byte[] response)\n{MEMBER}{{\n"
        ));
        out.push_str(&indented(&body, BODY));
        out.push_str(&format!("{MEMBER}}}\n"));
        out
    }

    fn footer(&self, _unit: &Unit<'_>) -> String {
        "\t}\n}\n".to_string()
    }
}
