// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Packet documentation rendering.
//!
//! Description files write docs in a small reStructuredText subset:
//!
//! | Markup | Meaning |
//! |--------|---------|
//! | `.. note::` / `.. warning::` | indented admonition, ends at a blank line |
//! | `.. csv-table::` + `:header:` | simple table, rows until a blank line |
//! | `* item` | bullet list |
//! | ``:func:`Name` `` / ``:cb:`Name` `` | link to a function / callback |
//! | ``:param:`Name` `` | reference to an element |
//!
//! Text is parsed into [`Block`]s and handed to a [`DocSyntax`] for the target
//! language. Anything not listed above is kept as literal text, and links to
//! unknown packets degrade to their plain name. Rendering never fails.

use crate::model::{Device, DocLanguage, Packet, PacketKind, PrimitiveType, Version};
use crate::naming::Name;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Vec<String>),
    Note(Vec<String>),
    Warning(Vec<String>),
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    List(Vec<String>),
    Since(Version),
}

/// Inline span of a doc line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline<'a> {
    Text(&'a str),
    Link(PacketKind, &'a str),
    Param(&'a str),
}

/// Target-language doc comment conventions.
pub trait DocSyntax {
    /// Escape text for the comment body.
    fn escape(&self, text: &str) -> String;

    /// Reference to another packet of the same device.
    fn link(&self, device: &Device, packet: &Packet) -> String;

    /// Reference to a parameter of the documented packet.
    fn param(&self, name: &Name) -> String;

    /// Qualified name of a generated constant.
    fn constant(&self, device: &Device, group: &Name, constant: &Name) -> String;

    fn note(&self, body: &[String], warning: bool) -> Vec<String>;

    fn table(&self, header: &[String], rows: &[Vec<String>]) -> Vec<String>;

    fn list(&self, items: &[String]) -> Vec<String>;

    fn paragraph(&self, lines: &[String]) -> Vec<String> {
        lines.to_vec()
    }
}

/// Split markup into blocks.
pub fn parse_blocks(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut lines = text.lines().peekable();
    let mut paragraph: Vec<String> = Vec::new();

    let flush = |paragraph: &mut Vec<String>, blocks: &mut Vec<Block>| {
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph(std::mem::take(paragraph)));
        }
    };

    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        match trimmed {
            "" => flush(&mut paragraph, &mut blocks),
            ".. note::" | ".. warning::" => {
                flush(&mut paragraph, &mut blocks);
                let mut body = Vec::new();
                while let Some(next) = lines.peek() {
                    if next.trim().is_empty() {
                        break;
                    }
                    body.push(next.trim().to_string());
                    lines.next();
                }
                blocks.push(if trimmed == ".. note::" {
                    Block::Note(body)
                } else {
                    Block::Warning(body)
                });
            }
            ".. csv-table::" => {
                flush(&mut paragraph, &mut blocks);
                let mut header = Vec::new();
                while let Some(next) = lines.peek() {
                    let option = next.trim();
                    if let Some(h) = option.strip_prefix(":header:") {
                        header = split_csv(h);
                    } else if !option.starts_with(':') {
                        break;
                    }
                    lines.next();
                }
                while lines.peek().is_some_and(|l| l.trim().is_empty()) {
                    lines.next();
                }
                let mut rows = Vec::new();
                while let Some(next) = lines.peek() {
                    if next.trim().is_empty() {
                        break;
                    }
                    rows.push(split_csv(next.trim()));
                    lines.next();
                }
                blocks.push(Block::Table { header, rows });
            }
            _ if is_bullet(trimmed) => {
                flush(&mut paragraph, &mut blocks);
                let mut items = vec![trimmed[2..].trim().to_string()];
                while let Some(next) = lines.peek() {
                    let next = next.trim();
                    if next.is_empty() {
                        break;
                    }
                    if is_bullet(next) {
                        items.push(next[2..].trim().to_string());
                    } else if let Some(last) = items.last_mut() {
                        last.push(' ');
                        last.push_str(next);
                    }
                    lines.next();
                }
                blocks.push(Block::List(items));
            }
            _ => paragraph.push(trimmed.to_string()),
        }
    }
    flush(&mut paragraph, &mut blocks);
    blocks
}

fn is_bullet(line: &str) -> bool {
    line.starts_with("* ") || line.starts_with("- ")
}

fn split_csv(line: &str) -> Vec<String> {
    line.split(',')
        .map(|cell| cell.trim().trim_matches('"').to_string())
        .collect()
}

/// ``:func:`Target` ``, ``:cb:`Target` `` and ``:param:`Target` `` spans.
fn role_pattern() -> Option<&'static Regex> {
    static ROLE: OnceLock<Option<Regex>> = OnceLock::new();
    ROLE.get_or_init(|| Regex::new(r":(func|cb|param):`([^`]+)`").ok())
        .as_ref()
}

/// Split a line into text, links and parameter references.
pub fn parse_inline(line: &str) -> Vec<Inline<'_>> {
    let Some(role) = role_pattern() else {
        return vec![Inline::Text(line)];
    };

    let mut spans = Vec::new();
    let mut last = 0;
    for caps in role.captures_iter(line) {
        let (Some(whole), Some(kind), Some(target)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        if whole.start() > last {
            spans.push(Inline::Text(&line[last..whole.start()]));
        }
        spans.push(match kind.as_str() {
            "func" => Inline::Link(PacketKind::Function, target.as_str()),
            "cb" => Inline::Link(PacketKind::Callback, target.as_str()),
            _ => Inline::Param(target.as_str()),
        });
        last = whole.end();
    }
    if last < line.len() {
        spans.push(Inline::Text(&line[last..]));
    }
    spans
}

/// Render one line of markup, resolving links against `device`.
pub fn render_inline(syntax: &dyn DocSyntax, device: &Device, packet: &Packet, line: &str) -> String {
    parse_inline(line)
        .into_iter()
        .map(|span| match span {
            Inline::Text(text) => syntax.escape(text),
            Inline::Link(kind, target) => match device.packet(target, Some(kind)) {
                Some(linked) => syntax.link(device, linked),
                None => syntax.escape(target),
            },
            Inline::Param(target) => {
                let name = Name::new(target);
                if packet.elements.iter().any(|e| e.name == name) {
                    syntax.param(&name)
                } else {
                    syntax.escape(target)
                }
            }
        })
        .collect()
}

/// Render a packet's documentation as comment body lines (no comment prefix).
///
/// Appends unit/scale notes, constant listings and a since-firmware note
/// derived from the model.
pub fn render(
    syntax: &dyn DocSyntax,
    device: &Device,
    packet: &Packet,
    language: DocLanguage,
) -> Vec<String> {
    let mut blocks = parse_blocks(packet.doc.text.select(language));
    if packet.since_firmware > device.firmware_floor {
        blocks.push(Block::Since(packet.since_firmware));
    }

    let inline = |line: &String| render_inline(syntax, device, packet, line);
    let mut sections: Vec<Vec<String>> = blocks
        .iter()
        .map(|block| match block {
            Block::Paragraph(lines) => syntax.paragraph(&lines.iter().map(inline).collect::<Vec<_>>()),
            Block::Note(lines) => syntax.note(&lines.iter().map(inline).collect::<Vec<_>>(), false),
            Block::Warning(lines) => syntax.note(&lines.iter().map(inline).collect::<Vec<_>>(), true),
            Block::Table { header, rows } => {
                let header: Vec<String> = header.iter().map(inline).collect();
                let rows: Vec<Vec<String>> = rows
                    .iter()
                    .map(|row| row.iter().map(inline).collect())
                    .collect();
                syntax.table(&header, &rows)
            }
            Block::List(items) => syntax.list(&items.iter().map(inline).collect::<Vec<_>>()),
            Block::Since(version) => {
                syntax.paragraph(&[syntax.escape(&format!("Since firmware version {version}."))])
            }
        })
        .collect();

    let units: Vec<String> = packet
        .elements
        .iter()
        .filter_map(|e| {
            let factor = match (e.scale, e.unit.as_deref()) {
                (None, None) => return None,
                (Some(scale), unit) => {
                    format!("{}/{} {}", scale.num, scale.den, unit.unwrap_or("(raw)"))
                }
                (None, Some(unit)) => unit.to_string(),
            };
            Some(format!("{}: {}", syntax.param(&e.name), syntax.escape(&factor)))
        })
        .collect();
    if !units.is_empty() {
        sections.push(syntax.paragraph(&[syntax.escape(
            "Physical units (raw value multiplied by the factor):",
        )]));
        sections.push(syntax.list(&units));
    }

    let mut constants: Vec<String> = Vec::new();
    for element in &packet.elements {
        let Some(group) = element
            .constant_group
            .as_ref()
            .and_then(|g| device.constant_group(g))
        else {
            continue;
        };
        for constant in &group.constants {
            let value = match group.ty {
                PrimitiveType::Char => u32::try_from(constant.value)
                    .ok()
                    .and_then(char::from_u32)
                    .map(|c| format!("'{c}'"))
                    .unwrap_or_else(|| constant.value.to_string()),
                _ => constant.value.to_string(),
            };
            constants.push(format!(
                "{}: {} = {}",
                syntax.param(&element.name),
                syntax.constant(device, &group.name, &constant.name),
                syntax.escape(&value)
            ));
        }
    }
    if !constants.is_empty() {
        sections.push(syntax.paragraph(&[syntax.escape(
            "The following constants are available for this function:",
        )]));
        sections.push(syntax.list(&constants));
    }

    let mut out: Vec<String> = Vec::new();
    for section in sections {
        if !out.is_empty() {
            out.push(String::new());
        }
        out.extend(section);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_and_paragraphs() {
        let blocks = parse_blocks("First line\nsecond line\n\n.. note::\n This is a note.\n\nTail");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec!["First line".into(), "second line".into()]),
                Block::Note(vec!["This is a note.".into()]),
                Block::Paragraph(vec!["Tail".into()]),
            ]
        );
    }

    #[test]
    fn test_parse_table() {
        let text = ".. csv-table::\n :header: \"Value\", \"Meaning\"\n :widths: 10, 90\n\n \"0\", \"Off\"\n \"1\", \"On\"\n";
        let blocks = parse_blocks(text);
        assert_eq!(
            blocks,
            vec![Block::Table {
                header: vec!["Value".into(), "Meaning".into()],
                rows: vec![
                    vec!["0".into(), "Off".into()],
                    vec!["1".into(), "On".into()],
                ],
            }]
        );
    }

    #[test]
    fn test_parse_list_with_continuation() {
        let blocks = parse_blocks("* one\n  more\n* two");
        assert_eq!(
            blocks,
            vec![Block::List(vec!["one more".into(), "two".into()])]
        );
    }

    #[test]
    fn test_unknown_directive_is_literal() {
        let blocks = parse_blocks(".. versionadded:: 2.0\nText");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                ".. versionadded:: 2.0".into(),
                "Text".into()
            ])]
        );
    }

    #[test]
    fn test_parse_inline_roles() {
        let spans = parse_inline("See :func:`Get State` and :cb:`State Changed`, :param:`Mode`: x");
        assert_eq!(
            spans,
            vec![
                Inline::Text("See "),
                Inline::Link(PacketKind::Function, "Get State"),
                Inline::Text(" and "),
                Inline::Link(PacketKind::Callback, "State Changed"),
                Inline::Text(", "),
                Inline::Param("Mode"),
                Inline::Text(": x"),
            ]
        );
    }

    #[test]
    fn test_unterminated_role_is_text() {
        let spans = parse_inline("broken :func:`Get State");
        let text: String = spans
            .iter()
            .map(|s| match s {
                Inline::Text(t) => *t,
                _ => panic!("unexpected span {s:?}"),
            })
            .collect();
        assert_eq!(text, "broken :func:`Get State");
    }

    #[test]
    fn test_unknown_and_empty_roles_are_text() {
        assert_eq!(
            parse_inline(":ref:`Other` and :func:`` stay"),
            vec![Inline::Text(":ref:`Other` and :func:`` stay")]
        );
        assert_eq!(
            parse_inline(":param:`Mode`"),
            vec![Inline::Param("Mode")]
        );
        assert!(parse_inline("").is_empty());
    }
}
