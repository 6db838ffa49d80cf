// SPDX-License-Identifier: MIT

//! Line-oriented rendering of edit scripts.
//!
//! Every edit becomes one row `<tag> <old#> <new#> <text>`. An edit whose two
//! lines differ in raw text becomes an old row followed by a new row. Blocks
//! are introduced by a `@@ <kind> <n> edits @@` header.

use lazy_static::lazy_static;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::edit::*;

#[derive(Default)]
struct Colors {
    default: ColorSpec,
    header: ColorSpec,
    old: ColorSpec,
    new: ColorSpec,
    moved: ColorSpec,
    muted: ColorSpec,
}
impl Colors {
    fn new() -> Self {
        let mut colors = Colors {
            ..Default::default()
        };
        colors.header.set_fg(Some(Color::Cyan));
        colors.old.set_fg(Some(Color::Red));
        colors.new.set_fg(Some(Color::Green));
        colors.moved.set_fg(Some(Color::Yellow));
        colors.muted.set_dimmed(true);
        colors
    }
}
lazy_static! {
    static ref COLORS: Colors = Colors::new();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Default,
    Old,
    New,
    Moved,
    Muted,
}
impl Style {
    fn color(self) -> &'static ColorSpec {
        match self {
        Style::Default => &COLORS.default,
        Style::Old => &COLORS.old,
        Style::New => &COLORS.new,
        Style::Moved => &COLORS.moved,
        Style::Muted => &COLORS.muted,
        }
    }
}

#[derive(Debug)]
enum Element {
    Header {
        kind: &'static str,
        count: usize,
    },
    Row {
        style: Style,
        tag: char,
        old: Option<usize>,
        new: Option<usize>,
        text: String,
    },
}

/// Collects rows and writes them with aligned line number columns.
#[derive(Default)]
pub struct Writer {
    elements: Vec<Element>,
    number_width: usize,
}
impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_row(&mut self, style: Style, tag: char, old: Option<&Line>, new: Option<&Line>) {
        let Some(line) = old.or(new) else {
            return
        };
        for number in [old, new].into_iter().flatten().map(Line::number) {
            self.number_width = self.number_width.max(number.to_string().len());
        }
        self.elements.push(Element::Row {
            style,
            tag,
            old: old.map(Line::number),
            new: new.map(Line::number),
            text: line.text().to_owned(),
        });
    }

    /// Add the rows of `edit`, presented as `kind`.
    pub fn push_edit(&mut self, kind: &EditKind, edit: &Edit) {
        let muted = matches!(kind, EditKind::Normalize | EditKind::Ignore);
        let tag = kind.tag();
        match (edit.old_line(), edit.new_line()) {
        (Some(old), Some(new)) if old.text() == new.text() => {
            let style = match kind {
            EditKind::Move => Style::Moved,
            _ if muted => Style::Muted,
            _ => Style::Default,
            };
            self.push_row(style, tag, Some(old), Some(new));
        },
        (old, new) => {
            let (old_style, new_style) = match kind {
            EditKind::Move => (Style::Moved, Style::Moved),
            _ if muted => (Style::Muted, Style::Muted),
            _ => (Style::Old, Style::New),
            };
            if old.is_some() {
                self.push_row(old_style, tag, old, None);
            }
            if new.is_some() {
                self.push_row(new_style, tag, None, new);
            }
        },
        }
    }

    pub fn push_edits(&mut self, edits: &[Edit]) {
        for edit in edits {
            self.push_edit(edit.kind(), edit);
        }
    }

    pub fn push_unit(&mut self, unit: &Unit) {
        if let Unit::Block(block) = unit {
            self.elements.push(Element::Header {
                kind: block.kind().name(),
                count: block.edits().len(),
            });
        }
        for (kind, edit) in unit.classified_edits() {
            self.push_edit(kind, edit);
        }
    }

    pub fn push_units(&mut self, units: &[Unit]) {
        for unit in units {
            self.push_unit(unit);
        }
    }

    pub fn write(mut self, out: &mut dyn WriteColor) -> std::io::Result<()> {
        let width = self.number_width;
        let number = |number: Option<usize>| match number {
            Some(number) => format!("{:>width$}", number, width = width),
            None => " ".repeat(width),
        };

        for element in std::mem::take(&mut self.elements) {
            match element {
            Element::Header { kind, count } => {
                out.set_color(&COLORS.header)?;
                write!(out, "@@ {} {} edits @@", kind, count)?;
                out.reset()?;
                writeln!(out)?;
            },
            Element::Row { style, tag, old, new, text } => {
                let color = style.color();
                if color != &COLORS.default {
                    out.set_color(color)?;
                }
                write!(out, "{} {} {}", tag, number(old), number(new))?;
                if !text.is_empty() {
                    write!(out, " {}", text)?;
                }
                if color != &COLORS.default {
                    out.reset()?;
                }
                writeln!(out)?;
            },
            }
        }

        Ok(())
    }
}

fn to_text(writer: Writer) -> String {
    let mut out = termcolor::NoColor::new(Vec::new());
    // Writing into memory cannot fail.
    writer.write(&mut out).unwrap_or_default();
    String::from_utf8_lossy(&out.into_inner()).into_owned()
}

/// Render `units` without colors.
pub fn render_text(units: &[Unit]) -> String {
    let mut writer = Writer::new();
    writer.push_units(units);
    to_text(writer)
}

/// Render a flat edit list without colors.
pub fn render_edits_text(edits: &[Edit]) -> String {
    let mut writer = Writer::new();
    writer.push_edits(edits);
    to_text(writer)
}
