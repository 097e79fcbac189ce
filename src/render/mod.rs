//! # Rendering
//!
//! Walks a laid-out document and issues paint commands to a [`Painter`].
//! Nothing here measures or positions content; geometry comes from the
//! layout slots on the model. A block that was never laid out is an error.
//!
//! [`DisplayList`] is a recording painter whose commands serialize to JSON,
//! which is what the CLI emits.

use log::trace;
use serde::Serialize;

use crate::error::Result;
use crate::font::FontContext;
use crate::model::{
    Block, BorderSet, BorderType, Cell, DrawingRun, Paragraph, Picture, PositionedLine, Rect,
    Run, Table, TableBorder, TextRun,
};
use crate::style::{ComputedStyle, UnderlineMode};

/// Text as handed to a painter: a positioned line plus its paint attributes.
#[derive(Debug, Clone, Copy)]
pub struct TextPaint<'a> {
    pub line: &'a PositionedLine,
    /// Advance of the text at its font, before any stretching.
    pub measured_width: f64,
    pub link: Option<&'a str>,
}

/// The painting surface.
pub trait Painter {
    fn paint_text(&mut self, text: TextPaint<'_>);
    fn paint_line(&mut self, from: (f64, f64), to: (f64, f64), color: &str, thickness: f64);
    fn paint_picture(&mut self, bounds: Rect, picture: &Picture);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PaintCommand {
    #[serde(rename_all = "camelCase")]
    Text {
        x: f64,
        y: f64,
        width: f64,
        stretched: bool,
        text: String,
        color: String,
        font_family: String,
        font_size: f64,
        bold: bool,
        italic: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        link: Option<String>,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: String,
        thickness: f64,
    },
    Picture {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        src: String,
    },
}

/// A painter that records every command in order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayList {
    pub commands: Vec<PaintCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &PaintCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, PaintCommand::Line { .. }))
    }
}

impl Painter for DisplayList {
    fn paint_text(&mut self, text: TextPaint<'_>) {
        let line = text.line;
        let width = if line.stretched {
            line.width
        } else {
            text.measured_width
        };
        self.commands.push(PaintCommand::Text {
            x: line.x,
            y: line.y,
            width,
            stretched: line.stretched,
            text: line.text.clone(),
            color: line.color.clone(),
            font_family: line.font_family.clone(),
            font_size: line.font_size,
            bold: line.bold,
            italic: line.italic,
            link: text.link.map(str::to_string),
        });
    }

    fn paint_line(&mut self, from: (f64, f64), to: (f64, f64), color: &str, thickness: f64) {
        self.commands.push(PaintCommand::Line {
            x1: from.0,
            y1: from.1,
            x2: to.0,
            y2: to.1,
            color: color.to_string(),
            thickness,
        });
    }

    fn paint_picture(&mut self, bounds: Rect, picture: &Picture) {
        self.commands.push(PaintCommand::Picture {
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            src: picture.src.clone(),
        });
    }
}

pub struct Renderer<'a> {
    fonts: &'a FontContext,
}

impl<'a> Renderer<'a> {
    pub fn new(fonts: &'a FontContext) -> Self {
        Self { fonts }
    }

    pub fn render<P: Painter>(&self, body: &[Block], painter: &mut P) -> Result<()> {
        for block in body {
            match block {
                Block::Paragraph(par) => self.render_paragraph(par, painter)?,
                Block::Table(table) => self.render_table(table, painter)?,
            }
        }
        Ok(())
    }

    pub fn render_paragraph<P: Painter>(&self, par: &Paragraph, painter: &mut P) -> Result<()> {
        par.layout.get("Paragraph")?;
        if let Some(prefix) = &par.numbering_run {
            self.render_text_run(prefix, painter)?;
        }
        for run in &par.runs {
            match run {
                Run::Text(text) => self.render_text_run(text, painter)?,
                Run::Drawing(drawing) => render_drawing(drawing, painter)?,
            }
        }
        Ok(())
    }

    fn render_text_run<P: Painter>(&self, run: &TextRun, painter: &mut P) -> Result<()> {
        let layout = run.layout.get("Text run")?;
        for line in &layout.lines {
            let measured = self.fonts.text_width(&line.text, &layout.style);
            let width = if line.stretched { line.width } else { measured };

            if let Some(shading) = layout.style.shading_color.as_deref().filter(|c| *c != "auto") {
                let top = line.y - self.fonts.top_to_baseline(&layout.style);
                let y = top + layout.line_height / 2.0;
                painter.paint_line((line.x, y), (line.x + width, y), shading, layout.line_height);
            }

            painter.paint_text(TextPaint {
                line,
                measured_width: measured,
                link: run.link.as_deref(),
            });
            self.render_decorations(line, width, &layout.style, painter);
        }
        Ok(())
    }

    fn render_decorations<P: Painter>(
        &self,
        line: &PositionedLine,
        width: f64,
        style: &ComputedStyle,
        painter: &mut P,
    ) {
        let size = style.font_size;
        let (x1, x2) = (line.x, line.x + width);
        let color = style.color.as_str();

        let underline_y = line.y + size / 10.0;
        match style.underline {
            UnderlineMode::None => {}
            UnderlineMode::Double | UnderlineMode::WavyDouble => {
                painter.paint_line((x1, underline_y), (x2, underline_y), color, 1.0);
                painter.paint_line((x1, underline_y + 2.0), (x2, underline_y + 2.0), color, 1.0);
            }
            UnderlineMode::Thick
            | UnderlineMode::DottedHeavy
            | UnderlineMode::DashedHeavy
            | UnderlineMode::DashLongHeavy
            | UnderlineMode::DashDotHeavy
            | UnderlineMode::DashDotDotHeavy
            | UnderlineMode::WavyHeavy => {
                painter.paint_line((x1, underline_y), (x2, underline_y), color, 2.0);
            }
            _ => painter.paint_line((x1, underline_y), (x2, underline_y), color, 1.0),
        }

        let strike_y = line.y - size / 3.0;
        if style.strike {
            painter.paint_line((x1, strike_y), (x2, strike_y), color, 1.0);
        }
        if style.double_strike {
            painter.paint_line((x1, strike_y - 1.0), (x2, strike_y - 1.0), color, 1.0);
            painter.paint_line((x1, strike_y + 2.0), (x2, strike_y + 2.0), color, 1.0);
        }
    }

    /// Cells in row order: shading, outer borders, then inner borders inside
    /// the cell-spacing inset, then content. Merge continuations paint nothing.
    pub fn render_table<P: Painter>(&self, table: &Table, painter: &mut P) -> Result<()> {
        table.layout.get("Table")?;
        for row in &table.rows {
            let outer = row.borders.as_ref().or(table.style.borders.as_ref());
            for cell in &row.cells {
                let layout = cell.layout.get("Table cell")?;
                if layout.num_rows_in_span == 0 {
                    continue;
                }
                render_shading(cell, layout.bounds, painter);
                render_cell_borders(cell, layout.bounds, outer, table.style.cell_spacing, painter);
                for par in &cell.paragraphs {
                    self.render_paragraph(par, painter)?;
                }
            }
        }
        Ok(())
    }
}

fn render_drawing<P: Painter>(drawing: &DrawingRun, painter: &mut P) -> Result<()> {
    let layout = drawing.layout.get("Drawing run")?;
    if let Some(picture) = &drawing.picture {
        painter.paint_picture(layout.bounds, picture);
    }
    Ok(())
}

fn render_shading<P: Painter>(cell: &Cell, bounds: Rect, painter: &mut P) {
    if let Some(fill) = cell.shading.as_deref().filter(|c| !c.is_empty() && *c != "auto") {
        let y = bounds.y + bounds.height / 2.0;
        painter.paint_line((bounds.left(), y), (bounds.right(), y), fill, bounds.height);
    }
}

/// With zero cell spacing a cell's own borders replace the outer ones
/// outright; otherwise both are drawn, the inner set inset by the spacing.
fn render_cell_borders<P: Painter>(
    cell: &Cell,
    bounds: Rect,
    outer: Option<&BorderSet>,
    cell_spacing: f64,
    painter: &mut P,
) {
    let outer = if cell_spacing == 0.0 && cell.has_borders() {
        None
    } else {
        outer
    };
    if let Some(borders) = outer {
        paint_border_set(borders, bounds, painter);
    }
    if let Some(borders) = &cell.borders {
        paint_border_set(borders, bounds.inset(cell_spacing), painter);
    }
}

fn paint_border_set<P: Painter>(borders: &BorderSet, b: Rect, painter: &mut P) {
    let sides = [
        (&borders.top, (b.left(), b.top()), (b.right(), b.top())),
        (&borders.bottom, (b.left(), b.bottom()), (b.right(), b.bottom())),
        (&borders.start, (b.left(), b.top()), (b.left(), b.bottom())),
        (&borders.end, (b.right(), b.top()), (b.right(), b.bottom())),
    ];
    for (border, from, to) in sides {
        if let Some(border) = border {
            paint_border(border, from, to, painter);
        }
    }
}

fn paint_border<P: Painter>(border: &TableBorder, from: (f64, f64), to: (f64, f64), painter: &mut P) {
    match border.kind {
        BorderType::None => {}
        kind => {
            trace!("Border {kind:?} from {from:?} to {to:?}");
            painter.paint_line(from, to, &border.color, border.size);
        }
    }
}
