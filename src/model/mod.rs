//! # Document Model
//!
//! The object model the layout engine works on: a section, named styles,
//! numbering definitions and a body of blocks (paragraphs and tables).
//!
//! Input fields are deserialized from JSON. Layout output is attached back
//! onto the same objects through write-once [`LayoutState`] slots, so the
//! rendering pass reads positioned geometry from the model it was given.

use serde::{Deserialize, Serialize};

use crate::error::{DocflowError, Result};
use crate::style::graph::NamedStyle;
use crate::style::{
    ComputedStyle, Justification, NumberingDefinition, ParProps, RunProps, StyleNode,
};

/// A complete document ready for layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub config: LayoutConfig,

    /// Page geometry.
    #[serde(default)]
    pub section: Section,

    #[serde(default)]
    pub styles: Vec<NamedStyle>,

    /// Document-wide defaults, consulted after every style chain.
    #[serde(default)]
    pub doc_defaults: Option<StyleNode>,

    #[serde(default)]
    pub numberings: Vec<NumberingDefinition>,

    /// Custom fonts to register before layout.
    #[serde(default)]
    pub fonts: Vec<FontEntry>,

    #[serde(default)]
    pub body: Vec<Block>,
}

/// Tunables for one layout pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Page width used when the section does not declare one (8.5in at 96dpi).
    pub default_page_width: f64,
    /// Bound on chained style hops in a single property lookup.
    pub max_style_depth: usize,
    /// Minimum advance of a paragraph without a text run to measure.
    pub fallback_line_spacing: f64,
    /// Spacing of implicit tab stops.
    pub default_tab_interval: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_page_width: 816.0,
            max_style_depth: 32,
            fallback_line_spacing: 10.0,
            default_tab_interval: 48.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default)]
    pub page_width: Option<f64>,
    #[serde(default)]
    pub margin_left: f64,
    #[serde(default)]
    pub margin_right: f64,
    #[serde(default)]
    pub margin_top: f64,
}

/// A custom font: family name plus base64 data or a data URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontEntry {
    pub family: String,
    pub src: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

/// A top-level block of the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// Position of an item among its siblings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InSequence {
    First,
    Middle,
    Last,
    #[default]
    Only,
}

impl InSequence {
    pub fn of(index: usize, count: usize) -> Self {
        match (index == 0, index + 1 == count) {
            (true, true) => InSequence::Only,
            (true, false) => InSequence::First,
            (false, true) => InSequence::Last,
            (false, false) => InSequence::Middle,
        }
    }

    pub fn is_first(self) -> bool {
        matches!(self, InSequence::First | InSequence::Only)
    }

    pub fn is_last(self) -> bool {
        matches!(self, InSequence::Last | InSequence::Only)
    }
}

/// Axis-aligned box in page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Shrink by `spacing` on every side. Never goes negative.
    pub fn inset(&self, spacing: f64) -> Rect {
        Rect {
            x: self.x + spacing,
            y: self.y + spacing,
            width: (self.width - 2.0 * spacing).max(0.0),
            height: (self.height - 2.0 * spacing).max(0.0),
        }
    }
}

// ── Layout slots ────────────────────────────────────────────────

/// Write-once layout output. Reading before layout is a sequencing error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutState<T> {
    NotLaidOut,
    Laid(T),
}

impl<T> Default for LayoutState<T> {
    fn default() -> Self {
        LayoutState::NotLaidOut
    }
}

impl<T> LayoutState<T> {
    pub fn is_laid(&self) -> bool {
        matches!(self, LayoutState::Laid(_))
    }

    pub fn get(&self, what: &'static str) -> Result<&T> {
        match self {
            LayoutState::Laid(value) => Ok(value),
            LayoutState::NotLaidOut => Err(DocflowError::NotLaidOut { what }),
        }
    }

    /// Store the output. A second layout of the same object keeps the first
    /// result and returns `false`.
    pub fn set(&mut self, value: T) -> bool {
        if self.is_laid() {
            return false;
        }
        *self = LayoutState::Laid(value);
        true
    }
}

// ── Paragraphs and runs ─────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default)]
    pub props: ParProps,
    #[serde(default)]
    pub runs: Vec<Run>,
    /// Synthesized list prefix ("1.", "a)", a bullet), laid out before the runs.
    #[serde(skip_deserializing)]
    pub numbering_run: Option<TextRun>,
    #[serde(skip_deserializing)]
    pub layout: LayoutState<ParagraphLayout>,
}

impl Paragraph {
    /// Run properties of the first text-bearing run; the paragraph-level
    /// style is computed against them.
    pub fn first_text_props(&self) -> Option<&RunProps> {
        self.runs.iter().find_map(|run| match run {
            Run::Text(text) => Some(&text.props),
            Run::Drawing(_) => None,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphLayout {
    pub style: ComputedStyle,
    pub y: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Run {
    Text(TextRun),
    Drawing(DrawingRun),
}

impl Run {
    /// Horizontal continuation offset after layout.
    pub fn last_x(&self) -> Result<f64> {
        match self {
            Run::Text(text) => Ok(text.layout.get("Text run")?.last_x),
            Run::Drawing(drawing) => Ok(drawing.layout.get("Drawing run")?.last_x),
        }
    }

    /// Vertical space the run occupies.
    pub fn height(&self) -> Result<f64> {
        match self {
            Run::Text(text) => {
                let layout = text.layout.get("Text run")?;
                Ok(layout.lines.len() as f64 * layout.line_height)
            }
            Run::Drawing(drawing) => Ok(drawing.layout.get("Drawing run")?.bounds.height),
        }
    }

    /// Width of the first line, or of the drawing box.
    pub fn used_width(&self) -> Result<f64> {
        match self {
            Run::Text(text) => Ok(text.lines()?.first().map_or(0.0, |line| line.width)),
            Run::Drawing(drawing) => Ok(drawing.layout.get("Drawing run")?.bounds.width),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    /// Text fragments; joined by single spaces before fitting.
    #[serde(default)]
    pub texts: Vec<String>,
    #[serde(default)]
    pub props: RunProps,
    /// Hyperlink target, passed through to the painter.
    #[serde(default)]
    pub link: Option<String>,
    #[serde(skip_deserializing)]
    pub layout: LayoutState<TextLayout>,
}

impl TextRun {
    pub fn new(text: impl Into<String>, props: RunProps) -> Self {
        Self {
            texts: vec![text.into()],
            props,
            ..Default::default()
        }
    }

    /// The run's fragments joined by single spaces.
    pub fn text(&self) -> String {
        self.texts.join(" ")
    }

    /// Positioned lines. Fails if the run has not been laid out.
    pub fn lines(&self) -> Result<&[PositionedLine]> {
        Ok(&self.layout.get("Text run")?.lines)
    }
}

/// Output of fitting one text run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayout {
    pub style: ComputedStyle,
    pub lines: Vec<PositionedLine>,
    pub line_height: f64,
    /// Horizontal offset, relative to the flow origin, where the run ended.
    pub last_x: f64,
    /// Whether the next run continues the run's last line.
    pub line_open: bool,
}

/// One line of a text run, positioned on its baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedLine {
    pub text: String,
    pub x: f64,
    pub y: f64,
    /// Space available to the line, from `x` to the flow's right edge.
    pub width: f64,
    /// Stretch to fill `width` (full justification, not the last line).
    pub stretched: bool,
    /// Continues the previous run on the same visual line.
    pub following: bool,
    pub color: String,
    pub font_family: String,
    pub font_size: f64,
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingRun {
    #[serde(default)]
    pub bounds: ShapeBounds,
    #[serde(default)]
    pub picture: Option<Picture>,
    #[serde(skip_deserializing)]
    pub layout: LayoutState<DrawingLayout>,
}

/// Declared placement of a drawing relative to the cursor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeBounds {
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    /// Anchored drawings float: they neither advance the flow nor the cursor.
    #[serde(default)]
    pub anchored: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Picture {
    /// URL or data URI handed to the painter.
    pub src: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingLayout {
    pub bounds: Rect,
    pub last_x: f64,
}

// ── Tables ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub style: TableStyle,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(skip_deserializing)]
    pub layout: LayoutState<TableLayout>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub width: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStyle {
    #[serde(default)]
    pub borders: Option<BorderSet>,
    #[serde(default)]
    pub margins: MarginSet,
    #[serde(default)]
    pub justification: Justification,
    #[serde(default)]
    pub indentation: f64,
    #[serde(default)]
    pub cell_spacing: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableLayout {
    pub bounds: Rect,
    /// Start offset of each grid column, relative to the table's left edge.
    pub column_starts: Vec<f64>,
    pub row_heights: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    #[serde(default)]
    pub cells: Vec<Cell>,
    /// Row-level borders replace the table's for cells of this row.
    #[serde(default)]
    pub borders: Option<BorderSet>,
    #[serde(default)]
    pub margins: MarginSet,
    #[serde(default)]
    pub min_height: Option<f64>,
}

/// Marker of a vertically merged cell as it appears in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerticalMerge {
    Restart,
    Continue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
    /// Number of grid columns covered.
    #[serde(default = "default_span")]
    pub span: usize,
    /// Declared width, used when the table has no column grid.
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub v_merge: Option<VerticalMerge>,
    #[serde(default)]
    pub borders: Option<BorderSet>,
    #[serde(default)]
    pub margins: MarginSet,
    /// Background fill, hex RGB.
    #[serde(default)]
    pub shading: Option<String>,
    #[serde(skip_deserializing)]
    pub layout: LayoutState<CellLayout>,
}

fn default_span() -> usize {
    1
}

impl Cell {
    /// Span-order marker: first or middle of a vertical merge group.
    pub fn merge_order(&self) -> Option<InSequence> {
        self.v_merge.map(|merge| match merge {
            VerticalMerge::Restart => InSequence::First,
            VerticalMerge::Continue => InSequence::Middle,
        })
    }

    pub fn has_borders(&self) -> bool {
        self.borders.as_ref().is_some_and(|b| !b.is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellLayout {
    pub column: usize,
    pub bounds: Rect,
    /// Rows this cell covers; zero for a merge continuation.
    pub num_rows_in_span: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BorderType {
    #[serde(alias = "nil")]
    None,
    #[default]
    Single,
    Thick,
    Double,
    Dotted,
    Dashed,
    DotDash,
    Triple,
    Wave,
    Inset,
    Outset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableBorder {
    #[serde(rename = "type", default)]
    pub kind: BorderType,
    #[serde(default = "default_border_size")]
    pub size: f64,
    #[serde(default = "default_border_color")]
    pub color: String,
}

fn default_border_size() -> f64 {
    1.0
}

fn default_border_color() -> String {
    "000000".to_string()
}

/// Borders per side. A missing side is unset, which is not the same as an
/// explicit `none` border.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderSet {
    #[serde(default, alias = "left")]
    pub start: Option<TableBorder>,
    #[serde(default, alias = "right")]
    pub end: Option<TableBorder>,
    #[serde(default)]
    pub top: Option<TableBorder>,
    #[serde(default)]
    pub bottom: Option<TableBorder>,
}

impl BorderSet {
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.end.is_none()
            && self.top.is_none()
            && self.bottom.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginSet {
    #[serde(default, alias = "left")]
    pub start: Option<f64>,
    #[serde(default, alias = "right")]
    pub end: Option<f64>,
    #[serde(default)]
    pub top: Option<f64>,
    #[serde(default)]
    pub bottom: Option<f64>,
}

impl MarginSet {
    /// Per side, keep our value or take the one from `outer`.
    pub fn layered_over(&self, outer: &MarginSet) -> MarginSet {
        MarginSet {
            start: self.start.or(outer.start),
            end: self.end.or(outer.end),
            top: self.top.or(outer.top),
            bottom: self.bottom.or(outer.bottom),
        }
    }
}
