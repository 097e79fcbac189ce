//! # Style System
//!
//! Word-processor styles: run-level character properties, paragraph-level
//! properties, and named style definitions linked by "based-on" references.
//!
//! Nothing here is ever mutated after the document is built. Effective values
//! are computed on demand by walking fallback chains (see [`resolver`]), and a
//! [`ComputedStyle`] snapshot is what the text fitter and the renderer use.

pub mod graph;
pub mod numbering;
pub mod resolver;

pub use graph::{StyleGraph, StyleNode};
pub use numbering::{NumberFormat, NumberingDefinition, NumberingLevel, NumberingRef};
pub use resolver::{props, Property, StyleResolver};

use serde::{Deserialize, Serialize};

/// Stable identifier of a named style (`"Heading1"`, `"Normal"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleId(pub String);

impl StyleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StyleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for StyleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Horizontal alignment of the lines in a paragraph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Justification {
    #[default]
    #[serde(alias = "start")]
    Left,
    Center,
    #[serde(alias = "end")]
    Right,
    /// Full justification: every line but the last stretches to the width.
    #[serde(alias = "full", alias = "distribute")]
    Both,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnderlineMode {
    #[default]
    None,
    Dash,
    DashDotDotHeavy,
    DashDotHeavy,
    DashedHeavy,
    DashLong,
    DashLongHeavy,
    DotDash,
    DotDotDash,
    Dotted,
    DottedHeavy,
    Double,
    Single,
    Thick,
    Wave,
    WavyDouble,
    WavyHeavy,
    Words,
}

/// A tab stop declared by a paragraph, relative to the flow's origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabStop {
    pub position: f64,
    /// A clearing stop removes an inherited stop at the same position.
    #[serde(default)]
    pub clear: bool,
}

/// Direct run-level (character) overrides. `None` means "not set here".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunProps {
    /// Character style this run is based on.
    pub style: Option<StyleId>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<UnderlineMode>,
    pub strike: Option<bool>,
    pub double_strike: Option<bool>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    /// Extra space added after every character.
    pub letter_spacing: Option<f64>,
    /// Horizontal scale factor (1.0 = 100%).
    pub char_stretch: Option<f64>,
    /// Hex RGB, without '#'.
    pub color: Option<String>,
    pub shading_color: Option<String>,
    pub caps: Option<bool>,
    pub small_caps: Option<bool>,
    pub invisible: Option<bool>,
}

/// Direct paragraph-level overrides. `None` means "not set here".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParProps {
    /// Paragraph style this paragraph is based on.
    pub style: Option<StyleId>,
    /// List membership; the numbering level's style is a fallback source.
    pub numbering: Option<NumberingRef>,
    pub justification: Option<Justification>,
    pub indentation: Option<f64>,
    pub hanging: Option<f64>,
    pub spacing_before: Option<f64>,
    pub spacing_after: Option<f64>,
    /// Explicit line pitch; when unset it derives from the font.
    pub line_spacing: Option<f64>,
    pub tab_stops: Option<Vec<TabStop>>,
}

/// Every property of a run resolved to a concrete value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: UnderlineMode,
    pub strike: bool,
    pub double_strike: bool,
    pub font_family: String,
    pub font_size: f64,
    pub letter_spacing: f64,
    pub char_stretch: f64,
    pub color: String,
    pub shading_color: Option<String>,
    pub caps: bool,
    pub small_caps: bool,
    pub invisible: bool,
    pub justification: Justification,
    pub indentation: f64,
    pub hanging: f64,
    pub spacing_before: f64,
    pub spacing_after: f64,
    pub line_spacing: Option<f64>,
    pub tab_stops: Vec<TabStop>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        ComputedStyle {
            bold: false,
            italic: false,
            underline: UnderlineMode::None,
            strike: false,
            double_strike: false,
            font_family: "Arial".to_string(),
            font_size: 12.0,
            letter_spacing: 0.0,
            char_stretch: 1.0,
            color: "000000".to_string(),
            shading_color: None,
            caps: false,
            small_caps: false,
            invisible: false,
            justification: Justification::Left,
            indentation: 0.0,
            hanging: 0.0,
            spacing_before: 0.0,
            spacing_after: 0.0,
            line_spacing: None,
            tab_stops: Vec::new(),
        }
    }
}

impl ComputedStyle {
    /// Horizontal start of a line relative to the flow origin.
    ///
    /// A hanging indent pulls the paragraph's first line back towards the
    /// margin; every later line starts at the plain indentation.
    pub fn indentation(&self, first_line_of_paragraph: bool) -> f64 {
        if first_line_of_paragraph {
            (self.indentation - self.hanging).max(0.0)
        } else {
            self.indentation
        }
    }

    /// Apply the caps transforms that happen before measurement.
    pub fn transform_case(&self, text: &str) -> String {
        if self.caps || self.small_caps {
            text.to_uppercase()
        } else {
            text.to_string()
        }
    }
}
