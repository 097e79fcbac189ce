//! # Font Metrics
//!
//! Everything the text fitter needs to know about a face: average character
//! width, per-character advances, and the vertical metrics that turn a flow
//! position (top of line) into a baseline and back.
//!
//! Built-in faces carry only averaged metrics, which is what line fitting
//! works with anyway. Custom TrueType/OpenType faces are parsed with
//! ttf-parser and measure with their real advances.

use std::collections::HashMap;

use log::debug;

use crate::error::{DocflowError, Result};
use crate::style::ComputedStyle;

/// Width factor applied when a bold face is requested but only the regular
/// face is registered.
const SYNTHETIC_BOLD: f64 = 1.05;

/// Metrics of one face, in em units (1.0 = font size).
#[derive(Debug, Clone)]
pub struct FaceMetrics {
    pub average_advance: f64,
    pub ascent: f64,
    pub descent: f64,
    pub line_gap: f64,
    advances: HashMap<char, f64>,
}

impl FaceMetrics {
    /// A face where every character has the same advance.
    pub fn uniform(advance: f64, ascent: f64, descent: f64, line_gap: f64) -> Self {
        Self {
            average_advance: advance,
            ascent,
            descent,
            line_gap,
            advances: HashMap::new(),
        }
    }

    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Result<Self> {
        let face = ttf_parser::Face::parse(data, 0)
            .map_err(|e| DocflowError::Font(format!("Unable to parse font: {e}")))?;
        let units_per_em = f64::from(face.units_per_em());

        let mut advances = HashMap::new();
        let mut total = 0.0;
        let mut counted = 0u32;
        // Printable ASCII and Latin-1 cover what the fitter averages over.
        for ch in (0x20u32..=0x7E).chain(0xA0..=0xFF).filter_map(char::from_u32) {
            if let Some(advance) = face
                .glyph_index(ch)
                .and_then(|glyph| face.glyph_hor_advance(glyph))
            {
                let em = f64::from(advance) / units_per_em;
                advances.insert(ch, em);
                if ch.is_ascii_alphanumeric() {
                    total += em;
                    counted += 1;
                }
            }
        }

        let average_advance = if counted > 0 {
            total / f64::from(counted)
        } else {
            0.5
        };

        Ok(Self {
            average_advance,
            ascent: f64::from(face.ascender()) / units_per_em,
            descent: -f64::from(face.descender()) / units_per_em,
            line_gap: f64::from(face.line_gap()) / units_per_em,
            advances,
        })
    }

    fn advance(&self, ch: char) -> f64 {
        self.advances
            .get(&ch)
            .copied()
            .unwrap_or(self.average_advance)
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            bold,
            italic,
        }
    }
}

/// A face looked up for a style, with the scale to apply to its advances.
struct Selected<'a> {
    face: &'a FaceMetrics,
    width_factor: f64,
}

/// Registry of faces plus the measurement operations built on it.
pub struct FontContext {
    faces: HashMap<FontKey, FaceMetrics>,
    fallback: FaceMetrics,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    pub fn new() -> Self {
        let builtin = [
            ("Arial", FaceMetrics::uniform(0.52, 0.905, 0.212, 0.033)),
            ("Helvetica", FaceMetrics::uniform(0.52, 0.905, 0.212, 0.033)),
            ("Verdana", FaceMetrics::uniform(0.58, 1.005, 0.21, 0.0)),
            ("Calibri", FaceMetrics::uniform(0.47, 0.75, 0.25, 0.221)),
            ("Times New Roman", FaceMetrics::uniform(0.45, 0.891, 0.216, 0.042)),
            ("Georgia", FaceMetrics::uniform(0.5, 0.917, 0.219, 0.0)),
            ("Courier New", FaceMetrics::uniform(0.6, 0.833, 0.3, 0.0)),
        ];

        let mut faces = HashMap::new();
        for (family, metrics) in builtin {
            faces.insert(FontKey::new(family, false, false), metrics);
        }

        Self {
            faces,
            fallback: FaceMetrics::uniform(0.52, 0.905, 0.212, 0.033),
        }
    }

    /// Register a face under an explicit key.
    pub fn register_face(&mut self, key: FontKey, metrics: FaceMetrics) {
        debug!(
            "Registered face '{}' (bold: {}, italic: {})",
            key.family, key.bold, key.italic
        );
        self.faces.insert(key, metrics);
    }

    /// Parse and register a TrueType/OpenType font.
    pub fn register_font_data(&mut self, key: FontKey, data: &[u8]) -> Result<()> {
        let metrics = FaceMetrics::from_font_data(data)?;
        self.register_face(key, metrics);
        Ok(())
    }

    pub fn has_family(&self, family: &str) -> bool {
        self.faces.keys().any(|k| k.family == family)
    }

    /// Exact face, then the regular face of the family (emboldened if
    /// needed), then the fallback face.
    fn select(&self, style: &ComputedStyle) -> Selected<'_> {
        let exact = FontKey::new(&style.font_family, style.bold, style.italic);
        if let Some(face) = self.faces.get(&exact) {
            return Selected {
                face,
                width_factor: style.char_stretch,
            };
        }

        let bold_factor = if style.bold { SYNTHETIC_BOLD } else { 1.0 };
        let regular = FontKey::new(&style.font_family, false, false);
        let face = self.faces.get(&regular).unwrap_or(&self.fallback);
        Selected {
            face,
            width_factor: style.char_stretch * bold_factor,
        }
    }

    /// Width of an "average" character, including letter spacing.
    pub fn average_char_width(&self, style: &ComputedStyle) -> f64 {
        let selected = self.select(style);
        selected.face.average_advance * style.font_size * selected.width_factor
            + style.letter_spacing
    }

    /// How many average characters fit into `width`.
    pub fn fit_characters(&self, width: f64, style: &ComputedStyle) -> usize {
        let average = self.average_char_width(style);
        if average <= 0.0 || width <= 0.0 {
            return 0;
        }
        (width / average).floor() as usize
    }

    pub fn text_width(&self, text: &str, style: &ComputedStyle) -> f64 {
        let selected = self.select(style);
        text.chars()
            .map(|ch| {
                selected.face.advance(ch) * style.font_size * selected.width_factor
                    + style.letter_spacing
            })
            .sum()
    }

    /// Distance from the top of a line to the text baseline.
    pub fn top_to_baseline(&self, style: &ComputedStyle) -> f64 {
        self.select(style).face.ascent * style.font_size
    }

    /// Distance from the baseline to the bottom of the line (descender room).
    pub fn baseline_to_bottom(&self, style: &ComputedStyle) -> f64 {
        self.select(style).face.descent * style.font_size
    }

    /// Line pitch: the paragraph's explicit value, or the face's natural one.
    pub fn line_spacing(&self, style: &ComputedStyle) -> f64 {
        if let Some(spacing) = style.line_spacing {
            return spacing;
        }
        let face = self.select(style).face;
        (face.ascent + face.descent + face.line_gap) * style.font_size
    }
}
