//! The virtual flow: a cursor over a rectangular content area.
//!
//! A flow is a plain value. Cloning it gives an independent cursor, which is
//! how scoped sub-layouts (numbering prefixes, table cells) avoid disturbing
//! the caller. Content-extent tracking does not live in the flow; it goes
//! through a [`ContentExtent`] the caller owns and passes down, so nothing is
//! lost when a clone is dropped.

use serde::Serialize;

use crate::model::{LayoutConfig, Section};

#[derive(Debug, Clone, PartialEq)]
pub struct VirtualFlow {
    x: f64,
    width: f64,
    y: f64,
    /// Active tab stops, relative to `x`, ascending.
    tab_stops: Vec<f64>,
    tab_interval: f64,
}

impl VirtualFlow {
    /// A flow spanning the full width of a page, starting at the top.
    pub fn from_page(width: f64) -> Self {
        Self {
            x: 0.0,
            width,
            y: 0.0,
            tab_stops: Vec::new(),
            tab_interval: LayoutConfig::default().default_tab_interval,
        }
    }

    /// The flow of a section: page width minus the side margins, starting
    /// below the top margin.
    pub fn from_section(section: &Section, config: &LayoutConfig) -> Self {
        let page_width = section.page_width.unwrap_or(config.default_page_width);
        Self {
            x: section.margin_left,
            width: (page_width - section.margin_left - section.margin_right).max(0.0),
            y: section.margin_top,
            tab_stops: Vec::new(),
            tab_interval: config.default_tab_interval,
        }
    }

    pub fn with_tab_interval(mut self, interval: f64) -> Self {
        self.tab_interval = interval;
        self
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn advance(&mut self, dy: f64) {
        self.y += dy;
    }

    /// An independent copy moved vertically by `offset`.
    pub fn clone_at(&self, offset: f64) -> Self {
        let mut flow = self.clone();
        flow.advance(offset);
        flow
    }

    /// A flow covering `x .. x + width` that starts at this flow's current y.
    /// Tab stops do not carry over into cells.
    pub fn create_cell_flow(&self, x: f64, width: f64) -> Self {
        Self {
            x,
            width: width.max(0.0),
            y: self.y,
            tab_stops: Vec::new(),
            tab_interval: self.tab_interval,
        }
    }

    pub fn add_tab_stop(&mut self, position: f64) {
        let idx = self.tab_stops.partition_point(|stop| *stop < position);
        if self.tab_stops.get(idx) != Some(&position) {
            self.tab_stops.insert(idx, position);
        }
    }

    pub fn remove_tab_stop(&mut self, position: f64) {
        self.tab_stops.retain(|stop| *stop != position);
    }

    pub fn tab_stops(&self) -> &[f64] {
        &self.tab_stops
    }

    /// Replace the active stops wholesale.
    pub fn set_tab_stops(&mut self, stops: Vec<f64>) {
        self.tab_stops = stops;
    }

    /// First stop strictly right of `offset`, or the next implicit stop.
    pub fn next_tab_stop(&self, offset: f64) -> f64 {
        if let Some(stop) = self.tab_stops.iter().find(|stop| **stop > offset) {
            return *stop;
        }
        if self.tab_interval <= 0.0 {
            return offset;
        }
        ((offset / self.tab_interval).floor() + 1.0) * self.tab_interval
    }

    /// Record that a paragraph starts at the current position.
    pub fn mark_paragraph_position(&self, extent: &mut ContentExtent) {
        extent.max_y_with_marks = extent.max_y_with_marks.max(self.y);
    }

    /// Record that content reached `x` (relative to the origin) on the
    /// current line.
    pub fn mark_character_position(&self, extent: &mut ContentExtent, x: f64) {
        extent.max_y = extent.max_y.max(self.y);
        extent.max_x = extent.max_x.max(self.x + x);
    }
}

/// High-water marks of the content laid out so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentExtent {
    max_x: f64,
    max_y: f64,
    max_y_with_marks: f64,
}

impl ContentExtent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    /// Lowest point reached by content; with `include_paragraph_marks`,
    /// empty paragraphs count as well.
    pub fn max_y(&self, include_paragraph_marks: bool) -> f64 {
        if include_paragraph_marks {
            self.max_y.max(self.max_y_with_marks)
        } else {
            self.max_y
        }
    }
}
