//! # Docflow
//!
//! A flowed-document layout engine for word-processor content.
//!
//! Documents arrive as a tree of paragraphs and tables whose formatting is
//! spread over named styles, numbering levels and document defaults. Docflow
//! resolves that formatting, fits text into lines against a single vertical
//! cursor, sizes table rows and merged cells, and finally hands positioned
//! content to a painter. Pagination is left to the driver.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON)
//!       ↓
//!   [model]    Document tree: paragraphs, runs, tables, layout slots
//!       ↓
//!   [style]    Style graph and property resolution
//!       ↓
//!   [layout]   Virtual flow, paragraph and table layout
//!       ↓          ([text] fits runs into lines, [font] measures)
//!   [render]   Paint commands
//! ```

pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod render;
pub mod style;
pub mod text;

use error::Result;
use layout::{LayoutEngine, LayoutSummary};
use model::Document;
use render::{DisplayList, Renderer};

/// Lay out a document described as JSON.
///
/// Returns the document with every layout slot filled, plus the summary.
pub fn layout_json(json: &str) -> Result<(Document, LayoutSummary)> {
    let mut document: Document = serde_json::from_str(json)?;
    let summary = LayoutEngine::new().layout(&mut document)?;
    Ok((document, summary))
}

/// Lay out and paint a document described as JSON.
///
/// This is the one-call pipeline: the returned list holds every paint
/// command in painting order.
pub fn render_json(json: &str) -> Result<DisplayList> {
    let mut document: Document = serde_json::from_str(json)?;
    let mut engine = LayoutEngine::new();
    engine.layout(&mut document)?;
    let mut list = DisplayList::new();
    Renderer::new(engine.fonts()).render(&document.body, &mut list)?;
    Ok(list)
}
