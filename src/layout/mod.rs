//! # Layout Engine
//!
//! Drives one layout pass over a document:
//!
//! 1. Register the document's custom fonts
//! 2. Build the style graph (rejecting based-on cycles)
//! 3. Synthesize numbering prefixes for list paragraphs, in document order
//! 4. Create the section flow and lay out every block against it
//!
//! Paragraphs and tables never share a mutable flow: the body shares one
//! cursor sequentially, table cells get their own, and numbering prefixes are
//! laid out on a clone. Only the [`ContentExtent`] is threaded through all of
//! them.

pub mod flow;
pub mod paragraph;
pub mod table;

use std::cell::RefCell;
use std::collections::HashSet;

use log::{debug, info, warn};
use serde::Serialize;

use crate::error::{DocflowError, Result};
use crate::font::{FontContext, FontKey};
use crate::image_loader;
use crate::model::{Block, Document, LayoutConfig, Paragraph, TextRun};
use crate::style::numbering::NumberingState;
use crate::style::{NumberingDefinition, StyleGraph, StyleResolver};

use flow::{ContentExtent, VirtualFlow};

/// Everything a block needs while it is being laid out.
pub struct LayoutContext<'a> {
    pub fonts: &'a FontContext,
    pub styles: StyleResolver<'a>,
    pub config: &'a LayoutConfig,
    warned_families: RefCell<HashSet<String>>,
}

impl<'a> LayoutContext<'a> {
    pub fn new(fonts: &'a FontContext, styles: StyleResolver<'a>, config: &'a LayoutConfig) -> Self {
        Self {
            fonts,
            styles,
            config,
            warned_families: RefCell::new(HashSet::new()),
        }
    }

    /// Warn once per unknown family; measurement falls back to the default face.
    pub fn check_family(&self, family: &str) {
        if self.fonts.has_family(family) {
            return;
        }
        if self.warned_families.borrow_mut().insert(family.to_string()) {
            warn!("Unknown font family '{family}', measuring with the default face");
        }
    }
}

/// What a layout pass produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSummary {
    /// Lowest point reached, counting empty paragraphs.
    pub content_height: f64,
    pub content_width: f64,
    pub blocks: usize,
    pub extent: ContentExtent,
}

pub struct LayoutEngine {
    fonts: FontContext,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self {
            fonts: FontContext::new(),
        }
    }

    pub fn with_fonts(fonts: FontContext) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &FontContext {
        &self.fonts
    }

    /// Lay out every block of the document in place.
    pub fn layout(&mut self, document: &mut Document) -> Result<LayoutSummary> {
        self.register_fonts(document)?;

        let graph = StyleGraph::build(
            document.styles.clone(),
            document.doc_defaults.clone(),
            &document.numberings,
        )?;
        debug!(
            "Style graph: {} node(s), {} block(s)",
            graph.len(),
            document.body.len()
        );
        synthesize_numbering(&mut document.body, &document.numberings);

        let styles = StyleResolver::new(&graph).with_max_depth(document.config.max_style_depth);
        let ctx = LayoutContext::new(&self.fonts, styles, &document.config);
        let mut flow = VirtualFlow::from_section(&document.section, &document.config);
        let mut extent = ContentExtent::new();

        for block in &mut document.body {
            match block {
                Block::Paragraph(par) => {
                    paragraph::layout_paragraph(par, &ctx, &mut flow, &mut extent)?
                }
                Block::Table(table) => table::layout_table(table, &ctx, &mut flow, &mut extent)?,
            }
        }

        let summary = LayoutSummary {
            content_height: extent.max_y(true),
            content_width: extent.max_x(),
            blocks: document.body.len(),
            extent,
        };
        info!(
            "Laid out {} block(s), content height {:.1}",
            summary.blocks, summary.content_height
        );
        Ok(summary)
    }

    fn register_fonts(&mut self, document: &Document) -> Result<()> {
        for entry in &document.fonts {
            let data = image_loader::read_source_bytes(&entry.src).map_err(|e| {
                DocflowError::Font(format!("Font '{}': {e}", entry.family))
            })?;
            self.fonts.register_font_data(
                FontKey::new(&entry.family, entry.bold, entry.italic),
                &data,
            )?;
        }
        Ok(())
    }
}

/// Give every list paragraph its prefix run, counting in document order
/// (table cells included).
fn synthesize_numbering(body: &mut [Block], numberings: &[NumberingDefinition]) {
    let mut state = NumberingState::new();
    for block in body {
        match block {
            Block::Paragraph(par) => attach_prefix(par, numberings, &mut state),
            Block::Table(table) => {
                for par in table
                    .rows
                    .iter_mut()
                    .flat_map(|row| row.cells.iter_mut())
                    .flat_map(|cell| cell.paragraphs.iter_mut())
                {
                    attach_prefix(par, numberings, &mut state);
                }
            }
        }
    }
}

fn attach_prefix(par: &mut Paragraph, numberings: &[NumberingDefinition], state: &mut NumberingState) {
    let Some(numbering) = par.props.numbering else {
        return;
    };
    let Some(def) = numberings.iter().find(|d| d.id == numbering.num_id) else {
        warn!("Paragraph refers to unknown numbering {}", numbering.num_id);
        return;
    };
    let Some(prefix) = state.next_prefix(def, numbering.level) else {
        warn!(
            "Numbering {} has no level {}",
            numbering.num_id, numbering.level
        );
        return;
    };
    if prefix.is_empty() {
        return;
    }
    let props = def
        .levels
        .get(numbering.level)
        .and_then(|level| level.run.clone())
        .unwrap_or_default();
    par.numbering_run = Some(TextRun::new(format!("{prefix}\t"), props));
}
