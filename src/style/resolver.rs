//! Cascading property resolution.
//!
//! A property is looked up along a fixed order of fallbacks; the first
//! source that sets it wins:
//!
//! 1. the run's own overrides
//! 2. the run's character style, recursively
//! 3. the paragraph's own overrides
//! 4. the numbering level style of a list paragraph, recursively
//! 5. the paragraph style, recursively
//! 6. the style the current definition is itself based on, recursively
//! 7. the document defaults, then the property's hard default
//!
//! Each [`Property`] carries its own pair of extractors, so unrelated
//! properties walk their chains independently even though the order is shared.

use std::collections::HashSet;

use log::trace;

use super::{
    ComputedStyle, Justification, ParProps, RunProps, StyleGraph, StyleId, StyleNode, TabStop,
    UnderlineMode,
};
use crate::error::{DocflowError, Result};

/// Default bound on the number of chained style hops in one lookup.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// A resolvable property: where to read it at run level, where to read it at
/// paragraph level, and what to use when nothing sets it.
pub struct Property<T> {
    pub name: &'static str,
    pub run: fn(&RunProps) -> Option<T>,
    pub par: fn(&ParProps) -> Option<T>,
    pub default: fn() -> T,
}

/// The property table.
pub mod props {
    use super::*;

    pub const BOLD: Property<bool> = Property {
        name: "bold",
        run: |r| r.bold,
        par: |_| None,
        default: || false,
    };
    pub const ITALIC: Property<bool> = Property {
        name: "italic",
        run: |r| r.italic,
        par: |_| None,
        default: || false,
    };
    pub const UNDERLINE: Property<UnderlineMode> = Property {
        name: "underline",
        run: |r| r.underline,
        par: |_| None,
        default: || UnderlineMode::None,
    };
    pub const STRIKE: Property<bool> = Property {
        name: "strike",
        run: |r| r.strike,
        par: |_| None,
        default: || false,
    };
    pub const DOUBLE_STRIKE: Property<bool> = Property {
        name: "doubleStrike",
        run: |r| r.double_strike,
        par: |_| None,
        default: || false,
    };
    pub const FONT_FAMILY: Property<String> = Property {
        name: "fontFamily",
        run: |r| r.font_family.clone(),
        par: |_| None,
        default: || "Arial".to_string(),
    };
    pub const FONT_SIZE: Property<f64> = Property {
        name: "fontSize",
        run: |r| r.font_size,
        par: |_| None,
        default: || 12.0,
    };
    pub const LETTER_SPACING: Property<f64> = Property {
        name: "letterSpacing",
        run: |r| r.letter_spacing,
        par: |_| None,
        default: || 0.0,
    };
    pub const CHAR_STRETCH: Property<f64> = Property {
        name: "charStretch",
        run: |r| r.char_stretch,
        par: |_| None,
        default: || 1.0,
    };
    pub const COLOR: Property<String> = Property {
        name: "color",
        run: |r| r.color.clone(),
        par: |_| None,
        default: || "000000".to_string(),
    };
    pub const SHADING_COLOR: Property<Option<String>> = Property {
        name: "shadingColor",
        run: |r| r.shading_color.clone().map(Some),
        par: |_| None,
        default: || None,
    };
    pub const CAPS: Property<bool> = Property {
        name: "caps",
        run: |r| r.caps,
        par: |_| None,
        default: || false,
    };
    pub const SMALL_CAPS: Property<bool> = Property {
        name: "smallCaps",
        run: |r| r.small_caps,
        par: |_| None,
        default: || false,
    };
    pub const INVISIBLE: Property<bool> = Property {
        name: "invisible",
        run: |r| r.invisible,
        par: |_| None,
        default: || false,
    };
    pub const JUSTIFICATION: Property<Justification> = Property {
        name: "justification",
        run: |_| None,
        par: |p| p.justification,
        default: || Justification::Left,
    };
    pub const INDENTATION: Property<f64> = Property {
        name: "indentation",
        run: |_| None,
        par: |p| p.indentation,
        default: || 0.0,
    };
    pub const HANGING: Property<f64> = Property {
        name: "hanging",
        run: |_| None,
        par: |p| p.hanging,
        default: || 0.0,
    };
    pub const SPACING_BEFORE: Property<f64> = Property {
        name: "spacingBefore",
        run: |_| None,
        par: |p| p.spacing_before,
        default: || 0.0,
    };
    pub const SPACING_AFTER: Property<f64> = Property {
        name: "spacingAfter",
        run: |_| None,
        par: |p| p.spacing_after,
        default: || 0.0,
    };
    pub const LINE_SPACING: Property<Option<f64>> = Property {
        name: "lineSpacing",
        run: |_| None,
        par: |p| p.line_spacing.map(Some),
        default: || None,
    };
    pub const TAB_STOPS: Property<Vec<TabStop>> = Property {
        name: "tabStops",
        run: |_| None,
        par: |p| p.tab_stops.clone(),
        default: Vec::new,
    };
}

/// Read-only view over a [`StyleGraph`] that answers property lookups.
#[derive(Debug, Clone, Copy)]
pub struct StyleResolver<'g> {
    graph: &'g StyleGraph,
    max_depth: usize,
}

impl<'g> StyleResolver<'g> {
    pub fn new(graph: &'g StyleGraph) -> Self {
        Self {
            graph,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn graph(&self) -> &'g StyleGraph {
        self.graph
    }

    /// Effective value of `prop` for a run with the given run-level and
    /// paragraph-level overrides. Always produces a value unless a chain
    /// runs past the depth bound.
    pub fn resolve<T>(
        &self,
        prop: &Property<T>,
        run: Option<&RunProps>,
        par: Option<&ParProps>,
    ) -> Result<T> {
        let mut visited = HashSet::new();
        if let Some(value) = self.lookup(prop, run, par, None, 0, &mut visited)? {
            return Ok(value);
        }
        if let Some(defaults) = self.graph.doc_defaults() {
            if let Some(value) = self.lookup_node(prop, defaults, 1, &mut visited)? {
                trace!("{} taken from document defaults", prop.name);
                return Ok(value);
            }
        }
        Ok((prop.default)())
    }

    /// Effective value of `prop` for a named style on its own.
    pub fn resolve_named<T>(&self, prop: &Property<T>, id: &StyleId) -> Result<T> {
        let base = StyleNode {
            based_on: Some(id.clone()),
            ..Default::default()
        };
        if let Some(value) = self.lookup_node(prop, &base, 0, &mut HashSet::new())? {
            return Ok(value);
        }
        self.resolve(prop, None, None)
    }

    /// Resolve every property at once into a concrete snapshot.
    pub fn compute(&self, run: Option<&RunProps>, par: Option<&ParProps>) -> Result<ComputedStyle> {
        Ok(ComputedStyle {
            bold: self.resolve(&props::BOLD, run, par)?,
            italic: self.resolve(&props::ITALIC, run, par)?,
            underline: self.resolve(&props::UNDERLINE, run, par)?,
            strike: self.resolve(&props::STRIKE, run, par)?,
            double_strike: self.resolve(&props::DOUBLE_STRIKE, run, par)?,
            font_family: self.resolve(&props::FONT_FAMILY, run, par)?,
            font_size: self.resolve(&props::FONT_SIZE, run, par)?,
            letter_spacing: self.resolve(&props::LETTER_SPACING, run, par)?,
            char_stretch: self.resolve(&props::CHAR_STRETCH, run, par)?,
            color: self.resolve(&props::COLOR, run, par)?,
            shading_color: self.resolve(&props::SHADING_COLOR, run, par)?,
            caps: self.resolve(&props::CAPS, run, par)?,
            small_caps: self.resolve(&props::SMALL_CAPS, run, par)?,
            invisible: self.resolve(&props::INVISIBLE, run, par)?,
            justification: self.resolve(&props::JUSTIFICATION, run, par)?,
            indentation: self.resolve(&props::INDENTATION, run, par)?,
            hanging: self.resolve(&props::HANGING, run, par)?,
            spacing_before: self.resolve(&props::SPACING_BEFORE, run, par)?,
            spacing_after: self.resolve(&props::SPACING_AFTER, run, par)?,
            line_spacing: self.resolve(&props::LINE_SPACING, run, par)?,
            tab_stops: self.resolve(&props::TAB_STOPS, run, par)?,
        })
    }

    // A style reached twice in one lookup already came up empty the first
    // time, so `visited` prunes it without changing the winner.
    fn lookup<'a, T>(
        &'a self,
        prop: &Property<T>,
        run: Option<&'a RunProps>,
        par: Option<&'a ParProps>,
        based_on: Option<&'a StyleId>,
        depth: usize,
        visited: &mut HashSet<&'a StyleId>,
    ) -> Result<Option<T>> {
        if depth > self.max_depth {
            return Err(DocflowError::ResolutionOverflow {
                property: prop.name,
                depth,
            });
        }

        if let Some(run) = run {
            if let Some(value) = (prop.run)(run) {
                return Ok(Some(value));
            }
            if let Some(value) = self.lookup_id(prop, run.style.as_ref(), depth, visited)? {
                return Ok(Some(value));
            }
        }

        if let Some(par) = par {
            if let Some(value) = (prop.par)(par) {
                return Ok(Some(value));
            }
            let numbering_style = par
                .numbering
                .as_ref()
                .and_then(|n| self.graph.numbering_style(n));
            if let Some(value) = self.lookup_id(prop, numbering_style, depth, visited)? {
                return Ok(Some(value));
            }
            if let Some(value) = self.lookup_id(prop, par.style.as_ref(), depth, visited)? {
                return Ok(Some(value));
            }
        }

        self.lookup_id(prop, based_on, depth, visited)
    }

    /// Follow one link. Unknown ids end the chain silently.
    fn lookup_id<'a, T>(
        &'a self,
        prop: &Property<T>,
        id: Option<&'a StyleId>,
        depth: usize,
        visited: &mut HashSet<&'a StyleId>,
    ) -> Result<Option<T>> {
        let Some(id) = id else {
            return Ok(None);
        };
        if !visited.insert(id) {
            return Ok(None);
        }
        match self.graph.get(id) {
            Some(node) => self.lookup_node(prop, node, depth + 1, visited),
            None => Ok(None),
        }
    }

    fn lookup_node<'a, T>(
        &'a self,
        prop: &Property<T>,
        node: &'a StyleNode,
        depth: usize,
        visited: &mut HashSet<&'a StyleId>,
    ) -> Result<Option<T>> {
        self.lookup(
            prop,
            node.run.as_ref(),
            node.paragraph.as_ref(),
            node.based_on.as_ref(),
            depth,
            visited,
        )
    }
}
