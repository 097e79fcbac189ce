//! The style graph: an arena of named style definitions.
//!
//! Based-on relations are stored as ids and looked up on demand, never as
//! embedded references. The graph is built once per document and is
//! read-only afterwards, so it can be shared freely during layout.

use std::collections::{HashMap, HashSet};

use log::warn;
use serde::{Deserialize, Serialize};

use super::{NumberingDefinition, NumberingRef, ParProps, RunProps, StyleId};
use crate::error::{DocflowError, Result};

/// A style definition: optional run and paragraph overrides plus a link to
/// the style it is based on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleNode {
    #[serde(default)]
    pub based_on: Option<StyleId>,
    #[serde(default)]
    pub run: Option<RunProps>,
    #[serde(default)]
    pub paragraph: Option<ParProps>,
}

/// A named style as it appears in the input document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedStyle {
    pub id: StyleId,
    #[serde(flatten)]
    pub node: StyleNode,
}

#[derive(Debug, Default)]
pub struct StyleGraph {
    nodes: HashMap<StyleId, StyleNode>,
    doc_defaults: Option<StyleNode>,
    numbering_styles: HashMap<NumberingRef, StyleId>,
}

impl StyleGraph {
    /// Build the arena, register one node per numbering level, and reject
    /// based-on cycles. Dangling references are logged and left in place;
    /// lookups treat them as "no base style".
    pub fn build(
        styles: Vec<NamedStyle>,
        doc_defaults: Option<StyleNode>,
        numberings: &[NumberingDefinition],
    ) -> Result<Self> {
        let mut graph = StyleGraph {
            nodes: HashMap::with_capacity(styles.len()),
            doc_defaults,
            numbering_styles: HashMap::new(),
        };

        for style in styles {
            if graph.nodes.insert(style.id.clone(), style.node).is_some() {
                warn!("Duplicate style definition '{}', keeping the last one", style.id);
            }
        }

        for def in numberings {
            for (level, lvl) in def.levels.iter().enumerate() {
                if lvl.run.is_none() && lvl.paragraph.is_none() {
                    continue;
                }
                let id = StyleId(format!("numbering:{}:{}", def.id, level));
                graph.nodes.insert(
                    id.clone(),
                    StyleNode {
                        based_on: None,
                        run: lvl.run.clone(),
                        paragraph: lvl.paragraph.clone(),
                    },
                );
                graph.numbering_styles.insert(
                    NumberingRef {
                        num_id: def.id,
                        level,
                    },
                    id,
                );
            }
        }

        graph.report_dangling();
        graph.reject_cycles()?;
        Ok(graph)
    }

    pub fn get(&self, id: &StyleId) -> Option<&StyleNode> {
        self.nodes.get(id)
    }

    pub fn doc_defaults(&self) -> Option<&StyleNode> {
        self.doc_defaults.as_ref()
    }

    /// The style node attached to a numbering level, if that level has one.
    pub fn numbering_style(&self, numbering: &NumberingRef) -> Option<&StyleId> {
        self.numbering_styles.get(numbering)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every outgoing link of a node: its own based-on, the run's character
    /// style, the paragraph style and the numbering level style.
    fn links<'a>(&'a self, node: &'a StyleNode) -> impl Iterator<Item = &'a StyleId> + 'a {
        let run = node.run.as_ref().and_then(|r| r.style.as_ref());
        let par = node.paragraph.as_ref().and_then(|p| p.style.as_ref());
        let num = node
            .paragraph
            .as_ref()
            .and_then(|p| p.numbering.as_ref())
            .and_then(|n| self.numbering_styles.get(n));
        node.based_on.iter().chain(run).chain(par).chain(num)
    }

    fn report_dangling(&self) {
        let mut reported: HashSet<&StyleId> = HashSet::new();
        let all = self.nodes.values().chain(self.doc_defaults.iter());
        for node in all {
            for link in self.links(node) {
                if !self.nodes.contains_key(link) && reported.insert(link) {
                    warn!("Unknown style '{link}' referenced as a base style; ignoring the link");
                }
            }
        }
    }

    fn reject_cycles(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        let mut marks: HashMap<&StyleId, Mark> = HashMap::with_capacity(self.nodes.len());
        // Iterative DFS; each frame holds a node id and its pending links.
        for start in self.nodes.keys() {
            if marks.contains_key(start) {
                continue;
            }
            let mut stack: Vec<(&StyleId, Vec<&StyleId>)> = Vec::new();
            marks.insert(start, Mark::Visiting);
            stack.push((start, self.pending_links(start)));

            while let Some((id, pending)) = stack.last_mut() {
                match pending.pop() {
                    Some(next) => match marks.get(next) {
                        Some(Mark::Visiting) => {
                            return Err(DocflowError::StyleCycle {
                                id: next.to_string(),
                            });
                        }
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(next, Mark::Visiting);
                            let links = self.pending_links(next);
                            stack.push((next, links));
                        }
                    },
                    None => {
                        marks.insert(*id, Mark::Done);
                        stack.pop();
                    }
                }
            }
        }
        Ok(())
    }

    fn pending_links(&self, id: &StyleId) -> Vec<&StyleId> {
        match self.nodes.get(id) {
            Some(node) => self
                .links(node)
                .filter(|l| self.nodes.contains_key(*l))
                .collect(),
            None => Vec::new(),
        }
    }
}
