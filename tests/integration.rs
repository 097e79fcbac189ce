//! Integration tests for the docflow pipeline.
//!
//! These tests drive JSON documents from input to paint commands.
//! They verify:
//! - Document deserialization and style resolution order
//! - Line fitting and paragraph stacking against the page flow
//! - Table rows, spans and vertical merges
//! - Border precedence while painting
//! - Universal properties of resolution and fitting (proptest)

use docflow::error::DocflowError;
use docflow::font::{FaceMetrics, FontContext, FontKey};
use docflow::layout::flow::VirtualFlow;
use docflow::layout::LayoutEngine;
use docflow::model::*;
use docflow::render::{DisplayList, PaintCommand, Renderer};
use docflow::style::graph::NamedStyle;
use docflow::style::{
    props, ComputedStyle, Justification, RunProps, StyleGraph, StyleId, StyleNode, StyleResolver,
};
use docflow::text::{LineStart, TextFitter};
use proptest::prelude::*;

// ─── Helpers ────────────────────────────────────────────────────

/// A face where every character is one em wide, 0.75 em above the baseline
/// and 0.25 em below it.
fn mono_fonts() -> FontContext {
    let mut fonts = FontContext::new();
    fonts.register_face(
        FontKey::new("Mono", false, false),
        FaceMetrics::uniform(1.0, 0.75, 0.25, 0.0),
    );
    fonts
}

fn mono_style(size: f64) -> ComputedStyle {
    ComputedStyle {
        font_family: "Mono".to_string(),
        font_size: size,
        ..Default::default()
    }
}

fn parse(json: &str) -> Document {
    serde_json::from_str(json).expect("document should parse")
}

fn layout_mono(json: &str) -> (Document, docflow::layout::LayoutSummary) {
    let mut document = parse(json);
    let summary = LayoutEngine::with_fonts(mono_fonts())
        .layout(&mut document)
        .expect("layout should succeed");
    (document, summary)
}

fn paragraph(block: &Block) -> &Paragraph {
    match block {
        Block::Paragraph(p) => p,
        Block::Table(_) => panic!("expected a paragraph"),
    }
}

fn table(block: &Block) -> &Table {
    match block {
        Block::Table(t) => t,
        Block::Paragraph(_) => panic!("expected a table"),
    }
}

fn text_run(run: &Run) -> &TextRun {
    match run {
        Run::Text(t) => t,
        Run::Drawing(_) => panic!("expected a text run"),
    }
}

fn line_texts(run: &TextRun) -> Vec<&str> {
    run.lines()
        .expect("run should be laid out")
        .iter()
        .map(|l| l.text.as_str())
        .collect()
}

fn line_colors(list: &DisplayList) -> Vec<&str> {
    list.commands
        .iter()
        .filter_map(|c| match c {
            PaintCommand::Line { color, .. } => Some(color.as_str()),
            _ => None,
        })
        .collect()
}

// ─── Paragraphs ─────────────────────────────────────────────────

#[test]
fn test_full_justification_scenario() {
    let (document, summary) = layout_mono(
        r#"{
            "section": { "pageWidth": 300, "marginLeft": 0, "marginRight": 0, "marginTop": 0 },
            "body": [{
                "type": "paragraph",
                "props": { "justification": "full" },
                "runs": [{
                    "type": "text",
                    "props": { "fontFamily": "Mono", "fontSize": 20 },
                    "texts": ["aaaa bbbb cccc dddd"]
                }]
            }]
        }"#,
    );

    let par = paragraph(&document.body[0]);
    let run = text_run(&par.runs[0]);
    assert_eq!(line_texts(run), vec!["aaaa bbbb cccc ", "dddd"]);

    let lines = run.lines().unwrap();
    assert!(lines[0].stretched);
    assert!(!lines[1].stretched);
    assert_eq!(lines[0].y, 15.0);
    assert_eq!(lines[1].y, 35.0);

    let layout = par.layout.get("Paragraph").unwrap();
    assert_eq!(layout.style.justification, Justification::Both);
    assert_eq!(layout.height, 60.0);
    assert_eq!(summary.content_height, 60.0);
}

#[test]
fn test_empty_paragraph_takes_fallback_line() {
    let (document, summary) = layout_mono(
        r#"{
            "section": { "pageWidth": 300 },
            "body": [
                { "type": "paragraph" },
                { "type": "paragraph" }
            ]
        }"#,
    );
    let first = paragraph(&document.body[0]).layout.get("Paragraph").unwrap();
    let second = paragraph(&document.body[1]).layout.get("Paragraph").unwrap();
    assert_eq!(first.height, 10.0);
    assert_eq!(second.y, 10.0);
    // Only paragraph marks reached this far down.
    assert_eq!(summary.extent.max_y(false), 0.0);
    assert_eq!(summary.content_height, 10.0);
}

#[test]
fn test_line_feed_breaks_inside_run() {
    let (document, _) = layout_mono(
        r#"{
            "section": { "pageWidth": 1000 },
            "body": [{
                "type": "paragraph",
                "runs": [{
                    "type": "text",
                    "props": { "fontFamily": "Mono", "fontSize": 10 },
                    "texts": ["first line\nsecond"]
                }]
            }]
        }"#,
    );
    let run = text_run(&paragraph(&document.body[0]).runs[0]);
    assert_eq!(line_texts(run), vec!["first line", "second"]);
}

#[test]
fn test_runs_continue_on_the_same_line() {
    let (document, _) = layout_mono(
        r#"{
            "section": { "pageWidth": 1000 },
            "body": [{
                "type": "paragraph",
                "runs": [
                    { "type": "text", "props": { "fontFamily": "Mono", "fontSize": 10 }, "texts": ["abc"] },
                    { "type": "text", "props": { "fontFamily": "Mono", "fontSize": 10, "bold": true }, "texts": ["def"] }
                ]
            }]
        }"#,
    );
    let par = paragraph(&document.body[0]);
    let first = &text_run(&par.runs[0]).lines().unwrap()[0];
    let second = &text_run(&par.runs[1]).lines().unwrap()[0];
    assert_eq!(first.y, second.y);
    assert!(second.following);
    assert_eq!(second.x, 30.0);
    assert!(second.bold);
}

#[test]
fn test_text_fragments_join_with_spaces() {
    let (document, _) = layout_mono(
        r#"{
            "section": { "pageWidth": 1000 },
            "body": [{
                "type": "paragraph",
                "runs": [{
                    "type": "text",
                    "props": { "fontFamily": "Mono", "fontSize": 10 },
                    "texts": ["Hello", "world"]
                }]
            }]
        }"#,
    );
    let par = paragraph(&document.body[0]);
    assert_eq!(line_texts(text_run(&par.runs[0])), vec!["Hello world"]);
    assert_eq!(par.runs[0].last_x().unwrap(), 110.0);
}

#[test]
fn test_spacer_run_after_paragraph_starts_a_fresh_line() {
    let (document, _) = layout_mono(
        r#"{
            "section": { "pageWidth": 1000 },
            "body": [
                { "type": "paragraph", "runs": [
                    { "type": "text", "props": { "fontFamily": "Mono", "fontSize": 10 }, "texts": ["above"] }
                ] },
                { "type": "paragraph", "runs": [
                    { "type": "text", "props": { "fontFamily": "Mono", "fontSize": 10 }, "texts": [" "] },
                    { "type": "text", "props": { "fontFamily": "Mono", "fontSize": 10 }, "texts": ["below"] }
                ] }
            ]
        }"#,
    );
    let above = &text_run(&paragraph(&document.body[0]).runs[0]).lines().unwrap()[0];
    let second = paragraph(&document.body[1]);
    let below = &text_run(&second.runs[1]).lines().unwrap()[0];
    let top = second.layout.get("Paragraph").unwrap().y;
    assert_eq!(top, 20.0);
    assert_eq!(below.y, top + 7.5);
    assert!(below.y > above.y + 10.0);
    assert!(!below.following);
}

#[test]
fn test_style_resolution_order() {
    let (document, _) = layout_mono(
        r#"{
            "docDefaults": { "run": { "color": "333333" } },
            "styles": [
                { "id": "Base", "run": { "fontSize": 30, "fontFamily": "Mono" } },
                { "id": "Body", "basedOn": "Base", "paragraph": { "justification": "center" } },
                { "id": "Strong", "run": { "bold": true, "fontSize": 14 } }
            ],
            "body": [{
                "type": "paragraph",
                "props": { "style": "Body" },
                "runs": [
                    { "type": "text", "texts": ["plain"] },
                    { "type": "text", "props": { "style": "Strong" }, "texts": ["strong"] },
                    { "type": "text", "props": { "style": "Strong", "fontSize": 8 }, "texts": ["small"] }
                ]
            }]
        }"#,
    );
    let par = paragraph(&document.body[0]);
    let styles: Vec<&ComputedStyle> = par
        .runs
        .iter()
        .map(|r| &text_run(r).layout.get("Text run").unwrap().style)
        .collect();

    // Paragraph style chain, then document defaults.
    assert_eq!(styles[0].font_size, 30.0);
    assert_eq!(styles[0].justification, Justification::Center);
    assert_eq!(styles[0].color, "333333");
    assert!(!styles[0].bold);
    // Character style beats the paragraph style.
    assert_eq!(styles[1].font_size, 14.0);
    assert!(styles[1].bold);
    assert_eq!(styles[1].font_family, "Mono");
    // Local value beats everything.
    assert_eq!(styles[2].font_size, 8.0);
}

#[test]
fn test_numbered_list_prefix_and_indent() {
    let (document, _) = layout_mono(
        r#"{
            "section": { "pageWidth": 600 },
            "numberings": [{
                "id": 7,
                "levels": [{
                    "format": "lowerLetter",
                    "text": "%1)",
                    "run": { "fontFamily": "Mono", "fontSize": 10 },
                    "paragraph": { "indentation": 40, "hanging": 40 }
                }]
            }],
            "body": [
                { "type": "paragraph", "props": { "numbering": { "numId": 7 } },
                  "runs": [{ "type": "text", "props": { "fontFamily": "Mono", "fontSize": 10 }, "texts": ["alpha"] }] },
                { "type": "paragraph", "props": { "numbering": { "numId": 7 } },
                  "runs": [{ "type": "text", "props": { "fontFamily": "Mono", "fontSize": 10 }, "texts": ["beta"] }] }
            ]
        }"#,
    );
    let second = paragraph(&document.body[1]);
    let prefix = second.numbering_run.as_ref().expect("prefix run");
    assert_eq!(prefix.text(), "b)\t");
    assert_eq!(prefix.lines().unwrap()[0].x, 0.0);
    // The prefix ends before the hanging indentation, so the text starts there.
    assert_eq!(text_run(&second.runs[0]).lines().unwrap()[0].x, 40.0);
}

// ─── Tables ─────────────────────────────────────────────────────

#[test]
fn test_vertical_merge_extends_restart_cell() {
    let (document, _) = layout_mono(
        r#"{
            "section": { "pageWidth": 400 },
            "body": [{
                "type": "table",
                "columns": [{ "width": 100 }, { "width": 100 }],
                "rows": [
                    { "cells": [
                        { "vMerge": "restart", "paragraphs": [{ "runs": [{ "type": "text", "props": { "fontFamily": "Mono", "fontSize": 10 }, "texts": ["merged"] }] }] },
                        { "paragraphs": [{ "runs": [{ "type": "text", "props": { "fontFamily": "Mono", "fontSize": 10 }, "texts": ["r1"] }] }] }
                    ] },
                    { "cells": [
                        { "vMerge": "continue" },
                        { "paragraphs": [{ "runs": [{ "type": "text", "props": { "fontFamily": "Mono", "fontSize": 20 }, "texts": ["r2"] }] }] }
                    ] }
                ]
            }]
        }"#,
    );
    let table = table(&document.body[0]);
    let layout = table.layout.get("Table").unwrap();
    // One line is top-to-baseline, a line pitch and the descent.
    assert_eq!(layout.row_heights, vec![20.0, 40.0]);

    let restart = table.rows[0].cells[0].layout.get("Table cell").unwrap();
    let continuation = table.rows[1].cells[0].layout.get("Table cell").unwrap();
    assert_eq!(restart.num_rows_in_span, 2);
    assert_eq!(restart.bounds.height, 60.0);
    assert_eq!(continuation.num_rows_in_span, 0);
    assert!(table.rows[1].cells[1].layout.is_laid());
}

#[test]
fn test_table_follows_preceding_paragraph() {
    let (document, summary) = layout_mono(
        r#"{
            "section": { "pageWidth": 400 },
            "body": [
                { "type": "paragraph", "runs": [{ "type": "text", "props": { "fontFamily": "Mono", "fontSize": 10 }, "texts": ["intro"] }] },
                { "type": "table",
                  "columns": [{ "width": 50 }, { "width": 150 }],
                  "rows": [{ "cells": [
                      { "span": 2, "paragraphs": [{ "runs": [{ "type": "text", "props": { "fontFamily": "Mono", "fontSize": 10 }, "texts": ["wide"] }] }] }
                  ] }] }
            ]
        }"#,
    );
    let table = table(&document.body[1]);
    let cell = table.rows[0].cells[0].layout.get("Table cell").unwrap();
    assert_eq!(cell.bounds.y, 20.0);
    assert_eq!(cell.bounds.width, 200.0);
    assert_eq!(summary.content_height, 40.0);
}

// ─── Rendering ──────────────────────────────────────────────────

#[test]
fn test_cell_borders_take_precedence_without_spacing() {
    let list = docflow::render_json(
        r#"{
            "body": [{
                "type": "table",
                "style": {
                    "cellSpacing": 0,
                    "borders": { "top": { "type": "single", "color": "ff0000" } }
                },
                "columns": [{ "width": 100 }],
                "rows": [
                    { "cells": [{
                        "borders": { "top": { "type": "single", "color": "00ff00" } },
                        "paragraphs": [{ "runs": [{ "type": "text", "texts": ["x"] }] }]
                    }] },
                    { "cells": [{ "paragraphs": [{ "runs": [{ "type": "text", "texts": ["y"] }] }] }] }
                ]
            }]
        }"#,
    )
    .unwrap();

    assert_eq!(line_colors(&list), vec!["00ff00", "ff0000"]);
    let texts = list
        .commands
        .iter()
        .filter(|c| matches!(c, PaintCommand::Text { .. }))
        .count();
    assert_eq!(texts, 2);
}

#[test]
fn test_rendering_requires_layout() {
    let document = parse(r#"{ "body": [{ "type": "paragraph" }] }"#);
    let fonts = FontContext::new();
    let mut list = DisplayList::new();
    let err = Renderer::new(&fonts)
        .render(&document.body, &mut list)
        .unwrap_err();
    assert!(matches!(err, DocflowError::NotLaidOut { .. }));
}

#[test]
fn test_invalid_json_reports_parse_error() {
    let err = docflow::render_json(r#"{ "body": [ }"#).unwrap_err();
    assert!(matches!(err, DocflowError::Parse { .. }));
    assert!(err.to_string().contains("Hint"));
}

#[test]
fn test_unknown_block_type_is_rejected() {
    let err = docflow::layout_json(r#"{ "body": [{ "type": "chart" }] }"#).unwrap_err();
    assert!(matches!(err, DocflowError::Parse { .. }));
}

// ─── Properties ─────────────────────────────────────────────────

fn plain_chain(len: usize) -> Vec<NamedStyle> {
    (0..len)
        .map(|i| NamedStyle {
            id: StyleId::new(format!("S{i}")),
            node: StyleNode {
                based_on: i.checked_sub(1).map(|p| StyleId::new(format!("S{p}"))),
                run: Some(RunProps {
                    bold: Some(i % 2 == 0),
                    ..Default::default()
                }),
                paragraph: None,
            },
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_unset_properties_fall_back_to_defaults(len in 1usize..20) {
        let graph = StyleGraph::build(plain_chain(len), None, &[]).unwrap();
        let resolver = StyleResolver::new(&graph);
        let id = StyleId::new(format!("S{}", len - 1));
        prop_assert_eq!(resolver.resolve_named(&props::FONT_SIZE, &id).unwrap(), 12.0);
        prop_assert_eq!(resolver.resolve_named(&props::FONT_FAMILY, &id).unwrap(), "Arial".to_string());
        prop_assert_eq!(resolver.resolve_named(&props::BOLD, &id).unwrap(), (len - 1) % 2 == 0);
    }

    #[test]
    fn prop_lines_stay_within_width(
        words in prop::collection::vec("[a-z]{1,8}", 1..30),
        width in 50.0f64..400.0,
    ) {
        let fonts = mono_fonts();
        let style = mono_style(10.0);
        let text = words.join(" ");
        let longest = words.iter().map(|w| w.len()).max().unwrap_or(0) as f64 * 10.0;

        let mut flow = VirtualFlow::from_page(width);
        let out = TextFitter::new(&fonts, &style, InSequence::Only)
            .fit(&text, LineStart::at(0.0), &mut flow);

        prop_assert!(!out.lines.is_empty());
        for line in &out.lines {
            let used = fonts.text_width(line.text.trim_end(), &style);
            prop_assert!(used <= width + longest, "'{}' is {} wide in {}", line.text, used, width);
        }
        let rejoined: String = out.lines.iter().map(|l| l.text.as_str()).collect();
        prop_assert_eq!(rejoined.trim_end(), text.as_str());
    }

    #[test]
    fn prop_single_space_run_moves_cursor_only(x in 0.0f64..200.0, size in 6.0f64..40.0) {
        let fonts = mono_fonts();
        let style = mono_style(size);
        let mut flow = VirtualFlow::from_page(500.0);
        let out = TextFitter::new(&fonts, &style, InSequence::Middle)
            .fit(" ", LineStart { x, following: true }, &mut flow);
        prop_assert!(out.lines.is_empty());
        prop_assert_eq!(out.last_x, x + fonts.average_char_width(&style));
        prop_assert_eq!(flow.y(), 0.0);
    }
}
