//! Paragraph layout: spacing, tab stops, the numbering prefix and the runs.

use log::{debug, warn};

use super::flow::{ContentExtent, VirtualFlow};
use super::LayoutContext;
use crate::error::Result;
use crate::image_loader;
use crate::model::{
    DrawingLayout, DrawingRun, InSequence, LayoutState, Paragraph, ParagraphLayout, Rect, Run,
    TextLayout, TextRun,
};
use crate::style::{ComputedStyle, ParProps};
use crate::text::{LineStart, TextFitter};

/// Lay out a paragraph at the flow's position and advance the flow past it.
///
/// Every paragraph consumes at least one line height, even when no run
/// contributes any.
pub fn layout_paragraph(
    par: &mut Paragraph,
    ctx: &LayoutContext<'_>,
    flow: &mut VirtualFlow,
    extent: &mut ContentExtent,
) -> Result<()> {
    if par.layout.is_laid() {
        debug!("Paragraph already laid out, skipping");
        return Ok(());
    }

    flow.mark_paragraph_position(extent);
    let start_y = flow.y();
    let style = ctx.styles.compute(par.first_text_props(), Some(&par.props))?;
    flow.advance(style.spacing_before);

    let inherited_stops = flow.tab_stops().to_vec();
    for stop in &style.tab_stops {
        if stop.clear {
            flow.remove_tab_stop(stop.position);
        } else {
            flow.add_tab_stop(stop.position);
        }
    }

    let mut previous_x = Some(0.0);
    let mut first_start = None;
    if let Some(prefix) = par.numbering_run.as_mut() {
        // The prefix's own baseline handling stays on the clone.
        let mut prefix_flow = flow.clone_at(0.0);
        let prefix_start = LineStart::at(style.indentation(true));
        let (last_x, _) = layout_text_run(
            prefix,
            &par.props,
            InSequence::Only,
            prefix_start,
            ctx,
            &mut prefix_flow,
        )?;
        let text_start = if last_x <= style.indentation(false) {
            style.indentation(false)
        } else {
            flow.next_tab_stop(last_x)
        };
        first_start = Some(LineStart::at(text_start));
        previous_x = Some(last_x);
    }

    // Only a run that emitted a line (or an inline drawing) leaves one open
    // for the next run to continue.
    let mut line_open = false;
    let count = par.runs.len();
    for (i, run) in par.runs.iter_mut().enumerate() {
        let in_paragraph = InSequence::of(i, count);
        let last_x = match run {
            Run::Text(text) => {
                let start = match first_start.take() {
                    Some(start) if i == 0 => start,
                    _ => {
                        let run_style = ctx.styles.compute(Some(&text.props), Some(&par.props))?;
                        let mut start = LineStart::for_run(&run_style, in_paragraph, previous_x);
                        start.following &= line_open;
                        start
                    }
                };
                let (last_x, open) =
                    layout_text_run(text, &par.props, in_paragraph, start, ctx, flow)?;
                line_open = open;
                last_x
            }
            Run::Drawing(drawing) => {
                let start = match first_start.take() {
                    Some(start) if i == 0 => start.x,
                    _ => LineStart::for_run(&style, in_paragraph, previous_x).x,
                };
                if !drawing.bounds.anchored {
                    line_open = true;
                }
                layout_drawing(drawing, start, flow)
            }
        };
        previous_x = Some(last_x);
        flow.mark_character_position(extent, last_x);
    }

    flow.set_tab_stops(inherited_stops);
    flow.advance(style.spacing_after);

    let line_spacing = paragraph_line_spacing(par, &style, ctx)?;
    if flow.y() - start_y < line_spacing {
        flow.advance(line_spacing);
    }

    let height = flow.y() - start_y;
    debug!(
        "Paragraph at y={:.1}: {} run(s), height {:.1}",
        start_y, count, height
    );
    par.layout.set(ParagraphLayout {
        style,
        y: start_y,
        height,
    });
    Ok(())
}

/// Resolve the run's style, fit its text and store the lines.
/// Returns the continuation offset and whether the last line is still open.
fn layout_text_run(
    run: &mut TextRun,
    par_props: &ParProps,
    in_paragraph: InSequence,
    start: LineStart,
    ctx: &LayoutContext<'_>,
    flow: &mut VirtualFlow,
) -> Result<(f64, bool)> {
    if let LayoutState::Laid(done) = &run.layout {
        return Ok((done.last_x, done.line_open));
    }

    let style = ctx.styles.compute(Some(&run.props), Some(par_props))?;
    ctx.check_family(&style.font_family);
    let fitter = TextFitter::new(ctx.fonts, &style, in_paragraph);
    let outcome = fitter.fit(&run.text(), start, flow);
    let (last_x, line_open) = (outcome.last_x, outcome.line_open);
    let line_height = fitter.line_height();
    run.layout.set(TextLayout {
        style,
        lines: outcome.lines,
        line_height,
        last_x,
        line_open,
    });
    Ok((last_x, line_open))
}

/// Place a drawing at the cursor. Inline drawings push the flow down by their
/// height and the cursor right by their width; anchored ones float.
fn layout_drawing(drawing: &mut DrawingRun, start_x: f64, flow: &mut VirtualFlow) -> f64 {
    if let LayoutState::Laid(done) = &drawing.layout {
        return done.last_x;
    }

    let (width, height) = drawing_size(drawing);
    let bounds = Rect::new(
        flow.x() + start_x + drawing.bounds.offset_x,
        flow.y() + drawing.bounds.offset_y,
        width,
        height,
    );

    let last_x = if drawing.bounds.anchored {
        start_x
    } else {
        flow.advance(height);
        start_x + width
    };

    drawing.layout.set(DrawingLayout { bounds, last_x });
    last_x
}

/// Declared size, completed from the picture's intrinsic size when needed.
fn drawing_size(drawing: &DrawingRun) -> (f64, f64) {
    let declared = (drawing.bounds.width, drawing.bounds.height);
    if let (Some(w), Some(h)) = declared {
        return (w, h);
    }
    let intrinsic = match drawing.picture.as_ref() {
        Some(picture) => match image_loader::picture_dimensions(&picture.src) {
            Ok((w, h)) => Some((f64::from(w), f64::from(h))),
            Err(e) => {
                warn!("Unable to size picture: {e}");
                None
            }
        },
        None => None,
    };

    match (declared, intrinsic) {
        ((Some(w), None), Some((iw, ih))) if iw > 0.0 => (w, w * ih / iw),
        ((None, Some(h)), Some((iw, ih))) if ih > 0.0 => (h * iw / ih, h),
        ((None, None), Some(size)) => size,
        ((w, h), _) => (w.unwrap_or(0.0), h.unwrap_or(0.0)),
    }
}

/// Line pitch used for the minimum advance: explicit paragraph spacing, else
/// the first run's when it is text, else the configured fallback.
fn paragraph_line_spacing(
    par: &Paragraph,
    style: &ComputedStyle,
    ctx: &LayoutContext<'_>,
) -> Result<f64> {
    if let Some(spacing) = style.line_spacing {
        return Ok(spacing);
    }
    match par.runs.first() {
        Some(Run::Text(text)) => match &text.layout {
            LayoutState::Laid(layout) => Ok(layout.line_height),
            LayoutState::NotLaidOut => {
                let run_style = ctx.styles.compute(Some(&text.props), Some(&par.props))?;
                Ok(ctx.fonts.line_spacing(&run_style))
            }
        },
        _ => Ok(ctx.config.fallback_line_spacing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FaceMetrics, FontContext, FontKey};
    use crate::model::{LayoutConfig, Picture, ShapeBounds};
    use crate::style::{RunProps, StyleGraph, StyleResolver, TabStop};

    fn fonts() -> FontContext {
        let mut fonts = FontContext::new();
        fonts.register_face(
            FontKey::new("Mono", false, false),
            FaceMetrics::uniform(1.0, 0.75, 0.25, 0.0),
        );
        fonts
    }

    fn mono(size: f64) -> RunProps {
        RunProps {
            font_family: Some("Mono".into()),
            font_size: Some(size),
            ..Default::default()
        }
    }

    fn text_run(text: &str, props: RunProps) -> Run {
        Run::Text(TextRun::new(text, props))
    }

    fn run_layout<'a>(par: &'a Paragraph, idx: usize) -> &'a TextLayout {
        match &par.runs[idx] {
            Run::Text(text) => text.layout.get("Text run").unwrap(),
            Run::Drawing(_) => panic!("expected text"),
        }
    }

    #[test]
    fn test_empty_paragraph_advances_fallback_spacing() {
        let fonts = fonts();
        let graph = StyleGraph::default();
        let config = LayoutConfig::default();
        let ctx = LayoutContext::new(&fonts, StyleResolver::new(&graph), &config);
        let mut flow = VirtualFlow::from_page(300.0);
        let mut extent = ContentExtent::new();
        let mut par = Paragraph::default();

        layout_paragraph(&mut par, &ctx, &mut flow, &mut extent).unwrap();
        assert_eq!(flow.y(), 10.0);
        assert_eq!(par.layout.get("Paragraph").unwrap().height, 10.0);
        assert_eq!(extent.max_y(true), 0.0);
    }

    #[test]
    fn test_spacing_before_and_after() {
        let fonts = fonts();
        let graph = StyleGraph::default();
        let config = LayoutConfig::default();
        let ctx = LayoutContext::new(&fonts, StyleResolver::new(&graph), &config);
        let mut flow = VirtualFlow::from_page(300.0);
        let mut extent = ContentExtent::new();
        let mut par = Paragraph {
            props: ParProps {
                spacing_before: Some(6.0),
                spacing_after: Some(4.0),
                ..Default::default()
            },
            runs: vec![text_run("hi", mono(10.0))],
            ..Default::default()
        };

        layout_paragraph(&mut par, &ctx, &mut flow, &mut extent).unwrap();
        let layout = run_layout(&par, 0);
        assert_eq!(layout.lines[0].y, 6.0 + 7.5);
        // before + ascent + line + descent + after
        assert_eq!(flow.y(), 6.0 + 7.5 + 10.0 + 2.5 + 4.0);
    }

    #[test]
    fn test_runs_continue_on_the_same_line() {
        let fonts = fonts();
        let graph = StyleGraph::default();
        let config = LayoutConfig::default();
        let ctx = LayoutContext::new(&fonts, StyleResolver::new(&graph), &config);
        let mut flow = VirtualFlow::from_page(300.0);
        let mut extent = ContentExtent::new();
        let mut par = Paragraph {
            runs: vec![text_run("ab ", mono(10.0)), text_run("cd", mono(10.0))],
            ..Default::default()
        };

        layout_paragraph(&mut par, &ctx, &mut flow, &mut extent).unwrap();
        let first = &run_layout(&par, 0).lines[0];
        let second = &run_layout(&par, 1).lines[0];
        assert_eq!(first.y, second.y);
        assert_eq!(second.x, 30.0);
        assert!(second.following);
        assert_eq!(extent.max_x(), 50.0);
        assert_eq!(par.runs[0].last_x().unwrap(), 30.0);
        assert_eq!(par.runs[1].last_x().unwrap(), 50.0);
        assert_eq!(par.runs[1].height().unwrap(), 10.0);
    }

    #[test]
    fn test_leading_spacer_run_does_not_open_the_line() {
        let fonts = fonts();
        let graph = StyleGraph::default();
        let config = LayoutConfig::default();
        let ctx = LayoutContext::new(&fonts, StyleResolver::new(&graph), &config);

        for spacer in [" ", "\t"] {
            let mut flow = VirtualFlow::from_page(300.0);
            let mut extent = ContentExtent::new();
            let spacer_end = match spacer {
                " " => 10.0,
                _ => flow.next_tab_stop(0.0),
            };
            let mut above = Paragraph {
                runs: vec![text_run("above", mono(10.0))],
                ..Default::default()
            };
            let mut par = Paragraph {
                runs: vec![text_run(spacer, mono(10.0)), text_run("below", mono(10.0))],
                ..Default::default()
            };

            layout_paragraph(&mut above, &ctx, &mut flow, &mut extent).unwrap();
            layout_paragraph(&mut par, &ctx, &mut flow, &mut extent).unwrap();

            let top = par.layout.get("Paragraph").unwrap().y;
            assert_eq!(top, 20.0);
            assert!(run_layout(&par, 0).lines.is_empty());
            let below = &run_layout(&par, 1).lines[0];
            assert_eq!(below.y, top + 7.5, "spacer {spacer:?}");
            assert!(!below.following);
            assert_eq!(below.x, spacer_end);
            assert_eq!(par.layout.get("Paragraph").unwrap().height, 20.0);
        }
    }

    #[test]
    fn test_tab_stops_are_scoped_to_the_paragraph() {
        let fonts = fonts();
        let graph = StyleGraph::default();
        let config = LayoutConfig::default();
        let ctx = LayoutContext::new(&fonts, StyleResolver::new(&graph), &config);
        let mut flow = VirtualFlow::from_page(300.0);
        let mut extent = ContentExtent::new();
        let mut par = Paragraph {
            props: ParProps {
                tab_stops: Some(vec![TabStop {
                    position: 150.0,
                    clear: false,
                }]),
                ..Default::default()
            },
            runs: vec![
                text_run("ab", mono(10.0)),
                text_run("\t", mono(10.0)),
                text_run("cd", mono(10.0)),
            ],
            ..Default::default()
        };

        layout_paragraph(&mut par, &ctx, &mut flow, &mut extent).unwrap();
        assert_eq!(run_layout(&par, 2).lines[0].x, 150.0);
        assert!(flow.tab_stops().is_empty());
    }

    #[test]
    fn test_numbering_prefix_does_not_move_the_main_flow() {
        let fonts = fonts();
        let graph = StyleGraph::default();
        let config = LayoutConfig::default();
        let ctx = LayoutContext::new(&fonts, StyleResolver::new(&graph), &config);
        let mut flow = VirtualFlow::from_page(300.0);
        let mut extent = ContentExtent::new();
        let mut par = Paragraph {
            props: ParProps {
                indentation: Some(40.0),
                hanging: Some(40.0),
                ..Default::default()
            },
            runs: vec![text_run("item", mono(10.0))],
            numbering_run: Some(TextRun::new("1.\t", mono(10.0))),
            ..Default::default()
        };

        layout_paragraph(&mut par, &ctx, &mut flow, &mut extent).unwrap();
        let prefix = par.numbering_run.as_ref().unwrap().lines().unwrap();
        let body = &run_layout(&par, 0).lines[0];
        assert_eq!(prefix[0].x, 0.0);
        assert_eq!(prefix[0].y, body.y);
        assert_eq!(body.x, 40.0);
        assert_eq!(flow.y(), 7.5 + 10.0 + 2.5);
    }

    #[test]
    fn test_inline_and_anchored_drawings() {
        let fonts = fonts();
        let graph = StyleGraph::default();
        let config = LayoutConfig::default();
        let ctx = LayoutContext::new(&fonts, StyleResolver::new(&graph), &config);
        let mut flow = VirtualFlow::from_page(300.0);
        let mut extent = ContentExtent::new();
        let inline = DrawingRun {
            bounds: ShapeBounds {
                width: Some(40.0),
                height: Some(30.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let anchored = DrawingRun {
            bounds: ShapeBounds {
                offset_x: 5.0,
                width: Some(10.0),
                height: Some(100.0),
                anchored: true,
                ..Default::default()
            },
            picture: Some(Picture {
                src: "https://example.com/a.png".into(),
            }),
            ..Default::default()
        };
        let mut par = Paragraph {
            runs: vec![Run::Drawing(inline), Run::Drawing(anchored)],
            ..Default::default()
        };

        layout_paragraph(&mut par, &ctx, &mut flow, &mut extent).unwrap();
        match &par.runs[1] {
            Run::Drawing(d) => {
                let layout = d.layout.get("Drawing run").unwrap();
                assert_eq!(layout.bounds.x, 45.0);
                assert_eq!(layout.bounds.y, 30.0);
                assert_eq!(layout.last_x, 40.0);
            }
            Run::Text(_) => panic!("expected drawing"),
        }
        assert_eq!(flow.y(), 30.0);
    }

    #[test]
    fn test_intrinsic_size_keeps_aspect_ratio() {
        let drawing = DrawingRun {
            bounds: ShapeBounds {
                width: Some(20.0),
                ..Default::default()
            },
            picture: Some(Picture {
                src: "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==".into(),
            }),
            ..Default::default()
        };
        assert_eq!(drawing_size(&drawing), (20.0, 20.0));
    }
}
