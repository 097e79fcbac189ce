//! Greedy line fitting of one text run against a flow.

use log::trace;

use super::{split_words, Separator};
use crate::font::FontContext;
use crate::layout::flow::VirtualFlow;
use crate::model::{InSequence, PositionedLine};
use crate::style::{ComputedStyle, Justification};

/// Where the first line of a run begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStart {
    /// Offset from the flow origin.
    pub x: f64,
    /// Continues the previous run's line instead of opening a new one.
    pub following: bool,
}

impl LineStart {
    /// The first run of a paragraph (or one with nothing before it) starts
    /// at the first-line indentation; later runs pick up where the previous
    /// run ended.
    pub fn for_run(style: &ComputedStyle, in_paragraph: InSequence, previous_x: Option<f64>) -> Self {
        match previous_x {
            Some(x) if !in_paragraph.is_first() => LineStart { x, following: true },
            _ => LineStart {
                x: style.indentation(in_paragraph.is_first()),
                following: false,
            },
        }
    }

    /// A fresh line at an explicit offset.
    pub fn at(x: f64) -> Self {
        LineStart {
            x,
            following: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub lines: Vec<PositionedLine>,
    /// Offset from the flow origin where the run ended.
    pub last_x: f64,
    /// The cursor sits on the baseline of a line the next run may continue.
    pub line_open: bool,
}

pub struct TextFitter<'a> {
    fonts: &'a FontContext,
    style: &'a ComputedStyle,
    in_paragraph: InSequence,
    line_height: f64,
}

impl<'a> TextFitter<'a> {
    pub fn new(fonts: &'a FontContext, style: &'a ComputedStyle, in_paragraph: InSequence) -> Self {
        Self {
            fonts,
            style,
            in_paragraph,
            line_height: fonts.line_spacing(style),
        }
    }

    pub fn line_height(&self) -> f64 {
        self.line_height
    }

    /// Fit `text` into lines, advancing `flow`.
    ///
    /// The flow is expected at the top of a line (or on the baseline of the
    /// previous run's last line when `start.following`). Lines are emitted on
    /// their baseline. Unless this is the paragraph's last run, the cursor is
    /// left on the last line's baseline so the next run can continue it.
    pub fn fit(&self, text: &str, start: LineStart, flow: &mut VirtualFlow) -> FitOutcome {
        if self.style.invisible || text.is_empty() {
            return self.without_lines(start, start.x, flow);
        }
        if text == " " {
            let x = start.x + self.fonts.average_char_width(self.style);
            return self.without_lines(start, x, flow);
        }
        if text.chars().all(|ch| ch == '\t') {
            let x = text.chars().fold(start.x, |x, _| flow.next_tab_stop(x));
            return self.without_lines(start, x, flow);
        }

        if !start.following {
            // Lines sit on the baseline while the flow tracks the line top.
            flow.advance(self.fonts.top_to_baseline(self.style));
        }

        let text = self.style.transform_case(&text.replace('\t', " "));
        let words = split_words(&text);

        let mut lines = Vec::new();
        let mut pad = start.x;
        let mut following = start.following;
        let mut line_start = 0;
        let mut length = 0;
        let mut available = self.available_chars(pad, flow);

        for (i, word) in words.iter().enumerate() {
            length += word.char_len() + 1;
            let is_last_line = i + 1 == words.len();
            let mut end_of_line = is_last_line || word.separator == Separator::LineFeed;
            if let Some(next) = words.get(i + 1) {
                if !fits_reasonably(length, available, next.char_len()) {
                    end_of_line = true;
                }
            }
            if !end_of_line {
                continue;
            }

            let end = word.end_with_separator().min(text.len());
            let slice = text[line_start..end].trim_end_matches('\n');
            self.push_line(&mut lines, slice, pad, following, is_last_line, flow);

            if !is_last_line {
                following = false;
                pad = self.style.indentation(false);
                available = self.available_chars(pad, flow);
                line_start = end;
                length = 0;
            }
        }

        if self.in_paragraph.is_last() {
            flow.advance(self.fonts.baseline_to_bottom(self.style));
        }

        let last_width = lines
            .last()
            .map_or(0.0, |line: &PositionedLine| self.fonts.text_width(&line.text, self.style));
        FitOutcome {
            lines,
            last_x: pad + last_width,
            line_open: !self.in_paragraph.is_last(),
        }
    }

    fn push_line(
        &self,
        lines: &mut Vec<PositionedLine>,
        text: &str,
        pad: f64,
        following: bool,
        is_last_line: bool,
        flow: &mut VirtualFlow,
    ) {
        let line = PositionedLine {
            text: text.to_string(),
            x: flow.x() + pad,
            y: flow.y(),
            width: flow.width() - pad,
            stretched: self.style.justification == Justification::Both && !is_last_line,
            following,
            color: self.style.color.clone(),
            font_family: self.style.font_family.clone(),
            font_size: self.style.font_size,
            bold: self.style.bold,
            italic: self.style.italic,
        };
        trace!(
            "Line '{}' at ({:.1}, {:.1}), width {:.1}{}",
            line.text,
            line.x,
            line.y,
            line.width,
            if line.stretched { ", stretched" } else { "" }
        );
        lines.push(line);

        if self.in_paragraph.is_last() || !is_last_line {
            flow.advance(self.line_height);
        }
    }

    /// Runs that produce no lines still move the continuation offset, but
    /// never open a line. When such a run closes a paragraph whose last line
    /// is still open, the line is finished here.
    fn without_lines(&self, start: LineStart, last_x: f64, flow: &mut VirtualFlow) -> FitOutcome {
        let is_last = self.in_paragraph.is_last();
        if is_last && start.following {
            flow.advance(self.line_height + self.fonts.baseline_to_bottom(self.style));
        }
        FitOutcome {
            lines: Vec::new(),
            last_x,
            line_open: start.following && !is_last,
        }
    }

    fn available_chars(&self, pad: f64, flow: &VirtualFlow) -> usize {
        self.fonts.fit_characters(flow.width() - pad, self.style)
    }
}

/// Appending the next word may overshoot the available characters by one.
fn fits_reasonably(length: usize, available: usize, next_word: usize) -> bool {
    length + next_word <= available + 1
}
