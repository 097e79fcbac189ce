//! # Text Fitting
//!
//! Turns the text of a run into positioned lines. Breaking is greedy and
//! character-count based: a line takes words while their cumulative length
//! stays within the number of average characters that fit the available
//! width, with one character of slack.

pub mod fitter;

pub use fitter::{FitOutcome, LineStart, TextFitter};

/// What ends a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Space,
    LineFeed,
    /// The word is the last of the text.
    End,
}

/// A word and the separator that follows it. Offsets are byte offsets into
/// the split text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word<'a> {
    pub text: &'a str,
    pub start: usize,
    pub separator: Separator,
}

impl Word<'_> {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Byte offset just past the separator.
    pub fn end_with_separator(&self) -> usize {
        let sep_len = match self.separator {
            Separator::Space | Separator::LineFeed => 1,
            Separator::End => 0,
        };
        self.start + self.text.len() + sep_len
    }
}

/// Split on single spaces and line feeds. Consecutive separators produce
/// empty words, so every separator is accounted for exactly once.
pub fn split_words(text: &str) -> Vec<Word<'_>> {
    let mut words = Vec::new();
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        let separator = match ch {
            ' ' => Separator::Space,
            '\n' => Separator::LineFeed,
            _ => continue,
        };
        words.push(Word {
            text: &text[start..idx],
            start,
            separator,
        });
        start = idx + 1;
    }
    words.push(Word {
        text: &text[start..],
        start,
        separator: Separator::End,
    });
    words
}
