//! List numbering: definitions, per-document counters, prefix synthesis.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{ParProps, RunProps};

/// Which list and level a paragraph belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberingRef {
    pub num_id: u32,
    #[serde(default)]
    pub level: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumberFormat {
    #[default]
    Decimal,
    LowerLetter,
    UpperLetter,
    LowerRoman,
    UpperRoman,
    /// The level text is used verbatim (e.g. "•").
    Bullet,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberingLevel {
    #[serde(default)]
    pub format: NumberFormat,
    /// Template such as `"%1."` or `"%1.%2"`; `%n` is the counter of level n.
    #[serde(default = "default_level_text")]
    pub text: String,
    #[serde(default = "default_start")]
    pub start: u32,
    /// Character properties of the prefix; also a style fallback source.
    #[serde(default)]
    pub run: Option<RunProps>,
    /// Paragraph properties (typically the list indentation).
    #[serde(default)]
    pub paragraph: Option<ParProps>,
}

fn default_level_text() -> String {
    "%1.".to_string()
}

fn default_start() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberingDefinition {
    pub id: u32,
    #[serde(default)]
    pub levels: Vec<NumberingLevel>,
}

/// Running list counters while a document is being built.
#[derive(Debug, Default)]
pub struct NumberingState {
    counters: HashMap<u32, Vec<u32>>,
}

impl NumberingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the counter for `level` and produce the prefix text.
    ///
    /// Deeper levels restart whenever a shallower level advances.
    pub fn next_prefix(&mut self, def: &NumberingDefinition, level: usize) -> Option<String> {
        let lvl = def.levels.get(level)?;
        let counters = self
            .counters
            .entry(def.id)
            .or_insert_with(|| def.levels.iter().map(|l| l.start.saturating_sub(1)).collect());
        if counters.len() < def.levels.len() {
            counters.resize(def.levels.len(), 0);
        }

        counters[level] += 1;
        for (deeper, counter) in counters.iter_mut().enumerate().skip(level + 1) {
            *counter = def.levels[deeper].start.saturating_sub(1);
        }

        if lvl.format == NumberFormat::Bullet {
            return Some(lvl.text.clone());
        }

        let mut prefix = String::with_capacity(lvl.text.len() + 4);
        let mut chars = lvl.text.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch == '%' {
                if let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
                    chars.next();
                    let idx = (digit as usize).saturating_sub(1);
                    if let (Some(n), Some(l)) = (counters.get(idx), def.levels.get(idx)) {
                        prefix.push_str(&format_number(*n, l.format));
                    }
                    continue;
                }
            }
            prefix.push(ch);
        }
        Some(prefix)
    }
}

fn format_number(n: u32, format: NumberFormat) -> String {
    match format {
        NumberFormat::Decimal => n.to_string(),
        NumberFormat::LowerLetter => letters(n),
        NumberFormat::UpperLetter => letters(n).to_uppercase(),
        NumberFormat::LowerRoman => roman(n).to_lowercase(),
        NumberFormat::UpperRoman => roman(n),
        NumberFormat::Bullet | NumberFormat::None => String::new(),
    }
}

/// 1 → a, 26 → z, 27 → aa, 28 → bb (word-processor letter numbering).
fn letters(n: u32) -> String {
    if n == 0 {
        return String::new();
    }
    let letter = (b'a' + ((n - 1) % 26) as u8) as char;
    let repeat = ((n - 1) / 26 + 1) as usize;
    std::iter::repeat(letter).take(repeat).collect()
}

fn roman(mut n: u32) -> String {
    const TABLE: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, digits) in TABLE {
        while n >= value {
            out.push_str(digits);
            n -= value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(format: NumberFormat, text: &str) -> NumberingLevel {
        NumberingLevel {
            format,
            text: text.to_string(),
            start: 1,
            run: None,
            paragraph: None,
        }
    }

    #[test]
    fn test_decimal_counts_up() {
        let def = NumberingDefinition {
            id: 1,
            levels: vec![level(NumberFormat::Decimal, "%1.")],
        };
        let mut state = NumberingState::new();
        assert_eq!(state.next_prefix(&def, 0).as_deref(), Some("1."));
        assert_eq!(state.next_prefix(&def, 0).as_deref(), Some("2."));
    }

    #[test]
    fn test_deeper_levels_restart_after_parent_advances() {
        let def = NumberingDefinition {
            id: 3,
            levels: vec![
                level(NumberFormat::Decimal, "%1."),
                level(NumberFormat::LowerLetter, "%1.%2)"),
            ],
        };
        let mut state = NumberingState::new();
        assert_eq!(state.next_prefix(&def, 0).as_deref(), Some("1."));
        assert_eq!(state.next_prefix(&def, 1).as_deref(), Some("1.a)"));
        assert_eq!(state.next_prefix(&def, 1).as_deref(), Some("1.b)"));
        assert_eq!(state.next_prefix(&def, 0).as_deref(), Some("2."));
        assert_eq!(state.next_prefix(&def, 1).as_deref(), Some("2.a)"));
    }

    #[test]
    fn test_bullet_uses_text_verbatim() {
        let def = NumberingDefinition {
            id: 2,
            levels: vec![level(NumberFormat::Bullet, "\u{2022}")],
        };
        let mut state = NumberingState::new();
        assert_eq!(state.next_prefix(&def, 0).as_deref(), Some("\u{2022}"));
    }

    #[test]
    fn test_missing_level_yields_no_prefix() {
        let def = NumberingDefinition { id: 9, levels: vec![] };
        assert!(NumberingState::new().next_prefix(&def, 0).is_none());
    }

    #[test]
    fn test_roman_and_letters() {
        assert_eq!(roman(1994), "MCMXCIV");
        assert_eq!(format_number(4, NumberFormat::LowerRoman), "iv");
        assert_eq!(letters(27), "aa");
        assert_eq!(format_number(2, NumberFormat::UpperLetter), "B");
    }
}
