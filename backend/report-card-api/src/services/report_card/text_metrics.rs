//! Text measurement and line breaking
//!
//! Widths come from the standard Helvetica AFM advance tables, which match the
//! builtin fonts the renderer draws with, so layout decisions are identical
//! for every run on every machine. The tables are read-only statics shared by
//! all concurrent generations.

/// Points to millimetres.
pub const PT_TO_MM: f32 = 0.352_778;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.15;

const ELLIPSIS: char = '…';
const DEFAULT_ADVANCE: u16 = 556;
const WIDTH_EPSILON: f32 = 1e-4;

/// Advance widths (1/1000 em) for U+0020..=U+007E.
static HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

static HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontWeight {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub size: f32,
    pub weight: FontWeight,
}

impl FontSpec {
    pub const fn regular(size: f32) -> Self {
        Self {
            size,
            weight: FontWeight::Regular,
        }
    }

    pub const fn bold(size: f32) -> Self {
        Self {
            size,
            weight: FontWeight::Bold,
        }
    }

    pub const fn italic(size: f32) -> Self {
        Self {
            size,
            weight: FontWeight::Italic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMeasure {
    pub line_count: usize,
    pub height: f32,
}

/// Either a free string, or lines the caller has already split.
#[derive(Debug, Clone, Copy)]
pub enum TextBlock<'a> {
    Text(&'a str),
    Lines(&'a [String]),
}

impl<'a> From<&'a str> for TextBlock<'a> {
    fn from(value: &'a str) -> Self {
        TextBlock::Text(value)
    }
}

impl<'a> From<&'a String> for TextBlock<'a> {
    fn from(value: &'a String) -> Self {
        TextBlock::Text(value.as_str())
    }
}

impl<'a> From<&'a [String]> for TextBlock<'a> {
    fn from(value: &'a [String]) -> Self {
        TextBlock::Lines(value)
    }
}

impl<'a> From<&'a Vec<String>> for TextBlock<'a> {
    fn from(value: &'a Vec<String>) -> Self {
        TextBlock::Lines(value.as_slice())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TextMetrics;

impl TextMetrics {
    pub fn new() -> Self {
        Self
    }

    pub fn line_height(&self, font_size: f32) -> f32 {
        font_size * PT_TO_MM * LINE_HEIGHT_FACTOR
    }

    pub fn char_width(&self, ch: char, font: FontSpec) -> f32 {
        advance(ch, font.weight) as f32 / 1000.0 * font.size * PT_TO_MM
    }

    pub fn text_width(&self, text: &str, font: FontSpec) -> f32 {
        let units: u32 = text.chars().map(|ch| advance(ch, font.weight) as u32).sum();
        units as f32 / 1000.0 * font.size * PT_TO_MM
    }

    /// Line count and height of `text`. With `max_width` the text is wrapped,
    /// otherwise every line (or `\n`-separated segment) is kept as is. The
    /// result always has at least one line.
    pub fn measure<'a>(
        &self,
        text: impl Into<TextBlock<'a>>,
        font: FontSpec,
        max_width: Option<f32>,
    ) -> TextMeasure {
        let line_count = match (text.into(), max_width) {
            (TextBlock::Text(text), Some(width)) => self.wrap(text, font, width).len(),
            (TextBlock::Text(text), None) => text.split('\n').count(),
            (TextBlock::Lines(lines), Some(width)) => lines
                .iter()
                .map(|line| self.wrap(line, font, width).len())
                .sum(),
            (TextBlock::Lines(lines), None) => lines.len(),
        }
        .max(1);

        TextMeasure {
            line_count,
            height: line_count as f32 * self.line_height(font.size),
        }
    }

    /// Greedy word wrap. Explicit newlines always break, an empty paragraph
    /// yields one empty line, and words wider than `max_width` are split at
    /// character boundaries.
    pub fn wrap(&self, text: &str, font: FontSpec, max_width: f32) -> Vec<String> {
        let space_width = self.char_width(' ', font);
        let mut lines = Vec::new();

        for paragraph in text.split('\n') {
            let mut current = String::new();
            let mut current_width = 0.0_f32;

            for word in paragraph.split_whitespace() {
                let word_width = self.text_width(word, font);

                if word_width > max_width + WIDTH_EPSILON {
                    if !current.is_empty() {
                        lines.push(std::mem::take(&mut current));
                    }
                    let mut pieces = self.break_word(word, font, max_width);
                    let last = pieces.pop().unwrap_or_default();
                    lines.extend(pieces);
                    current_width = self.text_width(&last, font);
                    current = last;
                    continue;
                }

                if current.is_empty() {
                    current.push_str(word);
                    current_width = word_width;
                } else if current_width + space_width + word_width <= max_width + WIDTH_EPSILON {
                    current.push(' ');
                    current.push_str(word);
                    current_width += space_width + word_width;
                } else {
                    lines.push(std::mem::replace(&mut current, word.to_string()));
                    current_width = word_width;
                }
            }

            lines.push(current);
        }

        lines
    }

    /// Wraps `text` and keeps at most `max_lines` lines, ending the last kept
    /// line with an ellipsis when anything was cut.
    pub fn ellipsize(
        &self,
        text: &str,
        font: FontSpec,
        max_width: f32,
        max_lines: usize,
    ) -> Vec<String> {
        let mut lines = self.wrap(text, font, max_width);
        if lines.len() <= max_lines {
            return lines;
        }
        if max_lines == 0 {
            return Vec::new();
        }

        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            *last = self.fit_with_ellipsis(last, font, max_width);
        }
        lines
    }

    /// Single-line variant of [`TextMetrics::ellipsize`].
    pub fn truncate_line(&self, text: &str, font: FontSpec, max_width: f32) -> String {
        if self.text_width(text, font) <= max_width + WIDTH_EPSILON {
            return text.to_string();
        }
        self.fit_with_ellipsis(text, font, max_width)
    }

    fn fit_with_ellipsis(&self, line: &str, font: FontSpec, max_width: f32) -> String {
        let ellipsis_width = self.char_width(ELLIPSIS, font);
        let mut kept: String = line.trim_end().to_string();
        while !kept.is_empty()
            && self.text_width(&kept, font) + ellipsis_width > max_width + WIDTH_EPSILON
        {
            kept.pop();
        }
        let mut result = kept.trim_end().to_string();
        result.push(ELLIPSIS);
        result
    }

    fn break_word(&self, word: &str, font: FontSpec, max_width: f32) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut piece = String::new();
        let mut piece_width = 0.0_f32;

        for ch in word.chars() {
            let ch_width = self.char_width(ch, font);
            if !piece.is_empty() && piece_width + ch_width > max_width + WIDTH_EPSILON {
                pieces.push(std::mem::take(&mut piece));
                piece_width = 0.0;
            }
            piece.push(ch);
            piece_width += ch_width;
        }
        if !piece.is_empty() {
            pieces.push(piece);
        }
        pieces
    }
}

fn advance(ch: char, weight: FontWeight) -> u16 {
    let table = match weight {
        FontWeight::Bold => &HELVETICA_BOLD,
        // Helvetica-Oblique shares the regular advances
        FontWeight::Regular | FontWeight::Italic => &HELVETICA,
    };
    match ch {
        ' '..='~' => table[(ch as usize) - 0x20],
        '…' | '—' => 1000,
        '–' => 556,
        '·' => 278,
        _ => DEFAULT_ADVANCE,
    }
}
