//! Backend-independent layout tree.
//!
//! Coordinates are millimetres from the top-left corner of the page, y grows
//! downwards. Text commands carry already wrapped lines.

use super::{grading::RgbColor, text_metrics::FontSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextCommand {
    pub x: f32,
    /// Top of the first line box
    pub y: f32,
    /// Box width used for alignment
    pub width: f32,
    pub lines: Vec<String>,
    pub font: FontSpec,
    pub color: RgbColor,
    pub align: TextAlign,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Text(TextCommand),
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<RgbColor>,
        stroke: Option<RgbColor>,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        color: RgbColor,
        thickness: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPage {
    pub number: usize,
    pub commands: Vec<DrawCommand>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutDocument {
    pub title: String,
    pub page_width: f32,
    pub page_height: f32,
    pub pages: Vec<LayoutPage>,
}

impl LayoutDocument {
    /// A document with one empty page.
    pub fn new(title: impl Into<String>, page_width: f32, page_height: f32) -> Self {
        Self {
            title: title.into(),
            page_width,
            page_height,
            pages: vec![LayoutPage {
                number: 1,
                commands: Vec::new(),
            }],
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn push_page(&mut self) -> usize {
        let number = self.pages.len() + 1;
        self.pages.push(LayoutPage {
            number,
            commands: Vec::new(),
        });
        number - 1
    }

    /// Appends to the page at `index`, creating pages up to it if needed.
    pub fn draw(&mut self, index: usize, command: DrawCommand) {
        while self.pages.len() <= index {
            self.push_page();
        }
        self.pages[index].commands.push(command);
    }

    pub fn draw_all(&mut self, index: usize, commands: impl IntoIterator<Item = DrawCommand>) {
        for command in commands {
            self.draw(index, command);
        }
    }

    /// All text lines of a page, in drawing order.
    pub fn page_text(&self, index: usize) -> Vec<&str> {
        self.pages
            .get(index)
            .map(|page| {
                page.commands
                    .iter()
                    .filter_map(|command| match command {
                        DrawCommand::Text(text) => Some(text.lines.iter().map(String::as_str)),
                        _ => None,
                    })
                    .flatten()
                    .collect()
            })
            .unwrap_or_default()
    }
}
