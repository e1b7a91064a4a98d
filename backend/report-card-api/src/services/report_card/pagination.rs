//! Page geometry and page-break decisions.

use serde::Deserialize;

use super::document::{DrawCommand, LayoutDocument};

/// Tolerance for blocks that end exactly on the content bottom.
const FIT_EPSILON: f32 = 1e-3;

/// Height reserved for the remarks and signature block before it is allowed
/// to start on the current page.
pub const MIN_TRAILING_HEIGHT: f32 = 35.0;

/// Page size and margins, in millimetres. Defaults to portrait A4.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageMetrics {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    /// Band above the bottom margin kept free for the footer.
    pub footer_height: f32,
}

impl Default for PageMetrics {
    fn default() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            margin_top: 15.0,
            margin_bottom: 15.0,
            margin_left: 14.0,
            margin_right: 14.0,
            footer_height: 8.0,
        }
    }
}

impl PageMetrics {
    pub fn usable_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn left(&self) -> f32 {
        self.margin_left
    }

    pub fn right(&self) -> f32 {
        self.width - self.margin_right
    }

    pub fn content_top(&self) -> f32 {
        self.margin_top
    }

    /// Lowest y any section may draw at.
    pub fn content_bottom(&self) -> f32 {
        self.height - self.margin_bottom - self.footer_height
    }

    /// Top of the footer band.
    pub fn footer_top(&self) -> f32 {
        self.content_bottom()
    }
}

/// Position of the running vertical cursor. Pages are 0-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub page: usize,
    pub y: f32,
}

impl Cursor {
    pub fn new(page: usize, y: f32) -> Self {
        Self { page, y }
    }

    pub fn advance(self, dy: f32) -> Self {
        Self {
            page: self.page,
            y: self.y + dy,
        }
    }
}

/// Outcome of reserving space for a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageFlow {
    Fits(Cursor),
    Broke(Cursor),
}

impl PageFlow {
    pub fn cursor(self) -> Cursor {
        match self {
            PageFlow::Fits(cursor) | PageFlow::Broke(cursor) => cursor,
        }
    }

    pub fn broke(&self) -> bool {
        matches!(self, PageFlow::Broke(_))
    }
}

/// Decides when the current page is full. Continuation pages start with the
/// running header; footers are stamped on every page once the page count is
/// known.
#[derive(Debug, Clone)]
pub struct PaginationController {
    metrics: PageMetrics,
    running_header: Vec<DrawCommand>,
    running_header_height: f32,
}

impl PaginationController {
    pub fn new(metrics: PageMetrics) -> Self {
        Self {
            metrics,
            running_header: Vec::new(),
            running_header_height: 0.0,
        }
    }

    /// Commands drawn at the top of every continuation page, and the height
    /// they occupy below the top margin.
    pub fn with_running_header(mut self, commands: Vec<DrawCommand>, height: f32) -> Self {
        self.running_header = commands;
        self.running_header_height = height;
        self
    }

    pub fn metrics(&self) -> &PageMetrics {
        &self.metrics
    }

    /// Cursor at the top of the first page.
    pub fn start(&self) -> Cursor {
        Cursor::new(0, self.metrics.content_top())
    }

    /// Where content starts on a continuation page.
    pub fn continuation_top(&self) -> f32 {
        self.metrics.content_top() + self.running_header_height
    }

    pub fn remaining(&self, cursor: Cursor) -> f32 {
        (self.metrics.content_bottom() - cursor.y).max(0.0)
    }

    pub fn fits(&self, cursor: Cursor, height: f32) -> bool {
        cursor.y + height <= self.metrics.content_bottom() + FIT_EPSILON
    }

    /// A block taller than an empty page is drawn where it is; breaking again
    /// would not help.
    fn at_page_start(&self, cursor: Cursor) -> bool {
        let top = if cursor.page == 0 {
            self.metrics.content_top()
        } else {
            self.continuation_top()
        };
        cursor.y <= top + FIT_EPSILON
    }

    /// Reserves `height` below the cursor, breaking the page first if the
    /// block would cross the content bottom.
    pub fn ensure_space(
        &self,
        document: &mut LayoutDocument,
        cursor: Cursor,
        height: f32,
    ) -> PageFlow {
        if self.fits(cursor, height) || self.at_page_start(cursor) {
            PageFlow::Fits(cursor)
        } else {
            PageFlow::Broke(self.break_page(document, cursor))
        }
    }

    /// Trailing blocks are never split: they need at least
    /// [`MIN_TRAILING_HEIGHT`] or their measured height, whichever is larger.
    pub fn reserve_trailing(
        &self,
        document: &mut LayoutDocument,
        cursor: Cursor,
        measured_height: f32,
    ) -> PageFlow {
        self.ensure_space(document, cursor, measured_height.max(MIN_TRAILING_HEIGHT))
    }

    /// Starts the page after `cursor.page` and draws the running header on it.
    pub fn break_page(&self, document: &mut LayoutDocument, cursor: Cursor) -> Cursor {
        let page = cursor.page + 1;
        while document.page_count() <= page {
            document.push_page();
        }
        document.draw_all(page, self.running_header.iter().cloned());
        Cursor::new(page, self.continuation_top())
    }

    /// Stamps a footer on every page. `footer` gets the 1-based page number
    /// and the page total.
    pub fn finalize<F>(&self, document: &mut LayoutDocument, footer: F)
    where
        F: Fn(usize, usize) -> Vec<DrawCommand>,
    {
        let total = document.page_count();
        for index in 0..total {
            document.draw_all(index, footer(index + 1, total));
        }
    }
}
