//! Turns a finished [`LayoutDocument`] into PDF bytes.
//!
//! Layout coordinates grow downwards from the top of the page; PDF user space
//! grows upwards from the bottom, so every y is flipped here.

use printpdf::{
    BuiltinFont, Color, Line, LinePoint, Mm, Op, PaintMode, PdfDocument, PdfPage,
    PdfSaveOptions, Point, Polygon, PolygonRing, Pt, Rgb, TextItem, WindingOrder,
};

use crate::error::{ReportCardError, ReportCardResult};

use super::{
    document::{DrawCommand, LayoutDocument, TextAlign, TextCommand},
    grading::RgbColor,
    text_metrics::{FontSpec, FontWeight, TextMetrics, PT_TO_MM},
};

/// Cap height of Helvetica as a share of the font size.
const CAP_HEIGHT: f32 = 0.718;

/// The only side-effecting step: consumes a layout and produces a document.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, layout: &LayoutDocument) -> ReportCardResult<Vec<u8>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfRenderer {
    metrics: TextMetrics,
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn page_ops(&self, commands: &[DrawCommand], page_height: f32) -> ReportCardResult<Vec<Op>> {
        let mut ops = Vec::with_capacity(commands.len() * 4);
        for command in commands {
            match command {
                DrawCommand::Text(text) => self.push_text(&mut ops, text, page_height)?,
                DrawCommand::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    stroke,
                } => {
                    check_finite(&[*x, *y, *width, *height])?;
                    if *width <= 0.0 || *height <= 0.0 {
                        continue;
                    }
                    let corners = [
                        (*x, page_height - y),
                        (x + width, page_height - y),
                        (x + width, page_height - y - height),
                        (*x, page_height - y - height),
                    ];
                    if let Some(fill) = fill {
                        push_pdf_polygon(&mut ops, &corners, pdf_color(fill));
                    }
                    if let Some(stroke) = stroke {
                        ops.push(Op::SetOutlineColor {
                            col: pdf_color(stroke),
                        });
                        ops.push(Op::SetOutlineThickness { pt: Pt(0.3) });
                        push_pdf_line(&mut ops, &corners, true);
                    }
                }
                DrawCommand::Line {
                    from,
                    to,
                    color,
                    thickness,
                } => {
                    check_finite(&[from.0, from.1, to.0, to.1, *thickness])?;
                    ops.push(Op::SetOutlineColor {
                        col: pdf_color(color),
                    });
                    ops.push(Op::SetOutlineThickness {
                        pt: Pt(thickness / PT_TO_MM),
                    });
                    push_pdf_line(
                        &mut ops,
                        &[(from.0, page_height - from.1), (to.0, page_height - to.1)],
                        false,
                    );
                }
            }
        }
        Ok(ops)
    }

    fn push_text(
        &self,
        ops: &mut Vec<Op>,
        text: &TextCommand,
        page_height: f32,
    ) -> ReportCardResult<()> {
        check_finite(&[text.x, text.y, text.width, text.font.size])?;
        let line_height = self.metrics.line_height(text.font.size);
        let size_mm = text.font.size * PT_TO_MM;
        let color = pdf_color(&text.color);

        for (index, line) in text.lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let width = self.metrics.text_width(line, text.font);
            let x = match text.align {
                TextAlign::Left => text.x,
                TextAlign::Center => text.x + (text.width - width) / 2.0,
                TextAlign::Right => text.x + text.width - width,
            };
            let baseline = text.y
                + index as f32 * line_height
                + (line_height + size_mm * CAP_HEIGHT) / 2.0;

            push_pdf_text(
                ops,
                Point::new(Mm(x), Mm(page_height - baseline)),
                builtin_font(text.font),
                text.font.size,
                text.font.size * 1.15,
                line.clone(),
                &color,
            );
        }
        Ok(())
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, layout: &LayoutDocument) -> ReportCardResult<Vec<u8>> {
        if layout.pages.is_empty() {
            return Err(ReportCardError::Render("layout has no pages".into()));
        }

        let pages = layout
            .pages
            .iter()
            .map(|page| {
                self.page_ops(&page.commands, layout.page_height)
                    .map(|ops| PdfPage::new(Mm(layout.page_width), Mm(layout.page_height), ops))
            })
            .collect::<ReportCardResult<Vec<_>>>()?;

        let mut document = PdfDocument::new(&layout.title);
        let mut warnings = Vec::new();
        let bytes = document
            .with_pages(pages)
            .save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            tracing::debug!(warnings = warnings.len(), "PDF serialised with warnings");
        }
        Ok(bytes)
    }
}

fn builtin_font(font: FontSpec) -> BuiltinFont {
    match font.weight {
        FontWeight::Regular => BuiltinFont::Helvetica,
        FontWeight::Bold => BuiltinFont::HelveticaBold,
        FontWeight::Italic => BuiltinFont::HelveticaOblique,
    }
}

fn pdf_color(color: &RgbColor) -> Color {
    Color::Rgb(Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
        icc_profile: None,
    })
}

fn check_finite(values: &[f32]) -> ReportCardResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ReportCardError::Render(format!(
            "non-finite coordinate in {values:?}"
        )))
    }
}

fn push_pdf_text(
    ops: &mut Vec<Op>,
    pos: Point,
    font: BuiltinFont,
    font_size: f32,
    line_height: f32,
    text: String,
    color: &Color,
) {
    ops.extend([
        Op::StartTextSection,
        Op::SetTextCursor { pos },
        Op::SetFontSizeBuiltinFont {
            size: Pt(font_size),
            font,
        },
        Op::SetLineHeight {
            lh: Pt(line_height),
        },
        Op::SetFillColor { col: color.clone() },
        Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text)],
            font,
        },
        Op::EndTextSection,
    ]);
}

fn line_points(points: &[(f32, f32)]) -> Vec<LinePoint> {
    points
        .iter()
        .map(|(x, y)| LinePoint {
            p: Point::new(Mm(*x), Mm(*y)),
            bezier: false,
        })
        .collect()
}

fn push_pdf_line(ops: &mut Vec<Op>, points: &[(f32, f32)], is_closed: bool) {
    ops.push(Op::DrawLine {
        line: Line {
            points: line_points(points),
            is_closed,
        },
    });
}

fn push_pdf_polygon(ops: &mut Vec<Op>, points: &[(f32, f32)], color: Color) {
    ops.push(Op::SetFillColor { col: color });
    ops.push(Op::DrawPolygon {
        polygon: Polygon {
            rings: vec![PolygonRing {
                points: line_points(points),
            }],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        },
    });
}
