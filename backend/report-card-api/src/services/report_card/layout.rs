//! Section composition.
//!
//! Every section takes the running [`Cursor`] and returns the cursor below
//! what it drew. Sections only append to the [`LayoutDocument`]; nothing is
//! drawn until the renderer consumes the finished tree.

use crate::{
    models::{PeriodType, ResultPayload, SchoolInfo, StudentInfo, SubjectResult},
    services::translator::Translate,
};

use super::{
    column_schema::{ColumnKey, ColumnSchema, ColumnSchemaBuilder, FixedColumn, PeriodCell},
    column_widths::ColumnWidthAllocator,
    document::{DrawCommand, LayoutDocument, TextAlign, TextCommand},
    grading::{ConditionalStyleResolver, Palette, RgbColor},
    pagination::{Cursor, PageMetrics, PaginationController},
    promotion::{passed_subject_count, PromotionRemarkGenerator, PromotionStatus},
    text_metrics::{FontSpec, TextMetrics},
};

const TITLE: FontSpec = FontSpec::bold(15.0);
const SCHOOL_NAME: FontSpec = FontSpec::bold(12.0);
const HEADING: FontSpec = FontSpec::bold(10.0);
const BODY: FontSpec = FontSpec::regular(9.0);
const BODY_BOLD: FontSpec = FontSpec::bold(9.0);
const SMALL: FontSpec = FontSpec::regular(7.5);
const SMALL_ITALIC: FontSpec = FontSpec::italic(7.5);
const TABLE: FontSpec = FontSpec::regular(7.5);
const TABLE_BOLD: FontSpec = FontSpec::bold(7.5);
const METRIC_VALUE: FontSpec = FontSpec::bold(11.0);

const SECTION_GAP: f32 = 5.0;
const HEADING_GAP: f32 = 1.5;
const CARD_PADDING: f32 = 2.5;
const CARD_ROW_SPACING: f32 = 1.5;
const CELL_PADDING: f32 = 1.2;
const SIGNATURE_BLOCK_HEIGHT: f32 = 24.0;
const SIGNATURE_WIDTH_SHARE: f32 = 0.38;

/// Everything a section needs to lay itself out.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub page: PageMetrics,
    pub styles: &'a ConditionalStyleResolver,
    pub text: TextMetrics,
    pub translator: &'a dyn Translate,
    pub school: &'a SchoolInfo,
    pub student: &'a StudentInfo,
    pub results: &'a ResultPayload,
    pub period_type: PeriodType,
}

impl RenderContext<'_> {
    fn t(&self, key: &str) -> String {
        self.translator.translate(key, &[])
    }

    fn palette(&self) -> &Palette {
        &self.styles.palette
    }

    fn not_applicable(&self) -> String {
        self.t("cell.not_applicable")
    }

    /// Name of the reporting period, or the generic label for its type.
    pub fn period_label(&self) -> String {
        let name = self.results.period_info.name.trim();
        if name.is_empty() {
            self.t(&format!("period.{}", self.period_type.as_str()))
        } else {
            name.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    StudentInfo,
    OverallSummary,
    SubjectBreakdown,
    RemarksAndSignatures,
}

impl Section {
    pub const ORDER: [Section; 5] = [
        Section::Header,
        Section::StudentInfo,
        Section::OverallSummary,
        Section::SubjectBreakdown,
        Section::RemarksAndSignatures,
    ];
}

/// Cursor before and after a section was laid out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionMark {
    pub section: Section,
    pub start: Cursor,
    pub end: Cursor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedReport {
    pub document: LayoutDocument,
    pub sections: Vec<SectionMark>,
}

impl ComposedReport {
    pub fn page_count(&self) -> usize {
        self.document.page_count()
    }

    pub fn mark(&self, section: Section) -> Option<&SectionMark> {
        self.sections.iter().find(|mark| mark.section == section)
    }
}

struct TableCell {
    lines: Vec<String>,
    font: FontSpec,
    color: RgbColor,
    align: TextAlign,
}

pub struct LayoutComposer<'a> {
    ctx: RenderContext<'a>,
    pagination: PaginationController,
    schema: ColumnSchema,
    widths: Vec<f32>,
}

impl<'a> LayoutComposer<'a> {
    pub fn new(ctx: RenderContext<'a>) -> Self {
        let schema = ColumnSchemaBuilder::build(
            ctx.period_type,
            &ctx.results.subject_breakdown,
            ctx.translator,
        );
        let widths = ColumnWidthAllocator::default().allocate(ctx.page.usable_width(), &schema.columns);

        let mut composer = Self {
            ctx,
            pagination: PaginationController::new(ctx.page),
            schema,
            widths,
        };
        let (commands, height) = composer.running_header();
        composer.pagination = composer.pagination.with_running_header(commands, height);
        composer
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn widths(&self) -> &[f32] {
        &self.widths
    }

    pub fn compose(&self) -> ComposedReport {
        let ctx = &self.ctx;
        let mut document = LayoutDocument::new(
            format!("Report card – {}", ctx.student.full_name),
            ctx.page.width,
            ctx.page.height,
        );

        let mut cursor = self.pagination.start();
        let mut sections = Vec::with_capacity(Section::ORDER.len());
        for section in Section::ORDER {
            let start = cursor;
            cursor = match section {
                Section::Header => self.header(&mut document, cursor),
                Section::StudentInfo => self.student_info(&mut document, cursor),
                Section::OverallSummary => self.overall_summary(&mut document, cursor),
                Section::SubjectBreakdown => self.subject_breakdown(&mut document, cursor),
                Section::RemarksAndSignatures => self.remarks_and_signatures(&mut document, cursor),
            };
            sections.push(SectionMark {
                section,
                start,
                end: cursor,
            });
        }

        self.pagination
            .finalize(&mut document, |page, total| self.footer(page, total));

        tracing::debug!(
            student = %ctx.student.full_name,
            period_type = ctx.period_type.as_str(),
            columns = self.schema.columns.len(),
            pages = document.page_count(),
            "Report card laid out"
        );

        ComposedReport { document, sections }
    }

    fn header(&self, document: &mut LayoutDocument, cursor: Cursor) -> Cursor {
        let ctx = &self.ctx;
        let palette = ctx.palette();
        let usable = ctx.page.usable_width();
        let left_width = usable * 0.55;
        let right_width = usable * 0.40;

        let mut left = vec![(ctx.school.name.clone(), SCHOOL_NAME, palette.text)];
        if let Some(motto) = non_empty(&ctx.school.motto) {
            left.push((motto.to_string(), SMALL_ITALIC, palette.muted));
        }
        for contact in [&ctx.school.address, &ctx.school.phone, &ctx.school.email] {
            if let Some(value) = non_empty(contact) {
                left.push((value.to_string(), SMALL, palette.muted));
            }
        }

        let mut right = vec![
            (ctx.t("report.title"), TITLE, palette.accent),
            (ctx.period_label(), BODY_BOLD, palette.text),
        ];
        if let Some(year) = non_empty(&ctx.results.period_info.academic_year) {
            right.push((
                ctx.translator
                    .translate("report.academic_year", &[("year", year.to_string())]),
                SMALL,
                palette.muted,
            ));
        }

        let left_height = self.stack(document, cursor, ctx.page.left(), left_width, &left, TextAlign::Left);
        let right_height = self.stack(
            document,
            cursor,
            ctx.page.right() - right_width,
            right_width,
            &right,
            TextAlign::Right,
        );

        let rule_y = cursor.y + left_height.max(right_height) + 2.0;
        document.draw(
            cursor.page,
            DrawCommand::Line {
                from: (ctx.page.left(), rule_y),
                to: (ctx.page.right(), rule_y),
                color: palette.accent,
                thickness: 0.8,
            },
        );
        Cursor::new(cursor.page, rule_y + SECTION_GAP)
    }

    fn student_info(&self, document: &mut LayoutDocument, cursor: Cursor) -> Cursor {
        let ctx = &self.ctx;
        let palette = ctx.palette();
        let items = self.student_items();
        let rows = items.len().div_ceil(2);
        let row_height = ctx.text.line_height(BODY.size) + CARD_ROW_SPACING;
        let card_height = rows as f32 * row_height + 2.0 * CARD_PADDING;

        let cursor = self
            .pagination
            .ensure_space(document, cursor, self.heading_height() + card_height)
            .cursor();
        let cursor = self.section_heading(document, cursor, "section.student");

        document.draw(
            cursor.page,
            DrawCommand::Rect {
                x: ctx.page.left(),
                y: cursor.y,
                width: ctx.page.usable_width(),
                height: card_height,
                fill: None,
                stroke: Some(palette.border),
            },
        );

        let column_width = (ctx.page.usable_width() - 2.0 * CARD_PADDING) / 2.0;
        for (index, (label, value)) in items.into_iter().enumerate() {
            let x = ctx.page.left() + CARD_PADDING + (index % 2) as f32 * column_width;
            let y = cursor.y + CARD_PADDING + (index / 2) as f32 * row_height;

            let label = ctx
                .text
                .truncate_line(&format!("{label}: "), BODY_BOLD, column_width * 0.5);
            let label_width = ctx.text.text_width(&label, BODY_BOLD);
            let value_width = (column_width - label_width - CARD_PADDING).max(1.0);
            let value = ctx.text.truncate_line(&value, BODY, value_width);

            document.draw(
                cursor.page,
                text(x, y, label_width, vec![label], BODY_BOLD, palette.muted, TextAlign::Left),
            );
            document.draw(
                cursor.page,
                text(x + label_width, y, value_width, vec![value], BODY, palette.text, TextAlign::Left),
            );
        }

        cursor.advance(card_height + SECTION_GAP)
    }

    fn student_items(&self) -> Vec<(String, String)> {
        let ctx = &self.ctx;
        let student = ctx.student;
        let mut items = vec![(ctx.t("student.name"), student.full_name.clone())];
        let optional = [
            ("student.matricule", non_empty(&student.matricule).map(str::to_string)),
            ("student.class", non_empty(&student.class_name).map(str::to_string)),
            (
                "student.date_of_birth",
                student
                    .date_of_birth
                    .map(|date| date.format("%d/%m/%Y").to_string()),
            ),
            ("student.place_of_birth", non_empty(&student.place_of_birth).map(str::to_string)),
            ("student.gender", non_empty(&student.gender).map(str::to_string)),
        ];
        items.extend(
            optional
                .into_iter()
                .filter_map(|(key, value)| value.map(|value| (ctx.t(key), value))),
        );
        items
    }

    fn overall_summary(&self, document: &mut LayoutDocument, cursor: Cursor) -> Cursor {
        let ctx = &self.ctx;
        let palette = ctx.palette();
        let overall = &ctx.results.overall_performance;
        let metrics = self.summary_metrics();

        let cell_width = ctx.page.usable_width() / metrics.len() as f32;
        let inner_width = cell_width - 2.0 * CELL_PADDING;
        let label_height = ctx.text.line_height(SMALL.size);
        let cell_height = 2.0 * CELL_PADDING + label_height + 1.0 + ctx.text.line_height(METRIC_VALUE.size);

        let cursor = self
            .pagination
            .ensure_space(document, cursor, self.heading_height() + cell_height)
            .cursor();
        let cursor = self.section_heading(document, cursor, "section.summary");

        for (index, (label, value, color)) in metrics.into_iter().enumerate() {
            let x = ctx.page.left() + index as f32 * cell_width;
            document.draw(
                cursor.page,
                DrawCommand::Rect {
                    x,
                    y: cursor.y,
                    width: cell_width,
                    height: cell_height,
                    fill: Some(palette.header_fill),
                    stroke: Some(palette.border),
                },
            );
            let label = ctx.text.truncate_line(&label, SMALL, inner_width);
            let value = ctx.text.truncate_line(&value, METRIC_VALUE, inner_width);
            document.draw(
                cursor.page,
                text(
                    x + CELL_PADDING,
                    cursor.y + CELL_PADDING,
                    inner_width,
                    vec![label],
                    SMALL,
                    palette.muted,
                    TextAlign::Center,
                ),
            );
            document.draw(
                cursor.page,
                text(
                    x + CELL_PADDING,
                    cursor.y + CELL_PADDING + label_height + 1.0,
                    inner_width,
                    vec![value],
                    METRIC_VALUE,
                    color,
                    TextAlign::Center,
                ),
            );
        }

        let mut cursor = cursor.advance(cell_height);

        if ctx.period_type == PeriodType::Year {
            if let Some(key) = non_empty(&overall.promotion_status_key) {
                let status = PromotionStatus::from_key(key);
                let color = match status {
                    PromotionStatus::Promoted => palette.highlight,
                    PromotionStatus::Repeated => palette.fail,
                    _ => palette.text,
                };
                cursor = self.summary_row(
                    document,
                    cursor,
                    &ctx.t("summary.promotion_status"),
                    &status.label(ctx.translator),
                    color,
                );
            }

            let remark = PromotionRemarkGenerator::new(ctx.translator, ctx.styles.passing_score())
                .generate(overall, &ctx.results.subject_breakdown);
            if !remark.trim().is_empty() {
                cursor = self.summary_row(
                    document,
                    cursor,
                    &ctx.t("summary.promotion_remarks"),
                    remark.trim(),
                    palette.text,
                );
            }
        }

        cursor.advance(SECTION_GAP)
    }

    /// Label, value and colour of the six summary cells.
    fn summary_metrics(&self) -> Vec<(String, String, RgbColor)> {
        let ctx = &self.ctx;
        let palette = ctx.palette();
        let overall = &ctx.results.overall_performance;
        let missing = || (ctx.not_applicable(), palette.muted);

        let average = overall
            .average
            .map(|avg| (format_score(avg), ctx.styles.color_for(avg)))
            .unwrap_or_else(missing);
        let rank = match (overall.rank, overall.class_size) {
            (Some(rank), Some(size)) => (format!("{rank} / {size}"), palette.text),
            (Some(rank), None) => (rank.to_string(), palette.text),
            _ => missing(),
        };
        let total_points = overall
            .total_points
            .map(|points| (format_score(points), palette.text))
            .unwrap_or_else(missing);
        let class_average = overall
            .class_average
            .map(|avg| (format_score(avg), palette.text))
            .unwrap_or_else(missing);
        let total_coefficient = overall
            .total_coefficient
            .map(|coef| (format_number(coef), palette.text))
            .unwrap_or_else(missing);
        let decision = overall
            .average
            .map(|avg| {
                if ctx.styles.is_passing(avg) {
                    (ctx.t("decision.passed"), palette.highlight)
                } else {
                    (ctx.t("decision.failed"), palette.fail)
                }
            })
            .unwrap_or_else(missing);

        [
            ("summary.average", average),
            ("summary.rank", rank),
            ("summary.total_points", total_points),
            ("summary.class_average", class_average),
            ("summary.total_coefficient", total_coefficient),
            ("summary.decision", decision),
        ]
        .into_iter()
        .map(|(key, (value, color))| (ctx.t(key), value, color))
        .collect()
    }

    /// Full-width label/value row below the metric cells.
    fn summary_row(
        &self,
        document: &mut LayoutDocument,
        cursor: Cursor,
        label: &str,
        value: &str,
        color: RgbColor,
    ) -> Cursor {
        let ctx = &self.ctx;
        let palette = ctx.palette();
        let usable = ctx.page.usable_width();
        let label_width = usable * 0.25;
        let value_width = usable - label_width - 3.0 * CELL_PADDING;

        let label_lines = ctx.text.wrap(label, BODY_BOLD, label_width);
        let value_lines = ctx.text.wrap(value, BODY, value_width);
        let content_height = ctx
            .text
            .measure(&label_lines, BODY_BOLD, None)
            .height
            .max(ctx.text.measure(&value_lines, BODY, None).height);
        let height = content_height + 2.0 * CELL_PADDING;

        let cursor = self.pagination.ensure_space(document, cursor, height).cursor();
        document.draw(
            cursor.page,
            DrawCommand::Rect {
                x: ctx.page.left(),
                y: cursor.y,
                width: usable,
                height,
                fill: None,
                stroke: Some(palette.border),
            },
        );
        let x = ctx.page.left() + CELL_PADDING;
        let y = cursor.y + CELL_PADDING;
        document.draw(
            cursor.page,
            text(x, y, label_width, label_lines, BODY_BOLD, palette.muted, TextAlign::Left),
        );
        document.draw(
            cursor.page,
            text(
                x + label_width + CELL_PADDING,
                y,
                value_width,
                value_lines,
                BODY,
                color,
                TextAlign::Left,
            ),
        );
        cursor.advance(height)
    }

    fn subject_breakdown(&self, document: &mut LayoutDocument, cursor: Cursor) -> Cursor {
        let ctx = &self.ctx;
        let palette = ctx.palette();
        let subjects = &ctx.results.subject_breakdown;
        let line_height = ctx.text.line_height(BODY.size);

        if subjects.is_empty() {
            let cursor = self
                .pagination
                .ensure_space(document, cursor, self.heading_height() + line_height)
                .cursor();
            let cursor = self.section_heading(document, cursor, "section.breakdown");
            document.draw(
                cursor.page,
                text(
                    ctx.page.left(),
                    cursor.y,
                    ctx.page.usable_width(),
                    vec![ctx.t("table.no_data")],
                    FontSpec::italic(BODY.size),
                    palette.muted,
                    TextAlign::Left,
                ),
            );
            return cursor.advance(line_height + SECTION_GAP);
        }

        let header = self.header_cells();
        let header_height = self.row_height(&header);
        // a row must fit under the running header, heading and table header
        let max_row_height = ctx.page.content_bottom()
            - self.pagination.continuation_top()
            - self.heading_height()
            - header_height;
        let rows: Vec<Vec<TableCell>> = subjects
            .iter()
            .map(|s| self.subject_cells(s, max_row_height))
            .collect();
        let first_row_height = rows.first().map(|row| self.row_height(row)).unwrap_or(0.0);

        // the heading never ends a page without at least one row under it
        let cursor = self
            .pagination
            .ensure_space(
                document,
                cursor,
                self.heading_height() + header_height + first_row_height,
            )
            .cursor();
        let cursor = self.section_heading(document, cursor, "section.breakdown");
        let mut cursor = self.draw_row(document, cursor, &header, Some(palette.header_fill));

        for row in &rows {
            let flow = self
                .pagination
                .ensure_space(document, cursor, self.row_height(row));
            cursor = flow.cursor();
            if flow.broke() {
                cursor = self.draw_row(document, cursor, &header, Some(palette.header_fill));
            }
            cursor = self.draw_row(document, cursor, row, None);
        }

        let passed = passed_subject_count(subjects, ctx.styles.passing_score());
        let summary = ctx.translator.translate(
            "table.subjects_passed",
            &[("passed", passed.to_string()), ("total", subjects.len().to_string())],
        );
        let cursor = self
            .pagination
            .ensure_space(document, cursor, HEADING_GAP + line_height)
            .cursor();
        document.draw(
            cursor.page,
            text(
                ctx.page.left(),
                cursor.y + HEADING_GAP,
                ctx.page.usable_width(),
                vec![summary],
                BODY_BOLD,
                palette.text,
                TextAlign::Left,
            ),
        );
        cursor.advance(HEADING_GAP + line_height + SECTION_GAP)
    }

    fn header_cells(&self) -> Vec<TableCell> {
        let ctx = &self.ctx;
        self.schema
            .columns
            .iter()
            .zip(&self.widths)
            .map(|(column, width)| TableCell {
                lines: ctx.text.wrap(&column.header, TABLE_BOLD, cell_width(*width)),
                font: TABLE_BOLD,
                color: ctx.palette().text,
                align: TextAlign::Center,
            })
            .collect()
    }

    /// Cells of one subject row; text that would make the row taller than
    /// `max_height` is ellipsized.
    fn subject_cells(&self, subject: &SubjectResult, max_height: f32) -> Vec<TableCell> {
        let ctx = &self.ctx;
        let palette = ctx.palette();
        let mut period_cells =
            ColumnSchemaBuilder::period_cells(ctx.period_type, subject, &self.schema.periods)
                .into_iter();

        let scored = |value: Option<f32>| match value {
            Some(value) => (format_score(value), TABLE, ctx.styles.cell_color(value)),
            None => (ctx.not_applicable(), TABLE, palette.muted),
        };
        let plain = |value: Option<String>| match value {
            Some(value) => (value, TABLE, palette.text),
            None => (ctx.not_applicable(), TABLE, palette.muted),
        };

        self.schema
            .columns
            .iter()
            .zip(&self.widths)
            .map(|(column, width)| {
                let (content, font, color) = match &column.key {
                    ColumnKey::Fixed(FixedColumn::Subject) => {
                        (subject.subject_name.clone(), TABLE_BOLD, palette.text)
                    }
                    ColumnKey::Fixed(FixedColumn::Coefficient) => {
                        plain(Some(format_number(subject.coefficient)))
                    }
                    ColumnKey::Fixed(FixedColumn::Score) => scored(subject.score),
                    ColumnKey::Fixed(FixedColumn::Rank) => plain(subject.rank.map(|r| r.to_string())),
                    ColumnKey::Fixed(FixedColumn::ClassAverage) => {
                        plain(subject.class_average_subject.map(format_score))
                    }
                    ColumnKey::Fixed(FixedColumn::Remarks) => match subject.score {
                        Some(score) => (
                            ctx.styles.label(score, ctx.translator),
                            TABLE,
                            ctx.styles.cell_color(score),
                        ),
                        None => plain(None),
                    },
                    ColumnKey::Fixed(FixedColumn::Teacher) => {
                        plain(non_empty(&subject.teacher_name).map(str::to_string))
                    }
                    ColumnKey::Period(_) => match period_cells.next() {
                        Some(PeriodCell::Score(score)) => scored(Some(score)),
                        Some(PeriodCell::Absent) => (ctx.t("cell.absent"), TABLE_BOLD, palette.fail),
                        Some(PeriodCell::NotRecorded | PeriodCell::NotApplicable) | None => {
                            plain(None)
                        }
                    },
                };
                let align = match &column.key {
                    ColumnKey::Fixed(
                        FixedColumn::Subject | FixedColumn::Remarks | FixedColumn::Teacher,
                    ) => TextAlign::Left,
                    _ => TextAlign::Center,
                };
                let max_lines = ((max_height - 2.0 * CELL_PADDING)
                    / ctx.text.line_height(font.size))
                .floor()
                .max(1.0) as usize;
                TableCell {
                    lines: ctx.text.ellipsize(&content, font, cell_width(*width), max_lines),
                    font,
                    color,
                    align,
                }
            })
            .collect()
    }

    fn row_height(&self, cells: &[TableCell]) -> f32 {
        let content = cells
            .iter()
            .map(|cell| self.ctx.text.measure(&cell.lines, cell.font, None).height)
            .fold(0.0_f32, f32::max);
        content + 2.0 * CELL_PADDING
    }

    fn draw_row(
        &self,
        document: &mut LayoutDocument,
        cursor: Cursor,
        cells: &[TableCell],
        fill: Option<RgbColor>,
    ) -> Cursor {
        let height = self.row_height(cells);
        let mut x = self.ctx.page.left();
        for (cell, width) in cells.iter().zip(&self.widths) {
            document.draw(
                cursor.page,
                DrawCommand::Rect {
                    x,
                    y: cursor.y,
                    width: *width,
                    height,
                    fill,
                    stroke: Some(self.ctx.palette().border),
                },
            );
            document.draw(
                cursor.page,
                text(
                    x + CELL_PADDING,
                    cursor.y + CELL_PADDING,
                    cell_width(*width),
                    cell.lines.clone(),
                    cell.font,
                    cell.color,
                    cell.align,
                ),
            );
            x += width;
        }
        cursor.advance(height)
    }

    fn remarks_and_signatures(&self, document: &mut LayoutDocument, cursor: Cursor) -> Cursor {
        let ctx = &self.ctx;
        let palette = ctx.palette();
        let page = &ctx.page;
        let usable = page.usable_width();
        let line_height = ctx.text.line_height(BODY.size);

        let remarks = non_empty(&ctx.results.overall_performance.remarks)
            .map(str::to_string)
            .unwrap_or_else(|| ctx.t("remarks.none"));
        let fixed_height = self.heading_height() + SIGNATURE_BLOCK_HEIGHT;

        // one line of remarks is enough to stay; the rest is ellipsized
        let cursor = self
            .pagination
            .reserve_trailing(document, cursor, fixed_height + line_height)
            .cursor();

        let room = self.pagination.remaining(cursor) - fixed_height;
        let max_lines = ((room / line_height).floor() as usize).max(1);
        let lines = ctx.text.ellipsize(&remarks, BODY, usable, max_lines);

        let cursor = self.section_heading(document, cursor, "section.remarks");
        document.draw(
            cursor.page,
            text(page.left(), cursor.y, usable, lines, BODY, palette.text, TextAlign::Left),
        );

        let bottom = page.content_bottom();
        let label_height = ctx.text.line_height(BODY_BOLD.size);
        let line_y = bottom - label_height - 1.0;
        let signature_width = usable * SIGNATURE_WIDTH_SHARE;
        for (x, key) in [
            (page.left(), "signature.dean"),
            (page.right() - signature_width, "signature.principal"),
        ] {
            document.draw(
                cursor.page,
                DrawCommand::Line {
                    from: (x, line_y),
                    to: (x + signature_width, line_y),
                    color: palette.text,
                    thickness: 0.4,
                },
            );
            let label = ctx.text.truncate_line(&ctx.t(key), BODY_BOLD, signature_width);
            document.draw(
                cursor.page,
                text(
                    x,
                    line_y + 1.0,
                    signature_width,
                    vec![label],
                    BODY_BOLD,
                    palette.text,
                    TextAlign::Center,
                ),
            );
        }

        Cursor::new(cursor.page, bottom)
    }

    fn heading_height(&self) -> f32 {
        self.ctx.text.line_height(HEADING.size) + HEADING_GAP
    }

    fn section_heading(&self, document: &mut LayoutDocument, cursor: Cursor, key: &str) -> Cursor {
        let ctx = &self.ctx;
        document.draw(
            cursor.page,
            text(
                ctx.page.left(),
                cursor.y,
                ctx.page.usable_width(),
                vec![ctx.t(key)],
                HEADING,
                ctx.palette().accent,
                TextAlign::Left,
            ),
        );
        cursor.advance(self.heading_height())
    }

    /// Draws wrapped blocks one under another and returns their total height.
    fn stack(
        &self,
        document: &mut LayoutDocument,
        cursor: Cursor,
        x: f32,
        width: f32,
        blocks: &[(String, FontSpec, RgbColor)],
        align: TextAlign,
    ) -> f32 {
        let mut height = 0.0;
        for (content, font, color) in blocks {
            let lines = self.ctx.text.wrap(content, *font, width);
            let block_height = self.ctx.text.measure(&lines, *font, None).height;
            document.draw(
                cursor.page,
                text(x, cursor.y + height, width, lines, *font, *color, align),
            );
            height += block_height;
        }
        height
    }

    /// School, student and period on one line, then a rule.
    fn running_header(&self) -> (Vec<DrawCommand>, f32) {
        let ctx = &self.ctx;
        let palette = ctx.palette();
        let page = &ctx.page;
        let usable = page.usable_width();
        let y = page.content_top();
        let line_height = ctx.text.line_height(SMALL.size);

        let left = ctx.text.truncate_line(
            &format!("{} · {}", ctx.school.name, ctx.student.full_name),
            SMALL,
            usable * 0.6,
        );
        let right = ctx.text.truncate_line(&ctx.period_label(), SMALL, usable * 0.38);
        let rule_y = y + line_height + 1.0;

        let commands = vec![
            text(page.left(), y, usable * 0.6, vec![left], SMALL, palette.muted, TextAlign::Left),
            text(
                page.right() - usable * 0.38,
                y,
                usable * 0.38,
                vec![right],
                SMALL,
                palette.muted,
                TextAlign::Right,
            ),
            DrawCommand::Line {
                from: (page.left(), rule_y),
                to: (page.right(), rule_y),
                color: palette.border,
                thickness: 0.3,
            },
        ];
        (commands, line_height + 1.0 + 3.0)
    }

    fn footer(&self, page_number: usize, total: usize) -> Vec<DrawCommand> {
        let ctx = &self.ctx;
        let palette = ctx.palette();
        let page = &ctx.page;
        let usable = page.usable_width();
        let rule_y = page.footer_top() + 1.0;
        let y = rule_y + 1.5;

        let left = ctx.text.truncate_line(
            &format!("{} · {}", ctx.student.full_name, ctx.period_label()),
            SMALL,
            usable * 0.7,
        );
        let right = ctx.translator.translate(
            "report.page",
            &[("page", page_number.to_string()), ("total", total.to_string())],
        );

        vec![
            DrawCommand::Line {
                from: (page.left(), rule_y),
                to: (page.right(), rule_y),
                color: palette.border,
                thickness: 0.3,
            },
            text(page.left(), y, usable * 0.7, vec![left], SMALL, palette.muted, TextAlign::Left),
            text(
                page.right() - usable * 0.3,
                y,
                usable * 0.3,
                vec![right],
                SMALL,
                palette.muted,
                TextAlign::Right,
            ),
        ]
    }
}

fn text(
    x: f32,
    y: f32,
    width: f32,
    lines: Vec<String>,
    font: FontSpec,
    color: RgbColor,
    align: TextAlign,
) -> DrawCommand {
    DrawCommand::Text(TextCommand {
        x,
        y,
        width,
        lines,
        font,
        color,
        align,
    })
}

fn cell_width(column_width: f32) -> f32 {
    (column_width - 2.0 * CELL_PADDING).max(1.0)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn format_score(value: f32) -> String {
    format!("{value:.2}")
}

/// Whole numbers without decimals, anything else with two.
fn format_number(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{OverallPerformance, PeriodInfo, RecordId, SequenceDetail},
        services::translator::Catalog,
    };

    fn school() -> SchoolInfo {
        SchoolInfo {
            name: "Lycée Bilingue".into(),
            motto: Some("Work - Discipline".into()),
            address: Some("PO Box 12".into()),
            phone: None,
            email: None,
        }
    }

    fn student() -> StudentInfo {
        StudentInfo {
            full_name: "Ada Mbarga".into(),
            matricule: Some("LB-2024-001".into()),
            class_name: Some("Form 4".into()),
            date_of_birth: None,
            place_of_birth: Some("Douala".into()),
            gender: None,
        }
    }

    fn subject(index: usize, score: Option<f32>) -> SubjectResult {
        SubjectResult {
            subject_id: RecordId::Number(index as i64),
            subject_name: format!("Subject {index}"),
            coefficient: 2.0,
            score,
            rank: Some(3),
            class_average_subject: Some(10.5),
            teacher_name: Some("M. Essomba".into()),
            sequence_details: vec![SequenceDetail {
                sequence_id: RecordId::Number(1),
                sequence_name: "Seq 1".into(),
                normalized_score: score,
                weight: None,
                is_absent: false,
                rank: None,
            }],
            term_details: Vec::new(),
        }
    }

    fn payload(period_type: PeriodType, subjects: usize) -> ResultPayload {
        ResultPayload {
            period_type: Some(period_type),
            period_info: PeriodInfo {
                id: Some(RecordId::Number(7)),
                name: String::new(),
                academic_year: Some("2024-2025".into()),
            },
            overall_performance: OverallPerformance {
                average: Some(12.34),
                rank: Some(4),
                class_size: Some(38),
                total_points: Some(246.8),
                total_coefficient: Some(20.0),
                class_average: Some(10.9),
                promotion_status_key: Some("promoted".into()),
                remarks: Some("Steady progress.".into()),
            },
            subject_breakdown: (0..subjects).map(|i| subject(i, Some(8.0 + (i % 10) as f32))).collect(),
        }
    }

    fn compose(results: &ResultPayload) -> ComposedReport {
        let school = school();
        let student = student();
        let styles = ConditionalStyleResolver::default();
        let catalog = Catalog::english();
        let ctx = RenderContext {
            page: PageMetrics::default(),
            styles: &styles,
            text: TextMetrics::new(),
            translator: &catalog,
            school: &school,
            student: &student,
            results,
            period_type: results.period_type.unwrap_or(PeriodType::Sequence),
        };
        LayoutComposer::new(ctx).compose()
    }

    #[test]
    fn sections_follow_fixed_order_and_cursor_moves_down() {
        let report = compose(&payload(PeriodType::Term, 6));
        let order: Vec<Section> = report.sections.iter().map(|m| m.section).collect();
        assert_eq!(order, Section::ORDER.to_vec());

        for pair in report.sections.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        for mark in &report.sections {
            assert!(mark.end.page > mark.start.page || mark.end.y > mark.start.y);
        }
        assert_eq!(report.page_count(), 1);
    }

    #[test]
    fn every_page_gets_a_numbered_footer() {
        let report = compose(&payload(PeriodType::Term, 70));
        let total = report.page_count();
        assert!(total >= 2);
        for index in 0..total {
            let footer = format!("Page {} of {}", index + 1, total);
            assert!(report.document.page_text(index).contains(&footer.as_str()));
        }
    }

    #[test]
    fn table_headers_repeat_on_continuation_pages() {
        let report = compose(&payload(PeriodType::Term, 70));
        let second_page = report.document.page_text(1);
        assert!(second_page.contains(&"Subject"));
        assert!(second_page.contains(&"Lycée Bilingue · Ada Mbarga"));
        // the running header is not drawn on the first page
        assert!(!report.document.page_text(0).contains(&"Lycée Bilingue · Ada Mbarga"));
    }

    #[test]
    fn signatures_sit_above_the_bottom_margin_on_the_last_page() {
        let report = compose(&payload(PeriodType::Term, 70));
        let last = report.page_count() - 1;
        let text = report.document.page_text(last);
        assert!(text.contains(&"Dean of Studies"));
        assert!(text.contains(&"Principal"));

        let mark = report.mark(Section::RemarksAndSignatures).unwrap();
        assert_eq!(mark.end.page, last);
        assert_eq!(mark.end.y, PageMetrics::default().content_bottom());
    }

    #[test]
    fn empty_breakdown_shows_placeholder() {
        let report = compose(&payload(PeriodType::Term, 0));
        assert_eq!(report.page_count(), 1);
        assert!(report
            .document
            .page_text(0)
            .contains(&"No results recorded for this period."));
    }

    #[test]
    fn student_card_lists_only_present_fields() {
        let report = compose(&payload(PeriodType::Sequence, 1));
        let text = report.document.page_text(0);
        assert!(text.contains(&"Registration no.: "));
        assert!(text.contains(&"Place of birth: "));
        assert!(!text.contains(&"Gender: "));
        assert!(!text.contains(&"Date of birth: "));
    }

    #[test]
    fn year_summary_appends_promotion_rows() {
        let report = compose(&payload(PeriodType::Year, 3));
        let text = report.document.page_text(0);
        assert!(text.contains(&"Promoted"));
        assert!(text.iter().any(|line| line.contains("12.34/20")));

        let term = compose(&payload(PeriodType::Term, 3));
        assert!(!term.document.page_text(0).contains(&"Promoted"));
    }

    #[test]
    fn period_label_falls_back_to_type() {
        let report = compose(&payload(PeriodType::Term, 1));
        assert!(report.document.page_text(0).contains(&"Term"));
    }

    #[test]
    fn long_remarks_are_ellipsized() {
        let mut results = payload(PeriodType::Sequence, 2);
        results.overall_performance.remarks = Some("Keeps improving in every subject. ".repeat(400));
        let report = compose(&results);
        let last = report.page_count() - 1;
        assert!(report
            .document
            .page_text(last)
            .iter()
            .any(|line| line.ends_with('…')));
    }

    #[test]
    fn long_remarks_stay_on_a_page_with_room_for_signatures() {
        let mut results = payload(PeriodType::Sequence, 2);
        results.overall_performance.remarks = Some("Keeps improving in every subject. ".repeat(150));
        let report = compose(&results);

        let mark = report.mark(Section::RemarksAndSignatures).unwrap();
        assert_eq!(mark.start.page, 0);
        assert_eq!(mark.end.page, 0);
        assert_eq!(report.page_count(), 1);
        assert!(report.document.page_text(0).iter().any(|line| line.ends_with('…')));
    }

    #[test]
    fn oversized_rows_stay_inside_the_content_area() {
        let mut results = payload(PeriodType::Term, 1);
        results.subject_breakdown[0].subject_name = "Mathematics ".repeat(600);
        let report = compose(&results);
        let bottom = PageMetrics::default().content_bottom();

        for page in &report.document.pages {
            for command in &page.commands {
                if let DrawCommand::Rect { y, height, .. } = command {
                    assert!(y + height <= bottom + 0.01, "rect ends at {}", y + height);
                }
            }
        }
        assert!(report
            .document
            .pages
            .iter()
            .flat_map(|page| &page.commands)
            .any(|command| matches!(
                command,
                DrawCommand::Text(text) if text.lines.last().is_some_and(|l| l.ends_with('…'))
            )));
    }

    #[test]
    fn only_the_average_is_highlighted() {
        let mut results = payload(PeriodType::Sequence, 10);
        results.overall_performance.average = Some(17.0);
        let report = compose(&results);
        let palette = Palette::default();

        let colours: Vec<(FontSpec, RgbColor)> = report.document.pages[0]
            .commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text(text) if text.lines == ["17.00"] => Some((text.font, text.color)),
                _ => None,
            })
            .collect();
        assert!(colours.contains(&(METRIC_VALUE, palette.highlight)));
        assert!(colours.contains(&(TABLE, palette.pass)));
        assert!(!colours.contains(&(TABLE, palette.highlight)));
    }

    #[test]
    fn composing_twice_is_identical() {
        let results = payload(PeriodType::Term, 45);
        assert_eq!(compose(&results), compose(&results));
    }
}
