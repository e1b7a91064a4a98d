//! Report card composition engine.
//!
//! `ResultPayload -> ColumnSchemaBuilder -> ColumnWidthAllocator ->
//! LayoutComposer -> PaginationController -> DocumentRenderer`. Everything up
//! to the renderer is pure; each call owns its own cursor and page counter,
//! so any number of documents can be generated in parallel.

pub mod column_schema;
pub mod column_widths;
pub mod document;
pub mod grading;
pub mod layout;
pub mod pagination;
pub mod promotion;
pub mod renderer;
pub mod text_metrics;

use std::{
    collections::{HashMap, HashSet},
    time::Instant,
};

use tracing::{info, warn};

use crate::{
    config::ReportConfig,
    error::{ReportCardError, ReportCardResult},
    metrics,
    models::{
        report_card::{BatchRenderRequest, RenderReportCardRequest},
        PeriodType, ResultPayload, SchoolInfo, StudentInfo,
    },
    services::translator::{Catalog, Translate},
    utils::filename::report_card_filename,
};

use self::{
    grading::{ConditionalStyleResolver, GradingScale},
    layout::{ComposedReport, LayoutComposer, RenderContext},
    renderer::{DocumentRenderer, PdfRenderer},
    text_metrics::TextMetrics,
};

/// Per-call knobs layered over the configured defaults.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub passing_score: Option<f32>,
    pub locale: Option<String>,
    pub translations: HashMap<String, String>,
}

/// One document to generate. Owned so it can move onto a blocking task.
#[derive(Debug, Clone)]
pub struct ReportCardJob {
    pub school: Option<SchoolInfo>,
    pub student: StudentInfo,
    pub results: Option<ResultPayload>,
    pub options: RenderOptions,
}

impl From<RenderReportCardRequest> for ReportCardJob {
    fn from(request: RenderReportCardRequest) -> Self {
        Self {
            school: request.school,
            student: request.student,
            results: request.results,
            options: RenderOptions {
                passing_score: request.passing_score,
                locale: request.locale,
                translations: request.translations,
            },
        }
    }
}

impl ReportCardJob {
    /// One job per student; school and options are shared by all of them.
    pub fn from_batch(request: BatchRenderRequest) -> Vec<Self> {
        let options = RenderOptions {
            passing_score: request.passing_score,
            locale: request.locale,
            translations: request.translations,
        };
        request
            .students
            .into_iter()
            .map(|entry| Self {
                school: request.school.clone(),
                student: entry.student,
                results: entry.results,
                options: options.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct RenderedReportCard {
    pub filename: String,
    pub page_count: usize,
    pub bytes: Vec<u8>,
    pub layout: ComposedReport,
}

/// Inputs that passed validation.
struct ValidatedJob<'a> {
    school: &'a SchoolInfo,
    results: &'a ResultPayload,
    period_type: PeriodType,
    passing_score: f32,
}

#[derive(Debug, Clone)]
pub struct ReportCardService<R = PdfRenderer> {
    settings: ReportConfig,
    renderer: R,
}

impl ReportCardService<PdfRenderer> {
    pub fn new(settings: ReportConfig) -> Self {
        Self::with_renderer(settings, PdfRenderer::new())
    }
}

impl<R: DocumentRenderer> ReportCardService<R> {
    pub fn with_renderer(settings: ReportConfig, renderer: R) -> Self {
        Self { settings, renderer }
    }

    pub fn settings(&self) -> &ReportConfig {
        &self.settings
    }

    /// Catalog for the requested locale (or the configured default) with
    /// the caller's overrides applied.
    pub fn translator(&self, options: &RenderOptions) -> Catalog {
        let locale = options
            .locale
            .as_deref()
            .unwrap_or(&self.settings.default_locale);
        Catalog::for_locale(locale).with_overrides(options.translations.clone())
    }

    /// Lays the document out without rendering it.
    pub fn compose(&self, job: &ReportCardJob) -> ReportCardResult<ComposedReport> {
        let translator = self.translator(&job.options);
        self.compose_with(job, &translator)
    }

    /// Same as [`ReportCardService::compose`] with a caller-supplied
    /// translation function.
    pub fn compose_with(
        &self,
        job: &ReportCardJob,
        translator: &dyn Translate,
    ) -> ReportCardResult<ComposedReport> {
        let valid = self.validate(job)?;
        let styles = ConditionalStyleResolver::new(
            GradingScale::default()
                .with_passing_score(valid.passing_score)
                .with_highlight_score(self.settings.highlight_score),
            self.settings.palette.clone(),
        );
        let ctx = RenderContext {
            page: self.settings.page,
            styles: &styles,
            text: TextMetrics::new(),
            translator,
            school: valid.school,
            student: &job.student,
            results: valid.results,
            period_type: valid.period_type,
        };
        Ok(LayoutComposer::new(ctx).compose())
    }

    pub fn generate(&self, job: &ReportCardJob) -> ReportCardResult<RenderedReportCard> {
        let started = Instant::now();
        let period_label = job
            .results
            .as_ref()
            .and_then(|r| r.period_type)
            .map(|p| p.as_str())
            .unwrap_or("unknown");

        let outcome = self.compose(job).and_then(|layout| {
            let bytes = self.renderer.render(&layout.document)?;
            Ok((layout, bytes))
        });

        match outcome {
            Ok((layout, bytes)) => {
                let page_count = layout.page_count();
                let filename = report_card_filename(&job.student.full_name, &period_name(job));
                let elapsed = started.elapsed().as_secs_f64();
                metrics::record_generation(period_label, "success", Some(page_count), elapsed);
                info!(
                    student = %job.student.full_name,
                    period_type = period_label,
                    page_count,
                    bytes = bytes.len(),
                    elapsed_ms = (elapsed * 1000.0) as u64,
                    "Report card generated"
                );
                Ok(RenderedReportCard {
                    filename,
                    page_count,
                    bytes,
                    layout,
                })
            }
            Err(err) => {
                metrics::record_generation(period_label, "error", None, 0.0);
                warn!(
                    student = %job.student.full_name,
                    period_type = period_label,
                    error = %err,
                    "Report card generation failed"
                );
                Err(err)
            }
        }
    }

    /// Rejects incomplete or inconsistent input before any layout work.
    fn validate<'a>(&self, job: &'a ReportCardJob) -> ReportCardResult<ValidatedJob<'a>> {
        let school = job.school.as_ref().ok_or(ReportCardError::MissingSchool)?;
        let results = job.results.as_ref().ok_or(ReportCardError::MissingResults)?;
        let period_type = results.period_type.ok_or(ReportCardError::MissingPeriodType)?;

        let passing_score = job
            .options
            .passing_score
            .unwrap_or(self.settings.passing_score);
        if !(0.0..=20.0).contains(&passing_score) {
            return Err(ReportCardError::InvalidPassingScore(passing_score));
        }

        let mut seen = HashSet::with_capacity(results.subject_breakdown.len());
        for subject in &results.subject_breakdown {
            if !seen.insert(&subject.subject_id) {
                return Err(ReportCardError::DuplicateSubject(subject.subject_id.to_string()));
            }
            if let Some(score) = subject.score {
                if !(0.0..=20.0).contains(&score) {
                    return Err(ReportCardError::ScoreOutOfRange {
                        subject: subject.subject_name.clone(),
                        score,
                    });
                }
            }
        }

        Ok(ValidatedJob {
            school,
            results,
            period_type,
            passing_score,
        })
    }
}

/// Period part of the filename: the period's own name, or its type.
fn period_name(job: &ReportCardJob) -> String {
    job.results
        .as_ref()
        .map(|results| {
            let name = results.period_info.name.trim();
            if name.is_empty() {
                results
                    .period_type
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default()
            } else {
                name.to_string()
            }
        })
        .unwrap_or_default()
}
