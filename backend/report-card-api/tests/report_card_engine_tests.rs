use report_card_api::{
    config::ReportConfig,
    error::ReportCardError,
    models::{report_card::RenderReportCardRequest, PeriodType, ResultPayload},
    services::{
        report_card::{
            column_schema::{ColumnSchemaBuilder, PeriodCell},
            layout::{ComposedReport, Section},
            ReportCardJob, ReportCardService,
        },
        translator::Catalog,
    },
};
use serde_json::{json, Value};

mod common;

fn service() -> ReportCardService {
    ReportCardService::new(ReportConfig::default())
}

fn job(request: Value) -> ReportCardJob {
    let request: RenderReportCardRequest = serde_json::from_value(request).unwrap();
    ReportCardJob::from(request)
}

/// Every text line of every page, joined so wrapped text reads as one string.
fn all_text(report: &ComposedReport) -> String {
    (0..report.page_count())
        .flat_map(|page| report.document.page_text(page))
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn term_columns_follow_the_union_of_sequences() {
    let results: ResultPayload = serde_json::from_value(common::term_results()).unwrap();
    let subjects = &results.subject_breakdown;

    let schema = ColumnSchemaBuilder::build(PeriodType::Term, subjects, &Catalog::english());
    let names: Vec<&str> = schema.periods.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Sequence 1", "Sequence 2", "Sequence 3"]);

    let english = ColumnSchemaBuilder::period_cells(PeriodType::Term, &subjects[1], &schema.periods);
    assert_eq!(
        english,
        vec![
            PeriodCell::Score(9.0),
            PeriodCell::Score(9.5),
            PeriodCell::NotApplicable
        ]
    );

    let french = ColumnSchemaBuilder::period_cells(PeriodType::Term, &subjects[2], &schema.periods);
    assert_eq!(french[1], PeriodCell::Absent);

    let report = service()
        .compose(&job(common::render_request("Ada Mbarga", common::term_results())))
        .unwrap();
    let text = all_text(&report);
    assert!(text.contains("Abs"));
    assert!(text.contains("2 of 3 subjects passed"));
}

#[test]
fn composing_twice_gives_the_same_layout() {
    let request = common::render_request("Ada Mbarga", common::year_results("conditional_promotion"));
    let first = service().compose(&job(request.clone())).unwrap();
    let second = service().compose(&job(request)).unwrap();

    assert_eq!(first.page_count(), second.page_count());
    assert_eq!(first.sections, second.sections);
    assert_eq!(first, second);
}

#[test]
fn empty_breakdown_still_renders_every_section() {
    let request = common::render_request("Ada Mbarga", common::sequence_results(&[]));
    let rendered = service().generate(&job(request)).unwrap();

    assert_eq!(rendered.page_count, 1);
    assert!(rendered.bytes.starts_with(b"%PDF"));
    assert_eq!(rendered.layout.sections.len(), Section::ORDER.len());
    assert!(all_text(&rendered.layout).contains("No results recorded for this period."));
}

#[test]
fn year_report_carries_promotion_decision_and_remark() {
    let request = common::render_request("Ada Mbarga", common::year_results("repeated"));
    let report = service().compose(&job(request)).unwrap();
    let text = all_text(&report);

    assert!(text.contains("Repeats the class"));
    assert!(text.contains(
        "Not promoted: average of 9.20/20 with 1 of 2 subjects passed. The student repeats the class."
    ));
}

#[test]
fn unknown_promotion_key_falls_back_to_remarks() {
    let mut results = common::year_results("deferred");
    results["overall_performance"]["remarks"] = json!("Decision pending the council.");
    let report = service()
        .compose(&job(common::render_request("Ada Mbarga", results)))
        .unwrap();

    assert!(all_text(&report).contains("Decision pending the council."));
}

#[test]
fn invalid_input_fails_before_layout() {
    let mut request = common::render_request("Ada Mbarga", common::term_results());
    request["school"] = Value::Null;
    assert_eq!(
        service().generate(&job(request)).unwrap_err(),
        ReportCardError::MissingSchool
    );

    let mut results = common::term_results();
    results["subject_breakdown"][0]["score"] = json!(20.5);
    let err = service()
        .generate(&job(common::render_request("Ada Mbarga", results)))
        .unwrap_err();
    assert!(matches!(err, ReportCardError::ScoreOutOfRange { .. }));
    assert!(err.is_input_error());
}

#[test]
fn long_breakdowns_paginate_and_end_with_signatures() {
    let names: Vec<String> = (1..=60).map(|i| format!("Subject {i}")).collect();
    let subjects: Vec<(&str, Option<f32>)> = names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), Some(6.0 + (i % 12) as f32)))
        .collect();
    let request = common::render_request("Ada Mbarga", common::sequence_results(&subjects));
    let rendered = service().generate(&job(request)).unwrap();
    let layout = &rendered.layout;

    assert!(rendered.page_count > 1);
    assert_eq!(rendered.page_count, layout.document.pages.len());

    let last = rendered.page_count - 1;
    let closing = layout.mark(Section::RemarksAndSignatures).unwrap();
    assert_eq!(closing.end.page, last);

    let last_page = layout.document.page_text(last);
    assert!(last_page.contains(&"Dean of Studies"));
    assert!(last_page.contains(&"Principal"));

    for page in 0..rendered.page_count {
        let footer = format!("Page {} of {}", page + 1, rendered.page_count);
        assert!(layout.document.page_text(page).contains(&footer.as_str()));
    }

    // the subject table header is repeated on the page the table continues on
    let breakdown = layout.mark(Section::SubjectBreakdown).unwrap();
    assert!(breakdown.end.page > breakdown.start.page);
    assert!(layout.document.page_text(breakdown.end.page).contains(&"Subject"));
}

#[test]
fn french_locale_translates_the_document() {
    let mut request = common::render_request("Ada Mbarga", common::year_results("promoted"));
    request["locale"] = json!("fr");
    let report = service().compose(&job(request)).unwrap();
    let text = all_text(&report);

    assert!(text.contains("BULLETIN DE NOTES"));
    assert!(text.contains("Admis en classe supérieure"));
}
