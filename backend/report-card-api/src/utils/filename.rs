use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_ALPHANUMERIC: Regex = Regex::new(r"[^A-Za-z0-9]+").unwrap();
}

/// Collapses every run of characters outside `[A-Za-z0-9]` into one `_` and
/// trims underscores at both ends.
pub fn normalize_segment(value: &str) -> String {
    NON_ALPHANUMERIC
        .replace_all(value, "_")
        .trim_matches('_')
        .to_string()
}

/// `report_card_<student>_<period>.pdf`; empty parts become `student` and
/// `period`.
pub fn report_card_filename(student_name: &str, period_name: &str) -> String {
    let student = non_empty_or(normalize_segment(student_name), "student");
    let period = non_empty_or(normalize_segment(period_name), "period");
    format!("report_card_{student}_{period}.pdf")
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
