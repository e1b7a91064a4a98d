#![allow(dead_code)]

use axum::Router;
use report_card_api::{config::Config, create_router, services::AppState};
use serde_json::{json, Value};
use std::sync::Arc;

pub async fn create_test_app() -> Router {
    create_test_app_with(Config::default())
}

pub fn create_test_app_with(config: Config) -> Router {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let app_state = Arc::new(AppState::new(config));

    // Build test router (same as main app)
    create_router(app_state)
}

pub fn school() -> Value {
    json!({
        "name": "Lycée Bilingue de Yaoundé",
        "motto": "Discipline - Travail - Succès",
        "address": "BP 1234 Yaoundé",
        "phone": "+237 222 00 00 00",
        "email": "contact@lby.cm"
    })
}

pub fn student(full_name: &str) -> Value {
    json!({
        "full_name": full_name,
        "matricule": "LBY-2024-017",
        "class_name": "Form 4 A",
        "date_of_birth": "2009-03-14",
        "place_of_birth": "Douala",
        "gender": "F"
    })
}

pub fn subject(id: i64, name: &str, score: Option<f32>) -> Value {
    json!({
        "subject_id": id,
        "subject_name": name,
        "coefficient": 3,
        "score": score,
        "rank": 4,
        "class_average_subject": 11.2,
        "teacher_name": "M. Essomba"
    })
}

/// Sequence results with one scored subject per name.
pub fn sequence_results(subjects: &[(&str, Option<f32>)]) -> Value {
    let breakdown: Vec<Value> = subjects
        .iter()
        .enumerate()
        .map(|(index, (name, score))| subject(index as i64 + 1, name, *score))
        .collect();

    json!({
        "period_type": "sequence",
        "period_info": {"id": 1, "name": "Sequence 1", "academic_year": "2024-2025"},
        "overall_performance": {
            "average": 12.4,
            "rank": 7,
            "class_size": 42,
            "total_points": 148.8,
            "total_coefficient": 12,
            "class_average": 10.9
        },
        "subject_breakdown": breakdown
    })
}

/// Term results: Mathematics has all three sequences, English misses the
/// third and French was absent for the second.
pub fn term_results() -> Value {
    json!({
        "period_type": "term",
        "period_info": {"id": "t1", "name": "Term 1", "academic_year": "2024-2025"},
        "overall_performance": {"average": 11.75, "rank": 12, "class_size": 40},
        "subject_breakdown": [
            {
                "subject_id": 1,
                "subject_name": "Mathematics",
                "coefficient": 4,
                "score": 13.5,
                "sequence_details": [
                    {"sequence_id": 3, "sequence_name": "Sequence 3", "normalized_score": 14.0},
                    {"sequence_id": 1, "sequence_name": "Sequence 1", "normalized_score": 12.0},
                    {"sequence_id": 2, "sequence_name": "Sequence 2", "normalized_score": 14.5}
                ]
            },
            {
                "subject_id": 2,
                "subject_name": "English",
                "coefficient": 3,
                "score": 9.25,
                "sequence_details": [
                    {"sequence_id": 1, "sequence_name": "Sequence 1", "normalized_score": 9.0},
                    {"sequence_id": 2, "sequence_name": "Sequence 2", "normalized_score": 9.5}
                ]
            },
            {
                "subject_id": 3,
                "subject_name": "French",
                "coefficient": 3,
                "score": 11.0,
                "sequence_details": [
                    {"sequence_id": 1, "sequence_name": "Sequence 1", "normalized_score": 11.0},
                    {"sequence_id": 2, "sequence_name": "Sequence 2", "normalized_score": null, "is_absent": true},
                    {"sequence_id": 3, "sequence_name": "Sequence 3", "normalized_score": 11.0}
                ]
            }
        ]
    })
}

/// Annual results with a promotion decision.
pub fn year_results(status_key: &str) -> Value {
    json!({
        "period_type": "year",
        "period_info": {"id": 2024, "name": "Annual 2024-2025", "academic_year": "2024-2025"},
        "overall_performance": {
            "average": 9.2,
            "rank": 30,
            "class_size": 40,
            "promotion_status_key": status_key
        },
        "subject_breakdown": [
            {
                "subject_id": 1,
                "subject_name": "Mathematics",
                "coefficient": 4,
                "score": 8.0,
                "term_details": [
                    {"term_id": 1, "term_name": "Term 1", "term_average_score": 7.5},
                    {"term_id": 2, "term_name": "Term 2", "term_average_score": 8.5}
                ]
            },
            {
                "subject_id": 2,
                "subject_name": "History",
                "coefficient": 2,
                "score": 12.0,
                "term_details": [
                    {"term_id": 1, "term_name": "Term 1", "term_average_score": 12.0},
                    {"term_id": 3, "term_name": "Term 3", "term_average_score": 12.0}
                ]
            }
        ]
    })
}

pub fn render_request(full_name: &str, results: Value) -> Value {
    json!({
        "school": school(),
        "student": student(full_name),
        "results": results
    })
}
