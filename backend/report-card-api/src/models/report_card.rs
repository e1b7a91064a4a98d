use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    identity::{SchoolInfo, StudentInfo},
    results::ResultPayload,
};

/// Request body for rendering a single report card.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RenderReportCardRequest {
    pub school: Option<SchoolInfo>,

    #[validate(nested)]
    pub student: StudentInfo,

    pub results: Option<ResultPayload>,

    #[validate(range(
        min = 0.0,
        max = 20.0,
        message = "Passing score must be between 0 and 20"
    ))]
    pub passing_score: Option<f32>,

    #[validate(length(min = 2, max = 5, message = "Locale must be 2-5 characters"))]
    pub locale: Option<String>,

    /// Per-request overrides of catalog strings
    #[serde(default)]
    pub translations: HashMap<String, String>,
}

/// Request body for rendering one report card per student.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BatchRenderRequest {
    pub school: Option<SchoolInfo>,

    #[validate(range(
        min = 0.0,
        max = 20.0,
        message = "Passing score must be between 0 and 20"
    ))]
    pub passing_score: Option<f32>,

    #[validate(length(min = 2, max = 5, message = "Locale must be 2-5 characters"))]
    pub locale: Option<String>,

    #[serde(default)]
    pub translations: HashMap<String, String>,

    #[validate(length(min = 1, message = "At least one student is required"), nested)]
    pub students: Vec<BatchStudentEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchStudentEntry {
    #[validate(nested)]
    pub student: StudentInfo,
    pub results: Option<ResultPayload>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchRenderResponse {
    pub documents: Vec<BatchDocument>,
    pub failures: Vec<BatchFailure>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchDocument {
    pub student: String,
    pub filename: String,
    pub page_count: usize,
    pub content_base64: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchFailure {
    pub student: String,
    pub error: String,
}
