//! Error types for report card generation.
//!
//! Every variant except `Render` is raised by input validation, before any
//! layout work starts, so a failed generation never yields a partial document.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportCardError {
    #[error("Result payload is missing")]
    MissingResults,

    #[error("Result payload has no period_type")]
    MissingPeriodType,

    #[error("School information is missing")]
    MissingSchool,

    #[error("Subject '{0}' appears more than once in subject_breakdown")]
    DuplicateSubject(String),

    #[error("Score {score} for subject '{subject}' is outside [0, 20]")]
    ScoreOutOfRange { subject: String, score: f32 },

    #[error("Passing score {0} is outside [0, 20]")]
    InvalidPassingScore(f32),

    #[error("PDF generation error: {0}")]
    Render(String),
}

impl ReportCardError {
    /// True for errors caused by the caller's input rather than the renderer.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, ReportCardError::Render(_))
    }
}

/// Result type alias for report card operations
pub type ReportCardResult<T> = Result<T, ReportCardError>;
