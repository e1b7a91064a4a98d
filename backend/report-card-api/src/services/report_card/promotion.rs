//! End-of-year promotion wording.

use crate::{
    models::{OverallPerformance, SubjectResult},
    services::translator::Translate,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionStatus {
    Promoted,
    ConditionalPromotion,
    Repeated,
    /// Any key outside the known set. Kept as-is and never treated as an error.
    Unrecognized(String),
}

impl PromotionStatus {
    pub fn from_key(key: &str) -> Self {
        match key {
            "promoted" => PromotionStatus::Promoted,
            "conditional_promotion" => PromotionStatus::ConditionalPromotion,
            "repeated" => PromotionStatus::Repeated,
            other => PromotionStatus::Unrecognized(other.to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            PromotionStatus::Promoted => "promoted",
            PromotionStatus::ConditionalPromotion => "conditional_promotion",
            PromotionStatus::Repeated => "repeated",
            PromotionStatus::Unrecognized(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PromotionStatus::Unrecognized(_))
    }

    /// Display label; unknown keys are shown raw.
    pub fn label(&self, translator: &dyn Translate) -> String {
        if self.is_known() {
            translator.translate(&format!("promotion.status.{}", self.key()), &[])
        } else {
            self.key().to_string()
        }
    }
}

/// Subjects with a recorded score at or above the pass mark.
pub fn passed_subject_count(subjects: &[SubjectResult], passing_score: f32) -> usize {
    subjects
        .iter()
        .filter(|s| s.score.is_some_and(|score| score >= passing_score))
        .count()
}

pub struct PromotionRemarkGenerator<'a> {
    translator: &'a dyn Translate,
    passing_score: f32,
}

impl<'a> PromotionRemarkGenerator<'a> {
    pub fn new(translator: &'a dyn Translate, passing_score: f32) -> Self {
        Self {
            translator,
            passing_score,
        }
    }

    /// Templated remark for a known status. For a missing or unrecognised
    /// status the raw `remarks` of the overall performance is returned, or an
    /// empty string when there are none.
    pub fn generate(&self, overall: &OverallPerformance, subjects: &[SubjectResult]) -> String {
        let status = overall
            .promotion_status_key
            .as_deref()
            .map(PromotionStatus::from_key);

        match status {
            Some(status) if status.is_known() => {
                let passed = passed_subject_count(subjects, self.passing_score);
                let average = overall
                    .average
                    .map(|value| format!("{value:.2}"))
                    .unwrap_or_else(|| self.translator.translate("cell.not_applicable", &[]));
                self.translator.translate(
                    &format!("promotion.remark.{}", status.key()),
                    &[
                        ("passed", passed.to_string()),
                        ("total", subjects.len().to_string()),
                        ("average", average),
                    ],
                )
            }
            _ => overall.remarks.clone().unwrap_or_default(),
        }
    }
}
