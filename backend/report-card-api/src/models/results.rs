use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Sequence,
    Term,
    Year,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Sequence => "sequence",
            PeriodType::Term => "term",
            PeriodType::Year => "year",
        }
    }
}

/// Identifier as sent by the results API, which uses numeric ids for some
/// tenants and string ids for others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(value) => write!(f, "{value}"),
            RecordId::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Number(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

/// Results of one student for one reporting period.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultPayload {
    pub period_type: Option<PeriodType>,
    #[serde(default)]
    pub period_info: PeriodInfo,
    #[serde(default)]
    pub overall_performance: OverallPerformance,
    #[serde(default)]
    pub subject_breakdown: Vec<SubjectResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodInfo {
    pub id: Option<RecordId>,
    #[serde(default)]
    pub name: String,
    pub academic_year: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverallPerformance {
    pub average: Option<f32>,
    pub rank: Option<u32>,
    pub class_size: Option<u32>,
    pub total_points: Option<f32>,
    pub total_coefficient: Option<f32>,
    pub class_average: Option<f32>,
    pub promotion_status_key: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectResult {
    pub subject_id: RecordId,
    pub subject_name: String,
    pub coefficient: f32,
    pub score: Option<f32>,
    pub rank: Option<u32>,
    pub class_average_subject: Option<f32>,
    pub teacher_name: Option<String>,
    #[serde(default)]
    pub sequence_details: Vec<SequenceDetail>,
    #[serde(default)]
    pub term_details: Vec<TermDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceDetail {
    #[serde(alias = "id")]
    pub sequence_id: RecordId,
    #[serde(alias = "name")]
    pub sequence_name: String,
    pub normalized_score: Option<f32>,
    pub weight: Option<f32>,
    #[serde(default)]
    pub is_absent: bool,
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermDetail {
    #[serde(alias = "id")]
    pub term_id: RecordId,
    #[serde(alias = "name")]
    pub term_name: String,
    pub term_average_score: Option<f32>,
    pub weight: Option<f32>,
    #[serde(default)]
    pub is_absent: bool,
    pub rank: Option<u32>,
}

/// Common view over the per-period breakdown entries nested in a subject.
pub trait PeriodDetail {
    fn period_id(&self) -> &RecordId;
    fn period_name(&self) -> &str;
    fn period_score(&self) -> Option<f32>;
    fn is_absent(&self) -> bool;
    fn weight(&self) -> Option<f32>;
}

impl PeriodDetail for SequenceDetail {
    fn period_id(&self) -> &RecordId {
        &self.sequence_id
    }

    fn period_name(&self) -> &str {
        &self.sequence_name
    }

    fn period_score(&self) -> Option<f32> {
        self.normalized_score
    }

    fn is_absent(&self) -> bool {
        self.is_absent
    }

    fn weight(&self) -> Option<f32> {
        self.weight
    }
}

impl PeriodDetail for TermDetail {
    fn period_id(&self) -> &RecordId {
        &self.term_id
    }

    fn period_name(&self) -> &str {
        &self.term_name
    }

    fn period_score(&self) -> Option<f32> {
        self.term_average_score
    }

    fn is_absent(&self) -> bool {
        self.is_absent
    }

    fn weight(&self) -> Option<f32> {
        self.weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_numeric_and_text_ids() {
        let json = r#"{
            "period_type": "term",
            "period_info": {"name": "Term 1"},
            "subject_breakdown": [{
                "subject_id": 7,
                "subject_name": "Mathematics",
                "coefficient": 4,
                "score": 13.5,
                "sequence_details": [
                    {"id": "seq-1", "name": "Sequence 1", "normalized_score": 12.0},
                    {"sequence_id": 2, "sequence_name": "Sequence 2", "normalized_score": null, "is_absent": true}
                ]
            }]
        }"#;

        let payload: ResultPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.period_type, Some(PeriodType::Term));
        let subject = &payload.subject_breakdown[0];
        assert_eq!(subject.subject_id, RecordId::Number(7));
        assert_eq!(subject.sequence_details[0].sequence_id, RecordId::from("seq-1"));
        assert!(subject.sequence_details[1].is_absent);
        assert!(subject.rank.is_none());
        assert!(payload.overall_performance.average.is_none());
    }

    #[test]
    fn missing_period_type_is_none() {
        let payload: ResultPayload = serde_json::from_str(r#"{"subject_breakdown": []}"#).unwrap();
        assert!(payload.period_type.is_none());
    }
}
