pub mod identity;
pub mod report_card;
pub mod results;

pub use identity::{SchoolInfo, StudentInfo};
pub use results::{
    OverallPerformance, PeriodDetail, PeriodInfo, PeriodType, RecordId, ResultPayload,
    SequenceDetail, SubjectResult, TermDetail,
};
