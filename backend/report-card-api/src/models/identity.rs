use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Student identity as printed on the report card.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StudentInfo {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Student name must be between 1 and 200 characters"
    ))]
    pub full_name: String,

    pub matricule: Option<String>,

    pub class_name: Option<String>,

    pub date_of_birth: Option<NaiveDate>,

    pub place_of_birth: Option<String>,

    pub gender: Option<String>,
}

/// School identity block for the document header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolInfo {
    pub name: String,
    pub motto: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}
