use serde::Serialize;

/// One CV, as the classifier and template reader fill it in. Every field that
/// was never populated stays an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CvRecord {
    pub name: String,
    pub date_of_birth: String,
    pub nationality: String,
    pub membership: String,
    pub education: String,
    pub training: String,
    pub languages: String,
    pub countries: String,
    pub employment: Vec<EmploymentRecord>,
    pub specializations: String,
    pub projects: String,
    pub skills: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmploymentRecord {
    pub title: Option<String>,
    pub employer: String,
    pub dates: String,
    pub experience: Option<String>,
    pub current: bool,
}

impl EmploymentRecord {
    pub fn new(employer: impl Into<String>) -> Self {
        Self {
            employer: employer.into(),
            ..Default::default()
        }
    }

    /// Employer followed by dates, for "is this the current job" checks.
    pub fn text(&self) -> String {
        format!("{} {}", self.employer, self.dates)
    }
}

/// True for the markers CVs use to say a job has not ended.
pub fn mentions_ongoing(text: &str) -> bool {
    let upper = text.to_uppercase();
    upper.contains("PRESENT") || upper.contains("TILL DATE") || upper.contains("TILL NOW")
}
