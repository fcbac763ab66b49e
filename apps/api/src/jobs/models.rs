use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Position";
pub const DEFAULT_COMPANY: &str = "Company";

/// Optional posting attributes; all empty when the record lacks them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetails {
    pub salary_range: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub experience_level: Option<String>,
}

/// Canonical job posting, built once per inbound event and never mutated.
///
/// `title` and `company_name` are never empty; `JobRecordBuilder` fills
/// fixed defaults when a record lacks one of them. Fields are read through
/// accessors only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    title: String,
    company_name: String,
    description: String,
    /// Id of the remote record this job came from.
    source_id: String,
    #[serde(flatten)]
    details: JobDetails,
}

impl JobRecord {
    /// Record with only the required fields; optional fields empty.
    pub fn new(
        title: impl Into<String>,
        company_name: impl Into<String>,
        description: impl Into<String>,
        source_id: impl Into<String>,
    ) -> Self {
        Self::with_details(title, company_name, description, source_id, JobDetails::default())
    }

    pub fn with_details(
        title: impl Into<String>,
        company_name: impl Into<String>,
        description: impl Into<String>,
        source_id: impl Into<String>,
        details: JobDetails,
    ) -> Self {
        let title = non_empty_or(title.into(), DEFAULT_TITLE);
        let company_name = non_empty_or(company_name.into(), DEFAULT_COMPANY);
        let description = description.into();
        let description = if description.trim().is_empty() {
            format!("Position: {title} at {company_name}")
        } else {
            description
        };

        Self {
            title,
            company_name,
            description,
            source_id: source_id.into(),
            details,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn details(&self) -> &JobDetails {
        &self.details
    }
}

fn non_empty_or(value: String, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value
    }
}
