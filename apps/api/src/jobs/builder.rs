//! JobRecordBuilder: turns an inbound event payload into a `JobRecord`.
//!
//! Payloads arrive either as the record itself or wrapped one level deep
//! under `data` (automation-style delivery). Field names vary between
//! workspaces, so title and company are resolved through ordered alias
//! chains.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::jobs::models::{JobDetails, JobRecord};
use crate::notion::properties::{
    describe_properties, extract_choice, extract_list, extract_text, PropertyDiagnostic,
};

pub const TITLE_FIELDS: &[&str] = &["Job Title", "Name", "Title", "Position", "Role"];
pub const COMPANY_FIELDS: &[&str] = &["Company", "Organization", "Employer", "Company Name"];
pub const DESCRIPTION_FIELDS: &[&str] = &["Job Description"];

const SALARY_FIELDS: &[&str] = &["Salary Range", "Salary"];
const LOCATION_FIELDS: &[&str] = &["Location"];
const EMPLOYMENT_TYPE_FIELDS: &[&str] = &["Employment Type", "Job Type"];
const EXPERIENCE_LEVEL_FIELDS: &[&str] = &["Experience Level", "Seniority"];
const REQUIRED_SKILL_FIELDS: &[&str] = &["Required Skills", "Skills"];
const PREFERRED_SKILL_FIELDS: &[&str] = &["Preferred Skills", "Nice to Have"];

#[derive(Debug, Error)]
pub enum JobRecordError {
    /// Neither a title nor a company could be resolved.
    #[error("no job title or company found in {} properties", properties.len())]
    NotFound { properties: Vec<PropertyDiagnostic> },
}

/// The record inside an event: the `data` envelope when present, else the
/// payload itself.
pub fn unwrap_envelope(payload: &Value) -> &Value {
    match payload.get("data") {
        Some(inner) if inner.is_object() => inner,
        _ => payload,
    }
}

/// Property bag of an event, if it carries one.
pub fn property_bag(payload: &Value) -> Option<&Map<String, Value>> {
    unwrap_envelope(payload)
        .get("properties")
        .and_then(Value::as_object)
}

/// Builds a `JobRecord` when the payload names a title or a company.
pub fn build_job_record(payload: &Value) -> Result<JobRecord, JobRecordError> {
    let record = unwrap_envelope(payload);
    let empty = Map::new();
    let properties = property_bag(payload).unwrap_or(&empty);
    let source_id = record
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let title = extract_text(properties, TITLE_FIELDS);
    let company = extract_text(properties, COMPANY_FIELDS);

    if title.is_none() && company.is_none() {
        return Err(JobRecordError::NotFound {
            properties: describe_properties(properties),
        });
    }
    if title.is_none() {
        warn!("No job title found on {source_id}, using default");
    }
    if company.is_none() {
        warn!("No company name found on {source_id}, using default");
    }

    let description = extract_text(properties, DESCRIPTION_FIELDS).unwrap_or_default();
    let details = JobDetails {
        salary_range: extract_text(properties, SALARY_FIELDS),
        location: extract_choice(properties, LOCATION_FIELDS),
        employment_type: extract_choice(properties, EMPLOYMENT_TYPE_FIELDS),
        required_skills: extract_list(properties, REQUIRED_SKILL_FIELDS),
        preferred_skills: extract_list(properties, PREFERRED_SKILL_FIELDS),
        experience_level: extract_choice(properties, EXPERIENCE_LEVEL_FIELDS),
    };
    let job = JobRecord::with_details(
        title.unwrap_or_default(),
        company.unwrap_or_default(),
        description,
        source_id,
        details,
    );

    info!(
        "Extracted job '{}' at '{}' (description {} chars, {} required skills)",
        job.title(),
        job.company_name(),
        job.description().len(),
        job.details().required_skills.len()
    );
    Ok(job)
}
