//! ProfileCustomizer: reorders a base profile's skills against a posting
//! and personalizes the summary. Pure: no I/O, no clock, no randomness.

use crate::jobs::models::JobRecord;
use crate::profile::models::{CandidateProfile, TailoredProfile};

pub const MAX_SKILLS: usize = 15;
const SUMMARY_SKILLS: usize = 3;

/// Lower-cased containment; blank skills never match.
fn is_match(skill: &str, haystack: &str) -> bool {
    !skill.trim().is_empty() && haystack.contains(&skill.to_lowercase())
}

pub fn customize(profile: &CandidateProfile, job: &JobRecord) -> TailoredProfile {
    let haystack = job.description().to_lowercase();
    let (matched, rest): (Vec<String>, Vec<String>) = profile
        .skills
        .iter()
        .cloned()
        .partition(|skill| is_match(skill, &haystack));

    let mut tailored = profile.clone();
    tailored.skills = matched
        .iter()
        .chain(rest.iter())
        .take(MAX_SKILLS)
        .cloned()
        .collect();

    let clause = if matched.is_empty() {
        format!(
            "Excited about the {} opportunity at {}.",
            job.title(), job.company_name()
        )
    } else {
        let top: Vec<&str> = matched
            .iter()
            .take(SUMMARY_SKILLS)
            .map(String::as_str)
            .collect();
        format!(
            "Particularly interested in {} roles with expertise in {}.",
            job.title(),
            top.join(", ")
        )
    };

    let summary = &mut tailored.personal_info.professional_summary;
    *summary = if summary.trim().is_empty() {
        clause
    } else {
        format!("{} {}", summary.trim_end(), clause)
    };

    TailoredProfile {
        profile: tailored,
        matched_skills: matched,
    }
}
