use serde::{Deserialize, Serialize};

/// Base candidate profile, loaded once per process and shared read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateProfile {
    pub personal_info: PersonalInfo,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    /// Order is significant: it is the ranking used when nothing matches.
    pub skills: Vec<String>,
    pub projects: Vec<Project>,
    pub certifications: Vec<Certification>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub professional_summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub degree: String,
    pub school: String,
    pub location: String,
    pub graduation_date: String,
    pub gpa: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certification {
    pub name: String,
    pub issuer: Option<String>,
    pub date: Option<String>,
}

/// Per-job copy of the base profile with reordered skills and an
/// augmented summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TailoredProfile {
    pub profile: CandidateProfile,
    /// Base skills found in the job description, in base order.
    pub matched_skills: Vec<String>,
}

impl CandidateProfile {
    /// Template used when no profile files are available.
    pub fn template() -> Self {
        Self {
            personal_info: PersonalInfo {
                full_name: "Your Full Name".to_string(),
                email: "your.email@example.com".to_string(),
                phone: "(555) 123-4567".to_string(),
                address: Some("Your City, State".to_string()),
                linkedin_url: Some("https://linkedin.com/in/yourprofile".to_string()),
                github_url: Some("https://github.com/yourusername".to_string()),
                portfolio_url: None,
                professional_summary:
                    "Experienced professional with a passion for technology and innovation."
                        .to_string(),
            },
            experience: vec![Experience {
                title: "Your Job Title".to_string(),
                company: "Company Name".to_string(),
                location: "City, State".to_string(),
                start_date: "2020-01".to_string(),
                end_date: "Present".to_string(),
                description: "Description of your role and achievements".to_string(),
                achievements: vec![
                    "Key achievement 1".to_string(),
                    "Key achievement 2".to_string(),
                ],
            }],
            education: vec![Education {
                degree: "Your Degree".to_string(),
                school: "University Name".to_string(),
                location: "City, State".to_string(),
                graduation_date: "2020-05".to_string(),
                gpa: "3.8".to_string(),
            }],
            skills: [
                "Python",
                "JavaScript",
                "React",
                "Node.js",
                "SQL",
                "Git",
                "AWS",
                "Docker",
                "APIs",
                "Agile",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            projects: vec![Project {
                name: "Project Name".to_string(),
                description: "Brief description of the project".to_string(),
                technologies: vec!["Tech1".to_string(), "Tech2".to_string()],
                url: Some("https://github.com/yourusername/project".to_string()),
            }],
            certifications: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let profile: CandidateProfile = serde_json::from_str(
            r#"{"personal_info": {"full_name": "Ada"}, "skills": ["Rust"]}"#,
        )
        .unwrap();
        assert_eq!(profile.personal_info.full_name, "Ada");
        assert_eq!(profile.skills, vec!["Rust"]);
        assert!(profile.experience.is_empty());
        assert!(profile.personal_info.linkedin_url.is_none());
    }

    #[test]
    fn test_template_has_name_and_skills() {
        let profile = CandidateProfile::template();
        assert!(!profile.personal_info.full_name.is_empty());
        assert_eq!(profile.skills.len(), 10);
    }
}
