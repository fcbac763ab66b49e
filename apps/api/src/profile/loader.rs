use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::profile::models::{CandidateProfile, PersonalInfo};

pub const BASE_RESUME_FILE: &str = "base_resume.json";
pub const PERSONAL_INFO_FILE: &str = "personal_info.json";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile file not found: {0}")]
    Missing(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ProfileError> {
    if !path.exists() {
        return Err(ProfileError::Missing(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ProfileError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the profile from `data_dir`, surfacing every failure.
///
/// `personal_info.json` replaces the personal-info block of
/// `base_resume.json` when both exist.
pub fn read_profile(data_dir: &Path) -> Result<CandidateProfile, ProfileError> {
    let mut profile: CandidateProfile = read_json(&data_dir.join(BASE_RESUME_FILE))?;

    match read_json::<PersonalInfo>(&data_dir.join(PERSONAL_INFO_FILE)) {
        Ok(personal_info) => profile.personal_info = personal_info,
        Err(ProfileError::Missing(_)) => {}
        Err(e) => warn!("Ignoring personal info override: {e}"),
    }

    Ok(profile)
}

/// Loads the profile, falling back to the built-in template on any failure.
pub fn load_profile(data_dir: &Path) -> CandidateProfile {
    match read_profile(data_dir) {
        Ok(profile) => {
            info!(
                "Loaded profile for '{}' ({} skills, {} experience entries)",
                profile.personal_info.full_name,
                profile.skills.len(),
                profile.experience.len()
            );
            profile
        }
        Err(ProfileError::Missing(path)) => {
            warn!("{} not found, using template profile", path.display());
            CandidateProfile::template()
        }
        Err(e) => {
            error!("Failed to load profile, using template: {e}");
            CandidateProfile::template()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_uses_template() {
        let dir = tempfile::tempdir().unwrap();
        let profile = load_profile(&dir.path().join("nope"));
        assert_eq!(profile, CandidateProfile::template());
    }

    #[test]
    fn test_base_resume_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(BASE_RESUME_FILE),
            r#"{"personal_info": {"full_name": "Grace"}, "skills": ["COBOL", "Rust"]}"#,
        )
        .unwrap();
        let profile = load_profile(dir.path());
        assert_eq!(profile.personal_info.full_name, "Grace");
        assert_eq!(profile.skills, vec!["COBOL", "Rust"]);
    }

    #[test]
    fn test_personal_info_overrides_base_block() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(BASE_RESUME_FILE),
            r#"{"personal_info": {"full_name": "Old"}, "skills": ["Go"]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(PERSONAL_INFO_FILE),
            r#"{"full_name": "New", "email": "new@example.com"}"#,
        )
        .unwrap();
        let profile = read_profile(dir.path()).unwrap();
        assert_eq!(profile.personal_info.full_name, "New");
        assert_eq!(profile.personal_info.email, "new@example.com");
        assert_eq!(profile.skills, vec!["Go"]);
    }

    #[test]
    fn test_malformed_override_keeps_base_block() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(BASE_RESUME_FILE),
            r#"{"personal_info": {"full_name": "Base"}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join(PERSONAL_INFO_FILE), "{not json").unwrap();
        assert_eq!(read_profile(dir.path()).unwrap().personal_info.full_name, "Base");
    }

    #[test]
    fn test_malformed_base_resume_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(BASE_RESUME_FILE), "[1, 2").unwrap();
        assert!(matches!(
            read_profile(dir.path()),
            Err(ProfileError::Json { .. })
        ));
        assert_eq!(load_profile(dir.path()), CandidateProfile::template());
    }
}
