//! DocumentComposer: renders a job and a tailored profile into a cover
//! letter and a résumé.
//!
//! Documents are built as block sequences; the markup form is always
//! `codec::decode` of those blocks, so both encodings carry the same
//! content. Profile and job text is flattened to single lines and its
//! markup-significant sequences are neutralized before it enters a block,
//! which keeps `codec::encode(markup) == blocks` for every composed document.
//!
//! A literal `*` in profile or job text is written as `∗` (U+2217), since
//! a plain asterisk next to a bold run would shift the run's markers. Link
//! brackets followed by `(` gain a space, and leading block prefixes on
//! paragraph lines are dropped.

use chrono::NaiveDate;
use serde::Serialize;

use crate::documents::blocks::{DocumentBlock, HeadingLevel, Span};
use crate::documents::codec;
use crate::jobs::models::JobRecord;
use crate::profile::models::{CandidateProfile, TailoredProfile};

pub const MAX_FIT_SKILLS: usize = 8;
pub const FALLBACK_FIT_SKILLS: usize = 5;
const SKILL_SEPARATOR: &str = " • ";
const FIELD_SEPARATOR: &str = " | ";
const DATE_FORMAT: &str = "%B %d, %Y";
const INERT_ASTERISK: &str = "\u{2217}";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedDocument {
    pub title: String,
    pub blocks: Vec<DocumentBlock>,
}

impl ComposedDocument {
    pub fn markup(&self) -> String {
        codec::decode(&self.blocks)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationDocuments {
    pub cover_letter: ComposedDocument,
    pub resume: ComposedDocument,
}

pub fn compose(job: &JobRecord, tailored: &TailoredProfile, date: NaiveDate) -> ApplicationDocuments {
    ApplicationDocuments {
        cover_letter: compose_cover_letter(job, tailored, date),
        resume: compose_resume(job, tailored, date),
    }
}

// ──────────────────────────────────────────────
// Cover letter
// ──────────────────────────────────────────────

pub fn compose_cover_letter(
    job: &JobRecord,
    tailored: &TailoredProfile,
    date: NaiveDate,
) -> ComposedDocument {
    let title = clean(job.title());
    let company = clean(job.company_name());
    let profile = &tailored.profile;
    let full_name = or_default(clean(&profile.personal_info.full_name), "Your Name");

    let mut doc = Builder::default();
    doc.heading(HeadingLevel::H1, "Cover Letter");
    doc.paragraph(vec![
        vec![Span::bold("Date:"), Span::plain(format!(" {}", date.format(DATE_FORMAT)))],
        vec![Span::bold("Position:"), Span::plain(format!(" {title}"))],
        vec![Span::bold("Company:"), Span::plain(format!(" {company}"))],
    ]);
    doc.divider();

    // greeting
    doc.line("Dear Hiring Manager,");

    // interest statement
    doc.paragraph(vec![vec![
        Span::plain("I am writing to express my strong interest in the "),
        Span::bold(title.clone()),
        Span::plain(" position at "),
        Span::bold(company.clone()),
        Span::plain(format!(
            ". {} aligns perfectly with the requirements outlined in your job posting.",
            relevant_experience(profile)
        )),
    ]]);

    // fit section
    doc.heading(HeadingLevel::H2, "Why I'm a Great Fit");
    doc.line("In my previous roles, I have developed expertise in:");
    let skills = fit_skills(tailored);
    if skills.is_empty() {
        doc.bullet(vec![
            Span::bold("Professional experience"),
            Span::plain(" in relevant technologies"),
        ]);
    } else {
        for skill in skills {
            doc.bullet(vec![Span::bold(skill)]);
        }
    }
    doc.line(
        "These skills directly translate to the requirements for this position and would \
         allow me to contribute immediately to your team.",
    );

    // company connection
    doc.heading(HeadingLevel::H2, &format!("About {company}"));
    doc.line(&format!(
        "I am particularly drawn to {company}'s innovative approach and would be excited to \
         contribute to your team's success."
    ));

    // closing
    doc.heading(HeadingLevel::H2, "Next Steps");
    doc.line(&format!(
        "I would welcome the opportunity to discuss how my background and enthusiasm can \
         contribute to {company}'s continued success. I'm excited about the possibility of \
         joining your team and am available for an interview at your convenience."
    ));
    doc.line("Thank you for your consideration.");
    doc.paragraph(vec![vec![Span::bold("Sincerely,")], vec![Span::plain(full_name)]]);

    doc.divider();
    doc.line("Generated automatically by JobBuilder");

    ComposedDocument {
        title: format!("Cover Letter - {title} at {company}"),
        blocks: doc.finish(),
    }
}

fn relevant_experience(profile: &CandidateProfile) -> String {
    match profile.experience.first() {
        Some(recent) => format!(
            "My experience as {} at {}",
            or_default(clean(&recent.title), "a professional"),
            or_default(clean(&recent.company), "my previous role"),
        ),
        None => "My diverse professional experience".to_string(),
    }
}

/// Up to eight matched skills, else the first five profile skills.
fn fit_skills(tailored: &TailoredProfile) -> Vec<String> {
    let source: Vec<&String> = if tailored.matched_skills.is_empty() {
        tailored.profile.skills.iter().take(FALLBACK_FIT_SKILLS).collect()
    } else {
        tailored.matched_skills.iter().take(MAX_FIT_SKILLS).collect()
    };
    source
        .into_iter()
        .map(|skill| clean(skill))
        .filter(|skill| !skill.is_empty())
        .collect()
}

// ──────────────────────────────────────────────
// Résumé
// ──────────────────────────────────────────────

pub fn compose_resume(job: &JobRecord, tailored: &TailoredProfile, date: NaiveDate) -> ComposedDocument {
    let profile = &tailored.profile;
    let info = &profile.personal_info;
    let name = or_default(clean(&info.full_name), "Your Name");

    let mut doc = Builder::default();
    doc.heading(HeadingLevel::H1, &name);

    let contact: Vec<String> = [Some(&info.email), Some(&info.phone), info.address.as_ref()]
        .into_iter()
        .flatten()
        .map(|field| clean(field))
        .filter(|field| !field.is_empty())
        .collect();
    doc.line(&contact.join(FIELD_SEPARATOR));

    let mut links = Vec::new();
    for (label, url) in [
        ("LinkedIn", &info.linkedin_url),
        ("GitHub", &info.github_url),
        ("Portfolio", &info.portfolio_url),
    ] {
        if let Some(link) = url.as_deref().and_then(|url| link_span(label, url)) {
            if !links.is_empty() {
                links.push(Span::plain(FIELD_SEPARATOR));
            }
            links.push(link);
        }
    }
    doc.paragraph(vec![links]);
    doc.divider();

    let summary = clean(&info.professional_summary);
    if !summary.is_empty() {
        doc.heading(HeadingLevel::H2, "Professional Summary");
        doc.line(&summary);
    }

    let skills: Vec<String> = profile
        .skills
        .iter()
        .map(|skill| clean(skill))
        .filter(|skill| !skill.is_empty())
        .collect();
    if !skills.is_empty() {
        doc.heading(HeadingLevel::H2, "Technical Skills");
        doc.line(&skills.join(SKILL_SEPARATOR));
    }

    if !profile.experience.is_empty() {
        doc.heading(HeadingLevel::H2, "Professional Experience");
        for entry in &profile.experience {
            doc.heading(
                HeadingLevel::H3,
                &format!(
                    "{}{FIELD_SEPARATOR}{}",
                    or_default(clean(&entry.title), "Job Title"),
                    or_default(clean(&entry.company), "Company Name"),
                ),
            );
            let location = clean(&entry.location);
            let start = clean(&entry.start_date);
            let end = clean(&entry.end_date);
            if !(location.is_empty() && start.is_empty() && end.is_empty()) {
                doc.line(&format!("{location}{FIELD_SEPARATOR}{start} - {end}"));
            }
            doc.line(&clean(&entry.description));

            let achievements: Vec<String> = entry
                .achievements
                .iter()
                .map(|a| clean(a))
                .filter(|a| !a.is_empty())
                .collect();
            if !achievements.is_empty() {
                doc.paragraph(vec![vec![Span::bold("Key Achievements:")]]);
                for achievement in achievements {
                    doc.bullet(vec![Span::plain(achievement)]);
                }
            }
        }
    }

    if !profile.education.is_empty() {
        doc.heading(HeadingLevel::H2, "Education");
        for entry in &profile.education {
            doc.heading(HeadingLevel::H3, &or_default(clean(&entry.degree), "Degree"));
            let mut details = Vec::new();
            let location = clean(&entry.location);
            if !location.is_empty() {
                details.push(location);
            }
            let graduated = clean(&entry.graduation_date);
            if !graduated.is_empty() {
                details.push(format!("Graduated: {graduated}"));
            }
            let gpa = clean(&entry.gpa);
            if !gpa.is_empty() {
                details.push(format!("GPA: {gpa}"));
            }
            doc.paragraph(vec![
                vec![Span::bold(or_default(clean(&entry.school), "School Name"))],
                vec![Span::plain(details.join(FIELD_SEPARATOR))],
            ]);
        }
    }

    if !profile.projects.is_empty() {
        doc.heading(HeadingLevel::H2, "Projects");
        for project in &profile.projects {
            doc.heading(HeadingLevel::H3, &or_default(clean(&project.name), "Project Name"));
            doc.line(&clean(&project.description));

            let technologies: Vec<String> = project
                .technologies
                .iter()
                .map(|t| clean(t))
                .filter(|t| !t.is_empty())
                .collect();
            let mut lines = Vec::new();
            if !technologies.is_empty() {
                lines.push(vec![
                    Span::bold("Technologies:"),
                    Span::plain(format!(" {}", technologies.join(", "))),
                ]);
            }
            if let Some(link) = project
                .url
                .as_deref()
                .and_then(|url| link_span(&clean_link_text(url), url))
            {
                lines.push(vec![Span::bold("Link:"), Span::plain(" "), link]);
            }
            doc.paragraph(lines);
        }
    }

    if !profile.certifications.is_empty() {
        doc.heading(HeadingLevel::H2, "Certifications");
        for cert in &profile.certifications {
            let mut spans = vec![Span::bold(or_default(clean(&cert.name), "Certification"))];
            if let Some(issuer) = cert.issuer.as_deref().map(clean).filter(|i| !i.is_empty()) {
                spans.push(Span::plain(format!(" - {issuer}")));
            }
            if let Some(date) = cert.date.as_deref().map(clean).filter(|d| !d.is_empty()) {
                spans.push(Span::plain(format!(" ({date})")));
            }
            doc.bullet(spans);
        }
    }

    doc.divider();
    doc.paragraph(vec![
        vec![Span::plain(format!(
            "Resume customized for {} at {}",
            clean(job.title()),
            clean(job.company_name())
        ))],
        vec![Span::plain(format!("Generated on {}", date.format(DATE_FORMAT)))],
    ]);

    ComposedDocument {
        title: format!("Resume - {name} ({})", clean(job.title())),
        blocks: doc.finish(),
    }
}

// ──────────────────────────────────────────────
// Block assembly
// ──────────────────────────────────────────────

#[derive(Default)]
struct Builder {
    blocks: Vec<DocumentBlock>,
}

impl Builder {
    fn heading(&mut self, level: HeadingLevel, text: &str) {
        self.blocks
            .push(DocumentBlock::heading(level, vec![Span::plain(text)]));
    }

    fn divider(&mut self) {
        self.blocks.push(DocumentBlock::Divider);
    }

    fn bullet(&mut self, spans: Vec<Span>) {
        self.blocks.push(DocumentBlock::bullet(spans));
    }

    /// Single-line paragraph; skipped when empty.
    fn line(&mut self, text: &str) {
        self.paragraph(vec![vec![Span::plain(text)]]);
    }

    /// Paragraph from lines of spans. Empty lines are dropped and the whole
    /// paragraph is skipped when nothing remains.
    fn paragraph(&mut self, lines: Vec<Vec<Span>>) {
        let mut spans = Vec::new();
        for mut line in lines {
            if let Some(Span::Plain { text }) = line.first_mut() {
                *text = neutralize_line_start(text);
            }
            if line.iter().all(|span| span.text().is_empty()) {
                continue;
            }
            if !spans.is_empty() {
                spans.push(Span::plain("\n"));
            }
            spans.extend(line);
        }
        if !spans.is_empty() {
            self.blocks.push(DocumentBlock::paragraph(spans));
        }
    }

    fn finish(self) -> Vec<DocumentBlock> {
        self.blocks
    }
}

/// Single-line text with bold markers and link syntax neutralized.
fn clean(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('*', INERT_ASTERISK)
        .replace("](", "] (")
}

fn clean_link_text(text: &str) -> String {
    clean(text).replace(['[', ']'], "")
}

/// A link span, or `None` when the URL could not survive markup.
fn link_span(label: &str, url: &str) -> Option<Span> {
    let url = url.trim();
    let unusable = url.is_empty()
        || url.contains(char::is_whitespace)
        || url.contains(')')
        || url.contains('*');
    if unusable {
        return None;
    }
    Some(Span::link(clean_link_text(label), url))
}

/// Strips leading text that would read as a block prefix at line start.
fn neutralize_line_start(text: &str) -> String {
    let mut rest = text;
    while let Some(stripped) = ["- ", "# ", "## ", "### "]
        .iter()
        .find_map(|prefix| rest.strip_prefix(prefix))
    {
        rest = stripped.trim_start();
    }
    if rest.trim() == "---" {
        return String::new();
    }
    rest.to_string()
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::blocks::plain_text;
    use crate::profile::customizer::customize;
    use crate::profile::models::{Certification, Education, Experience, Project};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    fn job() -> JobRecord {
        JobRecord::new(
            "Platform Engineer",
            "Acme Corp",
            "We want Rust, Kubernetes and a bit of python.",
            "page-1",
        )
    }

    fn full_profile() -> CandidateProfile {
        let mut profile = CandidateProfile::template();
        profile.personal_info.full_name = "Jane Doe".to_string();
        profile.personal_info.portfolio_url = Some("https://jane.dev".to_string());
        profile.skills = vec!["Rust".into(), "Go".into(), "Python".into(), "Kubernetes".into()];
        profile.certifications = vec![Certification {
            name: "CKA".to_string(),
            issuer: Some("CNCF".to_string()),
            date: Some("2023".to_string()),
        }];
        profile
    }

    fn tailored(profile: &CandidateProfile) -> TailoredProfile {
        customize(profile, &job())
    }

    #[test]
    fn test_markup_reencodes_to_same_blocks() {
        let docs = compose(&job(), &tailored(&full_profile()), date());
        for doc in [&docs.cover_letter, &docs.resume] {
            let markup = doc.markup();
            assert_eq!(codec::encode(&markup), doc.blocks, "markup:\n{markup}");
            assert_eq!(plain_text(&codec::encode(&markup)), plain_text(&doc.blocks));
        }
    }

    #[test]
    fn test_hostile_profile_text_still_round_trips() {
        let mut profile = full_profile();
        profile.personal_info.professional_summary =
            "- **Bold** claim\nwith [a link](http://x.io) and\n---".to_string();
        profile.skills = vec!["C**".into(), "# Rust".into(), "  ".into()];
        profile.experience = vec![Experience {
            title: "Lead *Dev*".to_string(),
            description: "### not a heading".to_string(),
            achievements: vec!["- nested".to_string(), String::new()],
            ..Default::default()
        }];
        profile.education = vec![Education {
            school: String::new(),
            degree: "BSc".to_string(),
            ..Default::default()
        }];
        profile.projects = vec![Project {
            name: "Tool".to_string(),
            url: Some("https://example.com/a)b".to_string()),
            ..Default::default()
        }];
        profile.personal_info.linkedin_url = Some("not a url".to_string());

        let docs = compose(&job(), &tailored(&profile), date());
        for doc in [&docs.cover_letter, &docs.resume] {
            assert_eq!(codec::encode(&doc.markup()), doc.blocks);
        }
    }

    #[test]
    fn test_asterisks_in_profile_text_stay_visible() {
        let mut profile = full_profile();
        profile.skills = vec!["C*".into(), "Rust".into()];
        let posting = JobRecord::new("Dev", "Acme", "c* and rust", "p");
        let doc = compose_cover_letter(&posting, &customize(&profile, &posting), date());

        let bullets: Vec<String> = doc
            .blocks
            .iter()
            .filter(|b| matches!(b, DocumentBlock::BulletItem { .. }))
            .map(DocumentBlock::plain_text)
            .collect();
        assert_eq!(bullets, vec!["C\u{2217}", "Rust"]);
        assert!(doc.markup().contains("- **C\u{2217}**\n- **Rust**"));
        assert_eq!(codec::encode(&doc.markup()), doc.blocks);
    }

    #[test]
    fn test_cover_letter_lists_matched_skills() {
        let doc = compose_cover_letter(&job(), &tailored(&full_profile()), date());
        let bullets: Vec<String> = doc
            .blocks
            .iter()
            .filter(|b| matches!(b, DocumentBlock::BulletItem { .. }))
            .map(DocumentBlock::plain_text)
            .collect();
        assert_eq!(bullets, vec!["Rust", "Python", "Kubernetes"]);

        let markup = doc.markup();
        assert!(markup.contains("- **Rust**\n- **Python**\n- **Kubernetes**"));
        assert!(markup.contains("the **Platform Engineer** position at **Acme Corp**"));
        assert!(markup.contains("My experience as Your Job Title at Company Name"));
        assert!(markup.contains("**Date:** March 05, 2024"));
        assert!(markup.contains("## About Acme Corp"));
        assert!(markup.contains("**Sincerely,**\nJane Doe"));
    }

    #[test]
    fn test_cover_letter_falls_back_to_first_five_skills() {
        let mut profile = full_profile();
        profile.skills = (1..=7).map(|i| format!("Skill{i}")).collect();
        let doc = compose_cover_letter(&job(), &tailored(&profile), date());
        let bullets = doc
            .blocks
            .iter()
            .filter(|b| matches!(b, DocumentBlock::BulletItem { .. }))
            .count();
        assert_eq!(bullets, FALLBACK_FIT_SKILLS);
    }

    #[test]
    fn test_cover_letter_caps_matches_at_eight() {
        let mut profile = full_profile();
        profile.skills = (1..=10).map(|i| format!("tech{i:02}")).collect();
        let posting = JobRecord::new(
            "Dev",
            "Acme",
            (1..=10).map(|i| format!("tech{i:02}")).collect::<Vec<_>>().join(" "),
            "p",
        );
        let doc = compose_cover_letter(&posting, &customize(&profile, &posting), date());
        let bullets = doc
            .blocks
            .iter()
            .filter(|b| matches!(b, DocumentBlock::BulletItem { .. }))
            .count();
        assert_eq!(bullets, MAX_FIT_SKILLS);
    }

    #[test]
    fn test_cover_letter_without_any_skills() {
        let mut profile = CandidateProfile::default();
        profile.personal_info.full_name = "Sam".to_string();
        let doc = compose_cover_letter(&job(), &tailored(&profile), date());
        let markup = doc.markup();
        assert!(markup.contains("- **Professional experience** in relevant technologies"));
        assert!(markup.contains("My diverse professional experience"));
    }

    #[test]
    fn test_resume_sections_in_order() {
        let doc = compose_resume(&job(), &tailored(&full_profile()), date());
        let headings: Vec<String> = doc
            .blocks
            .iter()
            .filter(|b| matches!(b, DocumentBlock::Heading { level: HeadingLevel::H2, .. }))
            .map(DocumentBlock::plain_text)
            .collect();
        assert_eq!(
            headings,
            vec![
                "Professional Summary",
                "Technical Skills",
                "Professional Experience",
                "Education",
                "Projects",
                "Certifications",
            ]
        );

        let markup = doc.markup();
        assert!(markup.starts_with("# Jane Doe\n\n"));
        assert!(markup.contains("Rust • Python • Kubernetes • Go"));
        assert!(markup.contains(
            "[LinkedIn](https://linkedin.com/in/yourprofile) | [GitHub](https://github.com/yourusername) | [Portfolio](https://jane.dev)"
        ));
        assert!(markup.contains("### Your Job Title | Company Name\n\nCity, State | 2020-01 - Present"));
        assert!(markup.contains("**Key Achievements:**\n\n- Key achievement 1\n- Key achievement 2"));
        assert!(markup.contains("**University Name**\nCity, State | Graduated: 2020-05 | GPA: 3.8"));
        assert!(markup.contains("- **CKA** - CNCF (2023)"));
        assert!(markup.ends_with(
            "Resume customized for Platform Engineer at Acme Corp\nGenerated on March 05, 2024\n"
        ));
    }

    #[test]
    fn test_resume_omits_empty_sections() {
        let mut profile = CandidateProfile::default();
        profile.personal_info.full_name = "Min".to_string();
        let doc = compose_resume(&job(), &tailored(&profile), date());
        let headings = doc
            .blocks
            .iter()
            .filter(|b| matches!(b, DocumentBlock::Heading { level: HeadingLevel::H2, .. }))
            .map(DocumentBlock::plain_text)
            .collect::<Vec<_>>();
        // the tailored summary always carries the personalization clause
        assert_eq!(headings, vec!["Professional Summary"]);
    }

    #[test]
    fn test_resume_uses_tailored_summary() {
        let doc = compose_resume(&job(), &tailored(&full_profile()), date());
        assert!(doc
            .markup()
            .contains("Particularly interested in Platform Engineer roles with expertise in Rust, Python, Kubernetes."));
    }

    #[test]
    fn test_composition_is_deterministic() {
        let t = tailored(&full_profile());
        assert_eq!(compose(&job(), &t, date()), compose(&job(), &t, date()));
    }
}
