//! Résumé section labels and keyword-based section inference.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse semantic category assigned to a chunk, usable as a retrieval
/// filter. The enumeration is closed; anything unrecognized maps to
/// [`Section::Other`] at inference time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Education,
    Experience,
    Projects,
    Skills,
    Summary,
    Other,
}

impl Section {
    /// All variants in scoring order. Earlier variants win keyword ties.
    pub const ALL: [Section; 6] = [
        Section::Education,
        Section::Experience,
        Section::Projects,
        Section::Skills,
        Section::Summary,
        Section::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Education => "education",
            Section::Experience => "experience",
            Section::Projects => "projects",
            Section::Skills => "skills",
            Section::Summary => "summary",
            Section::Other => "other",
        }
    }

    /// Keywords that mark a chunk as belonging to this section.
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Section::Education => &["education", "university", "degree", "bachelor", "master", "gpa"],
            Section::Experience => &["experience", "employment", "worked", "engineer at", "developer at", "intern"],
            Section::Projects => &["project", "built", "developed", "implemented", "created"],
            Section::Skills => &["skills", "proficient", "languages", "technologies", "tools"],
            Section::Summary => &["summary", "objective", "profile", "about me"],
            Section::Other => &[],
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized section label.
#[derive(Debug, Error)]
#[error("unknown section '{0}'")]
pub struct ParseSectionError(pub String);

impl FromStr for Section {
    type Err = ParseSectionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "education" => Ok(Section::Education),
            "experience" => Ok(Section::Experience),
            "projects" => Ok(Section::Projects),
            "skills" => Ok(Section::Skills),
            "summary" => Ok(Section::Summary),
            "other" => Ok(Section::Other),
            other => Err(ParseSectionError(other.to_string())),
        }
    }
}

/// Infers the most likely section for a chunk of résumé text.
///
/// Counts occurrences of each section's keyword set in the lowercased text;
/// the highest count wins. Zero hits everywhere yields [`Section::Other`].
/// Ties between nonzero counts resolve in [`Section::ALL`] order, so the
/// result is deterministic for identical input.
pub fn infer_section(text: &str) -> Section {
    let haystack = text.to_lowercase();
    let mut best = Section::Other;
    let mut best_count = 0usize;

    for section in Section::ALL {
        let count: usize = section
            .keywords()
            .iter()
            .map(|keyword| haystack.matches(keyword).count())
            .sum();
        if count > best_count {
            best = section;
            best_count = count;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_round_trip() {
        for section in Section::ALL {
            let parsed: Section = section.as_str().parse().unwrap();
            assert_eq!(parsed, section);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Experience".parse::<Section>().unwrap(), Section::Experience);
        assert_eq!("  SKILLS ".parse::<Section>().unwrap(), Section::Skills);
    }

    #[test]
    fn parse_rejects_unknown_labels() {
        let err = "hobbies".parse::<Section>().unwrap_err();
        assert!(err.to_string().contains("hobbies"));
    }

    #[test]
    fn infers_experience_from_employment_language() {
        let section = infer_section(
            "Professional experience: software engineer at Acme Corp, \
             five years of backend employment history",
        );
        assert_eq!(section, Section::Experience);
    }

    #[test]
    fn infers_education_from_degree_language() {
        let section = infer_section("Education: Bachelor of Science, State University, GPA 3.8");
        assert_eq!(section, Section::Education);
    }

    #[test]
    fn falls_back_to_other_without_keywords() {
        assert_eq!(infer_section("lorem ipsum dolor sit amet"), Section::Other);
        assert_eq!(infer_section(""), Section::Other);
    }

    #[test]
    fn serde_uses_lowercase_labels() {
        let json = serde_json::to_string(&Section::Projects).unwrap();
        assert_eq!(json, "\"projects\"");
        let back: Section = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Section::Projects);
    }
}
