use serde::{Deserialize, Serialize};

/// One prior role as it appears on a source document. Every field is optional
/// because neither source guarantees a complete entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub position: Option<String>,
    pub duration: Option<String>,
    pub details: Option<String>,
}

/// A normalized resume, built once per fetched document and never mutated afterwards.
///
/// `filling_percentage` is always within 0–100; use [`ResumeRecord::new`] or
/// [`clamp_percentage`] to construct it from raw values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub source_url: String,
    pub salary_expectation: Option<String>,
    pub experience: Vec<ExperienceEntry>,
    pub filling_percentage: u8,
}

impl ResumeRecord {
    pub fn new(
        source_url: impl Into<String>,
        salary_expectation: Option<String>,
        experience: Vec<ExperienceEntry>,
        filling_percentage: i64,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            salary_expectation,
            experience,
            filling_percentage: clamp_percentage(filling_percentage),
        }
    }
}

/// Clamps a raw percentage (possibly negative or above 100 in source data) into 0–100.
pub fn clamp_percentage(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

/// Collapses non-breaking spaces and trims. Blank input maps to `None`.
pub fn normalize_text(raw: &str) -> Option<String> {
    let text = raw.replace('\u{a0}', " ");
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_is_clamped() {
        assert_eq!(clamp_percentage(-4), 0);
        assert_eq!(clamp_percentage(57), 57);
        assert_eq!(clamp_percentage(250), 100);
    }

    #[test]
    fn test_new_clamps_percentage() {
        let record = ResumeRecord::new("https://example.com/1", None, vec![], 140);
        assert_eq!(record.filling_percentage, 100);
        assert!(record.experience.is_empty());
    }

    #[test]
    fn test_normalize_text_replaces_nbsp_and_trims() {
        assert_eq!(
            normalize_text("  25\u{a0}000 UAH "),
            Some("25 000 UAH".to_string())
        );
    }

    #[test]
    fn test_normalize_text_blank_is_none() {
        assert_eq!(normalize_text(" \u{a0} "), None);
        assert_eq!(normalize_text(""), None);
    }
}
