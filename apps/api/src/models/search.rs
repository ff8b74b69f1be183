use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Canonical search parameters shared by every source.
///
/// `region` and `experience_tags` are free text; each source resolves them against
/// its own vocabularies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub keywords: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub salary_from: Option<u32>,
    #[serde(default)]
    pub salary_to: Option<u32>,
    #[serde(default)]
    pub experience_tags: BTreeSet<String>,
}

impl SearchQuery {
    pub fn new(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            ..Self::default()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_salary_range(mut self, from: Option<u32>, to: Option<u32>) -> Self {
        self.salary_from = from;
        self.salary_to = to;
        self
    }

    pub fn with_experience<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.experience_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Region with surrounding whitespace removed; blank regions count as absent.
    pub fn region(&self) -> Option<&str> {
        self.region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    /// Rejects queries without keywords.
    pub fn validate(&self) -> Result<(), String> {
        if self.keywords.trim().is_empty() {
            return Err("keywords must not be empty".to_string());
        }
        Ok(())
    }
}
