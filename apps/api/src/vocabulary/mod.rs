// Controlled vocabularies (regions, experience brackets, salary brackets) and the
// fuzzy matcher that maps free-text user input onto them.

pub mod fuzzy;
pub mod loader;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use fuzzy::FuzzyMatcher;
pub use loader::{load_salary_brackets, RemoteVocabulary, VocabularyError, VocabularyStore};

/// Canonical display label → opaque source identifier.
///
/// Loaded once per source and category, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VocabularyIndex {
    entries: BTreeMap<String, String>,
}

impl VocabularyIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Exact label lookup.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.get(label).map(String::as_str)
    }

    /// Resolves a free-text term to an identifier via the fuzzy matcher.
    pub fn resolve(&self, matcher: &FuzzyMatcher, term: &str) -> Option<&str> {
        let label = matcher.best_match(term, self.labels())?;
        self.get(label)
    }

    /// Exact lookup first, fuzzy resolution as a fallback.
    pub fn lookup(&self, matcher: &FuzzyMatcher, term: &str) -> Option<&str> {
        self.get(term).or_else(|| self.resolve(matcher, term))
    }
}

impl<K, V> FromIterator<(K, V)> for VocabularyIndex
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
