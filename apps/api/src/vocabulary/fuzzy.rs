//! Token-sort fuzzy matching against a controlled vocabulary.
//!
//! Similarity is the normalized Indel ratio (insertions and deletions only) computed
//! after lowercasing, sorting whitespace tokens and rejoining them, so
//! "Oblast Kyiv" and "kyiv oblast" compare as identical.

/// Default similarity threshold (0–100). Matches must score strictly above it.
pub const DEFAULT_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    threshold: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl FuzzyMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns the vocabulary entry most similar to `term`, or `None` when the term is
    /// blank, the vocabulary is empty, or the best score does not exceed the threshold.
    ///
    /// On ties the first entry in iteration order wins.
    pub fn best_match<'a, I>(&self, term: &str, vocabulary: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let term = term.trim();
        if term.is_empty() {
            return None;
        }
        let sorted_term = sort_tokens(term);

        let mut best: Option<(&'a str, f64)> = None;
        for candidate in vocabulary {
            let score = indel_ratio(&sorted_term, &sort_tokens(candidate));
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((candidate, score)),
            }
        }

        best.filter(|(_, score)| *score > self.threshold)
            .map(|(candidate, _)| candidate)
    }
}

/// Token-sort ratio between two strings, 0–100.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    indel_ratio(&sort_tokens(a), &sort_tokens(b))
}

fn sort_tokens(s: &str) -> String {
    let lowered = s.to_lowercase();
    let mut tokens: Vec<&str> = lowered.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// `100 * 2 * LCS(a, b) / (|a| + |b|)`, counted in chars.
fn indel_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    100.0 * (2 * lcs_len(&a, &b)) as f64 / total as f64
}

/// Longest common subsequence length, two-row dynamic programming.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
