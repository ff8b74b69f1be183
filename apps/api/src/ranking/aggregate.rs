use std::cmp::Reverse;

use serde::Serialize;

use crate::models::ResumeRecord;

/// Ranked output of one search: how many records were merged and the retained top slice.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResults {
    pub total_found: usize,
    pub resumes: Vec<ResumeRecord>,
}

/// Merges per-source record lists and keeps the `top_n` most complete records.
///
/// Sources are concatenated in the given order, then stable-sorted by
/// `filling_percentage` descending, so equal scores keep their concatenation order.
pub fn rank(sources: &[Vec<ResumeRecord>], top_n: usize) -> Vec<ResumeRecord> {
    let mut merged: Vec<&ResumeRecord> = sources.iter().flatten().collect();

    // sort_by_key is stable
    merged.sort_by_key(|record| Reverse(record.filling_percentage));

    merged.into_iter().take(top_n).cloned().collect()
}

/// [`rank`] plus the merged count before truncation.
pub fn rank_with_total(sources: &[Vec<ResumeRecord>], top_n: usize) -> RankedResults {
    RankedResults {
        total_found: sources.iter().map(Vec::len).sum(),
        resumes: rank(sources, top_n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn record(url: &str, pct: i64) -> ResumeRecord {
        ResumeRecord::new(url, None, vec![], pct)
    }

    #[test]
    fn test_equal_scores_keep_relative_order() {
        let first = vec![record("a/40", 40), record("a/90", 90)];
        let second = vec![record("b/90", 90), record("b/10", 10)];

        let ranked = rank(&[first, second], 3);
        let urls: Vec<&str> = ranked.iter().map(|r| r.source_url.as_str()).collect();
        assert_eq!(urls, vec!["a/90", "b/90", "a/40"]);
    }

    #[test]
    fn test_truncates_to_top_n_sorted_without_duplicates() {
        let first: Vec<_> = (0..7).map(|i| record(&format!("a/{i}"), i * 13)).collect();
        let second: Vec<_> = (0..5).map(|i| record(&format!("b/{i}"), 100 - i * 9)).collect();
        let input: HashSet<String> = first
            .iter()
            .chain(second.iter())
            .map(|r| r.source_url.clone())
            .collect();

        let ranked = rank(&[first, second], 5);
        assert_eq!(ranked.len(), 5);
        assert!(ranked
            .windows(2)
            .all(|w| w[0].filling_percentage >= w[1].filling_percentage));

        let urls: HashSet<String> = ranked.iter().map(|r| r.source_url.clone()).collect();
        assert_eq!(urls.len(), 5);
        assert!(urls.is_subset(&input));
    }

    #[test]
    fn test_fewer_records_than_top_n() {
        let ranked = rank(&[vec![record("a", 10)], vec![]], 5);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_zero_top_n_is_empty() {
        assert!(rank(&[vec![record("a", 10)]], 0).is_empty());
    }

    #[test]
    fn test_inputs_are_untouched() {
        let sources = vec![vec![record("a", 10), record("b", 90)]];
        let _ = rank(&sources, 1);
        assert_eq!(sources[0][0].source_url, "a");
        assert_eq!(sources[0][1].source_url, "b");
    }

    #[test]
    fn test_total_found_counts_all_merged_records() {
        let result = rank_with_total(&[vec![record("a", 1), record("b", 2)], vec![record("c", 3)]], 2);
        assert_eq!(result.total_found, 3);
        assert_eq!(result.resumes.len(), 2);
        assert_eq!(result.resumes[0].source_url, "c");
    }
}
