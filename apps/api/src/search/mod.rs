//! Search pipeline: fans a query out to every source and ranks what comes back.
//!
//! A failing source never aborts the search: its error is logged, reported in
//! `SearchOutcome::failures`, and the remaining sources are ranked as usual.

pub mod handlers;

use std::sync::Arc;

use anyhow::Context;
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::models::{ResumeRecord, SearchQuery};
use crate::ranking::rank_with_total;
use crate::sources::{ResumeSource, SourceError};

/// One source that failed during a search.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub code: &'static str,
    pub error: String,
}

impl SourceFailure {
    fn new(source: &str, err: &SourceError) -> Self {
        Self {
            source: source.to_string(),
            code: err.code(),
            error: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub total_found: usize,
    pub resumes: Vec<ResumeRecord>,
    pub failures: Vec<SourceFailure>,
}

impl SearchOutcome {
    /// True when at least one source was queried and none of them succeeded.
    pub fn all_failed(&self, source_count: usize) -> bool {
        source_count > 0 && self.failures.len() == source_count
    }
}

/// Queries all sources concurrently and keeps the `top_n` most complete records.
pub async fn run_search(
    sources: &[Arc<dyn ResumeSource>],
    query: &SearchQuery,
    top_n: usize,
) -> SearchOutcome {
    let results = join_all(sources.iter().map(|source| source.search(query))).await;

    let mut batches = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (source, result) in sources.iter().zip(results) {
        match result {
            Ok(records) => {
                info!("{} returned {} resumes", source.name(), records.len());
                batches.push(records);
            }
            Err(e) => {
                warn!("Source {} failed: {e}", source.name());
                failures.push(SourceFailure::new(source.name(), &e));
            }
        }
    }

    let ranked = rank_with_total(&batches, top_n);
    info!(
        "Search for '{}' found {} resumes, returning {}",
        query.keywords.trim(),
        ranked.total_found,
        ranked.resumes.len()
    );

    SearchOutcome {
        total_found: ranked.total_found,
        resumes: ranked.resumes,
        failures,
    }
}

/// [`run_search`] on its own task. A panicking source fails only this search.
pub async fn spawn_search(
    sources: Vec<Arc<dyn ResumeSource>>,
    query: SearchQuery,
    top_n: usize,
) -> anyhow::Result<SearchOutcome> {
    tokio::spawn(async move { run_search(&sources, &query, top_n).await })
        .await
        .context("search task failed")
}
