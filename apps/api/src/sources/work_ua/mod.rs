//! work.ua adapter: scrapes HTML listing pages and resume detail pages.
//!
//! Flow: fetch page 1 and read the candidate count, fetch the remaining pages
//! (even pages first, then odd, which the site throttles less), collect one link per
//! resume card, then fetch and parse every detail page. Listing failures abort the
//! search; detail failures only drop that resume.

pub mod parse;

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use reqwest::{Client, Url};
use tracing::{info, warn};

use crate::config::WorkUaConfig;
use crate::models::{ResumeRecord, SearchQuery};
use crate::ranking::completeness::StopWords;
use crate::sources::http::{fetch_html, ScraperGateway};
use crate::sources::{ResumeSource, SourceError};
use crate::vocabulary::{FuzzyMatcher, VocabularyIndex};

use self::parse::{extract_resume_links, parse_resume_page, parse_total_candidates};

pub const SOURCE_NAME: &str = "work.ua";

#[derive(Debug, Clone, Default)]
pub struct WorkUaVocabularies {
    pub regions: VocabularyIndex,
    pub experience: VocabularyIndex,
    pub salary_from: VocabularyIndex,
    pub salary_to: VocabularyIndex,
}

pub struct WorkUaSource {
    client: Client,
    config: WorkUaConfig,
    gateway: Option<ScraperGateway>,
    headers: HeaderMap,
    matcher: FuzzyMatcher,
    vocabularies: WorkUaVocabularies,
}

impl WorkUaSource {
    pub fn new(
        config: WorkUaConfig,
        client: Client,
        gateway: Option<ScraperGateway>,
        matcher: FuzzyMatcher,
        vocabularies: WorkUaVocabularies,
    ) -> Self {
        let headers = build_headers(&config);
        Self {
            client,
            config,
            gateway,
            headers,
            matcher,
            vocabularies,
        }
    }

    /// Native query parameters, without `page`. Unresolved filters are left out.
    fn filter_params(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        let vocab = &self.vocabularies;
        let mut params = vec![("search", query.keywords.trim().to_string())];

        if let Some(region) = query
            .region()
            .and_then(|region| vocab.regions.resolve(&self.matcher, region))
        {
            params.push(("region", region.to_string()));
        }
        // Salary brackets are keyed by the exact amount.
        if let Some(code) = query
            .salary_from
            .and_then(|from| vocab.salary_from.get(&from.to_string()))
        {
            params.push(("salaryfrom", code.to_string()));
        }
        if let Some(code) = query
            .salary_to
            .and_then(|to| vocab.salary_to.get(&to.to_string()))
        {
            params.push(("salaryto", code.to_string()));
        }

        let mut seen = HashSet::new();
        let experience: Vec<&str> = query
            .experience_tags
            .iter()
            .filter_map(|tag| vocab.experience.lookup(&self.matcher, tag))
            .filter(|id| seen.insert(*id))
            .collect();
        if !experience.is_empty() {
            params.push(("experience", experience.join("+")));
        }

        params
    }

    fn listing_url(&self, params: &[(&'static str, String)], page: u32) -> Result<String, SourceError> {
        let base = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.resumes_path
        );
        let page = page.to_string();
        let pairs = params
            .iter()
            .map(|(key, value)| (*key, value.as_str()))
            .chain(std::iter::once(("page", page.as_str())));

        Url::parse_with_params(&base, pairs)
            .map(String::from)
            .map_err(|e| SourceError::unavailable(SOURCE_NAME, format!("invalid listing url '{base}': {e}")))
    }

    fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}{}", self.config.base_url.trim_end_matches('/'), href)
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, SourceError> {
        fetch_html(&self.client, self.gateway.as_ref(), url, &self.headers, SOURCE_NAME).await
    }

    /// Every listing page's HTML, in page-number order.
    async fn fetch_listing_pages(&self, query: &SearchQuery) -> Result<Vec<String>, SourceError> {
        let params = self.filter_params(query);

        let first = self.fetch(&self.listing_url(&params, 1)?).await?;
        let total = parse_total_candidates(&first).ok_or_else(|| {
            SourceError::parse(SOURCE_NAME, "candidate count not found on first results page")
        })?;
        let total_pages = u32::try_from(total.div_ceil(u64::from(self.config.page_size.max(1))))
            .map_err(|_| SourceError::parse(SOURCE_NAME, format!("implausible candidate count {total}")))?;
        info!(
            "Total candidates: {}, total pages: {} on {}",
            total, total_pages, SOURCE_NAME
        );

        let mut pages = BTreeMap::new();
        pages.insert(1, first);

        let params = &params;
        let rest: Vec<(u32, String)> = stream::iter(page_order(total_pages))
            .map(|page| async move {
                let html = self.fetch(&self.listing_url(params, page)?).await?;
                info!("Page {page} fetched successfully");
                Ok::<_, SourceError>((page, html))
            })
            .buffered(self.config.max_concurrency.max(1))
            .try_collect()
            .await?;
        pages.extend(rest);

        Ok(pages.into_values().collect())
    }

    /// Fetches and parses detail pages. Failed pages are logged and dropped.
    async fn fetch_resumes(&self, links: Vec<String>) -> Vec<ResumeRecord> {
        let stop_words = StopWords::for_language(self.config.language);
        let requested = links.len();

        let results: Vec<Result<ResumeRecord, SourceError>> = stream::iter(links)
            .map(|href| async move {
                let url = self.absolute_url(&href);
                let html = self.fetch(&url).await?;
                parse_resume_page(&html, url, stop_words)
                    .map_err(|e| SourceError::parse(SOURCE_NAME, e))
            })
            .buffered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let mut resumes = Vec::with_capacity(results.len());
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(record) => resumes.push(record),
                Err(e) => warn!("Resume {} dropped: {e}", i + 1),
            }
        }
        info!(
            "Parsed {} of {} resumes from {} ({} dropped)",
            resumes.len(),
            requested,
            SOURCE_NAME,
            requested - resumes.len()
        );

        resumes
    }
}

#[async_trait]
impl ResumeSource for WorkUaSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<ResumeRecord>, SourceError> {
        let pages = self.fetch_listing_pages(query).await?;
        info!("Fetched {} pages from {}", pages.len(), SOURCE_NAME);

        let mut seen = HashSet::new();
        let links: Vec<String> = pages
            .iter()
            .flat_map(|html| extract_resume_links(html))
            .filter(|href| seen.insert(href.clone()))
            .collect();
        info!("Fetched {} resume links from {}", links.len(), SOURCE_NAME);

        Ok(self.fetch_resumes(links).await)
    }
}

/// Pages 2..=total, even pages first, then odd.
fn page_order(total_pages: u32) -> Vec<u32> {
    (2..=total_pages)
        .step_by(2)
        .chain((3..=total_pages).step_by(2))
        .collect()
}

fn build_headers(config: &WorkUaConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let values = [(USER_AGENT, Some(&config.user_agent)), (REFERER, config.referer.as_ref())];

    for (name, value) in values {
        let Some(value) = value else { continue };
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(e) => warn!("Ignoring invalid {name} header for {SOURCE_NAME}: {e}"),
        }
    }

    headers
}
