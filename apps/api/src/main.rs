mod config;
mod dialogue;
mod errors;
mod models;
mod ranking;
mod routes;
mod search;
mod sources;
mod state;
mod vocabulary;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::dialogue::DialogueOptions;
use crate::routes::build_router;
use crate::sources::http::{build_client, ScraperGateway};
use crate::sources::robota::RobotaVocabularies;
use crate::sources::work_ua::WorkUaVocabularies;
use crate::sources::{ResumeSource, RobotaSource, WorkUaSource};
use crate::state::AppState;
use crate::vocabulary::{load_salary_brackets, FuzzyMatcher, RemoteVocabulary, VocabularyStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Scout v{}", env!("CARGO_PKG_VERSION"));

    let client = build_client(config.http_timeout).context("Failed to build HTTP client")?;
    let matcher = FuzzyMatcher::new(config.similarity_threshold);
    info!(
        "HTTP timeout {:?}, similarity threshold {}",
        config.http_timeout,
        matcher.threshold()
    );

    let sources = connect_sources(&config, &client, matcher).await;
    if sources.is_empty() {
        bail!("No resume source could be initialized");
    }
    info!("{} resume sources ready", sources.len());

    let dialogue_options = DialogueOptions::load(&config.dialogue)
        .await
        .context("Failed to load dialogue options")?;

    let state = AppState::new(config.clone(), sources, dialogue_options);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds every source. A source that fails to start is logged and left out.
async fn connect_sources(
    config: &Config,
    client: &Client,
    matcher: FuzzyMatcher,
) -> Vec<Arc<dyn ResumeSource>> {
    let mut sources: Vec<Arc<dyn ResumeSource>> = Vec::new();

    match work_ua_source(config, client, matcher).await {
        Ok(source) => sources.push(Arc::new(source)),
        Err(e) => error!("work.ua source disabled: {e:#}"),
    }
    match robota_source(config, client, matcher).await {
        Ok(source) => sources.push(Arc::new(source)),
        Err(e) => error!("robota.ua source disabled: {e:#}"),
    }

    sources
}

async fn work_ua_source(config: &Config, client: &Client, matcher: FuzzyMatcher) -> Result<WorkUaSource> {
    let work_ua = &config.work_ua;

    let mut regions = VocabularyStore::new(&work_ua.regions_path);
    if let Some(url) = &work_ua.min_js_url {
        regions = regions.with_remote(RemoteVocabulary::ScriptCityList(url.clone()), client.clone());
    }
    let (salary_from, salary_to) = load_salary_brackets(&work_ua.salary_path).await;

    let vocabularies = WorkUaVocabularies {
        regions: regions.load().await.context("work.ua regions")?,
        experience: VocabularyStore::new(&work_ua.experience_path)
            .load()
            .await
            .context("work.ua experience options")?,
        salary_from,
        salary_to,
    };
    info!(
        "work.ua vocabularies: {} regions, {} experience options, {}/{} salary brackets",
        vocabularies.regions.len(),
        vocabularies.experience.len(),
        vocabularies.salary_from.len(),
        vocabularies.salary_to.len()
    );

    let gateway = config.gateway.as_ref().map(ScraperGateway::from);
    if gateway.is_some() {
        info!("work.ua pages are fetched through the scraping gateway");
    }

    Ok(WorkUaSource::new(
        work_ua.clone(),
        client.clone(),
        gateway,
        matcher,
        vocabularies,
    ))
}

async fn robota_source(config: &Config, client: &Client, matcher: FuzzyMatcher) -> Result<RobotaSource> {
    let robota = &config.robota;

    let mut regions = VocabularyStore::new(&robota.regions_path);
    if let Some(url) = &robota.regions_url {
        regions = regions.with_remote(RemoteVocabulary::JsonCityList(url.clone()), client.clone());
    }

    let vocabularies = RobotaVocabularies {
        regions: regions.load().await.context("robota.ua regions")?,
        experience: VocabularyStore::new(&robota.experience_path)
            .load()
            .await
            .context("robota.ua experience options")?,
    };

    let source = RobotaSource::connect(robota.clone(), client.clone(), matcher, vocabularies).await?;
    Ok(source)
}
