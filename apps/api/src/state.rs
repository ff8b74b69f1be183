use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::dialogue::{DialogueOptions, Session};
use crate::sources::ResumeSource;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Sources that connected at startup, in search order.
    pub sources: Vec<Arc<dyn ResumeSource>>,
    pub dialogue_options: Arc<DialogueOptions>,
    /// Open dialogues keyed by chat id.
    pub sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl AppState {
    pub fn new(
        config: Config,
        sources: Vec<Arc<dyn ResumeSource>>,
        dialogue_options: DialogueOptions,
    ) -> Self {
        Self {
            config,
            sources,
            dialogue_options: Arc::new(dialogue_options),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}
