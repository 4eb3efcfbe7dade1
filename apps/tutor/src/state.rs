use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};

use crate::chat::{HistoryStore, SessionController, SessionEvent};
use crate::config::Config;
use crate::export::PageConfig;
use crate::llm_client::AiClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The single chat session. Holding the lock serializes exchanges end to end.
    pub session: Arc<Mutex<SessionController>>,
    /// Session transitions, subscribable without taking the session lock.
    pub events: broadcast::Sender<SessionEvent>,
    /// Shared with the session; used directly by the stateless analyses.
    pub llm: Arc<dyn AiClient>,
    pub config: Config,
    /// Page geometry and fonts for the transcript export.
    pub page_config: PageConfig,
}

impl AppState {
    /// Loads the persisted history and starts the session.
    pub fn new(config: Config, llm: Arc<dyn AiClient>, page_config: PageConfig) -> Self {
        let store = HistoryStore::new(config.chat_history_file.clone());
        let session = SessionController::start(store, llm.clone());
        let events = session.events();
        Self {
            session: Arc::new(Mutex::new(session)),
            events,
            llm,
            config,
            page_config,
        }
    }
}
