//! Session Controller: drives one exchange from user input to persisted transcript.
//!
//! # States
//! - `Idle`: waiting for input.
//! - `Responding`: the AI request for the latest question is outstanding.
//!
//! Every transition is broadcast as a `SessionEvent`; presentation layers redraw
//! from the current transcript when they receive one. The controller is the only
//! writer of the transcript and of the history file.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info;

use crate::chat::models::{now_timestamp, Role, Transcript, Turn};
use crate::chat::store::{HistoryStore, StoreError};
use crate::llm_client::{ask_or_describe, AiClient};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Responding,
}

/// Emitted after every state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEvent {
    pub state: SessionState,
    pub turn_count: usize,
}

/// The two turns appended by one completed exchange.
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    pub user: Turn,
    pub assistant: Turn,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("question cannot be empty")]
    EmptyQuestion,

    /// The exchange is in memory but could not be written to disk.
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

pub struct SessionController {
    transcript: Transcript,
    store: HistoryStore,
    ai: Arc<dyn AiClient>,
    state: SessionState,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    /// Starts a session from whatever history the store holds.
    pub fn start(store: HistoryStore, ai: Arc<dyn AiClient>) -> Self {
        let transcript = store.load();
        info!(
            turns = transcript.len(),
            path = %store.path().display(),
            "Chat session started"
        );
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            transcript,
            store,
            ai,
            state: SessionState::Idle,
            events,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Sender half of the event channel; subscribe through it without holding the
    /// session lock.
    pub fn events(&self) -> broadcast::Sender<SessionEvent> {
        self.events.clone()
    }

    /// Runs one exchange: append the question, ask the model, append the answer
    /// (or the error text), persist.
    ///
    /// A persistence failure leaves both turns in memory and the session Idle;
    /// the error is returned so the caller can surface it.
    pub async fn submit(&mut self, question: &str) -> Result<Exchange, SubmitError> {
        if question.trim().is_empty() {
            return Err(SubmitError::EmptyQuestion);
        }

        let timestamp = now_timestamp();
        let user = Turn::new(Role::User, question, timestamp);
        self.transcript.append(user.clone());
        self.transition(SessionState::Responding);

        let answer = ask_or_describe(self.ai.as_ref(), question).await;

        let assistant = Turn::new(Role::Assistant, answer, timestamp);
        self.transcript.append(assistant.clone());

        let saved = self.store.persist(self.transcript.clone()).await;
        self.transition(SessionState::Idle);
        saved?;

        Ok(Exchange { user, assistant })
    }

    fn transition(&mut self, state: SessionState) {
        self.state = state;
        // No subscribers is fine: nobody is watching.
        let _ = self.events.send(SessionEvent {
            state,
            turn_count: self.transcript.len(),
        });
    }
}
