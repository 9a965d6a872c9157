use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by activity state adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StateError {
    #[error("failed to {method} activity state: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid activity state endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("activity state document is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("http client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    #[error("connection error: {0}")]
    Connection(String),
}

/// Identifies the (learner, activity, registration) bucket a state document belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct StateScope {
    /// Learning record store base URL.
    pub endpoint: String,
    pub activity_id: String,
    /// xAPI agent object, sent as JSON.
    pub agent: Value,
    pub registration: String,
    /// Full `Authorization` header value (`Basic ...` or `Bearer ...`).
    pub auth: String,
}

/// Repository contract for remote activity state documents.
#[async_trait]
pub trait ActivityStateRepository: Send + Sync {
    /// Fetch a state document.
    ///
    /// # Errors
    ///
    /// Returns `StateError` on transport or decoding failures. A missing
    /// document is `Ok(None)`, not an error.
    async fn get_state(&self, scope: &StateScope, state_id: &str)
    -> Result<Option<Value>, StateError>;

    /// Store a state document, replacing any previous one.
    ///
    /// Returns the response body when the store echoes one.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the document cannot be stored.
    async fn put_state(
        &self,
        scope: &StateScope,
        state_id: &str,
        document: &Value,
    ) -> Result<Option<Value>, StateError>;
}

type StateKey = (String, String, String, String);

/// In-memory activity state for tests and standalone runs.
#[derive(Clone, Default)]
pub struct InMemoryActivityState {
    documents: Arc<Mutex<HashMap<StateKey, Value>>>,
}

impl InMemoryActivityState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn key(scope: &StateScope, state_id: &str) -> StateKey {
        (
            scope.activity_id.clone(),
            scope.agent.to_string(),
            scope.registration.clone(),
            state_id.to_owned(),
        )
    }
}

#[async_trait]
impl ActivityStateRepository for InMemoryActivityState {
    async fn get_state(
        &self,
        scope: &StateScope,
        state_id: &str,
    ) -> Result<Option<Value>, StateError> {
        let guard = self
            .documents
            .lock()
            .map_err(|e| StateError::Connection(e.to_string()))?;
        Ok(guard.get(&Self::key(scope, state_id)).cloned())
    }

    async fn put_state(
        &self,
        scope: &StateScope,
        state_id: &str,
        document: &Value,
    ) -> Result<Option<Value>, StateError> {
        let mut guard = self
            .documents
            .lock()
            .map_err(|e| StateError::Connection(e.to_string()))?;
        guard.insert(Self::key(scope, state_id), document.clone());
        Ok(None)
    }
}
