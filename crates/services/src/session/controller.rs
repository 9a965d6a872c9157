use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use serde_json::{Value, json};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use course_core::gate::SendOptions;
use course_core::model::{
    answered_statement, experienced_statement, verbs, Interaction, LaunchContext, LaunchMode,
    Score, Statement,
};
use storage::{ActivityStateRepository, StateScope};

use crate::dispatch::{DispatchEvent, DispatchOutcome, Dispatcher};
use crate::error::{InitializationError, ProtocolError, SessionError};
use crate::host::HostPage;
use crate::protocol::Cmi5Client;

use super::lifecycle::{ExitAction, SessionState};

/// State document id holding `{ "bookmark": ... }`.
pub const BOOKMARK_STATE_ID: &str = "suspendData";

/// Owns one learner session: startup, bookmarks, learner statements and exit.
pub struct SessionController {
    client: Arc<dyn Cmi5Client>,
    host: Arc<dyn HostPage>,
    states: Arc<dyn ActivityStateRepository>,
    dispatcher: Dispatcher,
    state: Mutex<SessionState>,
    // Set once initialize finds an endpoint, and kept through a failed start.
    client_bound: AtomicBool,
    passing_score: OnceLock<Option<f64>>,
    bookmark_state_id: String,
}

impl SessionController {
    #[must_use]
    pub fn new(
        client: Arc<dyn Cmi5Client>,
        host: Arc<dyn HostPage>,
        states: Arc<dyn ActivityStateRepository>,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&client)),
            client,
            host,
            states,
            state: Mutex::new(SessionState::Uninitialized),
            client_bound: AtomicBool::new(false),
            passing_score: OnceLock::new(),
            bookmark_state_id: BOOKMARK_STATE_ID.to_owned(),
        }
    }

    /// Register the callback notified around every instrumented dispatch.
    #[must_use]
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(DispatchEvent<'_>, usize) + Send + Sync + 'static,
    {
        self.dispatcher = self.dispatcher.with_observer(observer);
        self
    }

    #[must_use]
    pub fn with_bookmark_state_id(mut self, state_id: impl Into<String>) -> Self {
        self.bookmark_state_id = state_id.into();
        self
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.lock_state()
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.state() == SessionState::Disabled
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn launch_mode(&self) -> LaunchMode {
        self.dispatcher.launch_mode()
    }

    /// Mastery score from launch data, if one was provided.
    #[must_use]
    pub fn passing_score_override(&self) -> Option<f64> {
        self.passing_score.get().copied().flatten()
    }

    /// True if unforced statements would currently be recorded.
    #[must_use]
    pub fn can_save(&self) -> bool {
        self.dispatcher.should_send(SendOptions::default())
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    #[must_use]
    pub fn subscribe_in_flight(&self) -> watch::Receiver<usize> {
        self.dispatcher.subscribe_in_flight()
    }

    //
    // ─── LIFECYCLE ─────────────────────────────────────────────────────────────
    //

    /// Start the session: launch data first, then the `initialized` statement.
    ///
    /// Returns the state reached: `Ready`, or `Disabled` when the launch has no
    /// endpoint. Failures are shown to the learner through the host and leave
    /// the session `Uninitialized`.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::AlreadyStarted` if called twice,
    /// `LaunchData` if launch data cannot be loaded, and `InitializeStatement`
    /// if the initialized statement fails.
    pub async fn initialize(&self) -> Result<SessionState, InitializationError> {
        self.begin_initialize()?;

        if self.client.endpoint().is_none_or(|e| e.trim().is_empty()) {
            info!("no endpoint in launch; running standalone with recording disabled");
            self.set_state(SessionState::Disabled);
            return Ok(SessionState::Disabled);
        }
        self.client_bound.store(true, Ordering::SeqCst);

        if let Err(err) = self.client.load_launch_data().await {
            return Err(self.fail_initialize(InitializationError::LaunchData(err)));
        }

        let mastery_score = self.client.mastery_score();
        let context = LaunchContext::from_raw(&self.client.launch_mode(), mastery_score.as_deref());
        if !self.dispatcher.bind_launch_mode(context.launch_mode) {
            debug!("launch mode already bound by an earlier attempt");
        }
        if self.passing_score.set(context.passing_score_override).is_err() {
            debug!("passing score already bound by an earlier attempt");
        }
        info!(
            launch_mode = %context.launch_mode,
            passing_score = ?context.passing_score_override,
            "launch data loaded"
        );

        // Lifecycle statements are recorded in every launch mode.
        if let Err(err) = self.client.send_initialized().await {
            return Err(self.fail_initialize(InitializationError::InitializeStatement(err)));
        }

        self.set_state(SessionState::Ready);
        info!("session ready");
        Ok(SessionState::Ready)
    }

    /// Terminate the session (unless already done) and leave the page.
    ///
    /// Any launch with an endpoint is terminated and may redirect to its return
    /// URL, including one whose initialize failed. Waits for outstanding
    /// dispatches before terminating. A failed terminate is logged and does
    /// not stop the exit.
    pub async fn exit(&self, already_terminated: bool) -> ExitAction {
        let bound = self.client_bound.load(Ordering::SeqCst);
        if bound && !already_terminated {
            self.set_state(SessionState::Terminating);
            self.dispatcher.drained().await;
            match self.client.terminate().await {
                Ok(_) => info!("session terminated"),
                Err(err) => warn!(error = %err, "terminate failed; exiting anyway"),
            }
        }
        self.set_state(SessionState::Closed);
        self.leave_page(bound)
    }

    fn leave_page(&self, bound: bool) -> ExitAction {
        if self.host.has_opener() {
            match self.host.close_window() {
                Ok(()) => return ExitAction::ClosedWindow,
                Err(err) => debug!(error = %err, "falling back to return url"),
            }
        }
        if bound {
            self.redirect()
        } else {
            ExitAction::Stayed
        }
    }

    fn redirect(&self) -> ExitAction {
        match self.client.return_url().filter(|url| !url.trim().is_empty()) {
            Some(url) => {
                self.host.navigate(&url);
                ExitAction::Navigated(url)
            }
            None => ExitAction::Stayed,
        }
    }

    fn begin_initialize(&self) -> Result<(), InitializationError> {
        let mut state = self.lock_state();
        if *state != SessionState::Uninitialized {
            return Err(InitializationError::AlreadyStarted(*state));
        }
        *state = SessionState::Initializing;
        Ok(())
    }

    fn fail_initialize(&self, err: InitializationError) -> InitializationError {
        error!(error = %err, "session initialization failed");
        self.host.alert(&err.to_string());
        self.set_state(SessionState::Uninitialized);
        err
    }

    //
    // ─── BOOKMARK ──────────────────────────────────────────────────────────────
    //

    /// Last stored bookmark, or an empty string when none is stored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the state document cannot be fetched.
    pub async fn bookmark(&self) -> Result<String, SessionError> {
        if self.is_disabled() {
            return Ok(String::new());
        }
        let scope = self.state_scope()?;
        let document = self.states.get_state(&scope, &self.bookmark_state_id).await?;
        Ok(document
            .as_ref()
            .and_then(|doc| doc.get("bookmark"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned())
    }

    /// Store `bookmark` as the learner's resume point.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the state document cannot be stored.
    pub async fn set_bookmark(&self, bookmark: &str) -> Result<Option<Value>, SessionError> {
        if self.is_disabled() {
            return Ok(None);
        }
        let scope = self.state_scope()?;
        let document = json!({ "bookmark": bookmark });
        Ok(self
            .states
            .put_state(&scope, &self.bookmark_state_id, &document)
            .await?)
    }

    fn state_scope(&self) -> Result<StateScope, SessionError> {
        let endpoint = self
            .client
            .endpoint()
            .filter(|e| !e.trim().is_empty())
            .ok_or(SessionError::MissingEndpoint)?;
        Ok(StateScope {
            endpoint,
            activity_id: self.client.activity_id(),
            agent: self.client.actor(),
            registration: self.client.registration(),
            auth: self.client.auth(),
        })
    }

    //
    // ─── LEARNER STATEMENTS ────────────────────────────────────────────────────
    //

    /// Record that the learner viewed page `page_id`.
    ///
    /// `progress` is attached as the cmi5 progress extension when it lies
    /// strictly between 0 and 100.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Statement` if the statement cannot be built.
    /// Send failures only reach the observer.
    pub async fn record_experience(
        &self,
        page_id: &str,
        name: &str,
        progress: f64,
    ) -> Result<DispatchOutcome, SessionError> {
        let options = SendOptions::default();
        if !self.accepts_dispatch() || !self.dispatcher.should_send(options) {
            return Ok(DispatchOutcome::Skipped);
        }
        let base = self.client.prepare_statement(verbs::EXPERIENCED.id);
        let statement =
            experienced_statement(base, &self.client.activity_id(), page_id, name, progress)?;
        Ok(self.dispatcher.send(statement, options).await)
    }

    /// Record one "answered" statement per interaction, sent together or
    /// batched per `options.queue`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Statement` if a statement cannot be built.
    pub async fn record_interactions(
        &self,
        interactions: &[Interaction],
        options: SendOptions,
    ) -> Result<DispatchOutcome, SessionError> {
        if !self.accepts_dispatch() || !self.dispatcher.should_send(options) {
            return Ok(DispatchOutcome::Skipped);
        }
        let activity_id = self.client.activity_id();
        let statements = interactions
            .iter()
            .map(|interaction| {
                let base = self.client.prepare_statement(verbs::ANSWERED.id);
                answered_statement(base, &activity_id, interaction)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.dispatcher.send_many(statements, options).await)
    }

    pub async fn send(&self, statement: Statement, options: SendOptions) -> DispatchOutcome {
        if !self.accepts_dispatch() {
            return DispatchOutcome::Skipped;
        }
        self.dispatcher.send(statement, options).await
    }

    pub async fn send_many(
        &self,
        statements: Vec<Statement>,
        options: SendOptions,
    ) -> DispatchOutcome {
        if !self.accepts_dispatch() {
            return DispatchOutcome::Skipped;
        }
        self.dispatcher.send_many(statements, options).await
    }

    pub fn batch(&self, statement: Statement) -> DispatchOutcome {
        if !self.accepts_dispatch() {
            return DispatchOutcome::Skipped;
        }
        self.dispatcher.batch(statement)
    }

    pub fn batch_many(&self, statements: Vec<Statement>) -> DispatchOutcome {
        if !self.accepts_dispatch() {
            return DispatchOutcome::Skipped;
        }
        self.dispatcher.batch_many(statements)
    }

    /// Send the batch buffer. The buffer keeps its contents; see `clear_batch`.
    pub async fn flush(&self) -> DispatchOutcome {
        if !self.accepts_dispatch() {
            return DispatchOutcome::Skipped;
        }
        self.dispatcher.flush().await
    }

    pub fn clear_batch(&self) -> usize {
        self.dispatcher.clear_batch()
    }

    //
    // ─── RESULTS ───────────────────────────────────────────────────────────────
    //

    /// Record a failed attempt. Not instrumented: a failure here is returned.
    ///
    /// Returns `Ok(None)` when the send policy drops it.
    ///
    /// # Errors
    ///
    /// Propagates the protocol client's failure.
    pub async fn fail(&self, score: Score) -> Result<Option<Value>, ProtocolError> {
        if !self.accepts_dispatch() || !self.can_save() {
            return Ok(None);
        }
        self.client.failed(score).await.map(Some)
    }

    /// Record passed and then completed as one instrumented dispatch.
    pub async fn pass_and_complete(&self, score: Score) -> DispatchOutcome {
        if !self.accepts_dispatch() || !self.can_save() {
            return DispatchOutcome::Skipped;
        }
        let client = Arc::clone(&self.client);
        self.dispatcher
            .send_via(async move {
                client.passed(score).await?;
                client.completed().await
            })
            .await
    }

    // No protocol client is bound before initialize or in standalone mode.
    fn accepts_dispatch(&self) -> bool {
        !matches!(
            self.state(),
            SessionState::Uninitialized | SessionState::Disabled
        )
    }

    fn set_state(&self, next: SessionState) {
        let mut state = self.lock_state();
        let from = *state;
        if from != next {
            debug!(%from, to = %next, "session state change");
            *state = next;
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
