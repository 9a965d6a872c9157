#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use course_core::model::{Score, Statement};
use services::{CloseDenied, Cmi5Client, DispatchEvent, HostPage, ProtocolError};

pub const ACTIVITY_ID: &str = "https://course.example/activities/intro";
pub const ENDPOINT: &str = "https://lrs.example/xapi/";

/// Protocol calls in the order they settled.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    LaunchData,
    Initialized,
    Statement(Statement),
    Statements(Vec<Statement>),
    Failed(Score),
    Passed(Score),
    Completed,
    Terminate,
}

pub struct FakeClient {
    endpoint: Option<String>,
    launch_mode: String,
    mastery_score: Option<String>,
    return_url: Option<String>,
    launch_data_error: Option<ProtocolError>,
    initialize_error: Option<ProtocolError>,
    terminate_error: Option<ProtocolError>,
    fail_sends: AtomicBool,
    calls: Mutex<Vec<Call>>,
}

impl FakeClient {
    pub fn new(launch_mode: &str) -> Self {
        Self {
            endpoint: Some(ENDPOINT.into()),
            launch_mode: launch_mode.into(),
            mastery_score: None,
            return_url: None,
            launch_data_error: None,
            initialize_error: None,
            terminate_error: None,
            fail_sends: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn without_endpoint(mut self) -> Self {
        self.endpoint = None;
        self
    }

    pub fn with_mastery_score(mut self, score: &str) -> Self {
        self.mastery_score = Some(score.into());
        self
    }

    pub fn with_return_url(mut self, url: &str) -> Self {
        self.return_url = Some(url.into());
        self
    }

    pub fn with_launch_data_error(mut self, err: ProtocolError) -> Self {
        self.launch_data_error = Some(err);
        self
    }

    pub fn with_initialize_error(mut self, err: ProtocolError) -> Self {
        self.initialize_error = Some(err);
        self
    }

    pub fn with_terminate_error(mut self, err: ProtocolError) -> Self {
        self.terminate_error = Some(err);
        self
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_statements(&self) -> Vec<Statement> {
        self.calls()
            .into_iter()
            .flat_map(|call| match call {
                Call::Statement(statement) => vec![statement],
                Call::Statements(statements) => statements,
                _ => Vec::new(),
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn outcome(&self, ok: Value) -> Result<Value, ProtocolError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            Err(ProtocolError::Transport("offline".into()))
        } else {
            Ok(ok)
        }
    }
}

#[async_trait]
impl Cmi5Client for FakeClient {
    fn endpoint(&self) -> Option<String> {
        self.endpoint.clone()
    }

    fn activity_id(&self) -> String {
        ACTIVITY_ID.into()
    }

    fn actor(&self) -> Value {
        json!({ "objectType": "Agent", "account": { "homePage": "https://lrs.example", "name": "learner-1" } })
    }

    fn registration(&self) -> String {
        "reg-1".into()
    }

    fn auth(&self) -> String {
        "Basic dGVzdDp0ZXN0".into()
    }

    fn return_url(&self) -> Option<String> {
        self.return_url.clone()
    }

    fn launch_mode(&self) -> String {
        self.launch_mode.clone()
    }

    fn mastery_score(&self) -> Option<String> {
        self.mastery_score.clone()
    }

    async fn load_launch_data(&self) -> Result<(), ProtocolError> {
        self.record(Call::LaunchData);
        match &self.launch_data_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn send_initialized(&self) -> Result<(), ProtocolError> {
        self.record(Call::Initialized);
        match &self.initialize_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn prepare_statement(&self, verb_id: &str) -> Statement {
        let mut statement = Statement::with_verb_id(verb_id);
        statement.insert("actor", self.actor());
        statement.insert("context", json!({ "registration": "reg-1" }));
        statement
    }

    // Sends yield once so concurrent dispatches overlap, and are recorded on settle.
    async fn send_statement(&self, statement: Statement) -> Result<Value, ProtocolError> {
        tokio::task::yield_now().await;
        self.record(Call::Statement(statement));
        self.outcome(json!(["stmt-id"]))
    }

    async fn send_statements(&self, statements: Vec<Statement>) -> Result<Value, ProtocolError> {
        tokio::task::yield_now().await;
        let ids: Vec<String> = (0..statements.len()).map(|i| format!("stmt-{i}")).collect();
        self.record(Call::Statements(statements));
        self.outcome(json!(ids))
    }

    async fn failed(&self, score: Score) -> Result<Value, ProtocolError> {
        self.record(Call::Failed(score));
        self.outcome(json!(["failed-id"]))
    }

    async fn passed(&self, score: Score) -> Result<Value, ProtocolError> {
        tokio::task::yield_now().await;
        self.record(Call::Passed(score));
        self.outcome(json!(["passed-id"]))
    }

    async fn completed(&self) -> Result<Value, ProtocolError> {
        tokio::task::yield_now().await;
        self.record(Call::Completed);
        self.outcome(json!(["completed-id"]))
    }

    async fn terminate(&self) -> Result<Value, ProtocolError> {
        self.record(Call::Terminate);
        match &self.terminate_error {
            Some(err) => Err(err.clone()),
            None => Ok(json!(["terminated-id"])),
        }
    }
}

//
// ─── OBSERVER ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Started(usize),
    Succeeded(Value, usize),
    Failed(ProtocolError, usize),
}

#[derive(Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Recorder {
    pub fn observer(&self) -> impl Fn(DispatchEvent<'_>, usize) + Send + Sync + 'static {
        let seen = Arc::clone(&self.seen);
        move |event: DispatchEvent<'_>, in_flight: usize| {
            let entry = match event {
                DispatchEvent::Started => Seen::Started(in_flight),
                DispatchEvent::Settled(Ok(value)) => Seen::Succeeded(value.clone(), in_flight),
                DispatchEvent::Settled(Err(err)) => Seen::Failed(err.clone(), in_flight),
            };
            seen.lock().unwrap().push(entry);
        }
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.seen()
            .iter()
            .map(|entry| match entry {
                Seen::Started(n) | Seen::Succeeded(_, n) | Seen::Failed(_, n) => *n,
            })
            .max()
            .unwrap_or(0)
    }
}

//
// ─── HOST ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Alert(String),
    Close,
    Navigate(String),
}

pub struct RecordingHost {
    has_opener: bool,
    close_allowed: bool,
    calls: Mutex<Vec<HostCall>>,
}

impl RecordingHost {
    pub fn new(has_opener: bool, close_allowed: bool) -> Self {
        Self {
            has_opener,
            close_allowed,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl HostPage for RecordingHost {
    fn alert(&self, message: &str) {
        self.calls.lock().unwrap().push(HostCall::Alert(message.into()));
    }

    fn has_opener(&self) -> bool {
        self.has_opener
    }

    fn close_window(&self) -> Result<(), CloseDenied> {
        self.calls.lock().unwrap().push(HostCall::Close);
        if self.close_allowed {
            Ok(())
        } else {
            Err(CloseDenied("scripts may not close this window".into()))
        }
    }

    fn navigate(&self, url: &str) {
        self.calls.lock().unwrap().push(HostCall::Navigate(url.into()));
    }
}
