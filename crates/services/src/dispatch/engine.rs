use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use course_core::gate::{self, SendOptions};
use course_core::model::{LaunchMode, Statement};

use crate::error::ProtocolError;
use crate::protocol::Cmi5Client;

use super::batch::BatchStore;
use super::observer::{DispatchEvent, DispatchObserver};

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// What happened to a dispatch request, from the caller's side.
///
/// Network success or failure is never part of the outcome; it is only
/// reported to the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Dropped by the send policy, or nothing to send.
    Skipped,
    /// Appended to the batch buffer.
    Queued,
    /// Went through the instrumented path and has settled.
    Dispatched,
}

//
// ─── IN-FLIGHT GUARD ───────────────────────────────────────────────────────────
//

/// One outstanding dispatch. Decrements the counter exactly once, on `settle`
/// or on drop. A guard dropped unsettled reports `ProtocolError::Cancelled`.
struct InFlight<'a> {
    counter: &'a watch::Sender<usize>,
    observer: Option<&'a DispatchObserver>,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn begin(
        counter: &'a watch::Sender<usize>,
        observer: Option<&'a DispatchObserver>,
    ) -> (Self, usize) {
        let mut now = 0;
        counter.send_modify(|count| {
            *count += 1;
            now = *count;
        });
        (
            Self {
                counter,
                observer,
                settled: false,
            },
            now,
        )
    }

    fn settle(mut self) -> usize {
        self.settled = true;
        decrement(self.counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let remaining = decrement(self.counter);
        warn!(in_flight = remaining, "dispatch dropped before settling");
        if let Some(observer) = self.observer {
            let cancelled: Result<Value, ProtocolError> = Err(ProtocolError::Cancelled);
            observer(DispatchEvent::Settled(&cancelled), remaining);
        }
    }
}

fn decrement(counter: &watch::Sender<usize>) -> usize {
    let mut now = 0;
    counter.send_modify(|count| {
        *count = count.saturating_sub(1);
        now = *count;
    });
    now
}

//
// ─── DISPATCHER ────────────────────────────────────────────────────────────────
//

/// Sends statements through the protocol client with in-flight bookkeeping.
///
/// Every network call goes through one instrumented wrapper: bump the count,
/// notify `Started`, await, drop the count, notify `Settled`. The wrapper
/// never fails from the caller's side.
pub struct Dispatcher {
    client: Arc<dyn Cmi5Client>,
    launch_mode: OnceLock<LaunchMode>,
    batch: BatchStore,
    in_flight: watch::Sender<usize>,
    observer: Option<DispatchObserver>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(client: Arc<dyn Cmi5Client>) -> Self {
        Self {
            client,
            launch_mode: OnceLock::new(),
            batch: BatchStore::new(),
            in_flight: watch::Sender::new(0),
            observer: None,
        }
    }

    /// Register the dispatch observer, replacing any previous one.
    #[must_use]
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(DispatchEvent<'_>, usize) + Send + Sync + 'static,
    {
        let observer: DispatchObserver = Arc::new(observer);
        self.observer = Some(observer);
        self
    }

    /// Fix the launch mode used by the send policy.
    ///
    /// Returns `false` if a launch mode was already bound; the first one wins.
    pub fn bind_launch_mode(&self, mode: LaunchMode) -> bool {
        self.launch_mode.set(mode).is_ok()
    }

    /// Launch mode in effect; `Unknown` until bound.
    #[must_use]
    pub fn launch_mode(&self) -> LaunchMode {
        self.launch_mode.get().copied().unwrap_or_default()
    }

    #[must_use]
    pub fn should_send(&self, options: SendOptions) -> bool {
        gate::should_send(self.launch_mode(), options)
    }

    /// Number of dispatches started and not yet settled.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Watch the in-flight count, e.g. to drive a saving indicator.
    #[must_use]
    pub fn subscribe_in_flight(&self) -> watch::Receiver<usize> {
        self.in_flight.subscribe()
    }

    /// Resolve once no dispatch is outstanding.
    pub async fn drained(&self) {
        let mut rx = self.in_flight.subscribe();
        if rx.wait_for(|count| *count == 0).await.is_err() {
            debug!("in-flight counter closed while waiting for drain");
        }
    }

    pub async fn send(&self, statement: Statement, options: SendOptions) -> DispatchOutcome {
        if !self.should_send(options) {
            debug!(launch_mode = %self.launch_mode(), "statement dropped by send policy");
            return DispatchOutcome::Skipped;
        }
        if options.queue {
            return self.enqueue(vec![statement], options.force_send);
        }
        self.instrumented("statement", self.client.send_statement(statement))
            .await
    }

    /// Send several statements in one call. An empty list is skipped.
    pub async fn send_many(
        &self,
        statements: Vec<Statement>,
        options: SendOptions,
    ) -> DispatchOutcome {
        if !self.should_send(options) {
            debug!(
                launch_mode = %self.launch_mode(),
                count = statements.len(),
                "statements dropped by send policy"
            );
            return DispatchOutcome::Skipped;
        }
        if options.queue {
            return self.enqueue(statements, options.force_send);
        }
        if statements.is_empty() {
            return DispatchOutcome::Skipped;
        }
        self.instrumented("statements", self.client.send_statements(statements))
            .await
    }

    /// Run an arbitrary protocol operation as one instrumented dispatch.
    ///
    /// Not subject to the send policy; callers gate compound operations themselves.
    pub async fn send_via<F>(&self, operation: F) -> DispatchOutcome
    where
        F: Future<Output = Result<Value, ProtocolError>>,
    {
        self.instrumented("operation", operation).await
    }

    /// Append an unforced statement to the batch.
    pub fn batch(&self, statement: Statement) -> DispatchOutcome {
        self.enqueue(vec![statement], false)
    }

    pub fn batch_many(&self, statements: Vec<Statement>) -> DispatchOutcome {
        self.enqueue(statements, false)
    }

    /// Send everything batched so far in one call.
    ///
    /// Each entry is checked against the send policy with the `force_send` it
    /// was queued with; entries the policy drops are left out of the call.
    /// The buffer is not cleared: flushing twice sends the same statements
    /// twice. Use `clear_batch` after a flush to start a new batch.
    pub async fn flush(&self) -> DispatchOutcome {
        let pending = self.batch.snapshot();
        let queued = pending.len();
        let sendable: Vec<Statement> = pending
            .into_iter()
            .filter(|entry| {
                self.should_send(SendOptions::default().with_force_send(entry.force_send))
            })
            .map(|entry| entry.statement)
            .collect();

        if sendable.len() < queued {
            debug!(
                launch_mode = %self.launch_mode(),
                dropped = queued - sendable.len(),
                "batched statements dropped by send policy"
            );
        }
        if sendable.is_empty() {
            return DispatchOutcome::Skipped;
        }
        debug!(count = sendable.len(), "flushing batch");
        self.instrumented("batch", self.client.send_statements(sendable))
            .await
    }

    pub fn clear_batch(&self) -> usize {
        self.batch.clear()
    }

    #[must_use]
    pub fn pending(&self) -> Vec<Statement> {
        self.batch.statements()
    }

    fn enqueue(&self, statements: Vec<Statement>, force_send: bool) -> DispatchOutcome {
        self.batch.extend(statements, force_send);
        debug!(pending = self.batch.len(), force_send, "statements batched");
        DispatchOutcome::Queued
    }

    async fn instrumented<F>(&self, kind: &'static str, operation: F) -> DispatchOutcome
    where
        F: Future<Output = Result<Value, ProtocolError>>,
    {
        let (guard, started) = InFlight::begin(&self.in_flight, self.observer.as_ref());
        debug!(kind, in_flight = started, "dispatch started");
        self.notify(DispatchEvent::Started, started);

        let outcome = operation.await;
        let remaining = guard.settle();

        match &outcome {
            Ok(_) => debug!(kind, in_flight = remaining, "dispatch settled"),
            Err(err) => warn!(kind, in_flight = remaining, error = %err, "dispatch failed"),
        }
        self.notify(DispatchEvent::Settled(&outcome), remaining);
        DispatchOutcome::Dispatched
    }

    fn notify(&self, event: DispatchEvent<'_>, in_flight: usize) {
        if let Some(observer) = &self.observer {
            observer(event, in_flight);
        }
    }
}
