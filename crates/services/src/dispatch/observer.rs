use std::sync::Arc;

use serde_json::Value;

use crate::error::ProtocolError;

/// What an instrumented dispatch reports to the observer.
///
/// Every dispatch produces exactly one `Started` followed by exactly one
/// `Settled`, each paired with the in-flight count at that moment. A dispatch
/// whose future is dropped early settles with `ProtocolError::Cancelled`.
#[derive(Debug, Clone, Copy)]
pub enum DispatchEvent<'a> {
    Started,
    Settled(&'a Result<Value, ProtocolError>),
}

impl DispatchEvent<'_> {
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        match self {
            DispatchEvent::Settled(Ok(value)) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&ProtocolError> {
        match self {
            DispatchEvent::Settled(Err(err)) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        matches!(self, DispatchEvent::Started)
    }
}

/// Callback receiving dispatch events and the current in-flight count.
pub type DispatchObserver = Arc<dyn Fn(DispatchEvent<'_>, usize) + Send + Sync>;
