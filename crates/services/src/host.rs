//! The page hosting the course: alerts, window close and navigation.

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("window close was not allowed: {0}")]
pub struct CloseDenied(pub String);

pub trait HostPage: Send + Sync {
    /// Show a message to the learner.
    fn alert(&self, message: &str);

    /// True if the course window was opened by another window.
    fn has_opener(&self) -> bool;

    fn close_window(&self) -> Result<(), CloseDenied>;

    fn navigate(&self, url: &str);
}

/// Host for runs without a browser window; everything is logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessHost;

impl HostPage for HeadlessHost {
    fn alert(&self, message: &str) {
        warn!(message, "alert");
    }

    fn has_opener(&self) -> bool {
        false
    }

    fn close_window(&self) -> Result<(), CloseDenied> {
        Err(CloseDenied("headless host has no window".into()))
    }

    fn navigate(&self, url: &str) {
        info!(url, "navigate");
    }
}
