use std::fmt;

/// Lifecycle of a course session.
///
/// `Uninitialized -> Initializing -> Ready -> Terminating -> Closed`, with
/// `Disabled` reached from `Initializing` when the launch carried no endpoint.
/// A failed initialize returns to `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    /// Launched outside a conformant runtime; everything is a no-op.
    Disabled,
    Terminating,
    Closed,
}

impl SessionState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Disabled => "disabled",
            Self::Terminating => "terminating",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How `exit` left the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitAction {
    ClosedWindow,
    Navigated(String),
    /// No opener to close and no return URL to go to.
    Stayed,
}
