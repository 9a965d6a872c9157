mod controller;
mod lifecycle;

pub use controller::{SessionController, BOOKMARK_STATE_ID};
pub use lifecycle::{ExitAction, SessionState};
