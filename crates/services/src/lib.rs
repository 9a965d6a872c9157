#![forbid(unsafe_code)]

pub mod dispatch;
pub mod error;
pub mod host;
pub mod protocol;
pub mod session;

pub use course_core::gate::SendOptions;

pub use dispatch::{
    BatchEntry, BatchStore, DispatchEvent, DispatchObserver, DispatchOutcome, Dispatcher,
};
pub use error::{InitializationError, ProtocolError, SessionError};
pub use host::{CloseDenied, HeadlessHost, HostPage};
pub use protocol::Cmi5Client;
pub use session::{ExitAction, SessionController, SessionState, BOOKMARK_STATE_ID};
