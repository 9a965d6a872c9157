mod batch;
mod engine;
mod observer;

pub use batch::{BatchEntry, BatchStore};
pub use engine::{DispatchOutcome, Dispatcher};
pub use observer::{DispatchEvent, DispatchObserver};
