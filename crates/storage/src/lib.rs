#![forbid(unsafe_code)]

pub mod config;
pub mod http;
pub mod repository;

pub use config::StateStoreConfig;
pub use http::HttpActivityStateStore;
pub use repository::{ActivityStateRepository, InMemoryActivityState, StateError, StateScope};
