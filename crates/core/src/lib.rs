#![forbid(unsafe_code)]

pub mod gate;
pub mod model;

pub use gate::{SendOptions, should_send};
