pub mod codec;
pub mod config;
pub mod controller;
pub mod core;
pub mod error;
pub mod inference;
pub mod ledger;
pub mod observability;
pub mod producer;
pub mod session;
pub mod telemetry;

pub use error::{StreamError, StreamResult};
