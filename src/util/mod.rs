//! Shared utilities

pub mod archive;
pub mod config;
pub mod context;
pub mod fs;
pub mod logging;

pub use config::Config;
pub use context::{InitContext, Paths};
pub use logging::{LogLevel, LogSink};
