//! Routing the companion framework's log events into the host's sink.

use std::sync::Arc;

use crate::util::logging::{LogLevel, LogSink};

/// Companion severity names and the host levels they map to.
///
/// Matched case-insensitively. Anything else is logged as
/// [`LogLevel::Message`].
pub const SEVERITY_TABLE: &[(&str, LogLevel)] = &[
    ("FATAL", LogLevel::Fatal),
    ("ERROR", LogLevel::Error),
    ("WARN", LogLevel::Warning),
    ("WARNING", LogLevel::Warning),
    ("INFO", LogLevel::Info),
    ("DEBUG", LogLevel::Debug),
    ("UNITY", LogLevel::Message),
];

/// Map a companion severity onto a host level.
pub fn map_level(level: &str) -> LogLevel {
    SEVERITY_TABLE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(level))
        .map(|(_, mapped)| *mapped)
        .unwrap_or(LogLevel::Message)
}

/// Forwards companion log events to the host sink.
#[derive(Clone)]
pub struct LogBridge {
    sink: Arc<dyn LogSink>,
}

impl LogBridge {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        LogBridge { sink }
    }

    /// Forward one companion event.
    pub fn forward(&self, level: &str, source: &str, message: &str) {
        self.sink.log(map_level(level), source, message);
    }
}

impl std::fmt::Debug for LogBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogBridge").finish_non_exhaustive()
    }
}
