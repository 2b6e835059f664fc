//! Logging into the host's sink.
//!
//! Crate code logs with the ordinary `tracing` macros. [`SinkLayer`] is the
//! subscriber layer that turns those events into lines on the host's log
//! sink, so they appear under the initializer's source name in the host's
//! console and log file.

use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Source name the initializer's lines are logged under.
pub const LOG_SOURCE: &str = "Abyss.Initializer";

/// Severity levels of the host's logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Fatal,
    Error,
    Warning,
    Message,
    Info,
    Debug,
}

impl LogLevel {
    /// Map a tracing level onto the host's levels.
    pub fn from_tracing(level: &Level) -> Self {
        match *level {
            Level::ERROR => LogLevel::Error,
            Level::WARN => LogLevel::Warning,
            Level::INFO => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Fatal => "Fatal",
            LogLevel::Error => "Error",
            LogLevel::Warning => "Warning",
            LogLevel::Message => "Message",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
        };
        f.write_str(s)
    }
}

/// The host's logging sink.
pub trait LogSink: Send + Sync {
    /// Write one line under `source`.
    fn log(&self, level: LogLevel, source: &str, message: &str);
}

/// Tracing layer forwarding events to a [`LogSink`].
pub struct SinkLayer {
    sink: Arc<dyn LogSink>,
    source: String,
}

impl SinkLayer {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        SinkLayer {
            sink,
            source: LOG_SOURCE.to_string(),
        }
    }
}

impl<S: Subscriber> Layer<S> for SinkLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let level = LogLevel::from_tracing(event.metadata().level());
        self.sink.log(level, &self.source, &visitor.finish());
    }
}

/// Collects an event's message and any extra fields.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else {
            format!("{} ({})", self.message, self.fields.join(", "))
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

/// Build the filter for the initializer's own events.
pub fn filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("abyss=debug")
    } else {
        EnvFilter::new("abyss=info")
    }
}

/// Install a global subscriber writing into `sink`.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(sink: Arc<dyn LogSink>, verbose: bool) -> bool {
    tracing_subscriber::registry()
        .with(filter(verbose))
        .with(SinkLayer::new(sink))
        .try_init()
        .is_ok()
}
