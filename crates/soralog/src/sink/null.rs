use super::Sink;
use crate::event::ThreadInfoMode;
use crate::level::Level;
use std::fmt;

/// The always-present sink named `*`: drains and drops every event.
///
/// Installed automatically by [`crate::LoggingSystem`] at construction and
/// reserved — user configuration may not create another sink under this
/// name. Unlike the ring-backed sinks, `NullSink` never queues anything;
/// there is nothing to flush or rotate.
pub struct NullSink {
    name: String,
}

impl NullSink {
    pub fn new() -> Self {
        Self { name: "*".to_string() }
    }
}

impl Default for NullSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for NullSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn push(
        &self,
        _logger_name: &str,
        _level: Level,
        _thread_mode: ThreadInfoMode,
        _format_source: &str,
        _args: fmt::Arguments<'_>,
    ) {
    }

    fn flush(&self) {}

    fn rotate(&self) {}

    fn level(&self) -> Option<Level> {
        None
    }
}
