use crate::event::ThreadInfoMode;
use crate::group::Group;
use crate::level::Level;
use crate::sink::Sink;
use std::fmt;
use std::sync::{Arc, Mutex};

struct LoggerState {
    group: Arc<Group>,
    sink: Option<Arc<dyn Sink>>,
    sink_overridden: bool,
    level: Level,
    level_overridden: bool,
}

/// A leaf of the logging tree: what callers actually log through.
///
/// Every logger is bound to a [`Group`] and, unless it overrides its own
/// sink or level, mirrors whatever that group's effective values are. The
/// emit methods gate on `level()` before ever touching the sink, so a
/// filtered call costs one atomic-free lock and a comparison, nothing more.
pub struct Logger {
    name: String,
    state: Mutex<LoggerState>,
}

impl Logger {
    pub(crate) fn new(name: impl Into<String>, group: Arc<Group>) -> Arc<Logger> {
        let logger = Arc::new(Logger {
            name: name.into(),
            state: Mutex::new(LoggerState {
                sink: group.sink(),
                sink_overridden: false,
                level: group.level(),
                level_overridden: false,
                group,
            }),
        });
        logger
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn push(&self, level: Level, thread_mode: ThreadInfoMode, format_source: &str, args: fmt::Arguments<'_>) {
        let (threshold, sink) = {
            let s = self.state.lock().unwrap();
            (s.level, s.sink.clone())
        };
        if threshold < level {
            return;
        }
        if let Some(sink) = sink {
            sink.push(&self.name, level, thread_mode, format_source, args);
        }
    }

    pub fn trace(&self, format_source: &str, args: fmt::Arguments<'_>) {
        self.push(Level::Trace, ThreadInfoMode::None, format_source, args);
    }
    pub fn debug(&self, format_source: &str, args: fmt::Arguments<'_>) {
        self.push(Level::Debug, ThreadInfoMode::None, format_source, args);
    }
    pub fn verbose(&self, format_source: &str, args: fmt::Arguments<'_>) {
        self.push(Level::Verbose, ThreadInfoMode::None, format_source, args);
    }
    pub fn info(&self, format_source: &str, args: fmt::Arguments<'_>) {
        self.push(Level::Info, ThreadInfoMode::None, format_source, args);
    }
    pub fn warn(&self, format_source: &str, args: fmt::Arguments<'_>) {
        self.push(Level::Warning, ThreadInfoMode::None, format_source, args);
    }
    pub fn error(&self, format_source: &str, args: fmt::Arguments<'_>) {
        self.push(Level::Error, ThreadInfoMode::None, format_source, args);
    }
    pub fn critical(&self, format_source: &str, args: fmt::Arguments<'_>) {
        self.push(Level::Critical, ThreadInfoMode::None, format_source, args);
    }

    pub fn flush(&self) {
        let sink = self.state.lock().unwrap().sink.clone();
        if let Some(sink) = sink {
            sink.flush();
        }
    }

    // Level

    pub fn level(&self) -> Level {
        self.state.lock().unwrap().level
    }

    pub fn level_overridden(&self) -> bool {
        self.state.lock().unwrap().level_overridden
    }

    pub(crate) fn set_level(&self, level: Level) {
        let mut s = self.state.lock().unwrap();
        s.level = level;
        s.level_overridden = true;
    }

    /// Copies the level from this logger's own group, marking it
    /// not-overridden. This is the primitive the propagation algorithm
    /// uses to refresh a non-overriding logger after its group changes.
    pub(crate) fn reset_level(&self) {
        let mut s = self.state.lock().unwrap();
        s.level = s.group.level();
        s.level_overridden = false;
    }

    // Sink

    pub fn sink(&self) -> Option<Arc<dyn Sink>> {
        self.state.lock().unwrap().sink.clone()
    }

    pub fn sink_overridden(&self) -> bool {
        self.state.lock().unwrap().sink_overridden
    }

    pub(crate) fn set_sink(&self, sink: Arc<dyn Sink>) {
        let mut s = self.state.lock().unwrap();
        s.sink = Some(sink);
        s.sink_overridden = true;
    }

    /// Copies the sink from this logger's own group, marking it
    /// not-overridden.
    pub(crate) fn reset_sink(&self) {
        let mut s = self.state.lock().unwrap();
        s.sink = s.group.sink();
        s.sink_overridden = false;
    }

    // Group

    pub fn group(&self) -> Arc<Group> {
        self.state.lock().unwrap().group.clone()
    }

    pub(crate) fn set_group(&self, group: Arc<Group>) {
        {
            let mut s = self.state.lock().unwrap();
            s.group = group;
        }
        self.reset_sink();
        self.reset_level();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NullSink;

    fn sink() -> Arc<dyn Sink> {
        Arc::new(NullSink::new())
    }

    #[test]
    fn new_logger_mirrors_group() {
        let root = Group::new("root", None, Some(sink()), Some(Level::Info));
        let logger = Logger::new("app", root);
        assert_eq!(logger.level(), Level::Info);
        assert!(!logger.level_overridden());
    }

    #[test]
    fn override_then_reset_returns_to_group_value() {
        let root = Group::new("root", None, Some(sink()), Some(Level::Info));
        let logger = Logger::new("app", root);

        logger.set_level(Level::Trace);
        assert!(logger.level_overridden());
        assert_eq!(logger.level(), Level::Trace);

        logger.reset_level();
        assert!(!logger.level_overridden());
        assert_eq!(logger.level(), Level::Info);
    }

    #[test]
    fn filtered_call_does_not_panic_without_sink() {
        let root = Group::new("root", None, None, Some(Level::Off));
        let logger = Logger::new("app", root);
        logger.info("hi", format_args!("hi"));
    }

    #[test]
    fn set_group_rederives_sink_and_level() {
        let root = Group::new("root", None, Some(sink()), Some(Level::Warning));
        let other = Group::new("other", None, Some(sink()), Some(Level::Trace));
        let logger = Logger::new("app", root);
        assert_eq!(logger.level(), Level::Warning);

        logger.set_group(other);
        assert_eq!(logger.level(), Level::Trace);
        assert!(!logger.level_overridden());
    }
}
