use super::Sink;
use crate::event::ThreadInfoMode;
use crate::level::Level;
use std::fmt;
use std::sync::Arc;

/// Fan-out sink: forwards every event to each member's own `push` in
/// registration order. Owns no ring and no worker — there is nothing for
/// *this* sink to flush but the members themselves.
///
/// Level gating for members happens inside each member's own `push`, not
/// here: a Multisink never filters on behalf of its members.
pub struct MultiSink {
    name: String,
    members: Vec<Arc<dyn Sink>>,
}

impl MultiSink {
    /// Builds a Multisink. Cycle detection (this sink directly or
    /// transitively containing itself) is the registry's responsibility at
    /// wiring time, since only the registry knows every sink by name.
    pub fn new(name: impl Into<String>, members: Vec<Arc<dyn Sink>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            members,
        })
    }

    pub fn member_names(&self) -> Vec<String> {
        self.members.iter().map(|s| s.name().to_string()).collect()
    }
}

impl Sink for MultiSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn push(
        &self,
        logger_name: &str,
        level: Level,
        thread_mode: ThreadInfoMode,
        format_source: &str,
        args: fmt::Arguments<'_>,
    ) {
        for member in &self.members {
            member.push(logger_name, level, thread_mode, format_source, args);
        }
    }

    fn flush(&self) {
        for member in &self.members {
            member.flush();
        }
    }

    fn rotate(&self) {
        for member in &self.members {
            member.rotate();
        }
    }

    fn level(&self) -> Option<Level> {
        None
    }

    fn member_names(&self) -> Option<Vec<String>> {
        Some(self.member_names())
    }
}
