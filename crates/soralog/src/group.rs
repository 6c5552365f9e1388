use crate::level::Level;
use crate::sink::Sink;
use std::sync::{Arc, Mutex};

struct GroupState {
    parent: Option<Arc<Group>>,
    sink: Option<Arc<dyn Sink>>,
    sink_overridden: bool,
    level: Level,
    level_overridden: bool,
}

/// A node in the group inheritance forest.
///
/// Holds an effective sink and effective level plus a per-property
/// "overridden" flag. A group that does not override a property always
/// mirrors its parent's effective value for that property; a root group
/// (no parent) can never be flagged overridden, since there is nothing to
/// inherit from — its values are simply its own.
///
/// These primitive mutators are building blocks only: they do not cascade
/// to descendants or live loggers. The propagation algorithm that walks
/// the forest after a mutation lives in [`crate::LoggingSystem`], which is
/// the only thing that knows every registered group.
pub struct Group {
    name: String,
    state: Mutex<GroupState>,
}

impl Group {
    pub(crate) fn new(
        name: impl Into<String>,
        parent: Option<Arc<Group>>,
        sink: Option<Arc<dyn Sink>>,
        level: Option<Level>,
    ) -> Arc<Group> {
        let group = Arc::new(Group {
            name: name.into(),
            state: Mutex::new(GroupState {
                parent: None,
                sink: None,
                sink_overridden: false,
                level: Level::Off,
                level_overridden: false,
            }),
        });
        if let Some(parent) = parent {
            group.set_parent(Some(parent));
        }
        if let Some(sink) = sink {
            group.set_sink(sink);
        }
        if let Some(level) = level {
            group.set_level(level);
        }
        group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Level {
        self.state.lock().unwrap().level
    }

    pub fn level_overridden(&self) -> bool {
        self.state.lock().unwrap().level_overridden
    }

    pub fn sink(&self) -> Option<Arc<dyn Sink>> {
        self.state.lock().unwrap().sink.clone()
    }

    pub fn sink_overridden(&self) -> bool {
        self.state.lock().unwrap().sink_overridden
    }

    pub fn parent(&self) -> Option<Arc<Group>> {
        self.state.lock().unwrap().parent.clone()
    }

    /// Sets the level directly; marks it overridden.
    pub(crate) fn set_level(&self, level: Level) {
        let mut s = self.state.lock().unwrap();
        s.level = level;
        s.level_overridden = true;
    }

    /// Copies the level from the current parent, if any, marking it
    /// not-overridden. No-op on a root group. This is also the primitive
    /// the propagation algorithm uses to refresh a non-overriding
    /// descendant from its (already-refreshed) parent.
    pub(crate) fn reset_level(&self) {
        let parent = self.parent();
        if let Some(parent) = parent {
            let mut s = self.state.lock().unwrap();
            s.level = parent.level();
            s.level_overridden = false;
        }
    }

    /// Sets the sink directly; marks it overridden.
    pub(crate) fn set_sink(&self, sink: Arc<dyn Sink>) {
        let mut s = self.state.lock().unwrap();
        s.sink = Some(sink);
        s.sink_overridden = true;
    }

    /// Copies the sink from the current parent, if any, marking it
    /// not-overridden. No-op on a root group.
    pub(crate) fn reset_sink(&self) {
        let parent = self.parent();
        if let Some(parent) = parent {
            let sink = parent.sink();
            let mut s = self.state.lock().unwrap();
            s.sink = sink;
            s.sink_overridden = false;
        }
    }

    /// Sets (or clears) the parent link. Attaching a parent inherits both
    /// properties that aren't already locally set by this call (matching
    /// the original: attaching always re-derives sink/level from the new
    /// parent, clearing both override flags); detaching just clears both
    /// override flags and freezes the current values as this group's own.
    pub(crate) fn set_parent(&self, parent: Option<Arc<Group>>) {
        {
            let mut s = self.state.lock().unwrap();
            s.parent = parent.clone();
        }
        if parent.is_some() {
            self.reset_sink();
            self.reset_level();
        } else {
            let mut s = self.state.lock().unwrap();
            s.sink_overridden = false;
            s.level_overridden = false;
        }
    }

    /// True if `maybe_ancestor` is `self` or any transitive parent of
    /// `self`. Used by [`crate::LoggingSystem::set_parent_of_group`] for
    /// cycle prevention before a parent link is ever applied.
    pub(crate) fn descends_from(self: &Arc<Self>, maybe_ancestor: &Arc<Group>) -> bool {
        let mut current = Arc::clone(self);
        loop {
            if Arc::ptr_eq(&current, maybe_ancestor) {
                return true;
            }
            match current.parent() {
                Some(next) => current = next,
                None => return false,
            }
        }
    }
}
