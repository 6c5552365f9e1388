use crate::error::{ConfigureReport, SystemError};
use crate::group::Group;
use crate::level::Level;
use crate::logger::Logger;
use crate::sink::{MultiSink, NullSink, Sink};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Weak};

/// Reserved name for the built-in discard sink and the implicit fallback
/// group slot. Never a legal name for a user-defined sink or group.
pub const RESERVED_NAME: &str = "*";

/// Applies a declarative configuration to a [`LoggingSystem`], reporting
/// diagnostics rather than failing outright.
///
/// Implemented by the YAML-driven configurator in [`crate::config`]; kept
/// as a trait so `LoggingSystem::new` doesn't depend on the YAML format
/// directly, the way the original keeps `Configurator` abstract.
pub trait Configurator: Send + Sync {
    fn apply(&self, system: &LoggingSystem) -> ConfigureReport;
}

struct Registry {
    is_configured: bool,
    sinks: HashMap<String, Arc<dyn Sink>>,
    groups: HashMap<String, Arc<Group>>,
    loggers: HashMap<String, Weak<Logger>>,
}

/// The registry: every sink, group, and live logger in the process, plus
/// the staged-propagation mutators that keep the group inheritance tree
/// and its loggers consistent after a structural change.
///
/// A single mutex covers all three maps, matching the original: the
/// producer (emit) path never touches this lock, only registration and
/// reconfiguration do.
pub struct LoggingSystem {
    configurator: Box<dyn Configurator>,
    registry: Mutex<Registry>,
}

impl LoggingSystem {
    pub fn new(configurator: Box<dyn Configurator>) -> Arc<Self> {
        let system = Arc::new(Self {
            configurator,
            registry: Mutex::new(Registry {
                is_configured: false,
                sinks: HashMap::new(),
                groups: HashMap::new(),
                loggers: HashMap::new(),
            }),
        });
        system.register_sink(Arc::new(NullSink::new()));
        system
    }

    fn register_sink(&self, sink: Arc<dyn Sink>) {
        let mut r = self.registry.lock().unwrap();
        r.sinks.insert(sink.name().to_string(), sink);
    }

    /// Registers a ready-made sink under its own name, overwriting any
    /// existing entry of the same name.
    pub fn make_sink(&self, sink: Arc<dyn Sink>) {
        self.register_sink(sink);
    }

    /// Builds and registers a [`MultiSink`] over already-registered members,
    /// rejecting direct or transitive self-containment.
    pub fn make_multisink(
        &self,
        name: impl Into<String>,
        member_names: &[String],
    ) -> Result<Arc<MultiSink>, SystemError> {
        let name = name.into();
        let mut members = Vec::with_capacity(member_names.len());
        for member_name in member_names {
            if member_name == &name {
                return Err(SystemError::CycleDetected);
            }
            let member = self
                .get_sink(member_name)
                .ok_or_else(|| SystemError::UnknownSink(member_name.clone()))?;
            self.check_no_cycle_through(&name, &member)?;
            members.push(member);
        }
        let multi = MultiSink::new(name, members);
        self.register_sink(Arc::clone(&multi) as Arc<dyn Sink>);
        Ok(multi)
    }

    fn check_no_cycle_through(&self, root_name: &str, start: &Arc<dyn Sink>) -> Result<(), SystemError> {
        let mut stack = vec![Arc::clone(start)];
        let mut seen = HashSet::new();
        while let Some(sink) = stack.pop() {
            if sink.name() == root_name {
                return Err(SystemError::CycleDetected);
            }
            if !seen.insert(sink.name().to_string()) {
                continue;
            }
            if let Some(members) = sink.member_names() {
                for member_name in members {
                    if let Some(member) = self.get_sink(&member_name) {
                        stack.push(member);
                    }
                }
            }
        }
        Ok(())
    }

    /// Builds and registers a group, resolving `parent`/`sink` by name. The
    /// very first group ever registered also becomes the fallback group,
    /// mirroring the original's implicit default.
    pub fn make_group(
        &self,
        name: impl Into<String>,
        parent: Option<&str>,
        sink: Option<&str>,
        level: Option<Level>,
    ) -> Arc<Group> {
        let name = name.into();
        let parent_group = parent.and_then(|p| self.get_group(p));
        let sink = sink.and_then(|s| self.get_sink(s));
        let group = Group::new(name.clone(), parent_group, sink, level);

        let mut r = self.registry.lock().unwrap();
        if !r.groups.contains_key(RESERVED_NAME) {
            r.groups.insert(RESERVED_NAME.to_string(), Arc::clone(&group));
        }
        r.groups.insert(name, Arc::clone(&group));
        group
    }

    pub fn set_fallback_group(&self, group_name: &str) -> bool {
        let mut r = self.registry.lock().unwrap();
        let Some(group) = r.groups.get(group_name).cloned() else {
            return false;
        };
        r.groups.insert(RESERVED_NAME.to_string(), group);
        true
    }

    pub fn get_fallback_group(&self) -> Option<Arc<Group>> {
        self.registry.lock().unwrap().groups.get(RESERVED_NAME).cloned()
    }

    pub fn get_sink(&self, name: &str) -> Option<Arc<dyn Sink>> {
        self.registry.lock().unwrap().sinks.get(name).cloned()
    }

    pub fn get_group(&self, name: &str) -> Option<Arc<Group>> {
        self.registry.lock().unwrap().groups.get(name).cloned()
    }

    pub fn call_rotate_for_all_sinks(&self) {
        let sinks: Vec<Arc<dyn Sink>> = self.registry.lock().unwrap().sinks.values().cloned().collect();
        for sink in sinks {
            sink.rotate();
        }
    }

    /// Runs the configurator exactly once. Returns
    /// [`SystemError::AlreadyConfigured`] on a second call instead of the
    /// original's hard precondition violation — calling twice is still a
    /// programmer error, just one surfaced as a `Result`.
    pub fn configure(self: &Arc<Self>) -> Result<ConfigureReport, SystemError> {
        {
            let mut r = self.registry.lock().unwrap();
            if r.is_configured {
                return Err(SystemError::AlreadyConfigured);
            }
            r.is_configured = true;
        }

        let mut report = self.configurator.apply(self);

        let r = self.registry.lock().unwrap();
        if r.groups.is_empty() {
            report.error("No one group is defined; logging system is unworkable");
            return Ok(report);
        }
        for (name, group) in r.groups.iter() {
            if name == RESERVED_NAME {
                continue;
            }
            let has_real_sink = group.sink().map(|s| s.name() != RESERVED_NAME).unwrap_or(false);
            if !has_real_sink {
                report.warning(format!(
                    "Group '{name}' has undefined sink; sink to nowhere will be used"
                ));
            }
        }
        Ok(report)
    }

    /// Resolves (or creates) the logger `logger_name`. Unknown or
    /// reserved-name groups fall back to the fallback group, with a
    /// warning emitted through a throwaway "Soralog" logger rather than
    /// the original's debug-build assertion — calling with group `"*"` is
    /// a deprecated compatibility path, not a crash.
    pub fn get_logger(
        self: &Arc<Self>,
        logger_name: impl Into<String>,
        group_name: &str,
        sink_name: Option<&str>,
        level: Option<Level>,
    ) -> Result<Arc<Logger>, SystemError> {
        let logger_name = logger_name.into();
        let mut r = self.registry.lock().unwrap();
        if !r.is_configured {
            return Err(SystemError::NotYetConfigured);
        }

        if let Some(existing) = r.loggers.get(&logger_name).and_then(Weak::upgrade) {
            return Ok(existing);
        }

        fn fallback_group(r: &Registry) -> Arc<Group> {
            r.groups
                .get(RESERVED_NAME)
                .cloned()
                .expect("fallback group is always present once configured")
        }

        let group = if group_name == RESERVED_NAME {
            let fallback = fallback_group(&r);
            let notice = Logger::new("Soralog", Arc::clone(&fallback));
            notice.warn(
                "deprecated fallback group lookup",
                format_args!(
                    "Default group (calling with name '*') is deprecated and should not \
                     be used anymore; define an existing group explicitly"
                ),
            );
            fallback
        } else if let Some(found) = r.groups.get(group_name).cloned() {
            found
        } else {
            let fallback = fallback_group(&r);
            let notice = Logger::new("Soralog", Arc::clone(&fallback));
            notice.warn(
                "unknown group, fallback used",
                format_args!(
                    "Group '{group_name}' for logger '{logger_name}' is not found. \
                     Fallback group will be used (it is group '{}' right now).",
                    fallback.name()
                ),
            );
            fallback
        };

        let logger = Logger::new(logger_name.clone(), group);
        if let Some(sink_name) = sink_name {
            if let Some(sink) = r.sinks.get(sink_name).cloned() {
                logger.set_sink(sink);
            }
        }
        if let Some(level) = level {
            logger.set_level(level);
        }

        r.loggers.insert(logger_name, Arc::downgrade(&logger));
        Ok(logger)
    }

    // --- Group parent, by name, with cycle rejection ---

    pub fn set_parent_of_group(&self, group_name: &str, parent_name: &str) -> bool {
        let (group, parent) = {
            let r = self.registry.lock().unwrap();
            let Some(group) = r.groups.get(group_name).cloned() else {
                return false;
            };
            let Some(parent) = r.groups.get(parent_name).cloned() else {
                return false;
            };
            (group, parent)
        };

        // A cycle anywhere above the immediate reverse link is rejected;
        // the immediate case (parent is currently a direct child of group)
        // is allowed and untangled by `apply_parent_change`'s own swap.
        let immediate_reverse = parent.parent().map_or(false, |gp| Arc::ptr_eq(&gp, &group));
        if !immediate_reverse {
            let mut current = parent.parent();
            while let Some(c) = current {
                if Arc::ptr_eq(&c, &group) {
                    return false;
                }
                current = c.parent();
            }
        }

        self.apply_parent_change(&group, Some(parent));
        true
    }

    pub fn unset_parent_of_group(&self, group_name: &str) -> bool {
        let Some(group) = self.get_group(group_name) else {
            return false;
        };
        self.apply_parent_change(&group, None);
        true
    }

    fn apply_parent_change(&self, group: &Arc<Group>, parent: Option<Arc<Group>>) {
        if let Some(new_parent) = &parent {
            if let Some(grandparent) = new_parent.parent() {
                if Arc::ptr_eq(&grandparent, group) {
                    new_parent.set_parent(None);
                }
            }
        }
        group.set_parent(parent);

        let groups: Vec<Arc<Group>> = self.registry.lock().unwrap().groups.values().cloned().collect();

        fn distance(
            current: &Arc<Group>,
            target: &Arc<Group>,
            passed: &mut HashMap<*const Group, i32>,
            stages: &mut Vec<Vec<Arc<Group>>>,
        ) -> i32 {
            let key = Arc::as_ptr(current);
            if let Some(&d) = passed.get(&key) {
                return d;
            }
            let result = if Arc::ptr_eq(current, target) {
                0
            } else if current.level_overridden() && current.sink_overridden() {
                -1
            } else if let Some(parent) = current.parent() {
                let n = distance(&parent, target, passed, stages);
                if n == -1 {
                    -1
                } else {
                    let stage = n + 1;
                    if stages.len() <= stage as usize {
                        stages.resize(stage as usize + 1, Vec::new());
                    }
                    stages[stage as usize].push(Arc::clone(current));
                    stage
                }
            } else {
                -1
            };
            passed.insert(key, result);
            result
        }

        let mut passed = HashMap::new();
        let mut stages: Vec<Vec<Arc<Group>>> = Vec::new();
        let mut distances = HashMap::new();
        for g in &groups {
            let d = distance(g, group, &mut passed, &mut stages);
            distances.insert(Arc::as_ptr(g), d);
        }

        for stage in stages {
            for changing in stage {
                let current_parent = changing.parent();
                changing.set_parent(current_parent);
            }
        }

        self.refresh_loggers(|logger| {
            let group = logger.group();
            if distances.get(&Arc::as_ptr(&group)).copied().unwrap_or(-1) != -1 {
                logger.set_group(group);
            }
        });
    }

    // --- Group sink ---

    pub fn set_sink_of_group(&self, group_name: &str, sink_name: &str) -> bool {
        let Some(sink) = self.get_sink(sink_name) else {
            return false;
        };
        let Some(group) = self.get_group(group_name) else {
            return false;
        };
        self.apply_sink_change(&group, Some(sink));
        true
    }

    pub fn reset_sink_of_group(&self, group_name: &str) -> bool {
        let Some(group) = self.get_group(group_name) else {
            return false;
        };
        self.apply_sink_change(&group, None);
        true
    }

    fn apply_sink_change(&self, group: &Arc<Group>, sink: Option<Arc<dyn Sink>>) {
        match sink {
            Some(sink) => group.set_sink(sink),
            None => group.reset_sink(),
        }

        let groups: Vec<Arc<Group>> = self.registry.lock().unwrap().groups.values().cloned().collect();

        fn distance(
            current: &Arc<Group>,
            target: &Arc<Group>,
            passed: &mut HashMap<*const Group, i32>,
            stages: &mut Vec<Vec<Arc<Group>>>,
        ) -> i32 {
            let key = Arc::as_ptr(current);
            if let Some(&d) = passed.get(&key) {
                return d;
            }
            let result = if Arc::ptr_eq(current, target) {
                0
            } else if current.sink_overridden() {
                -1
            } else if let Some(parent) = current.parent() {
                let n = distance(&parent, target, passed, stages);
                if n == -1 {
                    -1
                } else {
                    let stage = n + 1;
                    if stages.len() <= stage as usize {
                        stages.resize(stage as usize + 1, Vec::new());
                    }
                    stages[stage as usize].push(Arc::clone(current));
                    stage
                }
            } else {
                -1
            };
            passed.insert(key, result);
            result
        }

        let mut passed = HashMap::new();
        let mut stages: Vec<Vec<Arc<Group>>> = Vec::new();
        let mut distances = HashMap::new();
        for g in &groups {
            let d = distance(g, group, &mut passed, &mut stages);
            distances.insert(Arc::as_ptr(g), d);
        }

        for stage in stages {
            for changing in stage {
                changing.reset_sink();
            }
        }

        self.refresh_loggers(|logger| {
            if logger.sink_overridden() {
                return;
            }
            let group = logger.group();
            if distances.get(&Arc::as_ptr(&group)).copied().unwrap_or(-1) != -1 {
                logger.reset_sink();
            }
        });
    }

    // --- Group level ---

    pub fn set_level_of_group(&self, group_name: &str, level: Level) -> bool {
        let Some(group) = self.get_group(group_name) else {
            return false;
        };
        self.apply_level_change(&group, Some(level));
        true
    }

    pub fn reset_level_of_group(&self, group_name: &str) -> bool {
        let Some(group) = self.get_group(group_name) else {
            return false;
        };
        self.apply_level_change(&group, None);
        true
    }

    fn apply_level_change(&self, group: &Arc<Group>, level: Option<Level>) {
        match level {
            Some(level) => group.set_level(level),
            None => group.reset_level(),
        }

        let groups: Vec<Arc<Group>> = self.registry.lock().unwrap().groups.values().cloned().collect();

        fn distance(
            current: &Arc<Group>,
            target: &Arc<Group>,
            passed: &mut HashMap<*const Group, i32>,
            stages: &mut Vec<Vec<Arc<Group>>>,
        ) -> i32 {
            let key = Arc::as_ptr(current);
            if let Some(&d) = passed.get(&key) {
                return d;
            }
            let result = if Arc::ptr_eq(current, target) {
                0
            } else if current.level_overridden() {
                -1
            } else if let Some(parent) = current.parent() {
                let n = distance(&parent, target, passed, stages);
                if n == -1 {
                    -1
                } else {
                    let stage = n + 1;
                    if stages.len() <= stage as usize {
                        stages.resize(stage as usize + 1, Vec::new());
                    }
                    stages[stage as usize].push(Arc::clone(current));
                    stage
                }
            } else {
                -1
            };
            passed.insert(key, result);
            result
        }

        let mut passed = HashMap::new();
        let mut stages: Vec<Vec<Arc<Group>>> = Vec::new();
        let mut distances = HashMap::new();
        for g in &groups {
            let d = distance(g, group, &mut passed, &mut stages);
            distances.insert(Arc::as_ptr(g), d);
        }

        for stage in stages {
            for changing in stage {
                changing.reset_level();
            }
        }

        self.refresh_loggers(|logger| {
            if logger.level_overridden() {
                return;
            }
            let group = logger.group();
            if distances.get(&Arc::as_ptr(&group)).copied().unwrap_or(-1) != -1 {
                logger.reset_level();
            }
        });
    }

    /// Upgrades every registered weak logger reference, pruning dead
    /// entries, and invokes `f` on each live one. Shared by the three
    /// propagation mutators above.
    fn refresh_loggers(&self, f: impl Fn(&Arc<Logger>)) {
        let mut r = self.registry.lock().unwrap();
        r.loggers.retain(|_, weak| weak.upgrade().is_some());
        let loggers: Vec<Arc<Logger>> = r.loggers.values().filter_map(Weak::upgrade).collect();
        drop(r);
        for logger in loggers {
            f(&logger);
        }
    }

    // --- Logger group/sink/level ---

    pub fn set_group_of_logger(&self, logger_name: &str, group_name: &str) -> bool {
        let Some(group) = self.get_group(group_name) else {
            return false;
        };
        let Some(logger) = self.live_logger(logger_name) else {
            return false;
        };
        logger.set_group(group);
        true
    }

    pub fn set_sink_of_logger(&self, logger_name: &str, sink_name: &str) -> bool {
        let Some(sink) = self.get_sink(sink_name) else {
            return false;
        };
        let Some(logger) = self.live_logger(logger_name) else {
            return false;
        };
        logger.set_sink(sink);
        true
    }

    pub fn reset_sink_of_logger(&self, logger_name: &str) -> bool {
        let Some(logger) = self.live_logger(logger_name) else {
            return false;
        };
        logger.reset_sink();
        true
    }

    pub fn set_level_of_logger(&self, logger_name: &str, level: Level) -> bool {
        let Some(logger) = self.live_logger(logger_name) else {
            return false;
        };
        logger.set_level(level);
        true
    }

    pub fn reset_level_of_logger(&self, logger_name: &str) -> bool {
        let Some(logger) = self.live_logger(logger_name) else {
            return false;
        };
        logger.reset_level();
        true
    }

    fn live_logger(&self, logger_name: &str) -> Option<Arc<Logger>> {
        let mut r = self.registry.lock().unwrap();
        match r.loggers.get(logger_name).and_then(Weak::upgrade) {
            Some(logger) => Some(logger),
            None => {
                r.loggers.remove(logger_name);
                None
            }
        }
    }
}
