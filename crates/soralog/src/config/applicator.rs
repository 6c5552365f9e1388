use crate::error::ConfigureReport;
use crate::event::{Event, ThreadInfoMode};
use crate::level::Level;
use crate::sink::{ConsoleSink, ConsoleStream, FileSink, SinkSettings};
#[cfg(unix)]
use crate::sink::SyslogSink;
use crate::system::{LoggingSystem, RESERVED_NAME};
use serde_yaml_ng::Value;
use std::time::Duration;

/// Walks one parsed YAML document and wires sinks/groups into `system`,
/// accumulating `E:`/`W:` diagnostics instead of stopping at the first
/// problem. Mirrors the node-by-node walk of the format this schema comes
/// from: optional/scalar checks first, registration last.
pub(super) struct Applicator<'a> {
    system: &'a LoggingSystem,
    report: ConfigureReport,
}

impl<'a> Applicator<'a> {
    pub(super) fn new(system: &'a LoggingSystem) -> Self {
        Self {
            system,
            report: ConfigureReport::new(),
        }
    }

    pub(super) fn run(mut self, node: &Value) -> ConfigureReport {
        self.parse(node);
        self.report
    }

    fn parse(&mut self, node: &Value) {
        if !node.is_mapping() {
            self.report.error("Config is not a YAML map");
            return;
        }

        let sinks = node.get("sinks");
        let groups = node.get("groups");
        if groups.is_none() {
            self.report.error("Groups are undefined");
        }

        if let Some(mapping) = node.as_mapping() {
            for (key, _) in mapping {
                let Some(key) = key.as_str() else { continue };
                if key == "sinks" || key == "groups" {
                    continue;
                }
                self.report.warning(format!("Unknown property: {key}"));
            }
        }

        if let Some(sinks) = sinks {
            self.parse_sinks(sinks);
        }
        if let Some(groups) = groups {
            self.parse_groups(groups, None);
        }
    }

    fn parse_sinks(&mut self, sinks: &Value) {
        if sinks.is_null() {
            self.report.error("Sinks list is empty");
            return;
        }
        let Some(seq) = sinks.as_sequence() else {
            self.report.error("Sinks is not a YAML sequence");
            return;
        };
        for (i, sink) in seq.iter().enumerate() {
            if !sink.is_mapping() {
                self.report.warning(format!("Element #{i} of 'sinks' is not a YAML map"));
                continue;
            }
            self.parse_sink(i, sink);
        }
    }

    fn parse_sink(&mut self, number: usize, sink: &Value) {
        let Some(name) = sink.get("name").and_then(Value::as_str) else {
            self.report.error(format!("Not found 'name' of sink node #{number}"));
            return;
        };
        let Some(ty) = sink.get("type").and_then(Value::as_str) else {
            self.report.error(format!("Not found 'type' of sink node #{number}"));
            return;
        };
        let name = name.to_string();

        if name == RESERVED_NAME {
            self.report.error("Sink name '*' is reserved; try to use some other name");
            return;
        }

        match ty {
            "console" => self.parse_sink_console(&name, sink),
            "file" => self.parse_sink_file(&name, sink),
            "syslog" => self.parse_sink_syslog(&name, sink),
            "multisink" => self.parse_sink_multisink(&name, sink),
            other => self.report.error(format!("Unknown 'type' of sink node '{name}': {other}")),
        }
    }

    /// Parses the settings shared by every ring-backed sink, warning on any
    /// key not in `known_keys` (each concrete parser passes its own keys
    /// plus these common ones).
    fn parse_common_sink_settings(&mut self, name: &str, node: &Value, known_keys: &[&str]) -> SinkSettings {
        let mut settings = SinkSettings::default();

        if let Some(level_str) = node.get("level").and_then(Value::as_str) {
            match Level::parse(level_str) {
                Some(level) => settings.level = Some(level),
                None => self.report.error(format!("Invalid level in sink '{name}': {level_str}")),
            }
        }

        if let Some(thread_str) = node.get("thread").and_then(Value::as_str) {
            settings.thread_mode = match thread_str {
                "name" => ThreadInfoMode::Name,
                "id" => ThreadInfoMode::Id,
                "none" => ThreadInfoMode::None,
                other => {
                    self.report
                        .warning(format!("Wrong property 'thread' value of sink '{name}': {other}"));
                    ThreadInfoMode::None
                }
            };
        }

        if let Some(capacity_node) = node.get("capacity") {
            match capacity_node.as_u64() {
                Some(capacity) if capacity >= 4 => settings.capacity = capacity as usize,
                _ => self.report.warning(format!("Wrong property 'capacity' value of sink '{name}'")),
            }
        }

        if let Some(buffer_node) = node.get("buffer") {
            let min = std::mem::size_of::<Event>() * 4;
            match buffer_node.as_u64() {
                Some(buffer) if buffer as usize >= min => settings.buffer_size = buffer as usize,
                _ => self.report.warning(format!("Wrong property 'buffer' value of sink '{name}'")),
            }
        }

        if let Some(latency_node) = node.get("latency") {
            match latency_node.as_u64() {
                Some(latency) => settings.latency = Duration::from_millis(latency),
                None => self.report.warning(format!("Wrong property 'latency' value of sink '{name}'")),
            }
        }

        if let Some(color_node) = node.get("color") {
            match color_node.as_bool() {
                Some(color) => settings.with_color = color,
                None => self
                    .report
                    .warning(format!("Property 'color' of sink '{name}' is not true or false")),
            }
        }

        if let Some(mapping) = node.as_mapping() {
            for (key, _) in mapping {
                let Some(key) = key.as_str() else { continue };
                if known_keys.contains(&key) {
                    continue;
                }
                self.report.warning(format!("Unknown property of sink '{name}': {key}"));
            }
        }

        settings
    }

    fn warn_if_overriding(&mut self, name: &str) {
        if self.system.get_sink(name).is_some() {
            self.report
                .warning(format!("Already exists sink with name '{name}'; previous version will be overridden"));
        }
    }

    fn parse_sink_console(&mut self, name: &str, node: &Value) {
        let stream = match node.get("stream").and_then(Value::as_str) {
            Some("stderr") => ConsoleStream::Stderr,
            _ => ConsoleStream::Stdout,
        };
        let settings = self.parse_common_sink_settings(
            name,
            node,
            &["name", "type", "stream", "color", "thread", "capacity", "buffer", "latency", "level"],
        );

        self.warn_if_overriding(name);
        self.system.make_sink(ConsoleSink::new(name, stream, settings));
    }

    fn parse_sink_file(&mut self, name: &str, node: &Value) {
        let Some(path) = node.get("path").and_then(Value::as_str) else {
            self.report.error(format!("Not found 'path' of sink '{name}'"));
            return;
        };
        let path = path.to_string();
        let settings = self.parse_common_sink_settings(
            name,
            node,
            &["name", "type", "path", "thread", "capacity", "buffer", "latency", "level"],
        );

        self.warn_if_overriding(name);
        match FileSink::open(name, &path, settings) {
            Ok(sink) => self.system.make_sink(sink),
            Err(e) => self.report.error(format!("Can't open file sink '{name}' at '{path}': {e}")),
        }
    }

    #[cfg(unix)]
    fn parse_sink_syslog(&mut self, name: &str, node: &Value) {
        let ident = node.get("ident").and_then(Value::as_str).unwrap_or(name).to_string();
        let settings = self.parse_common_sink_settings(
            name,
            node,
            &["name", "type", "ident", "thread", "capacity", "buffer", "latency", "level"],
        );

        self.warn_if_overriding(name);
        match SyslogSink::open(name, &ident, settings) {
            Ok(sink) => self.system.make_sink(sink),
            Err(e) => self.report.error(format!("Can't open syslog sink '{name}': {e}")),
        }
    }

    #[cfg(not(unix))]
    fn parse_sink_syslog(&mut self, name: &str, _node: &Value) {
        self.report
            .error(format!("Sink '{name}' has type 'syslog', which is unavailable on this platform"));
    }

    fn parse_sink_multisink(&mut self, name: &str, node: &Value) {
        let Some(members_node) = node.get("sinks") else {
            self.report.error(format!("Not found 'sinks' of multisink '{name}'"));
            return;
        };
        let Some(seq) = members_node.as_sequence() else {
            self.report.error(format!("Property 'sinks' of multisink '{name}' is not a sequence"));
            return;
        };

        let mut member_names = Vec::with_capacity(seq.len());
        for member in seq {
            match member.as_str() {
                Some(member_name) => member_names.push(member_name.to_string()),
                None => self
                    .report
                    .warning(format!("Element of 'sinks' in multisink '{name}' is not scalar")),
            }
        }

        if let Some(mapping) = node.as_mapping() {
            for (key, _) in mapping {
                let Some(key) = key.as_str() else { continue };
                if matches!(key, "name" | "type" | "sinks") {
                    continue;
                }
                self.report.warning(format!("Unknown property of sink '{name}': {key}"));
            }
        }

        self.warn_if_overriding(name);
        if let Err(e) = self.system.make_multisink(name, &member_names) {
            self.report.error(format!("Can't build multisink '{name}': {e}"));
        }
    }

    fn parse_groups(&mut self, groups: &Value, parent: Option<&str>) {
        if groups.is_null() {
            self.report.error("Node 'groups' is empty");
            return;
        }
        let Some(seq) = groups.as_sequence() else {
            self.report.error("Node 'groups' is not a sequence");
            return;
        };
        for (i, group) in seq.iter().enumerate() {
            if !group.is_mapping() {
                self.report.error(format!("Element #{i} of 'groups' is not a map"));
                continue;
            }
            self.parse_group(i, group, parent);
        }
    }

    fn parse_group(&mut self, number: usize, node: &Value, parent: Option<&str>) {
        let name = node.get("name").and_then(Value::as_str);
        let label = name.map(|n| format!("'{n}'")).unwrap_or_else(|| format!("node #{number}"));

        let mut fail = false;

        if name.is_none() {
            self.report.error(format!("Not found 'name' of group {label}"));
            fail = true;
        }

        let mut is_fallback = false;
        if let Some(fallback_node) = node.get("is_fallback") {
            match fallback_node.as_bool() {
                Some(b) => is_fallback = b,
                None => {
                    self.report.error(format!("Property 'is_fallback' of group {label} is not scalar"));
                    fail = true;
                }
            }
        }

        let mut sink: Option<String> = None;
        if let Some(sink_node) = node.get("sink") {
            match sink_node.as_str() {
                Some(s) => {
                    if self.system.get_sink(s).is_none() {
                        self.report.error(format!("Sink '{s}' of group {label} is undefined"));
                        fail = true;
                    }
                    sink = Some(s.to_string());
                }
                None => {
                    self.report.error(format!("Property 'sink' of group {label} is not scalar"));
                    fail = true;
                }
            }
        } else if parent.is_none() {
            sink = Some(RESERVED_NAME.to_string());
        }

        let mut level_string: Option<String> = None;
        if let Some(level_node) = node.get("level") {
            match level_node.as_str() {
                Some(s) => level_string = Some(s.to_string()),
                None => {
                    self.report.error(format!("Property 'level' of group {label} is not scalar"));
                    fail = true;
                }
            }
        } else if parent.is_none() {
            self.report.error(format!("Not found 'level' of root group {label}"));
            fail = true;
        }

        let children_node = node.get("children");
        if let Some(children) = children_node {
            if !children.is_null() && !children.is_sequence() {
                self.report.error(format!("Property 'children' of group {label} is not sequence"));
                fail = true;
            }
        }

        if let Some(mapping) = node.as_mapping() {
            for (key, _) in mapping {
                let Some(key) = key.as_str() else { continue };
                if matches!(key, "name" | "is_fallback" | "sink" | "level" | "children") {
                    continue;
                }
                self.report.warning(format!("Unknown property of group {label}: {key}"));
            }
        }

        let level = level_string.as_deref().and_then(|s| {
            let parsed = Level::parse(s);
            if parsed.is_none() {
                self.report.error(format!("Invalid level in group {label}: {s}"));
            }
            parsed
        });
        if level_string.is_some() && level.is_none() {
            fail = true;
        }

        if fail {
            self.report
                .warning(format!("There are probably more bugs in the group {label}; fix the existing ones first."));
            return;
        }

        let name = name.unwrap().to_string();

        if name == RESERVED_NAME {
            self.report.error("Group name '*' is reserved; try to use some other name");
            return;
        }

        if self.system.get_group(&name).is_some() {
            if let Some(parent_name) = parent {
                self.system.set_parent_of_group(&name, parent_name);
            }
            if let Some(sink_name) = &sink {
                self.system.set_sink_of_group(&name, sink_name);
            }
            if let Some(level) = level {
                self.system.set_level_of_group(&name, level);
            }
        } else {
            self.system.make_group(&name, parent, sink.as_deref(), level);
        }

        if is_fallback {
            self.system.set_fallback_group(&name);
        }

        if let Some(children) = children_node {
            if children.is_sequence() {
                self.parse_groups(children, Some(&name));
            }
        }
    }
}
