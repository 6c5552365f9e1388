mod applicator;

use crate::error::ConfigureReport;
use crate::system::{Configurator, LoggingSystem};
use serde_yaml_ng::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

enum Source {
    Path(PathBuf),
    Text(String),
}

/// Declarative YAML configurator, per the document schema: a top-level map
/// with a `sinks` sequence and a `groups` sequence (nested via `children`).
///
/// Configurators chain: [`YamlConfigurator::chained`] applies the previous
/// configurator first, then this document, accumulating diagnostics rather
/// than stopping at the first problem either leg reports.
pub struct YamlConfigurator {
    source: Source,
    previous: Option<Arc<dyn Configurator>>,
}

impl YamlConfigurator {
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self {
            source: Source::Path(path.as_ref().to_path_buf()),
            previous: None,
        }
    }

    pub fn from_str(text: impl Into<String>) -> Self {
        Self {
            source: Source::Text(text.into()),
            previous: None,
        }
    }

    /// Runs `previous` first, then this document, on every `apply` call.
    pub fn chained(mut self, previous: Arc<dyn Configurator>) -> Self {
        self.previous = Some(previous);
        self
    }
}

impl Configurator for YamlConfigurator {
    fn apply(&self, system: &LoggingSystem) -> ConfigureReport {
        let mut report = match &self.previous {
            Some(previous) => previous.apply(system),
            None => ConfigureReport::new(),
        };

        let loaded = match &self.source {
            Source::Path(path) => std::fs::read_to_string(path)
                .map_err(|e| format!("can't read file '{}': {e}", path.display())),
            Source::Text(text) => Ok(text.clone()),
        };

        let text = match loaded {
            Ok(text) => text,
            Err(e) => {
                report.error(format!("Can't load config: {e}"));
                return report;
            }
        };

        let parsed: Result<Value, _> = serde_yaml_ng::from_str(&text);
        let node = match parsed {
            Ok(node) => node,
            Err(e) => {
                report.error(format!("Can't parse content: {e}"));
                return report;
            }
        };

        let applicator_report = applicator::Applicator::new(system).run(&node);
        report.merge(applicator_report);
        report
    }
}
