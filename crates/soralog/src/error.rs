use thiserror::Error;

/// Programmer-error taxonomy surfaced synchronously to the caller.
///
/// These are the conditions the system treats as caller mistakes rather
/// than runtime events: calling `configure` twice, wiring a cycle, asking
/// for a sink that was never registered, and the like. None of these are
/// raised from the producer emit path, which is infallible by contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SystemError {
    /// `configure()` was already called successfully once.
    #[error("logging system is already configured")]
    AlreadyConfigured,
    /// An operation that requires configuration was called before `configure()`.
    #[error("logging system is not yet configured")]
    NotYetConfigured,
    /// `setParent` would have introduced a cycle in the group tree.
    #[error("cycle detected in group parent chain")]
    CycleDetected,
    /// A second syslog sink was constructed; only one may exist per process.
    #[error("a syslog sink is already open for this process")]
    SyslogAlreadyOpen,
    /// A sink name was referenced that is not registered.
    #[error("unknown sink: {0}")]
    UnknownSink(String),
}

/// Aggregated outcome of applying a chain of configurators.
///
/// Configuration never short-circuits on the first problem: every
/// configurator in the chain runs, and diagnostics accumulate into this
/// report's `message` as `E:`/`W:`/`I:`-prefixed lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigureReport {
    pub has_error: bool,
    pub has_warning: bool,
    pub message: String,
}

impl ConfigureReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, text: impl AsRef<str>) {
        self.has_error = true;
        self.push_line("E:", text.as_ref());
    }

    pub fn warning(&mut self, text: impl AsRef<str>) {
        self.has_warning = true;
        self.push_line("W:", text.as_ref());
    }

    pub fn info(&mut self, text: impl AsRef<str>) {
        self.push_line("I:", text.as_ref());
    }

    fn push_line(&mut self, prefix: &str, text: &str) {
        if !self.message.is_empty() {
            self.message.push('\n');
        }
        self.message.push_str(prefix);
        self.message.push(' ');
        self.message.push_str(text);
    }

    /// Merges diagnostics from another report into this one, preserving
    /// ordering and the `has_error`/`has_warning` flags of both.
    pub fn merge(&mut self, other: ConfigureReport) {
        self.has_error |= other.has_error;
        self.has_warning |= other.has_warning;
        if !other.message.is_empty() {
            if !self.message.is_empty() {
                self.message.push('\n');
            }
            self.message.push_str(&other.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accumulates_in_order() {
        let mut report = ConfigureReport::new();
        report.info("starting");
        report.warning("unknown key 'foo'");
        report.error("unknown sink type 'bogus'");

        assert!(report.has_error);
        assert!(report.has_warning);
        assert_eq!(
            report.message,
            "I: starting\nW: unknown key 'foo'\nE: unknown sink type 'bogus'"
        );
    }

    #[test]
    fn merge_combines_flags_and_messages() {
        let mut a = ConfigureReport::new();
        a.info("first");
        let mut b = ConfigureReport::new();
        b.error("second");

        a.merge(b);
        assert!(a.has_error);
        assert_eq!(a.message, "I: first\nE: second");
    }
}
