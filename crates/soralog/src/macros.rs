//! Level-gated logging macros.
//!
//! [`crate::Logger`]'s emit methods (`trace`, `info`, ...) take already-built
//! [`std::fmt::Arguments`], so by the time one is called the caller has
//! already paid for formatting even if the logger goes on to drop the
//! event. These macros check the logger's own level first and only expand
//! to a call (and therefore only evaluate the format arguments) when the
//! event would actually be emitted.

/// Logs at [`crate::Level::Trace`] if `$logger`'s level permits it.
#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        if $logger.level() >= $crate::Level::Trace {
            $logger.trace($fmt, format_args!($fmt $(, $arg)*));
        }
    };
}

/// Logs at [`crate::Level::Debug`] if `$logger`'s level permits it.
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        if $logger.level() >= $crate::Level::Debug {
            $logger.debug($fmt, format_args!($fmt $(, $arg)*));
        }
    };
}

/// Logs at [`crate::Level::Verbose`] if `$logger`'s level permits it.
#[macro_export]
macro_rules! log_verbose {
    ($logger:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        if $logger.level() >= $crate::Level::Verbose {
            $logger.verbose($fmt, format_args!($fmt $(, $arg)*));
        }
    };
}

/// Logs at [`crate::Level::Info`] if `$logger`'s level permits it.
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        if $logger.level() >= $crate::Level::Info {
            $logger.info($fmt, format_args!($fmt $(, $arg)*));
        }
    };
}

/// Logs at [`crate::Level::Warning`] if `$logger`'s level permits it.
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        if $logger.level() >= $crate::Level::Warning {
            $logger.warn($fmt, format_args!($fmt $(, $arg)*));
        }
    };
}

/// Logs at [`crate::Level::Error`] if `$logger`'s level permits it.
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        if $logger.level() >= $crate::Level::Error {
            $logger.error($fmt, format_args!($fmt $(, $arg)*));
        }
    };
}

/// Logs at [`crate::Level::Critical`] if `$logger`'s level permits it.
#[macro_export]
macro_rules! log_critical {
    ($logger:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        if $logger.level() >= $crate::Level::Critical {
            $logger.critical($fmt, format_args!($fmt $(, $arg)*));
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{Group, Level, Logger};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn gated_macro_skips_argument_evaluation_below_threshold() {
        let root = Group::new("root", None, None, Some(Level::Warning));
        let logger = Logger::new("app", root);

        let calls = AtomicUsize::new(0);
        let expensive = || {
            calls.fetch_add(1, Ordering::Relaxed);
            "computed"
        };

        log_debug!(logger, "{}", expensive());
        assert_eq!(calls.load(Ordering::Relaxed), 0);

        log_warn!(logger, "{}", expensive());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn no_argument_form_compiles() {
        let root = Group::new("root", None, None, Some(Level::Trace));
        let logger = Logger::new("app", root);
        log_info!(logger, "no args here");
    }
}
