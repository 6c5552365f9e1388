//! Structured, asynchronous, multi-sink logging system.
//!
//! A [`Logger`] is a cheap handle bound to a [`Group`] in an inheritance
//! tree; groups resolve their effective sink and level from their parent
//! unless explicitly overridden. Events accepted by a sink are handed to a
//! lock-free ring and drained by a background worker, so the calling
//! thread never blocks on I/O. [`LoggingSystem`] is the process-wide
//! registry that ties sinks, groups, and loggers together and applies a
//! [`Configurator`] (see [`YamlConfigurator`] for the declarative form).

mod config;
mod error;
mod event;
mod group;
mod level;
mod logger;
mod macros;
mod sink;
mod system;

pub use config::YamlConfigurator;
pub use error::{ConfigureReport, SystemError};
pub use event::{Event, ThreadInfoMode, MESSAGE_CAPACITY, NAME_CAPACITY, THREAD_NAME_CAPACITY};
pub use group::Group;
pub use level::Level;
pub use logger::Logger;
pub use sink::{ConsoleSink, ConsoleStream, FileSink, MultiSink, NullSink, Sink, SinkSettings};
#[cfg(unix)]
pub use sink::SyslogSink;
pub use system::{Configurator, LoggingSystem, RESERVED_NAME};
