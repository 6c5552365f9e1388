use super::{Destination, Engine, Sink, SinkSettings};
use crate::event::ThreadInfoMode;
use crate::level::Level;
use std::fmt;
use std::io::Write as _;
use std::sync::Arc;

/// Which standard stream a [`ConsoleSink`] writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

struct ConsoleDestination {
    stream: ConsoleStream,
}

impl Destination for ConsoleDestination {
    fn write_all(&mut self, bytes: &[u8], _levels: &[(usize, Level)]) {
        match self.stream {
            ConsoleStream::Stdout => {
                let _ = std::io::stdout().write_all(bytes);
            }
            ConsoleStream::Stderr => {
                let _ = std::io::stderr().write_all(bytes);
            }
        }
    }

    fn flush(&mut self) {
        match self.stream {
            ConsoleStream::Stdout => {
                let _ = std::io::stdout().flush();
            }
            ConsoleStream::Stderr => {
                let _ = std::io::stderr().flush();
            }
        }
    }
}

/// Terminal sink, optionally ANSI-colored. Defaults match the original:
/// 64-event ring, 128 KiB layout buffer, 200 ms flush latency.
pub struct ConsoleSink {
    engine: Arc<Engine<ConsoleDestination>>,
}

impl ConsoleSink {
    pub fn new(name: impl Into<String>, stream: ConsoleStream, settings: SinkSettings) -> Arc<Self> {
        let engine = Arc::new(Engine::new(name, settings, ConsoleDestination { stream }));
        engine.start();
        Arc::new(Self { engine })
    }
}

impl Drop for ConsoleSink {
    fn drop(&mut self) {
        self.engine.finalize();
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        self.engine.name()
    }

    fn push(
        &self,
        logger_name: &str,
        level: Level,
        thread_mode: ThreadInfoMode,
        format_source: &str,
        args: fmt::Arguments<'_>,
    ) {
        self.engine.push(logger_name, level, thread_mode, format_source, args);
    }

    fn flush(&self) {
        self.engine.flush();
    }

    fn rotate(&self) {
        // No-op for console destinations, per the core contract.
    }

    fn level(&self) -> Option<Level> {
        self.engine.level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_sink_accepts_events_without_panicking() {
        let sink = ConsoleSink::new(
            "cout",
            ConsoleStream::Stdout,
            SinkSettings {
                latency: std::time::Duration::ZERO,
                ..Default::default()
            },
        );
        sink.push("logger", Level::Info, ThreadInfoMode::None, "hi", format_args!("hi"));
        sink.flush();
    }
}
