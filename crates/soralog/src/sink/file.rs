use super::{Destination, Engine, Sink, SinkSettings};
use crate::event::ThreadInfoMode;
use crate::level::Level;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

struct FileDestination {
    path: PathBuf,
    handle: File,
}

impl FileDestination {
    fn open(path: PathBuf) -> std::io::Result<Self> {
        let handle = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, handle })
    }
}

impl Destination for FileDestination {
    fn write_all(&mut self, bytes: &[u8], _levels: &[(usize, Level)]) {
        let _ = self.handle.write_all(bytes);
    }

    fn flush(&mut self) {
        let _ = self.handle.flush();
    }

    fn rotate(&mut self) {
        // Reopen in append mode; the old descriptor is closed as a side
        // effect of replacing `handle` (any externally-renamed file keeps
        // its existing fd and contents; a fresh path is created here).
        if let Ok(reopened) = OpenOptions::new().create(true).append(true).open(&self.path) {
            self.handle = reopened;
        }
    }
}

/// Append-only file sink with rotate-on-signal support.
///
/// Defaults match the original: 2048-event ring, 4 MiB layout buffer.
pub struct FileSink {
    engine: Arc<Engine<FileDestination>>,
}

impl FileSink {
    pub fn open(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        settings: SinkSettings,
    ) -> std::io::Result<Arc<Self>> {
        let destination = FileDestination::open(path.into())?;
        let engine = Arc::new(Engine::new(name, settings, destination));
        engine.start();
        Ok(Arc::new(Self { engine }))
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        self.engine.finalize();
    }
}

impl Sink for FileSink {
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
        self.engine.rotate();
    }

    fn level(&self) -> Option<Level> {
        self.engine.level()
    }
}
