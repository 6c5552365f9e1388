mod console;
mod file;
mod layout;
mod multisink;
mod null;
#[cfg(unix)]
mod syslog;

pub use console::{ConsoleSink, ConsoleStream};
pub use file::FileSink;
pub use multisink::MultiSink;
pub use null::NullSink;
#[cfg(unix)]
pub use syslog::SyslogSink;

pub(crate) use layout::format_event;

use crate::event::{Event, ThreadInfoMode};
use crate::level::Level;
use soralog_ring::{Backoff, Config as RingConfig, Ring};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Everything a sink drains events to: the actual byte-writing destination.
///
/// This is the "external collaborator" the core specifies only a contract
/// for: an ordered stream of byte blobs accepted from a single writer
/// thread at a time, plus a flush primitive. `rotate` is a no-op by
/// default; only the file destination overrides it.
pub(crate) trait Destination: Send {
    /// `levels` records, in ascending order, the byte offset within `bytes`
    /// at which each formatted record begins and that record's level.
    /// Most destinations just write `bytes` and ignore it; the syslog
    /// destination uses it to log each record at its own severity even
    /// when several records are batched into one call.
    fn write_all(&mut self, bytes: &[u8], levels: &[(usize, Level)]);
    fn flush(&mut self);
    fn rotate(&mut self) {}
}

/// A sink: a named, independently configured consumer of logging events.
///
/// `Console`, `File`, and `Syslog` are all backed by [`Engine`]; `Null` and
/// `Multisink` implement this trait directly since neither owns a ring.
pub trait Sink: Send + Sync {
    /// Stable, process-unique name.
    fn name(&self) -> &str;

    /// Accepts one event on the producer path. Applies this sink's own
    /// level gate (if any) before queuing — this is the gate Multisink
    /// members apply on their own producer path, independent of whatever
    /// gate the Multisink itself or the calling Logger already applied.
    fn push(
        &self,
        logger_name: &str,
        level: Level,
        thread_mode: ThreadInfoMode,
        format_source: &str,
        args: fmt::Arguments<'_>,
    );

    /// Drains whatever is queued to the destination. Never blocks on I/O
    /// from the caller's perspective beyond what the destination itself
    /// takes for one write.
    fn flush(&self);

    /// Reopens the destination (file sinks only; a no-op for everything
    /// else, forwarded to every member for a Multisink).
    fn rotate(&self);

    /// This sink's own level filter, if configured.
    fn level(&self) -> Option<Level>;

    /// Names of this sink's direct members, if it is a [`MultiSink`].
    /// `None` for every other sink. Used by the registry to walk a
    /// multisink's membership graph for cycle detection at wiring time.
    fn member_names(&self) -> Option<Vec<String>> {
        None
    }
}

/// Configuration shared by every [`Engine`]-backed sink.
#[derive(Debug, Clone)]
pub struct SinkSettings {
    pub level: Option<Level>,
    pub thread_mode: ThreadInfoMode,
    pub capacity: usize,
    pub buffer_size: usize,
    pub max_message_len: usize,
    pub latency: Duration,
    pub with_color: bool,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            level: None,
            thread_mode: ThreadInfoMode::None,
            capacity: 64,
            buffer_size: 128 * 1024,
            max_message_len: 1024,
            latency: Duration::from_millis(200),
            with_color: false,
        }
    }
}

/// Shared producer/worker/layout machinery used by every ring-backed sink.
///
/// Owns the [`Ring`] of events, the flush re-entrancy lock (a `Mutex`
/// doubling as the test-and-set spinflag: a second concurrent caller just
/// fails to acquire it and returns immediately via `try_lock`), and the
/// background worker thread when `latency > 0`.
pub(crate) struct Engine<D: Destination + 'static> {
    name: String,
    ring: Ring<Event>,
    settings: SinkSettings,
    size: AtomicUsize,
    flush_lock: Mutex<D>,
    signal: Mutex<WorkerSignal>,
    condvar: Condvar,
    worker: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Default)]
struct WorkerSignal {
    need_to_flush: bool,
    need_to_finalize: bool,
    rotate: bool,
}

impl<D: Destination + 'static> Engine<D> {
    pub(crate) fn new(name: impl Into<String>, settings: SinkSettings, destination: D) -> Self {
        Self {
            name: name.into(),
            ring: Ring::new(RingConfig::new(settings.capacity.max(1))),
            settings,
            size: AtomicUsize::new(0),
            flush_lock: Mutex::new(destination),
            signal: Mutex::new(WorkerSignal::default()),
            condvar: Condvar::new(),
            worker: Mutex::new(None),
        }
    }

    /// Spawns the background worker if `latency > 0`; call once, right
    /// after construction, from the owning sink's `new`. Takes `self: &Arc`
    /// so the worker closure can hold a strong reference alongside the
    /// sink.
    pub(crate) fn start(self: &std::sync::Arc<Self>) {
        if self.settings.latency.is_zero() {
            return;
        }
        let engine = std::sync::Arc::clone(self);
        let handle = std::thread::Builder::new()
            .name(format!("log:{}", engine.name))
            .spawn(move || engine.run())
            .expect("failed to spawn sink worker thread");
        *self.worker.lock().unwrap() = Some(handle);
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn level(&self) -> Option<Level> {
        self.settings.level
    }

    pub(crate) fn push(
        &self,
        logger_name: &str,
        level: Level,
        thread_mode: ThreadInfoMode,
        format_source: &str,
        args: fmt::Arguments<'_>,
    ) {
        if let Some(gate) = self.settings.level {
            if level > gate {
                return;
            }
        }

        let mode = if thread_mode == ThreadInfoMode::None {
            self.settings.thread_mode
        } else {
            thread_mode
        };

        let mut backoff = Backoff::new();
        loop {
            if let Some(mut guard) = self.ring.put() {
                let event = Event::new(logger_name, level, mode, format_source, args);
                let len = event.message().len();
                guard.write(event);
                guard.commit();
                self.size.fetch_add(len, Ordering::Relaxed);
                break;
            }
            // Queue full: flush and retry, per the producer contract.
            self.async_flush();
            if backoff.is_completed() {
                self.flush();
                backoff.reset();
            } else {
                backoff.snooze();
            }
        }

        if self.size.load(Ordering::Relaxed)
            >= self.settings.buffer_size.saturating_sub(std::mem::size_of::<Event>())
        {
            self.async_flush();
        }
    }

    /// Requests a flush without blocking: signals the worker if one exists,
    /// otherwise flushes synchronously on the caller's thread.
    pub(crate) fn async_flush(&self) {
        if self.settings.latency.is_zero() {
            self.flush();
        } else {
            let mut signal = self.signal.lock().unwrap();
            signal.need_to_flush = true;
            self.condvar.notify_one();
        }
    }

    pub(crate) fn flush(&self) {
        let Ok(mut destination) = self.flush_lock.try_lock() else {
            return;
        };

        let mut buf = Vec::with_capacity(self.settings.buffer_size.min(64 * 1024));
        let mut levels: Vec<(usize, Level)> = Vec::new();
        let deadline = Instant::now() + self.settings.latency.max(Duration::from_millis(1));

        loop {
            let Some(guard) = self.ring.get() else { break };
            let event = guard.get();
            guard.release();

            levels.push((buf.len(), event.level()));
            format_event(&mut buf, &event, self.settings.thread_mode, self.settings.with_color);
            self.size.fetch_sub(event.message().len().min(
                self.size.load(Ordering::Relaxed),
            ), Ordering::Relaxed);

            let buffer_low = buf.len() + std::mem::size_of::<Event>() > self.settings.buffer_size;
            let deadline_passed = Instant::now() >= deadline;
            if buffer_low || deadline_passed {
                destination.write_all(&buf, &levels);
                buf.clear();
                levels.clear();
            }
        }

        if !buf.is_empty() {
            destination.write_all(&buf, &levels);
        }
        destination.flush();
    }

    pub(crate) fn rotate(&self) {
        let mut signal = self.signal.lock().unwrap();
        if self.settings.latency.is_zero() {
            drop(signal);
            if let Ok(mut destination) = self.flush_lock.try_lock() {
                destination.rotate();
            }
        } else {
            signal.rotate = true;
            self.condvar.notify_one();
        }
    }

    fn run(self: std::sync::Arc<Self>) {
        loop {
            {
                let signal = self.signal.lock().unwrap();
                let (signal, timeout) = self
                    .condvar
                    .wait_timeout_while(signal, self.settings.latency, |s| {
                        !s.need_to_flush && !s.need_to_finalize && !s.rotate
                    })
                    .unwrap();
                drop(signal);
                let _ = timeout;
            }

            {
                let mut signal = self.signal.lock().unwrap();
                if signal.rotate {
                    signal.rotate = false;
                    drop(signal);
                    if let Ok(mut destination) = self.flush_lock.try_lock() {
                        destination.rotate();
                    }
                }
            }

            self.flush();

            let mut signal = self.signal.lock().unwrap();
            signal.need_to_flush = false;
            let finalize = signal.need_to_finalize;
            drop(signal);

            if finalize && self.ring.is_empty() {
                return;
            }
        }
    }

    pub(crate) fn finalize(&self) {
        if self.settings.latency.is_zero() {
            self.ring.close();
            self.flush();
            return;
        }
        {
            let mut signal = self.signal.lock().unwrap();
            signal.need_to_finalize = true;
        }
        self.ring.close();
        self.condvar.notify_one();
        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}
