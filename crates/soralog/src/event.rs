use crate::level::Level;
use chrono::{DateTime, Local};
use std::fmt;

/// Maximum bytes kept for a formatted message. Formatting writes directly
/// into this fixed buffer; anything past the capacity is silently
/// truncated rather than causing an allocation or an error.
pub const MESSAGE_CAPACITY: usize = 4096;
/// Maximum bytes kept for a logger name; longer names are truncated.
pub const NAME_CAPACITY: usize = 32;
/// Maximum bytes kept for a captured thread name.
pub const THREAD_NAME_CAPACITY: usize = 16;

/// How (if at all) thread identity is captured into an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadInfoMode {
    #[default]
    None,
    Id,
    Name,
}

/// A single logging event, captured in place inside a ring slot.
///
/// `Event` is `Copy` and contains no heap pointers: every field is a fixed
/// size array or a primitive, so a ring slot can be overwritten by the next
/// producer without running a destructor on the previous occupant.
#[derive(Clone, Copy)]
pub struct Event {
    timestamp: DateTime<Local>,
    thread_number: u64,
    thread_name: [u8; THREAD_NAME_CAPACITY],
    thread_name_len: u8,
    name: [u8; NAME_CAPACITY],
    name_len: u8,
    level: Level,
    message: [u8; MESSAGE_CAPACITY],
    message_len: u16,
}

/// A `fmt::Write` sink over a fixed-size byte buffer. Truncates silently on
/// overflow rather than erroring, since running out of room is not the
/// "format error" condition the layer above cares about (a failing
/// `Display`/`Debug` impl is).
struct FixedBuf<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> fmt::Write for FixedBuf<'a> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let remaining = self.buf.len() - self.len;
        let take = remaining.min(s.len());
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

fn copy_truncated(dst: &mut [u8], src: &str) -> u8 {
    let take = dst.len().min(src.len());
    dst[..take].copy_from_slice(&src.as_bytes()[..take]);
    take as u8
}

impl Event {
    /// Builds a new event, formatting `args` directly into the fixed
    /// message buffer. If formatting the arguments fails (a `Display`
    /// implementation returning an error), the event is rewritten to a
    /// synthetic `"Format error: ...; Format: ..."` message at level
    /// `ERROR` under the logger name `"Soralog"`, exactly as a malformed
    /// producer-side format is handled: emission still succeeds.
    pub fn new(
        logger_name: &str,
        level: Level,
        thread_mode: ThreadInfoMode,
        format_source: &str,
        args: fmt::Arguments<'_>,
    ) -> Self {
        let thread_number = current_thread_number();

        let mut thread_name = [0u8; THREAD_NAME_CAPACITY];
        let mut thread_name_len = 0u8;
        if thread_mode == ThreadInfoMode::Name {
            thread_name_len = copy_truncated(&mut thread_name, &current_thread_name());
        }

        let mut message = [0u8; MESSAGE_CAPACITY];
        let message_len;
        let mut name = [0u8; NAME_CAPACITY];
        let mut name_len = copy_truncated(&mut name, logger_name);
        let mut final_level = level;

        {
            let mut writer = FixedBuf {
                buf: &mut message,
                len: 0,
            };
            if fmt::Write::write_fmt(&mut writer, args).is_ok() {
                message_len = writer.len as u16;
            } else {
                let mut writer = FixedBuf {
                    buf: &mut message,
                    len: 0,
                };
                let _ = write!(
                    writer,
                    "Format error: formatting failed; Format: {format_source}"
                );
                message_len = writer.len as u16;
                final_level = Level::Error;
                name_len = copy_truncated(&mut name, "Soralog");
            }
        }

        Self {
            timestamp: Local::now(),
            thread_number,
            thread_name,
            thread_name_len,
            name,
            name_len,
            level: final_level,
            message,
            message_len,
        }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn thread_number(&self) -> u64 {
        self.thread_number
    }

    pub fn thread_name(&self) -> &str {
        // Safety/invariant: only ever filled from a valid &str via copy_truncated.
        std::str::from_utf8(&self.thread_name[..self.thread_name_len as usize]).unwrap_or("")
    }

    pub fn name(&self) -> &str {
        std::str::from_utf8(&self.name[..self.name_len as usize]).unwrap_or("")
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        std::str::from_utf8(&self.message[..self.message_len as usize]).unwrap_or("")
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

static THREAD_COUNTER: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static THREAD_NUMBER: u64 = THREAD_COUNTER.fetch_add(1, Ordering::Relaxed);
}

/// Per-process monotonically increasing integer, assigned on first use per
/// thread.
fn current_thread_number() -> u64 {
    THREAD_NUMBER.with(|n| *n)
}

fn current_thread_name() -> String {
    std::thread::current()
        .name()
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_event_fields() {
        let event = Event::new(
            "my.logger",
            Level::Info,
            ThreadInfoMode::None,
            "Hello {}",
            format_args!("Hello {}", "world"),
        );
        assert_eq!(event.name(), "my.logger");
        assert_eq!(event.level(), Level::Info);
        assert_eq!(event.message(), "Hello world");
    }

    #[test]
    fn long_name_is_truncated() {
        let long_name = "x".repeat(64);
        let event = Event::new(
            &long_name,
            Level::Debug,
            ThreadInfoMode::None,
            "",
            format_args!(""),
        );
        assert_eq!(event.name().len(), NAME_CAPACITY);
    }

    #[test]
    fn message_overflow_is_truncated_not_errored() {
        let long = "y".repeat(MESSAGE_CAPACITY * 2);
        let event = Event::new(
            "n",
            Level::Trace,
            ThreadInfoMode::None,
            "{}",
            format_args!("{}", long),
        );
        assert_eq!(event.message().len(), MESSAGE_CAPACITY);
    }

    #[test]
    fn format_error_rewrites_event() {
        struct Boom;
        impl fmt::Display for Boom {
            fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
                Err(fmt::Error)
            }
        }
        let event = Event::new(
            "my.logger",
            Level::Info,
            ThreadInfoMode::None,
            "{}",
            format_args!("{}", Boom),
        );
        assert_eq!(event.name(), "Soralog");
        assert_eq!(event.level(), Level::Error);
        assert!(event.message().starts_with("Format error:"));
    }

    #[test]
    fn thread_numbers_increase_monotonically_per_thread() {
        let a = current_thread_number();
        let b = current_thread_number();
        assert_eq!(a, b);
    }
}
