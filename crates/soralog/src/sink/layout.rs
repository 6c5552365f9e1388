use crate::event::{Event, ThreadInfoMode};
use crate::level::Level;
use std::fmt::Write as _;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const ITALIC: &str = "\x1b[3m";

fn level_color(level: Level) -> &'static str {
    match level {
        Level::Off => "\x1b[38;5;94m",
        Level::Critical => "\x1b[31m",
        Level::Error => "\x1b[38;5;202m",
        Level::Warning => "\x1b[38;5;208m",
        Level::Info => "\x1b[38;5;22m",
        Level::Verbose => "\x1b[38;5;28m",
        Level::Debug => "\x1b[38;5;19m",
        Level::Trace => "\x1b[90m",
    }
}

/// Renders one event into `buf` using the stable layout:
/// `YY.MM.DD HH:MM:SS.uuuuuu␣␣[thread␣␣]LEVEL␣␣␣␣NAME␣␣MESSAGE\n`
///
/// Byte-for-byte stable when `with_color` is false and `thread_mode` is
/// `None` — test suites rely on that exact shape.
pub(crate) fn format_event(
    buf: &mut Vec<u8>,
    event: &Event,
    thread_mode: ThreadInfoMode,
    with_color: bool,
) {
    let ts = event.timestamp();
    let _ = write!(buf_writer(buf), "{}", ts.format("%y.%m.%d %H:%M:%S"));

    if with_color {
        buf.extend_from_slice(b"\x1b[90m");
    }
    let _ = write!(buf_writer(buf), ".{:06}", ts.timestamp_subsec_micros());
    if with_color {
        buf.extend_from_slice(RESET.as_bytes());
    }

    buf.extend_from_slice(b"  ");

    match thread_mode {
        ThreadInfoMode::Name => {
            put_padded(buf, event.thread_name(), 15);
            buf.extend_from_slice(b"  ");
        }
        ThreadInfoMode::Id => {
            let _ = write!(buf_writer(buf), "T:{:<6}", event.thread_number());
            buf.extend_from_slice(b"  ");
        }
        ThreadInfoMode::None => {}
    }

    if with_color {
        buf.extend_from_slice(level_color(event.level()).as_bytes());
        buf.extend_from_slice(BOLD.as_bytes());
    }
    put_level(buf, event.level());
    if with_color {
        buf.extend_from_slice(RESET.as_bytes());
    }
    buf.extend_from_slice(b"  ");

    if with_color {
        buf.extend_from_slice(BOLD.as_bytes());
    }
    buf.extend_from_slice(event.name().as_bytes());
    if with_color {
        buf.extend_from_slice(RESET.as_bytes());
    }
    buf.extend_from_slice(b"  ");

    if with_color {
        if event.level() <= Level::Error {
            buf.extend_from_slice(BOLD.as_bytes());
        } else if event.level() >= Level::Debug {
            buf.extend_from_slice(ITALIC.as_bytes());
        }
    }
    buf.extend_from_slice(event.message().as_bytes());
    if with_color {
        buf.extend_from_slice(RESET.as_bytes());
    }

    buf.push(b'\n');
}

/// Wraps a `Vec<u8>` so `write!` can target it directly.
struct VecWriter<'a>(&'a mut Vec<u8>);

impl std::fmt::Write for VecWriter<'_> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.0.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

fn buf_writer(buf: &mut Vec<u8>) -> VecWriter<'_> {
    VecWriter(buf)
}

fn put_level(buf: &mut Vec<u8>, level: Level) {
    put_padded(buf, level.as_str(), 8);
}

fn put_padded(buf: &mut Vec<u8>, s: &str, width: usize) {
    let take = s.len().min(width);
    buf.extend_from_slice(&s.as_bytes()[..take]);
    for _ in take..width {
        buf.push(b' ');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ThreadInfoMode;

    #[test]
    fn plain_layout_matches_expected_shape() {
        let event = Event::new(
            "G",
            Level::Info,
            ThreadInfoMode::None,
            "Hello",
            format_args!("Hello"),
        );
        let mut buf = Vec::new();
        format_event(&mut buf, &event, ThreadInfoMode::None, false);
        let line = String::from_utf8(buf).unwrap();

        let re_prefix_len = "00.00.00 00:00:00.000000".len();
        assert_eq!(&line[..2], &ts_year(&event));
        assert!(line[re_prefix_len..].starts_with("  "));
        assert!(line.contains("Info    "));
        assert!(line.contains("G  Hello"));
        assert!(line.ends_with('\n'));
    }

    fn ts_year(event: &Event) -> String {
        event.timestamp().format("%y").to_string()
    }

    #[test]
    fn level_padded_to_eight_columns() {
        let mut buf = Vec::new();
        put_level(&mut buf, Level::Info);
        assert_eq!(buf.len(), 8);
        assert_eq!(&buf[..4], b"Info");
    }
}
