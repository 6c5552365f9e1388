/// Severity level of a logging event, ordered from least to most verbose.
///
/// `Level` is `repr(u8)` with `Off` at 0 so that a numeric comparison
/// (`level <= threshold`) is exactly the gate check: lower values are more
/// severe / less verbose, matching the original level ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Off = 0,
    Critical,
    Error,
    Warning,
    Info,
    Verbose,
    Debug,
    Trace,
}

impl Level {
    /// Full, padded name as rendered in the layout, e.g. `"Info    "`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Off => "Off",
            Level::Critical => "Critical",
            Level::Error => "Error",
            Level::Warning => "Warning",
            Level::Info => "Info",
            Level::Verbose => "Verbose",
            Level::Debug => "Debug",
            Level::Trace => "Trace",
        }
    }

    /// Single-character glyph, for compact layouts.
    pub const fn as_char(self) -> char {
        match self {
            Level::Off => 'O',
            Level::Critical => 'C',
            Level::Error => 'E',
            Level::Warning => 'W',
            Level::Info => 'I',
            Level::Verbose => 'V',
            Level::Debug => 'D',
            Level::Trace => 'T',
        }
    }

    /// Parses a level name, accepting the aliases the YAML configurator
    /// historically allowed (`warn`/`warning`, `debug`/`deb`,
    /// `critical`/`crit`) in addition to the canonical spellings.
    pub fn parse(name: &str) -> Option<Level> {
        match name.to_ascii_lowercase().as_str() {
            "off" => Some(Level::Off),
            "critical" | "crit" => Some(Level::Critical),
            "error" | "err" => Some(Level::Error),
            "warning" | "warn" => Some(Level::Warning),
            "info" => Some(Level::Info),
            "verbose" => Some(Level::Verbose),
            "debug" | "deb" => Some(Level::Debug),
            "trace" => Some(Level::Trace),
            _ => None,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_matches_severity() {
        assert!(Level::Off < Level::Critical);
        assert!(Level::Critical < Level::Error);
        assert!(Level::Trace > Level::Debug);
    }

    #[test]
    fn parse_accepts_canonical_and_aliases() {
        assert_eq!(Level::parse("info"), Some(Level::Info));
        assert_eq!(Level::parse("WARN"), Some(Level::Warning));
        assert_eq!(Level::parse("warning"), Some(Level::Warning));
        assert_eq!(Level::parse("crit"), Some(Level::Critical));
        assert_eq!(Level::parse("deb"), Some(Level::Debug));
        assert_eq!(Level::parse("bogus"), None);
    }

    #[test]
    fn as_char_gives_first_letter() {
        assert_eq!(Level::Info.as_char(), 'I');
        assert_eq!(Level::Critical.as_char(), 'C');
    }
}
