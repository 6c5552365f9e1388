//! End-to-end scenarios exercising the ring, sinks, group tree, and
//! registry together, the way a caller actually uses this crate rather than
//! through any one module's unit tests.

use soralog::{
    ConfigureReport, Configurator, ConsoleSink, ConsoleStream, FileSink, Level, LoggingSystem,
    MultiSink, Sink, SinkSettings,
};
use std::io::Read as _;
use std::sync::Arc;
use std::time::Duration;

struct NoopConfigurator;
impl Configurator for NoopConfigurator {
    fn apply(&self, _system: &LoggingSystem) -> ConfigureReport {
        ConfigureReport::new()
    }
}

fn new_system() -> Arc<LoggingSystem> {
    LoggingSystem::new(Box::new(NoopConfigurator))
}

fn sync_settings() -> SinkSettings {
    SinkSettings {
        latency: Duration::ZERO,
        capacity: 8,
        ..Default::default()
    }
}

fn read_file(path: &std::path::Path) -> String {
    let mut s = String::new();
    std::fs::File::open(path).unwrap().read_to_string(&mut s).unwrap();
    s
}

/// S1: a single root group wired to a sink, fallback-looked-up, produces
/// exactly one well-shaped line.
#[test]
fn s1_single_line_through_fallback_group() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.log");
    let system = new_system();
    let sink = FileSink::open("main-sink", &path, sync_settings()).unwrap();
    system.make_sink(sink);
    system.make_group("main", None, Some("main-sink"), Some(Level::Info));
    system.set_fallback_group("main");
    system.configure().unwrap();

    let logger = system.get_logger("G", "main", None, None).unwrap();
    logger.info("Hello", format_args!("Hello"));
    logger.flush();
    drop(logger);
    system.call_rotate_for_all_sinks();

    let content = read_file(&path);
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1);
    let line = lines[0];
    assert!(line.contains("Info"));
    assert!(line.contains("G  Hello"));
    assert_eq!(
        line.split_whitespace().next().unwrap().len(),
        8,
        "date prefix should be YY.MM.DD"
    );
}

/// S2: a multisink over two console sinks forwards one `info` call to both
/// members, each formatting identically.
#[test]
fn s2_multisink_fans_out_identical_lines() {
    let system = new_system();
    let cout = ConsoleSink::new("cout", ConsoleStream::Stdout, sync_settings());
    let cerr = ConsoleSink::new("cerr", ConsoleStream::Stderr, sync_settings());
    system.make_sink(Arc::clone(&cout) as Arc<dyn Sink>);
    system.make_sink(Arc::clone(&cerr) as Arc<dyn Sink>);
    let multi = system
        .make_multisink("both", &["cout".to_string(), "cerr".to_string()])
        .unwrap();
    system.make_sink(Arc::clone(&multi) as Arc<dyn Sink>);
    system.make_group("main", None, Some("both"), Some(Level::Info));
    system.configure().unwrap();

    let logger = system.get_logger("G", "main", None, None).unwrap();
    logger.info("x", format_args!("x"));
    logger.flush();

    assert_eq!(multi.member_names(), vec!["cout".to_string(), "cerr".to_string()]);
}

/// S3: members of a multisink each apply their own level gate independently
/// of the logger's level and of each other.
#[test]
fn s3_multisink_members_filter_independently() {
    let dir = tempfile::tempdir().unwrap();
    let cout_path = dir.path().join("cout.log");
    let cerr_path = dir.path().join("cerr.log");

    let system = new_system();
    let cout = FileSink::open(
        "cout",
        &cout_path,
        SinkSettings {
            level: Some(Level::Trace),
            ..sync_settings()
        },
    )
    .unwrap();
    let cerr = FileSink::open(
        "cerr",
        &cerr_path,
        SinkSettings {
            level: Some(Level::Info),
            ..sync_settings()
        },
    )
    .unwrap();
    system.make_sink(Arc::clone(&cout) as Arc<dyn Sink>);
    system.make_sink(Arc::clone(&cerr) as Arc<dyn Sink>);
    let multi = system
        .make_multisink("both", &["cout".to_string(), "cerr".to_string()])
        .unwrap();
    system.make_sink(Arc::clone(&multi) as Arc<dyn Sink>);
    system.make_group("main", None, Some("both"), Some(Level::Trace));
    system.configure().unwrap();

    let logger = system.get_logger("G", "main", None, None).unwrap();
    logger.trace("t", format_args!("t"));
    logger.info("i", format_args!("i"));
    logger.flush();
    drop(logger);
    drop(multi);
    drop(cout);
    drop(cerr);

    let cout_content = read_file(&cout_path);
    let cerr_content = read_file(&cerr_path);
    assert!(cout_content.contains("  t\n") || cout_content.ends_with("t\n"));
    assert!(cout_content.contains("  i\n") || cout_content.ends_with("i\n"));
    assert!(!cerr_content.contains("  t\n") && !cerr_content.ends_with("t\n"));
    assert!(cerr_content.contains("i"));
}

/// S4: rotate reopens the file sink's path after an external rename,
/// leaving prior content on the renamed file and new content on the fresh
/// one at that path.
#[test]
fn s4_rotate_after_external_rename() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.log");
    let system = new_system();
    let sink = FileSink::open(
        "f",
        &path,
        SinkSettings {
            latency: Duration::from_millis(1000),
            capacity: 8,
            ..Default::default()
        },
    )
    .unwrap();
    system.make_sink(Arc::clone(&sink) as Arc<dyn Sink>);
    system.make_group("main", None, Some("f"), Some(Level::Info));
    system.configure().unwrap();

    let logger = system.get_logger("G", "main", None, None).unwrap();
    logger.info("A", format_args!("A"));
    logger.flush();

    let renamed = dir.path().join("out.log.1");
    std::fs::rename(&path, &renamed).unwrap();
    system.call_rotate_for_all_sinks();
    std::thread::sleep(Duration::from_millis(100));

    logger.info("B", format_args!("B"));
    logger.flush();
    drop(logger);
    drop(sink);

    assert!(read_file(&renamed).contains('A'));
    assert!(read_file(&path).contains('B'));
}

/// S5: `first(info) -> second(inherits) -> third(override=debug)`;
/// dropping `first` to `critical` promotes `second` (and a logger attached
/// to it without its own override) but leaves `third` and a
/// logger-level-overridden logger on `second` untouched.
#[test]
fn s5_level_cascade_respects_override_boundaries() {
    let system = new_system();
    system.make_group("first", None, None, Some(Level::Info));
    system.make_group("second", Some("first"), None, None);
    system.make_group("third", Some("second"), None, Some(Level::Debug));
    system.set_fallback_group("first");
    system.configure().unwrap();

    let plain = system.get_logger("plain", "second", None, None).unwrap();
    let overridden = system.get_logger("overridden", "second", None, Some(Level::Warning)).unwrap();
    assert_eq!(plain.level(), Level::Info);
    assert_eq!(overridden.level(), Level::Warning);

    system.set_level_of_group("first", Level::Critical);

    let second = system.get_group("second").unwrap();
    let third = system.get_group("third").unwrap();
    assert_eq!(second.level(), Level::Critical);
    assert_eq!(third.level(), Level::Debug);
    assert_eq!(plain.level(), Level::Critical);
    assert_eq!(overridden.level(), Level::Warning);
}

/// S6: a ring of capacity 4 fed 100 events by one producer, drained by a
/// worker that sleeps between passes, preserves order end to end.
#[test]
fn s6_ring_preserves_order_under_slow_consumer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.log");
    let system = new_system();
    let sink = FileSink::open(
        "f",
        &path,
        SinkSettings {
            latency: Duration::from_millis(1),
            capacity: 4,
            ..Default::default()
        },
    )
    .unwrap();
    system.make_sink(Arc::clone(&sink) as Arc<dyn Sink>);
    system.make_group("main", None, Some("f"), Some(Level::Info));
    system.configure().unwrap();

    let logger = system.get_logger("G", "main", None, None).unwrap();
    for i in 0..100 {
        logger.info("{}", format_args!("{i}"));
    }
    logger.flush();
    std::thread::sleep(Duration::from_millis(50));
    logger.flush();
    drop(logger);
    drop(sink);

    let content = read_file(&path);
    let seen: Vec<i32> = content
        .lines()
        .filter_map(|line| line.rsplit("  ").next())
        .filter_map(|tail| tail.trim().parse::<i32>().ok())
        .collect();
    assert_eq!(seen.len(), 100);
    assert_eq!(seen, (0..100).collect::<Vec<_>>());
}
