//! Integration tests for the rotating logger
//!
//! These tests verify:
//! - Records reach the file in emission order
//! - Rollover naming and history retention through the dispatcher
//! - Background archives decode back to the logged text
//! - Swapping sinks under load loses no events
//! - Sink errors are routed to the other sinks
//! - Callback delivery and emit-after-shutdown behavior

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use rust_rotating_logger::backup::{ArchiveCodec, BackupMode};
use rust_rotating_logger::core::{LogConfig, LogLevel, ManualClock, SinkDispatcher};
use rust_rotating_logger::render::Renderable;
use rust_rotating_logger::rotation::{RotationZone, When};
use rust_rotating_logger::sinks::{ConsoleSink, RotatingFileSink, SinkKind};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn quiet_dispatcher() -> SinkDispatcher {
    SinkDispatcher::builder()
        .console(ConsoleSink::with_colors(false).with_writer(io::sink()))
        .build()
}

fn daily_file(dir: &Path, clock: &ManualClock) -> rust_rotating_logger::sinks::RotatingFileSinkBuilder {
    RotatingFileSink::builder("app")
        .dir(dir)
        .when(When::Days)
        .zone(RotationZone::Utc)
        .clock(clock.clone())
}

#[test]
fn test_records_are_written_in_order() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let logger = quiet_dispatcher();
    logger
        .set_file_sink(temp_dir.path().join("ordered.txt"), &LogConfig::default())
        .expect("Failed to create file sink");

    for i in 0..100 {
        logger.info(format!("Message {}", i));
    }
    logger.flush().expect("Failed to flush");

    let content = fs::read_to_string(temp_dir.path().join("ordered.txt")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 100);
    for (i, line) in lines.iter().enumerate() {
        assert!(line.ends_with(&format!("| INFO | Message {}", i)), "line {}: {}", i, line);
    }
}

#[test]
fn test_message_newlines_do_not_forge_records() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let logger = quiet_dispatcher();
    logger
        .set_file_sink(temp_dir.path().join("injection.txt"), &LogConfig::default())
        .unwrap();

    logger.info("User login\n2024-10-17 00:00:00.000 | ERROR | Fake error");
    logger.flush().unwrap();

    let content = fs::read_to_string(temp_dir.path().join("injection.txt")).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.contains("\\n"));
}

#[test]
fn test_daily_rollover_keeps_newest_history() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let clock = ManualClock::new(at("2024-05-01T00:00:00Z"));
    let logger = quiet_dispatcher();
    logger.register(daily_file(temp_dir.path(), &clock).backup_count(2).build().unwrap());

    for day in 1..=4 {
        logger.info(format!("day {}", day));
        clock.advance(TimeDelta::days(1));
    }
    logger.info("day 5");
    assert!(logger.shutdown(Duration::from_secs(10)));

    let mut names: Vec<String> = fs::read_dir(temp_dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["2024-05-03_app.txt", "2024-05-04_app.txt", "app.txt"]);

    let newest = fs::read_to_string(temp_dir.path().join("2024-05-04_app.txt")).unwrap();
    assert!(newest.contains("day 4"));
    let current = fs::read_to_string(temp_dir.path().join("app.txt")).unwrap();
    assert!(current.contains("day 5"));
}

#[test]
fn test_hourly_rollover_uses_hour_stamp() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let clock = ManualClock::new(at("2024-05-01T10:15:00Z"));
    let logger = quiet_dispatcher();
    logger.register(
        RotatingFileSink::builder("hourly")
            .dir(temp_dir.path())
            .when(When::Hours)
            .zone(RotationZone::Utc)
            .clock(clock.clone())
            .build()
            .unwrap(),
    );

    logger.info("first hour");
    clock.advance(TimeDelta::minutes(61));
    logger.info("second hour");
    logger.flush().unwrap();

    let first = fs::read_to_string(temp_dir.path().join("2024-05-01_10_hourly.txt")).unwrap();
    assert!(first.contains("first hour"));
}

fn archived_text(codec: ArchiveCodec, archive: &Path) -> String {
    let file = fs::File::open(archive).expect("archive missing");
    let mut text = String::new();
    match codec {
        ArchiveCodec::Gzip => flate2::read::GzDecoder::new(file).read_to_string(&mut text),
        ArchiveCodec::Bz2 => bzip2::read::BzDecoder::new(file).read_to_string(&mut text),
    }
    .expect("archive does not decode");
    text
}

#[test]
fn test_archives_decode_to_logged_text() {
    for (codec, ext) in [(ArchiveCodec::Gzip, "gz"), (ArchiveCodec::Bz2, "bz2")] {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let clock = ManualClock::new(at("2024-05-01T08:00:00Z"));
        let logger = quiet_dispatcher();
        logger.register(
            daily_file(temp_dir.path(), &clock)
                .backup_mode(BackupMode::Archive)
                .codec(codec)
                .build()
                .unwrap(),
        );

        logger.info("archived line");
        clock.advance(TimeDelta::days(1));
        logger.info("fresh line");
        assert!(logger.shutdown(Duration::from_secs(10)));

        let archive = temp_dir.path().join(format!("bak/2024-05-01_app.{}", ext));
        let text = archived_text(codec, &archive);
        assert!(text.contains("| INFO | archived line"));
        assert!(!text.contains("fresh line"));
        assert!(!temp_dir.path().join(format!("bak/2024-05-01_app.{}.tmp", ext)).exists());
    }
}

#[test]
fn test_restart_recovers_last_rotated_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::create_dir(temp_dir.path().join("bak")).unwrap();
    fs::write(temp_dir.path().join("2024-04-29_app.txt"), "older\n").unwrap();
    fs::write(temp_dir.path().join("bak/2024-04-29_app.txt"), "older\n").unwrap();
    // rotated by a run that stopped before its backup ran
    fs::write(temp_dir.path().join("2024-04-30_app.txt"), "old\n").unwrap();

    let clock = ManualClock::new(Utc::now());
    let sink = daily_file(temp_dir.path(), &clock)
        .backup_mode(BackupMode::Copy)
        .build()
        .unwrap();
    assert!(sink.wait_for_backups(Duration::from_secs(10)));

    let copied = temp_dir.path().join("bak/2024-04-30_app.txt");
    assert_eq!(fs::read_to_string(copied).unwrap(), "old\n");
    assert_eq!(sink.backup_metrics().completed(), 1);
}

#[test]
fn test_emit_after_shutdown_is_dropped() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let console = Captured::default();
    let logger = SinkDispatcher::builder()
        .console(ConsoleSink::with_colors(false).with_writer(console.clone()))
        .build();
    logger
        .set_file_sink(temp_dir.path().join("closed.txt"), &LogConfig::default())
        .unwrap();

    logger.info("before");
    assert!(logger.shutdown(Duration::from_secs(5)));
    logger.info("after");

    let content = fs::read_to_string(temp_dir.path().join("closed.txt")).unwrap();
    assert!(content.contains("before"));
    assert!(!content.contains("after"));
    assert!(!console.text().contains("after"));
}

#[test]
fn test_sink_swap_under_load_loses_nothing() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 500;
    const SWAPS: usize = 20;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let logger = quiet_dispatcher();
    logger
        .set_file_sink(temp_dir.path().join("swap_0.txt"), &LogConfig::default())
        .unwrap();

    let writers: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = logger.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.info(format!("thread {} message {}", t, i));
                }
            })
        })
        .collect();

    for swap in 1..=SWAPS {
        logger
            .set_file_sink(
                temp_dir.path().join(format!("swap_{}.txt", swap)),
                &LogConfig::default(),
            )
            .unwrap();
        thread::sleep(Duration::from_millis(1));
    }

    for writer in writers {
        writer.join().expect("writer thread panicked");
    }
    assert!(logger.shutdown(Duration::from_secs(10)));

    let total: usize = fs::read_dir(temp_dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| fs::read_to_string(e.path()).unwrap().lines().count())
        .sum();
    assert_eq!(total, THREADS * PER_THREAD);
    assert_eq!(logger.metrics().failed(), 0);
}

#[test]
fn test_callback_receives_styled_events() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let collected = Arc::clone(&seen);
    let logger = quiet_dispatcher();
    logger.set_callback(move |renderable: Renderable| collected.lock().push(renderable.to_plain(40)));

    logger.warn("to the browser");
    logger.rule("Section", "-");

    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].ends_with("WARNING  to the browser"));
    assert!(seen[1].contains(" Section "));
    assert_eq!(seen[1].chars().count(), 40);
}

#[test]
fn test_headers_and_rules_reach_the_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let logger = quiet_dispatcher();
    logger
        .set_file_sink(temp_dir.path().join("banner.txt"), &LogConfig::default())
        .unwrap();

    logger.header("Daily", 1);
    logger.attr_align("Task", "Commission", "", 22);
    logger.flush().unwrap();

    let content = fs::read_to_string(temp_dir.path().join("banner.txt")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0].chars().count(), 119);
    assert!(lines[0].contains(" DAILY "));
    assert!(lines[1].ends_with("| INFO | DAILY"));
    assert!(lines[2].ends_with(&format!("| INFO | {:>22}: Commission", "Task")));
}

#[test]
fn test_backup_failure_is_routed_to_console() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    // a regular file where the backup directory should be
    fs::write(temp_dir.path().join("bak"), "not a directory").unwrap();

    let clock = ManualClock::new(at("2024-05-01T08:00:00Z"));
    let console = Captured::default();
    let logger = SinkDispatcher::builder()
        .console(ConsoleSink::with_colors(false).with_writer(console.clone()))
        .build();
    logger.register(
        daily_file(temp_dir.path(), &clock)
            .backup_mode(BackupMode::Copy)
            .build()
            .unwrap(),
    );

    logger.info("day one");
    clock.advance(TimeDelta::days(1));
    logger.info("day two");
    logger.shutdown(Duration::from_secs(10));

    let text = console.text();
    let reported = text
        .lines()
        .find(|line| line.contains("[rotating_file]"))
        .expect("backup error was not routed to the console");
    assert!(reported.contains("ERROR"));
    assert!(reported.contains("Backup failed"));

    // the file sink itself never shows its own error
    let history = fs::read_to_string(temp_dir.path().join("2024-05-01_app.txt")).unwrap();
    assert!(!history.contains("Backup failed"));
}

#[test]
fn test_unregistered_file_sink_stops_receiving() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let logger = quiet_dispatcher();
    logger
        .set_file_sink(temp_dir.path().join("detached.txt"), &LogConfig::default())
        .unwrap();
    assert_eq!(
        logger.log_file(),
        Some(temp_dir.path().join("detached.txt"))
    );

    logger.info("kept");
    assert!(logger.unregister(SinkKind::RotatingFile));
    logger.info("not kept");

    assert_eq!(logger.log_file(), None);
    assert_eq!(logger.registered_kinds(), vec![SinkKind::Console]);
    let content = fs::read_to_string(temp_dir.path().join("detached.txt")).unwrap();
    assert!(content.contains("kept"));
    assert!(!content.contains("not kept"));
}

#[test]
fn test_exception_writes_trace_to_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let logger = quiet_dispatcher();
    logger
        .set_file_sink(temp_dir.path().join("trace.txt"), &LogConfig::default())
        .unwrap();
    logger.set_min_level(LogLevel::Warn);

    let err = io::Error::new(io::ErrorKind::PermissionDenied, "cannot open device");
    logger.exception(&err);
    logger.flush().unwrap();

    let content = fs::read_to_string(temp_dir.path().join("trace.txt")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert!(lines[0].ends_with("| ERROR | Error: cannot open device"));
    assert!(lines[1].contains("Error trace"));
}
