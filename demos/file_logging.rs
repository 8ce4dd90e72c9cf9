//! File logging example
//!
//! Logs to the console and a daily rotating file under `./log`, with
//! gzip archives of finished days written to `./log/bak`.
//!
//! Run with: cargo run --example file_logging

use rust_rotating_logger::prelude::*;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Rust Rotating Logger - File Logging Example ===\n");

    // The same keys an application reads from its `General.Log` section
    let section = serde_json::json!({
        "LogKeepCount": 7,
        "LogBackUpMethod": "archive",
        "ZipMethod": "gzip",
    });
    let (config, warnings) = LogConfig::from_log_section(&section);

    let logger = SinkDispatcher::new();
    for warning in &warnings {
        logger.warn(warning.to_string());
    }
    logger.set_file_sink("./log/file_logging.txt", &config)?;

    logger.header("File logging", 1);
    logger.info("Application started");
    logger.info("Configuration loaded successfully");

    for i in 1..=5 {
        logger.info(format!("Processing item {}/5", i));
        if i == 3 {
            logger.warn("Item 3 took longer than expected");
        }
    }

    // Swap in a file sink on a short schedule to watch rollovers happen
    let quick = RotatingFileSink::builder("every_two_seconds")
        .dir("./log")
        .when(When::Seconds)
        .interval(2)
        .backup_count(3)
        .backup_mode(BackupMode::Copy)
        .build()?;
    logger.register(quick);

    for i in 1..=6 {
        logger.info(format!("tick {}", i));
        std::thread::sleep(Duration::from_secs(1));
    }

    if let Some(path) = logger.log_file() {
        println!("\nCurrent log file: {}", path.display());
    }
    logger.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    Ok(())
}
