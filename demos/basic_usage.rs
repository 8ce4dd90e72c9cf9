//! Basic dispatcher usage example
//!
//! Demonstrates console logging at different levels, headers and attributes.
//!
//! Run with: cargo run --example basic_usage

use rust_rotating_logger::prelude::*;

fn main() -> Result<()> {
    println!("=== Rust Rotating Logger - Basic Usage Example ===\n");

    let logger = SinkDispatcher::new();
    logger.set_min_level(LogLevel::Trace);

    logger.header("Basic usage", 0);

    // Log messages at different levels
    logger.header("Levels", 1);
    logger.trace("This is a trace message");
    logger.debug("This is a debug message");
    logger.info("This is an info message");
    logger.warn("This is a warning message");
    logger.error("This is an error message");
    logger.fatal("This is a fatal message");

    logger.header("Minimum level", 2);
    logger.set_min_level(LogLevel::Info);
    logger.debug("Debug message (hidden)");
    logger.info("Info message (visible)");

    logger.header("Attributes", 2);
    logger.attr("Server", "cn");
    logger.attr_align("Task", "Commission", "", 22);
    logger.attr_align("Next run", "03:00", "->", 22);
    logger.header("done", 3);

    // An error with its cause chain
    let err = std::io::Error::new(std::io::ErrorKind::NotFound, "settings.json");
    logger.exception(&err);

    logger.flush()?;
    logger.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    Ok(())
}
