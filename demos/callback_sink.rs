//! Callback sink example
//!
//! Forwards every event to host code, here a toy "web console" that keeps
//! the rendered lines in memory.
//!
//! Run with: cargo run --example callback_sink

use rust_rotating_logger::prelude::*;
use std::sync::{Arc, Mutex};

fn main() -> Result<()> {
    println!("=== Rust Rotating Logger - Callback Sink Example ===\n");

    let web_console = Arc::new(Mutex::new(Vec::new()));
    let page = Arc::clone(&web_console);

    let logger = SinkDispatcher::builder()
        .renderer(Arc::new(
            TextRenderer::new().with_styled_time_format("%H:%M:%S%.3f"),
        ))
        .callback(CallbackSink::new(move |renderable: Renderable| {
            if let Ok(mut page) = page.lock() {
                page.push(renderable.to_plain(60));
            }
        }))
        .build();

    logger.rule("Web console", "─");
    logger.info("Task started");
    logger.warn("Screen capture is slow");
    logger.attr("Server", "cn");

    // The callback must not log through the same dispatcher
    logger.unregister(SinkKind::Callback);
    logger.info("Console only");

    println!("\nThe web console received:");
    if let Ok(page) = web_console.lock() {
        for line in page.iter() {
            println!("  {}", line);
        }
    }

    logger.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    Ok(())
}
