//! Sink that hands every event to host code, e.g. a web console

use super::Event;
use crate::core::error::{LoggerError, Result};
use crate::render::{RenderCapability, Renderable};
use std::sync::Arc;

pub type CallbackFn = Arc<dyn Fn(Renderable) + Send + Sync>;

/// Calls a function with the styled renderable of each event.
///
/// # Example
///
/// ```
/// use rust_rotating_logger::core::{LogLevel, LogRecord};
/// use rust_rotating_logger::render::TextRenderer;
/// use rust_rotating_logger::sinks::{CallbackSink, Event};
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let collected = Arc::clone(&seen);
/// let mut sink = CallbackSink::new(move |r| collected.lock().unwrap().push(r.to_plain(80)));
///
/// let event = Event::from(LogRecord::new(LogLevel::Info, "to the browser"));
/// sink.emit(&event, &TextRenderer::new()).unwrap();
/// assert!(seen.lock().unwrap()[0].ends_with("to the browser"));
/// ```
pub struct CallbackSink {
    callback: CallbackFn,
    closed: bool,
}

impl CallbackSink {
    pub fn new(callback: impl Fn(Renderable) + Send + Sync + 'static) -> Self {
        Self::from_arc(Arc::new(callback))
    }

    pub fn from_arc(callback: CallbackFn) -> Self {
        Self {
            callback,
            closed: false,
        }
    }

    pub fn emit(&mut self, event: &Event, renderer: &dyn RenderCapability) -> Result<()> {
        if self.closed {
            return Err(LoggerError::closed_sink("callback"));
        }
        (self.callback)(event.styled(renderer));
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl std::fmt::Debug for CallbackSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackSink")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ErrorTrace, LogLevel, LogRecord};
    use crate::render::TextRenderer;
    use parking_lot::Mutex;

    #[test]
    fn test_trace_is_delivered_with_record() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let collected = Arc::clone(&seen);
        let mut sink = CallbackSink::new(move |r| collected.lock().push(r));

        let trace = ErrorTrace {
            kind: "Timeout".to_string(),
            message: "no answer".to_string(),
            causes: Vec::new(),
            backtrace: None,
        };
        let record = LogRecord::new(LogLevel::Error, "Timeout: no answer").with_trace(trace);
        sink.emit(&Event::from(record), &TextRenderer::new()).unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(matches!(&seen[0], Renderable::Group(items) if items.len() == 2));
    }

    #[test]
    fn test_closed_callback_is_not_called() {
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let mut sink = CallbackSink::new(move |_| *counter.lock() += 1);

        sink.close().unwrap();
        let err = sink
            .emit(&Event::from(LogRecord::new(LogLevel::Info, "x")), &TextRenderer::new())
            .unwrap_err();
        assert!(err.is_closed_sink());
        assert_eq!(*calls.lock(), 0);
    }
}
