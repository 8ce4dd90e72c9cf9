//! Output destinations
//!
//! A dispatcher holds at most one sink of each [`SinkKind`]. The set of
//! kinds is closed, so sinks are a tagged union rather than trait objects.

pub mod callback;
pub mod console;
pub mod rotating_file;

pub use callback::{CallbackFn, CallbackSink};
pub use console::ConsoleSink;
pub use rotating_file::{RotatingFileSink, RotatingFileSinkBuilder, DEFAULT_FILE_WIDTH};

use crate::core::error::Result;
use crate::core::reporter::ErrorReporter;
use crate::core::LogRecord;
use crate::render::{RenderCapability, Renderable};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SinkKind {
    Console,
    RotatingFile,
    Callback,
}

impl SinkKind {
    pub const ALL: [SinkKind; 3] = [SinkKind::Console, SinkKind::RotatingFile, SinkKind::Callback];

    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Console => "console",
            SinkKind::RotatingFile => "rotating_file",
            SinkKind::Callback => "callback",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// What travels through the dispatcher: a leveled record or a bare renderable
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Record(LogRecord),
    Renderable(Renderable),
}

impl Event {
    /// Styled form for console and callback surfaces
    pub fn styled(&self, renderer: &dyn RenderCapability) -> Renderable {
        match self {
            Event::Record(record) => {
                let line = renderer.render_styled(record);
                match &record.trace {
                    Some(trace) => Renderable::Group(vec![line, renderer.render_trace(trace)]),
                    None => line,
                }
            }
            Event::Renderable(renderable) => renderable.clone(),
        }
    }

    /// Plain text for files, possibly spanning several lines
    pub fn plain(&self, renderer: &dyn RenderCapability, width: usize) -> String {
        match self {
            Event::Record(record) => {
                let mut text = renderer.render_plain(record);
                if let Some(trace) = &record.trace {
                    text.push('\n');
                    text.push_str(&renderer.render_trace(trace).to_plain(width));
                }
                text
            }
            Event::Renderable(renderable) => renderable.to_plain(width),
        }
    }

    pub fn record(&self) -> Option<&LogRecord> {
        match self {
            Event::Record(record) => Some(record),
            Event::Renderable(_) => None,
        }
    }
}

impl From<LogRecord> for Event {
    fn from(record: LogRecord) -> Self {
        Event::Record(record)
    }
}

impl From<Renderable> for Event {
    fn from(renderable: Renderable) -> Self {
        Event::Renderable(renderable)
    }
}

#[derive(Debug)]
pub enum Sink {
    Console(ConsoleSink),
    RotatingFile(RotatingFileSink),
    Callback(CallbackSink),
}

impl Sink {
    pub fn kind(&self) -> SinkKind {
        match self {
            Sink::Console(_) => SinkKind::Console,
            Sink::RotatingFile(_) => SinkKind::RotatingFile,
            Sink::Callback(_) => SinkKind::Callback,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Sink::Console(_) => "console",
            Sink::RotatingFile(sink) => sink.name(),
            Sink::Callback(_) => "callback",
        }
    }

    /// Deliver one event. After [`Sink::close`] this fails with
    /// [`LoggerError::ClosedSink`](crate::core::LoggerError::ClosedSink).
    pub fn emit(&mut self, event: &Event, renderer: &dyn RenderCapability) -> Result<()> {
        match self {
            Sink::Console(sink) => sink.emit(event, renderer),
            Sink::RotatingFile(sink) => sink.emit(event, renderer),
            Sink::Callback(sink) => sink.emit(event, renderer),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        match self {
            Sink::Console(sink) => sink.flush(),
            Sink::RotatingFile(sink) => sink.flush(),
            Sink::Callback(_) => Ok(()),
        }
    }

    pub fn close(&mut self) -> Result<()> {
        match self {
            Sink::Console(sink) => sink.close(),
            Sink::RotatingFile(sink) => sink.close(),
            Sink::Callback(sink) => sink.close(),
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            Sink::Console(sink) => sink.is_closed(),
            Sink::RotatingFile(sink) => sink.is_closed(),
            Sink::Callback(sink) => sink.is_closed(),
        }
    }

    /// Reporter for errors the sink raises on its own (file I/O, backups)
    pub fn reporter(&self) -> Option<&ErrorReporter> {
        match self {
            Sink::RotatingFile(sink) => Some(sink.reporter()),
            _ => None,
        }
    }
}

impl From<ConsoleSink> for Sink {
    fn from(sink: ConsoleSink) -> Self {
        Sink::Console(sink)
    }
}

impl From<RotatingFileSink> for Sink {
    fn from(sink: RotatingFileSink) -> Self {
        Sink::RotatingFile(sink)
    }
}

impl From<CallbackSink> for Sink {
    fn from(sink: CallbackSink) -> Self {
        Sink::Callback(sink)
    }
}
