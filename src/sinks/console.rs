//! Console sink

use super::Event;
use crate::core::error::{LoggerError, Result};
use crate::core::LogLevel;
use crate::render::RenderCapability;
use std::io::{self, Write};

pub const DEFAULT_CONSOLE_WIDTH: usize = 80;

enum ConsoleTarget {
    /// stdout, with Error and Fatal records on stderr
    Stdio,
    Writer(Box<dyn Write + Send>),
}

pub struct ConsoleSink {
    target: ConsoleTarget,
    use_colors: bool,
    width: usize,
    closed: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            target: ConsoleTarget::Stdio,
            use_colors: true,
            width: DEFAULT_CONSOLE_WIDTH,
            closed: false,
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            ..Self::new()
        }
    }

    /// Write everything to `writer` instead of stdout/stderr
    ///
    /// # Example
    ///
    /// ```
    /// use rust_rotating_logger::sinks::ConsoleSink;
    ///
    /// let sink = ConsoleSink::with_colors(false).with_writer(std::io::sink());
    /// ```
    #[must_use]
    pub fn with_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.target = ConsoleTarget::Writer(Box::new(writer));
        self
    }

    /// Width used to lay out rules
    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn emit(&mut self, event: &Event, renderer: &dyn RenderCapability) -> Result<()> {
        if self.closed {
            return Err(LoggerError::closed_sink("console"));
        }

        let styled = event.styled(renderer);
        let mut output = if self.use_colors {
            styled.to_ansi(self.width)
        } else {
            styled.to_plain(self.width)
        };
        output.push('\n');

        match &mut self.target {
            ConsoleTarget::Stdio => {
                let to_stderr = event
                    .record()
                    .is_some_and(|r| matches!(r.level, LogLevel::Error | LogLevel::Fatal));
                if to_stderr {
                    io::stderr().lock().write_all(output.as_bytes())?;
                } else {
                    io::stdout().lock().write_all(output.as_bytes())?;
                }
            }
            ConsoleTarget::Writer(writer) => {
                writer.write_all(output.as_bytes())?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        match &mut self.target {
            ConsoleTarget::Stdio => {
                // we write to both
                io::stdout().flush()?;
                io::stderr().flush()?;
            }
            ConsoleTarget::Writer(writer) => writer.flush()?,
        }
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let flushed = self.flush();
        self.closed = true;
        flushed
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let target = match self.target {
            ConsoleTarget::Stdio => "stdio",
            ConsoleTarget::Writer(_) => "writer",
        };
        f.debug_struct("ConsoleSink")
            .field("target", &target)
            .field("use_colors", &self.use_colors)
            .field("width", &self.width)
            .field("closed", &self.closed)
            .finish()
    }
}
