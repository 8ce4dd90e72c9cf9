//! Rendering contract used by every sink, and a default implementation

use super::renderable::{Line, Renderable, Rule};
use super::style::Style;
use crate::core::{ErrorTrace, LogRecord};
use chrono::{DateTime, Local, Utc};
use colored::Color;

/// Turns records into output for a particular surface.
///
/// The file sink asks for plain lines, the console and callback sinks ask
/// for styled renderables. Implementations must be shareable across threads
/// because one instance serves every sink of a dispatcher.
pub trait RenderCapability: Send + Sync {
    /// One plain, timestamped line for a record (no trailing newline)
    fn render_plain(&self, record: &LogRecord) -> String;

    /// Styled form of a record
    fn render_styled(&self, record: &LogRecord) -> Renderable;

    /// Styled form of an error trace
    fn render_trace(&self, trace: &ErrorTrace) -> Renderable;
}

pub const DEFAULT_PLAIN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
pub const DEFAULT_STYLED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Default renderer
///
/// Plain: `2024-05-01 10:00:00.123 | INFO | message`.
/// Styled: `2024-05-01 10:00:00.123 │ INFO     message` with a colored level.
///
/// # Examples
///
/// ```
/// use rust_rotating_logger::core::{LogLevel, LogRecord};
/// use rust_rotating_logger::render::{RenderCapability, TextRenderer};
///
/// let renderer = TextRenderer::new();
/// let line = renderer.render_plain(&LogRecord::new(LogLevel::Warn, "disk low"));
/// assert!(line.ends_with("| WARNING | disk low"));
/// ```
#[derive(Debug, Clone)]
pub struct TextRenderer {
    plain_time_format: String,
    styled_time_format: String,
    show_level: bool,
    utc: bool,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self {
            plain_time_format: DEFAULT_PLAIN_TIME_FORMAT.to_string(),
            styled_time_format: DEFAULT_STYLED_TIME_FORMAT.to_string(),
            show_level: true,
            utc: false,
        }
    }

    /// strftime format for the file line timestamp
    #[must_use]
    pub fn with_plain_time_format(mut self, format: impl Into<String>) -> Self {
        self.plain_time_format = format.into();
        self
    }

    /// strftime format for the styled timestamp (e.g. `%H:%M:%S%.3f` for a web view)
    #[must_use]
    pub fn with_styled_time_format(mut self, format: impl Into<String>) -> Self {
        self.styled_time_format = format.into();
        self
    }

    #[must_use]
    pub fn with_level(mut self, show_level: bool) -> Self {
        self.show_level = show_level;
        self
    }

    /// Format timestamps in UTC instead of local time
    #[must_use]
    pub fn with_utc(mut self, utc: bool) -> Self {
        self.utc = utc;
        self
    }

    fn format_time(&self, timestamp: &DateTime<Utc>, format: &str) -> String {
        if self.utc {
            timestamp.format(format).to_string()
        } else {
            timestamp.with_timezone(&Local).format(format).to_string()
        }
    }
}

impl RenderCapability for TextRenderer {
    fn render_plain(&self, record: &LogRecord) -> String {
        format!(
            "{} | {} | {}",
            self.format_time(&record.timestamp, &self.plain_time_format),
            record.level,
            record.message
        )
    }

    fn render_styled(&self, record: &LogRecord) -> Renderable {
        let mut line = Line::new()
            .push(
                self.format_time(&record.timestamp, &self.styled_time_format),
                Style::color(Color::Cyan),
            )
            .push(" │ ", Style::plain().dim());

        if self.show_level {
            line = line.push(format!("{:<8}", record.level), record.level.style());
            line = line.push(" ", Style::plain());
        }

        let message_style = if record.emphasis {
            Style::plain().bold()
        } else {
            Style::plain()
        };
        Renderable::from(line.push(record.message.clone(), message_style))
    }

    fn render_trace(&self, trace: &ErrorTrace) -> Renderable {
        let mut items = vec![
            Renderable::Rule(
                Rule::new("Error trace").with_style(Style::color(Color::Red)),
            ),
            Renderable::from(
                Line::new()
                    .push(trace.kind.clone(), Style::color(Color::Red).bold())
                    .push(": ", Style::plain())
                    .push(trace.message.clone(), Style::plain()),
            ),
        ];

        for cause in &trace.causes {
            items.push(Renderable::from(
                Line::new()
                    .push("  caused by: ", Style::plain().dim())
                    .push(cause.clone(), Style::color(Color::Yellow)),
            ));
        }

        if let Some(backtrace) = &trace.backtrace {
            let lines = backtrace
                .lines()
                .map(|l| Line::styled(format!("  {}", l.trim_end()), Style::plain().dim()))
                .collect();
            items.push(Renderable::Text(lines));
        }

        Renderable::Group(items)
    }
}
