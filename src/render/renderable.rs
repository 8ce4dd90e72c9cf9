//! Structured, styled output that can be re-rendered per surface

use super::style::Style;

/// A run of text sharing one style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

/// One output line made of styled spans
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        Self::new().push(text, style)
    }

    #[must_use]
    pub fn push(mut self, text: impl Into<String>, style: Style) -> Self {
        self.spans.push(Span {
            text: text.into(),
            style,
        });
        self
    }

    /// Width in characters
    pub fn width(&self) -> usize {
        self.spans.iter().map(|s| s.text.chars().count()).sum()
    }

    pub fn plain(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn ansi(&self) -> String {
        self.spans.iter().map(|s| s.style.paint(&s.text)).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    Left,
    #[default]
    Center,
    Right,
}

/// Horizontal divider, optionally with a title
///
/// # Examples
///
/// ```
/// use rust_rotating_logger::render::{Renderable, Rule};
///
/// let rule = Renderable::Rule(Rule::new("START").with_characters("═"));
/// assert_eq!(rule.to_plain(15), "════ START ════");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub title: String,
    pub characters: String,
    pub style: Style,
    pub title_style: Style,
    pub align: Align,
}

impl Rule {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            characters: "─".to_string(),
            style: Style::color(colored::Color::BrightGreen),
            title_style: Style::plain().bold(),
            align: Align::Center,
        }
    }

    #[must_use]
    pub fn with_characters(mut self, characters: impl Into<String>) -> Self {
        let characters = characters.into();
        // an empty fill would never reach the requested width
        self.characters = if characters.is_empty() {
            " ".to_string()
        } else {
            characters
        };
        self
    }

    #[must_use]
    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    fn fill(&self, count: usize) -> String {
        self.characters.chars().cycle().take(count).collect()
    }

    fn line(&self, width: usize) -> Line {
        let width = width.max(1);
        if self.title.is_empty() {
            return Line::styled(self.fill(width), self.style);
        }

        let max_title = width.saturating_sub(2).max(1);
        let title: String = self.title.chars().take(max_title).collect();
        let title = match self.align {
            Align::Left => format!("{} ", title),
            Align::Center => format!(" {} ", title),
            Align::Right => format!(" {}", title),
        };
        let remaining = width.saturating_sub(title.chars().count());

        let (left, right) = match self.align {
            Align::Left => (0, remaining),
            Align::Center => (remaining / 2, remaining - remaining / 2),
            Align::Right => (remaining, 0),
        };

        Line::new()
            .push(self.fill(left), self.style)
            .push(title, self.title_style)
            .push(self.fill(right), self.style)
    }
}

/// Anything a sink can display: text lines, rules, or a group of both
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Renderable {
    Text(Vec<Line>),
    Rule(Rule),
    Group(Vec<Renderable>),
}

impl Renderable {
    pub fn text(text: impl Into<String>, style: Style) -> Self {
        Renderable::Text(vec![Line::styled(text, style)])
    }

    /// Lay the renderable out for a surface `width` characters wide
    pub fn lines(&self, width: usize) -> Vec<Line> {
        match self {
            Renderable::Text(lines) => lines.clone(),
            Renderable::Rule(rule) => vec![rule.line(width)],
            Renderable::Group(items) => items.iter().flat_map(|item| item.lines(width)).collect(),
        }
    }

    /// Render without styles; trailing whitespace is trimmed per line
    pub fn to_plain(&self, width: usize) -> String {
        self.lines(width)
            .iter()
            .map(|line| line.plain().trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_ansi(&self, width: usize) -> String {
        self.lines(width)
            .iter()
            .map(Line::ansi)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Rule> for Renderable {
    fn from(rule: Rule) -> Self {
        Renderable::Rule(rule)
    }
}

impl From<Line> for Renderable {
    fn from(line: Line) -> Self {
        Renderable::Text(vec![line])
    }
}
